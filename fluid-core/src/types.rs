/// Index of a particle in the solver's particle store.
///
/// This is an index into `FluidSolver::particles`, and is only meaningful
/// within the lifetime of a given solver instance.
pub type ParticleId = usize;

/// Handle to a static collision shape registered with the solver.
///
/// Invalidated by `FluidSolver::remove_shape`, which swap-removes.
pub type ShapeId = usize;

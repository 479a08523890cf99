//! The per-step fluid pipeline.
//!
//! [`FluidSolver::update`] advances the fluid by one time step through a
//! strict stage order:
//! 1. rebuild the spatial hash from current positions,
//! 2. gravity,
//! 3. viscosity impulses,
//! 4. position prediction,
//! 5. spring creation / plastic adaptation / pruning,
//! 6. spring displacement,
//! 7. double density relaxation,
//! 8. world boundary clamping,
//! 9. static shape collisions,
//! 10. velocity recomputation.
//!
//! The order matters: every stage consumes exactly the state the previous
//! one left behind, and velocity is only authoritative after stage 10.

use crate::config::Config;
use crate::error::SimError;
use crate::grid::SpatialHashGrid;
use crate::particle::Particle;
use crate::shape::Shape;
use crate::springs::SpringTable;
use crate::types::{ParticleId, ShapeId};
use glam::Vec2;
use std::mem;

/// Extra distance a colliding particle is pushed past the shape surface.
const SURFACE_OFFSET: f32 = 0.1;
/// Fraction of the post-collision velocity removed as friction.
const COLLISION_FRICTION: f32 = 0.8;

/// Position-based fluid solver over a particle store, a spring table and
/// a set of static collision shapes.
///
/// Single-threaded and step-synchronous: one [`FluidSolver::update`] call
/// runs the whole pipeline to completion. Results are deterministic for a
/// fixed particle order and spring insertion order.
#[derive(Debug)]
pub struct FluidSolver {
    cfg: Config,
    particles: Vec<Particle>,
    shapes: Vec<Shape>,
    grid: SpatialHashGrid,
    springs: SpringTable,
    /// Scratch buffer reused by every neighbour query.
    neighbors: Vec<ParticleId>,
    /// Scratch for per-neighbour terms of the density pass:
    /// (index, unit direction, 1 - q).
    pairs: Vec<(ParticleId, Vec2, f32)>,
}

impl FluidSolver {
    /// Creates a solver for the given configuration.
    ///
    /// ### Errors
    /// Returns the first [`Config::validate`] failure.
    pub fn new(cfg: Config) -> Result<Self, SimError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            particles: Vec::new(),
            shapes: Vec::new(),
            grid: SpatialHashGrid::new(cfg.interaction_radius),
            springs: SpringTable::new(),
            neighbors: Vec::new(),
            pairs: Vec::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Replaces the configuration, revalidating it.
    ///
    /// The grid is recreated so the cell size tracks the interaction
    /// radius; buckets are rebuilt on the next step anyway.
    pub fn set_config(&mut self, cfg: Config) -> Result<(), SimError> {
        cfg.validate()?;
        if cfg.interaction_radius != self.cfg.interaction_radius {
            self.grid = SpatialHashGrid::new(cfg.interaction_radius);
        }
        self.cfg = cfg;
        Ok(())
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn springs(&self) -> &SpringTable {
        &self.springs
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Adds a particle and returns its index.
    pub fn spawn(&mut self, particle: Particle) -> ParticleId {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    /// Adds a batch of particles (e.g. from the seeding helpers).
    pub fn spawn_all(&mut self, particles: impl IntoIterator<Item = Particle>) {
        self.particles.extend(particles);
    }

    /// Removes all particles and springs; shapes stay.
    pub fn clear_particles(&mut self) {
        self.particles.clear();
        self.springs.clear();
    }

    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    pub fn add_circle(&mut self, center: Vec2, radius: f32) -> ShapeId {
        self.add_shape(Shape::circle(center, radius))
    }

    pub fn add_polygon(&mut self, vertices: Vec<Vec2>) -> Result<ShapeId, SimError> {
        Ok(self.add_shape(Shape::polygon(vertices)?))
    }

    /// Removes a shape by handle (swap-remove: the last shape takes over
    /// the removed handle).
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        (id < self.shapes.len()).then(|| self.shapes.swap_remove(id))
    }

    /// Topmost (most recently added) shape containing `point`, if any.
    /// This is the drag-select query for the host.
    pub fn shape_at(&self, point: Vec2) -> Option<ShapeId> {
        self.shapes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, s)| s.contains(point))
            .map(|(id, _)| id)
    }

    pub fn move_shape_by(&mut self, id: ShapeId, delta: Vec2) {
        if let Some(shape) = self.shapes.get_mut(id) {
            shape.move_by(delta);
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Runs the full stage pipeline described in the module docs. `dt` is
    /// supplied by the caller each step and is typically a fixed value
    /// decoupled from wall-clock frame time.
    ///
    /// ### Errors
    /// [`SimError::InvalidTimeStep`] if `dt` is zero or non-finite; the
    /// velocity recomputation divides by it.
    pub fn update(&mut self, dt: f32) -> Result<(), SimError> {
        if dt == 0.0 || !dt.is_finite() {
            return Err(SimError::InvalidTimeStep(dt));
        }

        self.grid.rebuild(&self.particles);
        self.apply_gravity(dt);
        self.apply_viscosity(dt);
        self.predict_positions(dt);
        self.adjust_springs(dt);
        self.springs.apply_displacement(
            dt,
            self.cfg.spring_stiffness,
            self.cfg.interaction_radius,
            &mut self.particles,
        );
        self.double_density_relaxation(dt);
        self.world_boundary();
        self.resolve_shape_collisions();
        self.compute_next_velocity(dt);
        Ok(())
    }

    fn apply_gravity(&mut self, dt: f32) {
        let gravity = self.cfg.gravity;
        for p in &mut self.particles {
            p.velocity += gravity * dt;
        }
    }

    /// Exchanges viscosity impulses between approaching neighbour pairs.
    ///
    /// For every ordered pair (i, j) with normalized distance q < 1 and
    /// approach speed u > 0, an impulse of `dt * (1-q) * (sigma*u +
    /// beta*u^2)` is split half onto each velocity. Pairs are processed
    /// sequentially against already-updated velocities.
    fn apply_viscosity(&mut self, dt: f32) {
        let radius = self.cfg.interaction_radius;
        let sigma = self.cfg.viscosity_sigma;
        let beta = self.cfg.viscosity_beta;

        let mut neighbors = mem::take(&mut self.neighbors);
        for i in 0..self.particles.len() {
            self.grid
                .neighbors_into(self.particles[i].position, &mut neighbors);
            for &j in &neighbors {
                if j == i {
                    continue;
                }
                let delta = self.particles[j].position - self.particles[i].position;
                let distance = delta.length();
                if distance <= 0.0 || distance >= radius {
                    continue;
                }
                let q = distance / radius;
                let direction = delta / distance;

                // Positive u means the pair is approaching.
                let u = (self.particles[i].velocity - self.particles[j].velocity).dot(direction);
                if u <= 0.0 {
                    continue;
                }

                let impulse = direction * (dt * (1.0 - q) * (sigma * u + beta * u * u) * 0.5);
                self.particles[i].velocity -= impulse;
                self.particles[j].velocity += impulse;
            }
        }
        self.neighbors = neighbors;
    }

    /// Snapshots `prev_position` and steps positions by the damped
    /// velocity. From here until stage 10 the cached velocities are stale.
    fn predict_positions(&mut self, dt: f32) {
        let damping = self.cfg.velocity_damping;
        for p in &mut self.particles {
            p.prev_position = p.position;
            p.position += p.velocity * (dt * damping);
        }
    }

    /// Creates springs for newly close pairs, then lets the whole table
    /// adapt plastically and drops fully yielded springs.
    fn adjust_springs(&mut self, dt: f32) {
        let radius = self.cfg.interaction_radius;

        let mut neighbors = mem::take(&mut self.neighbors);
        for i in 0..self.particles.len() {
            self.grid
                .neighbors_into(self.particles[i].position, &mut neighbors);
            for &j in &neighbors {
                if j == i {
                    continue;
                }
                let distance =
                    (self.particles[j].position - self.particles[i].position).length();
                self.springs.maybe_create(i, j, distance, radius);
            }
        }
        self.neighbors = neighbors;

        self.springs.relax_plasticity(
            dt,
            self.cfg.plasticity_yield_ratio,
            self.cfg.plasticity_rate,
            &self.particles,
        );
        self.springs.prune(radius);
    }

    /// Double density relaxation (Clavet et al.): displaces positions
    /// directly from density and near-density pressure terms.
    ///
    /// Each neighbour receives its half displacement immediately, while
    /// particle i's own accumulated half is applied once after the inner
    /// loop. Later particles therefore see positions already moved by
    /// earlier ones: the result depends on particle iteration order.
    /// That sequential semantics is intentional and kept as-is.
    fn double_density_relaxation(&mut self, dt: f32) {
        let radius = self.cfg.interaction_radius;
        let k = self.cfg.stiffness_k;
        let k_near = self.cfg.stiffness_k_near;
        let rest_density = self.cfg.rest_density;

        let mut neighbors = mem::take(&mut self.neighbors);
        let mut pairs = mem::take(&mut self.pairs);

        for i in 0..self.particles.len() {
            let pos_i = self.particles[i].position;
            self.grid.neighbors_into(pos_i, &mut neighbors);

            // First pass: density and near-density over q < 1 neighbours.
            pairs.clear();
            let mut density = 0.0;
            let mut density_near = 0.0;
            for &j in &neighbors {
                if j == i {
                    continue;
                }
                let delta = self.particles[j].position - pos_i;
                let distance = delta.length();
                if distance <= 0.0 || distance >= radius {
                    continue;
                }
                let w = 1.0 - distance / radius;
                density += w * w;
                density_near += w * w * w;
                pairs.push((j, delta / distance, w));
            }

            let pressure = k * (density - rest_density);
            let pressure_near = k_near * density_near;

            // Second pass: displace neighbours now, self afterwards.
            let mut own_displacement = Vec2::ZERO;
            for &(j, direction, w) in &pairs {
                let magnitude = dt * dt * (pressure * w + pressure_near * w * w);
                let half = direction * (magnitude * 0.5);
                self.particles[j].position += half;
                own_displacement -= half;
            }
            self.particles[i].position += own_displacement;
        }

        self.neighbors = neighbors;
        self.pairs = pairs;
    }

    /// Clamps particles to the rectangular domain.
    ///
    /// `prev_position` is clamped along with `position`; otherwise the
    /// velocity recomputation would read the pre-clamp travel as a spike
    /// away from the wall.
    fn world_boundary(&mut self) {
        let domain = self.cfg.domain;
        for p in &mut self.particles {
            if p.position.x < 0.0 {
                p.position.x = 0.0;
                p.prev_position.x = 0.0;
            } else if p.position.x > domain.x {
                p.position.x = domain.x;
                p.prev_position.x = domain.x;
            }
            if p.position.y < 0.0 {
                p.position.y = 0.0;
                p.prev_position.y = 0.0;
            } else if p.position.y > domain.y {
                p.position.y = domain.y;
                p.prev_position.y = domain.y;
            }
        }
    }

    /// Pushes particles out of overlapping shapes and kills the inward
    /// part of their implied velocity.
    ///
    /// After the push-out along the contact normal (penetration plus a
    /// small surface offset), the implied velocity `position -
    /// prev_position` is checked: if it still points into the surface,
    /// its normal component is removed and the remainder damped by the
    /// friction factor, then `prev_position` is back-derived so stage 10
    /// reproduces the adjusted velocity.
    fn resolve_shape_collisions(&mut self) {
        let shapes = &self.shapes;
        for p in &mut self.particles {
            for shape in shapes {
                let Some(contact) = shape.collide(p.position) else {
                    continue;
                };

                p.position += contact.normal * (contact.penetration + SURFACE_OFFSET);

                let velocity = p.position - p.prev_position;
                let inward = velocity.dot(contact.normal);
                if inward < 0.0 {
                    let adjusted =
                        (velocity - contact.normal * inward) * (1.0 - COLLISION_FRICTION);
                    p.prev_position = p.position - adjusted;
                }
            }
        }
    }

    /// Derives the authoritative velocity from the step's net movement.
    fn compute_next_velocity(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.velocity = (p.position - p.prev_position) / dt;
        }
    }
}

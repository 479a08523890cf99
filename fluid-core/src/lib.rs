//! Core 2-D position-based particle fluid library.
//!
//! Main components:
//! - [`particle`] — particle state and seeding helpers.
//! - [`grid`] — spatial hash for bounded-radius neighbour queries.
//! - [`springs`] — adaptive viscoelastic spring table.
//! - [`shape`] — static collision obstacles (circles and convex polygons).
//! - [`solver`] — the per-step simulation pipeline.
//! - [`config`] — solver tuning parameters.
//! - [`error`] — failure type for construction and stepping.
//! - [`types`] — shared index aliases.

pub mod config;
pub mod error;
pub mod grid;
pub mod particle;
pub mod shape;
pub mod solver;
pub mod springs;
pub mod types;

use crate::error::SimError;
use glam::Vec2;

/// Tuning parameters for the fluid solver.
///
/// The interaction radius doubles as the spatial hash cell size, so a
/// 3x3 cell block always covers the full neighbourhood of a particle.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Number of particles seeded by the host on reset.
    pub particle_count: usize,
    /// Maximum pairwise distance considered by every fluid force.
    pub interaction_radius: f32,
    /// Acceleration applied to every particle, in units/s^2 (y points down).
    pub gravity: Vec2,
    /// Target local density; pressure pushes toward it.
    pub rest_density: f32,
    /// Stiffness of the far pressure term.
    pub stiffness_k: f32,
    /// Stiffness of the near (anti-clustering) pressure term.
    pub stiffness_k_near: f32,
    /// Linear viscosity coefficient (sigma).
    pub viscosity_sigma: f32,
    /// Quadratic viscosity coefficient (beta).
    pub viscosity_beta: f32,
    /// Fraction of a spring's rest length that strains elastically
    /// before plastic flow starts (gamma).
    pub plasticity_yield_ratio: f32,
    /// Rate at which spring rest lengths creep toward the yield surface.
    pub plasticity_rate: f32,
    /// Stiffness of viscoelastic springs.
    pub spring_stiffness: f32,
    /// Multiplier on predicted displacement; 1.0 means undamped.
    pub velocity_damping: f32,
    /// Rectangular world extents; particles are kept in [0, domain].
    pub domain: Vec2,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particle_count: 900,
            interaction_radius: 25.0,
            gravity: Vec2::new(0.0, 980.0),
            rest_density: 10.0,
            stiffness_k: 500.0,
            stiffness_k_near: 2000.0,
            viscosity_sigma: 20.0,
            viscosity_beta: 0.1,
            plasticity_yield_ratio: 0.2,
            plasticity_rate: 20.0,
            spring_stiffness: 300.0,
            velocity_damping: 1.0,
            domain: Vec2::new(1200.0, 700.0),
        }
    }
}

impl Config {
    /// Checks the invariants the solver relies on.
    ///
    /// The solver divides by the interaction radius and clamps against the
    /// domain extents, so both must be positive and finite; a negative rest
    /// density would turn pressure permanently attractive.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.interaction_radius > 0.0 && self.interaction_radius.is_finite()) {
            return Err(SimError::InvalidInteractionRadius(self.interaction_radius));
        }
        if !(self.rest_density >= 0.0 && self.rest_density.is_finite()) {
            return Err(SimError::InvalidRestDensity(self.rest_density));
        }
        if !(self.domain.x > 0.0 && self.domain.y > 0.0 && self.domain.is_finite()) {
            return Err(SimError::InvalidDomain {
                width: self.domain.x,
                height: self.domain.y,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_interaction_radius() {
        let mut cfg = Config::default();
        cfg.interaction_radius = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(SimError::InvalidInteractionRadius(0.0))
        );

        cfg.interaction_radius = f32::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidInteractionRadius(_))
        ));
    }

    #[test]
    fn rejects_negative_rest_density() {
        let mut cfg = Config::default();
        cfg.rest_density = -1.0;
        assert_eq!(cfg.validate(), Err(SimError::InvalidRestDensity(-1.0)));
    }

    #[test]
    fn rejects_empty_domain() {
        let mut cfg = Config::default();
        cfg.domain = Vec2::new(800.0, 0.0);
        assert!(matches!(cfg.validate(), Err(SimError::InvalidDomain { .. })));
    }
}

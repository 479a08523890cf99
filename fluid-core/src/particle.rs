use glam::Vec2;
use rand::Rng;

/// A single fluid particle.
///
/// `velocity` is authoritative only right after the solver's final
/// recomputation stage; mid-step it still holds the previous step's value.
/// `prev_position` is the snapshot taken before the predicted displacement
/// of the current step.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub position: Vec2,
    pub prev_position: Vec2,
    pub velocity: Vec2,
}

impl Particle {
    /// Creates a particle at rest at `position`.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            prev_position: position,
            velocity: Vec2::ZERO,
        }
    }

    /// Creates a particle with an initial velocity.
    pub fn with_velocity(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            prev_position: position,
            velocity,
        }
    }
}

/// Lays out `count` particles in a square block starting at `origin`.
///
/// Rows and columns are spaced by `spacing`; the block has
/// `ceil(sqrt(count))` columns and at most that many rows, so the result
/// holds exactly `count` particles.
pub fn block(origin: Vec2, count: usize, spacing: f32) -> Vec<Particle> {
    let cols = (count as f32).sqrt().ceil() as usize;
    let mut particles = Vec::with_capacity(count);

    for i in 0..count {
        let (x, y) = (i % cols, i / cols);
        let pos = origin + Vec2::new(x as f32 * spacing, y as f32 * spacing);
        particles.push(Particle::at(pos));
    }
    particles
}

/// Scatters `count` particles uniformly inside an axis-aligned rectangle.
pub fn random_in_rect(
    origin: Vec2,
    extents: Vec2,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<Particle> {
    (0..count)
        .map(|_| {
            let x = rng.random_range(origin.x..=origin.x + extents.x);
            let y = rng.random_range(origin.y..=origin.y + extents.y);
            Particle::at(Vec2::new(x, y))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_starts_at_rest_with_matching_prev_position() {
        let p = Particle::at(Vec2::new(3.0, 4.0));
        assert_eq!(p.position, p.prev_position);
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn block_has_exact_count_and_spacing() {
        let particles = block(Vec2::new(100.0, 50.0), 10, 8.0);
        assert_eq!(particles.len(), 10);

        // 10 particles -> 4 columns; the second one sits one spacing right.
        assert_eq!(particles[0].position, Vec2::new(100.0, 50.0));
        assert_eq!(particles[1].position, Vec2::new(108.0, 50.0));
        // Fifth particle starts the second row.
        assert_eq!(particles[4].position, Vec2::new(100.0, 58.0));
    }

    #[test]
    fn random_in_rect_stays_inside_bounds() {
        let mut rng = rand::rng();
        let origin = Vec2::new(10.0, 20.0);
        let extents = Vec2::new(30.0, 40.0);

        for p in random_in_rect(origin, extents, 200, &mut rng) {
            assert!(p.position.x >= origin.x && p.position.x <= origin.x + extents.x);
            assert!(p.position.y >= origin.y && p.position.y <= origin.y + extents.y);
        }
    }
}

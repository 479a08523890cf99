use crate::particle::Particle;
use crate::types::ParticleId;
use glam::Vec2;
use std::collections::HashMap;

/// Size of the hash key space the cell hash is reduced into.
const TABLE_SIZE: i64 = 100_000;
/// Per-axis multiplicative hashing constants.
const PRIME_X: i64 = 661_401;
const PRIME_Y: i64 = 752_887;

/// Spatial hash over particle positions for bounded-radius neighbour lookup.
///
/// The cell size equals the interaction radius, so the 3x3 block of cells
/// around a particle always covers every particle within that radius.
/// Buckets are transient: [`SpatialHashGrid::rebuild`] clears and refills
/// them from scratch every step, trading the O(n) rebuild for immunity to
/// stale-entry bugs.
///
/// Two distinct cells may hash to the same bucket id. Such collisions are
/// accepted and never resolved; a query then returns extra candidates, but
/// never omits a true neighbour.
#[derive(Debug)]
pub struct SpatialHashGrid {
    cell_size: f32,
    buckets: HashMap<i64, Vec<ParticleId>>,
}

impl SpatialHashGrid {
    /// Creates an empty grid with the given cell size.
    ///
    /// Callers pass the interaction radius here; see the type docs.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            buckets: HashMap::new(),
        }
    }

    /// Integer cell coordinate of a position.
    ///
    /// Division truncates toward zero, so cell 0 is twice as wide on axes
    /// that cross the origin. Known asymmetry, kept as-is: it only shifts
    /// which bucket boundary-straddling particles land in.
    fn cell_of(&self, pos: Vec2) -> (i64, i64) {
        ((pos.x / self.cell_size) as i64, (pos.y / self.cell_size) as i64)
    }

    /// Hashes a cell coordinate into the bucket key space.
    fn cell_hash(x: i64, y: i64) -> i64 {
        (x.wrapping_mul(PRIME_X) ^ y.wrapping_mul(PRIME_Y)).rem_euclid(TABLE_SIZE)
    }

    /// Clears all buckets and maps every particle index to its cell bucket.
    pub fn rebuild(&mut self, particles: &[Particle]) {
        self.buckets.clear();
        for (i, p) in particles.iter().enumerate() {
            let (x, y) = self.cell_of(p.position);
            self.buckets
                .entry(Self::cell_hash(x, y))
                .or_default()
                .push(i);
        }
    }

    /// Appends all neighbour candidates around `pos` into `out`.
    ///
    /// Concatenates the buckets of the 3x3 cell block centred on the cell
    /// of `pos`. The result includes the querying particle's own index,
    /// and may include duplicates or hash-alias false positives; callers
    /// filter by actual distance. `out` is cleared first so it can be
    /// reused as a scratch buffer across queries.
    pub fn neighbors_into(&self, pos: Vec2, out: &mut Vec<ParticleId>) {
        out.clear();
        let (cx, cy) = self.cell_of(pos);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.buckets.get(&Self::cell_hash(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;

    fn grid_with(positions: &[Vec2]) -> (SpatialHashGrid, Vec<Particle>) {
        let particles: Vec<Particle> = positions.iter().map(|&p| Particle::at(p)).collect();
        let mut grid = SpatialHashGrid::new(25.0);
        grid.rebuild(&particles);
        (grid, particles)
    }

    #[test]
    fn query_on_empty_grid_yields_nothing() {
        let grid = SpatialHashGrid::new(25.0);
        let mut out = vec![42];
        grid.neighbors_into(Vec2::new(10.0, 10.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn query_includes_own_index() {
        let (grid, particles) = grid_with(&[Vec2::new(30.0, 30.0)]);
        let mut out = Vec::new();
        grid.neighbors_into(particles[0].position, &mut out);
        assert!(out.contains(&0));
    }

    #[test]
    fn finds_neighbours_in_adjacent_cells() {
        // Cells (1,1) and (2,1): adjacent, so each sees the other.
        let (grid, particles) = grid_with(&[Vec2::new(30.0, 30.0), Vec2::new(55.0, 30.0)]);

        let mut out = Vec::new();
        grid.neighbors_into(particles[0].position, &mut out);
        assert!(out.contains(&1));

        grid.neighbors_into(particles[1].position, &mut out);
        assert!(out.contains(&0));
    }

    #[test]
    fn far_particle_outside_block_is_not_returned() {
        let (grid, particles) = grid_with(&[Vec2::new(30.0, 30.0), Vec2::new(200.0, 30.0)]);
        let mut out = Vec::new();
        grid.neighbors_into(particles[0].position, &mut out);
        assert!(!out.contains(&1));
    }

    #[test]
    fn truncating_division_merges_cells_around_origin() {
        // -10/25 and +10/25 both truncate to cell 0: the documented
        // asymmetry of cell boundaries across the origin.
        let (grid, _) = grid_with(&[Vec2::new(-10.0, 5.0), Vec2::new(10.0, 5.0)]);
        let mut out = Vec::new();
        grid.neighbors_into(Vec2::new(0.0, 5.0), &mut out);
        assert!(out.contains(&0) && out.contains(&1));
    }

    #[test]
    fn hash_aliased_cells_still_see_each_other() {
        // Cells (0,0) and (100000,0) are distinct but alias to bucket 0,
        // since 100000 * 661401 is a multiple of the table size.
        assert_eq!(
            SpatialHashGrid::cell_hash(0, 0),
            SpatialHashGrid::cell_hash(100_000, 0)
        );

        let far_x = 100_000.0 * 25.0 + 5.0;
        let (grid, particles) = grid_with(&[Vec2::new(5.0, 5.0), Vec2::new(far_x, 5.0)]);

        // Aliasing may only add candidates, never hide them: both indices
        // must show up in each other's 3x3-block query.
        let mut out = Vec::new();
        grid.neighbors_into(particles[0].position, &mut out);
        assert!(out.contains(&0) && out.contains(&1));

        grid.neighbors_into(particles[1].position, &mut out);
        assert!(out.contains(&0) && out.contains(&1));
    }

    #[test]
    fn rebuild_drops_previous_step_entries() {
        let mut particles = vec![Particle::at(Vec2::new(30.0, 30.0))];
        let mut grid = SpatialHashGrid::new(25.0);
        grid.rebuild(&particles);

        // Move the particle far away and rebuild; the old bucket is gone.
        particles[0].position = Vec2::new(500.0, 500.0);
        grid.rebuild(&particles);

        let mut out = Vec::new();
        grid.neighbors_into(Vec2::new(30.0, 30.0), &mut out);
        assert!(out.is_empty());

        grid.neighbors_into(Vec2::new(500.0, 500.0), &mut out);
        assert_eq!(out, vec![0]);
    }
}

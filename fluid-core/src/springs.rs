use crate::particle::Particle;
use crate::types::ParticleId;
use std::collections::BTreeMap;

/// Pairs closer than this are skipped when applying spring displacement;
/// normalizing their separation would be numerically unstable.
const MIN_SPRING_DISTANCE: f32 = 1e-4;

/// A viscoelastic link between two particles.
///
/// The endpoints are fixed at creation; only the rest length adapts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
    pub a: ParticleId,
    pub b: ParticleId,
    pub rest_length: f32,
}

/// Canonical key for an unordered particle pair.
///
/// Packs the smaller index into the high half so that `(i, j)` and
/// `(j, i)` map to the same 64-bit key, preventing duplicate springs.
pub fn pair_key(i: ParticleId, j: ParticleId) -> u64 {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    ((lo as u64) << 32) | hi as u64
}

/// Sparse table of adaptive springs, one per close particle pair.
///
/// Springs are created lazily when a pair first comes within the
/// interaction radius and destroyed once plasticity has stretched their
/// rest length past it. Keyed by [`pair_key`]; the ordered map keeps
/// iteration deterministic across runs.
#[derive(Debug, Default)]
pub struct SpringTable {
    springs: BTreeMap<u64, Spring>,
}

impl SpringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.springs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.springs.is_empty()
    }

    pub fn contains_pair(&self, i: ParticleId, j: ParticleId) -> bool {
        self.springs.contains_key(&pair_key(i, j))
    }

    pub fn get(&self, i: ParticleId, j: ParticleId) -> Option<&Spring> {
        self.springs.get(&pair_key(i, j))
    }

    pub fn clear(&mut self) {
        self.springs.clear();
    }

    /// Inserts a spring for `(i, j)` unless one exists or the pair is out
    /// of range.
    ///
    /// The rest length starts at the interaction radius itself, not the
    /// current separation: new springs begin loose and only tighten as
    /// plasticity pulls the rest length toward the actual distance.
    pub fn maybe_create(&mut self, i: ParticleId, j: ParticleId, distance: f32, radius: f32) {
        if i == j || distance >= radius {
            return;
        }
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        self.springs.entry(pair_key(i, j)).or_insert(Spring {
            a,
            b,
            rest_length: radius,
        });
    }

    /// Adapts rest lengths toward the current separations (plastic creep).
    ///
    /// Strain within `yield_ratio * rest_length` of the rest length is
    /// treated as elastic and leaves the spring untouched; beyond that
    /// deadzone the rest length creeps toward the separation at
    /// `dt * rate` per unit of excess strain, symmetrically for stretch
    /// and compression.
    pub fn relax_plasticity(
        &mut self,
        dt: f32,
        yield_ratio: f32,
        rate: f32,
        particles: &[Particle],
    ) {
        for spring in self.springs.values_mut() {
            let rest = spring.rest_length;
            let distance =
                (particles[spring.b].position - particles[spring.a].position).length();
            let tolerance = yield_ratio * rest;

            if distance > rest + tolerance {
                spring.rest_length += dt * rate * (distance - rest - tolerance);
            } else if distance < rest - tolerance {
                spring.rest_length -= dt * rate * (rest - tolerance - distance);
            }
        }
    }

    /// Removes springs whose rest length has yielded past the interaction
    /// radius.
    pub fn prune(&mut self, radius: f32) {
        self.springs.retain(|_, s| s.rest_length <= radius);
    }

    /// Displaces both endpoints of every spring toward its rest length.
    ///
    /// The displacement magnitude is
    /// `dt^2 * stiffness * (1 - rest/radius) * (rest - distance)`,
    /// applied half to each endpoint in opposite directions along the
    /// separation. Pairs closer than ~1e-4 are skipped.
    pub fn apply_displacement(
        &self,
        dt: f32,
        stiffness: f32,
        radius: f32,
        particles: &mut [Particle],
    ) {
        for spring in self.springs.values() {
            let delta = particles[spring.b].position - particles[spring.a].position;
            let distance = delta.length();
            if distance < MIN_SPRING_DISTANCE {
                continue;
            }
            let direction = delta / distance;

            let magnitude = dt * dt
                * stiffness
                * (1.0 - spring.rest_length / radius)
                * (spring.rest_length - distance);
            let half = direction * (magnitude * 0.5);

            particles[spring.a].position -= half;
            particles[spring.b].position += half;
        }
    }
}

//! Particle group state: buffers, spawn geometry and color gradient.
//!
//! Each group owns parallel-indexed flat buffers sized by its particle
//! count. Buffers are mutated only by the simulation step and the
//! reinitialize path; resizing always reallocates and reseeds in full,
//! never partially.

use glam::Vec3;
use rand::Rng;

use crate::analysis::{PeakDetector, VolumeGate};
use crate::params::{GroupParams, PresetOverlay, Shape};

/// Bounds enforced on configured particle counts
pub const MIN_PARTICLE_COUNT: usize = 1_000;
pub const MAX_PARTICLE_COUNT: usize = 100_000;

/// One independently configured particle emitter
pub struct ParticleGroup {
    pub index: usize,
    pub params: GroupParams,

    /// xyz triplets, length = particle_count * 3
    pub positions: Vec<f32>,
    pub velocities: Vec<f32>,
    /// Spawn anchor, updated only on (re)spawn
    pub base_positions: Vec<f32>,

    /// Seconds remaining, length = particle_count
    pub lifetimes: Vec<f32>,
    /// Lifetime assigned at spawn, for normalization
    pub max_lifetimes: Vec<f32>,
    /// Beat response scalar in [0, 1], decays geometrically
    pub beat_effects: Vec<f32>,

    /// Interpolated RGB per particle index, length = particle_count * 3
    pub colors: Vec<f32>,
    /// Set when the color buffer needs a renderer upload
    pub colors_dirty: bool,

    pub peak: PeakDetector,
    pub volume_gate: VolumeGate,

    /// Last value produced by the noise-scale random walk
    pub last_noise_scale: f32,
    /// Rotation speed persisted across gated volume updates (rad/frame)
    pub last_rotation_speed: f32,
    /// Accumulated rotation about the vertical axis (radians)
    pub rotation_angle: f32,
}

impl ParticleGroup {
    /// Create a group with per-index defaults and seeded buffers
    pub fn new(index: usize, rng: &mut impl Rng) -> Self {
        let params = GroupParams::for_index(index);
        let mut group = Self {
            index,
            last_noise_scale: params.noise_scale,
            params,
            positions: Vec::new(),
            velocities: Vec::new(),
            base_positions: Vec::new(),
            lifetimes: Vec::new(),
            max_lifetimes: Vec::new(),
            beat_effects: Vec::new(),
            colors: Vec::new(),
            colors_dirty: true,
            peak: PeakDetector::default(),
            volume_gate: VolumeGate::default(),
            last_rotation_speed: 0.0,
            rotation_angle: 0.0,
        };
        group.reinitialize(rng);
        group
    }

    pub fn particle_count(&self) -> usize {
        self.params.particle_count
    }

    /// Rebuild every buffer at the configured particle count.
    ///
    /// All particles respawn with zero velocity and a fresh lifetime in
    /// (0, particle_lifetime]; the color gradient is reassigned.
    pub fn reinitialize(&mut self, rng: &mut impl Rng) {
        let count = self
            .params
            .particle_count
            .clamp(MIN_PARTICLE_COUNT, MAX_PARTICLE_COUNT);
        self.params.particle_count = count;

        self.positions = vec![0.0; count * 3];
        self.velocities = vec![0.0; count * 3];
        self.base_positions = vec![0.0; count * 3];
        self.lifetimes = vec![0.0; count];
        self.max_lifetimes = vec![0.0; count];
        self.beat_effects = vec![0.0; count];
        self.colors = vec![0.0; count * 3];

        for i in 0..count {
            let pos = spawn_position(&self.params, rng);
            self.positions[i * 3..i * 3 + 3].copy_from_slice(&pos.to_array());
            self.base_positions[i * 3..i * 3 + 3].copy_from_slice(&pos.to_array());

            let lifetime = spawn_lifetime(self.params.particle_lifetime, rng);
            self.lifetimes[i] = lifetime;
            self.max_lifetimes[i] = lifetime;
        }

        self.peak.reset();
        self.assign_colors();
    }

    /// Assign the index-based gradient between the configured endpoints.
    ///
    /// Color is a function of spawn slot, not spatial location, so
    /// respawning never resamples it.
    pub fn assign_colors(&mut self) {
        let count = self.params.particle_count;
        let start = self.params.color_start;
        let end = self.params.color_end;

        for i in 0..count {
            let t = i as f32 / count as f32;
            for c in 0..3 {
                self.colors[i * 3 + c] = start[c] * (1.0 - t) + end[c] * t;
            }
        }
        self.colors_dirty = true;
    }

    /// Overlay a preset record; reinitializes when the count changed and
    /// always reassigns the gradient
    pub fn apply_preset(&mut self, overlay: &PresetOverlay, rng: &mut impl Rng) {
        let count_changed = overlay.apply(&mut self.params);
        if count_changed {
            self.reinitialize(rng);
        } else {
            self.assign_colors();
        }
    }

    /// Change the particle count; triggers the full reallocation path
    pub fn set_particle_count(&mut self, count: usize, rng: &mut impl Rng) {
        self.params.particle_count = count;
        self.reinitialize(rng);
    }

    /// Change the boundary radius; spawn geometry depends on it, so the
    /// group reseeds
    pub fn set_sphere_radius(&mut self, radius: f32, rng: &mut impl Rng) {
        self.params.sphere_radius = radius;
        self.reinitialize(rng);
    }

    /// Change the spawn-region fraction; the group reseeds
    pub fn set_inner_sphere_radius(&mut self, fraction: f32, rng: &mut impl Rng) {
        self.params.inner_sphere_radius = fraction;
        self.reinitialize(rng);
    }

    /// Position of particle `i` as a vector
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }
}

/// Draw a spawn point for the configured boundary shape.
///
/// Single source of truth for initial spawn and respawn-on-death; shape
/// changes take effect on the next reinitialize or natural death.
pub fn spawn_position(params: &GroupParams, rng: &mut impl Rng) -> Vec3 {
    // lerp(0, sphere_radius, inner_sphere_radius)
    let radius = params.sphere_radius * params.inner_sphere_radius;

    match params.shape {
        Shape::Box => Vec3::new(
            (rng.gen::<f32>() - 0.5) * radius * 3.5,
            (rng.gen::<f32>() - 0.5) * radius * 2.0,
            (rng.gen::<f32>() - 0.5) * radius * 1.0,
        ),
        Shape::Horizontal => Vec3::new(
            (rng.gen::<f32>() - 0.5) * radius * 5.0,
            (rng.gen::<f32>() - 0.5) * radius * 0.5,
            (rng.gen::<f32>() - 0.5) * radius * 1.0,
        ),
        Shape::Vortex => {
            // Uniform disc in the XZ plane
            let theta = rng.gen::<f32>() * std::f32::consts::TAU;
            let r = rng.gen::<f32>().sqrt() * radius;
            Vec3::new(
                r * theta.cos(),
                (rng.gen::<f32>() - 0.5) * radius * 2.5,
                r * theta.sin(),
            )
        }
        Shape::Sphere => {
            // Volumetric sphere: cube-root radial CDF, uniform direction
            let theta = rng.gen::<f32>() * std::f32::consts::TAU;
            let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
            let r = rng.gen::<f32>().cbrt() * radius;
            Vec3::new(
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin(),
                r * phi.cos(),
            )
        }
    }
}

/// Fresh lifetime in (0, particle_lifetime]
pub fn spawn_lifetime(particle_lifetime: f32, rng: &mut impl Rng) -> f32 {
    (1.0 - rng.gen::<f32>()) * particle_lifetime
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_buffer_lengths_and_lifetime_invariants() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(0, &mut rng);

        for count in [1_000, 5_000, 20_000] {
            group.set_particle_count(count, &mut rng);

            assert_eq!(group.positions.len(), count * 3);
            assert_eq!(group.velocities.len(), count * 3);
            assert_eq!(group.base_positions.len(), count * 3);
            assert_eq!(group.colors.len(), count * 3);
            assert_eq!(group.lifetimes.len(), count);
            assert_eq!(group.max_lifetimes.len(), count);
            assert_eq!(group.beat_effects.len(), count);

            for i in 0..count {
                assert!(group.lifetimes[i] <= group.max_lifetimes[i]);
                assert!(group.lifetimes[i] > 0.0);
                assert!(group.max_lifetimes[i] <= group.params.particle_lifetime);
            }
        }
    }

    #[test]
    fn test_particle_count_is_clamped_to_bounds() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(0, &mut rng);

        group.set_particle_count(10, &mut rng);
        assert_eq!(group.particle_count(), MIN_PARTICLE_COUNT);

        group.set_particle_count(10_000_000, &mut rng);
        assert_eq!(group.particle_count(), MAX_PARTICLE_COUNT);
    }

    #[test]
    fn test_radius_setters_reseed_spawn_region() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(0, &mut rng);

        // Default spawn region: 1.0 * 0.25
        for i in 0..group.particle_count() {
            assert!(group.position(i).length() <= 0.25 + 1e-5);
        }

        group.set_sphere_radius(2.0, &mut rng);
        group.set_inner_sphere_radius(1.0, &mut rng);

        let max_dist = (0..group.particle_count())
            .map(|i| group.position(i).length())
            .fold(0.0f32, f32::max);
        assert!(max_dist > 0.25, "reseed should use the new region");
        assert!(max_dist <= 2.0 + 1e-5);
    }

    #[test]
    fn test_sphere_spawn_is_volumetric() {
        let mut rng = rng();
        let mut params = GroupParams::for_index(0);
        params.sphere_radius = 1.0;
        params.inner_sphere_radius = 1.0;

        // All samples inside the unit sphere, and radial distances follow
        // the cube-root CDF: P(d <= r) = r^3
        let n = 10_000;
        let mut distances = Vec::with_capacity(n);
        for _ in 0..n {
            let d = spawn_position(&params, &mut rng).length();
            assert!(d <= 1.0 + 1e-5);
            distances.push(d);
        }

        for r in [0.25f32, 0.5, 0.75] {
            let observed = distances.iter().filter(|&&d| d <= r).count() as f32 / n as f32;
            let expected = r.powi(3);
            assert!(
                (observed - expected).abs() < 0.03,
                "volumetric CDF mismatch at r={r}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_box_spawn_extents() {
        let mut rng = rng();
        let mut params = GroupParams::for_index(0);
        params.shape = Shape::Box;
        params.sphere_radius = 2.0;
        params.inner_sphere_radius = 0.5; // effective radius 1.0

        for _ in 0..1_000 {
            let p = spawn_position(&params, &mut rng);
            assert!(p.x.abs() <= 1.75);
            assert!(p.y.abs() <= 1.0);
            assert!(p.z.abs() <= 0.5);
        }
    }

    #[test]
    fn test_gradient_endpoints_and_interpolation() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(0, &mut rng);
        group.params.color_start = [1.0, 0.0, 0.0];
        group.params.color_end = [0.0, 0.0, 1.0];
        group.params.particle_count = 1_000;
        group.reinitialize(&mut rng);

        // First slot sits exactly on color_start
        assert_eq!(&group.colors[0..3], &[1.0, 0.0, 0.0]);

        // Midpoint blends both endpoints
        let mid = group.params.particle_count / 2;
        assert!((group.colors[mid * 3] - 0.5).abs() < 1e-2);
        assert!((group.colors[mid * 3 + 2] - 0.5).abs() < 1e-2);
    }

    #[test]
    fn test_preset_apply_reinitializes_only_on_count_change() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(0, &mut rng);
        let before = group.positions.clone();

        let overlay = PresetOverlay {
            color_end: Some([0.0, 1.0, 0.0]),
            ..Default::default()
        };
        group.apply_preset(&overlay, &mut rng);
        assert_eq!(group.positions, before, "no count change, no reseed");
        assert!(group.colors_dirty);

        let overlay = PresetOverlay {
            particle_count: Some(2_000),
            ..Default::default()
        };
        group.apply_preset(&overlay, &mut rng);
        assert_eq!(group.positions.len(), 2_000 * 3);
    }
}

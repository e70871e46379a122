//! Per-frame particle simulation.
//!
//! For each enabled group: pull audio features, reschedule the dynamic
//! noise scale on peaks, advance every particle through noise turbulence,
//! beat impulses and boundary constraints, and recycle dead particles
//! within the same pass. The step is synchronous and runs on the frame
//! callback; all cross-frame state lives on the group itself.

use glam::Vec3;
use rand::Rng;

use crate::analysis::{analyze_group, normalized_volume, FrequencySnapshot, SpectrumFeatures};
use crate::beat::BeatManager;
use crate::group::{spawn_lifetime, spawn_position, ParticleGroup};
use crate::noise::NoiseField;
use crate::params::{GroupParams, Shape, VisualStyle};

/// Upper bound on integration steps, guards against tunneling after a
/// long stall (tab resume, debugger pause)
pub const MAX_DELTA_TIME: f32 = 0.1;

/// Per-axis velocity limit preventing integration blow-up
const MAX_VELOCITY: f32 = 0.5;

/// Vertical half-extent of the visible region in world units; horizontal
/// extent follows the viewport aspect ratio
const SCREEN_LIMIT_Y: f32 = 1.8;

/// Immutable per-frame inputs shared by all groups
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Seconds since the previous frame, clamped to MAX_DELTA_TIME
    pub delta_time: f32,

    /// Seconds since startup; drives the noise phase and peak timing
    pub elapsed_s: f32,

    /// Recent frame-rate estimate; explicit input so the stride decision
    /// is testable in isolation
    pub estimated_fps: f32,

    /// Viewport width / height
    pub aspect_ratio: f32,
}

impl FrameContext {
    pub fn new(delta_time: f32, elapsed_s: f32, estimated_fps: f32, aspect_ratio: f32) -> Self {
        Self {
            delta_time: delta_time.min(MAX_DELTA_TIME),
            elapsed_s,
            estimated_fps,
            aspect_ratio,
        }
    }
}

/// Update stride under frame-rate pressure: every particle still renders,
/// but only every Nth is advanced per frame
pub fn update_stride(estimated_fps: f32) -> usize {
    if estimated_fps < 25.0 {
        4
    } else if estimated_fps < 45.0 {
        2
    } else {
        1
    }
}

/// Bounded random walk for the dynamic noise scale.
///
/// Sanitizes inconsistent bounds instead of raising, then moves a random
/// whole number of steps up or down, clamped into [min, max]. The result
/// drifts rather than teleports; only its range is reproducible.
pub fn generate_new_noise_scale(
    params: &GroupParams,
    last_noise_scale: f32,
    rng: &mut impl Rng,
) -> f32 {
    if !params.dynamic_noise_scale {
        return params.noise_scale;
    }

    let min = params.min_noise_scale;
    let mut max = params.max_noise_scale;
    let mut step = params.noise_step;

    if min >= max {
        eprintln!("Warning: fixing min_noise_scale ({min}) >= max_noise_scale ({max})");
        max = min + 0.1;
    }

    let mut range = max - min;
    if range < 0.1 {
        range = 0.1;
        max = min + range;
    }

    if step > range {
        eprintln!("Warning: noise_step ({step}) > range ({range}), forcing step = range / 2");
        step = range / 2.0;
    }

    let last = last_noise_scale.clamp(min, max);

    let steps_up = ((max - last) / step).floor() as i32;
    let steps_down = ((last - min) / step).floor() as i32;

    if steps_up == 0 && steps_down == 0 {
        return last;
    }

    let direction: i32 = if rng.gen::<f32>() < 0.5 && steps_down > 0 {
        -1
    } else {
        1
    };
    let steps = if direction == 1 {
        rng.gen_range(0..=steps_up)
    } else {
        rng.gen_range(0..=steps_down)
    };

    (last + (direction * steps) as f32 * step).clamp(min, max)
}

/// Inputs to a boundary clamp, derived once per group per frame
#[derive(Debug, Clone, Copy)]
pub struct BoundaryContext {
    /// Configured boundary radius, unmodulated
    pub sphere_radius: f32,

    /// Radius after the audio multiplier (Modern style breathes with
    /// energy, Original is fixed)
    pub base_limit: f32,

    pub aspect_ratio: f32,
    pub style: VisualStyle,

    /// Normalized 0-1 band energy, softens the Modern sphere bounce
    pub audio_energy: f32,
}

impl BoundaryContext {
    pub fn new(params: &GroupParams, aspect_ratio: f32, audio_energy: f32) -> Self {
        let radius_multiplier = match params.visual_style {
            VisualStyle::Original => 1.0,
            VisualStyle::Modern => 1.0 + audio_energy * 0.15,
        };
        Self {
            sphere_radius: params.sphere_radius,
            base_limit: params.sphere_radius * radius_multiplier,
            aspect_ratio,
            style: params.visual_style,
            audio_energy,
        }
    }

    fn screen_limit_x(&self) -> f32 {
        SCREEN_LIMIT_Y * self.aspect_ratio
    }
}

/// What happens when a particle's position would exceed its group's
/// spatial limit, selected from the configured shape at step time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    Sphere,
    Box,
    Horizontal,
    Vortex,
}

impl BoundaryPolicy {
    /// Vortex bounds exist only under Modern; Original falls back to the
    /// soft sphere pullback for that shape
    pub fn for_shape(shape: Shape, style: VisualStyle) -> Self {
        match shape {
            Shape::Box => Self::Box,
            Shape::Horizontal => Self::Horizontal,
            Shape::Vortex if style == VisualStyle::Modern => Self::Vortex,
            Shape::Vortex | Shape::Sphere => Self::Sphere,
        }
    }

    /// Constrain a particle, returning the corrected position/velocity
    pub fn clamp(&self, pos: Vec3, vel: Vec3, ctx: &BoundaryContext) -> (Vec3, Vec3) {
        match self {
            Self::Box => {
                let limit = Vec3::new(
                    (ctx.screen_limit_x() * 1.1).min(ctx.base_limit * 1.8),
                    SCREEN_LIMIT_Y.min(ctx.base_limit),
                    (SCREEN_LIMIT_Y * 0.5).min(ctx.base_limit * 0.5),
                );
                clamp_axes(pos, vel, limit)
            }
            Self::Horizontal => {
                let limit = Vec3::new(
                    (ctx.screen_limit_x() * 1.5).min(ctx.base_limit * 3.0),
                    (SCREEN_LIMIT_Y * 0.3).min(ctx.base_limit * 0.3),
                    (SCREEN_LIMIT_Y * 0.5).min(ctx.base_limit * 0.5),
                );
                clamp_axes(pos, vel, limit)
            }
            Self::Vortex => {
                let (mut pos, mut vel) = (pos, vel);
                let limit_r = (ctx.screen_limit_x() * 1.5).min(ctx.base_limit * 3.0);
                let limit_y = (SCREEN_LIMIT_Y * 1.5).min(ctx.base_limit * 2.0);

                let ring_dist = (pos.x * pos.x + pos.z * pos.z).sqrt();
                if ring_dist > limit_r {
                    // Project the overflow back onto the ring
                    let scale = limit_r / ring_dist;
                    pos.x *= scale;
                    pos.z *= scale;
                    vel.x *= -0.2;
                    vel.z *= -0.2;
                }
                if pos.y.abs() > limit_y {
                    pos.y = pos.y.signum() * limit_y;
                    vel.y *= -0.5;
                }
                (pos, vel)
            }
            Self::Sphere => match ctx.style {
                VisualStyle::Original => {
                    // Soft pullback: drift 10% of the overflow back toward
                    // the boundary, never a hard stop
                    let dist = pos.length();
                    if dist > ctx.sphere_radius && dist > 0.0 {
                        let overflow = dist - ctx.sphere_radius;
                        let pos = pos - pos / dist * (overflow * 0.1);
                        (pos, vel * 0.92)
                    } else {
                        (pos, vel)
                    }
                }
                VisualStyle::Modern => {
                    let effective = SCREEN_LIMIT_Y.min(ctx.base_limit);
                    let dist = pos.length();
                    if dist > effective && dist > 0.0 {
                        let normal = pos / dist;
                        let pos = normal * effective;

                        // Partial bounce when the velocity points outward
                        let vn = vel.dot(normal);
                        if vn > 0.0 {
                            let bounce_damping = 0.3 - ctx.audio_energy * 0.1;
                            (pos, vel - normal * vn * (1.0 + bounce_damping))
                        } else {
                            (pos, vel)
                        }
                    } else {
                        (pos, vel)
                    }
                }
            },
        }
    }
}

/// Independent per-axis clamp; a clamped axis inverts and halves its
/// velocity component
fn clamp_axes(mut pos: Vec3, mut vel: Vec3, limit: Vec3) -> (Vec3, Vec3) {
    for axis in 0..3 {
        if pos[axis].abs() > limit[axis] {
            pos[axis] = pos[axis].signum() * limit[axis];
            vel[axis] *= -0.5;
        }
    }
    (pos, vel)
}

/// Advance one group by one frame.
///
/// `snapshot` is None when no audio source is connected; the group then
/// runs on pure ambient noise motion with zero audio influence. The
/// shared BeatManager must already have been advanced for this frame.
pub fn step_group(
    group: &mut ParticleGroup,
    noise: &NoiseField,
    beat: &mut BeatManager,
    snapshot: Option<&FrequencySnapshot>,
    ctx: &FrameContext,
    rng: &mut impl Rng,
) {
    if !group.params.enabled {
        return;
    }

    let features = match snapshot {
        Some(s) => analyze_group(s, &group.params, &mut group.peak, ctx.elapsed_s as f64),
        None => SpectrumFeatures::default(),
    };

    if features.peak_detected && group.params.dynamic_noise_scale {
        let next = generate_new_noise_scale(&group.params, group.last_noise_scale, rng);
        group.params.noise_scale = next;
        group.last_noise_scale = next;
    }

    let beat_detected = features.range_energy_beat > group.params.beat_threshold;
    if beat_detected && !beat.is_wave_active() && group.params.beat_strength > 0.0 {
        beat.trigger(features.range_energy_beat);
    }

    let dt = ctx.delta_time;
    let audio_energy = features.average;
    let is_original = group.params.visual_style == VisualStyle::Original;

    let audio_speed_multiplier = if is_original {
        1.0
    } else {
        1.0 + audio_energy * 2.5
    };
    let noise_scale = group.params.noise_scale;
    let phase = ctx.elapsed_s * group.params.noise_speed * audio_speed_multiplier;

    let turbulence = group.params.turbulence_strength
        * if is_original {
            1.0
        } else {
            1.0 + audio_energy * 1.5
        };

    // The x60 normalizes motion tuned at a 60 FPS baseline across
    // variable refresh rates
    let move_scale = dt * 60.0 * if is_original { 1.0 } else { 2.0 };
    let damping = if is_original {
        0.98
    } else {
        0.99 + audio_energy * 0.015
    };
    let beat_decay = if is_original { 0.95 } else { 0.97 };
    let beat_force_scale = group.params.beat_strength
        * if is_original {
            1.0
        } else {
            1.0 + audio_energy * 2.0
        };

    let policy = BoundaryPolicy::for_shape(group.params.shape, group.params.visual_style);
    let bounds = BoundaryContext::new(&group.params, ctx.aspect_ratio, audio_energy);

    let stride = update_stride(ctx.estimated_fps);
    let count = group.params.particle_count;
    let particle_lifetime = group.params.particle_lifetime;

    let mut i = 0;
    while i < count {
        let i3 = i * 3;

        let mut pos = Vec3::new(
            group.positions[i3],
            group.positions[i3 + 1],
            group.positions[i3 + 2],
        );
        let mut vel = Vec3::new(
            group.velocities[i3],
            group.velocities[i3 + 1],
            group.velocities[i3 + 2],
        );
        let mut lifetime = group.lifetimes[i] - dt;
        let mut beat_effect = group.beat_effects[i];

        // Three phase-shifted noise queries give a 3-axis force
        let noise_force = Vec3::new(
            noise.sample(pos.x * noise_scale + phase, pos.y * noise_scale, pos.z * noise_scale),
            noise.sample(pos.x * noise_scale, pos.y * noise_scale + phase, pos.z * noise_scale),
            noise.sample(pos.x * noise_scale, pos.y * noise_scale, pos.z * noise_scale + phase),
        );
        vel += noise_force * turbulence;

        if beat_detected {
            beat_effect = 1.0;
        } else {
            beat_effect *= beat_decay;
        }

        let dist = pos.length();
        if dist > 0.0 {
            let outward = pos / dist;

            if beat_effect > 0.01 {
                vel += outward * (beat_effect * beat_force_scale);
            }

            // Traveling wave shell from the shared impulse system
            let wave_force = beat.force_at(pos);
            if wave_force > 0.0 {
                vel += outward * wave_force * dt;
            }

            // Continuous audio "breathing", independent of beats
            if !is_original && dist > 0.01 {
                vel += outward * (audio_energy * 0.02);
            }
        }

        vel = vel.clamp(Vec3::splat(-MAX_VELOCITY), Vec3::splat(MAX_VELOCITY));
        pos += vel * move_scale;
        vel *= damping;

        let (clamped_pos, clamped_vel) = policy.clamp(pos, vel, &bounds);
        pos = clamped_pos;
        vel = clamped_vel;

        if lifetime <= 0.0 {
            pos = spawn_position(&group.params, rng);
            vel = Vec3::ZERO;
            let fresh = spawn_lifetime(particle_lifetime, rng);
            lifetime = fresh;
            group.max_lifetimes[i] = fresh;
            beat_effect = 0.0;
            group.base_positions[i3..i3 + 3].copy_from_slice(&pos.to_array());
        }

        group.positions[i3..i3 + 3].copy_from_slice(&pos.to_array());
        group.velocities[i3..i3 + 3].copy_from_slice(&vel.to_array());
        group.lifetimes[i] = lifetime;
        group.beat_effects[i] = beat_effect;

        i += stride;
    }

    // Rotation speed tracks the gated volume; a suppressed update keeps
    // the previous speed
    let (volume, should_update) = match snapshot {
        Some(s) => {
            let v = normalized_volume(s);
            group.volume_gate.filter(v, group.params.volume_change_threshold)
        }
        None => (0.0, false),
    };

    if should_update {
        let target = group.params.rotation_speed_min
            + (group.params.rotation_speed_max - group.params.rotation_speed_min) * volume;
        group.last_rotation_speed +=
            (target - group.last_rotation_speed) * group.params.rotation_smoothness;
    }
    group.rotation_angle += group.last_rotation_speed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn frame(fps: f32) -> FrameContext {
        FrameContext::new(1.0 / 60.0, 0.0, fps, 16.0 / 9.0)
    }

    #[test]
    fn test_delta_time_is_clamped() {
        let ctx = FrameContext::new(2.0, 0.0, 60.0, 1.0);
        assert_eq!(ctx.delta_time, MAX_DELTA_TIME);
    }

    #[test]
    fn test_update_stride_selection() {
        assert_eq!(update_stride(120.0), 1);
        assert_eq!(update_stride(60.0), 1);
        assert_eq!(update_stride(45.0), 1);
        assert_eq!(update_stride(44.0), 2);
        assert_eq!(update_stride(25.0), 2);
        assert_eq!(update_stride(20.0), 4);
    }

    #[test]
    fn test_noise_scale_walk_stays_bounded() {
        let mut rng = rng();
        let mut params = GroupParams::for_index(0);
        params.dynamic_noise_scale = true;

        for _ in 0..10_000 {
            let min = rng.gen_range(0.1..3.0);
            let max = min + rng.gen_range(0.1..3.0);
            params.min_noise_scale = min;
            params.max_noise_scale = max;
            params.noise_step = rng.gen_range(0.01..(max - min));

            // Including out-of-range seeds
            let last = rng.gen_range(-1.0..10.0);
            let next = generate_new_noise_scale(&params, last, &mut rng);
            assert!(
                next >= min && next <= max,
                "walk escaped [{min}, {max}]: {next}"
            );
        }
    }

    #[test]
    fn test_noise_scale_walk_heals_degenerate_config() {
        let mut rng = rng();
        let mut params = GroupParams::for_index(0);
        params.dynamic_noise_scale = true;
        params.min_noise_scale = 2.0;
        params.max_noise_scale = 1.0; // inverted
        params.noise_step = 50.0; // oversized

        for _ in 0..100 {
            let next = generate_new_noise_scale(&params, 5.0, &mut rng);
            assert!((2.0..=2.1).contains(&next));
        }
    }

    #[test]
    fn test_noise_scale_walk_disabled_returns_configured() {
        let mut rng = rng();
        let mut params = GroupParams::for_index(0);
        params.dynamic_noise_scale = false;
        params.noise_scale = 3.3;
        assert_eq!(generate_new_noise_scale(&params, 1.0, &mut rng), 3.3);
    }

    #[test]
    fn test_original_sphere_boundary_is_idempotent_at_radius() {
        let mut params = GroupParams::for_index(0);
        params.visual_style = VisualStyle::Original;
        params.sphere_radius = 1.0;
        let ctx = BoundaryContext::new(&params, 16.0 / 9.0, 0.0);

        let pos = Vec3::new(1.0, 0.0, 0.0);
        let (clamped, vel) = BoundaryPolicy::Sphere.clamp(pos, Vec3::ZERO, &ctx);

        assert!(clamped.length() >= 0.99 && clamped.length() <= 1.01);
        assert_eq!(vel, Vec3::ZERO);
    }

    #[test]
    fn test_original_sphere_pullback_reduces_overflow() {
        let mut params = GroupParams::for_index(0);
        params.visual_style = VisualStyle::Original;
        params.sphere_radius = 1.0;
        let ctx = BoundaryContext::new(&params, 1.0, 0.0);

        let pos = Vec3::new(1.5, 0.0, 0.0);
        let vel = Vec3::new(0.3, 0.0, 0.0);
        let (clamped, damped) = BoundaryPolicy::Sphere.clamp(pos, vel, &ctx);

        assert!(clamped.length() < 1.5);
        assert!(clamped.length() > 1.0, "soft pullback, not a hard stop");
        assert!(damped.x < vel.x);
    }

    #[test]
    fn test_modern_sphere_projects_to_surface() {
        let params = GroupParams::for_index(0); // Modern by default
        let ctx = BoundaryContext::new(&params, 1.0, 0.0);

        let pos = Vec3::new(2.0, 2.0, 0.0);
        let vel = Vec3::new(0.4, 0.4, 0.0); // outward
        let (clamped, reflected) = BoundaryPolicy::Sphere.clamp(pos, vel, &ctx);

        let effective = params.sphere_radius; // min(1.8, 1.0)
        assert!((clamped.length() - effective).abs() < 1e-5);
        // Outward component reversed
        assert!(reflected.dot(clamped.normalize()) < 0.0);
    }

    #[test]
    fn test_box_clamp_inverts_axis_velocity() {
        let mut params = GroupParams::for_index(0);
        params.shape = Shape::Box;
        params.sphere_radius = 1.0;
        let ctx = BoundaryContext::new(&params, 16.0 / 9.0, 0.0);

        // limit_y = min(1.8, 1.0) = 1.0
        let pos = Vec3::new(0.0, 1.4, 0.0);
        let vel = Vec3::new(0.0, 0.2, 0.0);
        let (clamped, inverted) = BoundaryPolicy::Box.clamp(pos, vel, &ctx);

        assert_eq!(clamped.y, 1.0);
        assert_eq!(inverted.y, -0.1);
    }

    #[test]
    fn test_vortex_clamp_projects_ring_overflow() {
        let mut params = GroupParams::for_index(0);
        params.shape = Shape::Vortex;
        params.sphere_radius = 0.5;
        let ctx = BoundaryContext::new(&params, 1.0, 0.0);

        // limit_r = min(1.8 * 1.5, 0.5 * 3.0) = 1.5
        let pos = Vec3::new(3.0, 0.0, 4.0);
        let vel = Vec3::new(0.1, 0.0, 0.1);
        let (clamped, damped) = BoundaryPolicy::Vortex.clamp(pos, vel, &ctx);

        let ring = (clamped.x * clamped.x + clamped.z * clamped.z).sqrt();
        assert!((ring - 1.5).abs() < 1e-5);
        assert_eq!(damped.x, -0.02);
    }

    #[test]
    fn test_vortex_under_original_uses_sphere_policy() {
        assert_eq!(
            BoundaryPolicy::for_shape(Shape::Vortex, VisualStyle::Original),
            BoundaryPolicy::Sphere
        );
        assert_eq!(
            BoundaryPolicy::for_shape(Shape::Vortex, VisualStyle::Modern),
            BoundaryPolicy::Vortex
        );
    }

    #[test]
    fn test_box_group_stays_in_limits_and_recycles() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(0, &mut rng);
        group.params.shape = Shape::Box;
        group.params.sphere_radius = 1.0;
        group.params.particle_lifetime = 0.1;
        group.params.particle_count = 1_000;
        group.reinitialize(&mut rng);

        let initial_bases = group.base_positions.clone();
        let noise = NoiseField::new(1);
        let mut beat = BeatManager::new();

        // Derived limits with zero audio energy and 16:9 viewport
        let limit = Vec3::new(1.8, 1.0, 0.5);

        for frame_idx in 0..100 {
            let ctx = FrameContext::new(1.0 / 60.0, frame_idx as f32 / 60.0, 60.0, 16.0 / 9.0);
            beat.advance(ctx.delta_time);
            step_group(&mut group, &noise, &mut beat, None, &ctx, &mut rng);

            for i in 0..group.particle_count() {
                let p = group.position(i);
                assert!(p.x.abs() <= limit.x + 1e-4, "x escaped at frame {frame_idx}");
                assert!(p.y.abs() <= limit.y + 1e-4, "y escaped at frame {frame_idx}");
                assert!(p.z.abs() <= limit.z + 1e-4, "z escaped at frame {frame_idx}");
            }
        }

        // 100 frames at 60Hz is far beyond the 0.1s lifetime, so every
        // particle must have respawned (respawn rewrites the base anchor)
        for i in 0..group.particle_count() {
            let i3 = i * 3;
            assert_ne!(
                &group.base_positions[i3..i3 + 3],
                &initial_bases[i3..i3 + 3],
                "particle {i} never respawned"
            );
        }
    }

    #[test]
    fn test_disabled_group_is_untouched() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(1, &mut rng); // index 1 disabled
        let before = group.positions.clone();

        let noise = NoiseField::new(1);
        let mut beat = BeatManager::new();
        step_group(&mut group, &noise, &mut beat, None, &frame(60.0), &mut rng);

        assert_eq!(group.positions, before);
    }

    #[test]
    fn test_no_audio_keeps_rotation_speed() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(0, &mut rng);
        group.last_rotation_speed = 0.01;

        let noise = NoiseField::new(1);
        let mut beat = BeatManager::new();
        step_group(&mut group, &noise, &mut beat, None, &frame(60.0), &mut rng);

        assert_eq!(group.last_rotation_speed, 0.01);
        assert_eq!(group.rotation_angle, 0.01);
    }

    #[test]
    fn test_loud_beat_band_triggers_shared_wave() {
        let mut rng = rng();
        let mut group = ParticleGroup::new(0, &mut rng);
        let noise = NoiseField::new(1);
        let mut beat = BeatManager::new();

        // Uniform 230 is above the default threshold of 200
        let snapshot = FrequencySnapshot::new(vec![230; 1024], 44_100);
        step_group(
            &mut group,
            &noise,
            &mut beat,
            Some(&snapshot),
            &frame(60.0),
            &mut rng,
        );

        assert!(beat.is_wave_active());
        // A beat frame sets the effect to exactly 1.0; decay starts on
        // the next non-beat frame
        assert_eq!(group.beat_effects[0], 1.0);
    }
}

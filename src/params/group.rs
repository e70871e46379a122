//! Per-group simulation parameters and preset overlays.

/// Boundary/spawn shape of a particle group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    /// Volumetric sphere (default)
    #[default]
    Sphere,
    /// Wide, shallow box
    Box,
    /// Cylindrical column, disc-sampled in the XZ plane
    Vortex,
    /// Flat horizontal belt
    Horizontal,
}

impl Shape {
    /// Parse a shape name as presets and the CLI spell it
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sphere" => Some(Self::Sphere),
            "box" => Some(Self::Box),
            "vortex" => Some(Self::Vortex),
            "horizontal" => Some(Self::Horizontal),
            _ => None,
        }
    }
}

/// Force/damping profile selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualStyle {
    /// Audio-reactive multipliers on speed, turbulence, damping and radius
    #[default]
    Modern,
    /// Fixed multipliers, softer boundary behavior
    Original,
}

/// Number of independently configured particle groups
pub const GROUP_COUNT: usize = 5;

/// Default amplitude/beat frequency band per group index (Hz)
///
/// Sub-bass, bass, mid, high-mid, high. Indices past the table fall back
/// to the full spectrum.
pub const DEFAULT_BANDS_HZ: [(f32, f32); GROUP_COUNT] = [
    (20.0, 80.0),
    (120.0, 250.0),
    (250.0, 800.0),
    (1000.0, 4000.0),
    (5000.0, 10000.0),
];

/// Configuration of one particle group
///
/// Owned by the group and passed by reference into the simulation step;
/// there is no shared mutable configuration between groups.
#[derive(Debug, Clone)]
pub struct GroupParams {
    /// Simulation/visibility gate; disabling preserves buffers
    pub enabled: bool,

    /// Number of particles; mutation requires full buffer reallocation
    pub particle_count: usize,

    /// Rendered point half-extent (NDC units, depth-independent)
    pub particle_size: f32,

    /// Maximum particle lifetime (seconds); actual lifetimes are drawn
    /// uniformly from (0, particle_lifetime]
    pub particle_lifetime: f32,

    /// Boundary and spawn shape
    pub shape: Shape,

    /// Outer boundary radius (world units)
    pub sphere_radius: f32,

    /// Spawn-region radius as a fraction of sphere_radius (0..=1)
    pub inner_sphere_radius: f32,

    /// Rotation speed bounds (radians per frame), interpolated by volume
    pub rotation_speed_min: f32,
    pub rotation_speed_max: f32,

    /// Exponential smoothing factor for rotation speed changes (0..=1)
    pub rotation_smoothness: f32,

    /// Spatial frequency of the noise field sampled by particles
    pub noise_scale: f32,

    /// When set, noise_scale performs a bounded random walk on each peak
    pub dynamic_noise_scale: bool,

    /// Bounds and step of the noise-scale random walk
    pub min_noise_scale: f32,
    pub max_noise_scale: f32,
    pub noise_step: f32,

    /// Temporal phase speed of the noise field
    pub noise_speed: f32,

    /// Magnitude of the per-axis noise force added to velocity
    pub turbulence_strength: f32,

    /// Amplitude band (Hz) driving the group's energy scalar
    pub min_frequency: f32,
    pub max_frequency: f32,

    /// Separate band (Hz) driving beat detection
    pub min_frequency_beat: f32,
    pub max_frequency_beat: f32,

    /// Beat-band energy (0-255 scale) above which a wave is triggered
    pub beat_threshold: f32,

    /// Outward force applied per unit of beat effect
    pub beat_strength: f32,

    /// Ratio over the rolling average energy that counts as a peak
    pub peak_sensitivity: f32,

    /// Maximum per-frame normalized volume change accepted by the gate
    pub volume_change_threshold: f32,

    /// Pre-amplification applied to every frequency bin (clamped at 255)
    pub gain_multiplier: f32,

    /// Gradient endpoints (linear RGB)
    pub color_start: [f32; 3],
    pub color_end: [f32; 3],

    /// Force/damping profile
    pub visual_style: VisualStyle,
}

impl GroupParams {
    /// Defaults for a group index, seeded from the fixed band table
    ///
    /// Only group 0 starts enabled.
    pub fn for_index(index: usize) -> Self {
        let (band_min, band_max) = DEFAULT_BANDS_HZ
            .get(index)
            .copied()
            .unwrap_or((0.0, 22_050.0));

        Self {
            enabled: index == 0,
            particle_count: 5_000,
            particle_size: 0.003,
            particle_lifetime: 3.0,
            shape: Shape::Sphere,
            sphere_radius: 1.0,
            inner_sphere_radius: 0.25,
            rotation_speed_min: 0.0,
            rotation_speed_max: 0.065,
            rotation_smoothness: 0.3,
            noise_scale: 4.0,
            dynamic_noise_scale: true,
            min_noise_scale: 0.5,
            max_noise_scale: 5.0,
            noise_step: 0.2,
            noise_speed: 0.1,
            turbulence_strength: 0.005,
            min_frequency: band_min,
            max_frequency: band_max,
            min_frequency_beat: band_min,
            max_frequency_beat: band_max,
            beat_threshold: 200.0,
            beat_strength: 0.01,
            peak_sensitivity: 1.1,
            volume_change_threshold: 0.1,
            gain_multiplier: 1.0,
            color_start: rgb(0xff3366),
            color_end: rgb(0x3366ff),
            visual_style: VisualStyle::Modern,
        }
    }
}

/// Convert a packed 0xRRGGBB value to linear RGB components
pub fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Partial parameter update supplied by a named preset
///
/// Enumerates exactly the fields a preset may set; anything else in a
/// preset definition simply has no representation here.
#[derive(Debug, Clone, Default)]
pub struct PresetOverlay {
    pub enabled: Option<bool>,
    pub particle_count: Option<usize>,
    pub sphere_radius: Option<f32>,
    pub inner_sphere_radius: Option<f32>,
    pub particle_size: Option<f32>,
    pub noise_scale: Option<f32>,
    pub noise_speed: Option<f32>,
    pub turbulence_strength: Option<f32>,
    pub color_start: Option<[f32; 3]>,
    pub color_end: Option<[f32; 3]>,
    pub gain_multiplier: Option<f32>,
    pub shape: Option<Shape>,
    pub visual_style: Option<VisualStyle>,
}

impl PresetOverlay {
    /// Overlay the set fields onto `params`
    ///
    /// Returns true when `particle_count` changed, i.e. the caller must
    /// reinitialize buffers. Color gradients are reassigned by the caller
    /// unconditionally after a preset application.
    pub fn apply(&self, params: &mut GroupParams) -> bool {
        let previous_count = params.particle_count;

        if let Some(v) = self.enabled {
            params.enabled = v;
        }
        if let Some(v) = self.particle_count {
            params.particle_count = v;
        }
        if let Some(v) = self.sphere_radius {
            params.sphere_radius = v;
        }
        if let Some(v) = self.inner_sphere_radius {
            params.inner_sphere_radius = v;
        }
        if let Some(v) = self.particle_size {
            params.particle_size = v;
        }
        if let Some(v) = self.noise_scale {
            params.noise_scale = v;
        }
        if let Some(v) = self.noise_speed {
            params.noise_speed = v;
        }
        if let Some(v) = self.turbulence_strength {
            params.turbulence_strength = v;
        }
        if let Some(v) = self.color_start {
            params.color_start = v;
        }
        if let Some(v) = self.color_end {
            params.color_end = v;
        }
        if let Some(v) = self.gain_multiplier {
            params.gain_multiplier = v;
        }
        if let Some(v) = self.shape {
            params.shape = v;
        }
        if let Some(v) = self.visual_style {
            params.visual_style = v;
        }

        params.particle_count != previous_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bands_per_index() {
        let g0 = GroupParams::for_index(0);
        assert_eq!((g0.min_frequency, g0.max_frequency), (20.0, 80.0));
        assert!(g0.enabled);

        let g4 = GroupParams::for_index(4);
        assert_eq!((g4.min_frequency, g4.max_frequency), (5000.0, 10000.0));
        assert!(!g4.enabled);

        // Past the table: full spectrum
        let g9 = GroupParams::for_index(9);
        assert_eq!((g9.min_frequency, g9.max_frequency), (0.0, 22_050.0));
    }

    #[test]
    fn test_overlay_reports_count_change() {
        let mut params = GroupParams::for_index(0);

        let overlay = PresetOverlay {
            noise_scale: Some(2.0),
            ..Default::default()
        };
        assert!(!overlay.apply(&mut params));
        assert_eq!(params.noise_scale, 2.0);

        let overlay = PresetOverlay {
            particle_count: Some(10_000),
            ..Default::default()
        };
        assert!(overlay.apply(&mut params));
        assert_eq!(params.particle_count, 10_000);
    }

    #[test]
    fn test_rgb_unpacking() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0]);
        let c = rgb(0x3366ff);
        assert!((c[0] - 0x33 as f32 / 255.0).abs() < 1e-6);
        assert!((c[2] - 1.0).abs() < 1e-6);
    }
}

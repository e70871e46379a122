//! Parameter definitions with documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Documented ranges and meanings (Hz, seconds, world units)
//! - Type safety where possible

mod analysis;
mod group;
mod render;

// Re-export all types
pub use analysis::{audio_constants, peak_constants, FftConfig};
pub use group::{
    rgb, GroupParams, PresetOverlay, Shape, VisualStyle, DEFAULT_BANDS_HZ, GROUP_COUNT,
};
pub use render::{RecordingConfig, RenderConfig};

//! Audiosphere library - Audio-reactive particle visualizer

pub mod analysis;
pub mod audio;
pub mod beat;
pub mod camera;
pub mod group;
pub mod noise;
pub mod params;
pub mod presets;
pub mod rendering;
pub mod sim;

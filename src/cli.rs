//! Command-line argument parsing.

use clap::Parser;

use crate::audio::AudioInput;
use crate::params::RecordingConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Audiosphere")]
#[command(about = "Audio-reactive particle visualizer", long_about = None)]
pub struct Args {
    /// Start from a built-in preset (see --list-presets)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Print the built-in preset names and exit
    #[arg(long)]
    pub list_presets: bool,

    /// Audio source: synth (default) or mic
    #[arg(long, value_name = "SOURCE", default_value = "synth")]
    pub input: String,

    /// Seed for the noise field and particle spawning
    #[arg(long, value_name = "SEED", default_value = "0")]
    pub seed: u64,

    /// Slowly orbit the camera around the scene
    #[arg(long)]
    pub orbit: bool,

    /// Record frames and audio to disk (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,
}

impl Args {
    /// Resolve the audio input selection
    pub fn parse_input(&self) -> Result<AudioInput, String> {
        AudioInput::parse(&self.input)
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Result<Option<RecordingConfig>, String> {
        match self.record {
            Some(duration) => {
                let config = RecordingConfig::new(duration);

                std::fs::create_dir_all(config.frames_dir())
                    .map_err(|e| format!("Failed to create frames directory: {}", e))?;
                std::fs::create_dir_all(&config.output_dir)
                    .map_err(|e| format!("Failed to create output directory: {}", e))?;

                Ok(Some(config))
            }
            None => Ok(None),
        }
    }
}

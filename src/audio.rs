//! Audio input and FFT analysis system.
//!
//! Drives the visuals from one of two sources: the built-in Glicol
//! synth played through the default output device, or the default
//! microphone. Either way the sample stream feeds a background FFT
//! thread that publishes byte-scale frequency snapshots for the
//! simulation to poll.

mod fft;
mod synthesis;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glicol::Engine;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::analysis::FrequencySnapshot;
use crate::params::{audio_constants::BLOCK_SIZE, FftConfig, RecordingConfig};
use self::fft::spawn_fft_thread;
use self::synthesis::GLICOL_COMPOSITION;

type SharedWavWriter = Arc<Mutex<hound::WavWriter<std::io::BufWriter<std::fs::File>>>>;

/// Where the analyzed audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioInput {
    /// Built-in procedural synth, audible on the default output
    #[default]
    Synth,
    /// Default capture device; nothing is played back
    Mic,
}

impl AudioInput {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "synth" => Ok(Self::Synth),
            "mic" => Ok(Self::Mic),
            other => Err(format!("Unknown audio input '{}' (use synth or mic)", other)),
        }
    }
}

/// Audio system managing the input stream and FFT analysis
pub struct AudioSystem {
    /// Latest published spectrum (thread-safe)
    snapshot: Arc<Mutex<FrequencySnapshot>>,

    /// Audio stream (kept alive)
    _stream: cpal::Stream,

    /// FFT analysis thread handle (optional, for cleanup)
    _fft_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Create and start the audio system with the chosen input
    pub fn new(
        input: AudioInput,
        fft_config: FftConfig,
        recording_config: Option<&RecordingConfig>,
    ) -> Result<Self, String> {
        fft_config
            .validate()
            .map_err(|e| format!("Invalid FFT config: {}", e))?;

        // Create WAV writer if recording
        let wav_writer: Option<SharedWavWriter> = match recording_config {
            Some(config) => {
                let spec = hound::WavSpec {
                    channels: 2,
                    sample_rate: fft_config.sample_rate_hz as u32,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = hound::WavWriter::create(config.audio_path(), spec)
                    .map_err(|e| format!("Failed to create WAV writer: {}", e))?;
                Some(Arc::new(Mutex::new(writer)))
            }
            None => None,
        };

        let fft_buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let snapshot = Arc::new(Mutex::new(FrequencySnapshot::new(
            Vec::new(),
            fft_config.sample_rate_hz,
        )));

        let stream = match input {
            AudioInput::Synth => {
                build_synth_stream(&fft_config, Arc::clone(&fft_buffer), wav_writer)?
            }
            AudioInput::Mic => build_mic_stream(Arc::clone(&fft_buffer), wav_writer)?,
        };

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        let fft_thread = spawn_fft_thread(fft_config, fft_buffer, Arc::clone(&snapshot));

        Ok(Self {
            snapshot,
            _stream: stream,
            _fft_thread: Some(fft_thread),
        })
    }

    /// Clone the latest frequency snapshot (thread-safe)
    pub fn snapshot(&self) -> FrequencySnapshot {
        self.snapshot.lock().unwrap().clone()
    }
}

/// Output stream rendering the Glicol composition; the left channel is
/// accumulated for analysis
fn build_synth_stream(
    fft_config: &FftConfig,
    fft_buffer: Arc<Mutex<Vec<f32>>>,
    wav_writer: Option<SharedWavWriter>,
) -> Result<cpal::Stream, String> {
    let mut engine = Engine::<BLOCK_SIZE>::new();
    engine.set_sr(fft_config.sample_rate_hz);
    engine.update_with_code(GLICOL_COMPOSITION);
    engine
        .update()
        .map_err(|e| format!("Glicol engine init failed: {:?}", e))?;

    let engine = Arc::new(Mutex::new(engine));
    let engine_clone = Arc::clone(&engine);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("No audio output device found")?;

    let config = device
        .default_output_config()
        .map_err(|e| format!("Failed to get audio config: {}", e))?;

    println!(
        "Audio output: {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate().0
    );

    device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut engine = engine_clone.lock().unwrap();
                let mut fft_buf = fft_buffer.lock().unwrap();

                let frames_needed = data.len() / 2; // Stereo frames
                let mut frame_idx = 0;

                // Generate multiple blocks if needed to fill the entire buffer
                while frame_idx < frames_needed {
                    let (buffers, _) = engine.next_block(vec![]);

                    let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                    for i in 0..samples_to_copy {
                        // Safety limiter: hard clip to ±0.5 to prevent ear damage
                        let left = buffers[0][i].clamp(-0.5, 0.5);
                        let right = buffers[1][i].clamp(-0.5, 0.5);

                        let out_idx = (frame_idx + i) * 2;
                        data[out_idx] = left;
                        data[out_idx + 1] = right;

                        fft_buf.push(left); // Accumulate for FFT analysis

                        if let Some(ref writer) = wav_writer {
                            if let Ok(mut w) = writer.lock() {
                                let _ = w.write_sample(left);
                                let _ = w.write_sample(right);
                            }
                        }
                    }

                    frame_idx += samples_to_copy;
                }
            },
            |err| eprintln!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| format!("Failed to build audio stream: {}", e))
}

/// Capture stream from the default input device; channels are averaged
/// to mono before analysis
fn build_mic_stream(
    fft_buffer: Arc<Mutex<Vec<f32>>>,
    wav_writer: Option<SharedWavWriter>,
) -> Result<cpal::Stream, String> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or("No audio input device found")?;

    let config = device
        .default_input_config()
        .map_err(|e| format!("Failed to get audio config: {}", e))?;

    println!(
        "Audio input: {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate().0
    );

    let channels = config.channels() as usize;

    device
        .build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut fft_buf = fft_buffer.lock().unwrap();

                for frame in data.chunks(channels) {
                    let mono = frame.iter().sum::<f32>() / channels as f32;
                    fft_buf.push(mono);

                    if let Some(ref writer) = wav_writer {
                        if let Ok(mut w) = writer.lock() {
                            let _ = w.write_sample(mono);
                            let _ = w.write_sample(mono);
                        }
                    }
                }
            },
            |err| eprintln!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| format!("Failed to build audio stream: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_input_parsing() {
        assert_eq!(AudioInput::parse("synth").unwrap(), AudioInput::Synth);
        assert_eq!(AudioInput::parse("MIC").unwrap(), AudioInput::Mic);
        assert!(AudioInput::parse("file").is_err());
    }
}

//! FFT analysis thread: raw samples in, byte-scale spectrum out.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::analysis::FrequencySnapshot;
use crate::params::FftConfig;

/// Spawn the analysis thread.
///
/// Drains half the sample buffer per pass (50% overlap) and publishes a
/// fresh snapshot of `fft_size / 2` byte magnitudes. The thread runs for
/// the life of the process; the stream side only ever appends samples.
pub fn spawn_fft_thread(
    config: FftConfig,
    fft_buffer: Arc<Mutex<Vec<f32>>>,
    snapshot: Arc<Mutex<FrequencySnapshot>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let mut fft_input = vec![Complex::new(0.0, 0.0); config.fft_size];
        let mut magnitudes = vec![0u8; config.bin_count()];

        loop {
            thread::sleep(Duration::from_millis(config.update_interval_ms));

            let mut fft_buf = fft_buffer.lock().unwrap();
            if fft_buf.len() < config.fft_size {
                continue;
            }

            for i in 0..config.fft_size {
                let window = hann_window(i, config.fft_size);
                fft_input[i] = Complex::new(fft_buf[i] * window, 0.0);
            }

            // 50% overlap between successive analysis windows
            fft_buf.drain(0..config.fft_size / 2);
            drop(fft_buf);

            fft.process(&mut fft_input);

            for (i, byte) in magnitudes.iter_mut().enumerate() {
                let amplitude = fft_input[i].norm() * 2.0 / config.fft_size as f32;
                *byte = magnitude_to_byte(amplitude, &config);
            }

            let mut out = snapshot.lock().unwrap();
            out.magnitudes.clear();
            out.magnitudes.extend_from_slice(&magnitudes);
            out.sample_rate_hz = config.sample_rate_hz;
        }
    })
}

/// Map a linear amplitude onto the 0-255 byte scale through the
/// configured decibel window
pub fn magnitude_to_byte(amplitude: f32, config: &FftConfig) -> u8 {
    let db = 20.0 * amplitude.max(1e-10).log10();
    let normalized = (db - config.min_decibels) / (config.max_decibels - config.min_decibels);
    (normalized.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window() {
        let size = 2048;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_magnitude_to_byte_db_window() {
        let config = FftConfig::default(); // -100..-30 dB

        // Silence pins to the floor
        assert_eq!(magnitude_to_byte(0.0, &config), 0);

        // -30 dB (amplitude ~0.0316) and above saturate
        assert_eq!(magnitude_to_byte(0.0317, &config), 255);
        assert_eq!(magnitude_to_byte(1.0, &config), 255);

        // -65 dB sits at the midpoint of the window
        let mid = magnitude_to_byte(10f32.powf(-65.0 / 20.0), &config);
        assert!((126..=129).contains(&mid), "midpoint byte was {mid}");
    }

    #[test]
    fn test_magnitude_to_byte_is_monotonic() {
        let config = FftConfig::default();
        let mut last = 0u8;
        for i in 1..100 {
            let byte = magnitude_to_byte(i as f32 * 1e-4, &config);
            assert!(byte >= last);
            last = byte;
        }
    }
}

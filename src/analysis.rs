//! Frequency-spectrum analysis feeding the particle simulation.
//!
//! Converts a raw per-bin magnitude snapshot into per-group energy
//! scalars, peak/beat booleans and a gated volume signal. All paths are
//! total: a missing audio source or an empty band slice degrades to zero
//! energy rather than failing, so the frame loop never stalls on
//! data-quality problems.

use std::collections::VecDeque;

use crate::params::{peak_constants, GroupParams};

/// One frame of frequency-domain audio, polled by the simulation
///
/// Magnitudes use the 0-255 byte scale; `sample_rate_hz / 2` spans the
/// full bin range.
#[derive(Debug, Clone, Default)]
pub struct FrequencySnapshot {
    pub magnitudes: Vec<u8>,
    pub sample_rate_hz: usize,
}

impl FrequencySnapshot {
    pub fn new(magnitudes: Vec<u8>, sample_rate_hz: usize) -> Self {
        Self {
            magnitudes,
            sample_rate_hz,
        }
    }
}

/// Per-group scalar drive signals extracted from one snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectrumFeatures {
    /// Normalized 0-1 energy across the group's amplitude band
    pub average: f32,

    /// Raw 0-255 mean over the amplitude band, gain-adjusted
    pub range_energy: f32,

    /// Raw 0-255 mean over the separate beat band, gain-adjusted
    pub range_energy_beat: f32,

    /// Amplitude-band energy exceeded the rolling average outside the
    /// refractory window
    pub peak_detected: bool,
}

/// Rolling energy history and refractory state for peak detection
#[derive(Debug, Clone)]
pub struct PeakDetector {
    energy_history: VecDeque<f32>,
    history_length: usize,
    last_peak_time: f64,
    min_time_between_peaks: f64,
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self {
            energy_history: VecDeque::new(),
            history_length: peak_constants::HISTORY_LENGTH,
            last_peak_time: f64::NEG_INFINITY,
            min_time_between_peaks: peak_constants::MIN_TIME_BETWEEN_PEAKS_S,
        }
    }
}

impl PeakDetector {
    /// Push an energy sample and test it against the rolling average.
    ///
    /// `sensitivity` is the ratio over the average that counts as a peak;
    /// `now_s` is wall-clock seconds for the refractory window.
    pub fn observe(&mut self, energy: f32, sensitivity: f32, now_s: f64) -> bool {
        self.energy_history.push_back(energy);
        if self.energy_history.len() > self.history_length {
            self.energy_history.pop_front();
        }

        let average: f32 =
            self.energy_history.iter().sum::<f32>() / self.energy_history.len() as f32;

        let peak = energy > average * sensitivity
            && now_s - self.last_peak_time > self.min_time_between_peaks;
        if peak {
            self.last_peak_time = now_s;
        }
        peak
    }

    /// Drop accumulated history (used when a group is reinitialized)
    pub fn reset(&mut self) {
        self.energy_history.clear();
        self.last_peak_time = f64::NEG_INFINITY;
    }
}

/// Map a frequency in Hz to a bin index, rounding to the nearest bin
fn bin_index(freq_hz: f32, sample_rate_hz: usize, bin_count: usize) -> usize {
    if sample_rate_hz == 0 || bin_count == 0 {
        return 0;
    }
    let nyquist = sample_rate_hz as f32 / 2.0;
    (freq_hz / nyquist * bin_count as f32).round() as usize
}

/// Gain-adjusted mean magnitude over an inclusive Hz band
///
/// A band that rounds down to zero bins yields 0, not a division fault.
fn band_energy(snapshot: &FrequencySnapshot, min_hz: f32, max_hz: f32, gain: f32) -> f32 {
    let bin_count = snapshot.magnitudes.len();
    if bin_count == 0 {
        return 0.0;
    }

    // A band starting above Nyquist covers no bins; only the inclusive
    // upper end clamps onto the last bin
    let lo = bin_index(min_hz, snapshot.sample_rate_hz, bin_count);
    if lo >= bin_count {
        return 0.0;
    }
    let hi = bin_index(max_hz, snapshot.sample_rate_hz, bin_count).min(bin_count - 1);
    if hi < lo {
        return 0.0;
    }

    let slice = &snapshot.magnitudes[lo..=hi];
    let sum: f32 = slice
        .iter()
        .map(|&m| (m as f32 * gain).min(255.0))
        .sum();
    sum / slice.len() as f32
}

/// Extract the group's drive signals from the current snapshot
///
/// Pure except for the peak detector's rolling state. Callers without a
/// connected audio source should use `SpectrumFeatures::default()`.
pub fn analyze_group(
    snapshot: &FrequencySnapshot,
    params: &GroupParams,
    peak: &mut PeakDetector,
    now_s: f64,
) -> SpectrumFeatures {
    if snapshot.magnitudes.is_empty() {
        return SpectrumFeatures::default();
    }

    let gain = params.gain_multiplier;
    let range_energy = band_energy(snapshot, params.min_frequency, params.max_frequency, gain);
    let range_energy_beat = band_energy(
        snapshot,
        params.min_frequency_beat,
        params.max_frequency_beat,
        gain,
    );

    let peak_detected = peak.observe(range_energy, params.peak_sensitivity, now_s);

    SpectrumFeatures {
        average: range_energy / 255.0,
        range_energy,
        range_energy_beat,
        peak_detected,
    }
}

/// Smoothed-volume gate rejecting abrupt, likely-spurious volume jumps
///
/// The accepted value feeds rotation-speed interpolation; a rejected
/// sample leaves the stored value untouched and signals "no update".
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeGate {
    last_valid: Option<f32>,
}

impl VolumeGate {
    /// Offer a normalized volume sample; returns (accepted value, updated)
    ///
    /// The first sample always seeds the gate unconditionally.
    pub fn filter(&mut self, volume: f32, change_threshold: f32) -> (f32, bool) {
        match self.last_valid {
            None => {
                self.last_valid = Some(volume);
                (volume, true)
            }
            Some(last) => {
                if (volume - last).abs() <= change_threshold {
                    self.last_valid = Some(volume);
                    (volume, true)
                } else {
                    (last, false)
                }
            }
        }
    }
}

/// Normalized scene volume: mean of all bins over the byte scale
pub fn normalized_volume(snapshot: &FrequencySnapshot) -> f32 {
    if snapshot.magnitudes.is_empty() {
        return 0.0;
    }
    let sum: u32 = snapshot.magnitudes.iter().map(|&m| m as u32).sum();
    sum as f32 / snapshot.magnitudes.len() as f32 / 255.0
}

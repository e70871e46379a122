//! Audio analysis configuration and constants.

/// FFT analysis configuration
#[derive(Debug, Clone)]
pub struct FftConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2); bin count = fft_size / 2
    pub fft_size: usize,

    /// FFT update interval (milliseconds)
    pub update_interval_ms: u64,

    /// Magnitude-to-byte mapping floor (dB), 0 in the 0-255 snapshot
    pub min_decibels: f32,

    /// Magnitude-to-byte mapping ceiling (dB), 255 in the 0-255 snapshot
    pub max_decibels: f32,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44_100,
            fft_size: 2048,
            update_interval_ms: 16,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl FftConfig {
    /// Number of usable frequency bins (positive half of the spectrum)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if self.min_decibels >= self.max_decibels {
            return Err(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            ));
        }
        Ok(())
    }
}

/// Peak detection tuning shared by all groups
pub mod peak_constants {
    /// Rolling energy history length (samples)
    pub const HISTORY_LENGTH: usize = 30;

    /// Refractory period between detected peaks (seconds)
    pub const MIN_TIME_BETWEEN_PEAKS_S: f64 = 0.2;
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FftConfig::default().validate().is_ok());
        assert_eq!(FftConfig::default().bin_count(), 1024);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = FftConfig::default();
        config.fft_size = 1000;
        assert!(config.validate().is_err());

        let mut config = FftConfig::default();
        config.sample_rate_hz = 0;
        assert!(config.validate().is_err());

        let mut config = FftConfig::default();
        config.min_decibels = -10.0;
        assert!(config.validate().is_err());
    }
}

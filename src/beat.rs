//! Beat wave: a single outward-propagating radial impulse.
//!
//! One impulse system is shared by the whole scene rather than each
//! particle reacting to raw energy, so a beat reads as a coherent ripple
//! instead of uniform jitter.

use glam::Vec3;

/// Energy floor below which a trigger carries no strength (0-255 scale)
const TRIGGER_FLOOR: f32 = 200.0;

/// Strength multiplier applied to the normalized trigger energy
const TRIGGER_GAIN: f32 = 20.0;

/// Tracks the active impulse; idle when `is_wave_active` is false
#[derive(Debug, Clone, Default)]
pub struct BeatManager {
    current_wave_radius: f32,
    wave_strength: f32,
    is_wave_active: bool,
}

impl BeatManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_wave_active(&self) -> bool {
        self.is_wave_active
    }

    pub fn wave_radius(&self) -> f32 {
        self.current_wave_radius
    }

    /// Launch a wave from the beat-band energy (0-255 scale).
    ///
    /// A trigger while a wave is already active is dropped; there is no
    /// queueing or restart for rapid successive beats.
    pub fn trigger(&mut self, energy: f32) {
        if self.is_wave_active {
            return;
        }
        let normalized = ((energy - TRIGGER_FLOOR) / (255.0 - TRIGGER_FLOOR)).clamp(0.0, 1.0);
        self.wave_strength = normalized * TRIGGER_GAIN;
        self.current_wave_radius = 0.0;
        self.is_wave_active = true;
    }

    /// Advance the wave by one frame; returns to idle once the shell has
    /// traveled past radius 1.0 or decayed below strength 0.1
    pub fn advance(&mut self, delta_time: f32) {
        if !self.is_wave_active {
            return;
        }
        self.current_wave_radius += delta_time;
        self.wave_strength *= 0.98;

        if self.current_wave_radius > 1.0 || self.wave_strength < 0.1 {
            self.is_wave_active = false;
        }
    }

    /// Radial force magnitude at a position: a thin traveling shell of
    /// exponentially decaying strength, zero when idle
    pub fn force_at(&self, position: Vec3) -> f32 {
        if !self.is_wave_active {
            return 0.0;
        }
        let distance_from_wave = (position.length() - self.current_wave_radius).abs();
        if distance_from_wave < 0.1 {
            self.wave_strength * (-distance_from_wave * 10.0).exp()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_expires_after_one_second() {
        let mut beat = BeatManager::new();
        beat.trigger(220.0);
        assert!(beat.is_wave_active());
        assert!(beat.force_at(Vec3::ZERO) > 0.0);

        // >1.0s of simulated time at 60Hz
        for _ in 0..70 {
            beat.advance(0.016);
        }

        assert!(!beat.is_wave_active());
        for p in [Vec3::ZERO, Vec3::ONE, Vec3::new(0.0, 0.5, 0.0)] {
            assert_eq!(beat.force_at(p), 0.0);
        }
    }

    #[test]
    fn test_force_is_a_shell_around_the_radius() {
        let mut beat = BeatManager::new();
        beat.trigger(255.0);
        beat.advance(0.5);
        assert!(beat.is_wave_active());

        let on_shell = Vec3::new(beat.wave_radius(), 0.0, 0.0);
        let far_inside = Vec3::ZERO;
        assert!(beat.force_at(on_shell) > 0.0);
        assert_eq!(beat.force_at(far_inside), 0.0);
    }

    #[test]
    fn test_trigger_while_active_is_dropped() {
        // Documented behavior: no queueing, no restart
        let mut beat = BeatManager::new();
        beat.trigger(220.0);
        beat.advance(0.5);
        let radius_before = beat.wave_radius();

        beat.trigger(255.0);
        assert_eq!(beat.wave_radius(), radius_before);
    }

    #[test]
    fn test_low_energy_trigger_dies_immediately() {
        let mut beat = BeatManager::new();
        beat.trigger(150.0);
        // Strength clamps to zero; the next advance deactivates
        beat.advance(0.016);
        assert!(!beat.is_wave_active());
    }
}

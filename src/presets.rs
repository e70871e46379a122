//! Built-in scene presets.
//!
//! A preset is one overlay per group, applied in index order. Fields a
//! preset leaves unset keep their current value, so presets layer over
//! whatever configuration is already live.

use crate::params::{rgb, PresetOverlay, Shape, VisualStyle, GROUP_COUNT};

/// A named bundle of per-group parameter overlays
pub struct Preset {
    pub name: &'static str,
    pub groups: [PresetOverlay; GROUP_COUNT],
}

/// Names of all built-in presets, in menu order
pub fn names() -> Vec<&'static str> {
    all().into_iter().map(|p| p.name).collect()
}

/// Look up a preset by name, case-insensitively
pub fn find(name: &str) -> Option<Preset> {
    all()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

fn off() -> PresetOverlay {
    PresetOverlay {
        enabled: Some(false),
        ..Default::default()
    }
}

fn on(color_start: u32, color_end: u32) -> PresetOverlay {
    PresetOverlay {
        enabled: Some(true),
        color_start: Some(rgb(color_start)),
        color_end: Some(rgb(color_end)),
        ..Default::default()
    }
}

fn all() -> Vec<Preset> {
    vec![
        Preset {
            name: "Cosmic Storm",
            groups: [
                PresetOverlay {
                    particle_count: Some(20_000),
                    sphere_radius: Some(1.4),
                    turbulence_strength: Some(0.012),
                    noise_speed: Some(0.25),
                    ..on(0x8844ff, 0x220066)
                },
                PresetOverlay {
                    shape: Some(Shape::Vortex),
                    turbulence_strength: Some(0.01),
                    ..on(0xaa66ff, 0x4411aa)
                },
                PresetOverlay {
                    particle_count: Some(8_000),
                    ..on(0x6633cc, 0x110033)
                },
                on(0xccaaff, 0x332266),
                on(0xffffff, 0x8844ff),
            ],
        },
        Preset {
            name: "Neon Dreams",
            groups: [
                PresetOverlay {
                    particle_count: Some(12_000),
                    ..on(0xff2299, 0x00eeff)
                },
                PresetOverlay {
                    shape: Some(Shape::Box),
                    sphere_radius: Some(1.2),
                    ..on(0x00ffcc, 0xff00ff)
                },
                on(0xffee00, 0xff2299),
                off(),
                off(),
            ],
        },
        Preset {
            name: "Deep Bass",
            groups: [
                PresetOverlay {
                    particle_count: Some(30_000),
                    sphere_radius: Some(1.6),
                    gain_multiplier: Some(1.5),
                    noise_speed: Some(0.05),
                    ..on(0xff3300, 0x660000)
                },
                PresetOverlay {
                    particle_count: Some(15_000),
                    gain_multiplier: Some(1.3),
                    ..on(0xff8800, 0x331100)
                },
                off(),
                off(),
                off(),
            ],
        },
        Preset {
            name: "Electric Pulse",
            groups: [
                PresetOverlay {
                    noise_speed: Some(0.4),
                    turbulence_strength: Some(0.015),
                    ..on(0xffff00, 0xffffff)
                },
                off(),
                off(),
                PresetOverlay {
                    noise_speed: Some(0.3),
                    ..on(0x00ffff, 0xffff66)
                },
                on(0xffffff, 0x66ffff),
            ],
        },
        Preset {
            name: "Galaxy Spiral",
            groups: [
                PresetOverlay {
                    shape: Some(Shape::Vortex),
                    particle_count: Some(25_000),
                    sphere_radius: Some(1.3),
                    noise_speed: Some(0.06),
                    ..on(0xffffff, 0x3366ff)
                },
                PresetOverlay {
                    shape: Some(Shape::Vortex),
                    sphere_radius: Some(0.8),
                    ..on(0xffeecc, 0x9944ff)
                },
                PresetOverlay {
                    shape: Some(Shape::Sphere),
                    inner_sphere_radius: Some(0.1),
                    ..on(0xffffcc, 0xff9944)
                },
                off(),
                off(),
            ],
        },
        Preset {
            name: "Fire Dance",
            groups: [
                PresetOverlay {
                    shape: Some(Shape::Horizontal),
                    turbulence_strength: Some(0.014),
                    noise_speed: Some(0.35),
                    ..on(0xff4400, 0xffcc00)
                },
                PresetOverlay {
                    sphere_radius: Some(0.9),
                    ..on(0xff0000, 0xff8800)
                },
                on(0xffee88, 0xff4400),
                off(),
                off(),
            ],
        },
        Preset {
            name: "Ocean Waves",
            groups: [
                PresetOverlay {
                    shape: Some(Shape::Horizontal),
                    particle_count: Some(18_000),
                    sphere_radius: Some(1.4),
                    noise_speed: Some(0.08),
                    visual_style: Some(VisualStyle::Original),
                    ..on(0x0044ff, 0x00ffee)
                },
                PresetOverlay {
                    shape: Some(Shape::Horizontal),
                    sphere_radius: Some(1.0),
                    ..on(0x0088cc, 0xccffff)
                },
                off(),
                on(0xffffff, 0x66ccff),
                off(),
            ],
        },
        Preset {
            name: "Aurora Borealis",
            groups: [
                PresetOverlay {
                    shape: Some(Shape::Horizontal),
                    sphere_radius: Some(1.5),
                    turbulence_strength: Some(0.004),
                    noise_speed: Some(0.05),
                    ..on(0x00ff88, 0x8800ff)
                },
                PresetOverlay {
                    shape: Some(Shape::Horizontal),
                    ..on(0x44ffaa, 0x4400cc)
                },
                on(0xaaffee, 0xcc66ff),
                off(),
                off(),
            ],
        },
        Preset {
            name: "Supernova",
            groups: [
                PresetOverlay {
                    particle_count: Some(40_000),
                    sphere_radius: Some(1.7),
                    inner_sphere_radius: Some(0.05),
                    turbulence_strength: Some(0.02),
                    gain_multiplier: Some(1.4),
                    ..on(0xffffff, 0xffcc00)
                },
                PresetOverlay {
                    particle_count: Some(10_000),
                    sphere_radius: Some(1.2),
                    ..on(0xffee99, 0xff3300)
                },
                on(0xff6600, 0x330000),
                on(0xffffcc, 0xff9900),
                off(),
            ],
        },
        Preset {
            name: "Midnight Bloom",
            groups: [
                PresetOverlay {
                    particle_count: Some(6_000),
                    sphere_radius: Some(0.7),
                    noise_speed: Some(0.04),
                    turbulence_strength: Some(0.003),
                    ..on(0x330066, 0xff66cc)
                },
                PresetOverlay {
                    sphere_radius: Some(0.5),
                    ..on(0x660099, 0x220044)
                },
                off(),
                off(),
                off(),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{MAX_PARTICLE_COUNT, MIN_PARTICLE_COUNT};
    use crate::params::GroupParams;

    #[test]
    fn test_preset_catalog() {
        let names = names();
        assert_eq!(names.len(), 10);
        assert!(names.contains(&"Cosmic Storm"));
        assert!(names.contains(&"Midnight Bloom"));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert!(find("deep bass").is_some());
        assert!(find("DEEP BASS").is_some());
        assert!(find("deep brass").is_none());
    }

    #[test]
    fn test_preset_counts_stay_within_bounds() {
        for preset in all() {
            for overlay in &preset.groups {
                if let Some(count) = overlay.particle_count {
                    assert!(
                        (MIN_PARTICLE_COUNT..=MAX_PARTICLE_COUNT).contains(&count),
                        "{}: count {} out of bounds",
                        preset.name,
                        count
                    );
                }
            }
        }
    }

    #[test]
    fn test_preset_applies_cleanly() {
        let preset = find("Ocean Waves").unwrap();
        let mut params = GroupParams::for_index(0);
        preset.groups[0].apply(&mut params);

        assert_eq!(params.shape, Shape::Horizontal);
        assert_eq!(params.visual_style, VisualStyle::Original);
        assert!(params.enabled);
    }
}

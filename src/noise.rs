//! Seeded 3D gradient noise driving particle turbulence.
//!
//! Classic Perlin noise with a shuffled permutation table, quintic fade
//! curve and trilinear interpolation across the 8 lattice corners. Output
//! is deterministic for a given seed and stays within [-1, 1].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Deterministic 3D gradient-noise field
pub struct NoiseField {
    /// 256-entry permutation duplicated to 512 to avoid modulo branching
    perm: [u8; 512],
}

impl NoiseField {
    /// Build the permutation table from a seeded uniform shuffle
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut p: [u8; 256] = std::array::from_fn(|i| i as u8);
        p.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = p[i & 255];
        }
        Self { perm }
    }

    /// Sample the field at a point; pure function once constructed
    pub fn sample(&self, x: f32, y: f32, z: f32) -> f32 {
        let xi = (x.floor() as i32 & 255) as usize;
        let yi = (y.floor() as i32 & 255) as usize;
        let zi = (z.floor() as i32 & 255) as usize;

        let x = x - x.floor();
        let y = y - y.floor();
        let z = z - z.floor();

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let perm = &self.perm;
        let a = perm[xi] as usize + yi;
        let aa = perm[a] as usize + zi;
        let ab = perm[a + 1] as usize + zi;
        let b = perm[xi + 1] as usize + yi;
        let ba = perm[b] as usize + zi;
        let bb = perm[b + 1] as usize + zi;

        lerp(
            w,
            lerp(
                v,
                lerp(
                    u,
                    grad(perm[aa], x, y, z),
                    grad(perm[ba], x - 1.0, y, z),
                ),
                lerp(
                    u,
                    grad(perm[ab], x, y - 1.0, z),
                    grad(perm[bb], x - 1.0, y - 1.0, z),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(perm[aa + 1], x, y, z - 1.0),
                    grad(perm[ba + 1], x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(perm[ab + 1], x, y - 1.0, z - 1.0),
                    grad(perm[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }
}

/// Quintic fade curve 6t^5 - 15t^4 + 10t^3
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

/// Gradient hash: picks one of 12 edge directions from the low hash bits
fn grad(hash: u8, x: f32, y: f32, z: f32) -> f32 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_deterministic_per_seed() {
        let a = NoiseField::new(42);
        let b = NoiseField::new(42);
        let c = NoiseField::new(7);

        let mut differs = false;
        for i in 0..100 {
            let p = i as f32 * 0.37;
            assert_eq!(a.sample(p, p * 0.5, -p), b.sample(p, p * 0.5, -p));
            if a.sample(p, p * 0.5, -p) != c.sample(p, p * 0.5, -p) {
                differs = true;
            }
        }
        assert!(differs, "different seeds should produce different fields");
    }

    #[test]
    fn test_output_range() {
        let field = NoiseField::new(1);
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..10_000 {
            let x = rng.gen_range(-100.0..100.0);
            let y = rng.gen_range(-100.0..100.0);
            let z = rng.gen_range(-100.0..100.0);
            let v = field.sample(x, y, z);
            assert!((-1.0..=1.0).contains(&v), "sample {v} out of range");
        }
    }

    #[test]
    fn test_continuity_at_small_offsets() {
        let field = NoiseField::new(5);
        let base = field.sample(1.5, 2.5, 3.5);
        let nearby = field.sample(1.5001, 2.5, 3.5);
        assert!((base - nearby).abs() < 0.01);
    }

    #[test]
    fn test_zero_at_lattice_points() {
        // Classic Perlin is zero on integer lattice coordinates
        let field = NoiseField::new(3);
        for i in 0..8 {
            assert_eq!(field.sample(i as f32, 0.0, 0.0), 0.0);
        }
    }
}

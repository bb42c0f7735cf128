//! Layered 2D coherent noise and its normalization policies.
#![forbid(unsafe_code)]

mod field;

pub use field::HeightField;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use horizon_geom::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

/// Smallest accepted noise scale; anything at or below zero is raised to it.
pub const MIN_SCALE: f32 = 0.0001;
/// Octave offsets are drawn uniformly from `[-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE)`.
pub const OCTAVE_OFFSET_RANGE: i32 = 100_000;
// Global mode divides by the amplitude sum scaled by this factor.
const GLOBAL_HEADROOM: f32 = 0.9;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Rescale by the min/max observed in the generated grid.
    #[default]
    Local,
    /// Rescale by the theoretical amplitude sum so neighbouring grids line up.
    Global,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseSettings {
    pub seed: i32,
    pub scale: f32,
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: Vec2,
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Local,
        }
    }
}

impl NoiseSettings {
    /// Clamps out-of-domain values instead of rejecting them.
    pub fn sanitized(&self) -> Self {
        Self {
            scale: if self.scale <= 0.0 || self.scale.is_nan() {
                MIN_SCALE
            } else {
                self.scale
            },
            octaves: self.octaves.max(0),
            persistence: if self.persistence.is_nan() {
                0.0
            } else {
                self.persistence.clamp(0.0, 1.0)
            },
            lacunarity: if self.lacunarity.is_nan() {
                1.0
            } else {
                self.lacunarity.max(1.0)
            },
            ..self.clone()
        }
    }

    pub fn with_offset(&self, offset: Vec2) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }
}

/// Per-octave sample offsets. The caller offset is added on X and subtracted on Y.
pub fn octave_offsets(seed: i32, octaves: i32, offset: Vec2) -> Vec<Vec2> {
    let mut prng = ChaCha8Rng::seed_from_u64(seed as i64 as u64);
    (0..octaves.max(0))
        .map(|_| {
            let ox = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 + offset.x;
            let oy = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 - offset.y;
            Vec2::new(ox, oy)
        })
        .collect()
}

/// Sum of octave amplitudes: the largest magnitude a layered sample can reach.
pub fn max_possible_height(octaves: i32, persistence: f32) -> f32 {
    let mut total = 0.0f32;
    let mut amplitude = 1.0f32;
    for _ in 0..octaves.max(0) {
        total += amplitude;
        amplitude *= persistence;
    }
    total
}

#[inline]
fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if a == b {
        0.0
    } else {
        ((v - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Deterministic 2D gradient-noise sampler. The lattice is fixed; seeds vary
/// the output through the per-octave offsets only.
pub struct NoiseField {
    perlin: FastNoiseLite,
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseField {
    pub fn new() -> Self {
        let mut perlin = FastNoiseLite::with_seed(0);
        perlin.set_noise_type(Some(NoiseType::Perlin));
        perlin.set_frequency(Some(1.0));
        Self { perlin }
    }

    /// Single noise sample remapped into `[0, 1]`.
    #[inline]
    pub fn sample01(&self, x: f32, y: f32) -> f32 {
        (self.perlin.get_noise_2d(x, y) * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Generates an unbordered `width x height` grid and normalizes it per `settings.normalize_mode`.
    pub fn generate(&self, width: usize, height: usize, settings: &NoiseSettings) -> HeightField {
        let s = settings.sanitized();
        let offsets = octave_offsets(s.seed, s.octaves, s.offset);
        let max_possible = max_possible_height(s.octaves, s.persistence);

        let half_width = width as f32 / 2.0;
        let half_height = height as f32 / 2.0;
        let mut map = HeightField::new(width, height);
        let mut min_local = f32::MAX;
        let mut max_local = f32::MIN;

        for y in 0..height {
            for x in 0..width {
                let mut amplitude = 1.0f32;
                let mut frequency = 1.0f32;
                let mut noise_height = 0.0f32;
                for o in &offsets {
                    let sx = (x as f32 - half_width + o.x) / s.scale * frequency;
                    let sy = (y as f32 - half_height + o.y) / s.scale * frequency;
                    let v = self.sample01(sx, sy) * 2.0 - 1.0;
                    noise_height += v * amplitude;
                    amplitude *= s.persistence;
                    frequency *= s.lacunarity;
                }
                min_local = min_local.min(noise_height);
                max_local = max_local.max(noise_height);
                map.set(x, y, noise_height);
            }
        }

        match s.normalize_mode {
            NormalizeMode::Local => {
                for v in map.values_mut() {
                    *v = inverse_lerp(min_local, max_local, *v);
                }
            }
            NormalizeMode::Global => {
                for v in map.values_mut() {
                    *v = if max_possible > 0.0 {
                        ((*v + 1.0) / (max_possible / GLOBAL_HEADROOM)).max(0.0)
                    } else {
                        0.0
                    };
                }
            }
        }
        map
    }
}

/// Convenience wrapper building a fresh sampler per call.
pub fn generate_noise_map(width: usize, height: usize, settings: &NoiseSettings) -> HeightField {
    NoiseField::new().generate(width, height, settings)
}

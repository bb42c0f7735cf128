use horizon_geom::Vec2;
use horizon_noise::{HeightField, NoiseField};

use crate::params::{BORDER, TerrainParams};
use crate::region::ColorField;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Chunk centre in noise-space units.
    #[inline]
    pub fn centre(self, spacing: f32) -> Vec2 {
        Vec2::new(self.cx as f32 * spacing, self.cz as f32 * spacing)
    }

    /// Nearest chunk to a noise-space position.
    #[inline]
    pub fn containing(p: Vec2, spacing: f32) -> Self {
        Self::new(
            (p.x / spacing).round() as i32,
            (p.y / spacing).round() as i32,
        )
    }
}

/// Immutable per-chunk generation product.
#[derive(Clone, Debug)]
pub struct ChunkData {
    /// Bordered: side is `chunk_size + 2`.
    pub heights: HeightField,
    /// Interior only: side is `chunk_size`.
    pub colors: ColorField,
}

/// Generates the bordered height field around `centre` and classifies its interior.
pub fn build_chunk_data(centre: Vec2, params: &TerrainParams) -> ChunkData {
    build_chunk_data_with(&NoiseField::new(), centre, params)
}

pub fn build_chunk_data_with(noise: &NoiseField, centre: Vec2, params: &TerrainParams) -> ChunkData {
    let side = params.bordered_size();
    let settings = params.noise.with_offset(params.noise.offset + centre);
    let heights = noise.generate(side, side, &settings);
    let colors = ColorField::classify(&heights, BORDER, &params.regions);
    ChunkData { heights, colors }
}

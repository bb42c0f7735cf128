use std::error::Error;
use std::path::Path;

use horizon_geom::Vec2;
use horizon_noise::{MIN_SCALE, NoiseSettings};

use crate::config::{TerrainConfig, load_config_from_path};
use crate::curve::HeightCurve;
use crate::lod::{LodSpec, LodTable};
use crate::region::{Region, RegionTable};

/// Vertices per chunk side at LOD 0 with smooth shading.
pub const SMOOTH_CHUNK_SIZE: usize = 239;
/// Flat shading emits one vertex per triangle corner, so chunks are smaller.
pub const FLAT_CHUNK_SIZE: usize = 95;
pub const MAX_PREVIEW_LOD: u32 = 6;
/// Samples added on each side of a chunk's height field for seam normals.
pub const BORDER: usize = 1;

/// Flattened, sanitized snapshot of `TerrainConfig` for generation loops.
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub noise: NoiseSettings,
    pub height_multiplier: f32,
    pub height_curve: HeightCurve,
    pub flat_shading: bool,
    pub editor_preview_lod: u32,
    pub chunk_size: usize,
    pub regions: RegionTable,
    pub lods: LodTable,
    pub viewer_move_threshold: f32,
    pub world_scale: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self::from_config(&TerrainConfig::default())
    }
}

impl TerrainParams {
    pub fn from_config(cfg: &TerrainConfig) -> Self {
        let n = &cfg.noise;
        let noise = NoiseSettings {
            seed: n.seed,
            scale: n.scale,
            octaves: n.octaves,
            persistence: n.persistence,
            lacunarity: n.lacunarity,
            offset: Vec2::new(n.offset[0], n.offset[1]),
            normalize_mode: n.normalize_mode,
        }
        .sanitized();
        debug_assert!(noise.scale >= MIN_SCALE);

        let chunk_size = cfg
            .mesh
            .chunk_size
            .unwrap_or(if cfg.mesh.flat_shading {
                FLAT_CHUNK_SIZE
            } else {
                SMOOTH_CHUNK_SIZE
            })
            .max(2);

        let regions = RegionTable::new(
            cfg.regions
                .iter()
                .map(|r| Region {
                    name: r.name.clone(),
                    height: r.height,
                    color: r.color.rgba(),
                })
                .collect(),
            cfg.fallback_color.rgba(),
        );

        let mut lods = LodTable::new(
            cfg.lods
                .iter()
                .map(|l| LodSpec {
                    level: l.lod,
                    visible_distance: l.visible_distance,
                })
                .collect(),
        );
        if lods.is_empty() {
            lods = LodTable::default();
        }

        let world_scale = cfg.streaming.world_scale;
        Self {
            noise,
            height_multiplier: cfg.mesh.height_multiplier,
            height_curve: HeightCurve::from_keys(cfg.mesh.height_curve.iter().map(|k| (k[0], k[1]))),
            flat_shading: cfg.mesh.flat_shading,
            editor_preview_lod: cfg.mesh.editor_preview_lod.clamp(0, MAX_PREVIEW_LOD as i32) as u32,
            chunk_size,
            regions,
            lods,
            viewer_move_threshold: cfg.streaming.viewer_move_threshold.max(0.0),
            world_scale: if world_scale > 0.0 { world_scale } else { 1.0 },
        }
    }

    pub fn with_seed(&self, seed: i32) -> Self {
        let mut p = self.clone();
        p.noise.seed = seed;
        p
    }

    /// Distance between neighbouring chunk origins; edges are shared.
    #[inline]
    pub fn chunk_spacing(&self) -> f32 {
        (self.chunk_size - 1) as f32
    }

    #[inline]
    pub fn bordered_size(&self) -> usize {
        self.chunk_size + 2 * BORDER
    }

    #[inline]
    pub fn max_view_distance(&self) -> f32 {
        self.lods.max_view_distance()
    }
}

pub fn load_params_from_path(path: &Path) -> Result<TerrainParams, Box<dyn Error>> {
    let cfg = load_config_from_path(path)?;
    Ok(TerrainParams::from_config(&cfg))
}

use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use horizon_noise::NormalizeMode;

use crate::region::Rgba;

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub mesh: MeshConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionConfig>,
    #[serde(default = "default_lods")]
    pub lods: Vec<LodConfig>,
    #[serde(default = "default_fallback_color")]
    pub fallback_color: ConfigColor,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            mesh: MeshConfig::default(),
            streaming: StreamingConfig::default(),
            regions: default_regions(),
            lods: default_lods(),
            fallback_color: default_fallback_color(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NoiseConfig {
    #[serde(default)]
    pub seed: i32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_octaves")]
    pub octaves: i32,
    #[serde(default = "default_persistence")]
    pub persistence: f32,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f32,
    #[serde(default)]
    pub offset: [f32; 2],
    #[serde(default = "default_normalize_mode")]
    pub normalize_mode: NormalizeMode,
}
fn default_scale() -> f32 {
    50.0
}
fn default_octaves() -> i32 {
    4
}
fn default_persistence() -> f32 {
    0.5
}
fn default_lacunarity() -> f32 {
    2.0
}
fn default_normalize_mode() -> NormalizeMode {
    NormalizeMode::Global
}
impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: default_scale(),
            octaves: default_octaves(),
            persistence: default_persistence(),
            lacunarity: default_lacunarity(),
            offset: [0.0, 0.0],
            normalize_mode: default_normalize_mode(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MeshConfig {
    #[serde(default = "default_height_multiplier")]
    pub height_multiplier: f32,
    /// `[input, output]` keyframes; empty means identity.
    #[serde(default = "default_height_curve")]
    pub height_curve: Vec<[f32; 2]>,
    #[serde(default)]
    pub flat_shading: bool,
    #[serde(default)]
    pub editor_preview_lod: i32,
    /// Vertices per chunk side at LOD 0. Defaults depend on `flat_shading`.
    #[serde(default)]
    pub chunk_size: Option<usize>,
}
fn default_height_multiplier() -> f32 {
    30.0
}
fn default_height_curve() -> Vec<[f32; 2]> {
    vec![[0.0, 0.0], [0.4, 0.05], [1.0, 1.0]]
}
impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            height_multiplier: default_height_multiplier(),
            height_curve: default_height_curve(),
            flat_shading: false,
            editor_preview_lod: 0,
            chunk_size: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "default_move_threshold")]
    pub viewer_move_threshold: f32,
    #[serde(default = "default_world_scale")]
    pub world_scale: f32,
}
fn default_move_threshold() -> f32 {
    25.0
}
fn default_world_scale() -> f32 {
    2.5
}
impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            viewer_move_threshold: default_move_threshold(),
            world_scale: default_world_scale(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub height: f32,
    pub color: ConfigColor,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct LodConfig {
    pub lod: u32,
    pub visible_distance: f32,
}

/// `[r, g, b]` (opaque) or `[r, g, b, a]`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConfigColor {
    Rgb([u8; 3]),
    Rgba([u8; 4]),
}

impl ConfigColor {
    pub fn rgba(self) -> Rgba {
        match self {
            ConfigColor::Rgb([r, g, b]) => [r, g, b, 255],
            ConfigColor::Rgba(c) => c,
        }
    }
}

fn default_fallback_color() -> ConfigColor {
    ConfigColor::Rgba([0, 0, 0, 0])
}

fn region(name: &str, height: f32, color: [u8; 3]) -> RegionConfig {
    RegionConfig {
        name: name.into(),
        height,
        color: ConfigColor::Rgb(color),
    }
}

fn default_regions() -> Vec<RegionConfig> {
    vec![
        region("deep_water", 0.0, [48, 96, 190]),
        region("water", 0.3, [54, 103, 199]),
        region("sand", 0.4, [210, 208, 125]),
        region("grass", 0.45, [86, 152, 23]),
        region("forest", 0.55, [62, 107, 18]),
        region("rock", 0.7, [90, 69, 60]),
        region("snow", 0.9, [255, 255, 255]),
    ]
}

fn default_lods() -> Vec<LodConfig> {
    vec![
        LodConfig {
            lod: 0,
            visible_distance: 200.0,
        },
        LodConfig {
            lod: 1,
            visible_distance: 400.0,
        },
        LodConfig {
            lod: 4,
            visible_distance: 600.0,
        },
    ]
}

pub fn load_config_from_str(s: &str) -> Result<TerrainConfig, Box<dyn Error>> {
    Ok(toml::from_str(s)?)
}

pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    load_config_from_str(&s)
}

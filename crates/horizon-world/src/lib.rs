//! Terrain parameters, region bands and per-chunk height/color products.
#![forbid(unsafe_code)]

pub mod chunk_data;
pub mod config;
pub mod curve;
pub mod lod;
pub mod params;
pub mod region;
pub mod texture;

pub use chunk_data::{ChunkCoord, ChunkData, build_chunk_data, build_chunk_data_with};
pub use config::{TerrainConfig, load_config_from_path, load_config_from_str};
pub use curve::HeightCurve;
pub use lod::{LodSpec, LodTable};
pub use params::{
    BORDER, FLAT_CHUNK_SIZE, MAX_PREVIEW_LOD, SMOOTH_CHUNK_SIZE, TerrainParams,
    load_params_from_path,
};
pub use region::{ColorField, Region, RegionTable, Rgba};
pub use texture::{Image, color_image, height_image};

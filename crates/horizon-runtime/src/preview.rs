use std::fmt;
use std::str::FromStr;

use horizon_geom::Vec2;
use horizon_mesh_cpu::{MeshBuffers, build_terrain_mesh};
use horizon_world::{Image, TerrainParams, build_chunk_data, color_image, height_image};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    #[default]
    NoiseMap,
    ColorMap,
    Mesh,
}

impl FromStr for DrawMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "noise" | "noise-map" | "noisemap" => Ok(DrawMode::NoiseMap),
            "color" | "colour" | "color-map" | "colormap" => Ok(DrawMode::ColorMap),
            "mesh" => Ok(DrawMode::Mesh),
            other => Err(format!("unknown draw mode '{other}' (noise, color, mesh)")),
        }
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DrawMode::NoiseMap => "noise",
            DrawMode::ColorMap => "color",
            DrawMode::Mesh => "mesh",
        })
    }
}

#[derive(Clone, Debug)]
pub enum Preview {
    NoiseMap(Image),
    ColorMap(Image),
    Mesh {
        lod: u32,
        mesh: MeshBuffers,
        texture: Image,
    },
}

/// Builds the chunk at the origin on the calling thread. No store, no workers.
pub fn preview(params: &TerrainParams, mode: DrawMode) -> Preview {
    let data = build_chunk_data(Vec2::ZERO, params);
    match mode {
        DrawMode::NoiseMap => Preview::NoiseMap(height_image(&data.heights)),
        DrawMode::ColorMap => Preview::ColorMap(color_image(&data.colors)),
        DrawMode::Mesh => {
            let lod = params.editor_preview_lod;
            let mesh = build_terrain_mesh(
                &data.heights,
                params.height_multiplier,
                &params.height_curve,
                lod,
                params.flat_shading,
            );
            Preview::Mesh {
                lod,
                mesh,
                texture: color_image(&data.colors),
            }
        }
    }
}

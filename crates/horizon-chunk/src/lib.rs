//! Chunk streaming state: which chunks exist, what they show, and what is still being generated.
#![forbid(unsafe_code)]

mod chunk;
mod store;

pub use chunk::{Chunk, MeshSlot};
pub use store::ChunkStore;

use std::sync::Arc;

use horizon_geom::Vec2;
use horizon_mesh_cpu::MeshBuffers;
use horizon_world::{ChunkCoord, ChunkData, TerrainParams};

/// Height/color generation for one chunk. `params` is the snapshot the
/// result must be computed from; `rev` comes back with the result.
#[derive(Clone, Debug)]
pub struct HeightRequest {
    pub coord: ChunkCoord,
    pub centre: Vec2,
    pub rev: u64,
    pub params: Arc<TerrainParams>,
}

/// Mesh build for one (chunk, LOD). `rev` and `params` are the revision and
/// snapshot `data` was generated with.
#[derive(Clone, Debug)]
pub struct MeshRequest {
    pub coord: ChunkCoord,
    pub lod: u32,
    pub data: Arc<ChunkData>,
    pub rev: u64,
    pub params: Arc<TerrainParams>,
}

/// Where the store sends generation work. Implementations must eventually
/// hand every result back through `ChunkStore::apply_height` / `apply_mesh`.
pub trait GenSink {
    fn request_height(&mut self, req: HeightRequest);
    fn request_mesh(&mut self, req: MeshRequest);
}

/// Changes the presentation layer has to mirror, in the order they happened.
#[derive(Clone, Debug)]
pub enum ChunkEvent {
    DataReady {
        coord: ChunkCoord,
        data: Arc<ChunkData>,
    },
    MeshActivated {
        coord: ChunkCoord,
        lod: u32,
        mesh: Arc<MeshBuffers>,
    },
    VisibilityChanged {
        coord: ChunkCoord,
        visible: bool,
    },
    /// The chunk grid changed shape; drop the presentation object.
    Removed { coord: ChunkCoord },
}

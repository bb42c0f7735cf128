use std::sync::Arc;

use hashbrown::HashMap;
use horizon_geom::{Rect2, Vec3};
use horizon_mesh_cpu::MeshBuffers;
use horizon_world::{ChunkCoord, ChunkData, TerrainParams};

/// Build state of one LOD of a chunk. A ready mesh of an older revision keeps
/// being shown while its replacement is in flight.
#[derive(Clone, Debug, Default)]
pub struct MeshSlot {
    pub ready: Option<(u64, Arc<MeshBuffers>)>,
    pub inflight: Option<u64>,
}

impl MeshSlot {
    #[inline]
    pub fn is_ready_for(&self, rev: u64) -> bool {
        matches!(self.ready, Some((r, _)) if r == rev)
    }
}

#[derive(Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    /// Footprint in noise-space units.
    pub bounds: Rect2,
    /// Height/color product, its revision and the parameters it was generated with.
    pub(crate) data: Option<(u64, Arc<ChunkData>, Arc<TerrainParams>)>,
    pub(crate) height_inflight: Option<u64>,
    pub(crate) meshes: HashMap<u32, MeshSlot>,
    pub(crate) target_lod: Option<u32>,
    pub(crate) active: Option<(u32, u64)>,
    pub(crate) visible: bool,
}

impl Chunk {
    pub(crate) fn new(coord: ChunkCoord, spacing: f32) -> Self {
        Self {
            coord,
            bounds: Rect2::from_center_size(coord.centre(spacing), spacing),
            data: None,
            height_inflight: None,
            meshes: HashMap::new(),
            target_lod: None,
            active: None,
            visible: false,
        }
    }

    #[inline]
    pub fn data(&self) -> Option<&Arc<ChunkData>> {
        self.data.as_ref().map(|(_, d, _)| d)
    }

    #[inline]
    pub fn data_rev(&self) -> Option<u64> {
        self.data.as_ref().map(|(r, _, _)| *r)
    }

    /// Parameters the current data was generated with; meshes of it use the same snapshot.
    #[inline]
    pub fn data_params(&self) -> Option<&Arc<TerrainParams>> {
        self.data.as_ref().map(|(_, _, p)| p)
    }

    #[inline]
    pub fn height_inflight(&self) -> Option<u64> {
        self.height_inflight
    }

    #[inline]
    pub fn mesh_slot(&self, lod: u32) -> Option<&MeshSlot> {
        self.meshes.get(&lod)
    }

    pub fn mesh_slots(&self) -> impl Iterator<Item = (u32, &MeshSlot)> {
        self.meshes.iter().map(|(l, s)| (*l, s))
    }

    #[inline]
    pub fn target_lod(&self) -> Option<u32> {
        self.target_lod
    }

    /// LOD of the mesh currently shown.
    #[inline]
    pub fn active_lod(&self) -> Option<u32> {
        self.active.map(|(l, _)| l)
    }

    pub fn active_mesh(&self) -> Option<&Arc<MeshBuffers>> {
        let (lod, rev) = self.active?;
        match self.meshes.get(&lod)?.ready.as_ref() {
            Some((r, m)) if *r == rev => Some(m),
            _ => None,
        }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Placement of the chunk's mesh in world units.
    pub fn world_origin(&self, world_scale: f32) -> Vec3 {
        let c = self.bounds.center();
        Vec3::new(c.x * world_scale, 0.0, c.y * world_scale)
    }
}

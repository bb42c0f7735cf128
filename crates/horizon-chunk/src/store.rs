use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use horizon_geom::Vec2;
use horizon_mesh_cpu::MeshBuffers;
use horizon_world::{ChunkCoord, ChunkData, TerrainParams};

use crate::chunk::{Chunk, MeshSlot};
use crate::{ChunkEvent, GenSink, HeightRequest, MeshRequest};

/// Coordinator-side chunk map. Owned by a single thread; workers only see
/// the requests it issues.
pub struct ChunkStore {
    params: Arc<TerrainParams>,
    rev: u64,
    chunks: HashMap<ChunkCoord, Chunk>,
    visible_last_update: HashSet<ChunkCoord>,
    viewer: Vec2,
    viewer_at_last_update: Option<Vec2>,
    events: Vec<ChunkEvent>,
}

impl ChunkStore {
    pub fn new(params: Arc<TerrainParams>) -> Self {
        Self {
            params,
            rev: 0,
            chunks: HashMap::new(),
            visible_last_update: HashSet::new(),
            viewer: Vec2::ZERO,
            viewer_at_last_update: None,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn params(&self) -> &Arc<TerrainParams> {
        &self.params
    }

    /// Parameter revision every request and result is tagged with.
    #[inline]
    pub fn rev(&self) -> u64 {
        self.rev
    }

    #[inline]
    pub fn viewer(&self) -> Vec2 {
        self.viewer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn visible_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.visible_last_update
            .iter()
            .filter_map(|c| self.chunks.get(c))
            .filter(|c| c.visible)
    }

    /// Chunk whose centre is nearest to the viewer.
    #[inline]
    pub fn current_chunk(&self) -> ChunkCoord {
        ChunkCoord::containing(self.viewer, self.params.chunk_spacing())
    }

    /// Events accumulated since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Records the viewer position (noise-space units) and runs a visibility pass
    /// on the first call or once it moved further than the configured threshold.
    pub fn update_viewer(&mut self, viewer: Vec2, sink: &mut dyn GenSink) -> bool {
        self.viewer = viewer;
        let threshold = self.params.viewer_move_threshold;
        let due = match self.viewer_at_last_update {
            None => true,
            Some(last) => (viewer - last).length_sq() > threshold * threshold,
        };
        if due {
            self.update_visible_set(sink);
        }
        due
    }

    /// Recomputes the coordinate window around the viewer, creating and
    /// requesting new chunks and re-evaluating existing ones.
    pub fn update_visible_set(&mut self, sink: &mut dyn GenSink) {
        self.viewer_at_last_update = Some(self.viewer);
        let previous = std::mem::take(&mut self.visible_last_update);

        let spacing = self.params.chunk_spacing();
        let radius = (self.params.max_view_distance() / spacing).ceil() as i32;
        let current = self.current_chunk();
        let mut created = 0usize;
        let mut window = HashSet::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let coord = ChunkCoord::new(current.cx + dx, current.cz + dz);
                window.insert(coord);
                if !self.chunks.contains_key(&coord) {
                    self.chunks.insert(coord, Chunk::new(coord, spacing));
                    created += 1;
                }
                self.update_chunk(coord, sink);
            }
        }

        // Previously visible chunks that fell out of the window.
        for coord in previous.difference(&window) {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                if chunk.visible {
                    chunk.visible = false;
                    self.events.push(ChunkEvent::VisibilityChanged {
                        coord: *coord,
                        visible: false,
                    });
                }
            }
        }

        log::debug!(
            target: "streaming",
            "visible pass at ({}, {}) radius {}: {} new, {} visible, {} total",
            current.cx,
            current.cz,
            radius,
            created,
            self.visible_last_update.len(),
            self.chunks.len()
        );
    }

    /// Re-evaluates visibility, target LOD and mesh requests for one chunk.
    fn update_chunk(&mut self, coord: ChunkCoord, sink: &mut dyn GenSink) {
        let max = self.params.max_view_distance();
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let distance = chunk.bounds.distance(self.viewer);
        let in_range = distance <= max;
        if in_range {
            chunk.target_lod = Some(self.params.lods.lod_for_distance(distance));
        }

        // Missing data is always (re)requested; stale data only while in range.
        let wants_height = match chunk.data_rev() {
            None => true,
            Some(r) => r != self.rev && in_range,
        };
        if wants_height && chunk.height_inflight.is_none() {
            chunk.height_inflight = Some(self.rev);
            sink.request_height(HeightRequest {
                coord,
                centre: coord.centre(self.params.chunk_spacing()),
                rev: self.rev,
                params: self.params.clone(),
            });
        }

        let mut visible = false;
        if let Some((data_rev, data, data_params)) = chunk.data.clone() {
            visible = in_range;
            if let (true, Some(lod)) = (in_range, chunk.target_lod) {
                let slot = chunk.meshes.entry(lod).or_default();
                match &slot.ready {
                    Some((r, mesh)) if *r == data_rev => {
                        if chunk.active != Some((lod, data_rev)) {
                            chunk.active = Some((lod, data_rev));
                            self.events.push(ChunkEvent::MeshActivated {
                                coord,
                                lod,
                                mesh: mesh.clone(),
                            });
                        }
                    }
                    _ => {
                        if slot.inflight.is_none() {
                            slot.inflight = Some(data_rev);
                            sink.request_mesh(MeshRequest {
                                coord,
                                lod,
                                data,
                                rev: data_rev,
                                params: data_params,
                            });
                        }
                    }
                }
            }
        }

        if visible {
            self.visible_last_update.insert(coord);
        }
        if chunk.visible != visible {
            chunk.visible = visible;
            self.events
                .push(ChunkEvent::VisibilityChanged { coord, visible });
        }
    }

    /// Applies a finished height/color product. Results of an older revision only
    /// release the in-flight marker.
    pub fn apply_height(
        &mut self,
        coord: ChunkCoord,
        rev: u64,
        data: Arc<ChunkData>,
        sink: &mut dyn GenSink,
    ) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            log::debug!(target: "streaming", "height for unknown chunk ({}, {}) dropped", coord.cx, coord.cz);
            return;
        };
        if chunk.height_inflight == Some(rev) {
            chunk.height_inflight = None;
        }
        if rev != self.rev {
            log::debug!(
                target: "streaming",
                "stale height ({}, {}) rev {} (current {})",
                coord.cx,
                coord.cz,
                rev,
                self.rev
            );
        } else if chunk.data_rev() != Some(rev) {
            chunk.data = Some((rev, data.clone(), self.params.clone()));
            self.events.push(ChunkEvent::DataReady { coord, data });
        }
        self.update_chunk(coord, sink);
    }

    /// Applies a finished mesh. Meshes built from data the chunk no longer holds are dropped.
    pub fn apply_mesh(
        &mut self,
        coord: ChunkCoord,
        lod: u32,
        rev: u64,
        mesh: Arc<MeshBuffers>,
        sink: &mut dyn GenSink,
    ) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            log::debug!(target: "streaming", "mesh for unknown chunk ({}, {}) dropped", coord.cx, coord.cz);
            return;
        };
        let data_rev = chunk.data_rev();
        let slot = chunk.meshes.entry(lod).or_default();
        if slot.inflight == Some(rev) {
            slot.inflight = None;
        }
        if data_rev == Some(rev) {
            slot.ready = Some((rev, mesh));
        } else {
            log::debug!(
                target: "streaming",
                "stale mesh ({}, {}) lod {} rev {}",
                coord.cx,
                coord.cz,
                lod,
                rev
            );
        }
        self.update_chunk(coord, sink);
    }

    /// Swaps in a new parameter snapshot and bumps the revision. Existing chunks keep
    /// their products until replacements arrive; a changed chunk spacing drops them.
    /// The next `update_viewer` always runs a visibility pass.
    pub fn set_params(&mut self, params: Arc<TerrainParams>) -> u64 {
        if params.chunk_size != self.params.chunk_size {
            log::info!(
                target: "streaming",
                "chunk size {} -> {}; dropping {} chunks",
                self.params.chunk_size,
                params.chunk_size,
                self.chunks.len()
            );
            let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
            coords.sort();
            for coord in coords {
                self.events.push(ChunkEvent::Removed { coord });
            }
            self.chunks.clear();
            self.visible_last_update.clear();
        }
        self.params = params;
        self.rev += 1;
        self.viewer_at_last_update = None;
        self.rev
    }

    /// Installs a synchronously generated chunk together with one of its meshes.
    /// Both become observable in the same event batch. Returns false for a stale `rev`.
    pub fn install(
        &mut self,
        coord: ChunkCoord,
        rev: u64,
        data: Arc<ChunkData>,
        lod: u32,
        mesh: Arc<MeshBuffers>,
        sink: &mut dyn GenSink,
    ) -> bool {
        if rev != self.rev {
            return false;
        }
        let spacing = self.params.chunk_spacing();
        let chunk = self
            .chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord, spacing));
        chunk.data = Some((rev, data.clone(), self.params.clone()));
        // an older build of this LOD may still be running
        let inflight = chunk.meshes.get(&lod).and_then(|s| s.inflight);
        chunk.meshes.insert(
            lod,
            MeshSlot {
                ready: Some((rev, mesh)),
                inflight,
            },
        );
        self.events.push(ChunkEvent::DataReady { coord, data });
        self.update_chunk(coord, sink);
        true
    }
}

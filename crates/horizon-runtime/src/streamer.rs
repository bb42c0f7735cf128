use std::sync::Arc;
use std::time::{Duration, Instant};

use horizon_chunk::{ChunkEvent, ChunkStore};
use horizon_geom::{Rect2, Vec2};
use horizon_mesh_cpu::build_terrain_mesh;
use horizon_world::{TerrainParams, build_chunk_data};

use crate::scheduler::{GenResult, GenerationScheduler};

/// Largest decimal seed accepted from text input.
pub const MAX_SEED_INPUT: u64 = 10_000_000_000;

/// Parses a seed typed by a user. Values above `i32::MAX` wrap into the 32-bit seed domain.
pub fn parse_seed(text: &str) -> Option<i32> {
    let v: u64 = text.trim().parse().ok()?;
    (v <= MAX_SEED_INPUT).then_some(v as i32)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub heights_applied: usize,
    pub meshes_applied: usize,
    pub pass_ran: bool,
}

/// Coordinator: owns the chunk store, feeds it worker results and viewer updates.
pub struct Streamer {
    store: ChunkStore,
    scheduler: GenerationScheduler,
}

impl Streamer {
    pub fn new(params: Arc<TerrainParams>, scheduler: GenerationScheduler) -> Self {
        Self {
            store: ChunkStore::new(params),
            scheduler,
        }
    }

    #[inline]
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    #[inline]
    pub fn scheduler(&self) -> &GenerationScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn params(&self) -> &Arc<TerrainParams> {
        self.store.params()
    }

    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        self.store.drain_events()
    }

    /// Applies everything the workers finished, then moves the viewer (world units).
    pub fn tick(&mut self, viewer_world: Vec2) -> TickStats {
        let results = self.scheduler.drain_worker_results();
        let mut stats = self.apply_results(results);
        let viewer = viewer_world / self.store.params().world_scale;
        stats.pass_ran = self.store.update_viewer(viewer, &mut self.scheduler);
        stats
    }

    fn apply_results(&mut self, results: Vec<GenResult>) -> TickStats {
        let mut stats = TickStats::default();
        for r in results {
            match r {
                GenResult::Height {
                    coord, rev, data, ..
                } => {
                    self.store
                        .apply_height(coord, rev, data, &mut self.scheduler);
                    stats.heights_applied += 1;
                }
                GenResult::Mesh {
                    coord,
                    lod,
                    rev,
                    mesh,
                    ..
                } => {
                    self.store
                        .apply_mesh(coord, lod, rev, mesh, &mut self.scheduler);
                    stats.meshes_applied += 1;
                }
            }
        }
        stats
    }

    /// Keeps applying results until no work is outstanding. Returns false on timeout.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let results = self.scheduler.drain_worker_results();
            if !results.is_empty() {
                self.apply_results(results);
                continue;
            }
            if self.scheduler.inflight() == 0 {
                // a result may have landed between the drain and the counter read
                let late = self.scheduler.drain_worker_results();
                if late.is_empty() {
                    return true;
                }
                self.apply_results(late);
                continue;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let wait = (deadline - now).min(Duration::from_millis(20));
            let results = self.scheduler.wait_worker_results(wait);
            self.apply_results(results);
        }
    }

    /// New seed, same everything else. See [`Streamer::reconfigure`].
    pub fn reseed(&mut self, seed: i32) -> u64 {
        let params = Arc::new(self.store.params().with_seed(seed));
        self.reconfigure(params)
    }

    /// Installs a new parameter snapshot and regenerates the chunk under the viewer
    /// synchronously; the rest of the window is replaced as workers finish.
    pub fn reconfigure(&mut self, params: Arc<TerrainParams>) -> u64 {
        let t0 = Instant::now();
        let rev = self.store.set_params(params.clone());
        let coord = self.store.current_chunk();
        let spacing = params.chunk_spacing();
        let centre = coord.centre(spacing);
        let distance = Rect2::from_center_size(centre, spacing).distance(self.store.viewer());
        let lod = params.lods.lod_for_distance(distance);

        let data = build_chunk_data(centre, &params);
        let mesh = build_terrain_mesh(
            &data.heights,
            params.height_multiplier,
            &params.height_curve,
            lod,
            params.flat_shading,
        );
        self.store.install(
            coord,
            rev,
            Arc::new(data),
            lod,
            Arc::new(mesh),
            &mut self.scheduler,
        );
        log::info!(
            target: "streaming",
            "rev {} seed {}: chunk ({}, {}) lod {} regenerated in {}ms",
            rev,
            params.noise.seed,
            coord.cx,
            coord.cz,
            lod,
            t0.elapsed().as_millis()
        );
        rev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seed_bounds() {
        assert_eq!(parse_seed("0"), Some(0));
        assert_eq!(parse_seed(" 42 \n"), Some(42));
        assert_eq!(parse_seed("2147483648"), Some(i32::MIN));
        assert_eq!(parse_seed("10000000000"), Some(10_000_000_000u64 as i32));
        assert_eq!(parse_seed("10000000001"), None);
        assert_eq!(parse_seed("-1"), None);
        assert_eq!(parse_seed("abc"), None);
        assert_eq!(parse_seed(""), None);
    }
}

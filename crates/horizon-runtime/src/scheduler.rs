use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use horizon_chunk::{GenSink, HeightRequest, MeshRequest};
use horizon_mesh_cpu::{MeshBuffers, build_terrain_mesh};
use horizon_noise::NoiseField;
use horizon_world::{ChunkCoord, ChunkData, build_chunk_data_with};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Finished work, delivered in completion order.
#[derive(Debug)]
pub enum GenResult {
    Height {
        coord: ChunkCoord,
        rev: u64,
        data: Arc<ChunkData>,
        t_ms: u32,
    },
    Mesh {
        coord: ChunkCoord,
        lod: u32,
        rev: u64,
        mesh: Arc<MeshBuffers>,
        t_ms: u32,
    },
}

impl GenResult {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            GenResult::Height { coord, .. } | GenResult::Mesh { coord, .. } => *coord,
        }
    }
}

#[inline]
fn elapsed_ms(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

/// Runs each request as its own task on a worker pool and funnels results
/// into one channel drained by the coordinator.
pub struct GenerationScheduler {
    pool: Arc<ThreadPool>,
    res_tx: Sender<GenResult>,
    res_rx: Receiver<GenResult>,
    inflight: Arc<AtomicUsize>,
    pub workers: usize,
}

impl GenerationScheduler {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("horizon-gen-{i}"))
                .build()
                .expect("generation pool"),
        );
        let (res_tx, res_rx) = unbounded::<GenResult>();
        Self {
            pool,
            res_tx,
            res_rx,
            inflight: Arc::new(AtomicUsize::new(0)),
            workers,
        }
    }

    /// One worker per available core.
    pub fn with_default_workers() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(workers)
    }

    /// Requests whose result has not been sent yet. Zero means every result is in the channel.
    #[inline]
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    /// Everything that completed since the last drain, in arrival order. Never blocks.
    pub fn drain_worker_results(&self) -> Vec<GenResult> {
        self.res_rx.try_iter().collect()
    }

    /// Blocks until at least one result arrives or `timeout` passes, then drains.
    pub fn wait_worker_results(&self, timeout: Duration) -> Vec<GenResult> {
        match self.res_rx.recv_timeout(timeout) {
            Ok(first) => {
                let mut out = vec![first];
                out.extend(self.res_rx.try_iter());
                out
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Vec::new(),
        }
    }

    pub fn submit_height(&self, req: HeightRequest) {
        let tx = self.res_tx.clone();
        let inflight = self.inflight.clone();
        inflight.fetch_add(1, Ordering::Relaxed);
        self.pool.spawn(move || {
            let t0 = Instant::now();
            let noise = NoiseField::new();
            let data = build_chunk_data_with(&noise, req.centre, &req.params);
            let t_ms = elapsed_ms(t0);
            log::trace!(
                target: "scheduler",
                "height ({}, {}) rev {} in {}ms",
                req.coord.cx,
                req.coord.cz,
                req.rev,
                t_ms
            );
            let _ = tx.send(GenResult::Height {
                coord: req.coord,
                rev: req.rev,
                data: Arc::new(data),
                t_ms,
            });
            inflight.fetch_sub(1, Ordering::Release);
        });
    }

    pub fn submit_mesh(&self, req: MeshRequest) {
        let tx = self.res_tx.clone();
        let inflight = self.inflight.clone();
        inflight.fetch_add(1, Ordering::Relaxed);
        self.pool.spawn(move || {
            let t0 = Instant::now();
            let p = &req.params;
            let mesh = build_terrain_mesh(
                &req.data.heights,
                p.height_multiplier,
                &p.height_curve,
                req.lod,
                p.flat_shading,
            );
            let t_ms = elapsed_ms(t0);
            log::trace!(
                target: "scheduler",
                "mesh ({}, {}) lod {} rev {} in {}ms",
                req.coord.cx,
                req.coord.cz,
                req.lod,
                req.rev,
                t_ms
            );
            let _ = tx.send(GenResult::Mesh {
                coord: req.coord,
                lod: req.lod,
                rev: req.rev,
                mesh: Arc::new(mesh),
                t_ms,
            });
            inflight.fetch_sub(1, Ordering::Release);
        });
    }
}

impl GenSink for GenerationScheduler {
    fn request_height(&mut self, req: HeightRequest) {
        self.submit_height(req);
    }

    fn request_mesh(&mut self, req: MeshRequest) {
        self.submit_mesh(req);
    }
}

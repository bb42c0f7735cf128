use std::sync::Arc;

use hashbrown::HashMap;
use horizon_chunk::{ChunkEvent, ChunkStore, GenSink, HeightRequest, MeshRequest};
use horizon_geom::Vec2;
use horizon_mesh_cpu::build_terrain_mesh;
use horizon_world::{ChunkCoord, TerrainConfig, TerrainParams, build_chunk_data};
use horizon_world::config::LodConfig;
use proptest::prelude::*;

#[derive(Default)]
struct RecordingSink {
    heights: Vec<HeightRequest>,
    meshes: Vec<MeshRequest>,
    issued_heights: usize,
    issued_meshes: usize,
}

impl GenSink for RecordingSink {
    fn request_height(&mut self, req: HeightRequest) {
        self.issued_heights += 1;
        self.heights.push(req);
    }
    fn request_mesh(&mut self, req: MeshRequest) {
        self.issued_meshes += 1;
        self.meshes.push(req);
    }
}

impl RecordingSink {
    fn assert_no_duplicates(&self) {
        let mut h: HashMap<ChunkCoord, usize> = HashMap::new();
        for r in &self.heights {
            *h.entry(r.coord).or_default() += 1;
        }
        assert!(h.values().all(|n| *n == 1), "duplicate height request");
        let mut m: HashMap<(ChunkCoord, u32), usize> = HashMap::new();
        for r in &self.meshes {
            *m.entry((r.coord, r.lod)).or_default() += 1;
        }
        assert!(m.values().all(|n| *n == 1), "duplicate mesh request");
    }
}

fn params() -> Arc<TerrainParams> {
    let mut cfg = TerrainConfig::default();
    cfg.mesh.chunk_size = Some(9);
    cfg.streaming.viewer_move_threshold = 4.0;
    cfg.lods = vec![
        LodConfig {
            lod: 0,
            visible_distance: 10.0,
        },
        LodConfig {
            lod: 1,
            visible_distance: 20.0,
        },
    ];
    Arc::new(TerrainParams::from_config(&cfg))
}

fn run_height(store: &mut ChunkStore, sink: &mut RecordingSink, req: HeightRequest) {
    let data = Arc::new(build_chunk_data(req.centre, &req.params));
    store.apply_height(req.coord, req.rev, data, sink);
}

fn run_mesh(store: &mut ChunkStore, sink: &mut RecordingSink, req: MeshRequest) {
    let p = &req.params;
    let mesh = build_terrain_mesh(
        &req.data.heights,
        p.height_multiplier,
        &p.height_curve,
        req.lod,
        p.flat_shading,
    );
    store.apply_mesh(req.coord, req.lod, req.rev, Arc::new(mesh), sink);
}

fn complete_all(store: &mut ChunkStore, sink: &mut RecordingSink) {
    loop {
        if let Some(req) = sink.heights.pop() {
            run_height(store, sink, req);
        } else if let Some(req) = sink.meshes.pop() {
            run_mesh(store, sink, req);
        } else {
            break;
        }
    }
}

#[test]
fn first_pass_creates_window_and_requests_heights_once() {
    let p = params();
    let mut store = ChunkStore::new(p.clone());
    let mut sink = RecordingSink::default();
    assert!(store.update_viewer(Vec2::ZERO, &mut sink));
    // radius ceil(20 / 8) = 3
    assert_eq!(store.len(), 49);
    assert_eq!(sink.heights.len(), 49);
    assert!(sink.meshes.is_empty());
    assert_eq!(store.visible_chunks().count(), 0);

    store.update_visible_set(&mut sink);
    store.update_visible_set(&mut sink);
    assert_eq!(sink.issued_heights, 49);
    sink.assert_no_duplicates();
}

#[test]
fn movement_below_threshold_skips_the_pass() {
    let mut store = ChunkStore::new(params());
    let mut sink = RecordingSink::default();
    assert!(store.update_viewer(Vec2::ZERO, &mut sink));
    assert!(!store.update_viewer(Vec2::new(3.0, 2.0), &mut sink));
    assert!(store.update_viewer(Vec2::new(4.0, 2.0), &mut sink));
}

#[test]
fn results_flow_into_visible_meshes() {
    let p = params();
    let mut store = ChunkStore::new(p.clone());
    let mut sink = RecordingSink::default();
    store.update_viewer(Vec2::ZERO, &mut sink);
    complete_all(&mut store, &mut sink);

    let max = p.max_view_distance();
    for chunk in store.chunks() {
        let d = chunk.bounds.distance(Vec2::ZERO);
        assert!(chunk.data().is_some());
        assert_eq!(chunk.is_visible(), d <= max, "{:?}", chunk.coord);
        if chunk.is_visible() {
            let lod = p.lods.lod_for_distance(d);
            assert_eq!(chunk.target_lod(), Some(lod));
            assert_eq!(chunk.active_lod(), Some(lod));
            assert!(chunk.active_mesh().is_some());
        } else {
            assert!(chunk.active_mesh().is_none());
        }
    }
    let centre = store.chunk(ChunkCoord::new(0, 0)).unwrap();
    assert_eq!(centre.active_lod(), Some(0));

    let events = store.drain_events();
    let ready = events
        .iter()
        .filter(|e| matches!(e, ChunkEvent::DataReady { .. }))
        .count();
    assert_eq!(ready, 49);
    let shown = events
        .iter()
        .filter(|e| matches!(e, ChunkEvent::VisibilityChanged { visible: true, .. }))
        .count();
    assert_eq!(shown, store.visible_chunks().count());
    assert!(store.drain_events().is_empty());
}

#[test]
fn moving_away_hides_and_switches_lod() {
    let p = params();
    let mut store = ChunkStore::new(p.clone());
    let mut sink = RecordingSink::default();
    store.update_viewer(Vec2::ZERO, &mut sink);
    complete_all(&mut store, &mut sink);
    store.drain_events();

    store.update_viewer(Vec2::new(80.0, 0.0), &mut sink);
    complete_all(&mut store, &mut sink);
    let origin = store.chunk(ChunkCoord::new(0, 0)).unwrap();
    assert!(!origin.is_visible());
    // hidden, not evicted
    assert!(origin.data().is_some());
    let events = store.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ChunkEvent::VisibilityChanged { coord, visible: false } if *coord == ChunkCoord::new(0, 0)
    )));

    // (10, 0) now holds the viewer
    let here = store.chunk(ChunkCoord::new(10, 0)).unwrap();
    assert_eq!(here.active_lod(), Some(0));
    let near = store.chunk(ChunkCoord::new(8, 0)).unwrap();
    assert_eq!(near.active_lod(), Some(1));
}

#[test]
fn mesh_is_not_requested_before_height_arrives() {
    let mut store = ChunkStore::new(params());
    let mut sink = RecordingSink::default();
    store.update_viewer(Vec2::ZERO, &mut sink);
    store.update_visible_set(&mut sink);
    assert!(sink.meshes.is_empty());
    let coord = ChunkCoord::new(0, 0);
    let idx = sink.heights.iter().position(|r| r.coord == coord).unwrap();
    let req = sink.heights.remove(idx);
    run_height(&mut store, &mut sink, req);
    assert_eq!(store.chunk(coord).unwrap().target_lod(), Some(0));
    assert_eq!(sink.meshes.len(), 1);
    assert_eq!(sink.meshes[0].coord, coord);
    assert_eq!(sink.meshes[0].lod, 0);
}

#[test]
fn stale_results_are_dropped_and_rerequested_once() {
    let p = params();
    let mut store = ChunkStore::new(p.clone());
    let mut sink = RecordingSink::default();
    store.update_viewer(Vec2::ZERO, &mut sink);
    let stale: Vec<HeightRequest> = std::mem::take(&mut sink.heights);

    let rev = store.set_params(Arc::new(p.with_seed(77)));
    assert_eq!(rev, 1);
    store.update_viewer(Vec2::ZERO, &mut sink);
    // old requests are still in flight: nothing new yet
    assert!(sink.heights.is_empty());

    for req in stale {
        assert_eq!(req.rev, 0);
        run_height(&mut store, &mut sink, req);
    }
    assert!(store.chunks().all(|c| c.data().is_none()));
    // missing data is requested again at the new revision
    assert!(!sink.heights.is_empty());
    assert!(sink.heights.iter().all(|r| r.rev == 1 && r.params.noise.seed == 77));
    sink.assert_no_duplicates();

    complete_all(&mut store, &mut sink);
    let centre = store.chunk(ChunkCoord::new(0, 0)).unwrap();
    assert_eq!(centre.data_rev(), Some(1));
    assert!(centre.active_mesh().is_some());
}

#[test]
fn meshes_of_old_data_use_the_params_it_was_built_with() {
    let p = params();
    let mut store = ChunkStore::new(p.clone());
    let mut sink = RecordingSink::default();
    store.update_viewer(Vec2::ZERO, &mut sink);
    complete_all(&mut store, &mut sink);

    let mut tall = (*p).clone();
    tall.height_multiplier = 999.0;
    store.set_params(Arc::new(tall));
    // (2, 0) moves from the LOD 1 bucket into LOD 0 while still holding rev 0 data
    store.update_viewer(Vec2::new(8.0, 0.0), &mut sink);
    let req = sink
        .meshes
        .iter()
        .find(|r| r.coord == ChunkCoord::new(2, 0) && r.lod == 0)
        .expect("lod 0 mesh for (2, 0)");
    assert_eq!(req.rev, 0);
    assert_eq!(req.params.height_multiplier, p.height_multiplier);
    for r in &sink.meshes {
        let expected = if r.rev == 0 { p.height_multiplier } else { 999.0 };
        assert_eq!(r.params.height_multiplier, expected, "{:?} lod {}", r.coord, r.lod);
    }

    complete_all(&mut store, &mut sink);
    for c in store.visible_chunks() {
        assert_eq!(c.data_rev(), Some(1));
        assert_eq!(c.data_params().unwrap().height_multiplier, 999.0);
    }
}

#[test]
fn reseeded_chunks_keep_old_products_until_replaced() {
    let p = params();
    let mut store = ChunkStore::new(p.clone());
    let mut sink = RecordingSink::default();
    store.update_viewer(Vec2::ZERO, &mut sink);
    complete_all(&mut store, &mut sink);
    let before = store.visible_chunks().count();

    store.set_params(Arc::new(p.with_seed(5)));
    store.update_viewer(Vec2::ZERO, &mut sink);
    assert_eq!(store.visible_chunks().count(), before);
    assert!(store.chunk(ChunkCoord::new(1, 0)).unwrap().active_mesh().is_some());
    assert_eq!(sink.heights.len(), before);

    complete_all(&mut store, &mut sink);
    for c in store.visible_chunks() {
        assert_eq!(c.data_rev(), Some(1));
    }
}

#[test]
fn install_is_atomic_for_the_consumer() {
    let p = params();
    let mut store = ChunkStore::new(p.clone());
    let mut sink = RecordingSink::default();
    store.update_viewer(Vec2::ZERO, &mut sink);
    complete_all(&mut store, &mut sink);
    store.drain_events();

    let next = Arc::new(p.with_seed(9));
    let rev = store.set_params(next.clone());
    let coord = ChunkCoord::new(0, 0);
    let data = Arc::new(build_chunk_data(coord.centre(next.chunk_spacing()), &next));
    let mesh = Arc::new(build_terrain_mesh(
        &data.heights,
        next.height_multiplier,
        &next.height_curve,
        0,
        next.flat_shading,
    ));
    assert!(!store.install(coord, rev + 1, data.clone(), 0, mesh.clone(), &mut sink));
    assert!(store.install(coord, rev, data, 0, mesh, &mut sink));

    let events = store.drain_events();
    assert!(matches!(events[0], ChunkEvent::DataReady { coord: c, .. } if c == coord));
    assert!(matches!(events[1], ChunkEvent::MeshActivated { coord: c, lod: 0, .. } if c == coord));
    assert_eq!(store.chunk(coord).unwrap().data_rev(), Some(rev));
}

#[test]
fn changing_chunk_size_drops_the_grid() {
    let p = params();
    let mut store = ChunkStore::new(p.clone());
    let mut sink = RecordingSink::default();
    store.update_viewer(Vec2::ZERO, &mut sink);
    let mut bigger = (*p).clone();
    bigger.chunk_size = 17;
    store.set_params(Arc::new(bigger));
    assert!(store.is_empty());
    let removed = store
        .drain_events()
        .iter()
        .filter(|e| matches!(e, ChunkEvent::Removed { .. }))
        .count();
    assert_eq!(removed, 49);
    store.update_viewer(Vec2::ZERO, &mut sink);
    // radius ceil(20 / 16) = 2
    assert_eq!(store.len(), 25);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Random walks with results completing in arbitrary order never produce a
    // second outstanding request for the same work, and every chunk within
    // range of the viewer exists with a target LOD after each pass.
    #[test]
    fn streaming_invariants_hold_under_random_completion(
        steps in prop::collection::vec((-40.0f32..40.0, -40.0f32..40.0, 0usize..8, any::<bool>()), 1..12),
    ) {
        let p = params();
        let mut store = ChunkStore::new(p.clone());
        let mut sink = RecordingSink::default();
        let max = p.max_view_distance();
        for (x, z, completions, reseed) in steps {
            if reseed {
                let seed = store.rev() as i32 + 1;
                store.set_params(Arc::new(p.with_seed(seed)));
            }
            let viewer = Vec2::new(x, z);
            let ran = store.update_viewer(viewer, &mut sink);
            sink.assert_no_duplicates();

            let spacing = p.chunk_spacing();
            let current = ChunkCoord::containing(viewer, spacing);
            for dz in -4..=4 {
                for dx in -4..=4 {
                    let coord = ChunkCoord::new(current.cx + dx, current.cz + dz);
                    let centre = coord.centre(spacing);
                    let bounds = horizon_geom::Rect2::from_center_size(centre, spacing);
                    if ran && bounds.distance(viewer) <= max {
                        let chunk = store.chunk(coord);
                        prop_assert!(chunk.is_some());
                        prop_assert!(chunk.unwrap().target_lod().is_some());
                    }
                }
            }

            for i in 0..completions {
                if i % 2 == 0 && !sink.heights.is_empty() {
                    let req = sink.heights.remove(i % sink.heights.len());
                    run_height(&mut store, &mut sink, req);
                } else if !sink.meshes.is_empty() {
                    let req = sink.meshes.remove(i % sink.meshes.len());
                    run_mesh(&mut store, &mut sink, req);
                }
                sink.assert_no_duplicates();
            }
        }
        complete_all(&mut store, &mut sink);
        for c in store.visible_chunks() {
            prop_assert!(c.active_mesh().is_some());
        }
    }
}

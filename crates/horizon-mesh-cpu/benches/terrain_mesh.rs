use criterion::{Criterion, black_box, criterion_group, criterion_main};

use horizon_mesh_cpu::build_terrain_mesh;
use horizon_world::{ChunkCoord, TerrainParams, build_chunk_data};

fn bench_build_terrain_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_terrain_mesh");
    let params = TerrainParams::default().with_seed(0xC0FFEE);
    let data = build_chunk_data(ChunkCoord::new(0, 0).centre(params.chunk_spacing()), &params);
    for lod in [0u32, 1, 2, 4, 6] {
        group.bench_function(format!("smooth_241_lod{lod}"), |b| {
            b.iter(|| {
                let mesh = build_terrain_mesh(
                    &data.heights,
                    params.height_multiplier,
                    &params.height_curve,
                    lod,
                    false,
                );
                black_box(mesh);
            })
        });
    }
    group.bench_function("flat_241_lod0", |b| {
        b.iter(|| {
            let mesh = build_terrain_mesh(
                &data.heights,
                params.height_multiplier,
                &params.height_curve,
                0,
                true,
            );
            black_box(mesh);
        })
    });
    group.finish();
}

fn bench_build_chunk_data(c: &mut Criterion) {
    let params = TerrainParams::default();
    c.bench_function("build_chunk_data_241", |b| {
        b.iter(|| black_box(build_chunk_data(ChunkCoord::new(1, -2).centre(params.chunk_spacing()), &params)))
    });
}

criterion_group!(benches, bench_build_terrain_mesh, bench_build_chunk_data);
criterion_main!(benches);

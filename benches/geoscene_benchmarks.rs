use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::executor::block_on;
use geoscene_core::lexer::LineScanner;
use geoscene_core::resolver::Resolver;
use geoscene_core::{expand, parse_cast, parse_scene};
use std::collections::HashMap;

// ============================================================================
// Test Data
// ============================================================================

const PERSPECTIVE_CAST: &str = "GeoCast V1.0
DynamicCamera
Pos 1 0 10
ViewSlice FODAngle 30 Size 1
ModelviewMatrix
1 0 0 -1
0 1 0 0
0 0 1 -10
0 0 0 1
DataProject Perspective Fovy 50 Aspect 1.7777 ClipRange 0.1 500
ZDataRange 0.1 500
";

const DISTORTED_CAST: &str = "GeoCast V3.0
StaticCamera Pos -4 0 10
ViewSlice FODAngle 30 Size 1
ModelviewMatrix
1 0 0 4
0 1 0 0
0 0 1 -10
0 0 0 1
DataProject Perspective Fovy 50 Aspect 1.7777 ClipRange 0.1 500
ImageWarp aspect 1 k1 -0.12 k2 0.01 k3 0 p1 0 p2 0 centerX 960 centerY 540 focal 1400
ZDataRange 0.1 500
WorldSpaceDepth
";

fn generate_scene(casts: usize, frames: i64) -> String {
    let mut scene = format!("GeoScene V2.1\nSequence 1 {frames}\nDataFormat exr\n");
    for i in 0..casts {
        scene.push_str(&format!(
            "GeoCast cam{i} 1920 1080 img/cam{i}.%04d.exr cams/cam{i}.%04d.geocast\n"
        ));
    }
    scene.push_str("GeoCastZ ground 1024 1024 ground.exr cams/ground.geocast\n");
    scene.push_str("MatchGroup 0\n");
    for i in 0..casts {
        scene.push_str(&format!("MatchCam cam{i}\n"));
    }
    scene.push_str("MatchSurface ground\n");
    scene
}

fn scene_documents(casts: usize, frames: i64) -> HashMap<String, String> {
    let mut docs = HashMap::new();
    for i in 0..casts {
        for frame in 1..=frames {
            docs.insert(
                format!("cams/cam{i}.{frame:04}.geocast"),
                PERSPECTIVE_CAST.to_string(),
            );
        }
    }
    docs.insert("cams/ground.geocast".to_string(), DISTORTED_CAST.to_string());
    docs
}

// ============================================================================
// Scanner Benchmarks
// ============================================================================

fn bench_scanner(c: &mut Criterion) {
    let source = generate_scene(20, 10);
    c.bench_function("scanner_scene_lines", |b| {
        b.iter(|| {
            let mut scanner = LineScanner::new(black_box(&source));
            let mut count = 0;
            while scanner.consume_line().is_some() {
                count += 1;
            }
            count
        })
    });
}

// ============================================================================
// Sequence Expansion Benchmarks
// ============================================================================

fn bench_expand_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_frame_scaling");

    for frames in [10i64, 100, 1000] {
        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &n| {
            b.iter(|| expand(black_box("shots/a/frame.%04d.%d.exr"), Some((1, n))))
        });
    }

    group.finish();
}

// ============================================================================
// Parser Benchmarks
// ============================================================================

fn bench_cast_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("cast_parser");

    for (name, source) in [
        ("perspective", PERSPECTIVE_CAST),
        ("distorted", DISTORTED_CAST),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| parse_cast(black_box(src), "benchmark.geocast"))
        });
    }

    group.finish();
}

fn bench_scene_parser_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_parser_cast_scaling");

    for casts in [1usize, 10, 100] {
        let source = generate_scene(casts, 24);
        group.throughput(Throughput::Elements(casts as u64));
        group.bench_with_input(BenchmarkId::from_parameter(casts), &source, |b, src| {
            b.iter(|| parse_scene(black_box(src), "benchmark.geoscene"))
        });
    }

    group.finish();
}

// ============================================================================
// End-to-End Resolution Benchmarks
// ============================================================================

fn bench_e2e_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("e2e_resolution");

    for casts in [1usize, 10] {
        let source = generate_scene(casts, 24);
        let docs = scene_documents(casts, 24);
        group.throughput(Throughput::Elements((casts as u64 + 1) * 24));
        group.bench_with_input(BenchmarkId::from_parameter(casts), &source, |b, src| {
            b.iter(|| {
                let mut scene = parse_scene(black_box(src), "benchmark.geoscene")
                    .unwrap()
                    .value;
                let report = block_on(Resolver::new(&docs).resolve(&mut scene));
                (scene, report)
            })
        });
    }

    group.finish();
}

fn bench_e2e_with_serialization(c: &mut Criterion) {
    let source = generate_scene(4, 24);
    let docs = scene_documents(4, 24);
    c.bench_function("e2e_with_json_serialization", |b| {
        b.iter(|| {
            let mut scene = parse_scene(black_box(&source), "benchmark.geoscene")
                .unwrap()
                .value;
            block_on(Resolver::new(&docs).resolve(&mut scene));
            scene.to_json()
        })
    });
}

criterion_group!(scanner_benches, bench_scanner, bench_expand_scaling);

criterion_group!(parser_benches, bench_cast_parser, bench_scene_parser_scaling);

criterion_group!(e2e_benches, bench_e2e_resolution, bench_e2e_with_serialization);

criterion_main!(scanner_benches, parser_benches, e2e_benches);

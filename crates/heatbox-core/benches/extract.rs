//! Benchmarks for the heat grid → box stages.
//!
//! Run with: cargo bench -p heatbox-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use heatbox_core::config::ExtractionConfig;
use heatbox_core::heatmap::{resize::resize_bilinear, BoxExtractor, HeatGrid, SimilarityMapBuilder};
use heatbox_core::scoring::{OverlapScorer, UnionMode};
use heatbox_core::types::BoundingBox;
use ndarray::Array2;

const ROWS: usize = 22;
const COLS: usize = 40;
const HEIGHT: usize = 720;
const WIDTH: usize = 1280;

/// A smooth grid with three separated bumps.
fn bumpy_grid() -> Array2<f32> {
    let centers = [(5.0f32, 8.0f32), (11.0, 20.0), (17.0, 33.0)];
    Array2::from_shape_fn((ROWS, COLS), |(r, c)| {
        centers
            .iter()
            .map(|&(cr, cc)| {
                let d2 = (r as f32 - cr).powi(2) + (c as f32 - cc).powi(2);
                (-d2 / 8.0).exp()
            })
            .sum()
    })
}

fn benchmark_similarity(c: &mut Criterion) {
    let builder = SimilarityMapBuilder::new(ROWS, COLS);
    let regions = Array2::from_shape_fn((ROWS * COLS, 1024), |(i, d)| ((i * 31 + d) % 97) as f32);
    let phrases = Array2::from_shape_fn((1, 1024), |(_, d)| (d % 13) as f32);

    c.bench_function("similarity_22x40x1024", |b| {
        b.iter(|| {
            let _ = builder.build(black_box(regions.view()), black_box(phrases.view()));
        })
    });
}

fn benchmark_resize(c: &mut Criterion) {
    let grid = bumpy_grid();

    c.bench_function("resize_22x40_to_720x1280", |b| {
        b.iter(|| {
            let _ = resize_bilinear(black_box(&grid), HEIGHT, WIDTH);
        })
    });
}

fn benchmark_extract(c: &mut Criterion) {
    let heat = HeatGrid::new(bumpy_grid());
    let extractor = BoxExtractor::new(ExtractionConfig::default());

    c.bench_function("extract_boxes_720x1280", |b| {
        b.iter(|| {
            let _ = extractor.extract(black_box(&heat), HEIGHT, WIDTH);
        })
    });
}

fn benchmark_exact_union(c: &mut Criterion) {
    let gt = BoundingBox::new(100.0, 80.0, 400.0, 300.0);
    let predictions: Vec<BoundingBox> = (0..5)
        .map(|i| {
            let o = i as f32 * 40.0;
            BoundingBox::new(50.0 + o, 60.0 + o, 300.0 + o, 260.0 + o)
        })
        .collect();
    let scorer = OverlapScorer::new(UnionMode::Exact);

    c.bench_function("score_exact_union_5", |b| {
        b.iter(|| {
            let _ = scorer.score(black_box(&gt), black_box(&predictions));
        })
    });
}

criterion_group!(
    benches,
    benchmark_similarity,
    benchmark_resize,
    benchmark_extract,
    benchmark_exact_union,
);
criterion_main!(benches);

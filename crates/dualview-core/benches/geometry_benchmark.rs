//! Benchmarks for the geometry engine
//!
//! Run with: cargo bench -p dualview-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dualview_core::{compute_rect, escapes, PreviewGeometry, RenderTransform, Size, TransformState, VideoFitMode};

fn bench_compute_rect(c: &mut Criterion) {
    let transform = TransformState { scale: 1.75, translate_x: 120.0, translate_y: -40.0 };
    let mut group = c.benchmark_group("Compute Rect");

    for fit in VideoFitMode::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(fit), &fit, |b, &fit| {
            b.iter(|| {
                compute_rect(
                    black_box(fit),
                    black_box(&transform),
                    black_box(Size::EMBED_SOURCE),
                    black_box(Size::OUTPUT_CANVAS),
                )
            })
        });
    }

    group.finish();
}

fn bench_preview(c: &mut Criterion) {
    let preview = PreviewGeometry::new(600.0, Size::OUTPUT_CANVAS);
    let transform = TransformState { scale: 2.5, translate_x: 900.0, translate_y: 0.0 };

    c.bench_function("preview_rect_and_crop", |b| {
        b.iter(|| {
            let rect = preview.preview_rect(black_box(VideoFitMode::None), black_box(&transform), Size::EMBED_SOURCE);
            preview.crop_indicator(&rect)
        })
    });

    c.bench_function("escapes", |b| {
        let rect = compute_rect(VideoFitMode::Cover, &TransformState::IDENTITY, Size::EMBED_SOURCE, Size::OUTPUT_CANVAS);
        b.iter(|| escapes(black_box(&rect), 2880.0, 960.0))
    });
}

fn bench_render_transform(c: &mut Criterion) {
    let transform = TransformState { scale: 1.2, translate_x: 33.0, translate_y: 12.5 };
    c.bench_function("render_transform_css", |b| {
        b.iter(|| {
            RenderTransform::new(
                black_box(VideoFitMode::None),
                &transform,
                Size::EMBED_SOURCE,
                Size::OUTPUT_CANVAS,
            )
            .to_css()
        })
    });
}

criterion_group!(benches, bench_compute_rect, bench_preview, bench_render_transform);
criterion_main!(benches);

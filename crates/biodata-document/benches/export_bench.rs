// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the biodata-document crate: page planning and PDF
// assembly for a snapshot the size of a typical profile card at scale 2.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use biodata_core::PageStrategy;
use biodata_document::{PageGeometry, PdfWriter, plan_pages};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Plan pages for a 2048 x 6000 px snapshot (a 1024 px card, three pages).
fn bench_plan_pages(c: &mut Criterion) {
    c.bench_function("plan_pages (2048x6000)", |b| {
        b.iter(|| plan_pages(black_box(2048), black_box(6000), PageGeometry::A4));
    });
}

/// Assemble the PDF for a 1024 x 3000 px snapshot with both page strategies.
///
/// The snapshot is a vertical gradient so the image data does not compress
/// to nothing.
fn bench_pdf_assembly(c: &mut Criterion) {
    let (width, height) = (1024u32, 3000u32);
    let snapshot = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(y % 256) as u8, (x % 256) as u8, 128, 255])
    });
    let plan = plan_pages(width, height, PageGeometry::A4).expect("non-empty snapshot");

    for strategy in [PageStrategy::Reposition, PageStrategy::Crop] {
        let mut writer = PdfWriter::a4();
        writer.set_strategy(strategy);
        c.bench_function(&format!("pdf_assembly {strategy:?} (1024x3000)"), |b| {
            b.iter(|| {
                let bytes = writer
                    .create_from_snapshot(black_box(&snapshot), &plan)
                    .expect("writer accepts plan");
                black_box(bytes);
            });
        });
    }
}

criterion_group!(benches, bench_plan_pages, bench_pdf_assembly);
criterion_main!(benches);

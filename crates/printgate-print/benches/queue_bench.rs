// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for job-state mapping and queue view building in the
// printgate-print crate.

use chrono::DateTime;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use printgate_core::types::{JobId, PrintJob};
use printgate_print::{QueueView, map_state};

/// A busy scheduler's worth of jobs with states cycling through 3..=10.
fn sample_jobs(count: i64) -> Vec<PrintJob> {
    (1..=count)
        .map(|id| PrintJob {
            id: JobId::new(id).expect("positive id"),
            printer: Some(format!("Printer{}", id % 7)),
            title: Some(format!("Web Print: document-{id}.pdf")),
            user: Some("bench".into()),
            state: 3 + (id % 8) as i32,
            size_kb: id * 3,
            created_at: DateTime::from_timestamp(1_700_000_000 + id, 0).expect("valid timestamp"),
            completed_at: DateTime::from_timestamp(1_700_000_100 + id, 0),
        })
        .collect()
}

fn bench_map_state(c: &mut Criterion) {
    c.bench_function("map_state 0..16", |b| {
        b.iter(|| {
            for code in 0..16 {
                black_box(map_state(black_box(code)));
            }
        })
    });
}

fn bench_queue_view(c: &mut Criterion) {
    let small = sample_jobs(50);
    let large = sample_jobs(5_000);

    c.bench_function("queue view 50 jobs", |b| {
        b.iter(|| QueueView::from_jobs(black_box(&small)))
    });
    c.bench_function("queue view 5000 jobs", |b| {
        b.iter(|| QueueView::from_jobs(black_box(&large)))
    });
}

criterion_group!(benches, bench_map_state, bench_queue_view);
criterion_main!(benches);

//! Performance measurement for pattern extraction and propagator construction

// Criterion macros generate undocumented functions
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wavepath::analysis::patterns::{PatternSet, index_sample};
use wavepath::analysis::propagator::Propagator;

fn striped_sample(size: usize) -> Vec<Vec<u8>> {
    (0..size)
        .map(|y| (0..size).map(|x| ((x + 2 * y) % 3) as u8).collect())
        .collect()
}

/// Measures extraction cost with all eight symmetry variants as samples grow
fn bench_extract_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_patterns");

    for size in &[8usize, 16, 32] {
        let sample = striped_sample(*size);
        let Ok((grid, palette)) = index_sample(&sample) else {
            group.finish();
            return;
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let patterns = PatternSet::extract(&grid, palette.len(), 3, true, 8);
                black_box(patterns.map(|p| p.len()).unwrap_or(0));
            });
        });
    }
    group.finish();
}

/// Measures adjacency table construction over the extracted pattern set
fn bench_build_propagator(c: &mut Criterion) {
    let sample = striped_sample(16);
    let Ok((grid, palette)) = index_sample(&sample) else {
        return;
    };
    let Ok(patterns) = PatternSet::extract(&grid, palette.len(), 3, true, 8) else {
        return;
    };

    c.bench_function("build_propagator", |b| {
        b.iter(|| {
            black_box(Propagator::build(&patterns).support_count(0, 0));
        });
    });
}

criterion_group!(benches, bench_extract_patterns, bench_build_propagator);
criterion_main!(benches);

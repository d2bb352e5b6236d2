use criterion::{criterion_group, criterion_main, Criterion};
use sggen::{errors::SGError, generators::{regular, regular_with_boundaries, truncated}, storage::SparseGridData};

fn build<F: Fn(&mut SparseGridData) -> Result<(), SGError>>(dim: usize, f: F) -> SparseGridData
{
    let mut storage = SparseGridData::new(dim);
    f(&mut storage).unwrap();
    storage
}

fn run_regular(c: &mut Criterion)
{
    c.bench_function("regular 6d level 6", |b| b.iter(|| build(6, |s| regular(s, 6, None))));
}

fn run_boundaries(c: &mut Criterion)
{
    c.bench_function("regular_with_boundaries 6d level 5", |b| b.iter(|| build(6, |s| regular_with_boundaries(s, 5, Some(1)))));
    c.bench_function("classic boundaries 6d level 5", |b| b.iter(|| build(6, |s| regular_with_boundaries(s, 5, Some(0)))));
}

fn run_truncated(c: &mut Criterion)
{
    c.bench_function("truncated 4d level 5", |b| b.iter(|| build(4, |s| truncated(s, 5, 2))));
}

criterion_group!(benches, run_regular, run_boundaries, run_truncated);
criterion_main!(benches);

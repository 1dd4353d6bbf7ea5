//! Benchmark: keyed list reconciliation

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_core::prelude::*;

fn list(keys: &[usize]) -> VNode {
    h(
        "ul",
        Props::new(),
        keys.iter()
            .map(|key| h("li", Props::new().key(*key), vec![text(key.to_string())]))
            .collect(),
    )
}

fn benchmark_keyed_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_reverse");

    for size in [10usize, 100, 1000] {
        let forward: Vec<usize> = (0..size).collect();
        let reversed: Vec<usize> = forward.iter().rev().copied().collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            let memory = MemoryHost::new();
            let host: Rc<dyn Host> = memory.clone();
            render(list(&forward), &host, memory.root()).unwrap();

            let mut flip = false;
            b.iter(|| {
                let keys = if flip { &forward } else { &reversed };
                flip = !flip;
                render(black_box(list(keys)), &host, memory.root()).unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_keyed_append(c: &mut Criterion) {
    c.bench_function("keyed_append_100", |b| {
        let base: Vec<usize> = (0..100).collect();
        let extended: Vec<usize> = (0..101).collect();
        let memory = MemoryHost::new();
        let host: Rc<dyn Host> = memory.clone();

        let mut grown = false;
        b.iter(|| {
            let keys = if grown { &base } else { &extended };
            grown = !grown;
            render(black_box(list(keys)), &host, memory.root()).unwrap();
        });
    });
}

criterion_group!(benches, benchmark_keyed_reverse, benchmark_keyed_append);
criterion_main!(benches);

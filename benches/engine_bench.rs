// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use crawlgraph::{
    Action, ComparisonKey, Identification, Snapshot, StateCandidate, StateComparator, StateGraph,
    StateId, StrippingComparator,
};

fn normalization_benchmark(c: &mut Criterion) {
    let html = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Orders</title>
            <style>.row { color: red; }</style>
            <script>window.__state = {"ts": 1718000000};</script>
        </head>
        <body>
            <!-- rendered 2024-06-10 14:31:07 -->
            <div id="content">
                <a href="/orders?page=1">Page 1</a>
                <a href="/orders?page=2">Page 2</a>
                <p>Last updated 2024-06-10T14:31:07Z</p>
            </div>
        </body>
        </html>
    "#;
    let snapshot = Snapshot::new("http://app.test/orders", html);
    let comparator = StrippingComparator::default();

    c.bench_function("normalize_default_chain", |b| {
        b.iter(|| black_box(comparator.normalize(black_box(&snapshot))))
    });
}

fn graph_insertion_benchmark(c: &mut Criterion) {
    let candidate = |i: usize| {
        let dom = format!("<p>state {}</p>", i);
        StateCandidate::new(
            Snapshot::new("http://app.test/", dom.as_str()),
            ComparisonKey::new(dom),
            1,
        )
    };

    c.bench_function("discover_1000_states", |b| {
        b.iter(|| {
            let graph = StateGraph::new(candidate(0));
            for i in 1..1000 {
                let action = Action::click(Identification::id(format!("s{}", i)));
                black_box(graph.discover(StateId::ROOT, action, candidate(i), None).ok());
            }
            graph.state_count()
        })
    });

    c.bench_function("discover_duplicate_key", |b| {
        let graph = StateGraph::new(candidate(0));
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let action = Action::click(Identification::id(format!("d{}", i)));
            black_box(graph.discover(StateId::ROOT, action, candidate(1), None).ok())
        })
    });
}

criterion_group!(benches, normalization_benchmark, graph_insertion_benchmark);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion, black_box};
use panelbot::search::{SearchControl, SearchParams, SearchTables, Searcher};
use panelbot::Position;

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_startpos");
    group.sample_size(10);
    for (name, nullmove) in [("depth_4", false), ("depth_4_nullmove", true)] {
        group.bench_function(name, |ben| {
            ben.iter(|| {
                let mut tables = SearchTables::new();
                let mut pos = Position::startpos();
                let params = SearchParams { depth: 4, movetime: None, use_nullmove: nullmove, ..SearchParams::default() };
                let r = Searcher::new(&mut tables, SearchControl::default()).search(black_box(&mut pos), params);
                black_box(r.nodes)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);

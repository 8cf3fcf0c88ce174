use criterion::{criterion_group, criterion_main, Criterion, black_box};
use cozy_chess::Board;
use panelbot::search::{SearchControl, SearchTables, Searcher};

// Open position with several exchanges available to both sides
const TACTICAL: &str = "r1bqk2r/ppp2ppp/2n2n2/2bpp3/2B1P3/2NP1N2/PPP2PPP/R1BQK2R w KQkq - 0 6";

fn bench_qsearch(c: &mut Criterion) {
    let start = Board::default();
    let tactical = Board::from_fen(TACTICAL, false).unwrap();
    let mut tables = SearchTables::new();
    c.bench_function("qsearch_startpos", |ben| {
        ben.iter(|| Searcher::new(&mut tables, SearchControl::default()).qsearch_eval_cp(black_box(&start)))
    });
    c.bench_function("qsearch_tactical", |ben| {
        ben.iter(|| Searcher::new(&mut tables, SearchControl::default()).qsearch_eval_cp(black_box(&tactical)))
    });
}

criterion_group!(benches, bench_qsearch);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion, black_box};
use cozy_chess::Board;
use panelbot::search::eval::{evaluate, EvalOptions};

const MIDDLEGAME: &str = "r1bq1rk1/pp2bppp/2n1pn2/3p4/2PP4/2N1PN2/PP1B1PPP/R2QKB1R w KQ - 0 8";

fn bench_eval(c: &mut Criterion) {
    let start = Board::default();
    let mid = Board::from_fen(MIDDLEGAME, false).unwrap();
    c.bench_function("eval_startpos", |ben| {
        ben.iter(|| black_box(evaluate(black_box(&start), EvalOptions::default())))
    });
    c.bench_function("eval_middlegame_aggressive", |ben| {
        ben.iter(|| black_box(evaluate(black_box(&mid), EvalOptions { aggressive: true })))
    });
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);

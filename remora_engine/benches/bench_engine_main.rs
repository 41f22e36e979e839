#[macro_use]
extern crate criterion;
extern crate remora;
extern crate remora_engine;

use criterion::{black_box, Criterion};

use remora::Position;
use remora_engine::search::eval;
use remora_engine::threadpool::threadpool;

fn bench_eval(c: &mut Criterion) {
    remora_engine::init();
    let pos = Position::from_fen(
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    )
    .unwrap();
    c.bench_function("eval middlegame", move |b| {
        b.iter(|| black_box(eval::evaluate(&pos)))
    });
}

fn bench_search_depth_4(c: &mut Criterion) {
    remora_engine::init();
    threadpool().set_thread_count(1);
    c.bench_function("search startpos depth 4", |b| {
        b.iter(|| {
            let pos = Position::start_pos();
            black_box(threadpool().search(&pos, 4))
        })
    });
}

fn bench_search_depth_5(c: &mut Criterion) {
    remora_engine::init();
    threadpool().set_thread_count(1);
    c.bench_function("search startpos depth 5", |b| {
        b.iter(|| {
            let pos = Position::start_pos();
            black_box(threadpool().search(&pos, 5))
        })
    });
}

criterion_group!(
    name = engine_benches;
    config = Criterion::default().sample_size(10);
    targets = bench_eval, bench_search_depth_4, bench_search_depth_5
);
criterion_main!(engine_benches);

#[macro_use]
extern crate criterion;
extern crate remora;

use criterion::{black_box, Criterion};

use remora::board::perft::perft;
use remora::helper::prelude::init_statics;
use remora::Position;

fn bench_movegen_start(c: &mut Criterion) {
    init_statics();
    let pos = Position::start_pos();
    c.bench_function("movegen startpos", move |b| {
        b.iter(|| black_box(pos.generate_moves().len()))
    });
}

fn bench_movegen_midgame(c: &mut Criterion) {
    init_statics();
    let pos = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    c.bench_function("movegen kiwipete", move |b| {
        b.iter(|| black_box(pos.generate_moves().len()))
    });
}

fn bench_perft_3(c: &mut Criterion) {
    init_statics();
    c.bench_function("perft 3 startpos", |b| {
        b.iter(|| {
            let mut pos = Position::start_pos();
            black_box(perft(&mut pos, 3))
        })
    });
}

criterion_group!(
    name = board_benches;
    config = Criterion::default().sample_size(10);
    targets = bench_movegen_start, bench_movegen_midgame, bench_perft_3
);
criterion_main!(board_benches);

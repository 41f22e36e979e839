#[macro_use]
extern crate lazy_static;
extern crate remora;
extern crate remora_engine;

use std::sync::Mutex;

use remora::core::score::{DRAW, MATE};
use remora::Position;
use remora_engine::threadpool::threadpool;

lazy_static! {
    // The pool is a process-wide singleton, so the search tests take turns.
    static ref SEARCH_LOCK: Mutex<()> = Mutex::new(());
}

fn setup(threads: usize) -> std::sync::MutexGuard<'static, ()> {
    let guard = SEARCH_LOCK.lock().unwrap();
    remora_engine::init();
    threadpool().set_thread_count(threads);
    guard
}

#[test]
fn startpos_best_move_is_legal() {
    let _guard = setup(1);
    let pos = Position::start_pos();
    let best = threadpool().search(&pos, 4);

    let legal = pos.generate_moves();
    assert_eq!(legal.len(), 20);
    assert!(legal.contains(&best), "{} is not a legal opening move", best);
}

#[test]
fn reply_to_best_move_is_legal() {
    let _guard = setup(1);
    let mut pos = Position::start_pos();
    let best = threadpool().search(&pos, 4);
    assert!(pos.legal(best));

    let gives_check = pos.gives_check(best);
    pos.make_move(best, gives_check);

    let reply = threadpool().search(&pos, 4);
    assert!(pos.generate_moves().contains(&reply));
    assert!(threadpool().main().previous_score >= -MATE + 4);
}

#[test]
fn finds_mate_in_one() {
    let _guard = setup(1);
    let pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
    let best = threadpool().search(&pos, 3);

    assert_eq!(best.stringify(), "a1a8");
    assert!(threadpool().main().previous_score >= MATE - 2);
}

#[test]
fn stalemate_returns_null_move() {
    let _guard = setup(1);
    let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(pos.generate_moves().is_empty());
    assert!(!pos.in_check());

    let best = threadpool().search(&pos, 4);
    assert!(best.is_null());
}

#[test]
fn checkmated_root_returns_null_move() {
    let _guard = setup(1);
    // Fool's mate: white is mated, no moves exist.
    let pos = Position::from_fen(
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
    )
    .unwrap();
    assert!(pos.in_check());
    assert!(pos.generate_moves().is_empty());

    let best = threadpool().search(&pos, 4);
    assert!(best.is_null());
}

#[test]
fn repeated_position_scores_draw() {
    let _guard = setup(1);
    let mut pos = Position::start_pos();
    for mv in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6"].iter() {
        let m = pos.move_from_str(mv).unwrap();
        let gc = pos.gives_check(m);
        pos.make_move(m, gc);
    }
    assert!(pos.is_draw());

    threadpool().search(&pos, 4);
    assert_eq!(threadpool().main().previous_score, DRAW);
}

#[test]
fn parallel_search_smoke() {
    let _guard = setup(4);
    let pos = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    let best = threadpool().search(&pos, 5);
    assert!(pos.generate_moves().contains(&best));
    assert!(threadpool().nodes() > 0);
}

#[test]
fn deeper_search_still_legal() {
    let _guard = setup(2);
    let pos = Position::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
    let best = threadpool().search(&pos, 6);
    assert!(pos.generate_moves().contains(&best));
}

extern crate remora;

use remora::board::fen::{ALL_FENS, START_FEN};
use remora::helper::prelude::init_statics;
use remora::Position;

#[test]
fn fen_round_trips() {
    init_statics();
    for fen in ALL_FENS.iter() {
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(&pos.fen(), fen, "round trip failed for {}", fen);
    }
}

#[test]
fn start_fen_is_default() {
    init_statics();
    let pos = Position::start_pos();
    assert_eq!(pos.fen(), START_FEN);
}

#[test]
fn rejects_bad_sections() {
    init_statics();
    assert!(Position::from_fen("").is_err());
    assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8 w KQkq - 0 1").is_err());
    assert!(Position::from_fen(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"
    )
    .is_err());
    assert!(Position::from_fen(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KXkq - 0 1"
    )
    .is_err());
    assert!(Position::from_fen(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1"
    )
    .is_err());
    assert!(Position::from_fen(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - abc 1"
    )
    .is_err());
}

#[test]
fn ep_square_parses() {
    init_statics();
    let pos = Position::from_fen(
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
    )
    .unwrap();
    assert_eq!(pos.ep_square().to_string(), "c6");
}

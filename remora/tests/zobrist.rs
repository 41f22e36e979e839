extern crate rand;
extern crate remora;

use remora::helper::prelude::init_statics;
use remora::Position;

// The incrementally maintained keys must always equal the keys recomputed from
// scratch, no matter what sequence of moves was applied.
#[test]
fn incremental_matches_recomputed() {
    init_statics();
    let mut pos = Position::start_pos();
    let mut ply = 300;

    while ply > 0 {
        assert_eq!(pos.zobrist(), pos.recompute_zobrist());
        assert_eq!(pos.secondary_key(), pos.recompute_secondary());

        let moves = pos.generate_moves();
        if moves.is_empty() || pos.is_draw() {
            break;
        }
        let m = moves[rand::random::<usize>() % moves.len()];
        let gives_check = pos.gives_check(m);
        pos.make_move(m, gives_check);
        ply -= 1;
    }
}

// Positions reached through different move orders hash identically.
#[test]
fn transposition_same_key() {
    init_statics();
    let mut a = Position::start_pos();
    for mv in ["g1f3", "g8f6", "d2d4"].iter() {
        let m = a.move_from_str(mv).unwrap();
        let gc = a.gives_check(m);
        a.make_move(m, gc);
    }

    let mut b = Position::start_pos();
    for mv in ["d2d4", "g8f6", "g1f3"].iter() {
        let m = b.move_from_str(mv).unwrap();
        let gc = b.gives_check(m);
        b.make_move(m, gc);
    }

    assert_eq!(a.zobrist(), b.zobrist());
    assert_eq!(a.secondary_key(), b.secondary_key());
    assert_eq!(a.fen(), b.fen());
}

// Losing a castling right changes the hash even with identical placement.
#[test]
fn castling_rights_hashed() {
    init_statics();
    let with_rights =
        Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let without_rights =
        Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
    assert_ne!(with_rights.zobrist(), without_rights.zobrist());
}

// The en-passant file only hashes while the capture is actually available.
#[test]
fn ep_file_hashed_conditionally() {
    init_statics();
    let plain = Position::from_fen(
        "rnbqkbnr/pppp1ppp/8/8/4Pp2/8/PPPP2PP/RNBQKBNR b KQkq - 0 3",
    )
    .unwrap();
    let with_ep = Position::from_fen(
        "rnbqkbnr/pppp1ppp/8/8/4Pp2/8/PPPP2PP/RNBQKBNR b KQkq e3 0 3",
    )
    .unwrap();
    assert_ne!(plain.zobrist(), with_ep.zobrist());
}

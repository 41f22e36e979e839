extern crate rand;
extern crate remora;

use remora::helper::prelude::init_statics;
use remora::Position;

// Plays out a pseudo-random game, recording the FEN at every ply, then unwinds
// it move by move checking the positions match exactly.
#[test]
fn random_playout_fen_unwind() {
    init_statics();
    let mut pos = Position::start_pos();
    let mut fen_stack: Vec<String> = Vec::new();
    let mut ply = 200;

    while ply > 0 {
        let moves = pos.generate_moves();
        if moves.is_empty() || pos.is_draw() {
            break;
        }
        fen_stack.push(pos.fen());
        let m = moves[rand::random::<usize>() % moves.len()];
        let gives_check = pos.gives_check(m);
        pos.make_move(m, gives_check);
        ply -= 1;
    }

    while let Some(fen) = fen_stack.pop() {
        pos.unmake_move();
        assert_eq!(pos.fen(), fen);
    }
}

#[test]
fn random_playout_state_unwind() {
    init_statics();
    let mut pos = Position::start_pos();
    let mut stack: Vec<(u64, u64, u64, u64, i16)> = Vec::new();
    let mut ply = 300;

    while ply > 0 {
        let moves = pos.generate_moves();
        if moves.is_empty() || pos.is_draw() {
            break;
        }
        stack.push((
            pos.zobrist(),
            pos.pawn_key(),
            pos.minor_key(),
            pos.major_key(),
            pos.rule_50(),
        ));
        let m = moves[rand::random::<usize>() % moves.len()];
        let gives_check = pos.gives_check(m);
        pos.make_move(m, gives_check);
        ply -= 1;
    }

    while let Some((zob, pawn, minor, major, rule_50)) = stack.pop() {
        pos.unmake_move();
        assert_eq!(pos.zobrist(), zob);
        assert_eq!(pos.pawn_key(), pawn);
        assert_eq!(pos.minor_key(), minor);
        assert_eq!(pos.major_key(), major);
        assert_eq!(pos.rule_50(), rule_50);
    }
}

// Castling rights may only shrink as moves are applied.
#[test]
fn castling_rights_monotone() {
    init_statics();
    let mut pos = Position::start_pos();
    let mut ply = 200;
    let mut prev_bits = pos.state().castling.bits();

    while ply > 0 {
        let moves = pos.generate_moves();
        if moves.is_empty() || pos.is_draw() {
            break;
        }
        let m = moves[rand::random::<usize>() % moves.len()];
        let gives_check = pos.gives_check(m);
        pos.make_move(m, gives_check);

        let bits = pos.state().castling.bits();
        assert_eq!(bits & !prev_bits, 0);
        prev_bits = bits;
        ply -= 1;
    }
}

// The checkers bitboard must be non-empty exactly when the side to move is in
// check.
#[test]
fn checkers_consistent_with_attacks() {
    init_statics();
    let mut pos = Position::start_pos();
    let mut ply = 300;

    while ply > 0 {
        let moves = pos.generate_moves();
        if moves.is_empty() || pos.is_draw() {
            break;
        }
        let m = moves[rand::random::<usize>() % moves.len()];
        let gives_check = pos.gives_check(m);
        pos.make_move(m, gives_check);

        let us = pos.turn();
        let attackers = pos.attackers_to(pos.king_sq(us), pos.occupied())
            & pos.get_occupied_player(!us);
        assert_eq!(attackers, pos.checkers());
        assert_eq!(pos.in_check(), attackers.is_not_empty());
        ply -= 1;
    }
}

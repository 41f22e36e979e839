//! The static evaluation: a phase-blended, side-to-move-relative score of a
//! position, producing the leaf values the search operates on.
//!
//! A game phase is derived from the count of minor and major pieces and from
//! whether the back ranks have been cleared of minor pieces; each phase selects
//! its own coefficients. Per side, the evaluation sums discounted material with
//! mobility bonuses, center occupancy, rook coordination, king safety, and pawn
//! structure. A tempo term proportional to the mover's legal move count is
//! added last.

use remora::core::bitboard::BitBoard;
use remora::core::score::*;
use remora::core::{file_bb, rank_idx_of_sq, PieceType, Player};
use remora::helper::prelude::*;
use remora::{Position, SQ};

/// The four inner center squares, d4 / e4 / d5 / e5.
const INNER_CENTER: BitBoard = BitBoard(0x0000_0018_1800_0000);
/// The 4x4 block of center squares, c3 through f6.
const OUTER_CENTER: BitBoard = BitBoard(0x0000_3C3C_3C3C_0000);

const INNER_CENTER_BONUS: Value = 10;
const OUTER_CENTER_BONUS: Value = 5;
const ROOKS_CONNECTED_BONUS: Value = 20;
const OPEN_FILE_BONUS: Value = 20;
const PASS_PAWN_BONUS: Value = 30;
const ISOLATED_PAWN_PENALTY: Value = (4 * PAWN_VALUE) / 10;

/// The phase of the game, selecting the coefficient set of the evaluation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Phase {
    Opening,
    MiddleGame,
    EndGame,
}

/// Returns the game phase of a position, derived from the number of minor and
/// major pieces remaining and the clearance of the back ranks.
pub fn game_phase(pos: &Position) -> Phase {
    let minors_and_majors = (pos.piece_bb_both_players(PieceType::N)
        | pos.piece_bb_both_players(PieceType::B)
        | pos.piece_bb_both_players(PieceType::R)
        | pos.piece_bb_both_players(PieceType::Q))
    .count_bits();

    if minors_and_majors <= 6 {
        Phase::EndGame
    } else if minors_and_majors <= 10 {
        Phase::MiddleGame
    } else {
        for &c in [Player::White, Player::Black].iter() {
            let home_rank = if c == Player::White {
                BitBoard::RANK_1
            } else {
                BitBoard::RANK_8
            };
            let backrank = pos.get_occupied_player(c)
                & home_rank
                & !(pos.piece_bb(c, PieceType::R) | pos.piece_bb(c, PieceType::K));
            if backrank.is_empty() {
                return Phase::MiddleGame;
            }
        }
        Phase::Opening
    }
}

/// Evaluates the position, returning a score relative to the side to move.
pub fn evaluate(pos: &Position) -> Value {
    let phase = game_phase(pos);
    let diff = evaluate_side(pos, Player::White, phase) - evaluate_side(pos, Player::Black, phase);
    let relative = match pos.turn() {
        Player::White => diff,
        Player::Black => -diff,
    };
    relative + tempo(pos)
}

// The mover's activity: one point per legal move available.
fn tempo(pos: &Position) -> Value {
    pos.generate_moves().len() as Value
}

fn evaluate_side(pos: &Position, c: Player, phase: Phase) -> Value {
    score_material(pos, c, phase) + score_king_safety(pos, c, phase) + score_pawns(pos, c)
}

fn score_material(pos: &Position, c: Player, phase: Phase) -> Value {
    let mut score: Value = 0;

    let mut pawns = pos.piece_bb(c, PieceType::P);
    let mut knights = pos.piece_bb(c, PieceType::N);
    let mut bishops = pos.piece_bb(c, PieceType::B);
    let mut rooks = pos.piece_bb(c, PieceType::R);
    let mut queens = pos.piece_bb(c, PieceType::Q);
    let rooks_bb = rooks;

    let king_sq: SQ = pos.king_sq(c);
    let occ = pos.occupied();

    // Raw material, discounted so the positional terms have leverage.
    score += (8 * PAWN_VALUE * Value::from(pawns.count_bits())) / 10;
    score += (6 * KNIGHT_VALUE * Value::from(knights.count_bits())) / 10;
    score += (6 * BISHOP_VALUE * Value::from(bishops.count_bits())) / 10;
    score += (6 * ROOK_VALUE * Value::from(rooks.count_bits())) / 10;
    score += (6 * QUEEN_VALUE * Value::from(queens.count_bits())) / 10;
    score += KING_VALUE;

    let center_mult: Value = match phase {
        Phase::Opening => 2,
        Phase::MiddleGame => 1,
        Phase::EndGame => 0,
    };

    // Pawns: attack spread and center presence.
    while let Some(pawn_sq) = pawns.pop_some_lsb() {
        let pawn_attack = pawn_attacks_from(pawn_sq, c);
        score += (PAWN_VALUE * Value::from(pawn_attack.count_bits())) / 10;
        score += center_mult
            * OUTER_CENTER_BONUS
            * Value::from((OUTER_CENTER & pawn_sq.to_bb()).count_bits());
        score += center_mult
            * INNER_CENTER_BONUS
            * Value::from((INNER_CENTER & pawn_sq.to_bb()).count_bits());
    }

    // Knights: mobility, own square on the outer center, attacks into the
    // inner center.
    while let Some(knight_sq) = knights.pop_some_lsb() {
        let knight_attack = knight_moves(knight_sq);
        score += (7 * KNIGHT_VALUE * Value::from(knight_attack.count_bits())) / 100;
        score += center_mult
            * OUTER_CENTER_BONUS
            * Value::from((OUTER_CENTER & knight_sq.to_bb()).count_bits());
        score += center_mult
            * INNER_CENTER_BONUS
            * Value::from((INNER_CENTER & knight_attack).count_bits());
    }

    // Bishops: per-diagonal ray mobility, with a growing bonus for long rays.
    while let Some(bishop_sq) = bishops.pop_some_lsb() {
        let bishop_attack = bishop_moves(occ, bishop_sq);
        // The four diagonal directions of the ray tables.
        for &d in [1_usize, 3, 5, 7].iter() {
            let ray = bishop_attack & direction_ray(bishop_sq, d);
            let n = Value::from(ray.count_bits());
            score += (5 * BISHOP_VALUE * n) / 100;
            score += (BISHOP_VALUE * (n - 3).max(0)) / 100;
        }
        if (OUTER_CENTER & bishop_sq.to_bb()).is_not_empty() {
            score += center_mult * OUTER_CENTER_BONUS;
        }
    }

    // Rooks: open-board spread, connection, open files.
    while let Some(rook_sq) = rooks.pop_some_lsb() {
        let rook_attack = rook_moves(BitBoard(0), rook_sq);
        score += (5 * ROOK_VALUE * Value::from(rook_attack.count_bits())) / 100;
        score += ROOKS_CONNECTED_BONUS * Value::from((rook_attack & rooks_bb).count_bits());
        if (pos.piece_bb_both_players(PieceType::P) & BitBoard(file_bb(rook_sq.0))).is_empty() {
            score += OPEN_FILE_BONUS;
        }
    }

    // Queens: spread, counted lightly early and heavily late.
    let (queen_num, queen_den): (Value, Value) = match phase {
        Phase::Opening => (1, 100),
        Phase::MiddleGame => (70, 100),
        Phase::EndGame => (150, 100),
    };
    while let Some(queen_sq) = queens.pop_some_lsb() {
        let queen_attack = rook_moves(BitBoard(0), queen_sq);
        score +=
            (queen_num * QUEEN_VALUE * Value::from(queen_attack.count_bits())) / (100 * queen_den);
    }

    // King: mobility is a liability early and an asset late.
    let (king_num, king_den): (Value, Value) = match phase {
        Phase::Opening => (0, 1),
        Phase::MiddleGame => (1, 2),
        Phase::EndGame => (3, 1),
    };
    score += (king_num * Value::from(king_moves(king_sq).count_bits())) / king_den;
    score += (king_num
        * OUTER_CENTER_BONUS
        * Value::from((OUTER_CENTER & king_sq.to_bb()).count_bits()))
        / king_den;

    score
}

fn score_king_safety(pos: &Position, c: Player, phase: Phase) -> Value {
    let king_sq: SQ = pos.king_sq(c);
    let king_zone: BitBoard = king_moves(king_sq);

    // The rank directly ahead of the king, from the king's perspective.
    let king_rank = rank_idx_of_sq(king_sq.0);
    let shield_rank: Option<u8> = match c {
        Player::White if king_rank < 7 => Some(king_rank + 1),
        Player::Black if king_rank > 0 => Some(king_rank - 1),
        _ => None,
    };
    let pawn_shield_zone: BitBoard = match shield_rank {
        Some(r) => king_zone & BitBoard(remora::core::masks::RANK_BB[r as usize]),
        None => BitBoard(0),
    };

    let shield_mult: Value = match phase {
        Phase::Opening => 1,
        Phase::MiddleGame => 2,
        Phase::EndGame => 0,
    };

    let pawn_shield = shield_mult
        * (-50
            + 20 * Value::from((pawn_shield_zone & pos.piece_bb(c, PieceType::P)).count_bits()));

    let open_file = if (pos.piece_bb_both_players(PieceType::P) & BitBoard(file_bb(king_sq.0)))
        .is_empty()
    {
        -OPEN_FILE_BONUS
    } else {
        0
    };

    let def_atk_squares = 3 * pos.count_attacks(c, king_zone) - pos.count_attacks(!c, king_zone);

    pawn_shield + open_file + def_atk_squares
}

fn score_pawns(pos: &Position, c: Player) -> Value {
    let pawns = pos.piece_bb(c, PieceType::P);
    let opp_pawns = pos.piece_bb(!c, PieceType::P);
    let mut score: Value = 0;

    // Mutual defense: pawns covering each other.
    let pawns_attack = pos.attacks_by(c, PieceType::P);
    score += 5 * Value::from((pawns_attack & pawns).count_bits());

    let mut pawns_temp = pawns;
    while let Some(pawn_sq) = pawns_temp.pop_some_lsb() {
        // A pawn with no friend on an adjacent file is isolated.
        if (pawns & adjacent_sq_file(pawn_sq)).is_empty() {
            score -= ISOLATED_PAWN_PENALTY;
        }

        // A pawn with no opponent ahead on its own or adjacent files is passed.
        if (opp_pawns & passed_pawn_mask(c, pawn_sq)).is_empty() {
            score += PASS_PAWN_BONUS;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use remora::helper::prelude::init_statics;

    #[test]
    fn startpos_is_balanced() {
        init_statics();
        let pos = Position::start_pos();
        assert_eq!(game_phase(&pos), Phase::Opening);

        // White and black mirror each other; only the tempo term remains.
        let eval = evaluate(&pos);
        assert_eq!(eval, tempo(&pos));
        assert_eq!(eval, 20);
    }

    #[test]
    fn material_advantage_reflected() {
        init_statics();
        // White is up a queen.
        let pos = Position::from_fen(
            "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        )
        .unwrap();
        assert!(evaluate(&pos) > QUEEN_VALUE / 4);

        // The same position from black's perspective scores negative.
        let pos = Position::from_fen(
            "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1",
        )
        .unwrap();
        assert!(evaluate(&pos) < 0);
    }

    #[test]
    fn phases_by_material() {
        init_statics();
        let endgame = Position::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        assert_eq!(game_phase(&endgame), Phase::EndGame);

        let middlegame = Position::from_fen(
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        )
        .unwrap();
        assert_eq!(game_phase(&middlegame), Phase::MiddleGame);
    }

    #[test]
    fn passed_pawn_rewarded() {
        init_statics();
        // A lone e5 pawn is passed; adding a black pawn on e7 both blocks it
        // and swings material, so the passed position must score higher.
        let passed =
            Position::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - - 0 1").unwrap();
        let blocked =
            Position::from_fen("4k3/4p3/8/4P3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(evaluate(&passed) > evaluate(&blocked));
    }
}

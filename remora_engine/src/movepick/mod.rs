//! The staged move orderer feeding the search one move at a time.
//!
//! Rather than generating and sorting every move up front, the orderer walks a
//! state machine, generating each category lazily and advancing on its own
//! when a stage runs dry:
//!
//! ```md,ignore
//! not in check:  TT -> CAPTURES_GEN -> CAPTURE -> QUIETS_GEN -> QUIET
//!                   -> BAD_CAPTURE -> BAD_QUIET -> END
//! in check:      TT -> EVASIONS_GEN -> EVASION -> END
//! ```
//!
//! Captures are graded by MVV-LVA and losing ones deferred behind the quiets;
//! quiets are graded by the killer / relative-history heuristics plus a few
//! threat terms. The move offered at the TT stage is never re-emitted by a
//! later stage, and every pseudo-legal move is emitted exactly once before the
//! null move signals the end.

use remora::board::movegen::{MoveGen, PseudoLegal};
use remora::core::mono_traits::{CapturesGenType, EvasionsGenType, QuietsGenType};
use remora::core::move_list::{GradedMoveList, MVPushable};
use remora::core::piece_move::{BitMove, GradedMove};
use remora::core::score::Value;
use remora::{BitBoard, PieceType, Position};

use crate::tables::{ButterflyTable, HistoryTable, KillerTable};

// Quiets graded at or below this are deferred behind the bad captures.
const BAD_QUIET_THRESHOLD: Value = 0;

// Boost that lifts checker captures above every other evasion.
const EVASION_CAPTURE_BOOST: Value = 1 << 20;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Stage {
    TableMove,
    CapturesGen,
    Capture,
    QuietsGen,
    Quiet,
    BadCapture,
    BadQuiet,
    EvasionTableMove,
    EvasionsGen,
    Evasion,
    End,
}

enum ScoreKind {
    Captures,
    Quiets,
    Evasions,
}

/// Lifts every move graded above the threshold to the front of the list, in
/// sorted order, without paying to sort the remainder.
pub fn partial_insertion_sort(moves: &mut [GradedMove], threshold: Value) {
    let mut sorted_idx: usize = 0;
    for i in 1..moves.len() {
        if moves[i].score > threshold {
            let tmp = moves[i];
            sorted_idx += 1;
            moves[i] = moves[sorted_idx];
            let mut j = sorted_idx;
            while j > 0 && moves[j - 1].score < tmp.score {
                moves[j] = moves[j - 1];
                j -= 1;
            }
            moves[j] = tmp;
        }
    }
}

#[inline]
fn mvv_lva(victim: PieceType, attacker: PieceType) -> Value {
    debug_assert!(victim.is_real());
    debug_assert!(attacker.is_real());
    victim.value() - attacker.value()
}

/// A staged move orderer over one node of the search.
///
/// Holds raw pointers to the position and the worker's heuristic tables, as
/// both also need to be reachable mutably from the search between calls to
/// [`MoveOrderer::next`]. The orderer must not outlive the node it was built
/// for: any application of a move invalidates the generated lists.
pub struct MoveOrderer {
    board: *const Position,
    killers: *const KillerTable,
    history: *const HistoryTable,
    butterfly: *const ButterflyTable,

    stage: Stage,
    table_move: BitMove,
    ply: u16,

    moves: GradedMoveList,
    curr: usize,
    end: usize,
    end_bad_captures: usize,
    begin_bad_quiets: usize,
    end_bad_quiets: usize,
}

impl MoveOrderer {
    /// Creates an orderer for the current node, seeded with the transposition
    /// table move (null for none).
    pub fn new(
        board: &Position,
        table_move: BitMove,
        ply: u16,
        killers: &KillerTable,
        history: &HistoryTable,
        butterfly: &ButterflyTable,
    ) -> Self {
        let stage = if board.in_check() {
            Stage::EvasionTableMove
        } else {
            Stage::TableMove
        };
        MoveOrderer {
            board,
            killers,
            history,
            butterfly,
            stage,
            table_move,
            ply,
            moves: GradedMoveList::default(),
            curr: 0,
            end: 0,
            end_bad_captures: 0,
            begin_bad_quiets: 0,
            end_bad_quiets: 0,
        }
    }

    fn board(&self) -> &Position {
        unsafe { &*self.board }
    }

    /// Returns the next move to search, or the null move once every move has
    /// been emitted.
    pub fn next(&mut self) -> BitMove {
        loop {
            match self.stage {
                Stage::TableMove => {
                    self.stage = Stage::CapturesGen;
                    if !self.table_move.is_null() && self.board().legal(self.table_move) {
                        return self.table_move;
                    }
                    self.table_move = BitMove::null();
                }
                Stage::CapturesGen => {
                    self.generate::<CapturesGenType>(0);
                    self.score(ScoreKind::Captures);
                    self.sort_segment(Value::min_value());
                    self.end_bad_captures = 0;
                    self.stage = Stage::Capture;
                }
                Stage::Capture => {
                    while self.curr < self.end {
                        let gm: GradedMove = self.moves[self.curr];
                        self.curr += 1;
                        if gm.bit_move == self.table_move {
                            continue;
                        }
                        if gm.score >= 0 {
                            return gm.bit_move;
                        }
                        // A losing capture waits until the quiets have run out.
                        self.moves[self.end_bad_captures] = gm;
                        self.end_bad_captures += 1;
                    }
                    self.stage = Stage::QuietsGen;
                }
                Stage::QuietsGen => {
                    self.generate::<QuietsGenType>(self.end_bad_captures);
                    self.score(ScoreKind::Quiets);
                    self.sort_segment(BAD_QUIET_THRESHOLD);
                    self.begin_bad_quiets = self.end;
                    self.end_bad_quiets = self.end;
                    self.stage = Stage::Quiet;
                }
                Stage::Quiet => {
                    while self.curr < self.end {
                        let gm: GradedMove = self.moves[self.curr];
                        self.curr += 1;
                        if gm.bit_move == self.table_move {
                            continue;
                        }
                        if gm.score > BAD_QUIET_THRESHOLD {
                            return gm.bit_move;
                        }
                        // The sorted region is exhausted; everything from here
                        // on is a bad quiet.
                        self.begin_bad_quiets = self.curr - 1;
                        break;
                    }
                    self.curr = 0;
                    self.end = self.end_bad_captures;
                    self.stage = Stage::BadCapture;
                }
                Stage::BadCapture => {
                    while self.curr < self.end {
                        let gm: GradedMove = self.moves[self.curr];
                        self.curr += 1;
                        if gm.bit_move != self.table_move {
                            return gm.bit_move;
                        }
                    }
                    self.curr = self.begin_bad_quiets;
                    self.end = self.end_bad_quiets;
                    self.stage = Stage::BadQuiet;
                }
                Stage::BadQuiet => {
                    while self.curr < self.end {
                        let gm: GradedMove = self.moves[self.curr];
                        self.curr += 1;
                        if gm.bit_move != self.table_move {
                            return gm.bit_move;
                        }
                    }
                    self.stage = Stage::End;
                }
                Stage::EvasionTableMove => {
                    self.stage = Stage::EvasionsGen;
                    if !self.table_move.is_null() && self.board().legal(self.table_move) {
                        return self.table_move;
                    }
                    self.table_move = BitMove::null();
                }
                Stage::EvasionsGen => {
                    self.generate::<EvasionsGenType>(0);
                    self.score(ScoreKind::Evasions);
                    self.sort_segment(Value::min_value());
                    self.stage = Stage::Evasion;
                }
                Stage::Evasion => {
                    while self.curr < self.end {
                        let gm: GradedMove = self.moves[self.curr];
                        self.curr += 1;
                        if gm.bit_move != self.table_move {
                            return gm.bit_move;
                        }
                    }
                    self.stage = Stage::End;
                }
                Stage::End => {
                    return BitMove::null();
                }
            }
        }
    }

    // Sorts the moves of the current segment whose grade exceeds the
    // threshold to its front.
    fn sort_segment(&mut self, threshold: Value) {
        let (curr, end) = (self.curr, self.end);
        let slice: &mut [GradedMove] = &mut self.moves;
        partial_insertion_sort(&mut slice[curr..end], threshold);
    }

    // Generates one category of pseudo-legal moves into the buffer, starting at
    // `offset`, and sets `curr` / `end` around the fresh segment.
    fn generate<G: remora::core::mono_traits::GenTypeTrait>(&mut self, offset: usize) {
        unsafe {
            let begin = self.moves.list_ptr().add(offset);
            let end_ptr = MoveGen::extend_from_ptr::<PseudoLegal, G, GradedMoveList>(
                self.board(),
                begin,
            );
            let new_end =
                offset + (end_ptr as usize - begin as usize) / std::mem::size_of::<GradedMove>();
            self.moves.unchecked_set_len(new_end);
            self.curr = offset;
            self.end = new_end;
        }
    }

    // Grades the moves of the current segment in place.
    fn score(&mut self, kind: ScoreKind) {
        let board: &Position = unsafe { &*self.board };
        let us = board.turn();
        let them = !us;

        let (threatened_by_pawn, threatened_by_minor, threatened_by_rook, threatened_pieces) =
            match kind {
                ScoreKind::Quiets => {
                    let by_pawn = board.attacks_by(them, PieceType::P);
                    let by_minor = board.attacks_by(them, PieceType::N)
                        | board.attacks_by(them, PieceType::B)
                        | by_pawn;
                    let by_rook = board.attacks_by(them, PieceType::R) | by_minor;

                    let threatened = (board.piece_bb(us, PieceType::Q) & by_rook)
                        | (board.piece_bb(us, PieceType::R) & by_minor)
                        | ((board.piece_bb(us, PieceType::B) | board.piece_bb(us, PieceType::N))
                            & by_pawn);
                    (by_pawn, by_minor, by_rook, threatened)
                }
                _ => (BitBoard(0), BitBoard(0), BitBoard(0), BitBoard(0)),
            };

        for idx in self.curr..self.end {
            let gm = &mut self.moves[idx];
            let m = gm.bit_move;
            let to = m.get_dest();
            let from = m.get_src();
            let to_bb = to.to_bb();
            let pt: PieceType = board.piece_at_sq(from).type_of();

            gm.score = match kind {
                ScoreKind::Captures => {
                    if m.is_en_passant() {
                        mvv_lva(PieceType::P, PieceType::P)
                    } else if m.is_promo() {
                        let captured = board.piece_at_sq(to).type_of();
                        let captured_bonus = if captured.is_real() {
                            captured.value()
                        } else {
                            0
                        };
                        mvv_lva(m.promo_piece(), PieceType::P) + captured_bonus
                    } else {
                        mvv_lva(board.piece_at_sq(to).type_of(), pt)
                    }
                }
                ScoreKind::Quiets => {
                    let killers = unsafe { &*self.killers };
                    let history = unsafe { &*self.history };
                    let butterfly = unsafe { &*self.butterfly };

                    let mut value = killers.lookup(m, self.ply)
                        + history.lookup(us, pt, to) / butterfly.lookup(us, from, to);

                    if (board.check_squares(pt) & to_bb).is_not_empty() {
                        value += 10;
                    }

                    value -= if (threatened_by_rook & to_bb).is_not_empty()
                        && pt == PieceType::Q
                    {
                        20
                    } else if (threatened_by_minor & to_bb).is_not_empty() && pt == PieceType::R {
                        10
                    } else if (threatened_by_pawn & to_bb).is_not_empty()
                        && (pt == PieceType::B || pt == PieceType::N)
                    {
                        5
                    } else {
                        0
                    };

                    value += if (threatened_pieces & from.to_bb()).is_empty() {
                        0
                    } else if pt == PieceType::Q && (threatened_by_rook & to_bb).is_empty() {
                        30
                    } else if pt == PieceType::R && (threatened_by_minor & to_bb).is_empty() {
                        15
                    } else if (pt == PieceType::B || pt == PieceType::N)
                        && (threatened_by_rook & to_bb).is_empty()
                    {
                        7
                    } else {
                        0
                    };

                    value
                }
                ScoreKind::Evasions => {
                    if board.is_capture(m) {
                        board.captured_piece(m).value() + EVASION_CAPTURE_BOOST
                    } else {
                        let killers = unsafe { &*self.killers };
                        let history = unsafe { &*self.history };
                        let butterfly = unsafe { &*self.butterfly };
                        killers.lookup(m, self.ply)
                            + history.lookup(us, pt, to) / butterfly.lookup(us, from, to)
                    }
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{ButterflyTable, HistoryTable, KillerTable};
    use remora::helper::prelude::init_statics;
    use remora::Position;
    use std::collections::HashSet;

    fn drain(pos: &Position, tt_move: BitMove) -> Vec<BitMove> {
        let killers = KillerTable::new();
        let history = HistoryTable::new();
        let butterfly = ButterflyTable::new();
        let mut orderer = MoveOrderer::new(pos, tt_move, 0, &killers, &history, &butterfly);
        let mut out = Vec::new();
        loop {
            let m = orderer.next();
            if m.is_null() {
                break;
            }
            out.push(m);
        }
        out
    }

    // Every legal move must be emitted exactly once, with no duplicates, for
    // both the quiet path and the evasion path.
    #[test]
    fn emits_every_legal_move_once() {
        init_statics();
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
            "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
        ];
        for fen in fens.iter() {
            let pos = Position::from_fen(fen).unwrap();
            let legal = pos.generate_moves();
            let tt_move = if legal.is_empty() {
                BitMove::null()
            } else {
                legal[legal.len() / 2]
            };

            let emitted = drain(&pos, tt_move);
            let mut seen: HashSet<u16> = HashSet::new();
            for m in emitted.iter() {
                assert!(seen.insert(m.get_raw()), "duplicate move {} for {}", m, fen);
            }
            for m in legal.iter() {
                assert!(
                    seen.contains(&m.get_raw()),
                    "missing legal move {} for {}",
                    m,
                    fen
                );
            }
        }
    }

    // The TT move is always offered first.
    #[test]
    fn table_move_first() {
        init_statics();
        let pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let legal = pos.generate_moves();
        let tt_move = legal[3];
        let emitted = drain(&pos, tt_move);
        assert_eq!(emitted[0], tt_move);
    }

    // In check, captures of the checking piece come before everything else.
    #[test]
    fn evasions_try_checker_captures_first() {
        init_statics();
        // The e4 rook checks; the d3 pawn can capture it.
        let pos = Position::from_fen("4k3/8/8/8/4r3/3P4/8/4K3 w - - 0 1").unwrap();
        assert!(pos.in_check());
        let emitted = drain(&pos, BitMove::null());
        assert!(!emitted.is_empty());
        let first = emitted[0];
        assert!(pos.is_capture(first));
        assert_eq!(first.get_dest().to_string(), "e4");
    }

    #[test]
    fn partial_sort_lifts_above_threshold() {
        let mut moves: Vec<GradedMove> = (0..8)
            .map(|i| {
                let mut gm = GradedMove::new(BitMove::new(i as u16 + 1));
                gm.score = [-5, 40, 3, -20, 90, 0, 7, -1][i];
                gm
            })
            .collect();
        partial_insertion_sort(&mut moves, 0);
        // Above-threshold scores appear first, in descending order.
        let front: Vec<Value> = moves[..4].iter().map(|g| g.score).collect();
        assert_eq!(front, vec![90, 40, 7, 3]);
    }
}

//! Contains the `StateInfo` structure, the per-ply snapshot of everything about
//! a position that cannot be recomputed cheaply, and the `StateStack` holding
//! one snapshot per move played.
//!
//! `StateInfo` is the only state that varies per move besides the piece
//! placement itself; un-making a move pops the current snapshot and the
//! position is back exactly where it was. The stack is a growable contiguous
//! vector, so walking backwards (e.g. for repetition detection) is plain index
//! arithmetic.

use super::castle_rights::Castling;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::piece_move::BitMove;
use crate::core::sq::{NO_SQ, SQ};
use crate::core::PieceType;

/// Holds useful information concerning the current state of the position.
///
/// This is information that is computed upon making a move, and would be
/// expensive to recompute on un-making it.
#[derive(Clone, Copy)]
pub struct StateInfo {
    /// The Zobrist key of the full position.
    pub zobrist: u64,
    /// The hash key of the current pawn configuration.
    pub pawn_key: u64,
    /// The hash key of the current knight & bishop configuration.
    pub minor_key: u64,
    /// The hash key of the current rook & queen configuration.
    pub major_key: u64,

    /// Tracks the half-moves since the last capture or pawn move.
    pub rule_50: i16,
    /// Number of plies played from the start of the game.
    pub plies_from_start: u16,
    /// How many earlier positions in the stack share this position's key.
    pub repetition: u8,

    /// The castling rights still held by either player.
    pub castling: Castling,
    /// The en-passant target square, `NO_SQ` when no en-passant capture is
    /// available.
    pub ep_square: SQ,

    /// A `BitBoard` of the pieces currently giving check.
    pub checkers_bb: BitBoard,
    /// Per piece type, the squares a piece of the side to move would give check
    /// from.
    pub check_sqs: [BitBoard; PIECE_TYPE_CNT],
    /// Per player, the pieces (of either color) that are the sole blocker of a
    /// sliding attack on that player's king.
    pub blockers: [BitBoard; PLAYER_CNT],
    /// Per player, the enemy sliders pinning one of that player's pieces to
    /// that player's king.
    pub pinners: [BitBoard; PLAYER_CNT],

    /// The move that was played to reach this state. Null for the root state.
    pub prev_move: BitMove,
    /// The piece type captured by `prev_move`, if any.
    pub captured_piece: PieceType,
}

impl StateInfo {
    /// Constructs a blank `StateInfo`, the starting point of a root state.
    pub fn blank() -> StateInfo {
        StateInfo {
            zobrist: 0,
            pawn_key: 0,
            minor_key: 0,
            major_key: 0,
            rule_50: 0,
            plies_from_start: 0,
            repetition: 0,
            castling: Castling::empty_set(),
            ep_square: NO_SQ,
            checkers_bb: BitBoard(0),
            check_sqs: [BitBoard(0); PIECE_TYPE_CNT],
            blockers: [BitBoard(0); PLAYER_CNT],
            pinners: [BitBoard(0); PLAYER_CNT],
            prev_move: BitMove::null(),
            captured_piece: PieceType::None,
        }
    }

    /// Constructs a partial copy of a `StateInfo` for the next ply.
    ///
    /// The keys, counters, castling rights and en-passant square are carried
    /// over to be incrementally modified; everything that is recomputed after
    /// a move is reset.
    pub fn partial_clone(&self) -> StateInfo {
        StateInfo {
            zobrist: self.zobrist,
            pawn_key: self.pawn_key,
            minor_key: self.minor_key,
            major_key: self.major_key,
            rule_50: self.rule_50,
            plies_from_start: self.plies_from_start,
            repetition: 0,
            castling: self.castling,
            ep_square: self.ep_square,
            checkers_bb: BitBoard(0),
            check_sqs: [BitBoard(0); PIECE_TYPE_CNT],
            blockers: [BitBoard(0); PLAYER_CNT],
            pinners: [BitBoard(0); PLAYER_CNT],
            prev_move: BitMove::null(),
            captured_piece: PieceType::None,
        }
    }

    /// Returns if the side to move of this state is in check.
    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.checkers_bb.is_not_empty()
    }
}

/// The stack of per-ply state snapshots of a position, oldest first. Always
/// contains at least the root state.
#[derive(Clone)]
pub struct StateStack {
    states: Vec<StateInfo>,
}

impl StateStack {
    /// Creates a stack holding the given root state.
    pub fn new(root: StateInfo) -> StateStack {
        let mut states = Vec::with_capacity(MAX_STATES);
        states.push(root);
        StateStack { states }
    }

    /// Returns the number of states held, equal to the number of moves played
    /// plus one.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns the current (most recent) state.
    #[inline(always)]
    pub fn top(&self) -> &StateInfo {
        debug_assert!(!self.states.is_empty());
        unsafe { self.states.get_unchecked(self.states.len() - 1) }
    }

    /// Returns the current (most recent) state, mutably.
    #[inline(always)]
    pub fn top_mut(&mut self) -> &mut StateInfo {
        debug_assert!(!self.states.is_empty());
        let idx = self.states.len() - 1;
        unsafe { self.states.get_unchecked_mut(idx) }
    }

    /// Returns the state `back` plies behind the current one, if it exists.
    #[inline(always)]
    pub fn peek_back(&self, back: usize) -> Option<&StateInfo> {
        let len = self.states.len();
        if back < len {
            Some(unsafe { self.states.get_unchecked(len - 1 - back) })
        } else {
            None
        }
    }

    /// Pushes a fully built state onto the stack.
    #[inline(always)]
    pub fn push(&mut self, st: StateInfo) {
        self.states.push(st);
    }

    /// Pops the current state.
    ///
    /// # Panics
    ///
    /// Panics if only the root state remains; the root cannot be popped.
    #[inline(always)]
    pub fn pop(&mut self) {
        assert!(self.states.len() > 1);
        self.states.pop();
    }
}

// Enough room for a long game plus a deep search without re-allocation.
const MAX_STATES: usize = 1024;

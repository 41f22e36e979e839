//! This module contains [`Position`], the object representing the current state
//! of a chessboard. All modifications to the current state of the board are done
//! through this object, as well as gathering information about the current
//! state of the board.
//!
//! The `Position` holds twelve piece bitboards (two players by six piece
//! types), two per-player occupancy bitboards, the full occupancy, a redundant
//! square-to-piece mailbox, and a stack of per-ply [`StateInfo`] snapshots.
//! Making a move mutates the bitboards in place and pushes a new snapshot;
//! un-making pops the snapshot and reverses the mutation exactly.
//!
//! [`StateInfo`]: state/struct.StateInfo.html

pub mod castle_rights;
pub mod fen;
pub mod movegen;
pub mod perft;
pub mod state;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::mono_traits::{
    AllGenType, CapturesGenType, EvasionsGenType, NonEvasionsGenType, QuietsGenType,
};
use crate::core::move_list::MoveList;
use crate::core::piece_move::{BitMove, MoveType};
use crate::core::sq::{NO_SQ, SQ};
use crate::core::*;
use crate::helper::prelude::*;

use self::castle_rights::Castling;
use self::fen::{FenBuildError, START_FEN};
use self::movegen::{Legal, MoveGen, PseudoLegal};
use self::state::{StateInfo, StateStack};

use std::fmt;

/// Represents a chessboard position and the sequence of moves that led to it.
///
/// A `Position` contains everything that needs to be known about the current
/// state of the game. It is used by both the engine and any front end driving
/// it.
///
/// Cloning a `Position` copies the full state stack, so a clone can un-make
/// and re-detect repetitions exactly like the original. This is how the thread
/// pool hands the root position to each of its workers.
#[derive(Clone)]
pub struct Position {
    turn: Player,
    bit_boards: [[BitBoard; PIECE_TYPE_CNT]; PLAYER_CNT],
    occ: [BitBoard; PLAYER_CNT],
    occ_all: BitBoard,
    squares: [Piece; SQ_CNT],
    states: StateStack,
}

impl Position {
    /// Constructs the starting position.
    ///
    /// # Panics
    ///
    /// Panics if the static lookup tables have not been initialized through
    /// `helper::prelude::init_statics`.
    pub fn start_pos() -> Position {
        Position::from_fen(START_FEN).unwrap()
    }

    /// Constructs a position from a FEN string.
    ///
    /// FEN stands for Forsyth-Edwards Notation, and is a way of representing a
    /// board through a string of characters.
    ///
    /// The FEN string is rejected at this boundary if malformed; the interior
    /// of the crate assumes well-formed positions from here on.
    pub fn from_fen(fen: &str) -> Result<Position, FenBuildError> {
        let sections: Vec<&str> = fen.split_whitespace().collect();

        // [placement, side to move, castling, en passant, half moves, full moves]
        if sections.len() != 6 {
            return Err(FenBuildError::NotEnoughSections {
                sections: sections.len(),
            });
        }

        let mut pos = Position {
            turn: Player::White,
            bit_boards: [[BitBoard(0); PIECE_TYPE_CNT]; PLAYER_CNT],
            occ: [BitBoard(0); PLAYER_CNT],
            occ_all: BitBoard(0),
            squares: [Piece::None; SQ_CNT],
            states: StateStack::new(StateInfo::blank()),
        };

        let ranks: Vec<&str> = sections[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenBuildError::IncorrectRankAmounts { ranks: ranks.len() });
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank: u8 = 7 - rank_idx as u8;
            let mut file: u8 = 0;
            for c in rank_str.chars() {
                if let Some(d) = c.to_digit(10) {
                    file += d as u8;
                } else {
                    let piece = Piece::from_char(c)
                        .ok_or(FenBuildError::UnrecognizedPiece { piece: c })?;
                    if file >= 8 {
                        return Err(FenBuildError::SquareLargerRank { rank: rank_idx });
                    }
                    let sq = SQ(rank * 8 + file);
                    pos.put_piece_c(piece, sq, piece.player_lossy());
                    file += 1;
                }
            }
            if file > 8 {
                return Err(FenBuildError::SquareLargerRank { rank: rank_idx });
            }
        }

        let turn_str = sections[1];
        pos.turn = match turn_str {
            "w" => Player::White,
            "b" => Player::Black,
            _ => {
                return Err(FenBuildError::UnrecognizedTurn {
                    turn: turn_str.to_string(),
                })
            }
        };

        let mut castling = Castling::empty_set();
        for c in sections[2].chars() {
            if !castling.add_castling_char(c) {
                return Err(FenBuildError::UnrecognizedCastling { castle: c });
            }
        }

        let ep_sq: SQ = match sections[3] {
            "-" => NO_SQ,
            s => {
                let mut chars = s.chars();
                let file_c = chars
                    .next()
                    .ok_or(FenBuildError::EPSquareUnreadable { ep: s.to_string() })?;
                let rank_c = chars
                    .next()
                    .ok_or(FenBuildError::EPSquareUnreadable { ep: s.to_string() })?;
                if chars.next().is_some() {
                    return Err(FenBuildError::EPSquareUnreadable { ep: s.to_string() });
                }
                let file = (file_c as i32) - ('a' as i32);
                let rank = (rank_c as i32) - ('1' as i32);
                if !(0..8).contains(&file) || (rank != 2 && rank != 5) {
                    return Err(FenBuildError::EPSquareInvalid { ep: s.to_string() });
                }
                SQ((rank * 8 + file) as u8)
            }
        };

        let rule_50 = sections[4].parse::<i16>()?;
        let fullmove = sections[5].parse::<u16>()?.max(1);
        let plies_from_start =
            2 * (fullmove - 1) + if pos.turn == Player::Black { 1 } else { 0 };

        {
            let st = pos.states.top_mut();
            st.castling = castling;
            st.ep_square = ep_sq;
            st.rule_50 = rule_50;
            st.plies_from_start = plies_from_start;
        }

        pos.validate()?;

        let (zob, pawn_key, minor_key, major_key) = pos.compute_keys_from_scratch();
        {
            let st = pos.states.top_mut();
            st.zobrist = zob;
            st.pawn_key = pawn_key;
            st.minor_key = minor_key;
            st.major_key = major_key;
        }

        let checkers =
            pos.attackers_to(pos.king_sq(pos.turn), pos.occupied()) & pos.get_occupied_player(!pos.turn);
        let mut st = *pos.states.top();
        st.checkers_bb = checkers;
        pos.set_check_info(&mut st);
        *pos.states.top_mut() = st;

        Ok(pos)
    }

    // Boundary sanity checks on a freshly parsed position.
    fn validate(&self) -> Result<(), FenBuildError> {
        for &player in ALL_PLAYERS.iter() {
            let name = if player == Player::White {
                "white"
            } else {
                "black"
            };
            let kings = self.piece_bb(player, PieceType::K).count_bits();
            if kings != 1 {
                return Err(FenBuildError::IncorrectKingNum { player: name, num: kings });
            }
            let pieces = self.get_occupied_player(player).count_bits();
            if pieces > 16 {
                return Err(FenBuildError::TooManyPieces { player: name, num: pieces });
            }
        }
        let pawns = self.piece_bb_both_players(PieceType::P);
        if (pawns & (BitBoard::RANK_1 | BitBoard::RANK_8)).is_not_empty() {
            return Err(FenBuildError::PawnOnLastRow);
        }
        Ok(())
    }

    /// Creates a FEN string of the position.
    pub fn fen(&self) -> String {
        let mut s = String::default();
        for rank_idx in 0..8_u8 {
            let rank = 7 - rank_idx;
            let mut blanks = 0;
            for file in 0..8_u8 {
                let piece = self.squares[(rank * 8 + file) as usize];
                if piece == Piece::None {
                    blanks += 1;
                } else {
                    if blanks != 0 {
                        s.push(std::char::from_digit(blanks, 10).unwrap());
                        blanks = 0;
                    }
                    s.push(piece.character_lossy());
                }
            }
            if blanks != 0 {
                s.push(std::char::from_digit(blanks, 10).unwrap());
            }
            if rank != 0 {
                s.push('/');
            }
        }

        s.push(' ');
        s.push(match self.turn {
            Player::White => 'w',
            Player::Black => 'b',
        });
        s.push(' ');
        s.push_str(&self.state().castling.pretty_string());
        s.push(' ');

        if self.ep_square() == NO_SQ {
            s.push('-');
        } else {
            let ep = self.ep_square();
            s.push(FILE_DISPLAYS[ep.file_idx_of_sq() as usize]);
            s.push(RANK_DISPLAYS[ep.rank_idx_of_sq() as usize]);
        }
        s.push(' ');
        s.push_str(&format!("{}", self.rule_50()));
        s.push(' ');
        s.push_str(&format!("{}", (self.state().plies_from_start / 2) + 1));
        s
    }

    /// Applies a move to the position.
    ///
    /// `gives_check` must be the result of `Position::gives_check` for this
    /// move; passing an incorrect value leaves the checking information
    /// inconsistent.
    ///
    /// # Safety
    ///
    /// The supplied move must be legal for the current position, as produced by
    /// the generator or vetted through `Position::legal`.
    pub fn make_move(&mut self, m: BitMove, gives_check: bool) {
        debug_assert!(!m.is_null());

        let us = self.turn;
        let them = !us;
        let from: SQ = m.get_src();
        let to: SQ = m.get_dest();
        let piece: Piece = self.piece_at_sq(from);

        debug_assert!(piece != Piece::None);
        debug_assert_eq!(piece.player_lossy(), us);

        let mut st: StateInfo = self.states.top().partial_clone();
        st.rule_50 += 1;
        st.plies_from_start += 1;
        st.prev_move = m;
        st.zobrist ^= z_side();

        // An en-passant chance only ever lasts a single ply.
        if st.ep_square != NO_SQ {
            st.zobrist ^= z_ep(st.ep_square);
            st.ep_square = NO_SQ;
        }

        match m.move_type() {
            MoveType::Normal => {
                let captured: Piece = self.piece_at_sq(to);
                if captured != Piece::None {
                    debug_assert_eq!(captured.player_lossy(), them);
                    debug_assert_ne!(captured.type_of(), PieceType::K);
                    self.remove_piece_c(captured, to, them);
                    xor_piece_keys(&mut st, captured, to);
                    st.captured_piece = captured.type_of();
                    st.rule_50 = 0;
                }
                self.move_piece_c(piece, from, to, us);
                xor_piece_keys(&mut st, piece, from);
                xor_piece_keys(&mut st, piece, to);

                if piece.type_of() == PieceType::P {
                    st.rule_50 = 0;
                    if to.0 ^ from.0 == 16 {
                        // A double push grants en-passant only when an enemy
                        // pawn stands ready to take it.
                        let ep_sq = SQ((to.0 + from.0) / 2);
                        if (pawn_attacks_from(ep_sq, us) & self.piece_bb(them, PieceType::P))
                            .is_not_empty()
                        {
                            st.ep_square = ep_sq;
                            st.zobrist ^= z_ep(ep_sq);
                        }
                    }
                }
            }
            MoveType::EnPassant => {
                debug_assert_eq!(piece.type_of(), PieceType::P);
                let cap_sq = SQ((to.0 as i8 - us.pawn_push()) as u8);
                let cap_pawn = Piece::make_lossy(them, PieceType::P);
                debug_assert_eq!(self.piece_at_sq(cap_sq), cap_pawn);

                self.remove_piece_c(cap_pawn, cap_sq, them);
                xor_piece_keys(&mut st, cap_pawn, cap_sq);
                self.move_piece_c(piece, from, to, us);
                xor_piece_keys(&mut st, piece, from);
                xor_piece_keys(&mut st, piece, to);
                st.captured_piece = PieceType::P;
                st.rule_50 = 0;
            }
            MoveType::Promotion => {
                debug_assert_eq!(piece.type_of(), PieceType::P);
                let captured: Piece = self.piece_at_sq(to);
                if captured != Piece::None {
                    self.remove_piece_c(captured, to, them);
                    xor_piece_keys(&mut st, captured, to);
                    st.captured_piece = captured.type_of();
                }
                let promo = Piece::make_lossy(us, m.promo_piece());
                self.remove_piece_c(piece, from, us);
                xor_piece_keys(&mut st, piece, from);
                self.put_piece_c(promo, to, us);
                xor_piece_keys(&mut st, promo, to);
                st.rule_50 = 0;
            }
            MoveType::Castle => {
                debug_assert_eq!(piece.type_of(), PieceType::K);
                let king_side: bool = to > from;
                let r_from = SQ(CASTLING_ROOK_START[us as usize]
                    [if king_side { 0 } else { 1 }]);
                let r_to = us.relative_square(if king_side { SQ::F1 } else { SQ::D1 });
                let rook = Piece::make_lossy(us, PieceType::R);

                self.move_piece_c(piece, from, to, us);
                self.move_piece_c(rook, r_from, r_to, us);
                xor_piece_keys(&mut st, piece, from);
                xor_piece_keys(&mut st, piece, to);
                xor_piece_keys(&mut st, rook, r_from);
                xor_piece_keys(&mut st, rook, r_to);
            }
        }

        // Castling rights are monotone non-increasing: any king move clears
        // both of that side's rights, a rook move from (or a capture onto) a
        // corner square clears the corresponding right.
        if !st.castling.no_castling()
            && (to.castle_rights_mask() | from.castle_rights_mask()) != 0
        {
            let removed = st.castling.update_castling(to, from);
            st.zobrist ^= z_castle(removed);
        }

        self.turn = them;

        st.checkers_bb = if gives_check {
            self.attackers_to(self.king_sq(them), self.occupied()) & self.get_occupied_player(us)
        } else {
            BitBoard(0)
        };
        self.set_check_info(&mut st);

        self.states.push(st);
        self.update_repetition();

        debug_assert_eq!(self.zobrist(), self.recompute_zobrist());
    }

    /// Un-does the previously applied move, returning the position to its
    /// state exactly one ply ago.
    ///
    /// # Panics
    ///
    /// Panics if no move has been applied since the position was created.
    pub fn unmake_move(&mut self) {
        let m: BitMove = self.states.top().prev_move;
        assert!(!m.is_null());
        let captured: PieceType = self.states.top().captured_piece;

        self.turn = !self.turn;
        let us = self.turn;
        let them = !us;
        let from: SQ = m.get_src();
        let to: SQ = m.get_dest();

        match m.move_type() {
            MoveType::Normal => {
                let piece = self.piece_at_sq(to);
                self.move_piece_c(piece, to, from, us);
                if captured != PieceType::None {
                    self.put_piece_c(Piece::make_lossy(them, captured), to, them);
                }
            }
            MoveType::EnPassant => {
                let pawn = Piece::make_lossy(us, PieceType::P);
                let cap_sq = SQ((to.0 as i8 - us.pawn_push()) as u8);
                self.move_piece_c(pawn, to, from, us);
                self.put_piece_c(Piece::make_lossy(them, PieceType::P), cap_sq, them);
            }
            MoveType::Promotion => {
                let promo = self.piece_at_sq(to);
                debug_assert_eq!(promo.type_of(), m.promo_piece());
                self.remove_piece_c(promo, to, us);
                self.put_piece_c(Piece::make_lossy(us, PieceType::P), from, us);
                if captured != PieceType::None {
                    self.put_piece_c(Piece::make_lossy(them, captured), to, them);
                }
            }
            MoveType::Castle => {
                let king_side: bool = to > from;
                let r_from = SQ(CASTLING_ROOK_START[us as usize]
                    [if king_side { 0 } else { 1 }]);
                let r_to = us.relative_square(if king_side { SQ::F1 } else { SQ::D1 });
                let king = Piece::make_lossy(us, PieceType::K);
                let rook = Piece::make_lossy(us, PieceType::R);
                self.move_piece_c(king, to, from, us);
                self.move_piece_c(rook, r_to, r_from, us);
            }
        }
        self.states.pop();
    }

    /// Walks backward through the state stack in strides of two plies, bounded
    /// by the fifty-move counter, and stores the repetition count of the
    /// current position. Returns whether the position is a repetition.
    pub fn update_repetition(&mut self) -> bool {
        let key = self.states.top().zobrist;
        let end = self.states.top().rule_50 as usize;
        let mut repetition: u8 = 0;

        let mut back: usize = 2;
        while back <= end {
            match self.states.peek_back(back) {
                Some(prev) => {
                    if prev.zobrist == key {
                        repetition = prev.repetition + 1;
                        break;
                    }
                }
                None => break,
            }
            back += 2;
        }
        self.states.top_mut().repetition = repetition;
        repetition != 0
    }

    /// Returns if the position is drawn, either by the fifty-move rule or by
    /// returning to an earlier position.
    #[inline]
    pub fn is_draw(&self) -> bool {
        let st = self.state();
        st.rule_50 >= 100 || st.repetition != 0
    }

    //  ------- MOVE TESTING  -------

    /// Tests if a given move is legal. This covers the cases that pseudo-legal
    /// generation cannot cheaply exclude: castling through attacked squares,
    /// en-passant discoveries, king moves into attacks, and moving pinned
    /// pieces off their pin ray. Moves read back from the transposition table
    /// must pass through here before being applied.
    pub fn legal(&self, m: BitMove) -> bool {
        if m.is_null() {
            return false;
        }
        let us = self.turn;
        let them = !us;
        let from: SQ = m.get_src();
        let to: SQ = m.get_dest();
        let piece = self.piece_at_sq(from);

        if piece == Piece::None || piece.player_lossy() != us {
            return false;
        }

        match m.move_type() {
            MoveType::Castle => {
                if piece.type_of() != PieceType::K {
                    return false;
                }
                let king_side = to > from;
                let ct = if king_side {
                    CastleType::KingSide
                } else {
                    CastleType::QueenSide
                };
                self.can_castle(us, ct)
                    && !self.castle_impeded(ct)
                    && !self.castling_attacked(ct)
            }
            MoveType::EnPassant => {
                if to != self.ep_square() {
                    return false;
                }
                let ksq = self.king_sq(us);
                let cap_sq = SQ((to.0 as i8 - us.pawn_push()) as u8);
                let occupied =
                    (self.occupied() ^ from.to_bb() ^ cap_sq.to_bb()) | to.to_bb();

                (rook_moves(occupied, ksq) & self.sliding_piece_bb(them)).is_empty()
                    && (bishop_moves(occupied, ksq) & self.diagonal_piece_bb(them)).is_empty()
            }
            _ => {
                if (self.get_occupied_player(us) & to.to_bb()).is_not_empty() {
                    return false;
                }
                if piece.type_of() == PieceType::K {
                    return (self.attackers_to(to, self.occupied() ^ from.to_bb())
                        & self.get_occupied_player(them))
                    .is_empty();
                }
                // Not pinned, or moving along the ray between king and pinner.
                (self.state().blockers[us as usize] & from.to_bb()).is_empty()
                    || (ray_bb(self.king_sq(us), from) & to.to_bb()).is_not_empty()
            }
        }
    }

    /// Returns if a move gives check to the opposing player's king.
    ///
    /// # Safety
    ///
    /// Assumes the move is legal for the current position.
    pub fn gives_check(&self, m: BitMove) -> bool {
        let us = self.turn;
        let them = !us;
        let from: SQ = m.get_src();
        let to: SQ = m.get_dest();
        let from_bb = from.to_bb();
        let to_bb = to.to_bb();
        let piece = self.piece_at_sq(from);
        let pt = piece.type_of();
        let opp_ksq: SQ = self.king_sq(them);

        debug_assert_ne!(from, to);
        debug_assert_eq!(piece.player_lossy(), us);

        // Direct checks from the pre-computed check squares.
        if (self.check_squares(pt) & to_bb).is_not_empty() {
            return true;
        }

        // Discovered checks: the moving piece is blocking a sniper aimed at the
        // enemy king, and leaves the king-ray.
        if (self.state().blockers[them as usize] & self.get_occupied_player(us) & from_bb)
            .is_not_empty()
            && ((ray_bb(opp_ksq, from) & to_bb).is_empty() || m.is_castle())
        {
            return true;
        }

        match m.move_type() {
            MoveType::Normal => false,
            MoveType::Promotion => {
                let occ = self.occupied() ^ from_bb;
                let attacks_bb = match m.promo_piece() {
                    PieceType::N => knight_moves(to),
                    PieceType::B => bishop_moves(occ, to),
                    PieceType::R => rook_moves(occ, to),
                    _ => queen_moves(occ, to),
                };
                (attacks_bb & opp_ksq.to_bb()).is_not_empty()
            }
            MoveType::EnPassant => {
                // The dual removal can open a slider onto the enemy king.
                let cap_sq: SQ = SQ::make(to.file(), from.rank());
                let occ: BitBoard = (self.occupied() ^ from_bb ^ cap_sq.to_bb()) | to_bb;

                ((rook_moves(occ, opp_ksq) & self.sliding_piece_bb(us))
                    | (bishop_moves(occ, opp_ksq) & self.diagonal_piece_bb(us)))
                .is_not_empty()
            }
            MoveType::Castle => {
                let king_side = to > from;
                let r_to = us.relative_square(if king_side { SQ::F1 } else { SQ::D1 });
                (self.check_squares(PieceType::R) & r_to.to_bb()).is_not_empty()
            }
        }
    }

    /// Returns if the given move captures an opposing piece, including
    /// en-passant.
    #[inline]
    pub fn is_capture(&self, m: BitMove) -> bool {
        m.is_en_passant()
            || (!m.is_castle() && self.piece_at_sq(m.get_dest()) != Piece::None)
    }

    /// Returns the piece type that was moved by a given move.
    ///
    /// # Safety
    ///
    /// Assumes the move is legal for the current position.
    #[inline]
    pub fn moved_piece(&self, m: BitMove) -> PieceType {
        self.piece_at_sq(m.get_src()).type_of()
    }

    /// Returns the piece type that a given move captures, if any.
    #[inline]
    pub fn captured_piece(&self, m: BitMove) -> PieceType {
        if m.is_en_passant() {
            return PieceType::P;
        }
        if m.is_castle() {
            return PieceType::None;
        }
        self.piece_at_sq(m.get_dest()).type_of()
    }

    //  ------- MOVE GENERATION  -------

    /// Gets a list of legal moves for the player whose turn it is to move,
    /// taking into account whether the board is currently in check.
    pub fn generate_moves(&self) -> MoveList {
        MoveGen::generate::<Legal, AllGenType>(self)
    }

    /// Gets a list of all pseudo-legal moves for the player whose turn it is to
    /// move. Works exactly the same as `Position::generate_moves()`, except
    /// the moves need to be vetted with `Position::legal` before application.
    pub fn generate_pseudolegal_moves(&self) -> MoveList {
        MoveGen::generate::<PseudoLegal, AllGenType>(self)
    }

    /// Gets a list of legal moves of a certain category.
    ///
    /// # Safety
    ///
    /// `Captures`, `Quiets` and `NonEvasions` may only be requested when the
    /// board is not in check, and `Evasions` only when it is.
    pub fn generate_moves_of_type(&self, gen_type: GenTypes) -> MoveList {
        match gen_type {
            GenTypes::All => MoveGen::generate::<Legal, AllGenType>(self),
            GenTypes::Captures => MoveGen::generate::<Legal, CapturesGenType>(self),
            GenTypes::Quiets => MoveGen::generate::<Legal, QuietsGenType>(self),
            GenTypes::Evasions => MoveGen::generate::<Legal, EvasionsGenType>(self),
            GenTypes::NonEvasions => MoveGen::generate::<Legal, NonEvasionsGenType>(self),
        }
    }

    /// Resolves a long-algebraic move string (e.g. "e2e4", "a7a8q", "e1g1")
    /// against the legal moves of this position.
    pub fn move_from_str(&self, mv_str: &str) -> Option<BitMove> {
        self.generate_moves()
            .iter()
            .find(|m| m.stringify() == mv_str)
            .cloned()
    }

    //  ------- PRIVATE MUTATING FUNCTIONS -------

    /// Places a piece on the board at a given square for the given player.
    ///
    /// # Safety
    ///
    /// Assumes there is not already a piece at that square.
    fn put_piece_c(&mut self, piece: Piece, square: SQ, player: Player) {
        debug_assert_eq!(self.squares[square.0 as usize], Piece::None);
        let bb = square.to_bb();
        self.occ_all |= bb;
        self.occ[player as usize] |= bb;
        self.bit_boards[player as usize][piece.type_of() as usize] |= bb;
        self.squares[square.0 as usize] = piece;
    }

    /// Removes a piece from the board for a given player.
    fn remove_piece_c(&mut self, piece: Piece, square: SQ, player: Player) {
        debug_assert_eq!(self.piece_at_sq(square), piece);
        let bb = square.to_bb();
        self.occ_all ^= bb;
        self.occ[player as usize] ^= bb;
        self.bit_boards[player as usize][piece.type_of() as usize] ^= bb;
        self.squares[square.0 as usize] = Piece::None;
    }

    /// Moves a piece on the board from square 'from' to square 'to'.
    fn move_piece_c(&mut self, piece: Piece, from: SQ, to: SQ, player: Player) {
        debug_assert_ne!(from, to);
        let comb_bb: BitBoard = from.to_bb() | to.to_bb();
        self.occ_all ^= comb_bb;
        self.occ[player as usize] ^= comb_bb;
        self.bit_boards[player as usize][piece.type_of() as usize] ^= comb_bb;
        self.squares[from.0 as usize] = Piece::None;
        self.squares[to.0 as usize] = piece;
    }

    /// Computes the blockers, pinners and check squares of a state. Called
    /// after a move has been applied and the turn flipped.
    fn set_check_info(&self, st: &mut StateInfo) {
        let mut white_pinners = BitBoard(0);
        st.blockers[Player::White as usize] = self.slider_blockers(
            self.get_occupied_player(Player::Black),
            self.king_sq(Player::White),
            &mut white_pinners,
        );
        st.pinners[Player::White as usize] = white_pinners;

        let mut black_pinners = BitBoard(0);
        st.blockers[Player::Black as usize] = self.slider_blockers(
            self.get_occupied_player(Player::White),
            self.king_sq(Player::Black),
            &mut black_pinners,
        );
        st.pinners[Player::Black as usize] = black_pinners;

        // Squares from which a piece of the side to move would check the
        // opposing king.
        let ksq: SQ = self.king_sq(!self.turn);
        let occupied = self.occupied();

        st.check_sqs[PieceType::P as usize] = pawn_attacks_from(ksq, !self.turn);
        st.check_sqs[PieceType::N as usize] = knight_moves(ksq);
        st.check_sqs[PieceType::B as usize] = bishop_moves(occupied, ksq);
        st.check_sqs[PieceType::R as usize] = rook_moves(occupied, ksq);
        st.check_sqs[PieceType::Q as usize] =
            st.check_sqs[PieceType::B as usize] | st.check_sqs[PieceType::R as usize];
        st.check_sqs[PieceType::K as usize] = BitBoard(0);
    }

    /// Returns the pieces that stand alone between the given sliders and the
    /// square `s`, alongside the sliders that pin a piece of the same color as
    /// the piece on `s`.
    fn slider_blockers(&self, sliders: BitBoard, s: SQ, pinners: &mut BitBoard) -> BitBoard {
        let mut result: BitBoard = BitBoard(0);
        *pinners = BitBoard(0);
        let occupied: BitBoard = self.occupied();

        let mut snipers: BitBoard = sliders
            & ((rook_moves(BitBoard(0), s)
                & self.piece_two_bb_both_players(PieceType::R, PieceType::Q))
                | (bishop_moves(BitBoard(0), s)
                    & self.piece_two_bb_both_players(PieceType::B, PieceType::Q)));

        while let Some(sniper_sq) = snipers.pop_some_lsb() {
            let b: BitBoard = between_bb(s, sniper_sq) & occupied;
            if b.is_not_empty() && !b.more_than_one() {
                result |= b;
                let king_color_occ =
                    self.get_occupied_player(self.piece_at_sq(s).player_lossy());
                if (b & king_color_occ).is_not_empty() {
                    *pinners |= sniper_sq.to_bb();
                }
            }
        }
        result
    }

    // Recomputes all four hash keys from the piece placement and state. Used at
    // construction, and by debug assertions comparing against the
    // incrementally maintained keys.
    fn compute_keys_from_scratch(&self) -> (u64, u64, u64, u64) {
        let mut zob: u64 = 0;
        let mut pawn_key: u64 = 0;
        let mut minor_key: u64 = 0;
        let mut major_key: u64 = 0;

        let mut occ = self.occupied();
        while let Some(sq) = occ.pop_some_lsb() {
            let piece = self.piece_at_sq(sq);
            let key = z_square(sq, piece);
            zob ^= key;
            match piece.type_of() {
                PieceType::P => pawn_key ^= key,
                PieceType::N | PieceType::B => minor_key ^= key,
                PieceType::R | PieceType::Q => major_key ^= key,
                _ => {}
            }
        }

        let ep = self.state().ep_square;
        if ep != NO_SQ {
            zob ^= z_ep(ep);
        }
        if self.turn == Player::Black {
            zob ^= z_side();
        }
        zob ^= z_castle(self.state().castling.bits());

        (zob, pawn_key, minor_key, major_key)
    }

    /// Recomputes the Zobrist key of the position from scratch.
    pub fn recompute_zobrist(&self) -> u64 {
        self.compute_keys_from_scratch().0
    }

    /// Recomputes the secondary structural key of the position from scratch.
    pub fn recompute_secondary(&self) -> u16 {
        let (_, pawn, minor, major) = self.compute_keys_from_scratch();
        ((pawn ^ minor ^ major) >> 48) as u16
    }
}

// Fold the key of one piece on one square into the affected hashes of a state.
#[inline]
fn xor_piece_keys(st: &mut StateInfo, piece: Piece, sq: SQ) {
    let key = z_square(sq, piece);
    st.zobrist ^= key;
    match piece.type_of() {
        PieceType::P => st.pawn_key ^= key,
        PieceType::N | PieceType::B => st.minor_key ^= key,
        PieceType::R | PieceType::Q => st.major_key ^= key,
        _ => {}
    }
}

// General information
impl Position {
    /// Get the player whose turn it is to move.
    #[inline(always)]
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Returns the current state of the position.
    #[inline(always)]
    pub fn state(&self) -> &StateInfo {
        self.states.top()
    }

    /// Return the Zobrist key of the position.
    #[inline(always)]
    pub fn zobrist(&self) -> u64 {
        self.state().zobrist
    }

    /// Return the pawn-structure key of the position.
    #[inline(always)]
    pub fn pawn_key(&self) -> u64 {
        self.state().pawn_key
    }

    /// Return the knight & bishop structural key of the position.
    #[inline(always)]
    pub fn minor_key(&self) -> u64 {
        self.state().minor_key
    }

    /// Return the rook & queen structural key of the position.
    #[inline(always)]
    pub fn major_key(&self) -> u64 {
        self.state().major_key
    }

    /// Returns the 16-bit secondary key used to tag transposition entries: a
    /// fold of the three structural keys.
    #[inline(always)]
    pub fn secondary_key(&self) -> u16 {
        let st = self.state();
        ((st.pawn_key ^ st.minor_key ^ st.major_key) >> 48) as u16
    }

    /// Get the number of half-moves since the last capture or pawn move.
    #[inline(always)]
    pub fn rule_50(&self) -> i16 {
        self.state().rule_50
    }

    /// Get the number of plies played from the starting position.
    #[inline(always)]
    pub fn ply(&self) -> u16 {
        self.state().plies_from_start
    }

    /// Get the current square of en-passant, `NO_SQ` if unavailable.
    #[inline(always)]
    pub fn ep_square(&self) -> SQ {
        self.state().ep_square
    }

    /// Gets the `BitBoard` of all pieces.
    #[inline(always)]
    pub fn occupied(&self) -> BitBoard {
        self.occ_all
    }

    /// Get the `BitBoard` of the squares occupied by the given player.
    #[inline(always)]
    pub fn get_occupied_player(&self, player: Player) -> BitBoard {
        self.occ[player as usize]
    }

    /// Returns the `BitBoard` of a single player and piece type.
    #[inline(always)]
    pub fn piece_bb(&self, player: Player, piece: PieceType) -> BitBoard {
        debug_assert!(piece.is_real());
        self.bit_boards[player as usize][piece as usize]
    }

    /// Returns the combined `BitBoard` of both players for a given piece type.
    #[inline(always)]
    pub fn piece_bb_both_players(&self, piece: PieceType) -> BitBoard {
        self.piece_bb(Player::White, piece) | self.piece_bb(Player::Black, piece)
    }

    /// Returns the combined `BitBoard` of both players for two piece types.
    #[inline]
    pub fn piece_two_bb_both_players(&self, piece: PieceType, piece2: PieceType) -> BitBoard {
        self.piece_bb_both_players(piece) | self.piece_bb_both_players(piece2)
    }

    /// Returns the `BitBoard` of the rooks and queens of a given player.
    #[inline]
    pub fn sliding_piece_bb(&self, player: Player) -> BitBoard {
        self.piece_bb(player, PieceType::R) | self.piece_bb(player, PieceType::Q)
    }

    /// Returns the `BitBoard` of the bishops and queens of a given player.
    #[inline]
    pub fn diagonal_piece_bb(&self, player: Player) -> BitBoard {
        self.piece_bb(player, PieceType::B) | self.piece_bb(player, PieceType::Q)
    }

    /// Returns the piece, if any, at the given square.
    ///
    /// # Panics
    ///
    /// Panics if the square is not a legal square.
    #[inline]
    pub fn piece_at_sq(&self, sq: SQ) -> Piece {
        assert!(sq.is_okay());
        self.squares[sq.0 as usize]
    }

    /// Returns the square of the king of a given player.
    #[inline(always)]
    pub fn king_sq(&self, player: Player) -> SQ {
        self.piece_bb(player, PieceType::K).to_sq()
    }

    /// Returns the pinned pieces of the given player, pinned to their own king.
    #[inline(always)]
    pub fn pinned_pieces(&self, player: Player) -> BitBoard {
        self.state().blockers[player as usize] & self.get_occupied_player(player)
    }

    /// Return if the player has the given castling right remaining. This does
    /// not ensure the castle itself is currently playable.
    #[inline(always)]
    pub fn can_castle(&self, player: Player, castle_type: CastleType) -> bool {
        self.state().castling.castle_rights(player, castle_type)
    }

    /// Check if the castle path is impeded for the current player.
    #[inline]
    pub fn castle_impeded(&self, castle_type: CastleType) -> bool {
        let path = BitBoard(CASTLING_PATH[self.turn as usize][castle_type as usize]);
        (path & self.occ_all).is_not_empty()
    }

    /// Square of the rook that would castle with the current player for the
    /// given castle type.
    #[inline]
    pub fn castling_rook_square(&self, castle_type: CastleType) -> SQ {
        SQ(CASTLING_ROOK_START[self.turn as usize][castle_type as usize])
    }

    // True if any square the king traverses while castling, including its
    // origin and destination, is attacked by the opponent.
    fn castling_attacked(&self, castle_type: CastleType) -> bool {
        let us = self.turn;
        let them = !us;
        let ksq = self.king_sq(us);
        let k_to = us.relative_square(match castle_type {
            CastleType::KingSide => SQ::G1,
            CastleType::QueenSide => SQ::C1,
        });
        let lo = ksq.0.min(k_to.0);
        let hi = ksq.0.max(k_to.0);
        for s in lo..=hi {
            if (self.attackers_to(SQ(s), self.occupied()) & self.get_occupied_player(them))
                .is_not_empty()
            {
                return true;
            }
        }
        false
    }

    /// Return the last move played, if any.
    #[inline(always)]
    pub fn last_move(&self) -> Option<BitMove> {
        let prev = self.state().prev_move;
        if prev.is_null() {
            None
        } else {
            Some(prev)
        }
    }

    //  ------- CHECKING  -------

    /// Returns if the current side to move is in check.
    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.state().in_check()
    }

    /// Return the `BitBoard` of all pieces checking the current player's king.
    #[inline(always)]
    pub fn checkers(&self) -> BitBoard {
        self.state().checkers_bb
    }

    /// Returns the squares from which a piece of the given type, for the side
    /// to move, would give check.
    #[inline(always)]
    pub fn check_squares(&self, piece: PieceType) -> BitBoard {
        self.state().check_sqs[piece as usize]
    }

    /// Returns a `BitBoard` of the pieces (from both players) that attack or
    /// defend the given square with the given occupancy.
    pub fn attackers_to(&self, sq: SQ, occupied: BitBoard) -> BitBoard {
        (pawn_attacks_from(sq, Player::Black) & self.piece_bb(Player::White, PieceType::P))
            | (pawn_attacks_from(sq, Player::White) & self.piece_bb(Player::Black, PieceType::P))
            | (knight_moves(sq) & self.piece_bb_both_players(PieceType::N))
            | (rook_moves(occupied, sq)
                & (self.sliding_piece_bb(Player::White) | self.sliding_piece_bb(Player::Black)))
            | (bishop_moves(occupied, sq)
                & (self.diagonal_piece_bb(Player::White) | self.diagonal_piece_bb(Player::Black)))
            | (king_moves(sq) & self.piece_bb_both_players(PieceType::K))
    }

    /// Returns the union of the squares attacked by all pieces of the given
    /// type belonging to the given player.
    pub fn attacks_by(&self, player: Player, piece: PieceType) -> BitBoard {
        let occupied = self.occupied();
        let mut attacks = BitBoard(0);
        let mut pieces = self.piece_bb(player, piece);
        while let Some(sq) = pieces.pop_some_lsb() {
            attacks |= match piece {
                PieceType::P => pawn_attacks_from(sq, player),
                PieceType::N => knight_moves(sq),
                PieceType::B => bishop_moves(occupied, sq),
                PieceType::R => rook_moves(occupied, sq),
                PieceType::Q => queen_moves(occupied, sq),
                PieceType::K => king_moves(sq),
                _ => BitBoard(0),
            };
        }
        attacks
    }

    /// Counts the attacks of a player's pieces into a zone, with multiplicity:
    /// a square attacked by two pieces counts twice.
    pub fn count_attacks(&self, player: Player, zone: BitBoard) -> i32 {
        let occupied = self.occupied();
        let mut count: i32 = 0;
        let mut pieces = self.get_occupied_player(player);
        while let Some(sq) = pieces.pop_some_lsb() {
            let attacks = match self.piece_at_sq(sq).type_of() {
                PieceType::P => pawn_attacks_from(sq, player),
                PieceType::N => knight_moves(sq),
                PieceType::B => bishop_moves(occupied, sq),
                PieceType::R => rook_moves(occupied, sq),
                PieceType::Q => queen_moves(occupied, sq),
                PieceType::K => king_moves(sq),
                _ => BitBoard(0),
            };
            count += i32::from((attacks & zone).count_bits());
        }
        count
    }

    /// Returns a prettified String of the current position, for command line
    /// displaying.
    ///
    /// Capital letters represent white pieces, while lower case represents
    /// black pieces.
    pub fn pretty_string(&self) -> String {
        let mut s = String::with_capacity(SQ_CNT * 2 + 8);
        for sq in SQ_DISPLAY_ORDER.iter() {
            let piece = self.squares[*sq as usize];
            let c = if piece == Piece::None {
                '-'
            } else {
                piece.character_lossy()
            };
            s.push(c);
            s.push(' ');
            if sq % 8 == 7 {
                s.push('\n');
            }
        }
        s
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::prelude::init_statics;

    #[test]
    fn start_pos_basics() {
        init_statics();
        let pos = Position::start_pos();
        assert_eq!(pos.turn(), Player::White);
        assert_eq!(pos.occupied().count_bits(), 32);
        assert_eq!(pos.fen(), START_FEN);
        assert!(!pos.in_check());
        assert_eq!(pos.king_sq(Player::White), SQ::E1);
        assert_eq!(pos.king_sq(Player::Black), SQ::E8);
    }

    #[test]
    fn fen_rejects_malformed() {
        init_statics();
        assert!(Position::from_fen("not a fen").is_err());
        assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
        // Two white kings.
        assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/4K3/PPPPPPPP/RNBQKBNR w - - 0 1").is_err());
    }

    #[test]
    fn make_unmake_identity() {
        init_statics();
        let mut pos = Position::start_pos();
        let fen_before = pos.fen();
        let zob_before = pos.zobrist();
        let pawn_before = pos.pawn_key();

        let moves = pos.generate_moves();
        for m in moves.iter() {
            let gives_check = pos.gives_check(*m);
            pos.make_move(*m, gives_check);
            pos.unmake_move();
            assert_eq!(pos.fen(), fen_before);
            assert_eq!(pos.zobrist(), zob_before);
            assert_eq!(pos.pawn_key(), pawn_before);
        }
    }

    #[test]
    fn ep_hash_is_transient() {
        init_statics();
        let mut pos = Position::start_pos();
        let m = pos.move_from_str("e2e4").unwrap();
        pos.make_move(m, false);
        // Black can take e.p. only if a pawn is adjacent; at the start none is.
        assert_eq!(pos.ep_square(), NO_SQ);

        let mut pos = Position::from_fen(
            "rnbqkbnr/ppp1pppp/8/8/3p4/8/PPPPPPPP/RNBQKBNR w KQkq - 0 3",
        )
        .unwrap();
        let m = pos.move_from_str("e2e4").unwrap();
        pos.make_move(m, false);
        assert_eq!(pos.ep_square(), SQ::E3);
        assert_eq!(pos.zobrist(), pos.recompute_zobrist());

        let reply = pos.move_from_str("d4e3").unwrap();
        assert!(reply.is_en_passant());
        pos.make_move(reply, false);
        assert_eq!(pos.ep_square(), NO_SQ);
        assert_eq!(pos.zobrist(), pos.recompute_zobrist());
    }

    #[test]
    fn checkers_iff_in_check() {
        init_statics();
        let pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(pos.in_check());
        assert_eq!(pos.checkers().count_bits(), 1);
        assert_eq!(pos.checkers().to_sq(), SQ::H4);
    }

    #[test]
    fn threefold_shuffle_draw() {
        init_statics();
        let mut pos = Position::start_pos();
        for mv in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6"].iter() {
            assert!(!pos.is_draw());
            let m = pos.move_from_str(mv).unwrap();
            let gc = pos.gives_check(m);
            pos.make_move(m, gc);
        }
        assert!(pos.is_draw());
    }

    #[test]
    fn pinned_piece_moves_stay_on_ray() {
        init_statics();
        // White bishop on d2 is pinned diagonally by the b4 bishop.
        let pos = Position::from_fen(
            "rnbqk1nr/pppp1ppp/8/4p3/1b6/3P4/PPPBPPPP/RN1QKBNR w KQkq - 2 3",
        )
        .unwrap();
        let pinned = pos.pinned_pieces(Player::White);
        assert!((pinned & SQ::D2.to_bb()).is_not_empty());

        // Staying on the b4-e1 diagonal is legal, leaving it is not.
        assert!(pos.legal(BitMove::make_normal(SQ::D2, SQ::C3)));
        assert!(!pos.legal(BitMove::make_normal(SQ::D2, SQ::E3)));
    }
}

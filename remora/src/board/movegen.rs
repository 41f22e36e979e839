//! Module for generating moves from a `Position`. Allows for generating legal
//! and pseudo-legal moves of various categories.
//!
//! # Generation categories
//!
//! The categories of moves that can be generated are `Captures`, `Quiets`,
//! `Evasions`, `NonEvasions` and `All`. `Captures`, `Quiets` and `NonEvasions`
//! may only be generated when the board is not in check, `Evasions` only when
//! it is, while `All` picks the right one itself.
//!
//! Promotions are spread over the categories so that `Captures` and `Quiets`
//! partition `NonEvasions`: the queen promotion accompanies every
//! capture-bearing category, while the three under-promotions appear with
//! captures onto enemy pieces, with quiet pushes to the last rank, and on all
//! evasion / non-evasion paths.
//!
//! # `Legal` vs. `PseudoLegal` moves
//!
//! Pseudo-legal moves are "likely" legal, but may leave the king hanging:
//! moves of pinned pieces, king moves and en-passant captures need the full
//! `Position::legal` test. Legal generation runs that test while emitting, so
//! the resulting list can be applied directly.

use std::mem;
use std::ptr;

use crate::core::bitboard::BitBoard;
use crate::core::mono_traits::*;
use crate::core::move_list::{MVPushable, MoveList};
use crate::core::piece_move::BitMove;
use crate::core::sq::{NO_SQ, SQ};
use crate::core::{CastleType, GenTypes, PieceType, Player};
use crate::helper::prelude::*;

use super::Position;

/// Determines if the moves generated are `PseudoLegal` or `Legal` moves.
/// PseudoLegal moves require that a move's legality is determined before
/// applying to a `Position`.
pub trait Legality {
    /// Returns if only legal moves should be generated.
    fn gen_legal() -> bool;
}

/// Dummy struct to represent the generation of `Legal` moves.
pub struct Legal {}

/// Dummy struct to represent the generation of `PseudoLegal` moves.
pub struct PseudoLegal {}

impl Legality for Legal {
    #[inline(always)]
    fn gen_legal() -> bool {
        true
    }
}

impl Legality for PseudoLegal {
    #[inline(always)]
    fn gen_legal() -> bool {
        false
    }
}

/// Public move generator.
///
/// This is a wrapper around `InnerMoveGen`, allowing for a more friendly API.
pub struct MoveGen {}

impl MoveGen {
    /// Returns a `MoveList` of all moves for a given position, legality and
    /// generation category.
    #[inline]
    pub fn generate<L: Legality, G: GenTypeTrait>(position: &Position) -> MoveList {
        let mut movelist = MoveList::default();
        unsafe {
            let ptr: *mut BitMove = movelist.list_ptr();
            let new_ptr = InnerMoveGen::<MoveList>::generate::<L, G>(position, ptr);
            let new_size = (new_ptr as usize - ptr as usize) / mem::size_of::<BitMove>();
            movelist.unchecked_set_len(new_size);
        }
        movelist
    }

    /// Extends a list of moves of a certain legality and generation category.
    /// Takes in a pointer to the next available (empty) index, and returns the
    /// pointer to the next open index after generating the moves.
    ///
    /// # Safety
    ///
    /// Extremely unsafe to use, as there is a possibility of both overwriting
    /// valid memory and otherwise passing in an invalid pointer.
    ///
    /// This does not update the length of the list written into. Use
    /// `MVPushable::unchecked_set_len` to set the size manually afterwards.
    #[inline(always)]
    pub unsafe fn extend_from_ptr<L: Legality, G: GenTypeTrait, MP: MVPushable>(
        position: &Position,
        ptr: *mut MP::Output,
    ) -> *mut MP::Output
    where
        <MP as std::ops::Index<usize>>::Output: Sized,
    {
        InnerMoveGen::<MP>::generate::<L, G>(position, ptr)
    }
}

/// Structure to generate moves from. Stores the current state of the board, and
/// other references to help generating all possible moves.
struct InnerMoveGen<'a, MP: MVPushable + 'a>
where
    <MP as std::ops::Index<usize>>::Output: Sized,
{
    ptr: *mut MP::Output,
    board: &'a Position,
    /// Squares occupied by anyone.
    occ: BitBoard,
    /// Squares occupied by the player to move.
    us_occ: BitBoard,
    /// Squares occupied by the opposing player.
    them_occ: BitBoard,
}

impl<'a, MP: MVPushable> InnerMoveGen<'a, MP>
where
    <MP as std::ops::Index<usize>>::Output: Sized,
{
    /// Returns a pointer past the last element of all moves generated for a
    /// given position, legality and category.
    #[inline(always)]
    fn generate<L: Legality, G: GenTypeTrait>(
        position: &Position,
        movelist: *mut MP::Output,
    ) -> *mut MP::Output {
        match position.turn() {
            Player::White => {
                InnerMoveGen::<MP>::generate_helper::<L, G, WhiteType>(position, movelist)
            }
            Player::Black => {
                InnerMoveGen::<MP>::generate_helper::<L, G, BlackType>(position, movelist)
            }
        }
    }

    #[inline(always)]
    fn get_self(position: &'a Position, ptr: *mut MP::Output) -> Self {
        InnerMoveGen {
            ptr,
            board: position,
            occ: position.occupied(),
            us_occ: position.get_occupied_player(position.turn()),
            them_occ: position.get_occupied_player(!position.turn()),
        }
    }

    fn generate_helper<L: Legality, G: GenTypeTrait, P: PlayerTrait>(
        position: &Position,
        ptr: *mut MP::Output,
    ) -> *mut MP::Output {
        let mut movegen = InnerMoveGen::<MP>::get_self(position, ptr);
        let gen_type = G::gen_type();

        if gen_type == GenTypes::Evasions {
            movegen.generate_evasions::<L, P>();
        } else if gen_type == GenTypes::All {
            if movegen.board.in_check() {
                movegen.generate_evasions::<L, P>();
            } else {
                let target = !movegen.us_occ;
                movegen.generate_all::<L, NonEvasionsGenType, P>(target);
            }
        } else {
            debug_assert!(!movegen.board.in_check());
            let target: BitBoard = match gen_type {
                GenTypes::NonEvasions => !movegen.us_occ,
                GenTypes::Captures => movegen.them_occ,
                GenTypes::Quiets => !(movegen.us_occ | movegen.them_occ),
                _ => unreachable!(),
            };
            movegen.generate_all::<L, G, P>(target);
        }
        movegen.ptr
    }

    /// Generates all moves of a certain legality, category and player. The
    /// target is the bitboard of squares moves may land on.
    fn generate_all<L: Legality, G: GenTypeTrait, P: PlayerTrait>(&mut self, target: BitBoard) {
        self.generate_pawn_moves::<L, G, P>(target);
        self.moves_per_piece::<L, P, KnightType>(target);
        self.moves_per_piece::<L, P, BishopType>(target);
        self.moves_per_piece::<L, P, RookType>(target);
        self.moves_per_piece::<L, P, QueenType>(target);
        self.moves_per_piece::<L, P, KingType>(target);

        if G::gen_type() != GenTypes::Captures
            && (self.board.can_castle(P::player(), CastleType::KingSide)
                || self.board.can_castle(P::player(), CastleType::QueenSide))
        {
            self.generate_castling::<L, P>();
        }
    }

    // Generates evasions of a king in check: king moves away, and for single
    // checkers, blocks and captures of the checking piece.
    fn generate_evasions<L: Legality, P: PlayerTrait>(&mut self) {
        debug_assert!(self.board.in_check());

        let ksq: SQ = self.board.king_sq(P::player());
        let checkers = self.board.checkers();

        // With two checkers, only the king may move.
        if !checkers.more_than_one() {
            let checker_sq: SQ = checkers.bit_scan_forward();
            let checker_pt: PieceType = self.board.piece_at_sq(checker_sq).type_of();

            // Block or capture a sliding checker; a pawn or knight can only be
            // captured.
            let target: BitBoard = match checker_pt {
                PieceType::P | PieceType::N => checker_sq.to_bb(),
                _ => between_bb(ksq, checker_sq) | checker_sq.to_bb(),
            };

            self.generate_pawn_moves::<L, EvasionsGenType, P>(target);
            self.moves_per_piece::<L, P, KnightType>(target);
            self.moves_per_piece::<L, P, BishopType>(target);
            self.moves_per_piece::<L, P, RookType>(target);
            self.moves_per_piece::<L, P, QueenType>(target);
        }

        let mut king_moves_bb: BitBoard = king_moves(ksq) & !self.us_occ;
        while let Some(dst) = king_moves_bb.pop_some_lsb() {
            self.check_and_add::<L>(BitMove::make_normal(ksq, dst));
        }
    }

    // Generates castling for both sides of the current player. The attack
    // filter over the king's path is performed by `Position::legal`.
    fn generate_castling<L: Legality, P: PlayerTrait>(&mut self) {
        self.castling_side::<L, P>(CastleType::QueenSide);
        self.castling_side::<L, P>(CastleType::KingSide);
    }

    fn castling_side<L: Legality, P: PlayerTrait>(&mut self, side: CastleType) {
        if !self.board.castle_impeded(side) && self.board.can_castle(P::player(), side) {
            let ksq: SQ = self.board.king_sq(P::player());
            let k_to: SQ = P::player().relative_square(match side {
                CastleType::KingSide => SQ::G1,
                CastleType::QueenSide => SQ::C1,
            });
            self.check_and_add::<L>(BitMove::make_castle(ksq, k_to));
        }
    }

    // Get the moves of a non-pawn piece class landing on a target.
    fn moves_per_piece<L: Legality, PL: PlayerTrait, P: PieceTrait>(&mut self, target: BitBoard) {
        let mut piece_bb: BitBoard = self.board.piece_bb(PL::player(), P::piece_type());
        while let Some(src) = piece_bb.pop_some_lsb() {
            let mut moves_bb: BitBoard = self.moves_bb::<P>(src) & !self.us_occ & target;
            while let Some(dst) = moves_bb.pop_some_lsb() {
                self.check_and_add::<L>(BitMove::make_normal(src, dst));
            }
        }
    }

    // Generate pawn moves: pushes, captures, promotions and en-passant, with
    // pawns on the seventh rank split out for promotion handling.
    fn generate_pawn_moves<L: Legality, G: GenTypeTrait, P: PlayerTrait>(
        &mut self,
        target: BitBoard,
    ) {
        let (rank_7, rank_3): (BitBoard, BitBoard) = if P::player() == Player::White {
            (BitBoard::RANK_7, BitBoard::RANK_3)
        } else {
            (BitBoard::RANK_2, BitBoard::RANK_6)
        };

        let all_pawns: BitBoard = self.board.piece_bb(P::player(), PieceType::P);
        let pawns_rank_7: BitBoard = all_pawns & rank_7;
        let pawns_not_rank_7: BitBoard = all_pawns & !rank_7;

        // Where a pawn capture may land: in an evasion only the checker itself
        // can be taken.
        let enemies: BitBoard = if G::gen_type() == GenTypes::Evasions {
            self.board.checkers()
        } else if G::gen_type() == GenTypes::Captures {
            target
        } else {
            self.them_occ
        };

        let empty_squares: BitBoard = !self.occ;

        // Single and double pushes, no promotions.
        if G::gen_type() != GenTypes::Captures {
            let mut push_one: BitBoard = P::shift_up(pawns_not_rank_7) & empty_squares;
            let mut push_two: BitBoard = P::shift_up(push_one & rank_3) & empty_squares;

            if G::gen_type() == GenTypes::Evasions {
                push_one &= target;
                push_two &= target;
            }

            while let Some(dst) = push_one.pop_some_lsb() {
                let src: SQ = P::down(dst);
                self.check_and_add::<L>(BitMove::make_normal(src, dst));
            }

            while let Some(dst) = push_two.pop_some_lsb() {
                let src: SQ = P::down(P::down(dst));
                self.check_and_add::<L>(BitMove::make_normal(src, dst));
            }
        }

        // Promotions, both capturing and quiet.
        if pawns_rank_7.is_not_empty() {
            let mut no_promo: BitBoard = P::shift_up(pawns_rank_7) & empty_squares;
            let mut left_cap_promo: BitBoard = P::shift_up_left(pawns_rank_7) & enemies;
            let mut right_cap_promo: BitBoard = P::shift_up_right(pawns_rank_7) & enemies;

            if G::gen_type() == GenTypes::Evasions {
                no_promo &= target;
            }

            while let Some(dst) = no_promo.pop_some_lsb() {
                self.create_promotions::<L, G>(dst, P::down(dst), false);
            }

            while let Some(dst) = left_cap_promo.pop_some_lsb() {
                self.create_promotions::<L, G>(dst, P::down_right(dst), true);
            }

            while let Some(dst) = right_cap_promo.pop_some_lsb() {
                self.create_promotions::<L, G>(dst, P::down_left(dst), true);
            }
        }

        // Captures and en-passant.
        if G::gen_type() != GenTypes::Quiets {
            let mut left_cap: BitBoard = P::shift_up_left(pawns_not_rank_7) & enemies;
            let mut right_cap: BitBoard = P::shift_up_right(pawns_not_rank_7) & enemies;

            while let Some(dst) = left_cap.pop_some_lsb() {
                let src: SQ = P::down_right(dst);
                self.check_and_add::<L>(BitMove::make_normal(src, dst));
            }

            while let Some(dst) = right_cap.pop_some_lsb() {
                let src: SQ = P::down_left(dst);
                self.check_and_add::<L>(BitMove::make_normal(src, dst));
            }

            if self.board.ep_square() != NO_SQ {
                let ep_sq: SQ = self.board.ep_square();
                debug_assert_eq!(
                    ep_sq.rank(),
                    P::player().relative_rank(crate::core::Rank::R6)
                );

                // An en-passant capture can be an evasion only if the checking
                // piece is the double-pushed pawn itself.
                if G::gen_type() != GenTypes::Evasions
                    || (target & P::down(ep_sq).to_bb()).is_not_empty()
                {
                    let mut ep_attackers: BitBoard =
                        pawns_not_rank_7 & pawn_attacks_from(ep_sq, P::opp_player());
                    while let Some(src) = ep_attackers.pop_some_lsb() {
                        self.check_and_add::<L>(BitMove::make_ep_capture(src, ep_sq));
                    }
                }
            }
        }
    }

    // Emits the promotions of one pawn arrival square for the given category.
    // The queen promotion belongs to every capture-bearing category; the
    // under-promotions to captures onto enemies, quiet pushes in the quiet
    // category, and all evasion / non-evasion generation.
    #[inline]
    fn create_promotions<L: Legality, G: GenTypeTrait>(&mut self, dst: SQ, src: SQ, enemy: bool) {
        let gen = G::gen_type();
        if gen == GenTypes::Captures || gen == GenTypes::Evasions || gen == GenTypes::NonEvasions {
            self.check_and_add::<L>(BitMove::make_promotion(src, dst, PieceType::Q));
        }
        if (gen == GenTypes::Captures && enemy)
            || (gen == GenTypes::Quiets && !enemy)
            || gen == GenTypes::Evasions
            || gen == GenTypes::NonEvasions
        {
            self.check_and_add::<L>(BitMove::make_promotion(src, dst, PieceType::R));
            self.check_and_add::<L>(BitMove::make_promotion(src, dst, PieceType::B));
            self.check_and_add::<L>(BitMove::make_promotion(src, dst, PieceType::N));
        }
    }

    // Return the moves Bitboard of a non-pawn piece.
    #[inline]
    fn moves_bb<P: PieceTrait>(&self, square: SQ) -> BitBoard {
        debug_assert!(square.is_okay());
        match P::piece_type() {
            PieceType::N => knight_moves(square),
            PieceType::B => bishop_moves(self.occ, square),
            PieceType::R => rook_moves(self.occ, square),
            PieceType::Q => queen_moves(self.occ, square),
            PieceType::K => king_moves(square),
            _ => unreachable!(),
        }
    }

    /// Tests the move for legality (if generating legal moves), and if it
    /// passes writes it to the list.
    #[inline]
    fn check_and_add<L: Legality>(&mut self, b_move: BitMove) {
        if !L::gen_legal() || self.board.legal(b_move) {
            unsafe {
                let b_ptr = mem::transmute::<*mut MP::Output, *mut BitMove>(self.ptr);
                ptr::write(b_ptr, b_move);
                self.ptr = self.ptr.add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::prelude::init_statics;

    #[test]
    fn start_pos_move_counts() {
        init_statics();
        let pos = Position::start_pos();
        assert_eq!(pos.generate_moves().len(), 20);
        assert_eq!(pos.generate_pseudolegal_moves().len(), 20);

        let captures = MoveGen::generate::<Legal, CapturesGenType>(&pos);
        assert_eq!(captures.len(), 0);
        let quiets = MoveGen::generate::<Legal, QuietsGenType>(&pos);
        assert_eq!(quiets.len(), 20);
    }

    #[test]
    fn legal_subset_of_pseudolegal() {
        init_statics();
        let pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let legal = pos.generate_moves();
        let pseudo = pos.generate_pseudolegal_moves();
        assert!(legal.len() <= pseudo.len());
        for m in legal.iter() {
            assert!(pseudo.contains(m));
            assert!(pos.legal(*m));
        }
        for m in pseudo.iter() {
            if pos.legal(*m) {
                assert!(legal.contains(m));
            }
        }
    }

    #[test]
    fn captures_and_quiets_partition_non_evasions() {
        init_statics();
        let fens = [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        ];
        for fen in fens.iter() {
            let pos = Position::from_fen(fen).unwrap();
            let captures = MoveGen::generate::<PseudoLegal, CapturesGenType>(&pos);
            let quiets = MoveGen::generate::<PseudoLegal, QuietsGenType>(&pos);
            let non_evasions = MoveGen::generate::<PseudoLegal, NonEvasionsGenType>(&pos);

            assert_eq!(captures.len() + quiets.len(), non_evasions.len());
            for m in captures.iter() {
                assert!(non_evasions.contains(m));
                assert!(!quiets.contains(m));
            }
            for m in quiets.iter() {
                assert!(non_evasions.contains(m));
            }
        }
    }

    #[test]
    fn double_check_only_king_moves() {
        init_statics();
        // Knight on f6 and rook on e1 both check the e8 king.
        let pos = Position::from_fen("4k3/8/5N2/8/8/8/8/4RK2 b - - 0 1").unwrap();
        assert!(pos.checkers().more_than_one());
        let evasions = pos.generate_moves();
        for m in evasions.iter() {
            assert_eq!(pos.moved_piece(*m), PieceType::K);
        }
    }

    #[test]
    fn evasions_block_or_capture_single_checker() {
        init_statics();
        // Rook on e4 checks the e1 king: every evasion must resolve the check.
        let pos = Position::from_fen("4k3/8/8/8/4r3/8/8/4K3 w - - 0 1").unwrap();
        assert!(pos.in_check());
        let evasions = pos.generate_moves();
        assert!(!evasions.is_empty());
        for m in evasions.iter() {
            let gc = pos.gives_check(*m);
            let mut p2 = pos.clone();
            p2.make_move(*m, gc);
            // The white king must no longer be attacked after any evasion.
            let attackers = p2.attackers_to(p2.king_sq(Player::White), p2.occupied())
                & p2.get_occupied_player(Player::Black);
            assert!(attackers.is_empty());
        }
    }
}

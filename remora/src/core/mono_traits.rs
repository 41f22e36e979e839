//! Traits and dummy types defined for various enum types. Shouldn't be used in
//! place of their enum representations.
//!
//! This module's only use is to allow for compile-time mono-morphization of
//! functions / methods, where each function created can be optimized further.

use super::bitboard::BitBoard;
use super::sq::SQ;
use super::{GenTypes, PieceType, Player};

/// Defines a Player Trait, allowing for specific functions in relation
/// to a certain player.
///
/// These shouldn't be used in place of `Player`, as they are only used for
/// compile-time optimizations of certain functions.
pub trait PlayerTrait {
    /// Return the current `Player`.
    fn player() -> Player;

    /// Return the opposing `Player`.
    fn opp_player() -> Player;

    /// Given a `SQ`, return a square that is down relative to the current player.
    fn down(sq: SQ) -> SQ;

    /// Given a `SQ`, return a square that is up relative to the current player.
    fn up(sq: SQ) -> SQ;

    /// Given a `SQ`, return a square that is down-left relative to the current player.
    fn down_left(sq: SQ) -> SQ;

    /// Given a `SQ`, return a square that is down-right relative to the current player.
    fn down_right(sq: SQ) -> SQ;

    /// Return the same BitBoard shifted "up" relative to the current player.
    fn shift_up(bb: BitBoard) -> BitBoard;

    /// Return the same BitBoard shifted "up" and "left" relative to the current
    /// player. Does not include the left-most file in the result.
    fn shift_up_left(bb: BitBoard) -> BitBoard;

    /// Return the same BitBoard shifted "up" and "right" relative to the current
    /// player. Does not include the right-most file in the result.
    fn shift_up_right(bb: BitBoard) -> BitBoard;
}

/// Dummy type to represent a `Player::White` which implements `PlayerTrait`.
pub struct WhiteType {}

/// Dummy type to represent a `Player::Black` which implements `PlayerTrait`.
pub struct BlackType {}

impl PlayerTrait for WhiteType {
    #[inline(always)]
    fn player() -> Player {
        Player::White
    }

    #[inline(always)]
    fn opp_player() -> Player {
        Player::Black
    }

    #[inline(always)]
    fn down(sq: SQ) -> SQ {
        sq - SQ(8)
    }

    #[inline(always)]
    fn up(sq: SQ) -> SQ {
        sq + SQ(8)
    }

    #[inline(always)]
    fn down_left(sq: SQ) -> SQ {
        sq - SQ(9)
    }

    #[inline(always)]
    fn down_right(sq: SQ) -> SQ {
        sq - SQ(7)
    }

    #[inline(always)]
    fn shift_up(bb: BitBoard) -> BitBoard {
        bb << 8
    }

    #[inline(always)]
    fn shift_up_left(bb: BitBoard) -> BitBoard {
        (bb & !BitBoard::FILE_A) << 7
    }

    #[inline(always)]
    fn shift_up_right(bb: BitBoard) -> BitBoard {
        (bb & !BitBoard::FILE_H) << 9
    }
}

impl PlayerTrait for BlackType {
    #[inline(always)]
    fn player() -> Player {
        Player::Black
    }

    #[inline(always)]
    fn opp_player() -> Player {
        Player::White
    }

    #[inline(always)]
    fn down(sq: SQ) -> SQ {
        sq + SQ(8)
    }

    #[inline(always)]
    fn up(sq: SQ) -> SQ {
        sq - SQ(8)
    }

    #[inline(always)]
    fn down_left(sq: SQ) -> SQ {
        sq + SQ(9)
    }

    #[inline(always)]
    fn down_right(sq: SQ) -> SQ {
        sq + SQ(7)
    }

    #[inline(always)]
    fn shift_up(bb: BitBoard) -> BitBoard {
        bb >> 8
    }

    #[inline(always)]
    fn shift_up_left(bb: BitBoard) -> BitBoard {
        (bb & !BitBoard::FILE_H) >> 7
    }

    #[inline(always)]
    fn shift_up_right(bb: BitBoard) -> BitBoard {
        (bb & !BitBoard::FILE_A) >> 9
    }
}

/// A `GenTypeTrait` allows for specific functions in relation
/// to a certain type of move generation.
///
/// Alike `PlayerTrait`, `GenTypeTrait` is only used for compile-time
/// optimization through mono-morphism. This trait isn't intended to be used
/// elsewhere.
pub trait GenTypeTrait {
    /// Returns the `GenTypes`.
    fn gen_type() -> GenTypes;
}

/// Dummy type to represent a `GenTypes::All` which implements `GenTypeTrait`.
pub struct AllGenType {}
/// Dummy type to represent a `GenTypes::Captures` which implements `GenTypeTrait`.
pub struct CapturesGenType {}
/// Dummy type to represent a `GenTypes::Quiets` which implements `GenTypeTrait`.
pub struct QuietsGenType {}
/// Dummy type to represent a `GenTypes::Evasions` which implements `GenTypeTrait`.
pub struct EvasionsGenType {}
/// Dummy type to represent a `GenTypes::NonEvasions` which implements `GenTypeTrait`.
pub struct NonEvasionsGenType {}

impl GenTypeTrait for AllGenType {
    #[inline(always)]
    fn gen_type() -> GenTypes {
        GenTypes::All
    }
}

impl GenTypeTrait for CapturesGenType {
    #[inline(always)]
    fn gen_type() -> GenTypes {
        GenTypes::Captures
    }
}

impl GenTypeTrait for QuietsGenType {
    #[inline(always)]
    fn gen_type() -> GenTypes {
        GenTypes::Quiets
    }
}

impl GenTypeTrait for EvasionsGenType {
    #[inline(always)]
    fn gen_type() -> GenTypes {
        GenTypes::Evasions
    }
}

impl GenTypeTrait for NonEvasionsGenType {
    #[inline(always)]
    fn gen_type() -> GenTypes {
        GenTypes::NonEvasions
    }
}

/// A `PieceTrait` allows for specific functions in relation
/// to the type of a moving piece.
///
/// Alike `PlayerTrait` and `GenTypeTrait`, `PieceTrait` is only used for
/// compile-time optimization through mono-morphism.
pub trait PieceTrait {
    /// Returns the `PieceType` of an object.
    fn piece_type() -> PieceType;
}

/// Dummy type to represent a `PieceType::N` which implements `PieceTrait`.
pub struct KnightType {}
/// Dummy type to represent a `PieceType::B` which implements `PieceTrait`.
pub struct BishopType {}
/// Dummy type to represent a `PieceType::R` which implements `PieceTrait`.
pub struct RookType {}
/// Dummy type to represent a `PieceType::Q` which implements `PieceTrait`.
pub struct QueenType {}
/// Dummy type to represent a `PieceType::K` which implements `PieceTrait`.
pub struct KingType {}

impl PieceTrait for KnightType {
    #[inline(always)]
    fn piece_type() -> PieceType {
        PieceType::N
    }
}

impl PieceTrait for BishopType {
    #[inline(always)]
    fn piece_type() -> PieceType {
        PieceType::B
    }
}

impl PieceTrait for RookType {
    #[inline(always)]
    fn piece_type() -> PieceType {
        PieceType::R
    }
}

impl PieceTrait for QueenType {
    #[inline(always)]
    fn piece_type() -> PieceType {
        PieceType::Q
    }
}

impl PieceTrait for KingType {
    #[inline(always)]
    fn piece_type() -> PieceType {
        PieceType::K
    }
}

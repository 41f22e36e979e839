//! FEN (Forsyth-Edwards Notation) plumbing: the errors a malformed FEN string
//! can produce, and a handful of positions used by the test suites.

use std::num;

/// The FEN string of the starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Represents possible errors encountered while building a `Position` from a
/// fen string.
#[derive(Fail, Debug)]
pub enum FenBuildError {
    #[fail(display = "invalid number of fen sections: {}, expected 6", sections)]
    NotEnoughSections { sections: usize },
    #[fail(display = "invalid number of ranks: {}, expected 8", ranks)]
    IncorrectRankAmounts { ranks: usize },
    #[fail(display = "invalid turn: {}, expected 'w' or 'b'", turn)]
    UnrecognizedTurn { turn: String },
    #[fail(display = "invalid castling character: {}", castle)]
    UnrecognizedCastling { castle: char },
    #[fail(display = "unreadable En-passant square: {}", ep)]
    EPSquareUnreadable { ep: String },
    #[fail(display = "invalid En-passant square: {}", ep)]
    EPSquareInvalid { ep: String },
    #[fail(display = "too many squares in rank {}", rank)]
    SquareLargerRank { rank: usize },
    #[fail(display = "unrecognized piece: {}", piece)]
    UnrecognizedPiece { piece: char },
    #[fail(display = "unreadable move counter")]
    UnreadableMoves(#[cause] num::ParseIntError),
    #[fail(display = "incorrect number of kings for {}: {}", player, num)]
    IncorrectKingNum { player: &'static str, num: u8 },
    #[fail(display = "too many pieces for {}: {}", player, num)]
    TooManyPieces { player: &'static str, num: u8 },
    #[fail(display = "pawn on the first or last rank")]
    PawnOnLastRow,
}

impl From<num::ParseIntError> for FenBuildError {
    fn from(err: num::ParseIntError) -> FenBuildError {
        FenBuildError::UnreadableMoves(err)
    }
}

/// A list of valid, varied positions for round-trip testing.
pub static ALL_FENS: [&str; 6] = [
    START_FEN,
    "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
    "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1",
];

//! Bitboard-based chess foundations.
//!
//! This package is separated into two parts. Firstly, the board representation &
//! associated functions (the current crate, `remora`), and secondly, the searching
//! algorithms built on top of these foundations (`remora_engine`).
//!
//! # Usage
//!
//! Before any `Position` is created, the static lookup tables (attack boards,
//! magics, Zobrist seeds) must be initialized exactly once:
//!
//! ```ignore
//! remora::helper::prelude::init_statics();
//! let pos = remora::Position::start_pos();
//! ```
//!
//! Generating the legal moves of a position:
//!
//! ```ignore
//! let list = pos.generate_moves();
//! ```
//!
//! Applying and un-doing moves:
//!
//! ```ignore
//! let mut pos = Position::start_pos();
//! let list = pos.generate_moves();
//!
//! for mov in list.iter() {
//!     let gives_check = pos.gives_check(*mov);
//!     pos.make_move(*mov, gives_check);
//!     pos.unmake_move();
//! }
//! ```
//!
//! # Safety
//!
//! While generally a safe library, remora was built with a focus of speed in mind.
//! Methods with the ability to panic are documented as such.

#![allow(dead_code)]

#[macro_use]
extern crate bitflags;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate lazy_static;
extern crate rand;

pub mod board;
pub mod core;
pub mod helper;
pub mod tools;

pub use crate::board::Position;
pub use crate::core::bitboard::BitBoard;
pub use crate::core::move_list::{GradedMoveList, MoveList};
pub use crate::core::piece_move::{BitMove, GradedMove};
pub use crate::core::sq::SQ;
pub use crate::core::{File, Piece, PieceType, Player, Rank};

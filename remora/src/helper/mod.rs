//! Statically initialized lookup tables.
//!
//! Whenever a `Position` is created, these statics must have been initialized
//! beforehand through [`prelude::init_statics`]. The tables are written exactly
//! once and read without synchronization afterwards.

pub mod boards;
pub mod magic;
pub mod prelude;
pub mod zobrist;

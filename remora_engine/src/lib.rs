//! A parallel alpha-beta chess engine built on the `remora` chess foundations.
//!
//! The engine searches with iterative deepening, aspiration windows and
//! principal-variation search, coordinated across a pool of worker threads in
//! the Lazy-SMP style: every worker runs the same algorithm over its own copy
//! of the root position and its own heuristic tables, sharing only the
//! transposition table and the stop signal.
//!
//! # Usage
//!
//! ```ignore
//! remora_engine::init();
//!
//! let pool = remora_engine::threadpool::threadpool();
//! pool.set_thread_count(4);
//!
//! let pos = remora::Position::start_pos();
//! let best = pool.search(&pos, 6);
//! ```

#![allow(dead_code)]

#[macro_use]
extern crate lazy_static;
extern crate num_cpus;
extern crate remora;

pub mod consts;
pub mod movepick;
pub mod root_moves;
pub mod search;
pub mod sync;
pub mod tables;
pub mod threadpool;

pub use crate::consts::*;

/// Initializes the static lookup tables, the shared transposition table and
/// the thread pool. Must be called once before any search is started.
pub fn init() {
    remora::helper::prelude::init_statics();
    consts::init_globals();
    threadpool::init_threadpool();
}

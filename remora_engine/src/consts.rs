//! Constant values and static structures.

use std::sync::atomic::{AtomicBool, Ordering};

use remora::tools::tt::TranspositionTable;

/// The maximum depth a search may reach.
pub const MAX_PLY: u16 = 126;

/// The maximum number of threads the pool will spawn.
pub const MAX_THREADS: usize = 256;

/// The number of worker threads spawned when none is configured.
pub const DEFAULT_THREADS: usize = 8;

/// Size of the shared transposition table, in megabytes.
pub const DEFAULT_TT_SIZE: usize = 256;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

lazy_static! {
    /// The transposition table shared by every search thread.
    pub static ref TT_TABLE: TranspositionTable = TranspositionTable::new(DEFAULT_TT_SIZE);
}

/// Forces the global structures into existence. Guaranteed to only run once.
pub fn init_globals() {
    if !INITIALIZED.swap(true, Ordering::SeqCst) {
        lazy_static::initialize(&TT_TABLE);
    }
}

/// Returns access to the shared transposition table.
#[inline(always)]
pub fn tt() -> &'static TranspositionTable {
    &TT_TABLE
}

/// Compile-time distinction between nodes on the principal variation and null
/// window nodes.
pub trait PVNode {
    fn is_pv() -> bool;
}

/// A node whose full `(alpha, beta)` window is searched.
pub struct PV {}

/// A node searched with a null window.
pub struct NonPV {}

impl PVNode for PV {
    #[inline(always)]
    fn is_pv() -> bool {
        true
    }
}

impl PVNode for NonPV {
    #[inline(always)]
    fn is_pv() -> bool {
        false
    }
}

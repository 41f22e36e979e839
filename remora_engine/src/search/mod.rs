//! The main searching function: iterative deepening driving a negamax
//! alpha-beta with principal-variation search, aspiration windows, a staged
//! move orderer, and transposition-table-guided pruning.

pub mod eval;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use remora::core::piece_move::BitMove;
use remora::core::score::*;
use remora::tools::tt::Bound;
use remora::tools::PreFetchable;
use remora::{PieceType, Player, Position};

use crate::consts::*;
use crate::movepick::MoveOrderer;
use crate::root_moves::RootMoveList;
use crate::sync::{GuardedBool, LockLatch};
use crate::tables::{ButterflyTable, HistoryTable, KillerTable};
use crate::threadpool::threadpool;

// Transposition cutoffs are suppressed when the fifty-move counter nears its
// limit, as stored scores may then conflate mates with draws.
const RULE_50_TT_SUPPRESS: i16 = 90;

/// A search worker. One exists per thread of the pool; thread 0 is the main
/// worker driving the others.
///
/// Each worker owns its position (a clone of the root), its root-move list,
/// its heuristic tables and its principal variation. Only the transposition
/// table and the stop signal are shared between workers.
pub struct Searcher {
    // Synchronization
    pub id: usize,
    pub kill: AtomicBool,
    pub searching: Arc<GuardedBool>,
    pub cond: Arc<LockLatch>,

    // Search state
    pub board: Position,
    pub max_depth: u16,
    pub depth_completed: i16,
    pub root_moves: RootMoveList,
    pub pv: [BitMove; MAX_PLY as usize],
    pub best_move: BitMove,
    pub previous_score: Value,

    // Move-ordering heuristics, per worker
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub butterfly: ButterflyTable,

    pub nodes: AtomicU64,
}

unsafe impl Send for Searcher {}
unsafe impl Sync for Searcher {}

impl Searcher {
    /// Creates a new `Searcher` with an ID and the condition it is released by.
    pub fn new(id: usize, cond: Arc<LockLatch>) -> Self {
        Searcher {
            id,
            kill: AtomicBool::new(false),
            searching: Arc::new(GuardedBool::new(true)),
            cond,
            board: Position::start_pos(),
            max_depth: MAX_PLY,
            depth_completed: 0,
            root_moves: RootMoveList::new(),
            pv: [BitMove::null(); MAX_PLY as usize],
            best_move: BitMove::null(),
            previous_score: 0,
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            butterfly: ButterflyTable::new(),
            nodes: AtomicU64::new(0),
        }
    }

    /// Resets the per-search state: heuristic tables, principal variation and
    /// bookkeeping. The transposition table is shared and deliberately left
    /// alone.
    pub fn clear(&mut self) {
        self.killers.clear();
        self.history.clear();
        self.butterfly.clear();
        self.pv = [BitMove::null(); MAX_PLY as usize];
        self.best_move = BitMove::null();
        self.depth_completed = 0;
        self.previous_score = 0;
    }

    /// Spins in an idle loop, running a search each time the condition is
    /// released.
    pub fn idle_loop(&mut self) {
        self.searching.set(false);
        loop {
            self.cond.wait();
            if self.kill.load(Ordering::SeqCst) {
                return;
            }
            self.go();
        }
    }

    fn go(&mut self) {
        self.searching.set(true);
        if self.main_thread() {
            self.main_thread_go();
        } else {
            self.search_root();
        }
        self.searching.set(false);
    }

    /// The main thread's search entry: ages the shared table, releases the
    /// other workers, searches, and finally stops and collects everyone.
    fn main_thread_go(&mut self) {
        tt().new_search();

        // Wake up the helper threads, then search ourselves.
        threadpool().thread_cond.set();
        self.search_root();

        // Re-arm the helpers' condition and tell them to wind down.
        threadpool().thread_cond.lock();
        threadpool().set_stop(true);
        threadpool().wait_for_non_main();

        self.previous_score = if self.root_moves.is_empty() {
            DRAW
        } else {
            self.root_moves.first().score
        };
    }

    /// Iterative deepening with aspiration windows around the previous score.
    fn search_root(&mut self) {
        if self.stop() {
            return;
        }

        if self.root_moves.is_empty() {
            // Terminal root: mate or stalemate, report the null move.
            self.best_move = BitMove::null();
            self.pv[0] = BitMove::null();
            return;
        }

        // Helper threads ignore the depth cap and run until stopped.
        let max_depth: i16 = if self.main_thread() {
            self.max_depth.min(MAX_PLY) as i16
        } else {
            MAX_PLY as i16
        };

        let mut prev_score: Value = 0;
        let mut depth: i16 = 1;

        'iterative_deepening: while depth <= max_depth && !self.stop() {
            self.root_moves.rollback();

            // Size the window from the spread of the best root move's scores.
            let mut delta: Value = 5 + (self.root_moves.first().mean_sq / 10_000) as Value;
            let mut alpha: Value = (prev_score - delta).max(NEG_INFINITE);
            let mut beta: Value = (prev_score + delta).min(INFINITE);
            let mut best_value: Value;

            // Widen and re-search until the score fits the window.
            'aspiration_window: loop {
                best_value = self.search::<PV>(alpha, beta, depth, 0);
                if self.stop() {
                    break 'aspiration_window;
                }
                if best_value <= alpha {
                    alpha = (alpha - delta).max(NEG_INFINITE);
                } else if best_value >= beta {
                    beta = (beta + delta).min(INFINITE);
                } else {
                    break 'aspiration_window;
                }
                delta += delta / 3;
            }

            if self.stop() {
                // The cancelled iteration is discarded: restore the previous
                // variation and put its best move back in front.
                self.root_moves.move_to_front(self.best_move);
                self.pv[0] = self.best_move;
                break 'iterative_deepening;
            }

            self.root_moves.sort();
            {
                let rm = self.root_moves.first_mut();
                rm.score = best_value;
                rm.update_mean_sq(best_value, depth);
            }

            prev_score = best_value;
            self.depth_completed = depth;
            self.best_move = self.root_moves.first().bit_move;
            self.pv[0] = self.best_move;

            depth += 1;
        }
    }

    /// The recursive negamax with alpha-beta pruning and null-window
    /// verification of non-principal moves.
    fn search<N: PVNode>(&mut self, mut alpha: Value, beta: Value, depth: i16, ply: u16) -> Value {
        if self.stop() || self.board.is_draw() {
            return DRAW;
        }

        if depth == 0 {
            return self.eval();
        }

        debug_assert!(depth >= 1);
        debug_assert!(alpha < beta);

        let is_pv: bool = N::is_pv();
        let at_root: bool = ply == 0;
        let us: Player = self.board.turn();
        let in_check: bool = self.board.in_check();

        let zob: u64 = self.board.zobrist();
        let second: u16 = self.board.secondary_key();

        let (tt_hit, tt_data, tt_writer) = tt().probe(zob, second);
        let tt_move: BitMove = if tt_hit {
            tt_data.best_move
        } else {
            BitMove::null()
        };

        // Return a stored score outright when it was searched at least this
        // deep and its bound certifies a cutoff against the current window.
        if !at_root
            && tt_hit
            && i16::from(tt_data.depth) >= depth
            && self.board.rule_50() < RULE_50_TT_SUPPRESS
        {
            let tt_score = Value::from(tt_data.score);
            let cutoff = match tt_data.bound {
                Bound::Lower => tt_score >= beta,
                Bound::Upper => tt_score <= alpha,
                Bound::Exact => true,
                Bound::None => false,
            };
            if cutoff {
                return tt_score;
            }
        }

        let orig_alpha: Value = alpha;
        let mut best_score: Value = NEG_INFINITE;
        let mut best_move: BitMove = BitMove::null();
        let mut moves_played: u32 = 0;

        let mut orderer = MoveOrderer::new(
            &self.board,
            tt_move,
            ply,
            &self.killers,
            &self.history,
            &self.butterfly,
        );

        loop {
            let m: BitMove = orderer.next();
            if m.is_null() {
                break;
            }
            // Pseudo-legal emission: moves leaving the king hanging (and any
            // stale table move) are dropped here.
            if !self.board.legal(m) {
                continue;
            }
            moves_played += 1;

            let gives_check: bool = self.board.gives_check(m);
            let is_quiet: bool = !self.board.is_capture(m) && !m.is_promo();
            let moved: PieceType = self.board.moved_piece(m);

            self.board.make_move(m, gives_check);
            self.nodes.fetch_add(1, Ordering::Relaxed);
            tt().prefetch(self.board.zobrist());

            let value: Value = if moves_played == 1 && is_pv {
                -self.search::<PV>(-beta, -alpha, depth - 1, ply + 1)
            } else {
                let null_window = -self.search::<NonPV>(-(alpha + 1), -alpha, depth - 1, ply + 1);
                if is_pv && null_window > alpha && (at_root || null_window < beta) {
                    -self.search::<PV>(-beta, -alpha, depth - 1, ply + 1)
                } else {
                    null_window
                }
            };

            self.board.unmake_move();

            if self.stop() {
                return DRAW;
            }

            // Every attempted quiet feeds the butterfly counters, win or lose.
            if is_quiet {
                self.butterfly.update(us, m.get_src(), m.get_dest(), depth);
            }

            if at_root {
                let rm = self
                    .root_moves
                    .find_mut(m)
                    .expect("root move list out of sync");
                if moves_played == 1 || value > alpha {
                    rm.score = value;
                    rm.depth_reached = depth;
                } else {
                    rm.score = NEG_INFINITE;
                }
            }

            if value > best_score {
                best_score = value;
                best_move = m;
            }

            if value >= beta {
                // Fail high: remember what cut us off.
                if is_quiet {
                    self.killers.update(m, ply);
                    self.history.update(us, moved, m.get_dest(), depth);
                }
                tt_writer.write(zob, second, depth as i8, Bound::Lower, best_score as i16, m);
                return best_score;
            }

            if value > alpha {
                alpha = value;
                if is_pv {
                    self.pv[ply as usize] = m;
                }
            }
        }

        if moves_played == 0 {
            // No legal moves: mate if in check, stalemate otherwise.
            return if in_check { mated_in(ply) } else { DRAW };
        }

        let bound = if best_score <= orig_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        tt_writer.write(
            zob,
            second,
            depth as i8,
            bound,
            best_score as i16,
            best_move,
        );

        best_score
    }

    /// The side-relative static evaluation of the worker's current position.
    #[inline]
    pub fn eval(&self) -> Value {
        eval::evaluate(&self.board)
    }

    /// Returns the first move of the principal variation, the final product of
    /// a search.
    #[inline]
    pub fn get_best_move(&self) -> BitMove {
        self.pv[0]
    }

    #[inline(always)]
    fn main_thread(&self) -> bool {
        self.id == 0
    }

    #[inline(always)]
    fn stop(&self) -> bool {
        threadpool().stop.load(Ordering::Relaxed)
    }
}

impl Drop for Searcher {
    fn drop(&mut self) {
        self.searching.set(false);
    }
}

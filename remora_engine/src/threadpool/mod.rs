//! Contains the `ThreadPool` and the lifecycle of the individual search
//! threads.
//!
//! The pool owns one `Searcher` per OS thread. Thread 0 is the main thread:
//! a search request wakes it, it ages the transposition table, releases the
//! helper threads, runs its own iterative deepening, and when its depth cap is
//! reached raises the shared stop flag and waits for the helpers to drain.
//! Helpers share nothing but the transposition table and that flag.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::cell::UnsafeCell;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle};

use remora::core::move_list::MoveList;
use remora::core::piece_move::BitMove;
use remora::Position;

use crate::consts::*;
use crate::search::Searcher;
use crate::sync::LockLatch;

const KILOBYTE: usize = 1024;

// Deep recursion at high depths exceeds typical platform defaults, so worker
// stacks are set explicitly.
const THREAD_STACK_SIZE: usize = 16_384 * KILOBYTE;

const POOL_SIZE: usize = mem::size_of::<ThreadPool>();

// Storage that is the same size as a thread pool, over-aligned so the cast
// below is valid for the real type.
#[repr(align(64))]
struct DummyThreadPool([u8; POOL_SIZE]);

// The global threadpool. Storage for a `ThreadPool` object written exactly
// once at initialization; a plain static of the real type would demand a
// const constructor.
static mut THREADPOOL: DummyThreadPool = DummyThreadPool([0; POOL_SIZE]);

static THREADPOOL_INIT: Once = Once::new();

/// Initializes the global thread pool with the default number of threads.
/// Called once on startup.
#[cold]
pub fn init_threadpool() {
    THREADPOOL_INIT.call_once(|| unsafe {
        // A spawned thread creates the structures, as the searcher
        // construction can otherwise overflow a small main stack.
        let builder = thread::Builder::new()
            .name("Starter".to_string())
            .stack_size(THREAD_STACK_SIZE);

        let handle = builder
            .spawn(|| {
                let pool: *mut ThreadPool = ptr::addr_of_mut!(THREADPOOL) as *mut ThreadPool;
                ptr::write(pool, ThreadPool::new());
            })
            .unwrap();
        handle.join().unwrap();
    });
}

/// Returns access to the global thread pool.
#[inline(always)]
pub fn threadpool() -> &'static mut ThreadPool {
    unsafe { &mut *(ptr::addr_of_mut!(THREADPOOL) as *mut ThreadPool) }
}

#[derive(Copy, Clone)]
enum ThreadSelection {
    Main,
    NonMain,
    All,
}

impl ThreadSelection {
    #[inline(always)]
    pub fn is_selection(self, id: usize) -> bool {
        match self {
            ThreadSelection::Main => id == 0,
            ThreadSelection::NonMain => id != 0,
            ThreadSelection::All => true,
        }
    }
}

// Dummy struct to allow us to pass a searcher pointer into a spawned thread.
struct SearcherPtr {
    ptr: UnsafeCell<*mut Searcher>,
}

unsafe impl Sync for SearcherPtr {}
unsafe impl Send for SearcherPtr {}

/// The thread pool of the chess engine.
pub struct ThreadPool {
    /// Access to each thread's `Searcher`.
    pub threads: Vec<UnsafeCell<*mut Searcher>>,
    /// Handles of each thread.
    handles: Vec<JoinHandle<()>>,
    /// Condition the main thread waits on for a search to start.
    pub main_cond: Arc<LockLatch>,
    /// Condition all helper threads wait on.
    pub thread_cond: Arc<LockLatch>,
    /// Cooperative stop signal; when true the searchers unwind at their next
    /// check.
    pub stop: AtomicBool,
}

impl ThreadPool {
    /// Creates a new `ThreadPool` with the default number of threads.
    pub fn new() -> Self {
        let mut pool: ThreadPool = ThreadPool {
            threads: Vec::new(),
            handles: Vec::new(),
            main_cond: Arc::new(LockLatch::new()),
            thread_cond: Arc::new(LockLatch::new()),
            stop: AtomicBool::new(true),
        };
        pool.main_cond.lock();
        pool.thread_cond.lock();

        while pool.size() < DEFAULT_THREADS {
            pool.attach_thread();
        }
        pool
    }

    /// Spawns a new thread and appends it to the vector of join handles.
    fn attach_thread(&mut self) {
        unsafe {
            let thread_ptr: SearcherPtr = self.create_thread();
            let builder = thread::Builder::new()
                .name(self.size().to_string())
                .stack_size(THREAD_STACK_SIZE);

            let handle = builder
                .spawn(move || {
                    let thread = &mut **thread_ptr.ptr.get();
                    thread.cond.lock();
                    thread.idle_loop();
                })
                .unwrap();
            self.handles.push(handle);
        };
    }

    /// Allocates a searcher structure and pushes it to the thread stack.
    ///
    /// This does not spawn a thread, just creates the structure the thread
    /// operates on. Only to be called by `attach_thread`.
    fn create_thread(&mut self) -> SearcherPtr {
        let len: usize = self.threads.len();
        let layout = Layout::new::<Searcher>();
        let cond = if len == 0 {
            Arc::clone(&self.main_cond)
        } else {
            Arc::clone(&self.thread_cond)
        };
        unsafe {
            let result = alloc_zeroed(layout);
            let new_ptr: *mut Searcher = result as *mut Searcher;
            ptr::write(new_ptr, Searcher::new(len, cond));
            self.threads.push(UnsafeCell::new(new_ptr));
            SearcherPtr {
                ptr: UnsafeCell::new(new_ptr),
            }
        }
    }

    /// Returns the number of threads in the pool.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.threads.len()
    }

    /// Returns a reference to the main thread's searcher.
    pub fn main(&self) -> &Searcher {
        unsafe {
            let main_thread: *mut Searcher = *self.threads.get_unchecked(0).get();
            &*main_thread
        }
    }

    /// Sets the thread count of the pool. If `num` is zero, the number of
    /// logical cores is used.
    ///
    /// # Safety
    ///
    /// Completely unsafe to use while the pool is searching.
    pub fn set_thread_count(&mut self, num: usize) {
        let num = if num == 0 { num_cpus::get() } else { num }.min(MAX_THREADS);
        self.wait_for_finish();
        self.kill_all();
        while self.size() < num {
            self.attach_thread();
        }
    }

    /// Kills and de-allocates all the threads that are running. This function
    /// blocks until every search has finished.
    pub fn kill_all(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.wait_for_finish();
        let mut join_handles = Vec::with_capacity(self.size());
        unsafe {
            // Tell each thread to drop out of its idle loop.
            self.threads
                .iter()
                .map(|s| &**s.get())
                .for_each(|s: &Searcher| s.kill.store(true, Ordering::SeqCst));

            // Wake every thread so each can observe the kill flag.
            self.main_cond.set();
            self.thread_cond.set();

            // Collect the join handles. We don't unwrap immediately, so one
            // failed thread does not leave the others un-joined.
            while let Some(handle) = self.handles.pop() {
                join_handles.push(handle.join());
            }

            // De-allocate each searcher.
            while let Some(unc) = self.threads.pop() {
                let th: *mut Searcher = *unc.get();
                ptr::drop_in_place(th);
                let ptr: NonNull<u8> = NonNull::new_unchecked(th as *mut u8);
                let layout = Layout::new::<Searcher>();
                dealloc(ptr.as_ptr(), layout);
            }
        }
        self.main_cond.lock();
        self.thread_cond.lock();

        while let Some(handle_result) = join_handles.pop() {
            handle_result.unwrap_or_else(|e| println!("Thread failed: {:?}", e));
        }
    }

    /// Sets the threads to stop (or not).
    #[inline(always)]
    pub fn set_stop(&mut self, stop: bool) {
        self.stop.store(stop, Ordering::Relaxed);
    }

    /// Waits for all the threads to finish searching.
    pub fn wait_for_finish(&self) {
        self.await_search_cond(ThreadSelection::All, false);
    }

    /// Waits for all non-main threads to finish searching.
    pub fn wait_for_non_main(&self) {
        self.await_search_cond(ThreadSelection::NonMain, false);
    }

    /// Waits for the main thread to start searching.
    pub fn wait_for_main_start(&self) {
        self.await_search_cond(ThreadSelection::Main, true);
    }

    fn await_search_cond(&self, thread_sel: ThreadSelection, await_search: bool) {
        self.threads
            .iter()
            .map(|s| unsafe { &**s.get() })
            .filter(|t| thread_sel.is_selection(t.id))
            .for_each(|t: &Searcher| {
                t.searching.wait(await_search);
            });
    }

    /// Launches a parallel search of the given position to a fixed depth.
    /// Returns as soon as the workers are running; combine with
    /// [`ThreadPool::wait_for_finish`] and [`ThreadPool::best_move`], or use
    /// [`ThreadPool::search`] to block for the result.
    ///
    /// Cloning the position hands every worker the full state stack, so
    /// repetitions against the game history are detected inside the search.
    pub fn start_search(&mut self, board: &Position, depth: u16) {
        let root_moves: MoveList = board.generate_moves();

        self.wait_for_finish();
        self.stop.store(false, Ordering::Relaxed);

        for thread_ptr in self.threads.iter_mut() {
            let thread: &mut Searcher = unsafe { &mut **(*thread_ptr).get() };
            thread.clear();
            thread.nodes.store(0, Ordering::Relaxed);
            thread.board = board.clone();
            thread.max_depth = depth;
            thread.root_moves.replace(&root_moves);
        }

        self.main_cond.set();
        self.wait_for_main_start();
        self.main_cond.lock();
    }

    /// Performs a search to a fixed depth, blocking until the best move is
    /// known.
    pub fn search(&mut self, board: &Position, depth: u16) -> BitMove {
        self.start_search(board, depth);
        self.wait_for_finish();
        self.best_move()
    }

    /// Returns the best move of the last search: the head of the main thread's
    /// principal variation. Null if the root had no legal moves.
    pub fn best_move(&self) -> BitMove {
        self.main().get_best_move()
    }

    /// Returns the total number of nodes searched by all threads.
    pub fn nodes(&self) -> u64 {
        self.threads
            .iter()
            .map(|s| unsafe { &**s.get() })
            .map(|s: &Searcher| s.nodes.load(Ordering::Relaxed))
            .sum()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.kill_all();
    }
}

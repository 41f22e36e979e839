//! Module for the `TranspositionTable`, a type of hashmap where Zobrist keys
//! map to information about previously searched positions.
//!
//! The table is a single heap allocation of cache-line-aligned buckets, each
//! holding eight 16-byte entries. The bucket index is taken from a middle slice
//! of the Zobrist key; the full key plus a 16-bit secondary key serve as the
//! tag, keeping collisions intra-bucket.
//!
//! # Concurrency
//!
//! Entries are written without per-bucket locking. Readers accept the
//! occasional torn read: the secondary-key check plus the full Zobrist tag make
//! an undetected mismatch vanishingly rare, and searchers re-validate any move
//! read from the table before playing it.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::cell::UnsafeCell;
use std::mem;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::core::piece_move::BitMove;
use crate::tools::{prefetch_write, PreFetchable};

/// Value used to retrieve and store entries.
pub type Key = u64;

/// Number of entries per bucket.
pub const BUCKET_SIZE: usize = 8;

/// Mask of the 6-bit age field.
const AGE_MASK: u8 = 0b0011_1111;

const BYTES_PER_MB: usize = 1_000_000;

/// Designates the type of the bound stored with a node's score.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Bound {
    None = 0,
    /// The score is a lower bound (stored on a beta cutoff).
    Lower = 1,
    /// The score is an upper bound (the best score failed to raise alpha).
    Upper = 2,
    /// The score is exact.
    Exact = 3,
}

/// A singular entry of the table.
///
/// ```md,ignore
/// zobrist_key - 8 bytes
/// second_key  - 2 bytes
/// depth       - 1 byte
/// bound + age - 2 bits + 6 bits
/// score       - 2 bytes
/// move        - 2 bytes
///
/// total       - 16 bytes
/// ```
#[derive(Copy, Clone)]
#[repr(C)]
pub struct Entry {
    zobrist_key: Key,
    second_key: u16,
    depth: i8,
    bound_age: u8,
    score: i16,
    best_move: BitMove,
}

impl Entry {
    /// An entry is occupied once a search has stored a depth in it; search
    /// depths are always at least one.
    #[inline(always)]
    pub fn is_occupied(&self) -> bool {
        self.depth != 0
    }

    /// Returns the depth the entry was stored at.
    #[inline(always)]
    pub fn depth(&self) -> i8 {
        self.depth
    }

    /// Returns the entry's age stamp.
    #[inline(always)]
    pub fn age(&self) -> u8 {
        self.bound_age & AGE_MASK
    }

    /// Returns the entry's bound.
    #[inline(always)]
    pub fn bound(&self) -> Bound {
        unsafe { mem::transmute(self.bound_age >> 6) }
    }

    fn save(
        &mut self,
        zobrist_key: Key,
        second_key: u16,
        depth: i8,
        bound: Bound,
        age: u8,
        score: i16,
        best_move: BitMove,
    ) {
        self.zobrist_key = zobrist_key;
        self.second_key = second_key;
        self.depth = depth;
        self.bound_age = ((bound as u8) << 6) | (age & AGE_MASK);
        self.score = score;
        self.best_move = best_move;
    }
}

/// A copy of an entry's payload, decoupled from the table so that the caller
/// never holds a live reference into concurrently written memory.
#[derive(Copy, Clone)]
pub struct TableData {
    pub depth: i8,
    pub bound: Bound,
    pub score: i16,
    pub best_move: BitMove,
}

impl TableData {
    fn from_entry(entry: &Entry) -> TableData {
        TableData {
            depth: entry.depth,
            bound: entry.bound(),
            score: entry.score,
            best_move: entry.best_move,
        }
    }

    fn blank() -> TableData {
        TableData {
            depth: 0,
            bound: Bound::None,
            score: 0,
            best_move: BitMove::null(),
        }
    }
}

/// A deferred write handle over the entry selected by a probe, stamped with the
/// table's current age.
pub struct TableWriter {
    entry: *mut Entry,
    age: u8,
}

impl TableWriter {
    /// Stores all fields of the entry, stamping the table age the probe was
    /// made at.
    #[inline]
    pub fn write(
        &self,
        zobrist_key: Key,
        second_key: u16,
        depth: i8,
        bound: Bound,
        score: i16,
        best_move: BitMove,
    ) {
        unsafe {
            (*self.entry).save(zobrist_key, second_key, depth, bound, self.age, score, best_move);
        }
    }
}

/// A bucket of entries, all mapped to by the same slice of a Zobrist key and
/// aligned to a cache line.
#[repr(C, align(128))]
pub struct Bucket {
    entries: [Entry; BUCKET_SIZE],
}

/// A shared transposition table keyed on Zobrist hashes.
///
/// Lives for the lifetime of the process; between searches the table is aged
/// rather than cleared.
pub struct TranspositionTable {
    buckets: UnsafeCell<NonNull<Bucket>>,
    cap: UnsafeCell<usize>,
    age: AtomicU8,
}

unsafe impl Sync for TranspositionTable {}
unsafe impl Send for TranspositionTable {}

impl TranspositionTable {
    /// Creates a new `TranspositionTable` of around `mb_size` megabytes. The
    /// actual size is the nearest power of two number of buckets.
    ///
    /// # Panics
    ///
    /// `mb_size` must be greater than zero.
    pub fn new(mb_size: usize) -> Self {
        assert!(mb_size > 0);
        TranspositionTable::new_num_buckets((mb_size * BYTES_PER_MB) / mem::size_of::<Bucket>())
    }

    /// Creates a new `TranspositionTable` with a given number of buckets,
    /// rounded up to a power of two.
    pub fn new_num_buckets(num_buckets: usize) -> Self {
        let size: usize = num_buckets.next_power_of_two().max(1);
        TranspositionTable {
            buckets: UnsafeCell::new(alloc_buckets(size)),
            cap: UnsafeCell::new(size),
            age: AtomicU8::new(0),
        }
    }

    /// Returns the number of buckets the table holds.
    #[inline(always)]
    pub fn num_buckets(&self) -> usize {
        unsafe { *self.cap.get() }
    }

    /// Returns the number of entries the table holds.
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.num_buckets() * BUCKET_SIZE
    }

    /// Re-sizes the table to a given number of megabytes, clearing all data.
    ///
    /// # Safety
    ///
    /// Must not be called while any thread is probing the table.
    pub unsafe fn resize_to_megabytes(&self, mb_size: usize) {
        let num_buckets = ((mb_size * BYTES_PER_MB) / mem::size_of::<Bucket>())
            .next_power_of_two()
            .max(1);
        dealloc_buckets(*self.buckets.get(), *self.cap.get());
        *self.buckets.get() = alloc_buckets(num_buckets);
        *self.cap.get() = num_buckets;
    }

    /// Zeroes every entry of the table.
    ///
    /// # Safety
    ///
    /// Must not be called while any thread is probing the table.
    pub unsafe fn clear(&self) {
        let cap = *self.cap.get();
        let ptr = (*self.buckets.get()).as_ptr() as *mut u8;
        ptr.write_bytes(0, cap * mem::size_of::<Bucket>());
    }

    /// Called each time a new search is started: increments the 6-bit age
    /// counter. No entries are cleared.
    #[inline]
    pub fn new_search(&self) {
        let age = self.age.load(Ordering::Relaxed);
        self.age
            .store(age.wrapping_add(1) & AGE_MASK, Ordering::Relaxed);
    }

    /// Returns the current age of the table.
    #[inline(always)]
    pub fn age(&self) -> u8 {
        self.age.load(Ordering::Relaxed)
    }

    /// Probes the table for a given Zobrist key / secondary key pair.
    ///
    /// Returns, in order: whether an occupied entry with matching keys was
    /// found, a copy of that entry's data (blank on a miss), and a writer. On
    /// a hit the writer refers to the matching entry; otherwise it refers to an
    /// empty slot of the bucket if one exists, or else to the replacement
    /// victim: the occupied entry minimizing `depth - relative_age`.
    pub fn probe(&self, zobrist_key: Key, second_key: u16) -> (bool, TableData, TableWriter) {
        let age = self.age();
        unsafe {
            let bucket: *mut Bucket = self.bucket(zobrist_key);
            let first_entry: *mut Entry = (*bucket).entries.as_mut_ptr();

            let mut empty: Option<*mut Entry> = None;
            for i in 0..BUCKET_SIZE {
                let entry_ptr: *mut Entry = first_entry.add(i);
                let entry: &Entry = &*entry_ptr;

                if entry.is_occupied() {
                    if entry.zobrist_key == zobrist_key && entry.second_key == second_key {
                        return (
                            true,
                            TableData::from_entry(entry),
                            TableWriter {
                                entry: entry_ptr,
                                age,
                            },
                        );
                    }
                } else if empty.is_none() {
                    empty = Some(entry_ptr);
                }
            }

            if let Some(entry_ptr) = empty {
                return (
                    false,
                    TableData::blank(),
                    TableWriter {
                        entry: entry_ptr,
                        age,
                    },
                );
            }

            // Bucket is full: pick the entry least relevant to the current
            // search. Ties break toward the first entry scanned.
            let mut replacement: *mut Entry = first_entry;
            let mut replacement_score: i32 = self.replace_score(&*replacement, age);
            for i in 1..BUCKET_SIZE {
                let entry_ptr: *mut Entry = first_entry.add(i);
                let entry_score: i32 = self.replace_score(&*entry_ptr, age);
                if entry_score < replacement_score {
                    replacement = entry_ptr;
                    replacement_score = entry_score;
                }
            }
            (
                false,
                TableData::blank(),
                TableWriter {
                    entry: replacement,
                    age,
                },
            )
        }
    }

    #[inline(always)]
    fn replace_score(&self, entry: &Entry, age: u8) -> i32 {
        i32::from(entry.depth) - i32::from(age.wrapping_sub(entry.age()) & AGE_MASK)
    }

    /// Returns the bucket of a given key, indexed by a middle slice of the key.
    #[inline(always)]
    fn bucket(&self, key: Key) -> *mut Bucket {
        unsafe {
            let index: usize = ((key >> 16) & (*self.cap.get() as u64 - 1)) as usize;
            (*self.buckets.get()).as_ptr().add(index)
        }
    }
}

impl PreFetchable for TranspositionTable {
    /// Pre-fetches a particular bucket into the cache.
    #[inline(always)]
    fn prefetch(&self, key: u64) {
        prefetch_write(self.bucket(key));
    }
}

impl Drop for TranspositionTable {
    fn drop(&mut self) {
        unsafe {
            dealloc_buckets(*self.buckets.get(), *self.cap.get());
        }
    }
}

fn alloc_buckets(size: usize) -> NonNull<Bucket> {
    unsafe {
        let ptr = alloc_zeroed(Layout::array::<Bucket>(size).unwrap());
        NonNull::new(ptr as *mut Bucket).expect("transposition table allocation failed")
    }
}

unsafe fn dealloc_buckets(buckets: NonNull<Bucket>, size: usize) {
    dealloc(
        buckets.as_ptr() as *mut u8,
        Layout::array::<Bucket>(size).unwrap(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    // Builds a key landing in a predictable bucket for a small table.
    fn make_key(index: u64, tag: u64) -> Key {
        (index << 16) | (tag << 32)
    }

    #[test]
    fn entry_is_16_bytes() {
        assert_eq!(mem::size_of::<Entry>(), 16);
        assert_eq!(mem::size_of::<Bucket>(), 128);
    }

    #[test]
    fn probe_hit_and_miss() {
        let tt = TranspositionTable::new_num_buckets(64);
        let key = make_key(3, 0xABCD);

        let (hit, _data, writer) = tt.probe(key, 77);
        assert!(!hit);
        writer.write(key, 77, 4, Bound::Exact, 25, BitMove::new(0x0F0F));

        let (hit, data, _writer) = tt.probe(key, 77);
        assert!(hit);
        assert_eq!(data.depth, 4);
        assert_eq!(data.bound, Bound::Exact);
        assert_eq!(data.score, 25);
        assert_eq!(data.best_move.get_raw(), 0x0F0F);

        // Same zobrist key with a different secondary key misses.
        let (hit, _data, _writer) = tt.probe(key, 78);
        assert!(!hit);
    }

    #[test]
    fn replacement_takes_shallow_stale_entries() {
        let tt = TranspositionTable::new_num_buckets(2);
        let index = 1_u64;

        // Fill one bucket entirely at the current age.
        for tag in 0..BUCKET_SIZE as u64 {
            let key = make_key(index, tag + 1);
            let (hit, _data, writer) = tt.probe(key, tag as u16);
            assert!(!hit);
            let depth = if tag == 2 { 1 } else { 6 + tag as i8 };
            writer.write(key, tag as u16, depth, Bound::Lower, 0, BitMove::null());
        }

        // A fresh key must evict the shallowest entry (tag == 2, depth 1).
        let key = make_key(index, 100);
        let (hit, _data, writer) = tt.probe(key, 100);
        assert!(!hit);
        writer.write(key, 100, 10, Bound::Exact, 1, BitMove::null());

        let (hit, _data, _w) = tt.probe(make_key(index, 3), 2);
        assert!(!hit);
        let (hit, data, _w) = tt.probe(key, 100);
        assert!(hit);
        assert_eq!(data.depth, 10);
    }

    #[test]
    fn aging_prefers_older_entries_for_replacement() {
        let tt = TranspositionTable::new_num_buckets(2);
        let index = 0_u64;

        // All entries equal depth, but one stored before an age bump.
        let old_key = make_key(index, 55);
        let (_, _, writer) = tt.probe(old_key, 55);
        writer.write(old_key, 55, 5, Bound::Lower, 0, BitMove::null());

        tt.new_search();

        for tag in 0..(BUCKET_SIZE - 1) as u64 {
            let key = make_key(index, tag + 1);
            let (_, _, writer) = tt.probe(key, tag as u16);
            writer.write(key, tag as u16, 5, Bound::Lower, 0, BitMove::null());
        }

        // Bucket now full; the old-aged entry is the victim.
        let new_key = make_key(index, 77);
        let (hit, _, writer) = tt.probe(new_key, 77);
        assert!(!hit);
        writer.write(new_key, 77, 5, Bound::Exact, 0, BitMove::null());

        let (hit, _, _) = tt.probe(old_key, 55);
        assert!(!hit);
    }
}

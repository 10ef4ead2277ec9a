//! LL/SC Reservation Manager.
//!
//! This module tracks load-linked reservations at cache-line granularity.
//! One reservation exists per CPU (an architectural invariant, so the store
//! is a fixed-size array rather than a map). Any write to a reserved line,
//! by another CPU's store commit or by device DMA, must come through the
//! break paths here; a store-conditional succeeds iff the owning CPU's
//! reservation is still live on the matching line.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::constants::{CACHE_LINE_BYTES, MAX_CPUS};

/// Encodes "no reservation" in an entry word.
const EMPTY: u64 = 0;

/// Valid tag in bit 0 of an entry word; line addresses are 64-byte aligned,
/// so the low bits are free.
const VALID: u64 = 1;

/// Per-CPU reservation table.
///
/// Each entry holds `line_address | VALID`, updated with atomic RMWs so DMA
/// threads can break reservations concurrently with CPU claim/clear.
#[derive(Debug)]
pub struct ReservationManager {
    entries: [AtomicU64; MAX_CPUS],
    generations: [AtomicU64; MAX_CPUS],
}

impl Default for ReservationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationManager {
    /// Creates a table with no live reservations.
    pub fn new() -> Self {
        Self {
            entries: std::array::from_fn(|_| AtomicU64::new(EMPTY)),
            generations: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Records a reservation for `cpu` on the cache line containing `pa`,
    /// replacing any prior reservation on this CPU.
    pub fn set_reservation(&self, cpu: usize, pa: u64) {
        let line = pa & !(CACHE_LINE_BYTES - 1);
        let slot = cpu % MAX_CPUS;
        self.entries[slot].store(line | VALID, Ordering::Release);
        let _ = self.generations[slot].fetch_add(1, Ordering::Relaxed);
    }

    /// Attempts to consume `cpu`'s reservation for the line containing `pa`.
    ///
    /// Returns `true` and clears the entry iff the reservation is live and
    /// on the same cache line; this is the store-conditional success test.
    pub fn try_clear(&self, cpu: usize, pa: u64) -> bool {
        let line = pa & !(CACHE_LINE_BYTES - 1);
        let slot = cpu % MAX_CPUS;
        self.entries[slot]
            .compare_exchange(line | VALID, EMPTY, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Breaks every reservation whose cache line intersects `[pa, pa+size)`.
    pub fn invalidate_range(&self, pa: u64, size: u64) {
        if size == 0 {
            return;
        }
        let first = pa & !(CACHE_LINE_BYTES - 1);
        let last = pa.saturating_add(size - 1) & !(CACHE_LINE_BYTES - 1);
        for (slot, entry) in self.entries.iter().enumerate() {
            let cur = entry.load(Ordering::Acquire);
            if cur & VALID != 0 {
                let line = cur & !VALID;
                if line >= first && line <= last {
                    let _ = entry.compare_exchange(cur, EMPTY, Ordering::AcqRel, Ordering::Acquire);
                    let _ = self.generations[slot].fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Breaks every reservation on the cache line containing `pa`.
    pub fn break_on_cache_line(&self, pa: u64) {
        self.invalidate_range(pa & !(CACHE_LINE_BYTES - 1), CACHE_LINE_BYTES);
    }

    /// Returns whether `cpu` currently holds a live reservation.
    pub fn is_live(&self, cpu: usize) -> bool {
        self.entries[cpu % MAX_CPUS].load(Ordering::Acquire) & VALID != 0
    }

    /// Returns the line address of `cpu`'s reservation, if live.
    pub fn line_of(&self, cpu: usize) -> Option<u64> {
        let cur = self.entries[cpu % MAX_CPUS].load(Ordering::Acquire);
        (cur & VALID != 0).then_some(cur & !VALID)
    }

    /// Counts live reservations across all CPUs.
    pub fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.load(Ordering::Acquire) & VALID != 0)
            .count()
    }

    /// Clears every reservation (context switch path).
    pub fn clear_cpu(&self, cpu: usize) {
        let slot = cpu % MAX_CPUS;
        self.entries[slot].store(EMPTY, Ordering::Release);
        let _ = self.generations[slot].fetch_add(1, Ordering::Relaxed);
    }
}

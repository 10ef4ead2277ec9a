//! Per-CPU Interrupt Pending State.
//!
//! This module implements the cross-thread-safe pending set that devices,
//! timers, and IPI senders raise into and the owning CPU thread claims from.
//! It provides:
//! 1. **Atomic Pending Masks:** A 32-bit per-level summary plus one 64-bit
//!    source mask per IPL, release-on-write / acquire-on-read.
//! 2. **Highest-Level Cache:** A best-effort `highest_pending` byte used by the
//!    hot `has_deliverable` path; authoritative state is always re-derivable
//!    from the summary.
//! 3. **Claim Arbitration:** Edge sources are consumed on claim; level sources
//!    enter the in-service mask and stay pending until the device deasserts.
//!
//! Any thread may `raise`/`clear`; only the owning CPU thread may call
//! `claim_next`, `has_deliverable`, or read the in-service mask.

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};

use tracing::debug;

use crate::common::constants::{NUM_IPLS, NUM_IRQ_SOURCES};

/// Sentinel for "no level pending" in the highest-level cache.
const NO_LEVEL: u8 = 0xFF;

/// Interrupt trigger mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerMode {
    /// Edge-triggered: consumed by the claim.
    #[default]
    Edge,
    /// Level-triggered: stays pending until the device deasserts.
    Level,
}

/// Static per-source configuration, fixed before execution begins.
#[derive(Clone, Copy, Debug, Default)]
struct SourceConfig {
    ipl: u8,
    vector: u64,
    trigger: TriggerMode,
    registered: bool,
}

/// The result of a claim attempt.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClaimedInterrupt {
    /// Whether anything was claimed.
    pub valid: bool,
    /// Claimed source id.
    pub source: u32,
    /// IPL the source was claimed at.
    pub ipl: u8,
    /// SCB vector assigned to the source.
    pub vector: u64,
    /// Trigger mode of the source.
    pub trigger: TriggerMode,
}

/// Per-CPU interrupt pending state.
///
/// Invariant: summary bit `L` is set iff `pending_sources[L] != 0`, reconciled
/// after every claim and clear. The `highest_pending` cache may lag the truth
/// by one RMW but never exceeds the true highest pending level.
#[derive(Debug)]
#[repr(align(64))]
pub struct IrqPending {
    /// Bit `L` set ⇔ at least one source pending at IPL `L`.
    pending_levels: AtomicU32,
    /// One source bitmask per IPL.
    pending_sources: [AtomicU64; NUM_IPLS],
    /// Cached highest pending level; `0xFF` when none.
    highest_pending: AtomicU8,
    /// Level-triggered sources claimed but not yet deasserted.
    ///
    /// Owned by the CPU thread; relaxed ordering suffices because no other
    /// thread reads or writes it.
    in_service: AtomicU64,
    /// Static trigger/vector/IPL assignment per source.
    config: [SourceConfig; NUM_IRQ_SOURCES],
}

impl Default for IrqPending {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqPending {
    /// Creates an empty pending set with no sources registered.
    pub fn new() -> Self {
        Self {
            pending_levels: AtomicU32::new(0),
            pending_sources: std::array::from_fn(|_| AtomicU64::new(0)),
            highest_pending: AtomicU8::new(NO_LEVEL),
            in_service: AtomicU64::new(0),
            config: [SourceConfig::default(); NUM_IRQ_SOURCES],
        }
    }

    /// Registers a source's static configuration. One-time setup before
    /// execution; `id < 64`, `ipl < 32`.
    ///
    /// Returns `false` (and logs) on an out-of-range id or IPL.
    pub fn register_source(&mut self, id: u32, ipl: u8, vector: u64, trigger: TriggerMode) -> bool {
        if id as usize >= NUM_IRQ_SOURCES || ipl as usize >= NUM_IPLS {
            debug!(id, ipl, "irq source registration out of range");
            return false;
        }
        self.config[id as usize] = SourceConfig {
            ipl,
            vector,
            trigger,
            registered: true,
        };
        true
    }

    /// Marks a source pending at the given IPL. Callable from any thread.
    ///
    /// The source bit becomes visible strictly before the summary bit, so a
    /// claimer that observes the level also observes the source.
    pub fn raise(&self, id: u32, ipl: u8) {
        if id as usize >= NUM_IRQ_SOURCES || ipl as usize >= NUM_IPLS {
            debug!(id, ipl, "raise outside caller contract ignored");
            return;
        }
        let _ = self.pending_sources[ipl as usize].fetch_or(1 << id, Ordering::Release);
        let _ = self.pending_levels.fetch_or(1 << ipl, Ordering::Release);
        self.lift_highest(ipl);
    }

    /// Clears a pending source. The CPU thread additionally drops the
    /// in-service bit so the source becomes claimable again on re-raise.
    pub fn clear(&self, id: u32, ipl: u8) {
        if id as usize >= NUM_IRQ_SOURCES || ipl as usize >= NUM_IPLS {
            debug!(id, ipl, "clear outside caller contract ignored");
            return;
        }
        let remaining =
            self.pending_sources[ipl as usize].fetch_and(!(1 << id), Ordering::AcqRel) & !(1 << id);
        if remaining == 0 {
            let _ = self.pending_levels.fetch_and(!(1u32 << ipl), Ordering::AcqRel);
        }
        let _ = self.in_service.fetch_and(!(1 << id), Ordering::Relaxed);
        self.recompute_highest();
    }

    /// Returns whether any source is pending above the given PS IPL.
    ///
    /// The cached highest level answers the hot path; a miss falls back to
    /// the authoritative summary, because a recompute that lost its race
    /// with a concurrent raise can leave the cache below the true highest.
    /// The cache is an accelerator only and never suppresses delivery.
    #[inline(always)]
    pub fn has_deliverable(&self, ps_ipl: u8) -> bool {
        let hp = self.highest_pending.load(Ordering::Acquire);
        if hp != NO_LEVEL && hp > ps_ipl {
            return true;
        }
        if self.deliverable_mask(ps_ipl) != 0 {
            // Repair the lagging cache while we are here.
            self.recompute_highest();
            return true;
        }
        false
    }

    /// Returns the summary restricted to levels strictly above `ps_ipl`.
    pub fn deliverable_mask(&self, ps_ipl: u8) -> u32 {
        self.pending_levels.load(Ordering::Acquire) & Self::mask_higher_than(ps_ipl)
    }

    /// Returns whether a source is currently in service. CPU thread only.
    pub fn is_in_service(&self, id: u32) -> bool {
        self.in_service.load(Ordering::Relaxed) & (1 << id) != 0
    }

    /// Claims the highest-level deliverable source, if any.
    ///
    /// Selects the highest deliverable level, then the lowest-numbered source
    /// at that level that is not already in service. Edge sources have their
    /// pending bit consumed atomically; level sources enter the in-service
    /// mask and stay pending. When every source at the highest level is in
    /// service the claim fails without trying a lower level; the next poll
    /// after a device clear re-evaluates.
    pub fn claim_next(&self, ps_ipl: u8) -> ClaimedInterrupt {
        let deliverable = self.deliverable_mask(ps_ipl);
        if deliverable == 0 {
            return ClaimedInterrupt::default();
        }
        let level = 31 - deliverable.leading_zeros();

        let sources = self.pending_sources[level as usize].load(Ordering::Acquire);
        let candidates = sources & !self.in_service.load(Ordering::Relaxed);
        if candidates == 0 {
            return ClaimedInterrupt::default();
        }
        let source = candidates.trailing_zeros();
        let cfg = &self.config[source as usize];
        if !cfg.registered {
            debug!(source, level, "claim hit unregistered source");
        }

        match cfg.trigger {
            TriggerMode::Edge => {
                let remaining = self.pending_sources[level as usize]
                    .fetch_and(!(1 << source), Ordering::AcqRel)
                    & !(1 << source);
                if remaining == 0 {
                    let _ = self
                        .pending_levels
                        .fetch_and(!(1u32 << level), Ordering::AcqRel);
                }
            }
            TriggerMode::Level => {
                let _ = self.in_service.fetch_or(1 << source, Ordering::Relaxed);
            }
        }
        self.recompute_highest();

        ClaimedInterrupt {
            valid: true,
            source,
            ipl: level as u8,
            vector: cfg.vector,
            trigger: cfg.trigger,
        }
    }

    /// Zeroes all pending, in-service, and cached state. Source configuration
    /// is retained.
    pub fn reset(&self) {
        for mask in &self.pending_sources {
            mask.store(0, Ordering::Release);
        }
        self.pending_levels.store(0, Ordering::Release);
        self.in_service.store(0, Ordering::Relaxed);
        self.highest_pending.store(NO_LEVEL, Ordering::Release);
    }

    /// Bits `ps_ipl+1 ..= 31` of a level mask.
    #[inline(always)]
    fn mask_higher_than(ps_ipl: u8) -> u32 {
        if ps_ipl >= 31 {
            0
        } else {
            !((1u32 << (ps_ipl + 1)) - 1)
        }
    }

    /// CAS-raises the cached highest level toward `ipl`.
    fn lift_highest(&self, ipl: u8) {
        let mut cur = self.highest_pending.load(Ordering::Acquire);
        while cur == NO_LEVEL || cur < ipl {
            match self.highest_pending.compare_exchange_weak(
                cur,
                ipl,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
    }

    /// Re-derives the cached highest level from the authoritative summary.
    fn recompute_highest(&self) {
        let summary = self.pending_levels.load(Ordering::Acquire);
        let hp = if summary == 0 {
            NO_LEVEL
        } else {
            (31 - summary.leading_zeros()) as u8
        };
        self.highest_pending.store(hp, Ordering::Release);
    }
}

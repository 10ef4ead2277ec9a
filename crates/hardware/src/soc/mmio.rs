//! MMIO region registry and access dispatcher.
//!
//! This module routes guest physical accesses to emulated devices. It provides:
//! 1. **Region Registration:** Non-overlapping regions with width, alignment,
//!    endianness, and posted-write attributes; registration closes at
//!    finalization.
//! 2. **Dispatch:** Width/alignment enforcement and binary-search lookup over
//!    the finalized, sorted region set.
//! 3. **Posted Writes:** Per-CPU outstanding-posted-write accounting, drained
//!    by guest memory barriers.
//! 4. **Classification:** Human-readable tags for mapped and unmapped
//!    addresses, used by fault handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::warn;

use crate::common::constants::MAX_CPUS;
use crate::common::error::CoreError;

/// Allowed-width bit for byte accesses.
pub const WIDTH_1: u8 = 1 << 0;
/// Allowed-width bit for word accesses.
pub const WIDTH_2: u8 = 1 << 1;
/// Allowed-width bit for longword accesses.
pub const WIDTH_4: u8 = 1 << 2;
/// Allowed-width bit for quadword accesses.
pub const WIDTH_8: u8 = 1 << 3;
/// All access widths allowed.
pub const WIDTH_ANY: u8 = WIDTH_1 | WIDTH_2 | WIDTH_4 | WIDTH_8;

/// Register endianness declared by a region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Endianness {
    /// Registers are little-endian (no conversion).
    #[default]
    Little,
    /// Registers are big-endian; the dispatcher swaps bytes per access width.
    Big,
}

/// Dispatcher status taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MmioStatus {
    /// Handler invoked.
    Ok,
    /// Width not in {1, 2, 4, 8}, or `pa + width` overflows.
    OutOfRange,
    /// No region covers the access, or the width is not allowed by the region.
    AccessViolation,
    /// Natural alignment required and the offset is not aligned.
    Misaligned,
}

/// Device-side handler contract.
///
/// Handlers receive host-endian values and region-local offsets; the
/// dispatcher has already performed width, alignment, and endianness work.
/// A device-policy error (e.g. a read of a write-only register) is the
/// handler's to express (typically by returning zero or a sentinel) and is
/// not a dispatcher fault.
pub trait MmioHandler: Send + Sync {
    /// Reads `width` bytes at `offset` within the region.
    fn read(&self, offset: u64, width: u8) -> u64;

    /// Writes `width` bytes at `offset` within the region.
    fn write(&self, offset: u64, value: u64, width: u8);
}

/// Static description of one MMIO region.
#[derive(Clone, Debug)]
pub struct RegionDesc {
    /// Base physical address.
    pub base: u64,
    /// Region size in bytes; zero is rejected.
    pub size: u64,
    /// Bitmask of allowed access widths (`WIDTH_*`).
    pub widths: u8,
    /// Whether accesses must be naturally aligned.
    pub natural_alignment: bool,
    /// Whether writes are posted (counted until drained by a barrier).
    pub posted_writes: bool,
    /// Register endianness.
    pub endianness: Endianness,
    /// Owning device UID.
    pub device_uid: u64,
    /// PCI hose / domain id.
    pub hose: u32,
}

#[derive(Clone)]
struct Region {
    desc: RegionDesc,
    end: u64,
    handler: Arc<dyn MmioHandler>,
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("desc", &self.desc)
            .field("end", &self.end)
            .finish_non_exhaustive()
    }
}

/// Sorted, finalizable set of non-overlapping MMIO regions.
///
/// Registration happens during device initialization on an exclusive
/// reference; `finalize` is a one-way barrier after which the set is
/// immutable, sorted, and shared read-only across all threads.
#[derive(Debug)]
pub struct MmioRegistry {
    regions: Vec<Region>,
    finalized: bool,
    posted: [AtomicU32; MAX_CPUS],
}

impl Default for MmioRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MmioRegistry {
    /// Creates an empty, unfinalized registry.
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            finalized: false,
            posted: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    /// Registers a region with its handler.
    ///
    /// # Errors
    ///
    /// Rejected (with a warning) after finalization, on overlap with an
    /// existing region, on zero size, on an empty width set, or when
    /// `base + size` overflows.
    pub fn register_region(
        &mut self,
        desc: RegionDesc,
        handler: Arc<dyn MmioHandler>,
    ) -> Result<(), CoreError> {
        let reject = |reason: &'static str, desc: &RegionDesc| {
            warn!(
                base = format_args!("{:#x}", desc.base),
                size = desc.size,
                uid = desc.device_uid,
                reason,
                "mmio region rejected"
            );
            Err(CoreError::RegionRejected(reason))
        };

        if self.finalized {
            return reject("registry already finalized", &desc);
        }
        if desc.size == 0 {
            return reject("zero-sized region", &desc);
        }
        if desc.widths & WIDTH_ANY == 0 {
            return reject("no access widths allowed", &desc);
        }
        let Some(end) = desc.base.checked_add(desc.size) else {
            return reject("base + size overflows", &desc);
        };
        if self
            .regions
            .iter()
            .any(|r| desc.base < r.end && r.desc.base < end)
        {
            return reject("overlaps an existing region", &desc);
        }

        self.regions.push(Region { desc, end, handler });
        Ok(())
    }

    /// Sorts the region set and closes registration.
    pub fn finalize(&mut self) {
        self.regions.sort_by_key(|r| r.desc.base);
        self.finalized = true;
    }

    /// Returns whether the registry has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Returns whether any registered region covers `[pa, pa+width)`.
    pub fn covers(&self, pa: u64, width: u64) -> bool {
        pa.checked_add(width)
            .is_some_and(|_| self.find(pa, width).is_some())
    }

    fn find(&self, pa: u64, width: u64) -> Option<&Region> {
        let candidate = if self.finalized {
            // upper_bound(base) - 1, then point-in-range check.
            let idx = self.regions.partition_point(|r| r.desc.base <= pa);
            if idx == 0 {
                return None;
            }
            &self.regions[idx - 1]
        } else {
            self.regions
                .iter()
                .find(|r| pa >= r.desc.base && pa < r.end)?
        };
        (pa >= candidate.desc.base && pa.checked_add(width)? <= candidate.end).then_some(candidate)
    }

    fn check(&self, pa: u64, width: u8) -> Result<&Region, MmioStatus> {
        if !matches!(width, 1 | 2 | 4 | 8) || pa.checked_add(u64::from(width)).is_none() {
            return Err(MmioStatus::OutOfRange);
        }
        let region = self
            .find(pa, u64::from(width))
            .ok_or(MmioStatus::AccessViolation)?;
        if region.desc.widths & width == 0 {
            return Err(MmioStatus::AccessViolation);
        }
        if region.desc.natural_alignment && pa % u64::from(width) != 0 {
            return Err(MmioStatus::Misaligned);
        }
        Ok(region)
    }

    /// Dispatches a read of `width` bytes at `pa` into `out`.
    pub fn handle_read(&self, pa: u64, width: u8, out: &mut u64) -> MmioStatus {
        match self.check(pa, width) {
            Err(status) => status,
            Ok(region) => {
                let raw = region.handler.read(pa - region.desc.base, width);
                *out = match region.desc.endianness {
                    Endianness::Little => raw,
                    Endianness::Big => swap_width(raw, width),
                };
                MmioStatus::Ok
            }
        }
    }

    /// Dispatches a write of `width` bytes at `pa` on behalf of `cpu`.
    ///
    /// Writes to posted regions increment the CPU's outstanding-posted-write
    /// counter; a guest memory barrier drains it via [`MmioRegistry::drain`].
    pub fn handle_write(&self, cpu: usize, pa: u64, width: u8, value: u64) -> MmioStatus {
        match self.check(pa, width) {
            Err(status) => status,
            Ok(region) => {
                let cooked = match region.desc.endianness {
                    Endianness::Little => value,
                    Endianness::Big => swap_width(value, width),
                };
                region.handler.write(pa - region.desc.base, cooked, width);
                if region.desc.posted_writes {
                    let _ = self.posted[cpu % MAX_CPUS].fetch_add(1, Ordering::Release);
                }
                MmioStatus::Ok
            }
        }
    }

    /// Drains the CPU's posted writes to zero. This is the synchronization
    /// point for guest memory barriers.
    pub fn drain(&self, cpu: usize) {
        self.posted[cpu % MAX_CPUS].store(0, Ordering::Release);
    }

    /// Reports the CPU's outstanding posted-write count.
    pub fn pending_count(&self, cpu: usize) -> u32 {
        self.posted[cpu % MAX_CPUS].load(Ordering::Acquire)
    }

    /// Returns a human-readable classification of a physical address.
    pub fn classify_pa(&self, pa: u64) -> String {
        self.find(pa, 1).map_or_else(
            || format!("unmapped pa={pa:#x}"),
            |r| {
                format!(
                    "mmio uid={:#x} hose={} offset={:#x}",
                    r.desc.device_uid,
                    r.desc.hose,
                    pa - r.desc.base
                )
            },
        )
    }
}

/// Reverses the byte order of `value` within `width` bytes.
fn swap_width(value: u64, width: u8) -> u64 {
    match width {
        2 => u64::from((value as u16).swap_bytes()),
        4 => u64::from((value as u32).swap_bytes()),
        8 => value.swap_bytes(),
        _ => value,
    }
}

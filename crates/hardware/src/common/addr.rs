//! Physical and Virtual Address types.
//!
//! This module defines strong types for physical and virtual addresses to prevent
//! accidental mixing of address spaces. It provides the following:
//! 1. **Type Safety:** Distinguishes between virtual and physical address spaces at compile time.
//! 2. **VA Canonicalization:** 43-bit sign extension as performed by the EV6 D-box.
//! 3. **Kseg Window:** Recognition and translation of the PAL-mode kseg region.
//! 4. **Cache Lines:** 64-byte line arithmetic used by reservations and DMA coherency.

use crate::common::constants::{CACHE_LINE_BYTES, CACHE_LINE_SHIFT};

/// Number of implemented virtual address bits on EV6.
pub const VA_BITS: u32 = 43;

/// Kseg region selector: canonical VAs whose bits `42:41` equal `0b10` map
/// linearly onto physical memory while in PAL mode.
const KSEG_SELECT: u64 = 0b10;

/// Mask of the physical bits carried by a kseg virtual address (bits `40:0`).
const KSEG_PA_MASK: u64 = (1 << 41) - 1;

/// A virtual address in the Alpha address space.
///
/// Virtual addresses are produced by guest software and must be canonical:
/// bits `63:43` replicate bit 42. Non-canonical addresses are folded by
/// [`VirtAddr::canonical`] before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtAddr(pub u64);

/// A physical address in the Alpha address space.
///
/// Physical addresses select RAM, registered MMIO regions, or unmapped space
/// and are used after translation has completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhysAddr(pub u64);

/// Sign-extends a 43-bit virtual address: bits `63:43` replicate bit 42.
///
/// Idempotent: `sext_va(sext_va(va)) == sext_va(va)` for every input.
#[inline(always)]
pub fn sext_va(va: u64) -> u64 {
    ((va << (64 - VA_BITS)) as i64 >> (64 - VA_BITS)) as u64
}

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub fn val(&self) -> u64 {
        self.0
    }

    /// Returns the canonical (43-bit sign-extended) form of this address.
    #[inline(always)]
    pub fn canonical(&self) -> Self {
        Self(sext_va(self.0))
    }

    /// Returns whether this address lies in the kseg window (bits `42:41` = `0b10`).
    pub fn is_kseg(&self) -> bool {
        (sext_va(self.0) >> 41) & 0b11 == KSEG_SELECT
    }

    /// Translates a kseg virtual address to its physical address.
    ///
    /// Returns `None` when the address is not in the kseg window.
    pub fn kseg_to_pa(&self) -> Option<PhysAddr> {
        if self.is_kseg() {
            Some(PhysAddr(self.0 & KSEG_PA_MASK))
        } else {
            None
        }
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub fn val(&self) -> u64 {
        self.0
    }

    /// Returns the address of the cache line containing this address.
    #[inline(always)]
    pub fn cache_line(&self) -> u64 {
        self.0 & !(CACHE_LINE_BYTES - 1)
    }

    /// Returns the cache-line index (line address shifted down).
    #[inline(always)]
    pub fn line_index(&self) -> u64 {
        self.0 >> CACHE_LINE_SHIFT
    }
}

//! PAL Shadow Register Banks.
//!
//! Two register banks that transparently replace a subset of the GPRs while
//! PAL shadow mode is enabled: R4-R7 resolve to the head of bank 0 and
//! R20-R23 to the head of bank 1, so PALcode gets private scratch without
//! spilling the interrupted context. The remaining bank entries are
//! PAL-private state reachable only through the explicit bank accessors.
//! The banks are excluded from the context-switch snapshot.

use crate::common::constants::{SHADOW_BANK0_LEN, SHADOW_BANK1_LEN};

/// PAL shadow register banks (27 and 23 entries).
///
/// Out-of-range bank or index accesses read 0 and discard writes; PALcode
/// never generates them, so they carry no fault semantics.
#[derive(Clone, Debug)]
#[repr(align(64))]
pub struct PalShadow {
    bank0: [u64; SHADOW_BANK0_LEN],
    bank1: [u64; SHADOW_BANK1_LEN],
    enabled: bool,
}

impl Default for PalShadow {
    fn default() -> Self {
        Self::new()
    }
}

impl PalShadow {
    /// Creates zeroed shadow banks with shadowing disabled.
    pub fn new() -> Self {
        Self {
            bank0: [0; SHADOW_BANK0_LEN],
            bank1: [0; SHADOW_BANK1_LEN],
            enabled: false,
        }
    }

    /// Maps a GPR number to the shadow bank entry that replaces it while
    /// shadowing is enabled: R4-R7 to bank 0 entries 0-3, R20-R23 to bank 1
    /// entries 0-3. Everything else stays in the architectural file.
    #[inline(always)]
    pub fn shadows(reg: usize) -> Option<(usize, usize)> {
        match reg {
            4..=7 => Some((0, reg - 4)),
            20..=23 => Some((1, reg - 20)),
            _ => None,
        }
    }

    /// Reads a shadow register; out-of-range bank/index returns 0.
    pub fn read(&self, bank: usize, idx: usize) -> u64 {
        match bank {
            0 if idx < SHADOW_BANK0_LEN => self.bank0[idx],
            1 if idx < SHADOW_BANK1_LEN => self.bank1[idx],
            _ => 0,
        }
    }

    /// Writes a shadow register; out-of-range bank/index writes are discarded.
    pub fn write(&mut self, bank: usize, idx: usize, val: u64) {
        match bank {
            0 if idx < SHADOW_BANK0_LEN => self.bank0[idx] = val,
            1 if idx < SHADOW_BANK1_LEN => self.bank1[idx] = val,
            _ => {}
        }
    }

    /// Returns whether shadow mode is enabled.
    #[inline(always)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables shadow mode. Bank contents persist across toggles.
    #[inline(always)]
    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
    }

    /// Zeroes both banks and disables shadowing.
    pub fn reset(&mut self) {
        self.bank0 = [0; SHADOW_BANK0_LEN];
        self.bank1 = [0; SHADOW_BANK1_LEN];
        self.enabled = false;
    }
}

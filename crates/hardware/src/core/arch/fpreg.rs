//! Floating-Point Register File.
//!
//! This module implements the floating-point register file and the FPCR.
//! It performs the following:
//! 1. **Storage:** 31 stored 64-bit FP registers; `F31` is hardwired zero.
//! 2. **Control:** The 64-bit floating-point control register (FPCR).
//! 3. **Invariant Enforcement:** Reads of `F31` return 0; writes are discarded.

use crate::common::constants::{NUM_FP_REGS, REG_ZERO};

/// Floating-point register file plus FPCR, one cache line group per CPU.
#[derive(Clone, Debug)]
#[repr(align(64))]
pub struct FloatRegs {
    regs: [u64; NUM_FP_REGS],
    fpcr: u64,
}

impl Default for FloatRegs {
    fn default() -> Self {
        Self::new()
    }
}

impl FloatRegs {
    /// Creates a new FP register file with all registers and the FPCR zeroed.
    pub fn new() -> Self {
        Self {
            regs: [0; NUM_FP_REGS],
            fpcr: 0,
        }
    }

    /// Reads an FP register value. `F31` always returns 0.
    #[inline(always)]
    pub fn read(&self, idx: usize) -> u64 {
        if idx >= REG_ZERO { 0 } else { self.regs[idx] }
    }

    /// Writes a value to an FP register. Writes to `F31` are discarded.
    #[inline(always)]
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx < REG_ZERO {
            self.regs[idx] = val;
        }
    }

    /// Reads the floating-point control register.
    #[inline(always)]
    pub fn read_fpcr(&self) -> u64 {
        self.fpcr
    }

    /// Writes the floating-point control register.
    #[inline(always)]
    pub fn write_fpcr(&mut self, val: u64) {
        self.fpcr = val;
    }

    /// Zeroes every register and the FPCR.
    pub fn reset(&mut self) {
        self.regs = [0; NUM_FP_REGS];
        self.fpcr = 0;
    }
}

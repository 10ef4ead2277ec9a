//! Integer Register File.
//!
//! This module implements the integer register file for the Alpha architecture.
//! It performs the following:
//! 1. **Storage:** Maintains 32 integer registers (`R0`-`R31`).
//! 2. **Invariant Enforcement:** Ensures that register `R31` is hardwired to zero.
//! 3. **Debugging:** Provides utilities for dumping the complete register state.

use crate::common::constants::{NUM_INT_REGS, REG_ZERO};

/// Integer register file, one cache line group per CPU.
///
/// Contains 32 integer registers. Register `R31` is hardwired to zero: reads
/// return 0 and writes are discarded.
#[derive(Clone, Debug)]
#[repr(align(64))]
pub struct IntRegs {
    regs: [u64; NUM_INT_REGS],
}

impl Default for IntRegs {
    fn default() -> Self {
        Self::new()
    }
}

impl IntRegs {
    /// Creates a new integer register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            regs: [0; NUM_INT_REGS],
        }
    }

    /// Reads an integer register value. `R31` always returns 0.
    #[inline(always)]
    pub fn read(&self, idx: usize) -> u64 {
        if idx == REG_ZERO { 0 } else { self.regs[idx & 31] }
    }

    /// Writes a value to an integer register. Writes to `R31` are discarded.
    #[inline(always)]
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != REG_ZERO {
            self.regs[idx & 31] = val;
        }
    }

    /// Zeroes every register.
    pub fn reset(&mut self) {
        self.regs = [0; NUM_INT_REGS];
    }

    /// Dumps the contents of all integer registers to stderr.
    pub fn dump(&self) {
        for i in (0..NUM_INT_REGS).step_by(2) {
            eprintln!(
                "R{:<2}={:#018x} R{:<2}={:#018x}",
                i,
                self.read(i),
                i + 1,
                self.read(i + 1)
            );
        }
    }
}

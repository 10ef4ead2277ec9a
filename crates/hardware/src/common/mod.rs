//! Common types shared across the emulator core.
//!
//! This module gathers the basic vocabulary of the core. It provides:
//! 1. **Addresses:** Strong virtual/physical address types, kseg helpers, cache lines.
//! 2. **Data manipulation:** Sign extension, AST nibble packing, S/T float conversion.
//! 3. **Constants:** PAL entry offsets, IPL bounds, cache geometry.
//! 4. **Errors:** Architectural trap classes, machine-check reasons, halt codes, and
//!    the host-level `CoreError`.

/// Physical and virtual address types, kseg window, cache-line arithmetic.
pub mod addr;

/// Global system constants.
pub mod constants;

/// Bit-level data manipulation helpers.
pub mod data;

/// Trap classes, machine-check reasons, halt codes, and host errors.
pub mod error;

pub use addr::{PhysAddr, VirtAddr};
pub use error::{ArithTrap, CoreError, HaltCode, MchkReason, TrapClass};

//! Global System Constants.
//!
//! This module defines system-wide constants used across the emulator. It includes:
//! 1. **Cache Geometry:** Line size shared by reservations and DMA coherency.
//! 2. **PAL Entry Offsets:** EV6 exception vector identifiers within the PAL image.
//! 3. **IPL Constants:** Priority-level bounds for interrupt delivery and ASTs.
//! 4. **SCB Constants:** System Control Block entry layout.

/// Cache line size in bytes. Reservation granularity and DMA coherency both
/// operate on this grain.
pub const CACHE_LINE_BYTES: u64 = 64;

/// Number of bits to shift to convert between byte addresses and line indices.
pub const CACHE_LINE_SHIFT: u64 = 6;

/// Maximum number of emulated CPUs. CPU ids fold modulo this value.
pub const MAX_CPUS: usize = 4;

/// Number of integer registers; register 31 is hardwired zero.
pub const NUM_INT_REGS: usize = 32;

/// Number of floating-point registers (F31 is hardwired zero and not stored).
pub const NUM_FP_REGS: usize = 31;

/// The hardwired-zero register number.
pub const REG_ZERO: usize = 31;

/// Entries in PAL shadow bank 0.
pub const SHADOW_BANK0_LEN: usize = 27;

/// Entries in PAL shadow bank 1.
pub const SHADOW_BANK1_LEN: usize = 23;

/// Highest interrupt priority level. Claims at this level always fail.
pub const IPL_MAX: u8 = 31;

/// Number of distinct interrupt priority levels.
pub const NUM_IPLS: usize = 32;

/// Maximum number of interrupt sources per CPU.
pub const NUM_IRQ_SOURCES: usize = 64;

/// Highest IPL at which ASTs remain deliverable.
pub const AST_IPL_LIMIT: u8 = 2;

/// EV6 PAL entry offsets (vector identifiers passed to `compute_exception_vector`).
///
/// These are the hardware vector displacements within the PAL image, per the
/// 21264 hardware reference. Bit 0 of every computed vector PC is the PAL-mode tag.
pub mod pal_vector {
    /// Double DTB miss, three-level walk.
    pub const DTBM_DOUBLE_3: u64 = 0x100;
    /// Double DTB miss, four-level walk.
    pub const DTBM_DOUBLE_4: u64 = 0x180;
    /// Floating-point disabled (FEN) fault.
    pub const FEN: u64 = 0x200;
    /// Unaligned data reference.
    pub const UNALIGN: u64 = 0x280;
    /// Single DTB miss.
    pub const DTBM_SINGLE: u64 = 0x300;
    /// Data fault (access violation, fault-on-read/write).
    pub const DFAULT: u64 = 0x380;
    /// Illegal or privileged opcode.
    pub const OPCDEC: u64 = 0x400;
    /// Instruction-stream access violation.
    pub const IACV: u64 = 0x480;
    /// Machine check.
    pub const MCHK: u64 = 0x500;
    /// Instruction TB miss.
    pub const ITB_MISS: u64 = 0x580;
    /// Arithmetic trap.
    pub const ARITH: u64 = 0x600;
    /// Interrupt delivery.
    pub const INTERRUPT: u64 = 0x680;
    /// MT_FPCR synchronization trap.
    pub const MT_FPCR: u64 = 0x700;
    /// Reset entry.
    pub const RESET: u64 = 0x780;
}

/// SCB entry stride in bytes: one quadword per vector, low 2 bits carrying
/// the stack disposition.
pub const SCB_ENTRY_BYTES: u64 = 8;

/// SCB vector assigned to software interrupt level `n` (1..=15).
pub const fn swi_scb_vector(level: u8) -> u64 {
    0x80 + (level as u64) * 0x10
}

/// CALL_PAL function code for the privileged HALT entry.
pub const PAL_FUNC_HALT: u32 = 0x00;

/// CALL_PAL function code for OSF/1 `callsys`.
pub const PAL_FUNC_CALLSYS: u32 = 0x83;

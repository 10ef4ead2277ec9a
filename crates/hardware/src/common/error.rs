//! Trap classes, machine-check reasons, halt codes, and host errors.
//!
//! This module defines the error vocabulary of the core. It provides:
//! 1. **Trap Representation:** The closed set of architectural fault classes
//!    carried on pipeline slots and dispatched through PAL.
//! 2. **Machine Checks:** The sub-reason byte passed to the MCHK handler.
//! 3. **Halt Codes:** Reasons the run loop parks a CPU.
//! 4. **Host Errors:** `CoreError` for contract violations and unrecoverable
//!    host conditions; integrates with standard Rust error traits.

use std::fmt;
use thiserror::Error;

/// Arithmetic trap sub-kinds, with their EXC_SUM bit positions.
///
/// EXC_SUM carries one flag per sub-kind in bits `16:10`; arithmetic units OR
/// in their bit on detection and PAL clears the field on service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ArithTrap {
    /// Software completion requested.
    Swc = 10,
    /// Invalid operation.
    Inv = 11,
    /// Division by zero.
    Dze = 12,
    /// Floating overflow.
    Fov = 13,
    /// Floating underflow.
    Unf = 14,
    /// Inexact result.
    Ine = 15,
    /// Integer overflow.
    Iov = 16,
}

impl ArithTrap {
    /// Returns the EXC_SUM bit mask for this sub-kind.
    #[inline(always)]
    pub fn exc_sum_bit(self) -> u64 {
        1 << (self as u8)
    }
}

/// Machine-check sub-reasons, one byte each, passed to the MCHK handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MchkReason {
    /// Processor-detected internal error.
    Processor = 0x01,
    /// System-detected error.
    System = 0x02,
    /// Instruction-cache parity error.
    ICacheParity = 0x03,
    /// Data-cache parity error.
    DCacheParity = 0x04,
    /// Board-level cache parity error.
    BCacheParity = 0x05,
    /// Secondary-cache parity error.
    SCacheParity = 0x06,
    /// Cache tag error.
    CacheTag = 0x07,
    /// Cache coherency protocol error.
    CacheCoherency = 0x08,
    /// Uncorrectable memory error.
    MemoryUncorrectable = 0x09,
    /// Correctable memory error.
    MemoryCorrectable = 0x0A,
    /// Memory controller error.
    MemoryController = 0x0B,
    /// Memory bus error.
    MemoryBus = 0x0C,
    /// I/O bus error.
    IoBus = 0x0D,
    /// Execution-unit error.
    ExecutionUnit = 0x0E,
    /// Register-file parity error.
    RegisterFileParity = 0x0F,
    /// Pipeline sequencing error.
    Pipeline = 0x10,
    /// Control-logic error.
    ControlLogic = 0x11,
    /// MMU or TLB consistency error.
    MmuTlb = 0x12,
    /// TLB entry insertion failure.
    TlbInsertion = 0x13,
    /// Interprocessor communication error.
    Interprocessor = 0x14,
    /// Thermal envelope exceeded.
    Thermal = 0x15,
    /// Power supply fault.
    Power = 0x16,
    /// Clock distribution fault.
    Clock = 0x17,
    /// PALcode-detected inconsistency.
    Palcode = 0x18,
    /// Machine check raised while servicing a machine check.
    DoubleMachineCheck = 0x19,
    /// SMP barrier timeout.
    SmpBarrierTimeout = 0x1A,
}

/// Architectural fault classes recognized by the pipeline and dispatched via PAL.
///
/// A fault is recorded on the slot at the stage that detects it, propagated to
/// that slot's writeback, and never terminates the host process. Slots carry
/// `Option<TrapClass>`, so absence needs no variant; integer overflow is the
/// [`ArithTrap::Iov`] sub-kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapClass {
    /// Arithmetic trap with its sub-kind.
    Arith(ArithTrap),
    /// Data TB miss.
    DtbMiss,
    /// Data translation fault.
    DtbFault,
    /// Data access violation.
    DtbAcv,
    /// Floating-point unit disabled (FEN clear).
    FpDisabled,
    /// Illegal instruction encoding.
    IllegalOpcode,
    /// Reserved instruction encoding.
    ReservedOpcode,
    /// Privilege violation (e.g. privileged CALL_PAL from non-kernel mode).
    PrivViolation,
    /// Alignment fault on a natural-alignment-required access.
    Alignment,
    /// Unaligned data reference (fixable by PAL).
    Unaligned,
    /// Floating-point enable fault on FP register access.
    FpEnableFault,
    /// Generic translation fault.
    TranslationFault,
    /// Instruction TB miss.
    ItbMiss,
    /// Instruction translation fault.
    ItbFault,
    /// Instruction-stream access violation.
    ItbAcv,
    /// Misaligned instruction fetch address.
    ItbMisalign,
    /// Machine check with its sub-reason.
    MachineCheck(MchkReason),
}

impl TrapClass {
    /// Returns the PAL vector identifier this fault dispatches through.
    pub fn pal_vector(self) -> u64 {
        use crate::common::constants::pal_vector as v;
        match self {
            Self::Arith(_) => v::ARITH,
            Self::DtbMiss => v::DTBM_SINGLE,
            Self::DtbFault | Self::DtbAcv | Self::TranslationFault => v::DFAULT,
            Self::FpDisabled | Self::FpEnableFault => v::FEN,
            Self::IllegalOpcode | Self::ReservedOpcode | Self::PrivViolation => v::OPCDEC,
            Self::Alignment | Self::Unaligned => v::UNALIGN,
            Self::ItbMiss => v::ITB_MISS,
            Self::ItbFault | Self::ItbAcv | Self::ItbMisalign => v::IACV,
            Self::MachineCheck(_) => v::MCHK,
        }
    }
}

impl fmt::Display for TrapClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arith(k) => write!(f, "Arith({k:?})"),
            Self::MachineCheck(r) => write!(f, "MachineCheck({r:?})"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl std::error::Error for TrapClass {}

/// Reasons the run loop parks a CPU thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltCode {
    /// Operator-requested halt (CALL_PAL HALT).
    OperatorHalt,
    /// PALcode bugcheck.
    KsegBugcheck,
    /// Machine check taken while MCES says one is already in progress.
    DoubleMachineCheck,
    /// Powerfail restart pending.
    PowerfailRestart,
    /// Reset requested.
    Reset,
}

/// Host-level errors: contract violations and unrecoverable conditions.
///
/// Contract violations are rejected synchronously and logged; they never
/// crash the emulator. Unrecoverable variants terminate the process from
/// the top of the run loop.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A register index outside the architectural file was requested.
    #[error("impossible register id {0}")]
    InvalidRegister(usize),

    /// An interrupt source id or IPL outside the configured range.
    #[error("invalid interrupt source {id} at ipl {ipl}")]
    InvalidIrqSource {
        /// Offending source id.
        id: u32,
        /// Offending priority level.
        ipl: u8,
    },

    /// MMIO region registration rejected.
    #[error("mmio region rejected: {0}")]
    RegionRejected(&'static str),

    /// Guest RAM could not be allocated.
    #[error("guest RAM allocation of {0} bytes failed")]
    RamAllocation(usize),

    /// Configuration parse failure.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

//! The decoded-grain contract.
//!
//! The instruction decoder is an external collaborator; what crosses the
//! boundary is a *grain*: a decoded-instruction descriptor plus an execute
//! entry point. This module defines:
//! 1. **`DecodedInst`:** Operand fields and control signals the stages consult.
//! 2. **`ExecUnit`:** The fixed set of execution-unit resource classes; grain
//!    dispatch is a match over this sum type, with no dynamic allocation on
//!    the hot path.
//! 3. **`Grain`:** The `(unit, execute)` pair the I-box attaches to a fetch.
//! 4. **`FetchResult`:** The 1-deep handoff record from the fetch producer.

use crate::core::cpu::Cpu;
use crate::core::pipeline::slot::Slot;

/// Execution-unit resource classes.
///
/// Integer/branch, memory, and float are disjoint issue classes; PAL/misc
/// and cache maintenance each form their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecUnit {
    /// Integer execution box (ALU, branches).
    #[default]
    EBox,
    /// Floating-point box.
    FBox,
    /// Memory box (loads, stores, LL/SC, barriers).
    MBox,
    /// Cache/box-control maintenance.
    CBox,
    /// PAL and miscellaneous serializing instructions.
    PalBox,
}

/// Memory access width in bytes (0 = no memory operation).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemWidth {
    /// No memory operation.
    #[default]
    None,
    /// 8-bit byte access.
    Byte,
    /// 16-bit word access.
    Word,
    /// 32-bit longword access.
    Long,
    /// 64-bit quadword access.
    Quad,
}

impl MemWidth {
    /// Width in bytes; 0 for `None`.
    pub fn bytes(self) -> u64 {
        match self {
            Self::None => 0,
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
            Self::Quad => 8,
        }
    }
}

/// Memory barrier kinds requiring posted-write drains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierKind {
    /// Full memory barrier (MB).
    Mb,
    /// Write memory barrier (WMB).
    Wmb,
}

/// Serialization requirement carried by a grain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerializeClass {
    /// No ordering requirement beyond program order.
    #[default]
    None,
    /// Must issue alone with all older slots drained (CALL_PAL, HW_REI).
    Full,
}

/// Control signals derived at decode, consulted by the stages.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlSignals {
    /// Instruction is a conditional branch.
    pub cond_branch: bool,
    /// Instruction is an unconditional branch (BR/BSR).
    pub uncond_branch: bool,
    /// Instruction is a register-indirect jump (JMP/JSR/RET).
    pub jump: bool,
    /// Instruction writes a link (return) address into Ra.
    pub links: bool,
    /// Instruction loads from memory.
    pub mem_read: bool,
    /// Instruction stores to memory.
    pub mem_write: bool,
    /// Load-locked variant.
    pub load_locked: bool,
    /// Store-conditional variant.
    pub store_cond: bool,
    /// Memory access width.
    pub width: MemWidth,
    /// Instruction writes an integer destination.
    pub int_write: bool,
    /// Instruction writes an FP destination.
    pub fp_write: bool,
    /// Instruction is CALL_PAL.
    pub call_pal: bool,
    /// Barrier requirement, if any.
    pub barrier: Option<BarrierKind>,
    /// Serialization class.
    pub serialize: SerializeClass,
}

/// A decoded instruction: the grain descriptor's data half.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodedInst {
    /// Raw 32-bit encoding, when known.
    pub raw: u32,
    /// Major opcode.
    pub opcode: u8,
    /// Operand register Ra.
    pub ra: u8,
    /// Operand register Rb.
    pub rb: u8,
    /// Destination register Rc (operate format).
    pub rc: u8,
    /// 16-bit memory displacement (raw field).
    pub disp16: u32,
    /// 21-bit branch displacement (raw field).
    pub disp21: u32,
    /// Function code (operate/CALL_PAL formats).
    pub function: u32,
    /// 8-bit literal operand.
    pub literal: u8,
    /// Whether Rb is replaced by the literal.
    pub uses_literal: bool,
    /// Execution-unit class.
    pub unit: ExecUnit,
    /// Decoded control signals.
    pub ctrl: ControlSignals,
}

impl DecodedInst {
    /// Returns the architectural destination register, if any.
    ///
    /// Loads and link writes target Ra; operate results target Rc.
    pub fn dest(&self) -> Option<u8> {
        if self.ctrl.mem_read || self.ctrl.links || self.ctrl.store_cond {
            Some(self.ra)
        } else if self.ctrl.int_write || self.ctrl.fp_write {
            Some(self.rc)
        } else {
            None
        }
    }

    /// Returns the source registers consulted by the hazard gate.
    ///
    /// Loads read only their base register; everything else reads (Ra, Rb).
    /// R31 stands in for an absent operand.
    pub fn sources(&self) -> (u8, u8) {
        let rb = if self.uses_literal { 31 } else { self.rb };
        if self.ctrl.mem_read { (rb, 31) } else { (self.ra, rb) }
    }
}

/// A grain's execute entry point.
///
/// The grain writes results into `slot.payload`, addresses into `slot.va`,
/// branch outcomes into the slot's branch fields, and fault state into the
/// slot's fault fields.
pub type GrainFn = fn(&mut Slot, &mut Cpu);

/// A grain: decoded execution behavior attached to a fetch.
#[derive(Clone, Copy)]
pub struct Grain {
    /// Execution-unit class this grain occupies.
    pub unit: ExecUnit,
    /// Execute entry point.
    pub exec: GrainFn,
}

impl std::fmt::Debug for Grain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grain").field("unit", &self.unit).finish()
    }
}

/// The 1-deep fetch handoff from the I-box to the pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchResult {
    /// PC of the fetched instruction (PAL-mode tag in bit 0).
    pub pc: u64,
    /// Decoded instruction.
    pub di: DecodedInst,
    /// Grain pointer; `None` raises an illegal-instruction fault at EX.
    pub grain: Option<Grain>,
    /// Whether the producer supplied a prediction.
    pub predicted_valid: bool,
    /// Producer's predicted direction.
    pub predicted_taken: bool,
    /// Producer's predicted target.
    pub predicted_target: u64,
    /// Whether this record carries an instruction at all.
    pub valid: bool,
}

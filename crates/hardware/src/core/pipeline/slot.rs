//! Pipeline slot and deferred-commit records.
//!
//! One slot per ring entry. A slot carries an instruction from fetch to
//! retire, accumulating execution results, fault state, and the deferred
//! register write that the writeback stage applies one tick after execute.

use crate::common::error::TrapClass;
use crate::core::pipeline::grain::{DecodedInst, Grain};

/// Pipeline stage tags, youngest to oldest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    /// Instruction fetch.
    #[default]
    If,
    /// Decode.
    De,
    /// Issue.
    Is,
    /// Execute.
    Ex,
    /// Memory access.
    Mem,
    /// Writeback / retire.
    Wb,
}

/// Deferred register write, applied exactly once by the next tick's
/// writeback stage and then zeroed.
///
/// At most one integer and one FP write per instruction; destination R31/F31
/// is never recorded here (the execute stage skips it entirely).
#[derive(Clone, Copy, Debug, Default)]
pub struct PendingCommit {
    /// An integer write is pending.
    pub int_valid: bool,
    /// Integer destination register.
    pub int_reg: u8,
    /// Integer value.
    pub int_val: u64,
    /// Clear the EBox dirty scoreboard bit on commit.
    pub int_clear_scoreboard: bool,
    /// An FP write is pending.
    pub fp_valid: bool,
    /// FP destination register.
    pub fp_reg: u8,
    /// FP value.
    pub fp_val: u64,
    /// Clear the FBox dirty scoreboard bit on commit.
    pub fp_clear_scoreboard: bool,
}

impl PendingCommit {
    /// Returns whether any write is recorded.
    pub fn any(&self) -> bool {
        self.int_valid || self.fp_valid
    }
}

/// One ring entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct Slot {
    /// Whether the slot holds an instruction (false = bubble).
    pub valid: bool,
    /// Decoded instruction.
    pub di: DecodedInst,
    /// Grain pointer; `None` on a valid slot faults at execute.
    pub grain: Option<Grain>,
    /// Monotonic sequence number assigned at fetch.
    pub seq: u64,
    /// Stage tag (diagnostic; the ring position is authoritative).
    pub stage: Stage,
    /// Stall flag.
    pub stalled: bool,
    /// Pending fault with its class.
    pub fault: Option<TrapClass>,
    /// Faulting VA accompanying `fault`, when applicable.
    pub fault_va: u64,
    /// PC of this instruction (PAL-mode tag in bit 0).
    pub pc: u64,
    /// Resolved branch direction.
    pub branch_taken: bool,
    /// Resolved branch target.
    pub branch_target: u64,
    /// Predicted direction recorded at fetch.
    pub pred_taken: bool,
    /// Predicted target recorded at fetch.
    pub pred_target: u64,
    /// Memory virtual address.
    pub va: u64,
    /// Memory physical address.
    pub pa: u64,
    /// Execution result / store data / load data.
    pub payload: u64,
    /// Deferred register write.
    pub pending: PendingCommit,
    /// Instruction transfers to PAL (CALL_PAL).
    pub pal_transfer: bool,
    /// Barrier has completed its drain.
    pub barrier_done: bool,
}

impl Slot {
    /// Clears the slot back to a bubble.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

//! Pipeline engine: the 6-slot ring and tick loop.
//!
//! Stage `N` (0 = IF, youngest … 5 = WB, oldest) maps to slot
//! `(H − N + 6) mod 6`. Each tick executes the stages in reverse order
//! (WB → MEM → EX → IS → DE → IF) and then rotates the ring. Running WB
//! first is the load-bearing ordering decision: the deferred register write
//! of the instruction that executed last tick lands before this tick's EX
//! reads its operands, which removes the RAW hazard for adjacent
//! producer/consumer pairs with no forwarding network and no stall.
//!
//! On an issue-stage stall the ring still rotates but the three frontend
//! slots are copied back into their stage positions, so a bubble enters EX
//! while the backend drains; on a memory-stage stall nothing rotates and the
//! stage tags keep the already-executed slots idle until the stall clears.

use crate::common::error::{HaltCode, TrapClass};
use crate::core::cpu::Cpu;
use crate::core::pipeline::grain::FetchResult;
use crate::core::pipeline::scoreboard::Scoreboard;
use crate::core::pipeline::slot::Slot;
use crate::core::pipeline::stages;

/// Number of pipeline stages and ring slots.
pub const NUM_STAGES: usize = 6;

/// Why the pipeline was flushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushReason {
    /// A fault reached writeback.
    WbFault,
    /// A CALL_PAL reached writeback.
    PalEntry,
    /// Branch misprediction resolved at execute.
    Mispredict,
    /// External redirect (interrupt taken, HW_REI).
    External,
}

/// Composite outcome of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStepResult {
    /// The ring rotated; instructions advanced one stage.
    Advanced,
    /// A stall held some or all of the pipeline; refetch the same PC.
    Stalled,
    /// The pipeline was flushed by an external redirect.
    Flush,
    /// A precise fault retired; the orchestrator performs PAL entry.
    Fault {
        /// Fault class.
        trap: TrapClass,
        /// Faulting VA, when applicable.
        va: u64,
        /// PC of the faulting instruction.
        pc: u64,
    },
    /// A CALL_PAL retired; the orchestrator performs the PAL transition.
    PalCall {
        /// CALL_PAL function code.
        function: u32,
        /// PC of the CALL_PAL instruction.
        call_pc: u64,
        /// Computed PAL entry vector.
        vector: u64,
    },
    /// A mispredicted branch redirected the PC at execute.
    Mispredict {
        /// Corrected architectural PC.
        target: u64,
    },
    /// The CPU is parked until a wake-up event.
    Halted {
        /// Why the CPU parked.
        code: HaltCode,
    },
}

/// Writeback-stage outcome, internal to the tick loop.
#[derive(Clone, Copy, Debug)]
pub(crate) enum WbOutcome {
    /// Nothing exceptional; retirement (if any) completed.
    None,
    /// The retiring instruction carried a fault.
    Fault(TrapClass, u64, u64),
    /// The retiring instruction is a CALL_PAL.
    PalCall(u32, u64, u64),
}

/// The 6-stage ring-buffered pipeline for one CPU.
#[derive(Debug)]
pub struct Pipeline {
    slots: [Slot; NUM_STAGES],
    head: usize,
    next_seq: u64,
    fetch_buf: Option<FetchResult>,
    /// Dirty-register scoreboards (EBox/FBox).
    pub scoreboard: Scoreboard,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self {
            slots: [Slot::default(); NUM_STAGES],
            head: 0,
            next_seq: 0,
            fetch_buf: None,
            scoreboard: Scoreboard::new(),
        }
    }

    /// Supplies the next fetched instruction.
    ///
    /// Returns `false` (dropping nothing) when the 1-deep buffer is still
    /// occupied; the producer must check [`Pipeline::is_frontend_stalled`].
    pub fn supply_fetch_result(&mut self, fr: FetchResult) -> bool {
        if self.fetch_buf.is_some() {
            return false;
        }
        self.fetch_buf = Some(fr);
        true
    }

    /// Returns whether the fetch buffer is occupied (back-pressure).
    pub fn is_frontend_stalled(&self) -> bool {
        self.fetch_buf.is_some()
    }

    /// Returns the ring index for a stage (0 = IF … 5 = WB).
    #[inline(always)]
    pub(crate) fn idx(&self, stage: usize) -> usize {
        (self.head + NUM_STAGES - stage) % NUM_STAGES
    }

    /// Borrows the slot at a stage.
    pub(crate) fn slot(&self, stage: usize) -> &Slot {
        &self.slots[self.idx(stage)]
    }

    /// Mutably borrows the slot at a stage.
    pub(crate) fn slot_mut(&mut self, stage: usize) -> &mut Slot {
        let i = self.idx(stage);
        &mut self.slots[i]
    }

    /// Takes the fetch buffer (IF-stage consumption).
    pub(crate) fn take_fetch(&mut self) -> Option<FetchResult> {
        self.fetch_buf.take()
    }

    /// Allocates the next monotonic sequence number.
    pub(crate) fn alloc_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Advances the simulation by one tick.
    ///
    /// Returns the composite stage outcome; the orchestrator acts on
    /// everything that is not `Advanced`.
    pub fn tick(&mut self, cpu: &mut Cpu) -> PipelineStepResult {
        if let Some(code) = cpu.view.run.halt {
            return PipelineStepResult::Halted { code };
        }

        cpu.stats.cycles += 1;
        let _ = cpu.view.run.tick_counters();

        match stages::writeback::wb_stage(self, cpu) {
            WbOutcome::Fault(trap, va, pc) => {
                self.flush(FlushReason::WbFault);
                return PipelineStepResult::Fault { trap, va, pc };
            }
            WbOutcome::PalCall(function, call_pc, vector) => {
                self.flush(FlushReason::PalEntry);
                return PipelineStepResult::PalCall {
                    function,
                    call_pc,
                    vector,
                };
            }
            WbOutcome::None => {}
        }

        if !stages::memory::mem_stage(self, cpu) {
            // Memory stall: nothing rotates; stage tags keep the executed
            // slots idle until the drain completes.
            cpu.stats.stalls_mem += 1;
            return PipelineStepResult::Stalled;
        }

        let mispredict = stages::execute::ex_stage(self, cpu);

        if !stages::issue::is_stage(self, cpu) {
            cpu.stats.stalls_issue += 1;
            self.rotate_hold_frontend();
            return PipelineStepResult::Stalled;
        }

        stages::decode::de_stage(self, cpu);
        stages::fetch::if_stage(self, cpu);

        self.rotate();

        match mispredict {
            Some(target) => PipelineStepResult::Mispredict { target },
            None => PipelineStepResult::Advanced,
        }
    }

    /// Rotates the ring: every instruction advances one stage and the
    /// retired slot becomes the new fetch slot.
    fn rotate(&mut self) {
        self.head = (self.head + 1) % NUM_STAGES;
    }

    /// Rotates while holding IF/DE/IS in place, inserting a bubble into EX.
    ///
    /// The backend (EX/MEM/WB) drains normally, which is what an issue
    /// stall is waiting for.
    fn rotate_hold_frontend(&mut self) {
        let if_i = self.idx(0);
        let de_i = self.idx(1);
        let is_i = self.idx(2);
        self.head = (self.head + 1) % NUM_STAGES;
        // New positions are one index up; copy youngest-first so no source
        // is overwritten before it is read.
        let new_if = self.idx(0);
        self.slots[new_if] = self.slots[if_i];
        self.slots[if_i] = self.slots[de_i];
        self.slots[de_i] = self.slots[is_i];
        self.slots[is_i].clear();
    }

    /// Clears the three frontend slots and the fetch buffer (mispredict).
    pub(crate) fn flush_frontend(&mut self) {
        for stage in 0..3 {
            let i = self.idx(stage);
            self.slots[i].clear();
        }
        self.fetch_buf = None;
    }

    /// Clears all six slots, the fetch buffer, the scoreboards, and any
    /// MBox staging state (barrier progress rides in the slots).
    ///
    /// Register writes already committed this tick stay committed; only
    /// un-applied slot state is discarded.
    pub fn flush(&mut self, _reason: FlushReason) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.fetch_buf = None;
        self.scoreboard.flush();
    }

    /// Parks the CPU with a halt code; subsequent ticks return `Halted`.
    pub fn halt(&mut self, cpu: &mut Cpu, code: HaltCode) {
        cpu.view.run.halt = Some(code);
        self.flush(FlushReason::External);
    }

    /// Returns the oldest pending fault across all slots, if any
    /// (diagnostic; precedence is enforced by retirement order).
    pub fn oldest_fault(&self) -> Option<(u64, TrapClass)> {
        self.slots
            .iter()
            .filter(|s| s.valid)
            .filter_map(|s| s.fault.map(|f| (s.seq, f)))
            .min_by_key(|(seq, _)| *seq)
    }
}

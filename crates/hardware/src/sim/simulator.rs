//! Per-CPU simulator: run loop and delivery orchestration.
//!
//! The simulator owns one CPU's execution context and pipeline side-by-side
//! and drives the tick loop: poll interrupts, feed the fetch buffer, tick
//! the pipeline, and act on every non-advance outcome: PAL entry for
//! faults and CALL_PAL, redirect bookkeeping for mispredicts, parking for
//! halts.

use std::collections::HashMap;

use tracing::debug;

use crate::common::constants::{PAL_FUNC_HALT, pal_vector};
use crate::common::error::{HaltCode, TrapClass};
use crate::core::cpu::Cpu;
use crate::core::pal::entry::{self, PalReason};
use crate::core::pal::scb::{self, StackChoice};
use crate::core::pal::vector;
use crate::core::pipeline::engine::{FlushReason, Pipeline, PipelineStepResult};
use crate::core::pipeline::grain::FetchResult;
use crate::isa::grains::DecodedGrain;

/// The fetch producer contract: the I-box side of the pipeline boundary.
pub trait InstructionSource {
    /// Produces the decoded fetch for `pc`, or `None` for a bubble.
    fn fetch(&mut self, pc: u64) -> Option<FetchResult>;
}

/// A pc-indexed program of decoded grains.
///
/// The test suite and the firmware smoke program express code this way;
/// a real I-box decodes guest memory instead.
#[derive(Debug, Default)]
pub struct Program {
    entries: HashMap<u64, DecodedGrain>,
}

impl Program {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places an instruction at `pc` (the PAL-mode tag is ignored for
    /// lookup, matching an I-box that fetches by untagged PC).
    pub fn insert(&mut self, pc: u64, dg: DecodedGrain) {
        let _ = self.entries.insert(pc & !1, dg);
    }

    /// Places a straight-line sequence starting at `pc`.
    pub fn insert_seq(&mut self, pc: u64, seq: impl IntoIterator<Item = DecodedGrain>) {
        for (i, dg) in seq.into_iter().enumerate() {
            self.insert(pc + 4 * i as u64, dg);
        }
    }
}

impl InstructionSource for Program {
    fn fetch(&mut self, pc: u64) -> Option<FetchResult> {
        let dg = *self.entries.get(&(pc & !1))?;
        Some(crate::isa::grains::fetch(pc, dg))
    }
}

/// Top-level per-CPU simulator: execution context plus pipeline.
#[derive(Debug)]
pub struct Simulator<S: InstructionSource> {
    /// CPU execution context (architectural view, shared plane, stats).
    pub cpu: Cpu,
    /// Pipeline engine.
    pub pipeline: Pipeline,
    /// Fetch producer.
    pub source: S,
}

impl<S: InstructionSource> Simulator<S> {
    /// Creates a simulator over a bound CPU and a fetch producer.
    pub fn new(cpu: Cpu, source: S) -> Self {
        Self {
            cpu,
            pipeline: Pipeline::new(),
            source,
        }
    }

    /// Advances the CPU by one tick and performs any delivery the tick
    /// outcome demands.
    pub fn tick(&mut self) -> PipelineStepResult {
        if let Some(code) = self.cpu.view.run.halt {
            // Parked: a deliverable interrupt is the only wake-up.
            if self.cpu.irq.has_deliverable(self.cpu.view.hwpcb.ipl()) {
                self.cpu.view.run.halt = None;
            } else {
                return PipelineStepResult::Halted { code };
            }
        }

        self.poll_interrupts();

        if self.cpu.view.run.halt.is_none() && !self.pipeline.is_frontend_stalled() {
            let pc = self.cpu.view.hwpcb.pc;
            if let Some(fr) = self.source.fetch(pc) {
                let _ = self.pipeline.supply_fetch_result(fr);
            }
        }

        let result = self.pipeline.tick(&mut self.cpu);
        match result {
            PipelineStepResult::Fault { trap, va, pc } => self.deliver_fault(trap, va, pc),
            PipelineStepResult::PalCall {
                function,
                call_pc,
                vector,
            } => self.deliver_pal_call(function, call_pc, vector),
            _ => {}
        }
        result
    }

    /// Runs up to `max_ticks` ticks, stopping early on halt.
    pub fn run(&mut self, max_ticks: u64) -> Option<HaltCode> {
        for _ in 0..max_ticks {
            if let PipelineStepResult::Halted { code } = self.tick() {
                return Some(code);
            }
        }
        None
    }

    /// Requests a software interrupt at `level` (1..=15): sets the SISR
    /// bit and raises the matching edge source.
    pub fn request_software_interrupt(&mut self, level: u8) {
        if !(1..=15).contains(&level) {
            debug!(level, "software interrupt level out of range");
            return;
        }
        self.cpu.view.hwpcb.sirr |= 1 << level;
        self.cpu.view.hwpcb.sisr |= 1 << level;
        self.cpu.irq.raise(u32::from(level), level);
    }

    /// Returns from PALcode: restores the snapshot and flushes the pipeline.
    pub fn hw_rei(&mut self) {
        entry::hw_rei(&mut self.cpu.view);
        self.pipeline.flush(FlushReason::External);
    }

    /// Claims and delivers the highest-priority deliverable interrupt, if
    /// any. PAL mode defers delivery until HW_REI lowers the tag.
    fn poll_interrupts(&mut self) {
        if self.cpu.view.hwpcb.in_pal_mode() {
            return;
        }
        let ps_ipl = self.cpu.view.hwpcb.ipl();
        self.cpu.view.run.int_pending = self.cpu.irq.has_deliverable(ps_ipl);
        if !self.cpu.view.run.int_pending {
            return;
        }
        let claimed = self.cpu.irq.claim_next(ps_ipl);
        if !claimed.valid {
            return;
        }

        self.cpu.stats.interrupts_taken += 1;

        let scbb = self.cpu.view.pal.scbb;
        let raw = scb::read_entry(&self.cpu.mem, scbb, claimed.vector);
        let (handler_pc, disposition) = scb::decode_entry(raw);
        if scb::select_stack(&self.cpu.view.hwpcb, disposition) == StackChoice::Illegal {
            // Reserved disposition: treated as an illegal-PAL condition.
            let pal_base = self.cpu.view.pal.pal_base;
            let opcdec = vector::compute_exception_vector(pal_base, pal_vector::OPCDEC);
            let return_pc = self.cpu.view.hwpcb.pc;
            let _ = entry::pal_enter(&mut self.cpu.view, opcdec, return_pc, PalReason::Exception);
            self.pipeline.flush(FlushReason::External);
            return;
        }

        let vector_pc = if raw == 0 {
            let pal_base = self.cpu.view.pal.pal_base;
            vector::compute_exception_vector(pal_base, pal_vector::INTERRUPT)
        } else {
            handler_pc | 1
        };

        let return_pc = self.cpu.view.hwpcb.pc;
        let _ = entry::pal_enter(
            &mut self.cpu.view,
            vector_pc,
            return_pc,
            PalReason::Interrupt(claimed.ipl),
        );
        self.pipeline.flush(FlushReason::External);
    }

    /// Performs PAL entry for a retired fault.
    fn deliver_fault(&mut self, trap: TrapClass, va: u64, pc: u64) {
        self.cpu.stats.traps_taken += 1;
        self.cpu.view.pal.fault_va = va;
        self.cpu.view.hwpcb.set_fault_va(va);

        let pal_base = self.cpu.view.pal.pal_base;
        let vector_pc = vector::compute_exception_vector(pal_base, trap.pal_vector());

        let reason = match trap {
            TrapClass::MachineCheck(r) => PalReason::MachineCheck(r),
            _ => PalReason::Exception,
        };
        if !entry::pal_enter(&mut self.cpu.view, vector_pc, pc, reason) {
            // Double machine check: the CPU parks instead of dispatching.
            self.pipeline
                .halt(&mut self.cpu, HaltCode::DoubleMachineCheck);
        }
    }

    /// Performs the PAL transition for a retired CALL_PAL.
    fn deliver_pal_call(&mut self, function: u32, call_pc: u64, vector_pc: u64) {
        let cm = self.cpu.view.hwpcb.cm();
        if vector::is_illegal_call_pal(function, cm) {
            // OPCDEC entry: the CALL_PAL itself is the faulting instruction.
            let _ = entry::pal_enter(&mut self.cpu.view, vector_pc, call_pc, PalReason::Exception);
            self.cpu.stats.traps_taken += 1;
            return;
        }

        if function == PAL_FUNC_HALT {
            // Builtin PAL service: privileged HALT parks the CPU.
            self.pipeline.halt(&mut self.cpu, HaltCode::OperatorHalt);
            return;
        }

        let _ = entry::pal_enter(
            &mut self.cpu.view,
            vector_pc,
            call_pc.wrapping_add(4),
            PalReason::CallPal(function),
        );
    }
}

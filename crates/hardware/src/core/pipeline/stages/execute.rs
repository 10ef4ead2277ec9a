//! Execute (EX) Stage.
//!
//! Dispatches the grain's execute entry point, resolves branches against
//! the recorded prediction, and defers the register writeback. The deferred
//! write is read once by the next tick's writeback stage, after the ring
//! rotation has moved this slot into the MEM position. That is the
//! one-cycle lag that makes adjacent producer/consumer pairs work without
//! forwarding.

use crate::common::constants::REG_ZERO;
use crate::core::cpu::Cpu;
use crate::core::pipeline::engine::Pipeline;
use crate::core::pipeline::grain::DecodedInst;
use crate::core::pipeline::slot::{PendingCommit, Stage};
use crate::common::error::TrapClass;

/// Executes the execute stage.
///
/// Returns the corrected PC when a branch misprediction was resolved; the
/// frontend has already been flushed and the architectural PC redirected.
pub fn ex_stage(p: &mut Pipeline, cpu: &mut Cpu) -> Option<u64> {
    let trace = cpu.trace_enabled();
    let (di, pc, payload, taken, target, pred_taken, pred_target) = {
        let slot = p.slot_mut(3);
        if !slot.valid || slot.fault.is_some() || slot.stage != Stage::Is {
            return None;
        }
        slot.stage = Stage::Ex;

        let Some(grain) = slot.grain else {
            slot.fault = Some(TrapClass::IllegalOpcode);
            slot.fault_va = slot.pc & !1;
            if trace {
                eprintln!("EX  pc={:#x} * null grain: illegal opcode", slot.pc);
            }
            return None;
        };

        (grain.exec)(slot, cpu);
        if slot.fault.is_some() {
            return None;
        }

        (
            slot.di,
            slot.pc,
            slot.payload,
            slot.branch_taken,
            slot.branch_target,
            slot.pred_taken,
            slot.pred_target,
        )
    };

    if trace {
        eprintln!("EX  pc={pc:#x} payload={payload:#x}");
    }

    defer_writeback(p, cpu, &di, pc, payload);

    let is_control = di.ctrl.cond_branch || di.ctrl.uncond_branch || di.ctrl.jump;
    if is_control {
        let mispredicted = taken != pred_taken || (taken && target != pred_target);
        if mispredicted {
            let correct = if taken { target } else { pc.wrapping_add(4) };
            p.flush_frontend();
            cpu.view.hwpcb.pc = correct;
            cpu.bru.update(pc, taken, target);
            cpu.stats.branch_mispredictions += 1;
            if trace {
                eprintln!("EX  pc={pc:#x} * mispredict -> {correct:#x}");
            }
            return Some(correct);
        }
    }

    None
}

/// Populates the slot's deferred-commit record from the execution result.
///
/// Destination register 31 is never recorded; the discard is counted on
/// the matching instrumentation counter instead.
fn defer_writeback(p: &mut Pipeline, cpu: &mut Cpu, di: &DecodedInst, pc: u64, payload: u64) {
    let mut pending = PendingCommit::default();

    if di.ctrl.links {
        // Branch-with-link: Ra receives the return address.
        if usize::from(di.ra) == REG_ZERO {
            cpu.stats.r31_discarded_link_writes += 1;
        } else {
            pending.int_valid = true;
            pending.int_reg = di.ra;
            pending.int_val = pc.wrapping_add(4);
            pending.int_clear_scoreboard = true;
        }
    } else if di.ctrl.mem_read {
        if di.ctrl.fp_write {
            if usize::from(di.ra) == REG_ZERO {
                cpu.stats.r31_discarded_writes += 1;
            } else {
                pending.fp_valid = true;
                pending.fp_reg = di.ra;
                pending.fp_val = payload;
                pending.fp_clear_scoreboard = true;
            }
        } else if usize::from(di.ra) == REG_ZERO {
            if di.ctrl.load_locked {
                cpu.stats.r31_load_locked += 1;
            } else {
                cpu.stats.r31_prefetch_loads += 1;
            }
        } else {
            pending.int_valid = true;
            pending.int_reg = di.ra;
            pending.int_val = payload;
            pending.int_clear_scoreboard = true;
        }
    } else if di.ctrl.fp_write {
        if usize::from(di.rc) == REG_ZERO {
            cpu.stats.r31_discarded_writes += 1;
        } else {
            pending.fp_valid = true;
            pending.fp_reg = di.rc;
            pending.fp_val = payload;
            pending.fp_clear_scoreboard = true;
        }
    } else if di.ctrl.int_write {
        if usize::from(di.rc) == REG_ZERO {
            cpu.stats.r31_discarded_writes += 1;
        } else {
            pending.int_valid = true;
            pending.int_reg = di.rc;
            pending.int_val = payload;
            pending.int_clear_scoreboard = true;
        }
    }

    if pending.int_valid {
        p.scoreboard.mark_int(pending.int_reg);
    }
    if pending.fp_valid {
        p.scoreboard.mark_fp(pending.fp_reg);
    }
    p.slot_mut(3).pending = pending;
}

//! Writeback / Retire (WB) Stage.
//!
//! Runs first each tick. In order: apply the deferred register write of the
//! instruction that executed last tick (now sitting in the MEM position);
//! then decide the retiring slot's disposition: fault, CALL_PAL, store
//! commit, predictor update, retire. On a fault or CALL_PAL the deferred
//! write is discarded instead of applied: the younger instruction that
//! produced it is about to be squashed by the flush.

use crate::common::constants::REG_ZERO;
use crate::core::cpu::Cpu;
use crate::core::pal::vector;
use crate::core::pipeline::engine::{Pipeline, WbOutcome};
use crate::core::pipeline::slot::PendingCommit;

/// Executes the writeback stage.
pub(crate) fn wb_stage(p: &mut Pipeline, cpu: &mut Cpu) -> WbOutcome {
    let trace = cpu.trace_enabled();

    // Take the deferred commit of the previously-executed instruction;
    // read once, then zeroed.
    let pending = {
        let mem_slot = p.slot_mut(4);
        std::mem::replace(&mut mem_slot.pending, PendingCommit::default())
    };

    let wb = *p.slot(5);

    if wb.valid {
        if let Some(trap) = wb.fault {
            // Discard `pending`: the younger instruction that produced it
            // was squashed. No store is committed.
            p.slot_mut(5).clear();
            if trace {
                eprintln!("WB  pc={:#x} * FAULT {trap}", wb.pc);
            }
            return WbOutcome::Fault(trap, wb.fault_va, wb.pc);
        }

        if wb.di.ctrl.call_pal {
            // Discard `pending` for the same reason; the PAL transition
            // flushes everything younger.
            p.slot_mut(5).clear();
            cpu.stats.inst_pal += 1;
            let vector = vector::compute_call_pal_entry(
                cpu.view.pal.pal_base,
                wb.di.function,
                cpu.view.hwpcb.cm(),
            );
            if trace {
                eprintln!(
                    "WB  pc={:#x} * CALL_PAL {:#x} -> {vector:#x}",
                    wb.pc, wb.di.function
                );
            }
            return WbOutcome::PalCall(wb.di.function, wb.pc, vector);
        }
    }

    // Commit the previous instruction's result before this tick's EX reads
    // registers.
    if pending.int_valid {
        cpu.view.write_int(usize::from(pending.int_reg), pending.int_val);
        if pending.int_clear_scoreboard {
            p.scoreboard.clear_int(pending.int_reg);
        }
        if trace {
            eprintln!("WB  R{} <= {:#x}", pending.int_reg, pending.int_val);
        }
    }
    if pending.fp_valid {
        cpu.view.write_fp(usize::from(pending.fp_reg), pending.fp_val);
        if pending.fp_clear_scoreboard {
            p.scoreboard.clear_fp(pending.fp_reg);
        }
        if trace {
            eprintln!("WB  F{} <= {:#x}", pending.fp_reg, pending.fp_val);
        }
    }

    if !wb.valid {
        return WbOutcome::None;
    }

    // Store commit. A successful store is the cross-CPU-observable point,
    // so intersecting reservations break here.
    if wb.di.ctrl.mem_write {
        let width = wb.di.ctrl.width.bytes();
        if wb.di.ctrl.store_cond {
            let success = cpu.reservations.try_clear(cpu.id, wb.pa);
            if success {
                if let Err(trap) = cpu.store_pa(wb.pa, width, wb.payload) {
                    p.slot_mut(5).clear();
                    return WbOutcome::Fault(trap, wb.va, wb.pc);
                }
            }
            if usize::from(wb.di.ra) == REG_ZERO {
                cpu.stats.r31_store_cond += 1;
            } else {
                // Conditional-store status resolves only at commit, so the
                // write lands directly rather than through the deferred path.
                cpu.view
                    .write_int(usize::from(wb.di.ra), u64::from(success));
            }
            if trace {
                eprintln!("WB  pc={:#x} STx_C {}", wb.pc, if success { "ok" } else { "failed" });
            }
        } else if let Err(trap) = cpu.store_pa(wb.pa, width, wb.payload) {
            p.slot_mut(5).clear();
            return WbOutcome::Fault(trap, wb.va, wb.pc);
        }
    }

    // Predictor update for resolved branches that reached retirement; a
    // retired branch was correctly predicted (mispredicts redirected at EX).
    let is_control = wb.di.ctrl.cond_branch || wb.di.ctrl.uncond_branch || wb.di.ctrl.jump;
    if is_control {
        if wb.branch_taken {
            cpu.bru.update(wb.pc, true, wb.branch_target);
        }
        cpu.stats.branch_predictions += 1;
    }

    // Retire.
    cpu.stats.instructions_retired += 1;
    if wb.di.ctrl.mem_read {
        cpu.stats.inst_load += 1;
    } else if wb.di.ctrl.mem_write {
        cpu.stats.inst_store += 1;
    } else if is_control {
        cpu.stats.inst_branch += 1;
    } else if wb.di.ctrl.fp_write {
        cpu.stats.inst_fp += 1;
    } else {
        cpu.stats.inst_alu += 1;
    }
    if trace {
        eprintln!("WB  pc={:#x} retired seq={}", wb.pc, wb.seq);
    }
    p.slot_mut(5).clear();

    WbOutcome::None
}

//! Issue (IS) Stage.
//!
//! Checks stall conditions before an instruction enters execute. The only
//! architectural stall is full serialization: CALL_PAL and its kin issue
//! alone, after every older slot has drained. The dual-issue gate lives in
//! `hazards`; this engine always single-issues, which is always correct.

use crate::core::cpu::Cpu;
use crate::core::pipeline::engine::Pipeline;
use crate::core::pipeline::grain::SerializeClass;
use crate::core::pipeline::slot::Stage;

/// Executes the issue stage. Returns `false` when the slot must stall.
pub fn is_stage(p: &mut Pipeline, cpu: &mut Cpu) -> bool {
    let older_busy = p.slot(3).valid || p.slot(4).valid || p.slot(5).valid;
    let trace = cpu.trace_enabled();
    let slot = p.slot_mut(2);
    if !slot.valid || slot.stage != Stage::De {
        return true;
    }

    if slot.di.ctrl.serialize == SerializeClass::Full && older_busy {
        slot.stalled = true;
        if trace {
            eprintln!("IS  pc={:#x} * serialize stall", slot.pc);
        }
        return false;
    }

    slot.stalled = false;
    slot.stage = Stage::Is;
    true
}

//! Instruction Fetch (IF) Stage.
//!
//! Consumes the 1-deep fetch buffer supplied by the I-box. On consume the
//! slot is populated with the decoded instruction and grain, a monotonic
//! sequence number is assigned, the branch prediction is recorded, and the
//! architectural PC advances to the predicted next PC. An empty buffer
//! leaves the slot as a bubble.

use crate::common::data::sext21;
use crate::core::cpu::Cpu;
use crate::core::pipeline::engine::Pipeline;
use crate::core::pipeline::slot::Stage;

/// Executes the fetch stage.
///
/// Prediction policy when the producer supplies none: unconditional
/// branches predict taken with `pc + 4 + (sext21(disp21) << 2)`; jumps
/// predict taken only on a BTB hit; conditional branches predict
/// not-taken; everything else falls through to `pc + 4`. PC bit 0 (the
/// PAL-mode tag) survives every computation here because displacements
/// are longword-scaled.
pub fn if_stage(p: &mut Pipeline, cpu: &mut Cpu) {
    if p.slot(0).valid {
        // Frontend held this tick; leave the buffer for back-pressure.
        return;
    }
    let Some(fr) = p.take_fetch() else {
        return;
    };
    if !fr.valid {
        return;
    }

    let seq = p.alloc_seq();
    let fall_through = fr.pc.wrapping_add(4);

    let (pred_taken, pred_target) = if fr.predicted_valid {
        (fr.predicted_taken, fr.predicted_target)
    } else if fr.di.ctrl.uncond_branch {
        let target = fr
            .pc
            .wrapping_add(4)
            .wrapping_add(sext21(fr.di.disp21) << 2);
        (true, target)
    } else if fr.di.ctrl.jump {
        match cpu.bru.predict_jump(fr.pc) {
            Some(target) => (true, target),
            None => (false, fall_through),
        }
    } else {
        (false, fall_through)
    };

    let slot = p.slot_mut(0);
    slot.clear();
    slot.valid = true;
    slot.di = fr.di;
    slot.grain = fr.grain;
    slot.seq = seq;
    slot.stage = Stage::If;
    slot.pc = fr.pc;
    slot.pred_taken = pred_taken;
    slot.pred_target = pred_target;

    let next_pc = if pred_taken { pred_target } else { fall_through };
    cpu.view.hwpcb.pc = next_pc;

    if cpu.trace_enabled() {
        eprintln!("IF  pc={:#x} seq={seq} next={next_pc:#x}", fr.pc);
    }
}

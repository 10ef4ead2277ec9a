//! Decode (DE) Stage.
//!
//! Pass-through in the common path. The slot arrives pre-decoded (the
//! decoder is the I-box's collaborator); this stage advances the stage tag
//! and confirms the execution-unit class the dual-issue gate consults.

use crate::core::cpu::Cpu;
use crate::core::pipeline::engine::Pipeline;
use crate::core::pipeline::slot::Stage;

/// Executes the decode stage.
pub fn de_stage(p: &mut Pipeline, cpu: &mut Cpu) {
    let trace = cpu.trace_enabled();
    let slot = p.slot_mut(1);
    if !slot.valid || slot.stage != Stage::If {
        return;
    }
    slot.stage = Stage::De;

    // Literal-form operates carry R31 in the Rb field; anything else is an
    // operand-constraint violation by the decoder.
    if slot.di.uses_literal && slot.di.rb != 31 {
        cpu.stats.r31_operand_violations += 1;
    }

    if trace {
        eprintln!("DE  pc={:#x} unit={:?}", slot.pc, slot.di.unit);
    }
}

//! PAL entry and HW_REI.
//!
//! Every transfer into PALcode (CALL_PAL, fault, interrupt, trap, or machine
//! check) goes through [`pal_enter`]: snapshot the architectural context,
//! latch the return PC in EXC_ADDR, raise the PAL-mode tag, enable the shadow
//! banks when the personality uses them, force kernel mode, and redirect to
//! the vector. [`hw_rei`] is the inverse. The pipeline must be flushed after
//! both transitions; the orchestrator owns that step.

use crate::common::error::{HaltCode, MchkReason};
use crate::core::arch::mode::Cm;
use crate::core::arch::state::CpuState;

/// MCES bit: a machine check is in progress.
const MCES_MCHK: u64 = 1 << 0;

/// Why PAL is being entered; selects IPL treatment and bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PalReason {
    /// CALL_PAL instruction with its function code.
    CallPal(u32),
    /// Synchronous fault or trap.
    Exception,
    /// Interrupt claimed at this IPL.
    Interrupt(u8),
    /// Machine check with its sub-reason.
    MachineCheck(MchkReason),
}

/// Performs the PAL entry state transition.
///
/// `vector_pc` must already carry the PAL-mode tag in bit 0 (every vector
/// computation produces it); `return_pc` is latched into EXC_ADDR for
/// HW_REI. Interrupts raise the IPL to the claimed level; machine checks
/// go to IPL 31.
///
/// Returns `false` when a machine check arrives while MCES says one is
/// already in progress; the caller must halt with
/// [`HaltCode::DoubleMachineCheck`] instead of dispatching.
pub fn pal_enter(state: &mut CpuState, vector_pc: u64, return_pc: u64, reason: PalReason) -> bool {
    if let PalReason::MachineCheck(_) = reason {
        if state.pal.mces & MCES_MCHK != 0 {
            state.run.halt = Some(HaltCode::DoubleMachineCheck);
            return false;
        }
        state.pal.mces |= MCES_MCHK;
    }

    state.save_context();
    state.pal.exc_addr = return_pc;

    state.hwpcb.set_cm(Cm::Kernel);
    match reason {
        PalReason::Interrupt(ipl) => state.hwpcb.set_ipl(ipl),
        PalReason::MachineCheck(_) => state.hwpcb.set_ipl(31),
        PalReason::CallPal(_) | PalReason::Exception => {}
    }

    if state.run.personality.uses_shadow() {
        state.shadow.set_enabled(true);
    }

    // Bit 0 of the vector is the PAL-mode tag.
    state.hwpcb.pc = vector_pc | 1;
    true
}

/// Returns from PALcode: restores the snapshot, clears the PAL-mode tag,
/// disables the shadow banks, and resumes at the saved EXC_ADDR.
pub fn hw_rei(state: &mut CpuState) {
    let exc_addr = state.pal.exc_addr;
    state.restore_context();
    state.shadow.set_enabled(false);
    state.hwpcb.pc = exc_addr & !1;
}

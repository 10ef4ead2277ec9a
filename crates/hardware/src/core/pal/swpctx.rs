//! SWPCTX: the EV6 hardware context switch.
//!
//! Swaps the Hardware Process Control Block: the outgoing process state is
//! written back to guest memory at the old PCBB, and the incoming state is
//! loaded from the new PCBB. PTBR and ASN are loaded but never written back
//! (PALcode owns their memory image), and no TLB flush is issued: EV6 tags
//! TLB entries by ASN, so the caller relies on ASN isolation.

use crate::core::arch::mode::Cm;
use crate::core::arch::state::CpuState;
use crate::soc::memory::GuestMemory;

/// In-memory HWPCB quadword offsets.
mod layout {
    pub const KSP: u64 = 0x00;
    pub const ESP: u64 = 0x08;
    pub const SSP: u64 = 0x10;
    pub const USP: u64 = 0x18;
    pub const PTBR: u64 = 0x20;
    pub const ASN: u64 = 0x28;
    pub const AST: u64 = 0x30;
    pub const FEN: u64 = 0x38;
    pub const PCC: u64 = 0x40;
    pub const UNQ: u64 = 0x48;
    pub const DAT: u64 = 0x50;
}

/// Outcome of a context switch attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwpctxResult {
    /// PCBB that was current before the switch.
    pub old_pcbb: u64,
    /// Whether the page table base changed.
    pub ptbr_changed: bool,
    /// Whether the address space number changed.
    pub asn_changed: bool,
    /// Whether the switch happened at all.
    pub success: bool,
}

/// Swaps process context to the HWPCB at `new_pcbb`.
///
/// Fails without modifying any state when `new_pcbb` is not 128-byte
/// aligned (any of the low 7 bits set). On success the PCBB IPR points at
/// the new block and the result reports whether PTBR/ASN changed.
pub fn swpctx(state: &mut CpuState, mem: &GuestMemory, new_pcbb: u64) -> SwpctxResult {
    let old_pcbb = state.pal.pcbb;
    let failed = SwpctxResult {
        old_pcbb,
        ptbr_changed: false,
        asn_changed: false,
        success: false,
    };
    if new_pcbb & 0x7F != 0 {
        return failed;
    }

    let hw_counter = state.run.system_cc;

    // The active mode's stack pointer lives in R30 until now.
    let cm = state.hwpcb.cm();
    let sp = state.int.read(30);
    state.hwpcb.save_sp(cm, sp);

    // Write back the outgoing process image. PTBR and ASN stay untouched.
    let pcb = &state.hwpcb;
    let _ = mem.write64(old_pcbb + layout::KSP, pcb.load_sp(Cm::Kernel));
    let _ = mem.write64(old_pcbb + layout::ESP, pcb.load_sp(Cm::Executive));
    let _ = mem.write64(old_pcbb + layout::SSP, pcb.load_sp(Cm::Supervisor));
    let _ = mem.write64(old_pcbb + layout::USP, pcb.load_sp(Cm::User));
    let _ = mem.write64(old_pcbb + layout::AST, u64::from(pcb.ast_packed()));
    let _ = mem.write64(old_pcbb + layout::PCC, pcb.save_pcc(hw_counter));
    let _ = mem.write64(old_pcbb + layout::UNQ, pcb.unq);
    let _ = mem.write64(old_pcbb + layout::FEN, u64::from(pcb.fen));
    let _ = mem.write64(old_pcbb + layout::DAT, pcb.dat);

    let old_ptbr = state.hwpcb.ptbr;
    let old_asn = state.hwpcb.asn;

    // Load the incoming process image.
    let pcb = &mut state.hwpcb;
    pcb.save_sp(Cm::Kernel, mem.read64(new_pcbb + layout::KSP));
    pcb.save_sp(Cm::Executive, mem.read64(new_pcbb + layout::ESP));
    pcb.save_sp(Cm::Supervisor, mem.read64(new_pcbb + layout::SSP));
    pcb.save_sp(Cm::User, mem.read64(new_pcbb + layout::USP));
    pcb.ptbr = mem.read64(new_pcbb + layout::PTBR);
    pcb.asn = mem.read64(new_pcbb + layout::ASN) as u8;
    pcb.set_ast_packed(mem.read64(new_pcbb + layout::AST) as u8);
    pcb.fen = mem.read64(new_pcbb + layout::FEN) & 1 != 0;
    let saved_pcc = mem.read64(new_pcbb + layout::PCC);
    pcb.restore_pcc(saved_pcc, hw_counter);
    pcb.unq = mem.read64(new_pcbb + layout::UNQ);
    pcb.dat = mem.read64(new_pcbb + layout::DAT);

    state.pal.pcbb = new_pcbb;

    // R30 becomes the incoming process's SP for the (unchanged) mode.
    let sp = state.hwpcb.load_sp(cm);
    state.int.write(30, sp);

    SwpctxResult {
        old_pcbb,
        ptbr_changed: state.hwpcb.ptbr != old_ptbr,
        asn_changed: state.hwpcb.asn != old_asn,
        success: true,
    }
}

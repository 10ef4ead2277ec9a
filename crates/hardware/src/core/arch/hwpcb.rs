//! Hardware Process Control Block (HWPCB).
//!
//! This module implements the per-CPU architectural process record. It provides:
//! 1. **Processor Status:** The PS word with its CM/IPL/VMM projections, kept
//!    mirrored at all times.
//! 2. **PC Handling:** The PAL-mode tag in PC bit 0, preserved across every
//!    manipulation that is not an explicit mode transition.
//! 3. **Stack Pointers:** The four per-mode stack slots, laid out contiguously
//!    so `sp[mode & 3]` selects without branching.
//! 4. **Process State:** PTBR, ASN, faulting VA, process cycle counter, UNQ,
//!    FP enable, AST nibbles, software interrupt registers, PAL scratch.

use crate::common::addr::sext_va;
use crate::common::data::{pack_ast, unpack_ast};
use crate::core::arch::mode::Cm;

/// PS bit positions. CM occupies bits `1:0`, VMM bit 7, IPL bits `12:8`.
pub mod ps_bits {
    /// Current-mode field mask.
    pub const CM_MASK: u64 = 0x3;
    /// Current-mode field shift.
    pub const CM_SHIFT: u64 = 0;
    /// Virtual-machine-monitor bit.
    pub const VMM: u64 = 1 << 7;
    /// Interrupt-priority-level field mask (before shift).
    pub const IPL_MASK: u64 = 0x1F;
    /// Interrupt-priority-level field shift.
    pub const IPL_SHIFT: u64 = 8;
}

/// Number of PAL scratch quadwords carried in the HWPCB.
pub const PAL_SCRATCH_LEN: usize = 6;

/// Hardware Process Control Block: the per-process architectural record.
///
/// The `cm`, `ipl`, and `vmm` fields are projections of `ps` and always equal
/// the corresponding PS bitfields; use [`Hwpcb::set_ps`], [`Hwpcb::set_cm`],
/// and [`Hwpcb::set_ipl`] to keep them mirrored.
#[derive(Clone, Debug)]
#[repr(align(64))]
pub struct Hwpcb {
    /// Program counter. Bit 0 is the PAL-mode tag.
    pub pc: u64,
    /// Processor status word.
    ps: u64,
    /// Current mode; projection of `ps`.
    cm: Cm,
    /// Interrupt priority level; projection of `ps`.
    ipl: u8,
    /// VMM bit; projection of `ps`.
    vmm: bool,
    /// Address space number (8 bits).
    pub asn: u8,
    /// Per-mode stack pointers: KSP/ESP/SSP/USP, contiguous so that
    /// `sp[mode & 3]` selects without branching.
    sp: [u64; 4],
    /// Page table base register.
    pub ptbr: u64,
    /// Faulting virtual address, stored 43-bit sign-extended.
    fault_va: u64,
    /// Process cycle counter offset (low 32 bits significant).
    pcc_offset: u64,
    /// Unique process value (thread pointer).
    pub unq: u64,
    /// Floating-point enable.
    pub fen: bool,
    /// AST enable nibble (one bit per mode).
    pub asten: u8,
    /// AST summary nibble (one bit per mode).
    pub astsr: u8,
    /// Software interrupt summary register (levels 1..=15).
    pub sisr: u64,
    /// Software interrupt request register (write side of SISR).
    pub sirr: u64,
    /// Data-alignment trap fixup flag.
    pub dat: u64,
    /// PAL scratch quadwords.
    pub pal_scratch: [u64; PAL_SCRATCH_LEN],
    /// Processor serial number, 10 characters.
    pub serial: [u8; 10],
}

// The stack-pointer slots must stay a contiguous array so mode-indexed
// selection is a single load.
const _: () = assert!(size_of::<[u64; 4]>() == 32);

impl Default for Hwpcb {
    fn default() -> Self {
        Self::new()
    }
}

impl Hwpcb {
    /// Creates a zeroed HWPCB in kernel mode at IPL 31.
    pub fn new() -> Self {
        let mut pcb = Self {
            pc: 0,
            ps: 0,
            cm: Cm::Kernel,
            ipl: 0,
            vmm: false,
            asn: 0,
            sp: [0; 4],
            ptbr: 0,
            fault_va: 0,
            pcc_offset: 0,
            unq: 0,
            fen: false,
            asten: 0,
            astsr: 0,
            sisr: 0,
            sirr: 0,
            dat: 0,
            pal_scratch: [0; PAL_SCRATCH_LEN],
            serial: *b"EV6-EMUL00",
        };
        pcb.set_ps(u64::from(crate::common::constants::IPL_MAX) << ps_bits::IPL_SHIFT);
        pcb
    }

    /// Returns the PS word.
    #[inline(always)]
    pub fn ps(&self) -> u64 {
        self.ps
    }

    /// Sets the PS word and refreshes the CM/IPL/VMM projections.
    pub fn set_ps(&mut self, v: u64) {
        self.ps = v;
        self.cm = Cm::from_bits((v >> ps_bits::CM_SHIFT) & ps_bits::CM_MASK);
        self.ipl = ((v >> ps_bits::IPL_SHIFT) & ps_bits::IPL_MASK) as u8;
        self.vmm = v & ps_bits::VMM != 0;
    }

    /// Returns the current mode.
    #[inline(always)]
    pub fn cm(&self) -> Cm {
        self.cm
    }

    /// Sets the current mode, updating both PS and the projection.
    pub fn set_cm(&mut self, cm: Cm) {
        let ps = (self.ps & !(ps_bits::CM_MASK << ps_bits::CM_SHIFT))
            | (cm.bits() << ps_bits::CM_SHIFT);
        self.set_ps(ps);
    }

    /// Returns the current IPL.
    #[inline(always)]
    pub fn ipl(&self) -> u8 {
        self.ipl
    }

    /// Sets the IPL, updating both PS and the projection.
    pub fn set_ipl(&mut self, ipl: u8) {
        let ps = (self.ps & !(ps_bits::IPL_MASK << ps_bits::IPL_SHIFT))
            | (u64::from(ipl & 0x1F) << ps_bits::IPL_SHIFT);
        self.set_ps(ps);
    }

    /// Returns the VMM bit.
    #[inline(always)]
    pub fn vmm(&self) -> bool {
        self.vmm
    }

    /// Returns whether the PC carries the PAL-mode tag.
    #[inline(always)]
    pub fn in_pal_mode(&self) -> bool {
        self.pc & 1 != 0
    }

    /// Sets or clears the PAL-mode tag on a PC value, preserving all other bits.
    #[inline(always)]
    pub fn set_pal_mode(pc: u64, enable: bool) -> u64 {
        if enable { pc | 1 } else { pc & !1 }
    }

    /// Saves a stack pointer into its mode slot.
    #[inline(always)]
    pub fn save_sp(&mut self, mode: Cm, v: u64) {
        self.sp[mode.bits() as usize & 3] = v;
    }

    /// Loads the stack pointer for a mode.
    #[inline(always)]
    pub fn load_sp(&self, mode: Cm) -> u64 {
        self.sp[mode.bits() as usize & 3]
    }

    /// Returns the kernel stack pointer.
    #[inline(always)]
    pub fn ksp(&self) -> u64 {
        self.sp[0]
    }

    /// Stores the faulting VA, canonicalized to 43-bit sign-extended form.
    pub fn set_fault_va(&mut self, va: u64) {
        self.fault_va = sext_va(va);
    }

    /// Returns the (sign-extended) faulting VA.
    #[inline(always)]
    pub fn fault_va(&self) -> u64 {
        self.fault_va
    }

    /// Samples the process cycle counter against the hardware counter.
    ///
    /// The returned value is the accumulated per-process count in the low
    /// 32 bits; [`Hwpcb::restore_pcc`] is its inverse for those bits.
    pub fn save_pcc(&self, hw_counter: u64) -> u64 {
        self.pcc_offset.wrapping_add(hw_counter) & 0xFFFF_FFFF
    }

    /// Restores a saved process cycle count as an offset relative to the
    /// hardware counter.
    pub fn restore_pcc(&mut self, saved: u64, hw_counter: u64) {
        self.pcc_offset = saved.wrapping_sub(hw_counter) & 0xFFFF_FFFF;
    }

    /// Returns the packed AST byte (summary high nibble, enable low nibble).
    pub fn ast_packed(&self) -> u8 {
        pack_ast(self.astsr, self.asten)
    }

    /// Loads the AST nibbles from their packed PCB byte.
    pub fn set_ast_packed(&mut self, packed: u8) {
        let (sr, en) = unpack_ast(packed);
        self.astsr = sr;
        self.asten = en;
    }

    /// Zeroes the block back to its reset state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

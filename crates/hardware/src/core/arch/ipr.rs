//! Internal Processor Registers.
//!
//! This module defines the three cache-line-partitioned IPR records carried
//! per CPU:
//! 1. **Run-loop IPRs:** Cycle counters, PCC division state, the cached
//!    interrupt-pending flag, PAL personality, and halt state.
//! 2. **PAL IPRs:** System base addresses, box control words, exception
//!    summary/mask with the architectural EXC_SUM write semantics, memory
//!    management status, TLB staging scratch, and the 32 PAL temporaries.
//! 3. **OSF Personality IPRs:** The OSF/1 PALcode entry vector line.

use crate::common::error::{ArithTrap, HaltCode};

/// Mask of the writable EXC_SUM arithmetic flag bits (16:10).
pub const EXC_SUM_WRITE_MASK: u64 = 0x1_FC00;

/// PAL personality resident in the PAL image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Personality {
    /// OpenVMS PALcode.
    #[default]
    Vms,
    /// OSF/1 (Tru64) PALcode.
    Osf,
    /// SRM console PALcode.
    Console,
}

impl Personality {
    /// Returns whether this personality runs with the PAL shadow banks enabled.
    pub fn uses_shadow(self) -> bool {
        !matches!(self, Self::Console)
    }
}

/// Run-loop IPRs: the state the tick loop touches every cycle, on one line.
#[derive(Clone, Debug, Default)]
#[repr(align(64))]
pub struct RunIprs {
    /// Free-running system cycle counter.
    pub system_cc: u64,
    /// Cycle counter control word.
    pub cc_ctl: u64,
    /// Process-cycle-counter division ratio (host ticks per PCC tick).
    pub pcc_ratio: u32,
    /// PCC fraction accumulator.
    pub pcc_frac: u32,
    /// Hardware counter value at the last PCC sample.
    pub pcc_last_sample: u64,
    /// Cached per-CPU interrupt-pending flag, refreshed from the IRQ summary.
    pub int_pending: bool,
    /// PAL personality tag.
    pub personality: Personality,
    /// Halt state; `Some` parks the CPU thread.
    pub halt: Option<HaltCode>,
}

impl RunIprs {
    /// Advances the system cycle counter and accumulates the PCC fraction.
    ///
    /// Returns the number of PCC ticks earned this call (0 or 1 at ratio ≥ 1).
    pub fn tick_counters(&mut self) -> u32 {
        self.system_cc = self.system_cc.wrapping_add(1);
        if self.pcc_ratio == 0 {
            return 0;
        }
        self.pcc_frac += 1;
        if self.pcc_frac >= self.pcc_ratio {
            self.pcc_frac = 0;
            self.pcc_last_sample = self.system_cc;
            1
        } else {
            0
        }
    }

    /// Zeroes the record back to reset state.
    pub fn reset(&mut self) {
        *self = Self {
            pcc_ratio: 1,
            ..Self::default()
        };
    }
}

/// PAL IPRs: state accessed via HW_MTPR/HW_MFPR, not by general instructions.
#[derive(Clone, Debug, Default)]
#[repr(align(64))]
pub struct PalIprs {
    /// PAL image base physical address.
    pub pal_base: u64,
    /// System control block base.
    pub scbb: u64,
    /// Process control block base.
    pub pcbb: u64,
    /// Virtual page table base.
    pub vptb: u64,
    /// Processor base register (per-CPU data pointer).
    pub prbr: u64,
    /// Virtual address boundary register.
    pub virbnd: u64,
    /// System page table base.
    pub sysptbr: u64,
    /// Machine check error summary.
    pub mces: u64,
    /// Who-Am-I: this CPU's identity.
    pub whami: u64,
    /// I-box control word.
    pub i_ctl: u64,
    /// D-cache control word.
    pub dc_ctl: u64,
    /// Exception summary; see [`PalIprs::write_exc_sum`].
    exc_sum: u64,
    /// Exception register mask.
    pub exc_mask: u64,
    /// Memory-management fault status.
    pub mm_stat: u64,
    /// Saved PC at exception entry.
    pub exc_addr: u64,
    /// Faulting VA latched for PAL.
    pub fault_va: u64,
    /// TLB staging scratch pairs (tag/PTE for I and D sides).
    pub tlb_scratch: [[u64; 2]; 2],
    /// Deferred-write flag set for staged IPR updates.
    pub deferred_writes: u32,
    /// PAL temporaries.
    pub pal_temps: [u64; 32],
}

impl PalIprs {
    /// Reads the exception summary. Bits above 16 read as zero.
    #[inline(always)]
    pub fn exc_sum(&self) -> u64 {
        self.exc_sum & EXC_SUM_WRITE_MASK
    }

    /// Writes the exception summary with the architectural semantics: bits
    /// 16:10 are cleared and reloaded from the incoming value; all other
    /// incoming bits are ignored.
    pub fn write_exc_sum(&mut self, v: u64) {
        self.exc_sum = v & EXC_SUM_WRITE_MASK;
    }

    /// ORs in the flag for a detected arithmetic condition.
    pub fn or_arith(&mut self, kind: ArithTrap) {
        self.exc_sum |= kind.exc_sum_bit();
    }

    /// Zeroes the record.
    pub fn reset(&mut self) {
        let whami = self.whami;
        *self = Self::default();
        // Identity survives reset: WHAMI is wired at CPU construction.
        self.whami = whami;
    }
}

/// OSF personality IPRs: the OSF/1 PALcode dispatch vector line.
#[derive(Clone, Debug, Default)]
#[repr(align(64))]
pub struct OsfIprs {
    /// Virtual page table pointer.
    pub vptptr: u64,
    /// Interrupt/exception entry.
    pub ent_int: u64,
    /// Arithmetic trap entry.
    pub ent_arith: u64,
    /// Memory-management fault entry.
    pub ent_mm: u64,
    /// Instruction fault entry.
    pub ent_fault: u64,
    /// Unaligned access entry.
    pub ent_una: u64,
    /// System call entry.
    pub ent_sys: u64,
    /// Work-in-progress global pointer save.
    pub wrkgp: u64,
}

impl OsfIprs {
    /// Zeroes the record.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

//! Per-CPU Architectural State Master.
//!
//! This module owns the complete architectural state of every emulated CPU.
//! It provides:
//! 1. **Record Bundle:** `CpuState` groups the register files, shadow banks,
//!    HWPCB, and IPR lines for one CPU.
//! 2. **Snapshot Pair:** A shadow copy of IntRegs/FloatRegs/HWPCB saved at PAL
//!    entry and consumed by HW_REI; shadow banks and IPRs do not participate.
//! 3. **State Master:** The singleton indexed by CPU id, created at emulator
//!    startup and destroyed at shutdown.
//! 4. **Views:** A per-thread `CpuView` that binds once and exposes the records
//!    with no indirection on the hot path.

use std::cell::UnsafeCell;

use crate::common::constants::MAX_CPUS;
use crate::core::arch::fpreg::FloatRegs;
use crate::core::arch::hwpcb::Hwpcb;
use crate::core::arch::intreg::IntRegs;
use crate::core::arch::ipr::{OsfIprs, PalIprs, RunIprs};
use crate::core::arch::shadow::PalShadow;

/// The context snapshot saved around PAL entry.
///
/// Holds copies of the three records that participate in save/restore;
/// PAL shadow banks and all IPR lines are deliberately excluded.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Saved integer registers.
    pub int: IntRegs,
    /// Saved FP registers and FPCR.
    pub fp: FloatRegs,
    /// Saved HWPCB.
    pub hwpcb: Hwpcb,
}

/// Complete architectural state for one CPU.
#[derive(Clone, Debug)]
pub struct CpuState {
    /// Integer register file.
    pub int: IntRegs,
    /// FP register file and FPCR.
    pub fp: FloatRegs,
    /// PAL shadow banks.
    pub shadow: PalShadow,
    /// Hardware process control block.
    pub hwpcb: Hwpcb,
    /// Run-loop IPR line.
    pub run: RunIprs,
    /// PAL IPR line.
    pub pal: PalIprs,
    /// OSF personality IPR line.
    pub osf: OsfIprs,
    /// Context snapshot pair.
    pub snapshot: Snapshot,
}

impl CpuState {
    /// Creates a zeroed CPU state with its identity wired into WHAMI.
    pub fn new(cpu_id: usize) -> Self {
        let mut state = Self {
            int: IntRegs::new(),
            fp: FloatRegs::new(),
            shadow: PalShadow::new(),
            hwpcb: Hwpcb::new(),
            run: RunIprs::default(),
            pal: PalIprs::default(),
            osf: OsfIprs::default(),
            snapshot: Snapshot::default(),
        };
        state.run.pcc_ratio = 1;
        state.pal.whami = cpu_id as u64;
        state
    }

    /// Reads an integer register; R31 reads 0.
    ///
    /// While PAL shadow mode is enabled, the shadowed subset (R4-R7,
    /// R20-R23) resolves to the shadow banks instead of the architectural
    /// file; the interrupted context underneath stays untouched.
    #[inline(always)]
    pub fn read_int(&self, reg: usize) -> u64 {
        if self.shadow.is_enabled() {
            if let Some((bank, idx)) = PalShadow::shadows(reg) {
                return self.shadow.read(bank, idx);
            }
        }
        self.int.read(reg)
    }

    /// Writes an integer register; writes to R31 are discarded.
    ///
    /// Shadowed registers land in the banks while shadow mode is enabled;
    /// see [`CpuState::read_int`].
    #[inline(always)]
    pub fn write_int(&mut self, reg: usize, v: u64) {
        if self.shadow.is_enabled() {
            if let Some((bank, idx)) = PalShadow::shadows(reg) {
                self.shadow.write(bank, idx, v);
                return;
            }
        }
        self.int.write(reg, v);
    }

    /// Reads an FP register; F31 reads 0.
    #[inline(always)]
    pub fn read_fp(&self, reg: usize) -> u64 {
        self.fp.read(reg)
    }

    /// Writes an FP register; writes to F31 are discarded.
    #[inline(always)]
    pub fn write_fp(&mut self, reg: usize, v: u64) {
        self.fp.write(reg, v);
    }

    /// Reads a shadow register; out-of-range indices read 0.
    #[inline(always)]
    pub fn read_shadow(&self, bank: usize, idx: usize) -> u64 {
        self.shadow.read(bank, idx)
    }

    /// Writes a shadow register; out-of-range writes are discarded.
    #[inline(always)]
    pub fn write_shadow(&mut self, bank: usize, idx: usize, v: u64) {
        self.shadow.write(bank, idx, v);
    }

    /// Copies IntRegs, FloatRegs, and the HWPCB into the snapshot pair.
    pub fn save_context(&mut self) {
        self.snapshot.int = self.int.clone();
        self.snapshot.fp = self.fp.clone();
        self.snapshot.hwpcb = self.hwpcb.clone();
    }

    /// Restores IntRegs, FloatRegs, and the HWPCB from the snapshot pair.
    pub fn restore_context(&mut self) {
        self.int = self.snapshot.int.clone();
        self.fp = self.snapshot.fp.clone();
        self.hwpcb = self.snapshot.hwpcb.clone();
    }

    /// Zeroes every record and the snapshot pair.
    pub fn reset(&mut self) {
        let whami = self.pal.whami;
        *self = Self::new(whami as usize);
    }
}

/// Singleton store of all per-CPU architectural state, indexed by CPU id.
///
/// Created once at emulator startup. Each CPU thread binds a [`CpuView`]
/// at thread start and uses it exclusively from that thread.
#[derive(Debug)]
pub struct StateMaster {
    cpus: Box<[UnsafeCell<CpuState>]>,
}

// SAFETY: Each `UnsafeCell<CpuState>` is accessed only through the `CpuView`
// bound to its owning CPU thread (enforced by the one-view-per-cpu contract
// of `StateMaster::view`); the slots of distinct CPUs never alias.
unsafe impl Sync for StateMaster {}

impl StateMaster {
    /// Allocates state for `num_cpus` CPUs (clamped to `MAX_CPUS`).
    pub fn new(num_cpus: usize) -> Self {
        let n = num_cpus.clamp(1, MAX_CPUS);
        let cpus = (0..n)
            .map(|id| UnsafeCell::new(CpuState::new(id)))
            .collect();
        Self { cpus }
    }

    /// Returns the number of allocated CPUs.
    pub fn num_cpus(&self) -> usize {
        self.cpus.len()
    }

    /// Folds a CPU id into the allocated range.
    ///
    /// Callers must not rely on the fold; bounded ids are part of the
    /// caller contract and the test suite asserts them.
    #[inline(always)]
    fn fold(&self, cpu: usize) -> usize {
        cpu % self.cpus.len()
    }

    /// Binds the view for one CPU. Call exactly once per CPU, from the
    /// thread that will own it.
    pub fn view(&self, cpu: usize) -> CpuView {
        CpuView {
            state: self.cpus[self.fold(cpu)].get(),
        }
    }

    /// Reads an integer register on the given CPU; R31 reads 0.
    pub fn read_int(&self, cpu: usize, reg: usize) -> u64 {
        // SAFETY: See `Sync` impl; callers serialize access per CPU id.
        unsafe { (*self.cpus[self.fold(cpu)].get()).read_int(reg) }
    }

    /// Writes an integer register on the given CPU; R31 writes are discarded.
    pub fn write_int(&self, cpu: usize, reg: usize, v: u64) {
        // SAFETY: See `Sync` impl; callers serialize access per CPU id.
        unsafe { (*self.cpus[self.fold(cpu)].get()).write_int(reg, v) }
    }

    /// Zeroes all records and the snapshot pair for one CPU.
    pub fn reset_cpu(&self, cpu: usize) {
        // SAFETY: See `Sync` impl; callers serialize access per CPU id.
        unsafe { (*self.cpus[self.fold(cpu)].get()).reset() }
    }
}

/// Zero-indirection view over one CPU's architectural state.
///
/// Bound once per CPU thread via [`StateMaster::view`]; dereferences to
/// [`CpuState`] with no index arithmetic on the hot path.
///
/// # Safety Invariants
///
/// - The pointer targets a `CpuState` slot owned by the `StateMaster`, which
///   outlives every view (views are handed to CPU threads joined before the
///   master is dropped).
/// - At most one view exists per CPU id, and it is used only from the thread
///   that bound it.
#[derive(Debug)]
pub struct CpuView {
    state: *mut CpuState,
}

// SAFETY: A view migrates to its owning CPU thread exactly once at startup;
// after binding, all access is single-threaded (see invariants above).
unsafe impl Send for CpuView {}

impl std::ops::Deref for CpuView {
    type Target = CpuState;

    #[inline(always)]
    fn deref(&self) -> &CpuState {
        // SAFETY: See the view's safety invariants.
        unsafe { &*self.state }
    }
}

impl std::ops::DerefMut for CpuView {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut CpuState {
        // SAFETY: See the view's safety invariants.
        unsafe { &mut *self.state }
    }
}

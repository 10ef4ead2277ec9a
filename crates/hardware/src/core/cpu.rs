//! Per-CPU execution context.
//!
//! `Cpu` bundles everything one CPU thread touches while ticking: its bound
//! architectural state view, the shared memory plane, the interrupt pending
//! set, the branch predictor, and statistics. The pipeline lives separately
//! in `Simulator`; stage functions receive both.

use std::sync::Arc;

use crate::common::addr::VirtAddr;
use crate::common::error::{MchkReason, TrapClass};
use crate::core::arch::state::{CpuView, StateMaster};
use crate::core::irq::IrqPending;
use crate::core::units::BranchPredictor;
use crate::soc::memory::GuestMemory;
use crate::soc::mmio::{MmioRegistry, MmioStatus};
use crate::soc::reservation::ReservationManager;
use crate::stats::SimStats;

/// One CPU thread's execution context.
#[derive(Debug)]
pub struct Cpu {
    /// CPU id (WHAMI).
    pub id: usize,
    /// Bound view over this CPU's architectural state.
    pub view: CpuView,
    /// Keeps the state-master allocation alive for the view's lifetime.
    master: Arc<StateMaster>,
    /// Shared guest RAM.
    pub mem: Arc<GuestMemory>,
    /// Shared, finalized MMIO registry.
    pub mmio: Arc<MmioRegistry>,
    /// Shared LL/SC reservation table.
    pub reservations: Arc<ReservationManager>,
    /// This CPU's interrupt pending set.
    pub irq: Arc<IrqPending>,
    /// Branch predictor.
    pub bru: BranchPredictor,
    /// Statistics counters.
    pub stats: SimStats,
    /// Per-stage instruction tracing.
    pub trace: bool,
}

impl Cpu {
    /// Creates the context for one CPU.
    pub fn new(
        id: usize,
        view: CpuView,
        master: Arc<StateMaster>,
        mem: Arc<GuestMemory>,
        mmio: Arc<MmioRegistry>,
        reservations: Arc<ReservationManager>,
        irq: Arc<IrqPending>,
        btb_size: usize,
    ) -> Self {
        Self {
            id,
            view,
            master,
            mem,
            mmio,
            reservations,
            irq,
            bru: BranchPredictor::new(btb_size),
            stats: SimStats::new(),
            trace: false,
        }
    }

    /// Returns whether per-stage tracing is active.
    #[inline(always)]
    pub fn trace_enabled(&self) -> bool {
        self.trace || cfg!(feature = "always-trace")
    }

    /// The state master this CPU's view is bound into.
    pub fn master(&self) -> &Arc<StateMaster> {
        &self.master
    }

    /// Translates a data VA to a PA.
    ///
    /// Kseg addresses map linearly onto physical memory; everything else is
    /// identity-mapped (console and bootstrap environments run physical;
    /// per-process mapping is PALcode's business, expressed through kseg
    /// and the PTBR it maintains).
    pub fn translate_data(&self, va: u64) -> u64 {
        let va = VirtAddr::new(va);
        va.kseg_to_pa().map_or(va.val(), |pa| pa.val())
    }

    /// Checks natural alignment for a data access.
    ///
    /// # Errors
    ///
    /// Returns [`TrapClass::Unaligned`] when `va` is not `width`-aligned.
    pub fn check_align(&self, va: u64, width: u64) -> Result<(), TrapClass> {
        if width > 1 && va % width != 0 {
            Err(TrapClass::Unaligned)
        } else {
            Ok(())
        }
    }

    /// Loads `width` bytes from a physical address, routing RAM and MMIO.
    ///
    /// # Errors
    ///
    /// MMIO width violations surface as [`TrapClass::DtbAcv`], misalignment
    /// as [`TrapClass::Alignment`]; unmapped space is a machine check.
    pub fn load_pa(&mut self, pa: u64, width: u64) -> Result<u64, TrapClass> {
        if self.mem.is_ram(pa, width) {
            return Ok(match width {
                1 => u64::from(self.mem.read8(pa)),
                2 => u64::from(self.mem.read16(pa)),
                4 => u64::from(self.mem.read32(pa)),
                _ => self.mem.read64(pa),
            });
        }
        let mut out = 0u64;
        match self.mmio.handle_read(pa, width as u8, &mut out) {
            MmioStatus::Ok => Ok(out),
            MmioStatus::Misaligned => Err(TrapClass::Alignment),
            MmioStatus::AccessViolation => Err(TrapClass::DtbAcv),
            MmioStatus::OutOfRange => Err(TrapClass::MachineCheck(MchkReason::MemoryBus)),
        }
    }

    /// Stores `width` bytes to a physical address, routing RAM and MMIO.
    ///
    /// RAM stores break intersecting reservations (cross-CPU observable);
    /// the caller is the writeback stage's store commit.
    ///
    /// # Errors
    ///
    /// Same mapping as [`Cpu::load_pa`].
    pub fn store_pa(&mut self, pa: u64, width: u64, val: u64) -> Result<(), TrapClass> {
        if self.mem.is_ram(pa, width) {
            let _ = match width {
                1 => self.mem.write8(pa, val as u8),
                2 => self.mem.write16(pa, val as u16),
                4 => self.mem.write32(pa, val as u32),
                _ => self.mem.write64(pa, val),
            };
            self.reservations.break_on_cache_line(pa);
            return Ok(());
        }
        match self.mmio.handle_write(self.id, pa, width as u8, val) {
            MmioStatus::Ok => Ok(()),
            MmioStatus::Misaligned => Err(TrapClass::Alignment),
            MmioStatus::AccessViolation => Err(TrapClass::DtbAcv),
            MmioStatus::OutOfRange => Err(TrapClass::MachineCheck(MchkReason::MemoryBus)),
        }
    }
}

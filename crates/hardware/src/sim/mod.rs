//! Simulation: the shared machine and the per-CPU simulator.
//!
//! `MachineBuilder` assembles the shared plane (guest RAM, MMIO registry,
//! reservations, DMA coherency, per-CPU interrupt state) and freezes it
//! into a `Machine`. Each CPU thread then binds a `Simulator`, which owns
//! that CPU's architectural view and pipeline side-by-side.

/// The per-CPU simulator and run loop.
pub mod simulator;

use std::sync::Arc;

use crate::common::constants::swi_scb_vector;
use crate::common::error::CoreError;
use crate::config::Config;
use crate::core::arch::state::StateMaster;
use crate::core::cpu::Cpu;
use crate::core::irq::{IrqPending, TriggerMode};
use crate::soc::dma::{Coherency, DmaCoherency};
use crate::soc::memory::GuestMemory;
use crate::soc::mmio::{MmioHandler, MmioRegistry, RegionDesc};
use crate::soc::reservation::ReservationManager;

/// Builder over the shared machine plane.
///
/// Device initialization happens here: MMIO regions, interrupt sources,
/// and DMA coherency attributes are all registered before `build` freezes
/// the configuration.
#[derive(Debug)]
pub struct MachineBuilder {
    config: Config,
    mem: Arc<GuestMemory>,
    mmio: MmioRegistry,
    irqs: Vec<IrqPending>,
    reservations: Arc<ReservationManager>,
    dma: DmaCoherency,
}

impl MachineBuilder {
    /// Starts a builder, allocating guest RAM per the configuration.
    ///
    /// Software-interrupt sources (ids 1..=15, one per level, edge-
    /// triggered) are pre-registered on every CPU; device sources should
    /// use ids 16 and up.
    ///
    /// # Errors
    ///
    /// Fails when guest RAM cannot be allocated.
    pub fn new(config: Config) -> Result<Self, CoreError> {
        let mem = Arc::new(GuestMemory::new(
            config.system.ram_base,
            config.system.ram_size,
        )?);
        let reservations = Arc::new(ReservationManager::new());
        let dma = DmaCoherency::new(Arc::clone(&mem), Arc::clone(&reservations));

        let mut irqs: Vec<IrqPending> = (0..config.system.num_cpus.max(1))
            .map(|_| IrqPending::new())
            .collect();
        for irq in &mut irqs {
            for level in 1..=15u8 {
                let _ = irq.register_source(
                    u32::from(level),
                    level,
                    swi_scb_vector(level),
                    TriggerMode::Edge,
                );
            }
        }

        Ok(Self {
            config,
            mem,
            mmio: MmioRegistry::new(),
            irqs,
            reservations,
            dma,
        })
    }

    /// Registers an MMIO region.
    ///
    /// # Errors
    ///
    /// See [`MmioRegistry::register_region`].
    pub fn register_region(
        &mut self,
        desc: RegionDesc,
        handler: Arc<dyn MmioHandler>,
    ) -> Result<(), CoreError> {
        self.mmio.register_region(desc, handler)
    }

    /// Registers an interrupt source on one CPU.
    pub fn register_irq_source(
        &mut self,
        cpu: usize,
        id: u32,
        ipl: u8,
        vector: u64,
        trigger: TriggerMode,
    ) -> bool {
        match self.irqs.get_mut(cpu) {
            Some(irq) => irq.register_source(id, ipl, vector, trigger),
            None => false,
        }
    }

    /// Registers a DMA-capable device's coherency attribute.
    pub fn register_dma_device(&mut self, device_uid: u64, coherency: Coherency) {
        self.dma.register_device(device_uid, coherency);
    }

    /// Borrows guest RAM for pre-run image loading.
    pub fn mem(&self) -> &GuestMemory {
        &self.mem
    }

    /// Finalizes the MMIO registry and freezes the machine.
    pub fn build(mut self) -> Machine {
        self.mmio.finalize();
        Machine {
            state: Arc::new(StateMaster::new(self.config.system.num_cpus)),
            mem: self.mem,
            mmio: Arc::new(self.mmio),
            reservations: self.reservations,
            irqs: self.irqs.into_iter().map(Arc::new).collect(),
            dma: Arc::new(self.dma),
            config: self.config,
        }
    }
}

/// The frozen shared machine plane.
#[derive(Debug)]
pub struct Machine {
    /// Per-CPU architectural state master.
    pub state: Arc<StateMaster>,
    /// Guest RAM.
    pub mem: Arc<GuestMemory>,
    /// Finalized MMIO registry.
    pub mmio: Arc<MmioRegistry>,
    /// LL/SC reservation table.
    pub reservations: Arc<ReservationManager>,
    /// Per-CPU interrupt pending state.
    pub irqs: Vec<Arc<IrqPending>>,
    /// DMA coherency manager, handed to device emulators.
    pub dma: Arc<DmaCoherency>,
    /// The configuration the machine was built from.
    pub config: Config,
}

impl Machine {
    /// Builds a machine with the default configuration and no devices.
    ///
    /// # Errors
    ///
    /// Fails when guest RAM cannot be allocated.
    pub fn with_defaults() -> Result<Self, CoreError> {
        Ok(MachineBuilder::new(Config::default())?.build())
    }

    /// Binds the execution context for one CPU.
    ///
    /// Call once per CPU, from the thread that will run it. Initializes the
    /// CPU's PAL base, SCBB, and PCC ratio from the machine configuration.
    pub fn bind_cpu(&self, id: usize) -> Cpu {
        let mut view = self.state.view(id);
        view.pal.pal_base = self.config.system.pal_base;
        view.pal.scbb = self.config.system.scbb;
        view.run.pcc_ratio = self.config.system.pcc_ratio;
        let mut cpu = Cpu::new(
            id,
            view,
            Arc::clone(&self.state),
            Arc::clone(&self.mem),
            Arc::clone(&self.mmio),
            Arc::clone(&self.reservations),
            Arc::clone(&self.irqs[id % self.irqs.len()]),
            self.config.pipeline.btb_size,
        );
        cpu.trace = self.config.general.trace;
        cpu
    }
}

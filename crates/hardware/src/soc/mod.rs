//! System plane: guest memory, MMIO fabric, reservations, DMA coherency.
//!
//! This module implements everything outside the CPU core proper:
//! 1. **Guest Memory:** The mmap-backed RAM image with width-typed accessors.
//! 2. **MMIO:** The sorted region registry and access dispatcher.
//! 3. **Reservations:** Per-CPU LL/SC reservations at cache-line granularity.
//! 4. **DMA:** Coherency hooks invoked by device emulators around DMA.

/// DMA coherency hooks and target validation.
pub mod dma;

/// Guest RAM image.
pub mod memory;

/// MMIO region registry and dispatcher.
pub mod mmio;

/// LL/SC reservation manager.
pub mod reservation;

pub use dma::DmaCoherency;
pub use memory::GuestMemory;
pub use mmio::{MmioRegistry, MmioStatus};
pub use reservation::ReservationManager;

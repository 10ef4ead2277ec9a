//! Alpha AXP (EV6/21264) full-system emulator core.
//!
//! This crate implements the processor core of an Alpha AXP emulator with the following:
//! 1. **Core:** 6-stage in-order pipeline with deferred writeback, per-CPU architectural
//!    state (integer/float/shadow registers, HWPCB, IPRs), and PAL trap delivery.
//! 2. **Interrupts:** Per-CPU, cross-thread-safe pending state with IPL-gated claim.
//! 3. **Memory:** Guest RAM, MMIO region registry and dispatcher, LL/SC reservations,
//!    and DMA coherency hooks.
//! 4. **ISA:** The decoded-grain contract plus a builtin grain set used by the run
//!    loop and the test suite (full decoder tables are an external collaborator).
//! 5. **Simulation:** `Simulator` (owns CPU state + pipeline + delivery), configuration,
//!    and statistics.

/// Common types and constants (addresses, sign extension, traps, halt codes).
pub mod common;
/// Emulator configuration (defaults, hierarchical config structures).
pub mod config;
/// CPU core: architectural state master, IRQ pending state, PAL delivery, pipeline.
pub mod core;
/// Decoded-grain contract and the builtin grain set.
pub mod isa;
/// Simulation: `Simulator` and the per-CPU run loop.
pub mod sim;
/// System plane: guest memory, MMIO registry, reservations, DMA coherency.
pub mod soc;
/// Emulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Per-CPU architectural state bundle.
pub use crate::core::arch::state::CpuState;
/// Top-level per-CPU simulator; owns the CPU view and pipeline side-by-side.
pub use crate::sim::simulator::Simulator;
/// Shared machine (RAM, MMIO registry, reservations, IRQ state).
pub use crate::sim::Machine;

//! CPU core: architectural state, interrupt pending state, PAL delivery, pipeline.
//!
//! This module contains everything that belongs to one emulated processor:
//! 1. **Arch:** Register files, shadow banks, HWPCB, IPRs, and the state master.
//! 2. **IRQ:** The cross-thread-safe interrupt pending set with IPL-gated claim.
//! 3. **PAL:** Vector computation, context switch, AST eligibility, SCB decode,
//!    PAL entry and HW_REI.
//! 4. **Pipeline:** The 6-stage ring-buffer engine with deferred writeback.
//! 5. **Units:** Branch prediction.

/// Architectural state records and the per-CPU state master.
pub mod arch;

/// Per-CPU execution context bundle.
pub mod cpu;

/// Per-CPU interrupt pending state.
pub mod irq;

/// PAL trap delivery: vectors, SWPCTX, ASTs, SCB, entry/return.
pub mod pal;

/// 6-stage in-order pipeline engine.
pub mod pipeline;

/// Execution-support units (branch prediction).
pub mod units;

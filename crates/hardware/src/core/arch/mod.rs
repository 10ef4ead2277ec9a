//! Architectural state records and the per-CPU state master.
//!
//! Cache-line-partitioned records, one set per CPU:
//! 1. **Register Files:** Integer (R31 hardwired zero) and FP (F31 hardwired).
//! 2. **Shadow Banks:** PAL-private register banks excluded from snapshots.
//! 3. **HWPCB:** The hardware process control block with PS projections.
//! 4. **IPRs:** Run-loop, PAL, and OSF personality lines.
//! 5. **State Master:** Singleton indexed by CPU id, with per-thread views.

/// FP register file and FPCR.
pub mod fpreg;

/// Hardware process control block.
pub mod hwpcb;

/// Integer register file.
pub mod intreg;

/// Internal processor register lines.
pub mod ipr;

/// Processor privilege modes.
pub mod mode;

/// PAL shadow register banks.
pub mod shadow;

/// State master, CPU state bundle, and views.
pub mod state;

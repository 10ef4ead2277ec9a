//! PAL trap delivery.
//!
//! This module implements the PALcode transfer model:
//! 1. **Vectors:** Exception and CALL_PAL entry-point computation with the
//!    CALL_PAL privilege rules.
//! 2. **SWPCTX:** The EV6 hardware context-switch algorithm.
//! 3. **ASTs:** Asynchronous system trap eligibility.
//! 4. **SCB:** System control block entry decode and stack disposition.
//! 5. **Entry/Return:** Context snapshot around PAL entry and HW_REI.

/// AST eligibility scan.
pub mod ast;

/// PAL entry and HW_REI.
pub mod entry;

/// SCB entry decode and stack disposition.
pub mod scb;

/// SWPCTX context switch.
pub mod swpctx;

/// Vector computation and CALL_PAL validation.
pub mod vector;

//! 6-stage in-order pipeline.
//!
//! This module contains the ring-buffered pipeline infrastructure:
//! 1. **Engine:** The 6-slot ring, tick loop, flush semantics, and step results.
//! 2. **Grain Contract:** The decoded-instruction descriptor and execution
//!    dispatch the external decoder supplies.
//! 3. **Slots:** Per-ring-entry state including the deferred-commit record.
//! 4. **Scoreboard:** EBox/FBox dirty-register tracking with clear hints.
//! 5. **Hazards:** The dual-issue gate over execution-unit resource classes.
//! 6. **Stages:** One function per stage, run in reverse order each tick.

/// Pipeline engine: ring buffer, tick, flush.
pub mod engine;

/// Decoded-grain contract: `DecodedInst`, `Grain`, `FetchResult`.
pub mod grain;

/// Dual-issue gate and hazard checks.
pub mod hazards;

/// Dirty-register scoreboards.
pub mod scoreboard;

/// Pipeline slot and deferred-commit records.
pub mod slot;

/// Stage functions (IF, DE, IS, EX, MEM, WB).
pub mod stages;

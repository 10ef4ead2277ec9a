//! Pipeline stage functions.
//!
//! One module per stage, run in reverse order (WB first) each tick. Every
//! stage operates on the slot at its ring position and advances the slot's
//! stage tag; the tags keep re-entered stages idle across stall ticks.

/// Decode stage.
pub mod decode;

/// Execute stage.
pub mod execute;

/// Instruction fetch stage.
pub mod fetch;

/// Issue stage.
pub mod issue;

/// Memory access stage.
pub mod memory;

/// Writeback / retire stage.
pub mod writeback;

//! Instruction-set surface.
//!
//! The full decoder tables live in the I-box, an external collaborator;
//! what this module owns is the decoded-grain vocabulary:
//! 1. **Opcodes:** The Alpha major opcode numbers and MISC function codes.
//! 2. **Grains:** Builders producing `(DecodedInst, Grain)` pairs for the
//!    instructions the run loop and the test suite exercise.

/// Builtin grain builders and execute functions.
pub mod grains;

/// Alpha major opcode numbers.
pub mod opcodes;

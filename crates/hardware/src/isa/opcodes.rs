//! Alpha major opcode numbers.
//!
//! Only the opcodes the builtin grain set speaks; the external decoder
//! covers the full map.

/// CALL_PAL.
pub const CALL_PAL: u8 = 0x00;
/// LDA: load address.
pub const LDA: u8 = 0x08;
/// LDAH: load address high.
pub const LDAH: u8 = 0x09;
/// LDBU: load zero-extended byte.
pub const LDBU: u8 = 0x0A;
/// LDWU: load zero-extended word.
pub const LDWU: u8 = 0x0C;
/// INTA: integer arithmetic operate group.
pub const INTA: u8 = 0x10;
/// INTL: integer logical operate group.
pub const INTL: u8 = 0x11;
/// INTS: integer shift operate group.
pub const INTS: u8 = 0x12;
/// MISC: memory barriers and miscellany.
pub const MISC: u8 = 0x18;
/// JSR group: JMP/JSR/RET/JSR_COROUTINE.
pub const JSR_GRP: u8 = 0x1A;
/// LDS: load S_floating.
pub const LDS: u8 = 0x22;
/// LDT: load T_floating.
pub const LDT: u8 = 0x23;
/// STT: store T_floating.
pub const STT: u8 = 0x27;
/// LDL: load sign-extended longword.
pub const LDL: u8 = 0x28;
/// LDQ: load quadword.
pub const LDQ: u8 = 0x29;
/// LDL_L: load longword locked.
pub const LDL_L: u8 = 0x2A;
/// LDQ_L: load quadword locked.
pub const LDQ_L: u8 = 0x2B;
/// STL: store longword.
pub const STL: u8 = 0x2C;
/// STQ: store quadword.
pub const STQ: u8 = 0x2D;
/// STL_C: store longword conditional.
pub const STL_C: u8 = 0x2E;
/// STQ_C: store quadword conditional.
pub const STQ_C: u8 = 0x2F;
/// BR: unconditional branch.
pub const BR: u8 = 0x30;
/// BSR: branch to subroutine.
pub const BSR: u8 = 0x34;
/// BLBC: branch on low bit clear.
pub const BLBC: u8 = 0x38;
/// BEQ: branch on equal to zero.
pub const BEQ: u8 = 0x39;
/// BLT: branch on less than zero.
pub const BLT: u8 = 0x3A;
/// BLE: branch on less than or equal to zero.
pub const BLE: u8 = 0x3B;
/// BLBS: branch on low bit set.
pub const BLBS: u8 = 0x3C;
/// BNE: branch on not equal to zero.
pub const BNE: u8 = 0x3D;
/// BGE: branch on greater than or equal to zero.
pub const BGE: u8 = 0x3E;
/// BGT: branch on greater than zero.
pub const BGT: u8 = 0x3F;

/// MISC function code for MB.
pub const FUNC_MB: u32 = 0x4000;
/// MISC function code for WMB.
pub const FUNC_WMB: u32 = 0x4400;

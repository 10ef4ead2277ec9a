//! # Floating-Point Register File Tests
//!
//! F31 hardwired-zero invariants and FPCR storage.

use axp_core::core::arch::fpreg::FloatRegs;
use proptest::prelude::*;

#[test]
fn test_new_initializes_to_zero() {
    let regs = FloatRegs::new();
    for i in 0..32 {
        assert_eq!(regs.read(i), 0);
    }
    assert_eq!(regs.read_fpcr(), 0);
}

#[test]
fn test_f31_writes_discarded() {
    let mut regs = FloatRegs::new();
    regs.write(31, 0x3FF0_0000_0000_0000);
    assert_eq!(regs.read(31), 0);
}

#[test]
fn test_fpcr_round_trip() {
    let mut regs = FloatRegs::new();
    regs.write_fpcr(0x8000_0000_0000_0000);
    assert_eq!(regs.read_fpcr(), 0x8000_0000_0000_0000);
}

#[test]
fn test_reset_clears_fpcr() {
    let mut regs = FloatRegs::new();
    regs.write(3, 7);
    regs.write_fpcr(1);
    regs.reset();
    assert_eq!(regs.read(3), 0);
    assert_eq!(regs.read_fpcr(), 0);
}

proptest! {
    #[test]
    fn prop_f31_zero_after_any_write(v in any::<u64>()) {
        let mut regs = FloatRegs::new();
        regs.write(31, v);
        prop_assert_eq!(regs.read(31), 0);
    }

    #[test]
    fn prop_write_read_round_trip(reg in 0usize..31, v in any::<u64>()) {
        let mut regs = FloatRegs::new();
        regs.write(reg, v);
        prop_assert_eq!(regs.read(reg), v);
    }
}

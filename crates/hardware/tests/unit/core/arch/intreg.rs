//! # Integer Register File Tests
//!
//! R31 hardwired-zero invariants and basic storage behavior.

use axp_core::core::arch::intreg::IntRegs;
use proptest::prelude::*;

#[test]
fn test_new_initializes_to_zero() {
    let regs = IntRegs::new();
    for i in 0..32 {
        assert_eq!(regs.read(i), 0);
    }
}

#[test]
fn test_r31_reads_zero() {
    let regs = IntRegs::new();
    assert_eq!(regs.read(31), 0);
}

#[test]
fn test_r31_writes_discarded() {
    let mut regs = IntRegs::new();
    regs.write(31, 0xDEAD_BEEF);
    assert_eq!(regs.read(31), 0);
}

#[test]
fn test_read_write_all_writable_registers() {
    let mut regs = IntRegs::new();
    for i in 0..31 {
        let value = (i as u64) << 32 | 0x55;
        regs.write(i, value);
        assert_eq!(regs.read(i), value);
    }
}

#[test]
fn test_register_independence() {
    let mut regs = IntRegs::new();
    regs.write(1, 111);
    regs.write(2, 222);
    regs.write(30, 333);
    assert_eq!(regs.read(1), 111);
    assert_eq!(regs.read(2), 222);
    assert_eq!(regs.read(30), 333);
}

#[test]
fn test_reset_zeroes_everything() {
    let mut regs = IntRegs::new();
    for i in 0..31 {
        regs.write(i, u64::MAX);
    }
    regs.reset();
    for i in 0..32 {
        assert_eq!(regs.read(i), 0);
    }
}

proptest! {
    #[test]
    fn prop_r31_zero_after_any_write(v in any::<u64>()) {
        let mut regs = IntRegs::new();
        regs.write(31, v);
        prop_assert_eq!(regs.read(31), 0);
    }

    #[test]
    fn prop_write_read_round_trip(reg in 0usize..31, v in any::<u64>()) {
        let mut regs = IntRegs::new();
        regs.write(reg, v);
        prop_assert_eq!(regs.read(reg), v);
    }
}

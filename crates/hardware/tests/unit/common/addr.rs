//! # Address Type Tests
//!
//! Canonical VA sign extension, kseg window recognition, and cache-line
//! arithmetic.

use axp_core::common::addr::{PhysAddr, VirtAddr, sext_va};
use proptest::prelude::*;

#[test]
fn test_sext_va_low_addresses_unchanged() {
    assert_eq!(sext_va(0), 0);
    assert_eq!(sext_va(0x3FF_FFFF_FFFF), 0x3FF_FFFF_FFFF);
}

#[test]
fn test_sext_va_bit42_replicates() {
    assert_eq!(sext_va(1 << 42), 0xFFFF_FC00_0000_0000);
    assert_eq!(sext_va(0x7FF_FFFF_FFFF), u64::MAX);
}

#[test]
fn test_kseg_window() {
    // bits 42:41 = 0b10 selects kseg
    let kseg_base = 0xFFFF_FC00_0000_0000u64;
    let va = VirtAddr::new(kseg_base + 0x1234);
    assert!(va.is_kseg());
    assert_eq!(va.kseg_to_pa(), Some(PhysAddr(0x1234)));

    assert!(!VirtAddr::new(0x1000).is_kseg());
    assert_eq!(VirtAddr::new(0x1000).kseg_to_pa(), None);
}

#[test]
fn test_cache_line_arithmetic() {
    let pa = PhysAddr::new(0x1_0047);
    assert_eq!(pa.cache_line(), 0x1_0040);
    assert_eq!(pa.line_index(), 0x1_0040 >> 6);
    assert_eq!(PhysAddr::new(0x40).cache_line(), 0x40);
    assert_eq!(PhysAddr::new(0x3F).cache_line(), 0);
}

proptest! {
    #[test]
    fn prop_sext_va_idempotent(va in any::<u64>()) {
        prop_assert_eq!(sext_va(sext_va(va)), sext_va(va));
    }

    #[test]
    fn prop_sext_va_top_bits_replicate_bit42(va in any::<u64>()) {
        let s = sext_va(va);
        let bit42 = (s >> 42) & 1;
        let top = s >> 43;
        prop_assert_eq!(top, if bit42 == 1 { (1 << 21) - 1 } else { 0 });
    }
}

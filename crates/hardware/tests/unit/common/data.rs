//! # Data Manipulation Tests
//!
//! Sign extension boundaries, AST nibble packing, and S/T float format
//! conversion round trips.

use axp_core::common::data::{pack_ast, s_to_t, sext8, sext13, sext16, sext21, t_to_s, unpack_ast};
use proptest::prelude::*;

#[test]
fn test_sext21_positive_boundary() {
    assert_eq!(sext21(0x0F_FFFF), 0x0F_FFFF);
}

#[test]
fn test_sext21_negative_boundary() {
    assert_eq!(sext21(0x10_0000), 0xFFFF_FFFF_FFF0_0000);
    assert_eq!(sext21(0x1F_FFFF), u64::MAX);
}

#[test]
fn test_sext16_boundaries() {
    assert_eq!(sext16(0x7FFF), 0x7FFF);
    assert_eq!(sext16(0x8000), 0xFFFF_FFFF_FFFF_8000);
    assert_eq!(sext16(0xFFFF), u64::MAX);
}

#[test]
fn test_sext13_boundaries() {
    assert_eq!(sext13(0x0FFF), 0x0FFF);
    assert_eq!(sext13(0x1000), 0xFFFF_FFFF_FFFF_F000);
}

#[test]
fn test_sext8_boundaries() {
    assert_eq!(sext8(0x7F), 0x7F);
    assert_eq!(sext8(0x80), 0xFFFF_FFFF_FFFF_FF80);
}

#[test]
fn test_sext_ignores_high_bits() {
    assert_eq!(sext16(0xABCD_8000), 0xFFFF_FFFF_FFFF_8000);
    assert_eq!(sext21(0xFFE0_0001), 1);
}

#[test]
fn test_ast_pack_unpack_exhaustive() {
    for x in 0..=255u8 {
        let (sr, en) = unpack_ast(x);
        assert!(sr <= 0xF && en <= 0xF);
        assert_eq!(pack_ast(sr, en), x);
    }
}

#[test]
fn test_ast_pack_masks_nibbles() {
    assert_eq!(pack_ast(0xFF, 0xFF), 0xFF);
    assert_eq!(pack_ast(0x12, 0x34), 0x24);
}

#[test]
fn test_s_to_t_known_values() {
    // 1.0f32 = 0x3F800000 -> 1.0f64 = 0x3FF0000000000000
    assert_eq!(s_to_t(0x3F80_0000), 0x3FF0_0000_0000_0000);
    // -2.0f32
    assert_eq!(s_to_t(0xC000_0000), 0xC000_0000_0000_0000);
    // +0.0
    assert_eq!(s_to_t(0), 0);
    // +inf
    assert_eq!(s_to_t(0x7F80_0000), 0x7FF0_0000_0000_0000);
}

proptest! {
    #[test]
    fn prop_s_t_round_trip(bits in any::<u32>()) {
        prop_assert_eq!(t_to_s(s_to_t(bits)), bits);
    }

    #[test]
    fn prop_s_to_t_matches_host_widening(bits in any::<u32>()) {
        let f = f32::from_bits(bits);
        // NaN payloads and dirty zeros (subnormals map to trapping values
        // on Alpha) diverge from host widening; compare numeric values only.
        prop_assume!(!f.is_nan() && !f.is_subnormal());
        prop_assert_eq!(f64::from_bits(s_to_t(bits)), f64::from(f));
    }

    #[test]
    fn prop_sext21_matches_i64_cast(v in 0u32..(1 << 21)) {
        let expected = ((i64::from(v) << 43) >> 43) as u64;
        prop_assert_eq!(sext21(v), expected);
    }
}

//! # PAL Vector Computation Tests
//!
//! Exception vector formula, CALL_PAL entry-point formula, and the
//! CALL_PAL privilege matrix.

use axp_core::common::constants::pal_vector;
use axp_core::core::arch::mode::Cm;
use axp_core::core::pal::vector::{
    compute_call_pal_entry, compute_exception_vector, is_illegal_call_pal,
};
use proptest::prelude::*;
use rstest::rstest;

const PAL_BASE: u64 = 0x8000;

#[test]
fn test_exception_vector_formula() {
    let pc = compute_exception_vector(PAL_BASE, pal_vector::ARITH);
    assert_eq!(pc, (PAL_BASE & !0x7FFF) | (pal_vector::ARITH & 0x7FFE) | 1);
    assert_eq!(pc & 1, 1);
}

#[test]
fn test_exception_vector_masks_pal_base_low_bits() {
    let pc = compute_exception_vector(0x8FFF, pal_vector::MCHK);
    assert_eq!(pc, 0x8000 | pal_vector::MCHK | 1);
}

#[rstest]
#[case(0x00, Cm::Kernel, false)] // privileged, legal from kernel
#[case(0x00, Cm::User, true)] // privileged, illegal elsewhere
#[case(0x3F, Cm::Executive, true)]
#[case(0x40, Cm::Kernel, true)] // hole between privileged and unprivileged
#[case(0x7F, Cm::Kernel, true)]
#[case(0x80, Cm::User, false)] // unprivileged range
#[case(0x83, Cm::User, false)]
#[case(0xBF, Cm::User, false)]
#[case(0xC0, Cm::Kernel, true)] // past the unprivileged range
#[case(0xFFFF, Cm::Kernel, true)]
fn test_illegal_call_pal_matrix(#[case] func: u32, #[case] cm: Cm, #[case] illegal: bool) {
    assert_eq!(is_illegal_call_pal(func, cm), illegal);
}

#[test]
fn test_call_pal_entry_formula() {
    // callsys (0x83): func > 0x7F sets the high selector bit.
    let func = 0x83u32;
    let pc = compute_call_pal_entry(PAL_BASE, func, Cm::User);
    let expected = (PAL_BASE & !0x7FFF)
        | (1 << 13)
        | ((u64::from(func) >> 7) << 12)
        | ((u64::from(func) & 0x3F) << 6)
        | 1;
    assert_eq!(pc, expected);
}

#[test]
fn test_call_pal_entry_privileged() {
    // swpctx-class privileged function from kernel mode.
    let pc = compute_call_pal_entry(PAL_BASE, 0x30, Cm::Kernel);
    assert_eq!(pc, (PAL_BASE & !0x7FFF) | (1 << 13) | (0x30 << 6) | 1);
}

#[test]
fn test_illegal_call_pal_routes_to_opcdec() {
    let pc = compute_call_pal_entry(PAL_BASE, 0x30, Cm::User);
    assert_eq!(pc, compute_exception_vector(PAL_BASE, pal_vector::OPCDEC));
}

proptest! {
    #[test]
    fn prop_vectors_always_carry_pal_tag(base in any::<u64>(), vector in any::<u64>()) {
        prop_assert_eq!(compute_exception_vector(base, vector) & 1, 1);
    }

    #[test]
    fn prop_call_pal_entries_stay_in_pal_image(func in 0u32..0x100) {
        let pc = compute_call_pal_entry(PAL_BASE, func, Cm::Kernel);
        prop_assert_eq!(pc & !0x7FFF, PAL_BASE & !0x7FFF);
        prop_assert_eq!(pc & 1, 1);
    }
}

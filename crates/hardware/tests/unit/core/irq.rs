//! # Interrupt Pending State Tests
//!
//! Raise/claim/clear across edge and level triggers, the IPL gate, the
//! highest-level cache, and cross-thread raising.

use std::sync::Arc;

use axp_core::core::irq::{IrqPending, TriggerMode};
use proptest::prelude::*;

const IPI: u32 = 20;

fn with_edge_source(id: u32, ipl: u8) -> IrqPending {
    let mut irq = IrqPending::new();
    assert!(irq.register_source(id, ipl, 0x680, TriggerMode::Edge));
    irq
}

fn with_level_source(id: u32, ipl: u8) -> IrqPending {
    let mut irq = IrqPending::new();
    assert!(irq.register_source(id, ipl, 0x690, TriggerMode::Level));
    irq
}

#[test]
fn test_register_rejects_out_of_range() {
    let mut irq = IrqPending::new();
    assert!(!irq.register_source(64, 5, 0, TriggerMode::Edge));
    assert!(!irq.register_source(5, 32, 0, TriggerMode::Edge));
}

#[test]
fn test_empty_has_nothing_deliverable() {
    let irq = IrqPending::new();
    assert!(!irq.has_deliverable(0));
    assert_eq!(irq.deliverable_mask(0), 0);
    assert!(!irq.claim_next(0).valid);
}

#[test]
fn test_edge_claim_consumes_pending() {
    // Edge-triggered IPI at IPL 22 (end-to-end scenario 3).
    let irq = with_edge_source(IPI, 22);
    irq.raise(IPI, 22);

    assert!(irq.has_deliverable(0));
    let claimed = irq.claim_next(0);
    assert!(claimed.valid);
    assert_eq!(claimed.source, IPI);
    assert_eq!(claimed.ipl, 22);
    assert_eq!(claimed.trigger, TriggerMode::Edge);
    assert_eq!(claimed.vector, 0x680);

    // Source and level bits consumed by the claim.
    assert!(!irq.has_deliverable(0));
    assert_eq!(irq.deliverable_mask(0), 0);
    assert!(!irq.claim_next(0).valid);
}

#[test]
fn test_level_claim_retains_pending_until_deassert() {
    // Level-triggered device at source 20, IPL 20 (end-to-end scenario 4).
    let irq = with_level_source(20, 20);
    irq.raise(20, 20);

    let first = irq.claim_next(0);
    assert!(first.valid);
    assert_eq!(first.source, 20);
    assert!(irq.is_in_service(20));

    // Still pending, but in-service blocks a second claim.
    assert!(!irq.claim_next(0).valid);

    // Device deasserts: nothing pending any more.
    irq.clear(20, 20);
    assert!(!irq.is_in_service(20));
    assert!(!irq.claim_next(0).valid);

    // Re-raise after deassert: claimable again.
    irq.raise(20, 20);
    let again = irq.claim_next(0);
    assert!(again.valid);
    assert_eq!(again.source, 20);
}

#[test]
fn test_ipl_gate_blocks_low_levels() {
    let irq = with_edge_source(3, 5);
    irq.raise(3, 5);
    assert!(!irq.has_deliverable(5));
    assert!(!irq.claim_next(5).valid);
    assert!(irq.has_deliverable(4));
    assert!(irq.claim_next(4).valid);
}

#[test]
fn test_claim_at_ipl31_always_fails() {
    let irq = with_edge_source(1, 31);
    irq.raise(1, 31);
    assert!(!irq.claim_next(31).valid);
}

#[test]
fn test_highest_level_wins() {
    let mut irq = IrqPending::new();
    assert!(irq.register_source(1, 5, 0x100, TriggerMode::Edge));
    assert!(irq.register_source(2, 20, 0x200, TriggerMode::Edge));
    irq.raise(1, 5);
    irq.raise(2, 20);

    let claimed = irq.claim_next(0);
    assert_eq!(claimed.ipl, 20);
    assert_eq!(claimed.source, 2);

    let next = irq.claim_next(0);
    assert_eq!(next.ipl, 5);
    assert_eq!(next.source, 1);
}

#[test]
fn test_lowest_source_wins_within_level() {
    let mut irq = IrqPending::new();
    assert!(irq.register_source(9, 10, 0x300, TriggerMode::Edge));
    assert!(irq.register_source(4, 10, 0x400, TriggerMode::Edge));
    irq.raise(9, 10);
    irq.raise(4, 10);
    assert_eq!(irq.claim_next(0).source, 4);
    assert_eq!(irq.claim_next(0).source, 9);
}

#[test]
fn test_all_in_service_does_not_try_lower_level() {
    // Deliberate O(1) claim: when every source at the highest level is in
    // service, the claim fails rather than scanning lower levels.
    let mut irq = IrqPending::new();
    assert!(irq.register_source(7, 20, 0x500, TriggerMode::Level));
    assert!(irq.register_source(2, 5, 0x600, TriggerMode::Edge));
    irq.raise(7, 20);
    irq.raise(2, 5);

    assert!(irq.claim_next(0).valid); // claims 7, leaves it pending+in-service
    let blocked = irq.claim_next(0);
    assert!(!blocked.valid);

    // After the device clears, the lower level becomes claimable.
    irq.clear(7, 20);
    let lower = irq.claim_next(0);
    assert!(lower.valid);
    assert_eq!(lower.source, 2);
}

#[test]
fn test_deliverable_mask_is_strictly_above_ipl() {
    let mut irq = IrqPending::new();
    assert!(irq.register_source(1, 10, 0, TriggerMode::Edge));
    irq.raise(1, 10);
    assert_eq!(irq.deliverable_mask(9), 1 << 10);
    assert_eq!(irq.deliverable_mask(10), 0);
}

#[test]
fn test_reset_clears_dynamic_state() {
    let irq = with_level_source(20, 20);
    irq.raise(20, 20);
    let _ = irq.claim_next(0);
    irq.reset();
    assert!(!irq.has_deliverable(0));
    assert!(!irq.is_in_service(20));

    // Configuration survives a reset.
    irq.raise(20, 20);
    assert_eq!(irq.claim_next(0).trigger, TriggerMode::Level);
}

#[test]
fn test_out_of_range_raise_ignored() {
    let irq = IrqPending::new();
    irq.raise(64, 5);
    irq.raise(5, 32);
    assert!(!irq.has_deliverable(0));
}

#[test]
fn test_cross_thread_raise_visible_to_claimer() {
    let irq = Arc::new(with_edge_source(IPI, 22));
    let sender = Arc::clone(&irq);
    std::thread::spawn(move || sender.raise(IPI, 22))
        .join()
        .unwrap();

    // The raise happened-before the join; the claim must see it.
    assert!(irq.has_deliverable(0));
    assert_eq!(irq.claim_next(0).source, IPI);
}

proptest! {
    #[test]
    fn prop_summary_matches_source_masks(
        raises in proptest::collection::vec((0u32..64, 0u8..32), 0..24)
    ) {
        let mut irq = IrqPending::new();
        for id in 0..64u32 {
            let _ = irq.register_source(id, (id % 32) as u8, 0, TriggerMode::Edge);
        }
        for (id, ipl) in &raises {
            irq.raise(*id, *ipl);
        }
        // The cached highest level never exceeds the true summary.
        if irq.deliverable_mask(0) == 0 {
            prop_assert!(!irq.has_deliverable(0));
        }
        // Draining every claim empties everything above IPL 0.
        let mut budget = 64 * 32;
        while budget > 0 && irq.claim_next(0).valid {
            budget -= 1;
        }
        prop_assert!(!irq.has_deliverable(0));
        prop_assert_eq!(irq.deliverable_mask(0), 0);
    }
}

//! # MMIO Registry and Dispatcher Tests
//!
//! Registration rejection rules, the status taxonomy at region boundaries,
//! endianness conversion, posted-write accounting, and classification.

use std::sync::Arc;

use crate::common::mocks::device::{MockMmioDev, ScratchDevice};
use axp_core::soc::mmio::{
    Endianness, MmioRegistry, MmioStatus, RegionDesc, WIDTH_4, WIDTH_8, WIDTH_ANY,
};
use proptest::prelude::*;

const BASE: u64 = 0x1_0000;
const SIZE: u64 = 0x100;

fn desc(base: u64, size: u64) -> RegionDesc {
    RegionDesc {
        base,
        size,
        widths: WIDTH_ANY,
        natural_alignment: true,
        posted_writes: false,
        endianness: Endianness::Little,
        device_uid: 0xD0,
        hose: 0,
    }
}

fn registry_with_scratch() -> (MmioRegistry, Arc<ScratchDevice>) {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new((SIZE / 8) as usize));
    registry
        .register_region(desc(BASE, SIZE), dev.clone())
        .unwrap();
    registry.finalize();
    (registry, dev)
}

#[test]
fn test_register_rejects_zero_size() {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new(1));
    assert!(registry.register_region(desc(BASE, 0), dev).is_err());
}

#[test]
fn test_register_rejects_overlap() {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new(32));
    registry
        .register_region(desc(BASE, SIZE), dev.clone())
        .unwrap();
    assert!(
        registry
            .register_region(desc(BASE + SIZE - 1, SIZE), dev.clone())
            .is_err()
    );
    // Adjacent (touching) regions are fine.
    assert!(
        registry
            .register_region(desc(BASE + SIZE, SIZE), dev)
            .is_ok()
    );
}

#[test]
fn test_register_rejects_overflow() {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new(1));
    assert!(registry.register_region(desc(u64::MAX - 8, 0x100), dev).is_err());
}

#[test]
fn test_register_rejects_empty_width_set() {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new(1));
    let mut d = desc(BASE, SIZE);
    d.widths = 0;
    assert!(registry.register_region(d, dev).is_err());
}

#[test]
fn test_register_rejects_after_finalize() {
    let (mut registry, _) = registry_with_scratch();
    let dev = Arc::new(ScratchDevice::new(1));
    assert!(registry.register_region(desc(0x9_0000, SIZE), dev).is_err());
}

#[test]
fn test_boundary_statuses() {
    let (registry, _) = registry_with_scratch();
    let mut out = 0u64;

    // One byte below the base: no region.
    assert_eq!(
        registry.handle_read(BASE - 1, 1, &mut out),
        MmioStatus::AccessViolation
    );
    // Exactly at end: no region.
    assert_eq!(
        registry.handle_read(BASE + SIZE, 1, &mut out),
        MmioStatus::AccessViolation
    );
    // Last fully-contained access: ok.
    assert_eq!(
        registry.handle_read(BASE + SIZE - 8, 8, &mut out),
        MmioStatus::Ok
    );
    // Straddles the end: no region covers the whole access.
    assert_eq!(
        registry.handle_read(BASE + SIZE - 4, 8, &mut out),
        MmioStatus::AccessViolation
    );
}

#[test]
fn test_width_taxonomy() {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new(32));
    let mut d = desc(BASE, SIZE);
    d.widths = WIDTH_4 | WIDTH_8;
    registry.register_region(d, dev).unwrap();
    registry.finalize();

    let mut out = 0u64;
    assert_eq!(registry.handle_read(BASE, 3, &mut out), MmioStatus::OutOfRange);
    assert_eq!(registry.handle_read(BASE, 16, &mut out), MmioStatus::OutOfRange);
    assert_eq!(
        registry.handle_read(BASE, 1, &mut out),
        MmioStatus::AccessViolation,
        "width not allowed by the region"
    );
    assert_eq!(registry.handle_read(BASE, 4, &mut out), MmioStatus::Ok);
}

#[test]
fn test_pa_width_overflow_is_out_of_range() {
    let (registry, _) = registry_with_scratch();
    let mut out = 0u64;
    assert_eq!(
        registry.handle_read(u64::MAX - 3, 8, &mut out),
        MmioStatus::OutOfRange
    );
}

#[test]
fn test_misalignment_enforced() {
    let (registry, _) = registry_with_scratch();
    let mut out = 0u64;
    assert_eq!(
        registry.handle_read(BASE + 2, 8, &mut out),
        MmioStatus::Misaligned
    );
    assert_eq!(
        registry.handle_write(0, BASE + 1, 4, 0),
        MmioStatus::Misaligned
    );
    // Byte accesses are always aligned.
    assert_eq!(registry.handle_read(BASE + 3, 1, &mut out), MmioStatus::Ok);
}

#[test]
fn test_dispatch_reaches_handler_with_offset() {
    let (registry, dev) = registry_with_scratch();
    dev.set_reg(2, 0xFACE);

    let mut out = 0u64;
    assert_eq!(registry.handle_read(BASE + 0x10, 8, &mut out), MmioStatus::Ok);
    assert_eq!(out, 0xFACE);

    assert_eq!(
        registry.handle_write(0, BASE + 0x18, 8, 0xBEEF),
        MmioStatus::Ok
    );
    assert_eq!(dev.reg(3), 0xBEEF);

    let accesses = dev.accesses();
    assert_eq!(accesses[0], (false, 0x10, 8, 0xFACE));
    assert_eq!(accesses[1], (true, 0x18, 8, 0xBEEF));
}

#[test]
fn test_mock_handler_sees_region_local_offset() {
    let mut registry = MmioRegistry::new();
    let mut mock = MockMmioDev::new();
    let _ = mock
        .expect_read()
        .withf(|offset, width| *offset == 0x20 && *width == 4)
        .return_const(0x1122_3344u64);
    registry
        .register_region(desc(BASE, SIZE), Arc::new(mock))
        .unwrap();
    registry.finalize();

    let mut out = 0u64;
    assert_eq!(registry.handle_read(BASE + 0x20, 4, &mut out), MmioStatus::Ok);
    assert_eq!(out, 0x1122_3344);
}

#[test]
fn test_big_endian_region_swaps() {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new(8));
    let mut d = desc(BASE, 64);
    d.endianness = Endianness::Big;
    d.natural_alignment = true;
    registry.register_region(d, dev.clone()).unwrap();
    registry.finalize();

    dev.set_reg(0, 0x1122_3344);
    let mut out = 0u64;
    assert_eq!(registry.handle_read(BASE, 4, &mut out), MmioStatus::Ok);
    assert_eq!(out, 0x4433_2211);

    assert_eq!(registry.handle_write(0, BASE, 4, 0xAABB_CCDD), MmioStatus::Ok);
    assert_eq!(dev.reg(0), 0xDDCC_BBAA);

    // Width-1 accesses never swap.
    assert_eq!(registry.handle_read(BASE + 1, 1, &mut out), MmioStatus::Ok);
}

#[test]
fn test_posted_write_accounting() {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new(8));
    let mut d = desc(BASE, 64);
    d.posted_writes = true;
    registry.register_region(d, dev).unwrap();
    registry.finalize();

    assert_eq!(registry.pending_count(0), 0);
    assert_eq!(registry.handle_write(0, BASE, 8, 1), MmioStatus::Ok);
    assert_eq!(registry.handle_write(0, BASE + 8, 8, 2), MmioStatus::Ok);
    assert_eq!(registry.pending_count(0), 2);
    assert_eq!(registry.pending_count(1), 0, "counters are per-CPU");

    registry.drain(0);
    assert_eq!(registry.pending_count(0), 0);
}

#[test]
fn test_classify_pa() {
    let (registry, _) = registry_with_scratch();
    let tag = registry.classify_pa(BASE + 0x42);
    assert!(tag.contains("uid=0xd0"), "{tag}");
    assert!(tag.contains("offset=0x42"), "{tag}");
    let unmapped = registry.classify_pa(0xDEAD_0000);
    assert!(unmapped.contains("unmapped"), "{unmapped}");
}

#[test]
fn test_pre_finalize_lookup_is_linear_scan() {
    let mut registry = MmioRegistry::new();
    let dev = Arc::new(ScratchDevice::new(8));
    registry.register_region(desc(BASE, 64), dev).unwrap();
    // Not finalized: dispatch still works through the linear path.
    let mut out = 0u64;
    assert_eq!(registry.handle_read(BASE, 8, &mut out), MmioStatus::Ok);
    assert!(!registry.is_finalized());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_lookup_hits_containing_region(
        bases in proptest::collection::btree_set(0u64..0x100, 1..6),
        probe in 0u64..0x120,
    ) {
        // Disjoint 16-byte regions at 16-aligned bases.
        let mut registry = MmioRegistry::new();
        let dev = Arc::new(ScratchDevice::new(2));
        let mut region_bases = Vec::new();
        for b in bases {
            let base = 0x10_0000 + b * 16;
            registry.register_region(desc(base, 16), dev.clone()).unwrap();
            region_bases.push(base);
        }
        registry.finalize();

        let pa = 0x10_0000 + probe;
        let mut out = 0u64;
        let hit = registry.handle_read(pa, 1, &mut out) == MmioStatus::Ok;
        let expected = region_bases.iter().any(|b| pa >= *b && pa < *b + 16);
        prop_assert_eq!(hit, expected);
    }
}

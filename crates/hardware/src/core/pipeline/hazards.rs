//! Dual-issue gate.
//!
//! Two candidate instructions on the same quadword boundary may issue
//! together only when they occupy disjoint execution-unit resource classes
//! and carry no register hazard between them. The engine itself always
//! single-issues, which is always correct, and consults this gate as a
//! design-level predicate; throughput, not correctness, is what dual issue
//! buys.

use crate::common::constants::REG_ZERO;
use crate::core::pipeline::grain::{DecodedInst, ExecUnit};

/// Returns whether two instruction classes may share an issue cycle.
///
/// Integer/branch, memory, and float are three disjoint classes; PAL/misc
/// and cache maintenance never pair with anything.
pub fn classes_disjoint(a: ExecUnit, b: ExecUnit) -> bool {
    if matches!(a, ExecUnit::PalBox | ExecUnit::CBox) || matches!(b, ExecUnit::PalBox | ExecUnit::CBox)
    {
        return false;
    }
    a != b
}

/// Returns whether `older` and `younger` may dual-issue.
///
/// Requires (a) disjoint resource classes, (b) the second unit available,
/// (c) no RAW hazard (`older.dest ∈ younger.sources`), and (d) no WAW
/// hazard (`older.dest == younger.dest ≠ R31`).
pub fn dual_issue_allowed(older: &DecodedInst, younger: &DecodedInst, unit_free: bool) -> bool {
    if !classes_disjoint(older.unit, younger.unit) || !unit_free {
        return false;
    }

    let Some(dest) = older.dest() else {
        return true;
    };
    if usize::from(dest) == REG_ZERO {
        return true;
    }

    let (src_a, src_b) = younger.sources();
    if dest == src_a || dest == src_b {
        return false;
    }
    if younger.dest() == Some(dest) {
        return false;
    }
    true
}

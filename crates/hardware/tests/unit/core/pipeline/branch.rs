//! # Branch Prediction and Resolution Tests
//!
//! Unconditional branches predict taken at fetch; conditional branches
//! predict not-taken and pay a mispredict redirect when taken.

use crate::common::harness::{TEST_ENTRY, TestContext};
use axp_core::core::pipeline::engine::PipelineStepResult;
use axp_core::isa::grains;
use axp_core::isa::opcodes;

#[test]
fn test_unconditional_branch_predicted_taken() {
    let mut ctx = TestContext::new();
    // BR over one instruction; the skipped slot would corrupt R1.
    ctx.load_program(
        TEST_ENTRY,
        [
            grains::lda(1, 31, 1), // R1 = 1
            grains::br(31, 1),     // skip next
            grains::lda(1, 31, 99),
            grains::lda(2, 31, 2), // landing pad
        ],
    );
    let _ = ctx.run(10);
    assert_eq!(ctx.get_reg(1), 1);
    assert_eq!(ctx.get_reg(2), 2);
    assert_eq!(ctx.sim.cpu.stats.branch_mispredictions, 0);
}

#[test]
fn test_bsr_links_return_address() {
    let mut ctx = TestContext::new();
    ctx.load_program(TEST_ENTRY, [grains::bsr(26, 4)]);
    ctx.place(TEST_ENTRY + 4 + 16, grains::lda(3, 31, 3));
    let _ = ctx.run(9);
    assert_eq!(ctx.get_reg(26), TEST_ENTRY + 4);
    assert_eq!(ctx.get_reg(3), 3);
}

#[test]
fn test_taken_conditional_mispredicts_and_redirects() {
    let mut ctx = TestContext::new();
    ctx.set_reg(1, 0); // BEQ taken
    ctx.load_program(
        TEST_ENTRY,
        [
            grains::cond_branch(opcodes::BEQ, 1, 2), // to TEST_ENTRY+12
            grains::lda(2, 31, 99),                  // wrong path
            grains::lda(2, 31, 98),                  // wrong path
            grains::lda(3, 31, 7),                   // target
        ],
    );

    let mispredicted = ctx.run_until(12, |r| matches!(r, PipelineStepResult::Mispredict { .. }));
    let Some(PipelineStepResult::Mispredict { target }) = mispredicted else {
        panic!("expected a mispredict step");
    };
    assert_eq!(target, TEST_ENTRY + 12);

    let _ = ctx.run(8);
    assert_eq!(ctx.get_reg(3), 7);
    // The wrong-path instructions were flushed before writeback.
    assert_eq!(ctx.get_reg(2), 0);
    assert_eq!(ctx.sim.cpu.stats.branch_mispredictions, 1);
}

#[test]
fn test_untaken_conditional_predicted_correctly() {
    let mut ctx = TestContext::new();
    ctx.set_reg(1, 5); // BEQ not taken
    ctx.load_program(
        TEST_ENTRY,
        [
            grains::cond_branch(opcodes::BEQ, 1, 2),
            grains::lda(2, 31, 11),
        ],
    );
    let _ = ctx.run(8);
    assert_eq!(ctx.get_reg(2), 11);
    assert_eq!(ctx.sim.cpu.stats.branch_mispredictions, 0);
    assert!(ctx.sim.cpu.stats.branch_predictions >= 1);
}

#[test]
fn test_backward_branch_loop_terminates() {
    // Counted loop: R1 counts down from 3, R3 counts iterations.
    let mut ctx = TestContext::new();
    ctx.set_reg(1, 3);
    ctx.load_program(
        TEST_ENTRY,
        [
            grains::addq_lit(3, 1, 3),                // R3 += 1
            grains::subq_lit(1, 1, 1),                // R1 -= 1
            grains::cond_branch(opcodes::BNE, 1, -3), // back to loop head
            grains::lda(9, 31, 9),                    // done marker
        ],
    );
    let _ = ctx.run(60);

    assert_eq!(ctx.get_reg(3), 3);
    assert_eq!(ctx.get_reg(1), 0);
    assert_eq!(ctx.get_reg(9), 9);
    // The two taken iterations mispredicted (static not-taken policy); the
    // final fall-through resolved with the prediction.
    assert_eq!(ctx.sim.cpu.stats.branch_mispredictions, 2);
}

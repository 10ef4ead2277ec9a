//! Emulation statistics collection and reporting.
//!
//! This module tracks performance counters for the emulator. It provides:
//! 1. **Cycle and Retire:** Total ticks, retired instructions, derived CPI.
//! 2. **Instruction Mix:** Counts by category (ALU, load, store, branch, PAL).
//! 3. **Branch Prediction:** Resolution counts and mispredictions.
//! 4. **Delivery:** Traps, interrupts, and PAL calls taken.
//! 5. **R31 Instrumentation:** The six architecturally-observable counters of
//!    discarded writes and R31-targeted operations.

use std::time::Instant;

/// Emulation statistics for one CPU.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Total pipeline ticks.
    pub cycles: u64,
    /// Instructions retired at writeback.
    pub instructions_retired: u64,

    /// Retired ALU instructions.
    pub inst_alu: u64,
    /// Retired loads (including LL).
    pub inst_load: u64,
    /// Retired stores (including STC).
    pub inst_store: u64,
    /// Retired branches and jumps.
    pub inst_branch: u64,
    /// Retired FP instructions.
    pub inst_fp: u64,
    /// CALL_PAL instructions dispatched.
    pub inst_pal: u64,

    /// Branches resolved with a correct prediction.
    pub branch_predictions: u64,
    /// Branches resolved against the prediction.
    pub branch_mispredictions: u64,

    /// Ticks lost to issue-stage stalls.
    pub stalls_issue: u64,
    /// Ticks lost to memory-stage stalls.
    pub stalls_mem: u64,

    /// Architectural faults dispatched to PAL.
    pub traps_taken: u64,
    /// Interrupts claimed and delivered.
    pub interrupts_taken: u64,

    /// Discarded ALU/load writes targeting R31.
    pub r31_discarded_writes: u64,
    /// Discarded link writes targeting R31.
    pub r31_discarded_link_writes: u64,
    /// Load-locked instructions targeting R31.
    pub r31_load_locked: u64,
    /// Store-conditional status writes targeting R31.
    pub r31_store_cond: u64,
    /// Loads to R31 treated as prefetches.
    pub r31_prefetch_loads: u64,
    /// Operand-constraint violations involving R31.
    pub r31_operand_violations: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            inst_alu: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            inst_fp: 0,
            inst_pal: 0,
            branch_predictions: 0,
            branch_mispredictions: 0,
            stalls_issue: 0,
            stalls_mem: 0,
            traps_taken: 0,
            interrupts_taken: 0,
            r31_discarded_writes: 0,
            r31_discarded_link_writes: 0,
            r31_load_locked: 0,
            r31_store_cond: 0,
            r31_prefetch_loads: 0,
            r31_operand_violations: 0,
        }
    }
}

impl SimStats {
    /// Creates a fresh counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cycles per retired instruction; 0.0 before the first retire.
    pub fn cpi(&self) -> f64 {
        if self.instructions_retired == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions_retired as f64
        }
    }

    /// Branch prediction accuracy in [0, 1]; 1.0 with no branches resolved.
    pub fn branch_accuracy(&self) -> f64 {
        let total = self.branch_predictions + self.branch_mispredictions;
        if total == 0 {
            1.0
        } else {
            self.branch_predictions as f64 / total as f64
        }
    }

    /// Prints a summary report to stdout.
    pub fn print(&self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        println!("=== emulation statistics ===");
        println!("cycles:              {}", self.cycles);
        println!("retired:             {}", self.instructions_retired);
        println!("cpi:                 {:.3}", self.cpi());
        println!(
            "mix: alu={} load={} store={} branch={} fp={} pal={}",
            self.inst_alu,
            self.inst_load,
            self.inst_store,
            self.inst_branch,
            self.inst_fp,
            self.inst_pal
        );
        println!(
            "branches: correct={} mispredict={} accuracy={:.2}%",
            self.branch_predictions,
            self.branch_mispredictions,
            self.branch_accuracy() * 100.0
        );
        println!(
            "stalls: issue={} mem={}",
            self.stalls_issue, self.stalls_mem
        );
        println!(
            "delivery: traps={} interrupts={} pal_calls={}",
            self.traps_taken, self.interrupts_taken, self.inst_pal
        );
        println!(
            "r31: writes={} links={} ll={} stc={} prefetch={} operand={}",
            self.r31_discarded_writes,
            self.r31_discarded_link_writes,
            self.r31_load_locked,
            self.r31_store_cond,
            self.r31_prefetch_loads,
            self.r31_operand_violations
        );
        if elapsed > 0.0 {
            println!(
                "host: {:.2}s, {:.2} M ticks/s",
                elapsed,
                self.cycles as f64 / elapsed / 1.0e6
            );
        }
    }
}

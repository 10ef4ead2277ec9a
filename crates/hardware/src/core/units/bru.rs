//! Branch prediction unit.
//!
//! A direct-mapped branch target buffer over a static direction policy:
//! conditional branches predict not-taken, unconditional branches and jumps
//! predict taken with their computed or cached target. Resolution updates
//! come from the execute stage (mispredicts) and the writeback stage
//! (taken-branch retires).

/// An entry in the branch target buffer.
#[derive(Clone, Copy, Default)]
struct BtbEntry {
    /// Tag verifying the entry belongs to the requested PC.
    tag: u64,
    /// Predicted target address.
    target: u64,
    /// Entry holds valid data.
    valid: bool,
}

/// Direct-mapped branch target buffer.
#[derive(Debug)]
pub struct Btb {
    table: Vec<BtbEntry>,
    size: usize,
}

impl std::fmt::Debug for BtbEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtbEntry")
            .field("tag", &self.tag)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}

impl Btb {
    /// Creates a BTB with `size` entries. `size` must be a power of 2.
    pub fn new(size: usize) -> Self {
        Self {
            table: vec![BtbEntry::default(); size],
            size,
        }
    }

    fn index(&self, pc: u64) -> usize {
        ((pc >> 2) as usize) & (self.size - 1)
    }

    /// Looks up a cached target for the given PC.
    pub fn lookup(&self, pc: u64) -> Option<u64> {
        let e = self.table[self.index(pc)];
        if e.valid && e.tag == pc { Some(e.target) } else { None }
    }

    /// Installs or overwrites the entry for a PC.
    pub fn update(&mut self, pc: u64, target: u64) {
        let idx = self.index(pc);
        self.table[idx] = BtbEntry {
            tag: pc,
            target,
            valid: true,
        };
    }
}

/// Branch predictor: static not-taken direction policy plus a BTB.
#[derive(Debug)]
pub struct BranchPredictor {
    btb: Btb,
}

impl BranchPredictor {
    /// Creates a predictor with a BTB of `btb_size` entries.
    pub fn new(btb_size: usize) -> Self {
        Self {
            btb: Btb::new(btb_size),
        }
    }

    /// Predicts a conditional branch's direction and target.
    ///
    /// Always not-taken; the BTB supplies a target hint when present.
    pub fn predict_branch(&self, pc: u64) -> (bool, Option<u64>) {
        (false, self.btb.lookup(pc))
    }

    /// Predicts a register-indirect jump's target from the BTB.
    pub fn predict_jump(&self, pc: u64) -> Option<u64> {
        self.btb.lookup(pc)
    }

    /// Records a resolved branch. Taken branches install their target.
    pub fn update(&mut self, pc: u64, taken: bool, target: u64) {
        if taken {
            self.btb.update(pc, target);
        }
    }
}

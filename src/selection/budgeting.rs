use crate::types::context_bundle::FileBlock;

/// Default character budget for assembled file blocks.
pub const DEFAULT_CONTENT_BUDGET: usize = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStep {
    Appended,
    /// The block would overflow; it was omitted and the accumulator is sealed.
    Exhausted,
}

/// Running character count against a fixed budget.
///
/// A block that would overflow is omitted whole, never truncated, and
/// nothing is accepted after that: the result is always a strict prefix of
/// the input order.
#[derive(Debug)]
pub struct ContentAccumulator {
    budget: usize,
    chars_used: usize,
    blocks: Vec<FileBlock>,
    sealed: bool,
}

impl ContentAccumulator {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            chars_used: 0,
            blocks: Vec::new(),
            sealed: false,
        }
    }

    pub fn try_append(&mut self, block: FileBlock) -> BudgetStep {
        if self.sealed {
            return BudgetStep::Exhausted;
        }
        let cost = block.char_len();
        if self.chars_used + cost > self.budget {
            self.sealed = true;
            return BudgetStep::Exhausted;
        }
        self.chars_used += cost;
        self.blocks.push(block);
        BudgetStep::Appended
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn chars_used(&self) -> usize {
        self.chars_used
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn into_blocks(self) -> Vec<FileBlock> {
        self.blocks
    }
}

pub struct BudgetResult {
    pub selected: Vec<FileBlock>,
    pub chars_used: usize,
    pub files_selected: usize,
    pub files_excluded_by_budget: usize,
}

/// Apply the budget to blocks already in priority order.
pub fn apply_budget(blocks: Vec<FileBlock>, budget: usize) -> BudgetResult {
    let total = blocks.len();
    let mut acc = ContentAccumulator::new(budget);

    for block in blocks {
        if acc.try_append(block) == BudgetStep::Exhausted {
            break;
        }
    }

    let chars_used = acc.chars_used();
    let selected = acc.into_blocks();
    let files_selected = selected.len();

    BudgetResult {
        selected,
        chars_used,
        files_selected,
        files_excluded_by_budget: total - files_selected,
    }
}

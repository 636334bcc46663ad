use bitvec::prelude::{BitVec, bitvec};

/// Fixed-size bitset over pattern ids for one wave cell
///
/// Pattern ids are 0-based and dense, so a plain bit vector gives O(1)
/// membership tests and cheap iteration over the surviving patterns.
#[derive(Clone, Debug)]
pub struct PatternBitset {
    bits: BitVec,
    pattern_count: usize,
}

impl PatternBitset {
    /// Create a bitset with every pattern present
    pub fn all(pattern_count: usize) -> Self {
        Self {
            bits: bitvec![1; pattern_count],
            pattern_count,
        }
    }

    /// Mark a pattern as present
    pub fn insert(&mut self, pattern: usize) {
        if pattern < self.pattern_count {
            self.bits.set(pattern, true);
        }
    }

    /// Mark a pattern as absent
    pub fn remove(&mut self, pattern: usize) {
        if pattern < self.pattern_count {
            self.bits.set(pattern, false);
        }
    }

    /// Test pattern membership
    pub fn contains(&self, pattern: usize) -> bool {
        self.bits.get(pattern).as_deref() == Some(&true)
    }

    /// Reset every pattern to present
    pub fn fill(&mut self) {
        self.bits.fill(true);
    }

    /// Iterate over surviving pattern ids in ascending order
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// First surviving pattern id, if any
    pub fn first(&self) -> Option<usize> {
        self.bits.first_one()
    }
}

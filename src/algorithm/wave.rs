//! The wave state machine
//!
//! Holds a per-cell possibility bitset over patterns plus the cached aggregates
//! that make observation cheap: possibility counts, weight sums, and Shannon
//! entropies. All mutation flows through `ban`, which keeps the aggregates
//! consistent with the bitsets, feeds the propagation stack, and appends to the
//! backtrack log so any run of bans can be undone in reverse.

use crate::algorithm::bitset::PatternBitset;
use crate::analysis::patterns::PatternSet;
use crate::analysis::propagator::Propagator;
use crate::spatial::GridTopology;
use crate::spatial::grid::{DIRECTION_COUNT, opposite_direction};
use rand::{Rng, rngs::StdRng};

/// Terminal and non-terminal solver status
///
/// `Undecided` is the only non-terminal state. A `Contradiction` is an expected
/// outcome of an unlucky draw, not an error; callers retry with a fresh seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Cells remain with more than one possible pattern
    Undecided,
    /// Every cell has collapsed to a single pattern
    Decided,
    /// Some cell has no possible pattern left
    Contradiction,
}

impl Resolution {
    /// Test whether the status ends a generation attempt
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Undecided)
    }

    /// Static name for diagnostics
    pub const fn label(self) -> &'static str {
        match self {
            Self::Undecided => "undecided",
            Self::Decided => "decided",
            Self::Contradiction => "contradiction",
        }
    }
}

/// One entry of the backtrack log: plain data, no closures
#[derive(Debug, Clone, Copy)]
pub struct BanRecord {
    /// Cell whose pattern was eliminated
    pub cell: usize,
    /// The eliminated pattern id
    pub pattern: usize,
}

/// Solver state for one generation attempt
///
/// Owns the immutable pattern set and propagator alongside the mutable per-cell
/// state, so constraints can consult the agreement oracle through the same
/// handle they ban through.
pub struct Wave {
    topology: GridTopology,
    patterns: PatternSet,
    propagator: Propagator,
    weights: Vec<f64>,
    weight_log_weights: Vec<f64>,
    total_weight: f64,
    total_weight_log_weight: f64,
    starting_entropy: f64,
    possible: Vec<PatternBitset>,
    compatible: Vec<i32>,
    sums_of_ones: Vec<usize>,
    sums_of_weights: Vec<f64>,
    sums_of_weight_log_weights: Vec<f64>,
    entropies: Vec<f64>,
    stack: Vec<(usize, usize)>,
    log: Vec<BanRecord>,
    status: Resolution,
}

impl Wave {
    /// Create a wave with every pattern possible in every cell
    pub fn new(topology: GridTopology, patterns: PatternSet, propagator: Propagator) -> Self {
        let pattern_count = patterns.len();
        let cell_count = topology.cell_count();

        let weights = patterns.weights().to_vec();
        let weight_log_weights: Vec<f64> = weights.iter().map(|&w| w * w.ln()).collect();
        let total_weight: f64 = weights.iter().sum();
        let total_weight_log_weight: f64 = weight_log_weights.iter().sum();
        let starting_entropy = entropy_of(total_weight, total_weight_log_weight);

        let mut wave = Self {
            topology,
            patterns,
            propagator,
            weights,
            weight_log_weights,
            total_weight,
            total_weight_log_weight,
            starting_entropy,
            possible: vec![PatternBitset::all(pattern_count); cell_count],
            compatible: vec![0; cell_count * pattern_count * DIRECTION_COUNT],
            sums_of_ones: vec![pattern_count; cell_count],
            sums_of_weights: vec![0.0; cell_count],
            sums_of_weight_log_weights: vec![0.0; cell_count],
            entropies: vec![0.0; cell_count],
            stack: Vec::new(),
            log: Vec::new(),
            status: Resolution::Undecided,
        };
        wave.reset();
        wave
    }

    /// Restore the fully-open state: every pattern possible everywhere
    ///
    /// Reseeds the support counters from the propagator, restores the cached
    /// aggregates, and clears the propagation stack and backtrack log.
    pub fn reset(&mut self) {
        let pattern_count = self.patterns.len();
        for bits in &mut self.possible {
            bits.fill();
        }
        for cell in 0..self.topology.cell_count() {
            for pattern in 0..pattern_count {
                for direction in 0..DIRECTION_COUNT {
                    let count = self
                        .propagator
                        .support_count(opposite_direction(direction), pattern)
                        as i32;
                    let index = self.support_index(cell, pattern, direction);
                    if let Some(slot) = self.compatible.get_mut(index) {
                        *slot = count;
                    }
                }
            }
        }
        self.sums_of_ones.fill(pattern_count);
        self.sums_of_weights.fill(self.total_weight);
        self.sums_of_weight_log_weights
            .fill(self.total_weight_log_weight);
        self.entropies.fill(self.starting_entropy);
        self.stack.clear();
        self.log.clear();
        self.status = Resolution::Undecided;
    }

    /// Eliminate a pattern from a cell
    ///
    /// No-op when the pattern is already impossible. Otherwise clears the bit,
    /// updates the cached aggregates, appends to the backtrack log, and queues
    /// the elimination for propagation. Flags `Contradiction` when the cell's
    /// last pattern goes. Returns whether the pattern was newly eliminated.
    pub fn ban(&mut self, cell: usize, pattern: usize) -> bool {
        let already_banned = self
            .possible
            .get(cell)
            .is_none_or(|bits| !bits.contains(pattern));
        if already_banned {
            return false;
        }
        if let Some(bits) = self.possible.get_mut(cell) {
            bits.remove(pattern);
        }

        // The cell's own support counters stay in place: they count surviving
        // supporters at the neighbor, independent of this cell's state, and
        // move only by propagation decrements and backtrack re-increments
        self.log.push(BanRecord { cell, pattern });
        self.stack.push((cell, pattern));

        if let Some(count) = self.sums_of_ones.get_mut(cell) {
            *count -= 1;
            if *count == 0 {
                self.status = Resolution::Contradiction;
            }
        }
        let weight = self.weights.get(pattern).copied().unwrap_or(0.0);
        let weight_log_weight = self.weight_log_weights.get(pattern).copied().unwrap_or(0.0);
        if let Some(sum) = self.sums_of_weights.get_mut(cell) {
            *sum -= weight;
        }
        if let Some(sum) = self.sums_of_weight_log_weights.get_mut(cell) {
            *sum -= weight_log_weight;
        }
        self.refresh_entropy(cell);
        true
    }

    /// Drain the propagation stack, applying cascading bans (arc consistency)
    ///
    /// The stack is drained even after a contradiction so the backtrack log
    /// stays an exact record of applied support decrements.
    pub fn propagate(&mut self) {
        while let Some((cell, pattern)) = self.stack.pop() {
            for direction in 0..DIRECTION_COUNT {
                let Some(neighbor) = self.topology.propagation_neighbor(cell, direction) else {
                    continue;
                };
                let supported = self.propagator.support_count(direction, pattern);
                for k in 0..supported {
                    let Some(&other) = self.propagator.compatible(direction, pattern).get(k)
                    else {
                        continue;
                    };
                    let index = self.support_index(neighbor, other, direction);
                    if let Some(slot) = self.compatible.get_mut(index) {
                        *slot -= 1;
                        if *slot == 0 {
                            self.ban(neighbor, other);
                        }
                    }
                }
            }
        }
    }

    /// Collapse the least-entropy undecided cell to one weighted-random pattern
    ///
    /// Scans non-boundary cells with at least two surviving patterns, picking
    /// the minimum entropy perturbed by a small random noise term to break
    /// ties without biasing the distribution. Returns `false` when no such
    /// cell remains, which marks the wave `Decided`.
    pub fn observe(&mut self, rng: &mut StdRng) -> bool {
        let mut min = f64::MAX;
        let mut argmin = None;
        for cell in 0..self.topology.cell_count() {
            let (x, y) = self.topology.coordinates(cell);
            if self.topology.on_boundary(x as i32, y as i32) {
                continue;
            }
            if self.sums_of_ones.get(cell).copied().unwrap_or(0) <= 1 {
                continue;
            }
            let entropy = self.entropies.get(cell).copied().unwrap_or(f64::MAX);
            if entropy <= min {
                let perturbed = 1e-6f64.mul_add(rng.random::<f64>(), entropy);
                if perturbed < min {
                    min = perturbed;
                    argmin = Some(cell);
                }
            }
        }

        let Some(cell) = argmin else {
            if self.status == Resolution::Undecided {
                self.status = Resolution::Decided;
            }
            return false;
        };

        let chosen = self.draw_pattern(cell, rng);
        let others: Vec<usize> = self
            .possible
            .get(cell)
            .map(|bits| bits.iter_ones().filter(|&t| t != chosen).collect())
            .unwrap_or_default();
        for pattern in others {
            self.ban(cell, pattern);
        }
        true
    }

    /// Weighted-random choice among a cell's surviving patterns
    fn draw_pattern(&self, cell: usize, rng: &mut StdRng) -> usize {
        let Some(bits) = self.possible.get(cell) else {
            return 0;
        };
        let total: f64 = bits
            .iter_ones()
            .map(|t| self.weights.get(t).copied().unwrap_or(0.0))
            .sum();
        let mut remaining = rng.random::<f64>() * total;
        let mut chosen = bits.first().unwrap_or(0);
        for pattern in bits.iter_ones() {
            remaining -= self.weights.get(pattern).copied().unwrap_or(0.0);
            chosen = pattern;
            if remaining <= 0.0 {
                break;
            }
        }
        chosen
    }

    /// Current length of the backtrack log, usable as an undo mark
    pub fn checkpoint(&self) -> usize {
        self.log.len()
    }

    /// Number of bans applied since the last reset
    pub fn ban_count(&self) -> usize {
        self.log.len()
    }

    /// Cell and pattern of the k-th logged ban
    pub fn logged_ban(&self, k: usize) -> Option<(usize, usize)> {
        self.log.get(k).map(|record| (record.cell, record.pattern))
    }

    /// Undo every ban after the given checkpoint, newest first
    ///
    /// Valid only at quiescence, so the propagation stack is drained first.
    /// Each record's undo re-increments the neighbor support counters its
    /// propagation decremented, re-sets the possibility bit, and reverts the
    /// cached aggregates. Counters are never overwritten, so the undo composes
    /// exactly however the stack interleaved the decrements. Rolling back past
    /// the contradicting ban returns the wave to `Undecided`. Returns the
    /// undone (cell, pattern) pairs, newest first, for `on_backtrack` hooks.
    pub fn backtrack_to(&mut self, mark: usize) -> Vec<(usize, usize)> {
        self.propagate();
        let mut undone = Vec::new();
        while self.log.len() > mark {
            let Some(record) = self.log.pop() else {
                break;
            };
            for direction in 0..DIRECTION_COUNT {
                let Some(neighbor) = self
                    .topology
                    .propagation_neighbor(record.cell, direction)
                else {
                    continue;
                };
                let supported = self.propagator.support_count(direction, record.pattern);
                for k in 0..supported {
                    let Some(&other) =
                        self.propagator.compatible(direction, record.pattern).get(k)
                    else {
                        continue;
                    };
                    let index = self.support_index(neighbor, other, direction);
                    if let Some(slot) = self.compatible.get_mut(index) {
                        *slot += 1;
                    }
                }
            }
            if let Some(bits) = self.possible.get_mut(record.cell) {
                bits.insert(record.pattern);
            }
            if let Some(count) = self.sums_of_ones.get_mut(record.cell) {
                *count += 1;
            }
            let weight = self.weights.get(record.pattern).copied().unwrap_or(0.0);
            let weight_log_weight = self
                .weight_log_weights
                .get(record.pattern)
                .copied()
                .unwrap_or(0.0);
            if let Some(sum) = self.sums_of_weights.get_mut(record.cell) {
                *sum += weight;
            }
            if let Some(sum) = self.sums_of_weight_log_weights.get_mut(record.cell) {
                *sum += weight_log_weight;
            }
            self.refresh_entropy(record.cell);
            undone.push((record.cell, record.pattern));
        }
        if !undone.is_empty() {
            self.status = Resolution::Undecided;
        }
        undone
    }

    /// Per-cell chosen pattern ids of a decided wave
    ///
    /// Boundary cells of a non-periodic grid keep several possibilities; the
    /// first surviving pattern stands in, matching the clamped-anchor output
    /// rule.
    pub fn observed(&self) -> Option<Vec<usize>> {
        if self.status != Resolution::Decided {
            return None;
        }
        Some(
            self.possible
                .iter()
                .map(|bits| bits.first().unwrap_or(0))
                .collect(),
        )
    }

    /// Distinct palette indices a cell can still resolve to
    ///
    /// Aggregates the tiles placed at this cell by every surviving pattern of
    /// every overlapping anchor. Purely observational; used by diagnostics.
    pub fn cell_tile_candidates(&self, cell: usize) -> Vec<usize> {
        let window = self.patterns.window();
        let (x, y) = self.topology.coordinates(cell);
        let mut present = vec![false; self.patterns.palette_len()];
        for dy in 0..window {
            for dx in 0..window {
                let Some(anchor) = self
                    .topology
                    .pattern_anchor(x as i32 - dx as i32, y as i32 - dy as i32)
                else {
                    continue;
                };
                let Some(bits) = self.possible.get(anchor) else {
                    continue;
                };
                for pattern in bits.iter_ones() {
                    let tile = self.patterns.tile_at(pattern, dx, dy);
                    if let Some(flag) = present.get_mut(tile) {
                        *flag = true;
                    }
                }
            }
        }
        present
            .iter()
            .enumerate()
            .filter_map(|(tile, &flag)| flag.then_some(tile))
            .collect()
    }

    /// Current solver status
    pub const fn status(&self) -> Resolution {
        self.status
    }

    /// Record that a constraint found its requirement unsatisfiable
    pub const fn mark_contradiction(&mut self) {
        self.status = Resolution::Contradiction;
    }

    /// Grid topology shared with constraints
    pub const fn topology(&self) -> &GridTopology {
        &self.topology
    }

    /// The extracted pattern set
    pub const fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// The adjacency oracle the wave propagates with
    pub const fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// Number of patterns in play
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Test whether a pattern remains possible in a cell
    pub fn is_possible(&self, cell: usize, pattern: usize) -> bool {
        self.possible
            .get(cell)
            .is_some_and(|bits| bits.contains(pattern))
    }

    /// Number of patterns still possible in a cell
    pub fn possible_count(&self, cell: usize) -> usize {
        self.sums_of_ones.get(cell).copied().unwrap_or(0)
    }

    /// Number of non-boundary cells collapsed to a single pattern
    pub fn decided_cells(&self) -> usize {
        (0..self.topology.cell_count())
            .filter(|&cell| {
                let (x, y) = self.topology.coordinates(cell);
                !self.topology.on_boundary(x as i32, y as i32)
                    && self.sums_of_ones.get(cell).copied().unwrap_or(0) == 1
            })
            .count()
    }

    /// Number of cells the observe loop is responsible for collapsing
    pub fn observable_cells(&self) -> usize {
        (0..self.topology.cell_count())
            .filter(|&cell| {
                let (x, y) = self.topology.coordinates(cell);
                !self.topology.on_boundary(x as i32, y as i32)
            })
            .count()
    }

    fn support_index(&self, cell: usize, pattern: usize, direction: usize) -> usize {
        (cell * self.patterns.len() + pattern) * DIRECTION_COUNT + direction
    }

    fn refresh_entropy(&mut self, cell: usize) {
        let sum = self.sums_of_weights.get(cell).copied().unwrap_or(0.0);
        let sum_log = self
            .sums_of_weight_log_weights
            .get(cell)
            .copied()
            .unwrap_or(0.0);
        if let Some(entropy) = self.entropies.get_mut(cell) {
            *entropy = entropy_of(sum, sum_log);
        }
    }
}

fn entropy_of(sum_of_weights: f64, sum_of_weight_log_weights: f64) -> f64 {
    if sum_of_weights > 0.0 {
        // ln(Σw) - Σ(w·ln w)/Σw, the Shannon entropy of the weight distribution
        sum_of_weights.ln() - sum_of_weight_log_weights / sum_of_weights
    } else {
        0.0
    }
}

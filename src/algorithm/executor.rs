//! The overlapping-model generator
//!
//! `OverlappingModel` wires the extraction pipeline, the wave, and the
//! constraint list into one solver and owns the run loop: repeated constraint
//! checks and propagation to quiescence, then one observation, until a
//! terminal status. `Generator` adds the retry policy on top, restarting the
//! model with derived seeds until an attempt decides or the budget runs out.
//!
//! Ban events reach constraints by replaying the wave's backtrack log after
//! each wave operation. The `delivered` cursor tracks how far the replay got;
//! it resets with the log on `clear` and realigns after a backtrack.

use crate::algorithm::wave::{Resolution, Wave};
use crate::analysis::patterns::{PatternSet, index_sample};
use crate::analysis::propagator::Propagator;
use crate::constraint::Constraint;
use crate::io::configuration::GeneratorConfig;
use crate::io::error::{GenerationError, Result, invalid_parameter};
use crate::io::snapshot::SnapshotCapture;
use crate::spatial::GridTopology;
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A configured solver over one sample and one output grid
pub struct OverlappingModel<T> {
    palette: Vec<T>,
    wave: Wave,
    constraints: Vec<Box<dyn Constraint<T>>>,
    rng: StdRng,
    ground: Option<usize>,
    delivered: usize,
    step: usize,
    snapshots: Option<SnapshotCapture>,
}

impl<T: PartialEq + Clone> OverlappingModel<T> {
    /// Build a model from a sample grid, a configuration, and constraints
    ///
    /// Extraction, propagator construction, and constraint initialization all
    /// happen here; a model that constructs successfully can only end an
    /// attempt in `Decided` or `Contradiction`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation, the sample is
    /// unsuitable for extraction, the ground pattern id is out of range, or a
    /// constraint references a tile absent from the sample palette.
    pub fn new(
        sample: &[Vec<T>],
        config: &GeneratorConfig,
        mut constraints: Vec<Box<dyn Constraint<T>>>,
    ) -> Result<Self> {
        config.validate()?;
        let (indexed, palette) = index_sample(sample)?;
        let patterns = PatternSet::extract(
            &indexed,
            palette.len(),
            config.window,
            config.periodic_input,
            config.symmetry,
        )?;
        if let Some(ground) = config.ground
            && ground >= patterns.len()
        {
            return Err(invalid_parameter(
                "ground",
                &ground,
                &format!("sample yields only {} patterns", patterns.len()),
            ));
        }

        let propagator = Propagator::build(&patterns);
        let topology = GridTopology::new(
            config.output_width,
            config.output_height,
            config.window,
            config.periodic_output,
        );
        let wave = Wave::new(topology, patterns, propagator);

        for constraint in &mut constraints {
            constraint.init(&wave, &palette)?;
        }

        Ok(Self {
            palette,
            wave,
            constraints,
            rng: StdRng::seed_from_u64(config.seed),
            ground: config.ground,
            delivered: 0,
            step: 0,
            snapshots: None,
        })
    }

    /// Replace the random stream, for retry attempts
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Record a snapshot of cell-level tile candidates after every step
    pub fn enable_snapshots(&mut self) {
        self.snapshots = Some(SnapshotCapture::new());
    }

    /// Frames recorded since the last clear, if capture is enabled
    pub const fn snapshots(&self) -> Option<&SnapshotCapture> {
        self.snapshots.as_ref()
    }

    /// Reopen every cell and apply the initial forcings
    ///
    /// Applies the ground forcing (bottom row pinned to the ground pattern,
    /// ground banned everywhere else) and every constraint's `on_clear`, each
    /// followed by propagation to quiescence. The returned status is terminal
    /// only when the initial forcings already contradict each other.
    pub fn clear(&mut self) -> Resolution {
        self.wave.reset();
        self.delivered = 0;
        self.step = 0;
        if let Some(capture) = &mut self.snapshots {
            capture.clear();
        }

        if let Some(ground) = self.ground {
            let topology = self.wave.topology().clone();
            let bottom = topology.height() - 1;
            for x in 0..topology.width() {
                for pattern in 0..self.wave.pattern_count() {
                    if pattern != ground {
                        self.wave.ban(topology.index(x, bottom), pattern);
                    }
                }
                for y in 0..bottom {
                    self.wave.ban(topology.index(x, y), ground);
                }
            }
            self.settle();
        }

        for index in 0..self.constraints.len() {
            if let Some(constraint) = self.constraints.get_mut(index) {
                constraint.on_clear(&mut self.wave);
            }
            self.settle();
        }
        self.wave.status()
    }

    /// Run one round of constraint checks and at most one observation
    ///
    /// Returns the wave status afterwards; a terminal status ends the attempt.
    pub fn step(&mut self) -> Resolution {
        let mark = self.wave.ban_count();
        for index in 0..self.constraints.len() {
            if let Some(constraint) = self.constraints.get_mut(index) {
                constraint.check(&mut self.wave);
            }
            self.settle();
            if self.wave.status().is_terminal() {
                return self.wave.status();
            }
        }

        if self.wave.observe(&mut self.rng) {
            self.settle();
        }

        self.step += 1;
        if self.snapshots.is_some() {
            let mut touched: Vec<usize> = Vec::new();
            for k in mark..self.wave.ban_count() {
                if let Some((cell, _)) = self.wave.logged_ban(k)
                    && !touched.contains(&cell)
                {
                    touched.push(cell);
                }
            }
            if let Some(capture) = &mut self.snapshots {
                capture.record(&self.wave, self.step, touched);
            }
        }
        self.wave.status()
    }

    /// Run one full attempt from a fresh wave to a terminal status
    pub fn run(&mut self) -> Resolution {
        let status = self.clear();
        if status.is_terminal() {
            return status;
        }
        loop {
            let status = self.step();
            if status.is_terminal() {
                return status;
            }
        }
    }

    /// Mark the current ban log position for a later `backtrack_to`
    pub fn checkpoint(&mut self) -> usize {
        // Deliver first so the mark never splits an undelivered run of bans
        Self::deliver_events(&self.wave, &mut self.constraints, &mut self.delivered);
        self.wave.checkpoint()
    }

    /// Undo every ban after a checkpoint and notify the constraints
    pub fn backtrack_to(&mut self, mark: usize) {
        Self::deliver_events(&self.wave, &mut self.constraints, &mut self.delivered);
        let undone = self.wave.backtrack_to(mark);
        self.delivered = self.wave.ban_count();
        for &(cell, pattern) in &undone {
            for constraint in &mut self.constraints {
                constraint.on_backtrack(cell, pattern);
            }
        }
    }

    /// Propagate to quiescence, delivering ban events before and after
    fn settle(&mut self) {
        Self::deliver_events(&self.wave, &mut self.constraints, &mut self.delivered);
        self.wave.propagate();
        Self::deliver_events(&self.wave, &mut self.constraints, &mut self.delivered);
    }

    /// Replay not-yet-delivered backtrack log entries to every constraint
    fn deliver_events(
        wave: &Wave,
        constraints: &mut [Box<dyn Constraint<T>>],
        delivered: &mut usize,
    ) {
        while *delivered < wave.ban_count() {
            if let Some((cell, pattern)) = wave.logged_ban(*delivered) {
                for constraint in constraints.iter_mut() {
                    constraint.on_ban(cell, pattern);
                }
            }
            *delivered += 1;
        }
    }

    /// Per-cell palette indices of a decided wave
    ///
    /// Cells in the last `window - 1` rows and columns of a non-periodic grid
    /// anchor no pattern of their own; they read their tile from the nearest
    /// in-range anchor at the clamped window offset.
    ///
    /// # Errors
    ///
    /// Returns an error unless the wave has decided every cell.
    pub fn output(&self) -> Result<Array2<usize>> {
        let Some(observed) = self.wave.observed() else {
            return Err(GenerationError::Unresolved {
                status: self.wave.status().label(),
            });
        };
        let topology = self.wave.topology();
        let window = topology.window();
        let (width, height) = (topology.width(), topology.height());

        let periodic = topology.periodic();
        let mut grid = Array2::zeros((height, width));
        for y in 0..height {
            let dy = if periodic || y + window <= height {
                0
            } else {
                window - 1
            };
            for x in 0..width {
                let dx = if periodic || x + window <= width {
                    0
                } else {
                    window - 1
                };
                let anchor = topology.index(x - dx, y - dy);
                let pattern = observed.get(anchor).copied().unwrap_or(0);
                if let Some(cell) = grid.get_mut((y, x)) {
                    *cell = self.wave.patterns().tile_at(pattern, dx, dy);
                }
            }
        }
        Ok(grid)
    }

    /// The decided output mapped back to sample tile tokens
    ///
    /// # Errors
    ///
    /// Returns an error unless the wave has decided every cell.
    pub fn output_tiles(&self) -> Result<Vec<Vec<T>>> {
        let grid = self.output()?;
        let mut rows = Vec::with_capacity(grid.nrows());
        for row in grid.rows() {
            let mut tokens = Vec::with_capacity(row.len());
            for &tile in row {
                let token = self.palette.get(tile).cloned().ok_or_else(|| {
                    GenerationError::InvalidSample {
                        reason: format!("palette index {tile} out of range"),
                    }
                })?;
                tokens.push(token);
            }
            rows.push(tokens);
        }
        Ok(rows)
    }

    /// Distinct tile tokens of the sample, in first-seen order
    pub fn palette(&self) -> &[T] {
        &self.palette
    }

    /// Read access to the solver state, for tests and diagnostics
    pub const fn wave(&self) -> &Wave {
        &self.wave
    }

    /// Current status of the underlying wave
    pub const fn status(&self) -> Resolution {
        self.wave.status()
    }

    /// Number of non-boundary cells collapsed so far
    pub fn decided_cells(&self) -> usize {
        self.wave.decided_cells()
    }

    /// Number of cells an attempt must collapse
    pub fn observable_cells(&self) -> usize {
        self.wave.observable_cells()
    }
}

/// Outcome of a bounded run of generation attempts
#[derive(Debug)]
pub enum GenerationOutcome {
    /// Some attempt decided every cell
    Decided {
        /// Per-cell palette indices, row-major
        grid: Array2<usize>,
        /// Number of attempts consumed, the successful one included
        attempts: usize,
    },
    /// Every attempt ended in contradiction
    Exhausted {
        /// Number of attempts consumed
        attempts: usize,
    },
}

/// Retry driver running a model until it decides or the budget is spent
///
/// Attempt k reseeds the model with `base_seed + k`, so a run is reproducible
/// from the base seed alone and attempts stay independent.
pub struct Generator<T> {
    model: OverlappingModel<T>,
    base_seed: u64,
    max_attempts: usize,
}

impl<T: PartialEq + Clone> Generator<T> {
    /// Wrap a model with a retry budget
    pub const fn new(model: OverlappingModel<T>, base_seed: u64, max_attempts: usize) -> Self {
        Self {
            model,
            base_seed,
            max_attempts,
        }
    }

    /// Run attempts until one decides or the budget runs out
    ///
    /// # Errors
    ///
    /// Returns an error only when reading the output of a decided wave fails;
    /// contradictions are reported through `GenerationOutcome::Exhausted`.
    pub fn generate(&mut self) -> Result<GenerationOutcome> {
        for attempt in 0..self.max_attempts {
            self.model.reseed(self.base_seed.wrapping_add(attempt as u64));
            if self.model.run() == Resolution::Decided {
                return Ok(GenerationOutcome::Decided {
                    grid: self.model.output()?,
                    attempts: attempt + 1,
                });
            }
        }
        Ok(GenerationOutcome::Exhausted {
            attempts: self.max_attempts,
        })
    }

    /// The wrapped model, for post-run inspection
    pub const fn model(&self) -> &OverlappingModel<T> {
        &self.model
    }
}

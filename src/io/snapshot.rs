//! Observational per-step wave snapshots for offline inspection
//!
//! A snapshot records, for every cell, the palette indices it can still
//! resolve to. Capture is strictly read-only with respect to the wave; a
//! model configured without capture pays nothing.

use crate::algorithm::wave::Wave;

/// One frame of solver state, taken after a step completed
#[derive(Debug, Clone)]
pub struct WaveSnapshot {
    width: usize,
    height: usize,
    cell_tiles: Vec<Vec<usize>>,
    highlights: Vec<usize>,
    step: usize,
}

impl WaveSnapshot {
    /// Capture the current tile candidates of every cell
    ///
    /// `highlights` names the cells the step touched, for renderers that want
    /// to emphasize recent activity.
    pub fn capture(wave: &Wave, step: usize, highlights: Vec<usize>) -> Self {
        let topology = wave.topology();
        let cell_tiles = (0..topology.cell_count())
            .map(|cell| wave.cell_tile_candidates(cell))
            .collect();
        Self {
            width: topology.width(),
            height: topology.height(),
            cell_tiles,
            highlights,
            step,
        }
    }

    /// Output width in cells
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Output height in cells
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Step counter at capture time
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Palette indices a cell could still resolve to at capture time
    pub fn cell_tiles(&self, cell: usize) -> &[usize] {
        self.cell_tiles.get(cell).map_or(&[], Vec::as_slice)
    }

    /// Cells touched by the step this frame closed
    pub fn highlights(&self) -> &[usize] {
        &self.highlights
    }

    /// Test whether a cell had collapsed to a single tile at capture time
    pub fn is_settled(&self, cell: usize) -> bool {
        self.cell_tiles.get(cell).is_some_and(|tiles| tiles.len() == 1)
    }
}

/// Accumulates snapshots over the course of an attempt
#[derive(Debug, Default)]
pub struct SnapshotCapture {
    frames: Vec<WaveSnapshot>,
}

impl SnapshotCapture {
    /// Create an empty capture
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Append one frame
    pub fn record(&mut self, wave: &Wave, step: usize, highlights: Vec<usize>) {
        self.frames.push(WaveSnapshot::capture(wave, step, highlights));
    }

    /// Drop all recorded frames, for attempt restarts
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// All recorded frames in capture order
    pub fn frames(&self) -> &[WaveSnapshot] {
        &self.frames
    }
}

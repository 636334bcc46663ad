//! Pattern extraction from sample grids
//!
//! Slides an N×N window over the sample, optionally generating up to eight
//! rotated/reflected variants per position, and deduplicates the results by a
//! base-C positional encoding (C = palette size). Pattern weights accumulate
//! the observed frequency of each distinct pattern across the whole sample,
//! symmetry variants included.

use crate::io::error::{GenerationError, Result, invalid_parameter};
use ndarray::Array2;
use std::collections::HashMap;

/// Symmetry variant counts accepted by the extractor
pub const SYMMETRY_LEVELS: [usize; 5] = [1, 2, 4, 6, 8];

/// Deduplicate a sample's tile tokens into palette indices
///
/// Tiles are compared with their own equality predicate, in first-seen order,
/// so no hashing is required of the token type and palette indices are
/// reproducible across runs.
///
/// # Errors
///
/// Returns an error if the sample is empty or has ragged rows.
pub fn index_sample<T: PartialEq + Clone>(rows: &[Vec<T>]) -> Result<(Array2<usize>, Vec<T>)> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if height == 0 || width == 0 {
        return Err(GenerationError::InvalidSample {
            reason: "sample grid is empty".to_string(),
        });
    }
    for (y, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(GenerationError::InvalidSample {
                reason: format!("row {y} has {} tiles, expected {width}", row.len()),
            });
        }
    }

    let mut palette: Vec<T> = Vec::new();
    let mut indexed = Array2::zeros((height, width));
    for (y, row) in rows.iter().enumerate() {
        for (x, tile) in row.iter().enumerate() {
            let id = match palette.iter().position(|t| t == tile) {
                Some(existing) => existing,
                None => {
                    palette.push(tile.clone());
                    palette.len() - 1
                }
            };
            if let Some(cell) = indexed.get_mut((y, x)) {
                *cell = id;
            }
        }
    }

    Ok((indexed, palette))
}

/// Deduplicated, weighted N×N patterns extracted from a sample
///
/// Pattern ids are assigned in insertion order during extraction, never from
/// map iteration order, so extraction is a pure function of the sample.
#[derive(Debug, Clone)]
pub struct PatternSet {
    window: usize,
    palette_len: usize,
    cells: Vec<Vec<usize>>,
    weights: Vec<f64>,
}

impl PatternSet {
    /// Extract all patterns from an indexed sample
    ///
    /// With `periodic_input` the window wraps around the sample edges and every
    /// position anchors a window; otherwise only fully-contained windows count.
    /// `symmetry` selects how many of the eight rotation/reflection variants of
    /// each window are admitted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The window size is zero, or exceeds a sample dimension under
    ///   non-periodic input
    /// - The symmetry count is not one of 1, 2, 4, 6 or 8
    /// - The palette is too large to encode patterns of this window size
    pub fn extract(
        sample: &Array2<usize>,
        palette_len: usize,
        window: usize,
        periodic_input: bool,
        symmetry: usize,
    ) -> Result<Self> {
        let (sample_height, sample_width) = sample.dim();
        validate_extraction(sample_width, sample_height, palette_len, window, periodic_input, symmetry)?;

        let span_x = if periodic_input {
            sample_width
        } else {
            sample_width - window + 1
        };
        let span_y = if periodic_input {
            sample_height
        } else {
            sample_height - window + 1
        };

        let mut cells: Vec<Vec<usize>> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        let mut by_encoding: HashMap<u128, usize> = HashMap::new();

        for y in 0..span_y {
            for x in 0..span_x {
                let base = window_at(sample, x, y, window);
                for variant in symmetry_variants(&base, window).into_iter().take(symmetry) {
                    let encoding = encode(&variant, palette_len);
                    match by_encoding.get(&encoding) {
                        Some(&id) => {
                            if let Some(weight) = weights.get_mut(id) {
                                *weight += 1.0;
                            }
                        }
                        None => {
                            by_encoding.insert(encoding, cells.len());
                            cells.push(variant);
                            weights.push(1.0);
                        }
                    }
                }
            }
        }

        Ok(Self {
            window,
            palette_len,
            cells,
            weights,
        })
    }

    /// Number of distinct patterns
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Test whether extraction produced no patterns
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Window size N shared by every pattern
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Number of distinct tiles the patterns draw from
    pub const fn palette_len(&self) -> usize {
        self.palette_len
    }

    /// Observed frequency of a pattern in the sample
    pub fn weight(&self, pattern: usize) -> f64 {
        self.weights.get(pattern).copied().unwrap_or(0.0)
    }

    /// All pattern weights, indexed by pattern id
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Row-major cells of a pattern
    pub fn cells(&self, pattern: usize) -> &[usize] {
        self.cells.get(pattern).map_or(&[], Vec::as_slice)
    }

    /// Palette index a pattern places at offset (dx, dy) from its anchor
    pub fn tile_at(&self, pattern: usize, dx: usize, dy: usize) -> usize {
        self.cells
            .get(pattern)
            .and_then(|cells| cells.get(dx + dy * self.window))
            .copied()
            .unwrap_or(0)
    }
}

fn validate_extraction(
    sample_width: usize,
    sample_height: usize,
    palette_len: usize,
    window: usize,
    periodic_input: bool,
    symmetry: usize,
) -> Result<()> {
    if window == 0 {
        return Err(invalid_parameter("window", &window, &"must be at least 1"));
    }
    if !periodic_input && (window > sample_width || window > sample_height) {
        return Err(invalid_parameter(
            "window",
            &window,
            &format!("exceeds sample dimensions {sample_width}x{sample_height} for non-periodic input"),
        ));
    }
    if !SYMMETRY_LEVELS.contains(&symmetry) {
        return Err(invalid_parameter(
            "symmetry",
            &symmetry,
            &"must be one of 1, 2, 4, 6, 8",
        ));
    }
    if palette_len == 0 {
        return Err(GenerationError::InvalidSample {
            reason: "sample palette is empty".to_string(),
        });
    }
    // Dedup relies on an exact base-C positional encoding
    if (palette_len as u128)
        .checked_pow((window * window) as u32)
        .is_none()
    {
        return Err(invalid_parameter(
            "window",
            &window,
            &format!("palette of {palette_len} tiles cannot be encoded at this window size"),
        ));
    }
    Ok(())
}

fn window_at(sample: &Array2<usize>, x: usize, y: usize, window: usize) -> Vec<usize> {
    let (sample_height, sample_width) = sample.dim();
    let mut cells = Vec::with_capacity(window * window);
    for dy in 0..window {
        for dx in 0..window {
            let sy = (y + dy) % sample_height;
            let sx = (x + dx) % sample_width;
            cells.push(sample.get((sy, sx)).copied().unwrap_or(0));
        }
    }
    cells
}

/// The eight symmetry variants in admission order: base, reflection, then
/// alternating rotations and reflections
fn symmetry_variants(base: &[usize], window: usize) -> [Vec<usize>; 8] {
    let p0 = base.to_vec();
    let p1 = reflect(&p0, window);
    let p2 = rotate(&p0, window);
    let p3 = reflect(&p2, window);
    let p4 = rotate(&p2, window);
    let p5 = reflect(&p4, window);
    let p6 = rotate(&p4, window);
    let p7 = reflect(&p6, window);
    [p0, p1, p2, p3, p4, p5, p6, p7]
}

fn rotate(cells: &[usize], window: usize) -> Vec<usize> {
    let mut rotated = Vec::with_capacity(window * window);
    for y in 0..window {
        for x in 0..window {
            let source = window - 1 - y + x * window;
            rotated.push(cells.get(source).copied().unwrap_or(0));
        }
    }
    rotated
}

fn reflect(cells: &[usize], window: usize) -> Vec<usize> {
    let mut reflected = Vec::with_capacity(window * window);
    for y in 0..window {
        for x in 0..window {
            let source = window - 1 - x + y * window;
            reflected.push(cells.get(source).copied().unwrap_or(0));
        }
    }
    reflected
}

fn encode(cells: &[usize], palette_len: usize) -> u128 {
    cells.iter().fold(0u128, |encoding, &cell| {
        encoding * palette_len as u128 + cell as u128
    })
}

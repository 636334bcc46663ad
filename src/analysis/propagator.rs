//! Pattern adjacency table construction
//!
//! For every ordered pattern pair and every grid direction, tests exact
//! tile-by-tile agreement over the (N-1)-wide band where the two windows
//! overlap. The resulting table is the sole agreement oracle consulted during
//! propagation; it is built once per extraction and read-only afterwards.

use crate::analysis::patterns::PatternSet;
use crate::spatial::grid::direction_delta;

/// Precomputed per-direction compatibility lists
///
/// `compatible(direction, a)` lists every pattern that may sit at the
/// direction's unit offset from pattern `a`. Construction is O(T²·N²); queries
/// are slice lookups.
#[derive(Debug, Clone)]
pub struct Propagator {
    compatible: [Vec<Vec<usize>>; 4],
}

impl Propagator {
    /// Build the full table for a pattern set
    pub fn build(patterns: &PatternSet) -> Self {
        let count = patterns.len();
        let window = patterns.window();
        let compatible = [0, 1, 2, 3].map(|direction| {
            let (dx, dy) = direction_delta(direction);
            (0..count)
                .map(|a| {
                    (0..count)
                        .filter(|&b| agrees(patterns, a, b, dx, dy, window))
                        .collect()
                })
                .collect()
        });
        Self { compatible }
    }

    /// Patterns allowed at the direction's unit offset from pattern `a`
    pub fn compatible(&self, direction: usize, a: usize) -> &[usize] {
        self.compatible
            .get(direction)
            .and_then(|lists| lists.get(a))
            .map_or(&[], Vec::as_slice)
    }

    /// Number of patterns supporting `a` from the given direction
    pub fn support_count(&self, direction: usize, a: usize) -> usize {
        self.compatible(direction, a).len()
    }
}

/// Exact overlap agreement between pattern `a` and pattern `b` offset by (dx, dy)
///
/// Any single disagreeing cell in the shifted overlap region disqualifies the
/// pair for that direction.
pub fn agrees(patterns: &PatternSet, a: usize, b: usize, dx: i32, dy: i32, window: usize) -> bool {
    let n = window as i32;
    let x_min = dx.max(0);
    let x_max = if dx < 0 { dx + n } else { n };
    let y_min = dy.max(0);
    let y_max = if dy < 0 { dy + n } else { n };
    for y in y_min..y_max {
        for x in x_min..x_max {
            let own = patterns.tile_at(a, x as usize, y as usize);
            let other = patterns.tile_at(b, (x - dx) as usize, (y - dy) as usize);
            if own != other {
                return false;
            }
        }
    }
    true
}

//! Forces the output's outer ring to a designated tile

use crate::algorithm::wave::Wave;
use crate::constraint::Constraint;
use crate::io::error::{GenerationError, Result};

/// One-shot constraint pinning every outer-ring cell to a single tile
///
/// At `on_clear`, for each ring cell and each pattern anchor overlapping it,
/// bans every pattern whose value at the relevant offset is not the border
/// tile. O(perimeter · N² · T); the remaining hooks are no-ops.
pub struct BorderConstraint<T> {
    tile: T,
    tile_index: Option<usize>,
}

impl<T> BorderConstraint<T> {
    /// Create a border constraint for the given tile token
    pub const fn new(tile: T) -> Self {
        Self {
            tile,
            tile_index: None,
        }
    }
}

impl<T: PartialEq> Constraint<T> for BorderConstraint<T> {
    fn init(&mut self, _wave: &Wave, palette: &[T]) -> Result<()> {
        let index = palette.iter().position(|t| *t == self.tile).ok_or_else(|| {
            GenerationError::TileNotInPalette {
                constraint: "border",
                description: "designated border tile".to_string(),
            }
        })?;
        self.tile_index = Some(index);
        Ok(())
    }

    fn on_clear(&mut self, wave: &mut Wave) {
        let Some(border_tile) = self.tile_index else {
            return;
        };
        let topology = wave.topology().clone();
        let window = wave.patterns().window();
        let pattern_count = wave.pattern_count();

        for cell in 0..topology.cell_count() {
            if !topology.on_outer_ring(cell) {
                continue;
            }
            let (x, y) = topology.coordinates(cell);
            for dy in 0..window {
                for dx in 0..window {
                    let Some(anchor) =
                        topology.pattern_anchor(x as i32 - dx as i32, y as i32 - dy as i32)
                    else {
                        continue;
                    };
                    for pattern in 0..pattern_count {
                        if wave.is_possible(anchor, pattern)
                            && wave.patterns().tile_at(pattern, dx, dy) != border_tile
                        {
                            wave.ban(anchor, pattern);
                        }
                    }
                }
            }
        }
    }

    fn on_ban(&mut self, _cell: usize, _pattern: usize) {}

    fn on_backtrack(&mut self, _cell: usize, _pattern: usize) {}

    fn check(&mut self, _wave: &mut Wave) {}
}

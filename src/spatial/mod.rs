/// Output grid topology: dimensions, periodicity, and neighbor arithmetic
pub mod grid;

pub use grid::GridTopology;

//! Output grid topology shared by the wave, the propagator, and the constraints
//!
//! Cells are indexed row-major (`index = x + y * width`). Pattern anchors follow
//! the overlapping-model window rule: on a non-periodic grid the window of an
//! anchor must fit entirely inside the output, so the last `window - 1` rows and
//! columns hold no anchor of their own.

/// Number of grid directions (left, down, right, up)
pub const DIRECTION_COUNT: usize = 4;

/// Unit vector (dx, dy) of a grid direction
pub const fn direction_delta(direction: usize) -> (i32, i32) {
    match direction {
        0 => (-1, 0),
        1 => (0, 1),
        2 => (1, 0),
        _ => (0, -1),
    }
}

/// Index of the direction opposite to the given one
pub const fn opposite_direction(direction: usize) -> usize {
    match direction {
        0 => 2,
        1 => 3,
        2 => 0,
        _ => 1,
    }
}

/// Dimensions and wrapping behavior of the output grid
///
/// Owns all coordinate arithmetic so the solver and the constraints never
/// duplicate wrapping or boundary logic.
#[derive(Debug, Clone)]
pub struct GridTopology {
    width: usize,
    height: usize,
    window: usize,
    periodic: bool,
}

impl GridTopology {
    /// Create a topology for an output grid
    pub const fn new(width: usize, height: usize, window: usize, periodic: bool) -> Self {
        Self {
            width,
            height,
            window,
            periodic,
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

    /// Window size N of the patterns laid over this grid
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Whether the output wraps around both axes
    pub const fn periodic(&self) -> bool {
        self.periodic
    }

    /// Total number of cells
    pub const fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Flat index of a pair of in-bounds coordinates
    pub const fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    /// Coordinates of a flat cell index
    pub const fn coordinates(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Test whether a coordinate pair cannot anchor a pattern window
    ///
    /// Periodic grids have no boundary. Otherwise a position is on the boundary
    /// when it is negative or its window would extend past the grid edge.
    pub const fn on_boundary(&self, x: i32, y: i32) -> bool {
        !self.periodic
            && (x < 0
                || y < 0
                || x + self.window as i32 > self.width as i32
                || y + self.window as i32 > self.height as i32)
    }

    /// Flat index of a (possibly out-of-range) coordinate pair, wrapped into bounds
    const fn wrap(&self, x: i32, y: i32) -> usize {
        let w = self.width as i32;
        let h = self.height as i32;
        let wx = ((x % w) + w) % w;
        let wy = ((y % h) + h) % h;
        self.index(wx as usize, wy as usize)
    }

    /// Anchor cell at the given coordinates, or `None` when the window rule excludes it
    ///
    /// Coordinates may be out of range; they wrap on periodic grids.
    pub const fn pattern_anchor(&self, x: i32, y: i32) -> Option<usize> {
        if self.on_boundary(x, y) {
            None
        } else {
            Some(self.wrap(x, y))
        }
    }

    /// Neighboring anchor of a cell in a direction, for constraint propagation
    ///
    /// Applies the window rule, so propagation never reaches anchors whose
    /// window would overflow a non-periodic grid.
    pub const fn propagation_neighbor(&self, index: usize, direction: usize) -> Option<usize> {
        let (x, y) = self.coordinates(index);
        let (dx, dy) = direction_delta(direction);
        self.pattern_anchor(x as i32 + dx, y as i32 + dy)
    }

    /// Neighboring cell in a direction under plain grid bounds
    ///
    /// Used for cell-level adjacency (path connectivity), where every output
    /// cell participates regardless of the window rule.
    pub const fn grid_neighbor(&self, index: usize, direction: usize) -> Option<usize> {
        let (x, y) = self.coordinates(index);
        let (dx, dy) = direction_delta(direction);
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if !self.periodic
            && (nx < 0 || ny < 0 || nx >= self.width as i32 || ny >= self.height as i32)
        {
            None
        } else {
            Some(self.wrap(nx, ny))
        }
    }

    /// Test whether a cell lies on the outer ring of the grid
    pub const fn on_outer_ring(&self, index: usize) -> bool {
        let (x, y) = self.coordinates(index);
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }
}

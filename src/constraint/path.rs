//! Keeps the cells resolving to path tiles globally connected
//!
//! Tracks, per cell, whether any surviving overlapping pattern places a path
//! tile there (`could_be_path`) and whether all of them do (`must_be_path`).
//! Both flags refresh lazily through a dirty queue fed by the ban/backtrack
//! hooks. `check` computes articulation points of the could-be-path grid graph
//! with must-be-path cells as the vertices whose connectivity is required,
//! flags a contradiction when some required cell is unreachable, and forces
//! every articulation point to stay a path cell. Forcing can create new
//! articulation points, so the loop runs to a fixed point.

use crate::algorithm::wave::Wave;
use crate::constraint::Constraint;
use crate::io::error::{GenerationError, Result};
use crate::spatial::GridTopology;
use crate::spatial::grid::DIRECTION_COUNT;

/// Connectivity constraint over a set of path tiles
pub struct PathConstraint<T> {
    tiles: Vec<T>,
    is_path_tile: Vec<bool>,
    topology: Option<GridTopology>,
    neighbors: Vec<Vec<usize>>,
    could_be_path: Vec<bool>,
    must_be_path: Vec<bool>,
    dirty: Vec<bool>,
    dirty_queue: Vec<usize>,
}

impl<T> PathConstraint<T> {
    /// Create a path constraint over the given tile tokens
    pub const fn new(tiles: Vec<T>) -> Self {
        Self {
            tiles,
            is_path_tile: Vec::new(),
            topology: None,
            neighbors: Vec::new(),
            could_be_path: Vec::new(),
            must_be_path: Vec::new(),
            dirty: Vec::new(),
            dirty_queue: Vec::new(),
        }
    }

    /// Mark a cell and its neighboring anchors for flag recomputation
    fn mark_dirty(&mut self, cell: usize) {
        let Some(topology) = self.topology.clone() else {
            return;
        };
        if self.dirty.get(cell).copied().unwrap_or(true) {
            return;
        }
        if let Some(flag) = self.dirty.get_mut(cell) {
            *flag = true;
        }
        self.dirty_queue.push(cell);
        for direction in 0..DIRECTION_COUNT {
            let Some(neighbor) = topology.propagation_neighbor(cell, direction) else {
                continue;
            };
            if !self.dirty.get(neighbor).copied().unwrap_or(true) {
                if let Some(flag) = self.dirty.get_mut(neighbor) {
                    *flag = true;
                }
                self.dirty_queue.push(neighbor);
            }
        }
    }

    /// Recompute `could_be_path`/`must_be_path` for every queued cell
    ///
    /// A cell's tile is placed by every surviving pattern of every anchor whose
    /// window covers it; the flags aggregate over all those placements.
    fn refresh_dirty(&mut self, wave: &Wave) {
        let Some(topology) = self.topology.clone() else {
            return;
        };
        let window = wave.patterns().window();
        while let Some(cell) = self.dirty_queue.pop() {
            if let Some(flag) = self.dirty.get_mut(cell) {
                *flag = false;
            }
            let (x, y) = topology.coordinates(cell);
            let mut path_count = 0usize;
            let mut total_count = 0usize;
            for dy in 0..window {
                for dx in 0..window {
                    let Some(anchor) =
                        topology.pattern_anchor(x as i32 - dx as i32, y as i32 - dy as i32)
                    else {
                        continue;
                    };
                    for pattern in 0..wave.pattern_count() {
                        if !wave.is_possible(anchor, pattern) {
                            continue;
                        }
                        total_count += 1;
                        let tile = wave.patterns().tile_at(pattern, dx, dy);
                        if self.is_path_tile.get(tile).copied().unwrap_or(false) {
                            path_count += 1;
                        }
                    }
                }
            }
            if let Some(flag) = self.could_be_path.get_mut(cell) {
                *flag = path_count > 0;
            }
            if let Some(flag) = self.must_be_path.get_mut(cell) {
                *flag = path_count > 0 && path_count == total_count;
            }
        }
    }

    /// Force path placement at every articulation point not yet must-be-path
    ///
    /// Bans, at every covering anchor, each surviving pattern that places a
    /// non-path tile on the articulation cell. Returns whether any ban landed.
    fn apply_articulation_points(&mut self, wave: &mut Wave, is_articulation: &[bool]) -> bool {
        let Some(topology) = self.topology.clone() else {
            return false;
        };
        let window = wave.patterns().window();
        let mut changed = false;
        for cell in 0..topology.cell_count() {
            if !is_articulation.get(cell).copied().unwrap_or(false)
                || self.must_be_path.get(cell).copied().unwrap_or(false)
            {
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
                    for pattern in 0..wave.pattern_count() {
                        if !wave.is_possible(anchor, pattern) {
                            continue;
                        }
                        let tile = wave.patterns().tile_at(pattern, dx, dy);
                        if !self.is_path_tile.get(tile).copied().unwrap_or(false)
                            && wave.ban(anchor, pattern)
                        {
                            // Event delivery is deferred, so mark our own bans now
                            self.mark_dirty(anchor);
                            changed = true;
                        }
                    }
                }
            }
        }
        changed
    }

    /// Articulation points of the could-be-path graph, or `None` when some
    /// must-be-path cell is unreachable from the others
    fn articulation_points(&self) -> Option<Vec<bool>> {
        let indices = self.could_be_path.len();
        let mut low = vec![0u32; indices];
        let mut dfs_num = vec![0u32; indices];
        let mut is_articulation = vec![false; indices];
        let mut counter = 1u32;

        // Walk the component holding the required cells first
        for cell in 0..indices {
            if self.could_be_path.get(cell).copied().unwrap_or(false)
                && self.must_be_path.get(cell).copied().unwrap_or(false)
                && dfs_num.get(cell).copied().unwrap_or(1) == 0
            {
                self.low_link_walk(cell, &mut low, &mut dfs_num, &mut counter, &mut is_articulation);
                break;
            }
        }

        // Every required cell must have been reached by that walk
        for cell in 0..indices {
            if self.must_be_path.get(cell).copied().unwrap_or(false)
                && dfs_num.get(cell).copied().unwrap_or(1) == 0
            {
                return None;
            }
        }

        // Remaining components: the root is an articulation point when it has
        // more than one DFS child
        for cell in 0..indices {
            if !self.could_be_path.get(cell).copied().unwrap_or(false)
                || self.must_be_path.get(cell).copied().unwrap_or(false)
                || dfs_num.get(cell).copied().unwrap_or(1) != 0
                || is_articulation.get(cell).copied().unwrap_or(false)
            {
                continue;
            }
            let children =
                self.low_link_walk(cell, &mut low, &mut dfs_num, &mut counter, &mut is_articulation);
            if let Some(flag) = is_articulation.get_mut(cell) {
                *flag = children > 1;
            }
        }

        Some(is_articulation)
    }

    /// Explicit-stack Tarjan low-link DFS from one root
    ///
    /// Recursion depth is unbounded by the grid size, so the walk keeps its own
    /// frame stack. A vertex is marked as an articulation point when a DFS
    /// subtree that cannot climb above it contains a required cell; required
    /// vertices themselves are always marked. Returns the root's child count.
    fn low_link_walk(
        &self,
        root: usize,
        low: &mut [u32],
        dfs_num: &mut [u32],
        counter: &mut u32,
        is_articulation: &mut [bool],
    ) -> usize {
        enum Action {
            Descend(usize),
            Leave,
        }

        let mut stack = vec![WalkFrame::new(root)];
        let mut child_relevant = false;
        let mut root_children = 0usize;

        while !stack.is_empty() {
            let frame_index = stack.len() - 1;
            let vertex;
            {
                let Some(frame) = stack.get_mut(frame_index) else {
                    break;
                };
                vertex = frame.vertex;
                if !frame.entered {
                    frame.entered = true;
                    if self.must_be_path.get(vertex).copied().unwrap_or(false) {
                        frame.relevant_subtree = true;
                        if let Some(flag) = is_articulation.get_mut(vertex) {
                            *flag = true;
                        }
                    }
                    if let Some(number) = dfs_num.get_mut(vertex) {
                        *number = *counter;
                    }
                    if let Some(link) = low.get_mut(vertex) {
                        *link = *counter;
                    }
                    *counter += 1;
                }
                if frame.awaiting_child {
                    frame.awaiting_child = false;
                    let child = self
                        .neighbors
                        .get(vertex)
                        .and_then(|adjacent| adjacent.get(frame.neighbor_index))
                        .copied()
                        .unwrap_or(vertex);
                    if frame_index == 0 {
                        root_children += 1;
                    }
                    if child_relevant {
                        frame.relevant_subtree = true;
                    }
                    let child_low = low.get(child).copied().unwrap_or(0);
                    let own_number = dfs_num.get(vertex).copied().unwrap_or(0);
                    if child_low >= own_number
                        && child_relevant
                        && let Some(flag) = is_articulation.get_mut(vertex)
                    {
                        *flag = true;
                    }
                    if let Some(link) = low.get_mut(vertex) {
                        *link = (*link).min(child_low);
                    }
                    frame.neighbor_index += 1;
                }
            }

            let mut action = Action::Leave;
            {
                let Some(frame) = stack.get_mut(frame_index) else {
                    break;
                };
                while let Some(&next) = self
                    .neighbors
                    .get(vertex)
                    .and_then(|adjacent| adjacent.get(frame.neighbor_index))
                {
                    if !self.could_be_path.get(next).copied().unwrap_or(false) {
                        frame.neighbor_index += 1;
                        continue;
                    }
                    if dfs_num.get(next).copied().unwrap_or(1) == 0 {
                        frame.awaiting_child = true;
                        action = Action::Descend(next);
                        break;
                    }
                    let seen_number = dfs_num.get(next).copied().unwrap_or(0);
                    if let Some(link) = low.get_mut(vertex) {
                        *link = (*link).min(seen_number);
                    }
                    frame.neighbor_index += 1;
                }
                if matches!(action, Action::Leave) {
                    child_relevant = frame.relevant_subtree;
                }
            }

            match action {
                Action::Descend(next) => stack.push(WalkFrame::new(next)),
                Action::Leave => {
                    stack.pop();
                }
            }
        }

        root_children
    }
}

impl<T: PartialEq> Constraint<T> for PathConstraint<T> {
    fn init(&mut self, wave: &Wave, palette: &[T]) -> Result<()> {
        self.is_path_tile = vec![false; palette.len()];
        for tile in &self.tiles {
            let index = palette.iter().position(|t| t == tile).ok_or_else(|| {
                GenerationError::TileNotInPalette {
                    constraint: "path",
                    description: "designated path tile".to_string(),
                }
            })?;
            if let Some(flag) = self.is_path_tile.get_mut(index) {
                *flag = true;
            }
        }

        let topology = wave.topology().clone();
        let indices = topology.cell_count();
        self.could_be_path = vec![false; indices];
        self.must_be_path = vec![false; indices];
        self.dirty = vec![false; indices];
        self.dirty_queue = Vec::new();
        self.topology = Some(topology);
        Ok(())
    }

    fn on_clear(&mut self, wave: &mut Wave) {
        let Some(topology) = self.topology.clone() else {
            return;
        };
        let indices = topology.cell_count();
        self.could_be_path = vec![false; indices];
        self.must_be_path = vec![false; indices];
        self.dirty = vec![true; indices];
        self.dirty_queue = (0..indices).collect();
        self.refresh_dirty(wave);

        // Cell-level adjacency under plain grid bounds, built once per attempt
        self.neighbors = (0..indices)
            .map(|cell| {
                (0..DIRECTION_COUNT)
                    .filter_map(|direction| topology.grid_neighbor(cell, direction))
                    .collect()
            })
            .collect();
    }

    fn on_ban(&mut self, cell: usize, _pattern: usize) {
        self.mark_dirty(cell);
    }

    fn on_backtrack(&mut self, cell: usize, _pattern: usize) {
        self.mark_dirty(cell);
    }

    fn check(&mut self, wave: &mut Wave) {
        loop {
            self.refresh_dirty(wave);
            let Some(is_articulation) = self.articulation_points() else {
                wave.mark_contradiction();
                return;
            };
            if !self.apply_articulation_points(wave, &is_articulation) {
                return;
            }
        }
    }
}

/// One suspended invocation of the low-link walk
struct WalkFrame {
    vertex: usize,
    neighbor_index: usize,
    relevant_subtree: bool,
    entered: bool,
    awaiting_child: bool,
}

impl WalkFrame {
    const fn new(vertex: usize) -> Self {
        Self {
            vertex,
            neighbor_index: 0,
            relevant_subtree: false,
            entered: false,
            awaiting_child: false,
        }
    }
}

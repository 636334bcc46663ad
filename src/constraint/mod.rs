//! Pluggable constraint framework
//!
//! Constraints observe and influence the wave through four lifecycle hooks
//! without the solver knowing their semantics. The model replays the wave's
//! backtrack log to `on_ban` after each wave operation (rather than calling it
//! from inside `ban`), which keeps borrows untangled; hooks only mark dirty
//! state, so deferred delivery is observably equivalent to the synchronous
//! form. A constraint that bans from its own `check` marks its own dirty
//! state directly.

use crate::algorithm::wave::Wave;
use crate::io::error::Result;

/// Border-forcing constraint over the output's outer ring
pub mod border;
/// Path-connectivity constraint built on articulation points
pub mod path;

pub use border::BorderConstraint;
pub use path::PathConstraint;

/// A rule hooked into the solver lifecycle
///
/// Hooks may ban patterns and flag a contradiction, but must not assume any
/// ordering among sibling constraints beyond the caller's list order. All
/// per-cell scratch state belongs to the constraint itself, sized to the grid
/// at `init`.
pub trait Constraint<T> {
    /// Resolve tile references against the palette and size scratch state
    ///
    /// Runs once before the first attempt, before any propagation.
    ///
    /// # Errors
    ///
    /// Returns an error if the constraint references a tile absent from the
    /// sample palette.
    fn init(&mut self, wave: &Wave, palette: &[T]) -> Result<()>;

    /// React to the wave being reset to fully open at the start of an attempt
    fn on_clear(&mut self, wave: &mut Wave);

    /// Observe one pattern elimination (delivered after the fact)
    fn on_ban(&mut self, cell: usize, pattern: usize);

    /// Observe one undone elimination during backtracking
    fn on_backtrack(&mut self, cell: usize, pattern: usize);

    /// Enforce the constraint's invariant, banning or flagging contradiction
    fn check(&mut self, wave: &mut Wave);
}

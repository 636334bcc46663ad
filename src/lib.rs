//! Overlapping-model constraint solver for procedural tile pattern synthesis
//!
//! The system extracts weighted N×N patterns from a small sample grid, precomputes
//! which patterns may sit next to each other, and collapses a larger output grid by
//! propagating those adjacency constraints and committing to weighted random choices.
//! Pluggable constraints (border forcing, path connectivity) hook into the solver
//! lifecycle without the core knowing their semantics.

#![forbid(unsafe_code)]

/// Core solver implementation: possibility bitsets, the wave state machine, and the model driver
pub mod algorithm;
/// Sample indexing, pattern extraction, and propagator construction
pub mod analysis;
/// Pluggable constraint framework with border and path-connectivity rules
pub mod constraint;
/// Input/output operations and error handling
pub mod io;
/// Grid topology and direction handling
pub mod spatial;

pub use io::error::{GenerationError, Result};

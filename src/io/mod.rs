/// Command-line interface for generating patterns from PNG samples
pub mod cli;
/// Generator configuration and validation
pub mod configuration;
/// Error types for configuration, solving, and file operations
pub mod error;
/// PNG sample loading and output export
pub mod image;
/// Progress display for interactive runs
pub mod progress;
/// Observational per-step wave snapshots for offline inspection
pub mod snapshot;

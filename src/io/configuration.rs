//! Solver constants and runtime configuration defaults

use crate::analysis::patterns::SYMMETRY_LEVELS;
use crate::io::error::{Result, invalid_parameter};

/// Default pattern window size N
pub const DEFAULT_WINDOW: usize = 3;

/// Default output width and height in cells
pub const DEFAULT_OUTPUT_SIZE: usize = 48;

/// Default number of symmetry variants admitted during extraction
pub const DEFAULT_SYMMETRY: usize = 8;

// Default values for configurable parameters
/// Fixed seed for reproducible generation
pub const DEFAULT_SEED: u64 = 42;

/// Default number of restart attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

// Safety limit to prevent excessive memory allocation
/// Maximum allowed output dimension
pub const MAX_GRID_DIMENSION: usize = 10_000;

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 50;

// Output settings
/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_result";

/// Everything the generator needs besides the sample and the constraints
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Pattern window size N
    pub window: usize,
    /// Output width in cells
    pub output_width: usize,
    /// Output height in cells
    pub output_height: usize,
    /// Whether extraction windows wrap around the sample edges
    pub periodic_input: bool,
    /// Whether the output grid wraps around both axes
    pub periodic_output: bool,
    /// Number of rotation/reflection variants admitted (1, 2, 4, 6 or 8)
    pub symmetry: usize,
    /// Pattern id forced along the bottom row, if any
    pub ground: Option<usize>,
    /// Base random seed; attempt k runs with `seed + k`
    pub seed: u64,
    /// Number of restart attempts before reporting exhaustion
    pub max_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            output_width: DEFAULT_OUTPUT_SIZE,
            output_height: DEFAULT_OUTPUT_SIZE,
            periodic_input: false,
            periodic_output: false,
            symmetry: DEFAULT_SYMMETRY,
            ground: None,
            seed: DEFAULT_SEED,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl GeneratorConfig {
    /// Fail fast on parameter combinations the solver cannot run with
    ///
    /// Pattern-dependent checks (ground id range, window vs. sample size) run
    /// later, at model construction, once the sample is known.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or exceeds the safety limit,
    /// the window is zero or larger than a non-periodic output dimension, the
    /// symmetry level is unsupported, or no attempt would run.
    pub fn validate(&self) -> Result<()> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(invalid_parameter(
                "output size",
                &format!("{}x{}", self.output_width, self.output_height),
                &"output dimensions must be at least 1",
            ));
        }
        if self.output_width > MAX_GRID_DIMENSION || self.output_height > MAX_GRID_DIMENSION {
            return Err(invalid_parameter(
                "output size",
                &format!("{}x{}", self.output_width, self.output_height),
                &format!("output dimensions are capped at {MAX_GRID_DIMENSION}"),
            ));
        }
        if self.window == 0 {
            return Err(invalid_parameter("window", &self.window, &"must be at least 1"));
        }
        if !self.periodic_output
            && (self.window > self.output_width || self.window > self.output_height)
        {
            return Err(invalid_parameter(
                "window",
                &self.window,
                &"exceeds the output dimensions of a non-periodic grid",
            ));
        }
        if !SYMMETRY_LEVELS.contains(&self.symmetry) {
            return Err(invalid_parameter(
                "symmetry",
                &self.symmetry,
                &"must be one of 1, 2, 4, 6, 8",
            ));
        }
        if self.max_attempts == 0 {
            return Err(invalid_parameter(
                "max attempts",
                &self.max_attempts,
                &"must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let config = GeneratorConfig {
            output_width: 0,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_larger_than_output_rejected() {
        let config = GeneratorConfig {
            window: 50,
            output_width: 8,
            output_height: 8,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_periodic_output_allows_large_window() {
        let config = GeneratorConfig {
            window: 50,
            output_width: 8,
            output_height: 8,
            periodic_output: true,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_symmetry_rejected() {
        let config = GeneratorConfig {
            symmetry: 3,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! Command-line interface for generating outputs from PNG sample files

use crate::algorithm::executor::OverlappingModel;
use crate::algorithm::wave::Resolution;
use crate::constraint::{BorderConstraint, Constraint, PathConstraint};
use crate::io::configuration::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_OUTPUT_SIZE, DEFAULT_SEED, DEFAULT_SYMMETRY, DEFAULT_WINDOW,
    GeneratorConfig, OUTPUT_SUFFIX,
};
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::{export_grid_png, load_sample_png, parse_hex_color};
use crate::io::progress::ProgressTracker;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "wavepath")]
#[command(
    author,
    version,
    about = "Generate tile patterns from PNG samples with connectivity constraints"
)]
/// Command-line arguments for the generation tool
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input PNG file or directory to process
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Random seed for reproducible generation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Restart attempts before giving up on a sample
    #[arg(short, long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub attempts: usize,

    /// Output width in cells
    #[arg(short = 'w', long, default_value_t = DEFAULT_OUTPUT_SIZE)]
    pub width: usize,

    /// Output height in cells
    #[arg(short = 'H', long, default_value_t = DEFAULT_OUTPUT_SIZE)]
    pub height: usize,

    /// Pattern window size N
    #[arg(short = 'n', long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Rotation/reflection variants admitted during extraction (1, 2, 4, 6, 8)
    #[arg(long, default_value_t = DEFAULT_SYMMETRY)]
    pub symmetry: usize,

    /// Wrap extraction windows around the sample edges
    #[arg(long)]
    pub periodic_input: bool,

    /// Wrap the output grid around both axes
    #[arg(long)]
    pub periodic_output: bool,

    /// Pattern id forced along the bottom row
    #[arg(short, long)]
    pub ground: Option<usize>,

    /// Force the output's outer ring to this tile (RRGGBB hex color)
    #[arg(short, long)]
    pub border: Option<String>,

    /// Keep cells of these tiles globally connected (RRGGBB hex, repeatable)
    #[arg(short, long)]
    pub path: Vec<String>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Process files even if output exists
    #[arg(long)]
    pub no_skip: bool,
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    const fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            window: self.window,
            output_width: self.width,
            output_height: self.height,
            periodic_input: self.periodic_input,
            periodic_output: self.periodic_output,
            symmetry: self.symmetry,
            ground: self.ground,
            seed: self.seed,
            max_attempts: self.attempts,
        }
    }

    fn constraints(&self) -> Result<Vec<Box<dyn Constraint<[u8; 4]>>>> {
        let mut constraints: Vec<Box<dyn Constraint<[u8; 4]>>> = Vec::new();
        if let Some(border) = &self.border {
            constraints.push(Box::new(BorderConstraint::new(parse_hex_color(border)?)));
        }
        if !self.path.is_empty() {
            let tiles = self
                .path
                .iter()
                .map(|color| parse_hex_color(color))
                .collect::<Result<Vec<_>>>()?;
            constraints.push(Box::new(PathConstraint::new(tiles)));
        }
        Ok(constraints)
    }
}

/// Orchestrates generation runs over one or more PNG sample files
pub struct SampleProcessor {
    cli: Cli,
}

impl SampleProcessor {
    /// Create a processor from parsed CLI arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Process every targeted sample file
    ///
    /// # Errors
    ///
    /// Returns an error if target validation, sample loading, model
    /// construction, or output export fails. A sample whose attempts all end
    /// in contradiction is reported on stderr but does not abort the batch.
    pub fn process(&mut self) -> Result<()> {
        let files = self.collect_files()?;
        for file in &files {
            self.process_file(file)?;
        }
        Ok(())
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        if self.cli.target.is_file() {
            if self.cli.target.extension().and_then(|s| s.to_str()) == Some("png") {
                if self.should_process_file(&self.cli.target) {
                    Ok(vec![self.cli.target.clone()])
                } else {
                    Ok(vec![])
                }
            } else {
                Err(invalid_parameter(
                    "target",
                    &self.cli.target.display(),
                    &"target file must be a PNG image",
                ))
            }
        } else if self.cli.target.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&self.cli.target)? {
                let path = entry?.path();
                if path.extension().and_then(|s| s.to_str()) == Some("png")
                    && !Self::is_generated_output(&path)
                    && self.should_process_file(&path)
                {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(invalid_parameter(
                "target",
                &self.cli.target.display(),
                &"target must be a PNG file or directory",
            ))
        }
    }

    fn should_process_file(&self, input_path: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }

        let output_path = Self::get_output_path(input_path);
        if output_path.exists() {
            // Allow print for user feedback for progress messages
            #[allow(clippy::print_stderr)]
            if !self.cli.quiet {
                eprintln!("Skipping: {} (output exists)", input_path.display());
            }
            false
        } else {
            true
        }
    }

    // Allow print for user feedback on exhausted samples
    #[allow(clippy::print_stderr)]
    fn process_file(&self, input_path: &Path) -> Result<()> {
        let sample = load_sample_png(input_path)?;
        let config = self.cli.config();
        let mut model = OverlappingModel::new(&sample, &config, self.cli.constraints()?)?;

        let progress = self
            .cli
            .should_show_progress()
            .then(|| ProgressTracker::new(model.observable_cells()));

        let mut decided = false;
        for attempt in 0..config.max_attempts {
            if let Some(tracker) = &progress {
                tracker.start_attempt(attempt + 1, config.max_attempts);
            }
            model.reseed(config.seed.wrapping_add(attempt as u64));
            let mut status = model.clear();
            while !status.is_terminal() {
                status = model.step();
                if let Some(tracker) = &progress {
                    tracker.update_cells(model.decided_cells());
                }
            }
            if status == Resolution::Decided {
                decided = true;
                break;
            }
        }

        if decided {
            if let Some(tracker) = &progress {
                tracker.finish("decided");
            }
            let grid = model.output()?;
            let palette: Vec<[u8; 4]> = model.palette().to_vec();
            export_grid_png(&grid, &palette, &Self::get_output_path(input_path))?;
        } else {
            if let Some(tracker) = &progress {
                tracker.finish("exhausted");
            }
            eprintln!(
                "No decided output for {} within {} attempts",
                input_path.display(),
                config.max_attempts
            );
        }
        Ok(())
    }

    fn is_generated_output(path: &Path) -> bool {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.ends_with(OUTPUT_SUFFIX))
    }

    fn get_output_path(input_path: &Path) -> PathBuf {
        let stem = input_path.file_stem().unwrap_or_default();
        let extension = input_path.extension().unwrap_or_default();
        let output_name = format!(
            "{}{}.{}",
            stem.to_string_lossy(),
            OUTPUT_SUFFIX,
            extension.to_string_lossy()
        );

        if let Some(parent) = input_path.parent() {
            parent.join(output_name)
        } else {
            PathBuf::from(output_name)
        }
    }
}

//! CLI entry point for the overlapping-model pattern synthesizer

use clap::Parser;
use wavepath::io::cli::{Cli, SampleProcessor};

fn main() -> wavepath::Result<()> {
    let cli = Cli::parse();
    let mut processor = SampleProcessor::new(cli);
    processor.process()
}

use anyhow::{Context, Result};
use clap::Parser;

use cornell_gt::{Cli, init_logger, run_pipeline};

fn main() -> Result<()> {
    init_logger();

    let args = Cli::parse()
        .into_run_args()
        .context("Failed to load configuration")?;

    let output = run_pipeline(&args)
        .with_context(|| format!("Failed to process dataset {:?}", args.dataset_dir))?;

    tracing::info!("Ground-truth index holds {} images", output.index.len());

    // Missed-mask paths go to stdout, one per line
    for missed in &output.missed {
        println!("{}", missed.path.display());
    }

    Ok(())
}

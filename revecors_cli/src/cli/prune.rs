use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use revecors_core::batch::run_pruning;

#[derive(Args)]
pub struct PruneArgs {
    /// Directory holding the curated models, which are overwritten
    #[arg(long)]
    pub processed_dir: PathBuf,

    /// Directory holding the currency tables
    #[arg(long)]
    pub reference_dir: PathBuf,

    /// Directory receiving the summary table
    #[arg(long)]
    pub summary_dir: PathBuf,

    /// JSON file with custom curation rules
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

pub fn run(args: PruneArgs) -> anyhow::Result<()> {
    let rules = super::load_rules(args.rules.as_deref())?;
    let report = run_pruning(
        &args.processed_dir,
        &args.reference_dir,
        &args.summary_dir,
        &rules,
    )
    .context("Pruning batch could not start")?;
    super::finish(report, &args.summary_dir)
}

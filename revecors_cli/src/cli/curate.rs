use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use revecors_core::batch::{run_curation, BatchDirs};

#[derive(Args)]
pub struct CurateArgs {
    /// Directory holding one subdirectory per raw model
    #[arg(long)]
    pub raw_dir: PathBuf,

    /// Directory receiving the curated models
    #[arg(long)]
    pub processed_dir: PathBuf,

    /// Directory holding the formula, charge and currency tables
    #[arg(long)]
    pub reference_dir: PathBuf,

    /// Directory receiving the summary table
    #[arg(long)]
    pub summary_dir: PathBuf,

    /// JSON file with custom curation rules
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

pub fn run(args: CurateArgs) -> anyhow::Result<()> {
    let rules = super::load_rules(args.rules.as_deref())?;
    let dirs = BatchDirs {
        raw: args.raw_dir,
        processed: args.processed_dir,
        reference: args.reference_dir,
        summary: args.summary_dir,
    };
    let report = run_curation(&dirs, &rules).context("Curation batch could not start")?;
    super::finish(report, &dirs.summary)
}

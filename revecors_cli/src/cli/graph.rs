use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use revecors_core::batch::run_graph;

#[derive(Args)]
pub struct GraphArgs {
    /// Directory holding the processed models
    #[arg(long)]
    pub processed_dir: PathBuf,

    /// Directory receiving the summary table
    #[arg(long)]
    pub summary_dir: PathBuf,
}

pub fn run(args: GraphArgs) -> anyhow::Result<()> {
    let report =
        run_graph(&args.processed_dir, &args.summary_dir).context("Graph batch could not start")?;
    super::finish(report, &args.summary_dir)
}

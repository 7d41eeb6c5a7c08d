//! Command-line interface for revecors.
//!
//! - **curate**: filter, balance and normalize raw KBase models
//! - **prune**: remove currency metabolites from curated models
//! - **graph**: write adjacency and reaction edge lists of processed models
//!
//! ## Usage
//!
//! ```text
//! revecors curate --raw-dir raw --processed-dir processed \
//!     --reference-dir reference --summary-dir summary
//! revecors prune --processed-dir processed --reference-dir reference --summary-dir summary
//! revecors graph --processed-dir processed --summary-dir summary
//! ```

use std::path::Path;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use revecors_core::batch::BatchReport;
use revecors_core::curation::CurationRules;

pub mod curate;
pub mod graph;
pub mod prune;

#[derive(Parser)]
#[command(name = "revecors")]
#[command(version)]
#[command(about = "Curate draft metabolic models and convert them into metabolite graphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter, balance and normalize raw models
    Curate(curate::CurateArgs),

    /// Prune currency metabolites from curated models
    Prune(prune::PruneArgs),

    /// Write the metabolite graphs of processed models
    Graph(graph::GraphArgs),
}

/// Built in rules, or the rules of a JSON rule file
fn load_rules(path: Option<&Path>) -> anyhow::Result<CurationRules> {
    match path {
        Some(path) => CurationRules::read_json(path)
            .with_context(|| format!("Failed to load curation rules from {}", path.display())),
        None => Ok(CurationRules::default()),
    }
}

/// Log the outcome of a batch, failing if no model could be processed
fn finish(report: BatchReport, summary: &Path) -> anyhow::Result<()> {
    info!(
        "Processed {} models, {} failed, summary written to {}",
        report.processed.len(),
        report.failures.len(),
        summary.display()
    );
    for failure in &report.failures {
        warn!(
            "{} ({}, {}): {}",
            failure.model,
            failure.step,
            failure.path.display(),
            failure.error
        );
    }
    if report.all_failed() {
        bail!("All {} models failed", report.failures.len());
    }
    Ok(())
}

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("revecors=debug,revecors_core=debug")
    } else {
        EnvFilter::new("revecors=info,revecors_core=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Curate(args) => cli::curate::run(args)?,
        cli::Commands::Prune(args) => cli::prune::run(args)?,
        cli::Commands::Graph(args) => cli::graph::run(args)?,
    }

    Ok(())
}

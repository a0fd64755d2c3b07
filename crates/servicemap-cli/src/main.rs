//! Servicemap CLI - Command-line interface for Servicemap
//!
//! Loads a topology snapshot from JSON and runs one analysis over it:
//! routes between services, blast radius, cycles, levels and rankings.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "servicemap")]
#[command(author = "Servicemap Contributors")]
#[command(version)]
#[command(about = "Dependency analysis for service topologies", long_about = None)]
struct Cli {
    /// Topology snapshot (JSON with `nodes` and `edges`)
    #[arg(short, long, global = true)]
    snapshot: Option<PathBuf>,

    /// Analyzer configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service and relationship counts
    Stats,

    /// Find the cheapest route between two services
    Path {
        /// Source service id
        from: String,
        /// Target service id
        to: String,
    },

    /// List every route between two services
    Paths {
        /// Source service id
        from: String,
        /// Target service id
        to: String,

        /// Maximum hops per route (defaults to the configured limit)
        #[arg(short, long)]
        max_length: Option<usize>,
    },

    /// Preview the blast radius of a service failing
    Impact {
        /// Service id to analyze
        node: String,
    },

    /// Detect circular dependencies
    Cycles,

    /// Group services by depth from the entry points
    Levels,

    /// Show the longest weighted dependency chain
    CriticalPath,

    /// Rank services by betweenness centrality
    Centrality {
        /// Maximum results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Full dependency report: cycles, levels, critical edges, bottlenecks
    Analyze,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> commands::Result<()> {
    let snapshot = cli.snapshot.ok_or(commands::CliError::MissingSnapshot)?;
    let analyzer = commands::load_analyzer(&snapshot, cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Stats => commands::stats(&analyzer, json),
        Commands::Path { from, to } => commands::path(&analyzer, &from, &to, json),
        Commands::Paths {
            from,
            to,
            max_length,
        } => commands::paths(&analyzer, &from, &to, max_length, json),
        Commands::Impact { node } => commands::impact(&analyzer, &node, json),
        Commands::Cycles => commands::cycles(&analyzer, json),
        Commands::Levels => commands::levels(&analyzer, json),
        Commands::CriticalPath => commands::critical_path(&analyzer, json),
        Commands::Centrality { limit } => commands::centrality(&analyzer, limit, json),
        Commands::Analyze => commands::analyze(&analyzer, json),
    }
}

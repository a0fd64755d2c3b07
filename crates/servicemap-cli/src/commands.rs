//! CLI command implementations.

use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use servicemap_core::TopologySnapshot;
use servicemap_graph::{
    AnalysisError, AnalyzerConfig, CriticalPath, CriticalReason, ServicePath, TopologyAnalyzer,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

/// Everything a command can fail with.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("no snapshot given, pass --snapshot <FILE>")]
    MissingSnapshot,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a topology snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<TopologySnapshot> {
    read_json(path)
}

/// Reads analyzer settings; missing fields keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    match path {
        Some(path) => read_json(path),
        None => Ok(AnalyzerConfig::default()),
    }
}

pub fn load_analyzer(snapshot: &Path, config: Option<&Path>) -> Result<TopologyAnalyzer> {
    let config = load_config(config)?;
    let snapshot = load_snapshot(snapshot)?;
    Ok(TopologyAnalyzer::with_config(&snapshot, config))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_route(path: &ServicePath) -> String {
    path.nodes.join(" → ")
}

/// Show graph statistics.
pub fn stats(analyzer: &TopologyAnalyzer, json: bool) -> Result<()> {
    let stats = analyzer.graph().stats();
    if json {
        return print_json(&stats);
    }

    println!("{}", "Topology".cyan().bold());
    println!("  Services:      {}", stats.node_count.to_string().cyan());
    println!("  Relationships: {}", stats.edge_count.to_string().cyan());
    println!("  Entry points:  {}", stats.root_count);
    println!("  Leaves:        {}", stats.leaf_count);

    Ok(())
}

/// Find the cheapest route between two services.
pub fn path(analyzer: &TopologyAnalyzer, from: &str, to: &str, json: bool) -> Result<()> {
    let path = analyzer.find_shortest_path(from, to);
    if json {
        return print_json(&path);
    }

    match path {
        Some(path) => {
            println!("{} {}", "✓".green(), format_route(&path));
            println!("  {} hops, cost {:.3}", path.hops, path.cost);
        }
        None => println!("{} No path from {} to {}", "✗".red(), from.cyan(), to.cyan()),
    }

    Ok(())
}

/// List every route between two services.
pub fn paths(
    analyzer: &TopologyAnalyzer,
    from: &str,
    to: &str,
    max_length: Option<usize>,
    json: bool,
) -> Result<()> {
    let max_length = max_length.unwrap_or(analyzer.config().max_path_length);
    let paths = analyzer.find_all_paths(from, to, max_length)?;
    if json {
        return print_json(&paths);
    }

    if paths.is_empty() {
        println!(
            "{} No path from {} to {} within {} hops",
            "✗".red(),
            from.cyan(),
            to.cyan(),
            max_length
        );
        return Ok(());
    }

    println!("Found {} routes:\n", paths.len().to_string().cyan());
    for (i, path) in paths.iter().enumerate() {
        println!(
            "{}. {} {}",
            i + 1,
            format_route(path),
            format!("({} hops, cost {:.3})", path.hops, path.cost).dimmed()
        );
    }

    Ok(())
}

/// Preview the blast radius of a service failing.
pub fn impact(analyzer: &TopologyAnalyzer, node: &str, json: bool) -> Result<()> {
    let analysis = analyzer.analyze_impact(node)?;
    if json {
        return print_json(&analysis);
    }

    let risk = analysis.risk_score.to_string();
    let risk = if analysis.risk_score >= 70 {
        risk.red().bold()
    } else if analysis.risk_score >= 40 {
        risk.yellow().bold()
    } else {
        risk.green().bold()
    };

    println!("{}", "⚠️  Blast Radius".yellow().bold());
    println!("Service: {}", analysis.node.cyan());
    println!("Risk:    {}/100", risk);
    println!(
        "Total:   {} services (direct: {}, indirect: {})",
        analysis.total_affected.to_string().bold(),
        analysis.direct_impact.len().to_string().red(),
        analysis.indirect_impact.len().to_string().yellow()
    );
    println!();

    if !analysis.direct_impact.is_empty() {
        println!("{}", "Direct (1 hop):".red());
        for id in analysis.direct_impact.iter().take(10) {
            println!("  • {}", id);
        }
        if analysis.direct_impact.len() > 10 {
            println!("  ... and {} more", analysis.direct_impact.len() - 10);
        }
        println!();
    }

    if !analysis.indirect_impact.is_empty() {
        println!("{}", "Indirect:".yellow());
        for affected in analysis
            .affected
            .iter()
            .filter(|a| a.hop_distance > 1)
            .take(10)
        {
            println!("  • {} {}", affected.id, format!("({} hops)", affected.hop_distance).dimmed());
        }
        if analysis.indirect_impact.len() > 10 {
            println!("  ... and {} more", analysis.indirect_impact.len() - 10);
        }
        println!();
    }

    if analysis.critical_path.len() > 1 {
        println!("Longest chain: {}", analysis.critical_path.join(" → "));
    }

    Ok(())
}

/// Detect circular dependencies.
pub fn cycles(analyzer: &TopologyAnalyzer, json: bool) -> Result<()> {
    let cycles = analyzer.detect_cycles();
    if json {
        return print_json(&cycles);
    }

    if cycles.is_empty() {
        println!("{} No circular dependencies", "✓".green());
        return Ok(());
    }

    println!(
        "{} {} circular dependency groups:\n",
        "⚠".yellow(),
        cycles.len()
    );
    for (i, group) in cycles.iter().enumerate() {
        println!("{}. {}", i + 1, group.join(", ").red());
    }

    Ok(())
}

/// Group services by depth from the entry points.
pub fn levels(analyzer: &TopologyAnalyzer, json: bool) -> Result<()> {
    let levels = analyzer.dependency_levels();
    if json {
        return print_json(&levels);
    }

    let placed: usize = levels.values().map(Vec::len).sum();
    for (depth, ids) in &levels {
        println!("{} {}", format!("Level {}:", depth).cyan(), ids.join(", "));
    }

    let unplaced = analyzer.graph().node_count() - placed;
    if unplaced > 0 {
        println!(
            "\n{} {} services unreachable from any entry point",
            "⚠".yellow(),
            unplaced
        );
    }

    Ok(())
}

/// Show the longest weighted dependency chain.
pub fn critical_path(analyzer: &TopologyAnalyzer, json: bool) -> Result<()> {
    let path = analyzer.find_critical_path()?;
    if json {
        return print_json(&path);
    }

    match &path {
        CriticalPath::Exact { nodes, length } if nodes.is_empty() => {
            println!("{} Empty topology (length {:.3})", "✗".red(), length);
        }
        CriticalPath::Exact { nodes, length } => {
            println!("{}", "Critical path".cyan().bold());
            println!("  {}", nodes.join(" → "));
            println!("  length {:.3}", length);
        }
        CriticalPath::ApproximateCentralityRanking { nodes } => {
            println!(
                "{} Topology has cycles; showing the most central services instead",
                "⚠".yellow()
            );
            for (i, id) in nodes.iter().enumerate() {
                println!("{}. {}", i + 1, id);
            }
        }
    }

    Ok(())
}

/// Rank services by betweenness centrality.
pub fn centrality(analyzer: &TopologyAnalyzer, limit: usize, json: bool) -> Result<()> {
    let scores = analyzer.centrality()?;
    let ranked: Vec<(&str, f64)> = scores.ranked().into_iter().take(limit).collect();
    if json {
        return print_json(&ranked);
    }

    if ranked.is_empty() {
        println!("No services.");
        return Ok(());
    }

    println!("{}", "Most central services:".cyan().bold());
    for (i, (id, score)) in ranked.iter().enumerate() {
        println!("{:>3}. {} {}", i + 1, id, format!("{:.4}", score).dimmed());
    }

    Ok(())
}

/// Full dependency report.
pub fn analyze(analyzer: &TopologyAnalyzer, json: bool) -> Result<()> {
    let analysis = analyzer.analyze_dependencies()?;
    if json {
        return print_json(&analysis);
    }

    println!("{}", "Dependency Report".cyan().bold());
    println!();

    if analysis.cycles.is_empty() {
        println!("{} No circular dependencies", "✓".green());
    } else {
        println!("{} Cycles:", "⚠".yellow());
        for group in &analysis.cycles {
            println!("  • {}", group.join(", ").red());
        }
    }
    println!();

    println!("{}", "Levels:".bold());
    for (depth, ids) in &analysis.levels {
        println!("  {} {}", format!("{}:", depth).cyan(), ids.join(", "));
    }
    println!();

    println!(
        "{} ({})",
        "Critical dependencies".bold(),
        analysis.critical_dependencies.len()
    );
    for dep in &analysis.critical_dependencies {
        let why = match dep.reason {
            CriticalReason::CriticalEndpoint => "critical service".to_string(),
            CriticalReason::HighCentrality { average } => format!("centrality {:.3}", average),
        };
        println!(
            "  • {} → {} {}",
            dep.source,
            dep.target,
            format!("[{}, {}]", dep.kind, why).dimmed()
        );
    }
    println!();

    println!("{} ({})", "Bottlenecks".bold(), analysis.bottlenecks.len());
    for bottleneck in &analysis.bottlenecks {
        println!(
            "  • {} {}",
            bottleneck.id.yellow(),
            format!("{:.4}", bottleneck.centrality).dimmed()
        );
    }

    Ok(())
}

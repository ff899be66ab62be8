//! Inspect and repair navigation graph revision files.
//!
//! Usage:
//!   navgraph validate floor-2.json
//!   navgraph hotspots floor-2.json --node 5d1c...
//!   navgraph route floor-2.json --from lobby --to lift-a --json
//!   RUST_LOG=venue_nav=debug navgraph recompute floor-2.json -o fixed.json

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use venue_nav::analysis;
use venue_nav::hotspot::build_hotspots;
use venue_nav::serialization;
use venue_nav::{GraphError, NavGraph, NodeId, PersistError, ViewerConfig};

#[derive(Parser)]
#[command(name = "navgraph")]
#[command(version = "0.1.0")]
#[command(about = "Inspect and repair navigation graph revisions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Viewer config JSON (proximity threshold, auto-rotate step, refresh delays)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the integrity checks and list errors and warnings
    Validate { file: PathBuf },

    /// Counts, lengths and connectivity
    Stats { file: PathBuf },

    /// Hotspots shown in a node's panorama
    Hotspots {
        file: PathBuf,
        #[arg(long, short = 'n')]
        node: String,
    },

    /// Shortest walkable route between two nodes
    Route {
        file: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Refresh connection distances from node positions
    Recompute {
        file: PathBuf,
        /// Where to write the result (default: overwrite input)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("could not encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "venue_nav=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli, &mut std::io::stdout().lock()) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "navgraph failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &mut impl Write) -> Result<ExitCode, CliError> {
    let config = match &cli.config {
        Some(path) => ViewerConfig::load_from_file(path)?,
        None => ViewerConfig::default(),
    };

    match cli.command {
        Commands::Validate { file } => {
            // broken files must still be readable to be reported on
            let graph = serialization::read_unchecked(&file)?;
            let report = graph.validate();
            if cli.json {
                let issues = |list: &[venue_nav::Issue]| {
                    list.iter().map(ToString::to_string).collect::<Vec<_>>()
                };
                print_json(out, &serde_json::json!({
                    "valid": report.is_valid(),
                    "errors": issues(&report.errors),
                    "warnings": issues(&report.warnings),
                }))?;
            } else {
                for issue in &report.errors {
                    writeln!(out, "error:   {}", issue)?;
                }
                for issue in &report.warnings {
                    writeln!(out, "warning: {}", issue)?;
                }
                writeln!(
                    out,
                    "{}: {} errors, {} warnings",
                    file.display(),
                    report.errors.len(),
                    report.warnings.len()
                )?;
            }
            Ok(if report.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Stats { file } => {
            let graph = serialization::load_from_file(&file)?;
            let stats = analysis::stats(&graph);
            if cli.json {
                print_json(out, &stats)?;
            } else {
                writeln!(out, "{} ({})", graph.name, graph.id)?;
                writeln!(out, "  nodes:            {}", stats.node_count)?;
                writeln!(
                    out,
                    "  connections:      {} ({} bidirectional)",
                    stats.connection_count, stats.bidirectional_count
                )?;
                writeln!(out, "  isolated nodes:   {}", stats.isolated_nodes)?;
                writeln!(out, "  no panorama:      {}", stats.nodes_without_panorama)?;
                writeln!(out, "  total length:     {:.2}", stats.total_distance)?;
                if let Some(mean) = stats.mean_distance {
                    writeln!(out, "  mean length:      {:.2}", mean)?;
                }
                writeln!(out, "  components:       {}", stats.components)?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Hotspots { file, node } => {
            let graph = serialization::load_from_file(&file)?;
            let node = existing(&graph, node)?;
            let hotspots = build_hotspots(&graph, &node, &config);
            if cli.json {
                print_json(out, &hotspots)?;
            } else {
                for h in &hotspots {
                    writeln!(
                        out,
                        "{:<24} yaw {:>7.2}  pitch {:>7.2}  dist {:>8.2}{}",
                        h.label,
                        h.yaw,
                        h.pitch,
                        h.distance,
                        if h.emphasized { "  ahead" } else { "" }
                    )?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Route { file, from, to } => {
            let graph = serialization::load_from_file(&file)?;
            let route = analysis::route(
                &graph,
                &NodeId::from(from),
                &NodeId::from(to),
            )?;
            match route {
                Some(route) if cli.json => print_json(out, &route)?,
                Some(route) => {
                    let names: Vec<String> = route
                        .nodes
                        .iter()
                        .map(|id| {
                            graph
                                .node(id)
                                .map_or_else(|| id.to_string(), |n| n.display_name())
                        })
                        .collect();
                    writeln!(out, "{}", names.join(" -> "))?;
                    writeln!(out, "distance: {:.2}", route.distance)?;
                }
                None => {
                    if cli.json {
                        print_json(out, &serde_json::Value::Null)?;
                    } else {
                        writeln!(out, "no route")?;
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Recompute { file, output } => {
            let mut graph = serialization::load_from_file(&file)?;
            let changed = graph.recompute_distances();
            let target = output.as_deref().unwrap_or(&file);
            serialization::save_to_file(&graph, target)?;
            writeln!(
                out,
                "{} distances updated, written to {}",
                changed,
                target.display()
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn existing(graph: &NavGraph, node: String) -> Result<NodeId, GraphError> {
    let id = NodeId::from(node);
    if graph.contains_node(&id) {
        Ok(id)
    } else {
        Err(GraphError::NotFound(id))
    }
}

fn print_json<T: Serialize>(
    out: &mut impl Write,
    value: &T,
) -> Result<(), CliError> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

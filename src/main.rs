//! sopgraph - inspect node types and cook saved graphs from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use sopgraph::file_manager::load_graph;
use sopgraph::{EngineConfig, NodeGraphEngine, NodeRegistry};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sopgraph", version, about = "Procedural geometry node graph")]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true, env = "SOPGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered node types
    Types {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the parameter descriptors of a node type
    Params {
        node_type: String,
    },
    /// Load a saved graph and cook one node
    Cook {
        file: PathBuf,
        /// Node to cook
        #[arg(long)]
        node: usize,
        /// Write the cooked geometry as JSON
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let registry = NodeRegistry::global();

    match cli.command {
        Command::Types { json } => {
            let catalog = registry.type_catalog();
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                for (category, types) in registry.categories() {
                    println!("{}", category);
                    for info in catalog.iter().filter(|info| types.contains(&info.type_id)) {
                        println!("  {:<10} {}", info.type_id.as_str(), info.description);
                    }
                }
            }
        }
        Command::Params { node_type } => {
            let descriptors = registry.parameter_catalog(&node_type)?;
            println!("{}", serde_json::to_string_pretty(&descriptors)?);
        }
        Command::Cook { file, node, dump } => {
            let config = EngineConfig::load(cli.config.as_deref())?;
            let graph = load_graph(&file, registry)
                .with_context(|| format!("loading {}", file.display()))?;
            let engine = NodeGraphEngine::with_config(config);

            let geometry = match engine.cook(&graph, node) {
                Ok(geometry) => geometry,
                Err(err) => {
                    warn!("Cook of node {} failed", node);
                    return Err(err.into());
                }
            };
            println!(
                "node {}: {} points, {} primitives",
                node,
                geometry.point_count(),
                geometry.primitive_count()
            );
            let stats = engine.cache_statistics();
            info!(
                "{} cooks, {} cache hits, {:.1?} total",
                stats.cooks, stats.cache_hits, stats.total_cook_time
            );

            if let Some(path) = dump {
                std::fs::write(&path, serde_json::to_string_pretty(geometry.as_ref())?)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Wrote geometry to {}", path.display());
            }
        }
    }
    Ok(())
}

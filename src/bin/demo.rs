//! Scripted demonstration of the engine across all four reclamation
//! algorithms. Not a REPL: the grammar described by the specification's
//! external-interfaces section belongs to a caller, not to this binary.

use std::fs::File;
use std::str::FromStr;

use clap::Parser;
use tracing::{info, Level};

use treebuffer::{init_logging, make_node, Algorithm, Tree, TreeBufferConfig};

/// Run a fixed demonstration sequence against one or all reclamation algorithms.
#[derive(Parser, Debug)]
#[command(name = "demo")]
struct Args {
    /// Which algorithm to demonstrate (naive, mark, amortized, real-time). Omit to run all four in turn.
    #[arg(long, env = "TREEBUFFER_ALGORITHM")]
    algorithm: Option<String>,

    /// Ancestor-history window size.
    #[arg(long, env = "TREEBUFFER_HISTORY", default_value_t = 3)]
    history: u32,

    /// Optional path to an append-only statistics file.
    #[arg(long, env = "TREEBUFFER_STATS_PATH")]
    stats_path: Option<std::path::PathBuf>,
}

fn run(config: &TreeBufferConfig) -> treebuffer::Result<()> {
    info!(algorithm = config.algorithm.as_str(), history = config.history, "starting demonstration");

    let (mut tree, root) = Tree::initialize(config.history, config.algorithm, make_node(0))?;
    if let Some(path) = &config.stats_path {
        let file = File::create(path).map_err(treebuffer::TreeBufferError::from)?;
        tree.start_stats(file)?;
    }

    // Grow a small forest: three generations of children under the root,
    // deactivating each generation before growing the next so that the
    // frontier always advances.
    let mut frontier = vec![root];
    for generation in 1..=4i64 {
        let mut next_frontier = Vec::new();
        for parent in frontier {
            let children = vec![make_node(generation * 10), make_node(generation * 10 + 1)];
            let ids = tree.expand(parent, children)?;
            next_frontier.extend(ids);
        }
        frontier = next_frontier;
        info!(generation, frontier_len = frontier.len(), "grew one generation");
    }

    let mut ancestry = Vec::new();
    if let Some(&first) = frontier.first() {
        tree.history(first, &mut ancestry)?;
        info!(?ancestry, mems = tree.last_op_mems(), "history of first frontier node");
    }

    info!(node_count = tree.node_count(), "disposing");
    tree.dispose()?;
    Ok(())
}

fn main() -> treebuffer::Result<()> {
    init_logging(Level::INFO);
    let args = Args::parse();

    let algorithms = match args.algorithm {
        Some(raw) => vec![Algorithm::from_str(&raw).map_err(treebuffer::TreeBufferError::from)?],
        None => vec![
            Algorithm::Naive,
            Algorithm::Mark,
            Algorithm::Amortized,
            Algorithm::RealTime,
        ],
    };

    for algorithm in algorithms {
        let mut config = TreeBufferConfig::new(args.history, algorithm)?;
        if let Some(path) = &args.stats_path {
            let per_algorithm = path.with_extension(format!("{}.stats", algorithm.as_str()));
            config = config.with_stats_path(per_algorithm);
        }
        run(&config)?;
    }

    Ok(())
}

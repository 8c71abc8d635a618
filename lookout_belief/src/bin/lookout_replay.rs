// Offline replay of a recorded observation stream.
//
// Loads a navigation graph and (optionally) a belief config, feeds every line
// of a JSON-lines observation log through `BeliefState::mark_observation_json`,
// and prints a JSON summary of the final belief to stdout. Useful for checking
// what the agent believed at the end of a recorded session without running
// the environment.
//
// Usage:
//   lookout_replay --graph <nav.json> --observations <obs.jsonl> [--config <belief.json>]
//
// Blank lines are skipped. A line that fails to parse, or a `null`
// observation, aborts the replay with a non-zero exit code.
//
// Log verbosity follows `RUST_LOG` (default `info`).

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use lookout_belief::{BeliefConfig, BeliefState};
use lookout_nav::NavGraph;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Args {
    graph: PathBuf,
    observations: PathBuf,
    config: Option<PathBuf>,
}

fn main() {
    init_tracing();
    let args = parse_args();

    match run(&args) {
        Ok(summary) => println!("{summary}"),
        Err(err) => {
            error!(error = %err, "replay_failed");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Parse command-line arguments. Plain `std::env::args()` matching.
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut graph = None;
    let mut observations = None;
    let mut config = None;
    let mut i = 1;

    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        let value = || {
            args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                eprintln!("{flag} requires a path");
                std::process::exit(1);
            })
        };
        match flag {
            "--graph" => graph = Some(value()),
            "--observations" => observations = Some(value()),
            "--config" => config = Some(value()),
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let (Some(graph), Some(observations)) = (graph, observations) else {
        print_usage();
        std::process::exit(1);
    };
    Args {
        graph,
        observations,
        config,
    }
}

fn print_usage() {
    eprintln!(
        "Usage: lookout_replay --graph <nav.json> --observations <obs.jsonl> [--config <belief.json>]"
    );
}

fn run(args: &Args) -> Result<serde_json::Value, String> {
    let graph_text = std::fs::read_to_string(&args.graph)
        .map_err(|e| format!("failed to read {}: {e}", args.graph.display()))?;
    let graph = NavGraph::from_json(&graph_text)
        .map_err(|e| format!("invalid graph {}: {e}", args.graph.display()))?;
    let config = match &args.config {
        Some(path) => BeliefConfig::load(path).map_err(|e| e.to_string())?,
        None => BeliefConfig::default(),
    };
    info!(
        nodes = graph.node_count(),
        graph = %args.graph.display(),
        "graph_loaded"
    );

    let mut belief = BeliefState::new(Arc::new(graph), config);
    let file = std::fs::File::open(&args.observations)
        .map_err(|e| format!("failed to open {}: {e}", args.observations.display()))?;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("read error at line {}: {e}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line)
            .map_err(|e| format!("line {}: {e}", line_no + 1))?;
        belief
            .mark_observation_json(&value)
            .map_err(|e| format!("line {}: {e}", line_no + 1))?;
    }

    info!(tick = ?belief.tick(), "replay_finished");
    Ok(summarize(&belief))
}

fn summarize(belief: &BeliefState) -> serde_json::Value {
    let doors: Vec<_> = belief
        .known_doors()
        .iter()
        .map(|door| {
            serde_json::json!({
                "id": door.id,
                "open": belief.is_open(&door.id),
                "age": belief.age(&door.id),
            })
        })
        .collect();
    serde_json::json!({
        "tick": belief.tick(),
        "entities": belief.known_entities().len(),
        "blockedNodes": belief.blocked_nodes(),
        "knownNodes": belief.nav().known_node_count(),
        "doors": doors,
    })
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! fas-generator: searches for small feedback arc sets and publishes them.
//!
//! Usage: `fas-generator 0-1 1-2 2-0`
//!
//! Attaches to a running fas-supervisor and loops until the supervisor
//! stops the search or SIGINT/SIGTERM arrives.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use fas::cli::{resource_names, CommonArgs};
use fas::config::FasConfig;
use fas::graph::{Graph, SearchEngine};
use fas::observability::debug_flags_help;
use fas::pipeline::Generator;
use fas::shm::install_signal_handlers;

/// Generator of feedback arc set candidates
#[derive(Parser, Debug)]
#[command(name = "fas-generator", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Graph edges as `u-v` tokens, e.g. `0-1 1-2 2-0`
    #[arg(required = true, value_name = "EDGE")]
    edges: Vec<String>,

    /// Seed the shuffle for a reproducible sequence of candidates
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let seed_override: Vec<(&str, String)> = args
        .seed
        .map(|seed| ("seed", seed.to_string()))
        .into_iter()
        .collect();
    let config = args.common.load_config(&seed_override)?;
    let _logging = args.common.init_logging(&config, "generator")?;

    if let Err(err) = run(&args.edges, &config) {
        error!(error = %format!("{err:#}"), "Generator failed");
        return Err(err);
    }
    Ok(())
}

fn run(edges: &[String], config: &FasConfig) -> Result<()> {
    let graph = Graph::parse(&edges.join(" ")).context("Invalid graph")?;
    info!(
        edges = graph.edge_count(),
        vertices = graph.vertex_count(),
        "Graph loaded"
    );

    let engine = match config.generator.seed {
        Some(seed) => SearchEngine::with_seed(graph, seed),
        None => SearchEngine::new(graph),
    };

    install_signal_handlers().context("Failed to install signal handlers")?;

    let names = resource_names(&config.ipc);
    let mut generator = Generator::attach(&names, engine).with_context(|| {
        format!(
            "Failed to attach to shared resources under {} (is fas-supervisor running?)",
            names.shared_memory
        )
    })?;
    generator.session_mut().bind_shutdown_signals();

    let outcome = generator.run().context("Generator loop failed")?;
    info!(
        iterations = outcome.iterations,
        published = outcome.published,
        best_edges = outcome.best_edge_count,
        "Generator done"
    );
    if !outcome.teardown.is_clean() {
        warn!(
            failures = outcome.teardown.failures.len(),
            "Some shared resources could not be released"
        );
    }
    Ok(())
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! fas-supervisor: owns the shared ring and reports the best solution.
//!
//! Creates the shared memory segment and the three semaphores, then consumes
//! candidates until a generator finds the graph acyclic or SIGINT/SIGTERM
//! arrives. All shared resources are removed before exit.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use fas::cli::{resource_names, CommonArgs};
use fas::config::FasConfig;
use fas::observability::debug_flags_help;
use fas::pipeline::{ConsoleReporter, Supervisor};
use fas::shm::install_signal_handlers;

/// Supervisor of the feedback arc set search
#[derive(Parser, Debug)]
#[command(name = "fas-supervisor", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.common.load_config(&[])?;
    let _logging = args.common.init_logging(&config, "supervisor")?;

    if let Err(err) = run(&config) {
        error!(error = %format!("{err:#}"), "Supervisor failed");
        return Err(err);
    }
    Ok(())
}

fn run(config: &FasConfig) -> Result<()> {
    // Before creating anything, so an early signal cannot leave names behind
    install_signal_handlers().context("Failed to install signal handlers")?;

    let names = resource_names(&config.ipc);
    let mut supervisor = Supervisor::create(&names).with_context(|| {
        format!(
            "Failed to create shared resources ({}, {}, {}, {})",
            names.shared_memory, names.free, names.used, names.mutual_exclusion
        )
    })?;
    supervisor.session_mut().bind_shutdown_signals();
    info!(shm = %names.shared_memory, "Supervisor ready, waiting for generators");

    let mut reporter = ConsoleReporter::stdout();
    let outcome = supervisor
        .run(&mut reporter)
        .context("Supervisor loop failed")?;

    info!(
        reason = ?outcome.reason,
        slots_consumed = outcome.slots_consumed,
        best_edges = outcome.best.map(|best| best.edge_count()),
        released = outcome.teardown.released,
        "Supervisor done"
    );
    if !outcome.teardown.is_clean() {
        warn!(
            failures = outcome.teardown.failures.len(),
            "Some shared resources could not be released"
        );
    }
    Ok(())
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # fas
//!
//! Randomized feedback arc set search spread over several processes.
//!
//! One `fas-supervisor` creates a shared-memory ring of candidate solutions
//! and keeps the smallest one it reads. Any number of `fas-generator`
//! processes attach to it, shuffle a topological order of the input graph
//! and publish the edges pointing backwards in that order. The search ends
//! when a generator finds an empty set (the graph is acyclic) or when the
//! supervisor receives `SIGINT`/`SIGTERM`.
//!
//! ```text
//! fas-generator 0-1 1-2 2-0 ──┐
//! fas-generator 0-1 1-2 2-0 ──┼──▶ [ ring of 20 slots ] ──▶ fas-supervisor
//! fas-generator 0-1 1-2 2-0 ──┘     free / used / mutualExclusion
//! ```
//!
//! The crates are re-exported under short names:
//!
//! ```rust
//! use fas::graph::{find_fb_arc_set, Graph, TopologicalOrder};
//!
//! let graph = Graph::parse("0-1 1-2 2-0").unwrap();
//! let order = TopologicalOrder::identity(graph.max_index());
//! let candidate = find_fb_arc_set(&graph, &order).unwrap();
//! assert_eq!(candidate.to_string(), "2-0");
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;

pub use fas_config as config;
pub use fas_graph as graph;
pub use fas_observability as observability;
pub use fas_pipeline as pipeline;
pub use fas_shm as shm;

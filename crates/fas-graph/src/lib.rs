// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # fas-graph
//!
//! Directed graph model and the randomized feedback arc set heuristic.
//!
//! A graph is read from `u-v` edge tokens. The search repeatedly draws a
//! uniformly random ordering of the vertices and collects the edges that
//! run against it; removing those edges leaves the graph acyclic.
//!
//! ```
//! use fas_graph::{find_fb_arc_set, Graph, TopologicalOrder};
//!
//! let graph = Graph::parse("0-1 1-2 2-0").unwrap();
//! let order = TopologicalOrder::identity(graph.max_index());
//! let candidate = find_fb_arc_set(&graph, &order).unwrap();
//! assert_eq!(candidate.edge_count(), 1);
//! ```

pub mod candidate;
pub mod graph;
pub mod order;
pub mod search;

pub use candidate::Candidate;
pub use graph::{Edge, Graph, GraphError, VertexId, MAX_VERTEX_ID};
pub use order::TopologicalOrder;
pub use search::{find_fb_arc_set, process_seed, SearchEngine};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound on the edges a single candidate carries.
///
/// Orderings that produce more out-of-order edges are truncated to this many;
/// the receiving side never sees a larger solution. A graph whose minimum
/// feedback arc set is larger than this cannot have it reported in full.
pub const MAX_FEEDBACK_EDGES: usize = 8;

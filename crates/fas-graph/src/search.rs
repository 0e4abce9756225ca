// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Randomized feedback arc set search.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::candidate::Candidate;
use crate::graph::{Edge, Graph};
use crate::order::TopologicalOrder;

/// Collect the edges of `graph` that point backwards in `order`.
///
/// An edge `u-v` is a feedback edge when `u` does not come before `v`.
/// Edges are scanned in ingestion order and the scan stops after
/// [`MAX_FEEDBACK_EDGES`](crate::MAX_FEEDBACK_EDGES) hits.
///
/// Returns `None` if `order` does not cover every vertex of `graph`.
pub fn find_fb_arc_set(graph: &Graph, order: &TopologicalOrder) -> Option<Candidate> {
    if order.len() < graph.vertex_count() {
        return None;
    }
    Some(collect_feedback_edges(graph.edges(), &order.positions()))
}

fn collect_feedback_edges(edges: &[Edge], positions: &[usize]) -> Candidate {
    let mut candidate = Candidate::empty();
    for edge in edges {
        if positions[edge.u as usize] >= positions[edge.v as usize] {
            candidate.push(*edge);
            if candidate.is_full() {
                break;
            }
        }
    }
    candidate
}

/// Seed derived from the process id and the wall clock, so concurrently
/// started generators draw different orderings.
pub fn process_seed() -> u64 {
    let pid = u64::from(std::process::id());
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    nanos ^ pid.rotate_left(32)
}

/// Owns a graph and a private random source; each call to
/// [`next_candidate`](Self::next_candidate) shuffles and scans once.
pub struct SearchEngine {
    graph: Graph,
    order: TopologicalOrder,
    positions: Vec<usize>,
    rng: StdRng,
    iterations: u64,
}

impl SearchEngine {
    /// Engine seeded from [`process_seed`].
    pub fn new(graph: Graph) -> Self {
        Self::with_seed(graph, process_seed())
    }

    /// Deterministic engine; the same seed yields the same candidate sequence.
    pub fn with_seed(graph: Graph, seed: u64) -> Self {
        debug!(
            seed,
            edges = graph.edge_count(),
            vertices = graph.vertex_count(),
            "Search engine ready"
        );
        let order = TopologicalOrder::identity(graph.max_index());
        Self {
            graph,
            order,
            positions: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            iterations: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Ordering used by the most recent search.
    pub fn order(&self) -> &TopologicalOrder {
        &self.order
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Shuffle the ordering and return its feedback edges.
    pub fn next_candidate(&mut self) -> Candidate {
        self.order.shuffle(&mut self.rng);
        self.order.fill_positions(&mut self.positions);
        self.iterations += 1;

        let candidate = collect_feedback_edges(self.graph.edges(), &self.positions);
        trace!(
            iteration = self.iterations,
            edges = candidate.edge_count(),
            "Candidate computed"
        );
        candidate
    }
}

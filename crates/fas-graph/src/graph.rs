// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Edge and graph types plus the `u-v` token parser.

use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use thiserror::Error;
use tracing::debug;

/// Vertex identifier. Vertices are `0..=max_index`.
pub type VertexId = u32;

/// Largest accepted vertex id.
///
/// The search keeps a dense ordering of `0..=max_index`, so ids above this
/// are rejected at ingestion instead of sizing that table from user input.
pub const MAX_VERTEX_ID: VertexId = (1 << 20) - 1;

/// Directed edge `u -> v`.
///
/// `#[repr(C)]` because edges are copied verbatim into shared memory slots.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Edge {
    pub u: VertexId,
    pub v: VertexId,
}

impl Edge {
    pub const fn new(u: VertexId, v: VertexId) -> Self {
        Self { u, v }
    }

    pub const fn is_self_loop(&self) -> bool {
        self.u == self.v
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.u, self.v)
    }
}

impl FromStr for Edge {
    type Err = GraphError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let malformed = || GraphError::MalformedEdge(token.to_string());
        let (u, v) = token.split_once('-').ok_or_else(malformed)?;
        if !is_vertex_literal(u) || !is_vertex_literal(v) {
            return Err(malformed());
        }
        let u = parse_vertex(u).ok_or_else(malformed)??;
        let v = parse_vertex(v).ok_or_else(malformed)??;

        let edge = Edge::new(u, v);
        if edge.is_self_loop() {
            return Err(GraphError::SelfLoop(edge));
        }
        Ok(edge)
    }
}

/// `None` if the literal does not fit in a `u64` at all.
fn parse_vertex(literal: &str) -> Option<Result<VertexId, GraphError>> {
    let id: u64 = literal.parse().ok()?;
    Some(check_vertex(id))
}

fn check_vertex(id: u64) -> Result<VertexId, GraphError> {
    if id > u64::from(MAX_VERTEX_ID) {
        return Err(GraphError::VertexOutOfRange(id));
    }
    Ok(id as VertexId)
}

/// Plain decimal digits only; `str::parse` alone would accept a leading `+`.
fn is_vertex_literal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Errors raised while ingesting a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("malformed edge '{0}': expected <u>-<v> with non-negative integer vertices")]
    MalformedEdge(String),

    #[error("invalid edge {0}: a vertex cannot be connected to itself")]
    SelfLoop(Edge),

    #[error("invalid edge {0}: edge is listed more than once")]
    DuplicateEdge(Edge),

    #[error("vertex {0} is out of range: ids must not exceed {max}", max = MAX_VERTEX_ID)]
    VertexOutOfRange(u64),
}

/// Directed graph without self-loops or duplicate edges.
///
/// Edges keep their ingestion order; the search reports feedback edges in
/// that same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    edges: Vec<Edge>,
    max_index: VertexId,
}

impl Graph {
    /// Parse whitespace-separated `u-v` tokens.
    pub fn parse(input: &str) -> Result<Self, GraphError> {
        Self::from_tokens(input.split_whitespace())
    }

    /// Parse one `u-v` token per item.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let edges = tokens
            .into_iter()
            .map(|token| token.as_ref().parse::<Edge>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_edges(edges)
    }

    /// Build a graph from already-typed edges, applying the same checks as
    /// the parser.
    pub fn from_edges<I>(edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = Edge>,
    {
        let mut seen = AHashSet::new();
        let mut graph = Graph::default();

        for edge in edges {
            if edge.is_self_loop() {
                return Err(GraphError::SelfLoop(edge));
            }
            check_vertex(u64::from(edge.u))?;
            check_vertex(u64::from(edge.v))?;
            if !seen.insert(edge) {
                return Err(GraphError::DuplicateEdge(edge));
            }
            graph.max_index = graph.max_index.max(edge.u).max(edge.v);
            graph.edges.push(edge);
        }

        debug!(
            edges = graph.edges.len(),
            max_index = graph.max_index,
            "Graph ingested"
        );
        Ok(graph)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Largest vertex id referenced by any edge, or 0 for an edgeless graph.
    pub fn max_index(&self) -> VertexId {
        self.max_index
    }

    /// Number of vertices in `0..=max_index`.
    pub fn vertex_count(&self) -> usize {
        self.max_index as usize + 1
    }
}

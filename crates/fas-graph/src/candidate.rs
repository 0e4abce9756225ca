// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::graph::Edge;
use crate::MAX_FEEDBACK_EDGES;

/// A candidate feedback arc set of at most [`MAX_FEEDBACK_EDGES`] edges.
///
/// Fixed-capacity so it can be copied into a ring slot without allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Candidate {
    edge_count: usize,
    edges: [Edge; MAX_FEEDBACK_EDGES],
}

impl Candidate {
    pub const fn empty() -> Self {
        Self {
            edge_count: 0,
            edges: [Edge::new(0, 0); MAX_FEEDBACK_EDGES],
        }
    }

    /// Copy `edges` into a candidate, or `None` if there are too many.
    pub fn from_edges(edges: &[Edge]) -> Option<Self> {
        if edges.len() > MAX_FEEDBACK_EDGES {
            return None;
        }
        let mut candidate = Self::empty();
        candidate.edges[..edges.len()].copy_from_slice(edges);
        candidate.edge_count = edges.len();
        Some(candidate)
    }

    /// Append an edge. Returns `false` once the candidate is full.
    pub fn push(&mut self, edge: Edge) -> bool {
        if self.is_full() {
            return false;
        }
        self.edges[self.edge_count] = edge;
        self.edge_count += 1;
        true
    }

    pub fn is_full(&self) -> bool {
        self.edge_count == MAX_FEEDBACK_EDGES
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges[..self.edge_count]
    }

    /// An empty candidate means the ordering was already topological.
    pub fn is_acyclic(&self) -> bool {
        self.edge_count == 0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, edge) in self.edges().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{edge}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut candidate = Candidate::empty();
        for i in 0..MAX_FEEDBACK_EDGES as u32 {
            assert!(candidate.push(Edge::new(i, i + 1)));
        }
        assert!(candidate.is_full());
        assert!(!candidate.push(Edge::new(100, 101)));
        assert_eq!(candidate.edge_count(), MAX_FEEDBACK_EDGES);
        assert_eq!(candidate.edges().last(), Some(&Edge::new(7, 8)));
    }

    #[test]
    fn test_from_edges_bounds() {
        let edges: Vec<Edge> = (0..9).map(|i| Edge::new(i, i + 1)).collect();
        assert!(Candidate::from_edges(&edges).is_none());
        let candidate = Candidate::from_edges(&edges[..3]).unwrap();
        assert_eq!(candidate.edges(), &edges[..3]);
    }

    #[test]
    fn test_display() {
        let candidate = Candidate::from_edges(&[Edge::new(4, 3), Edge::new(6, 0)]).unwrap();
        assert_eq!(candidate.to_string(), "4-3 6-0");
        assert!(Candidate::empty().is_acyclic());
        assert_eq!(Candidate::empty().to_string(), "");
    }
}

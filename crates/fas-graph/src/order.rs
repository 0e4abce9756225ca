// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use rand::Rng;

use crate::graph::VertexId;

/// A permutation of the vertices `0..=max_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder {
    vertices: Vec<VertexId>,
}

impl TopologicalOrder {
    /// `0, 1, ..., max_index`
    pub fn identity(max_index: VertexId) -> Self {
        Self {
            vertices: (0..=max_index).collect(),
        }
    }

    /// Wrap an explicit ordering. Returns `None` unless `vertices` is a
    /// permutation of `0..vertices.len()`.
    pub fn from_vertices(vertices: Vec<VertexId>) -> Option<Self> {
        let order = Self { vertices };
        order.is_permutation().then_some(order)
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// In-place Fisher-Yates shuffle. Every permutation is equally likely.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.vertices.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.vertices.swap(i, j);
        }
    }

    /// Inverse permutation: `positions[v]` is the index of `v` in the order.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = Vec::new();
        self.fill_positions(&mut positions);
        positions
    }

    /// Like [`positions`](Self::positions) but reuses `positions`.
    pub fn fill_positions(&self, positions: &mut Vec<usize>) {
        positions.clear();
        positions.resize(self.vertices.len(), 0);
        for (index, &vertex) in self.vertices.iter().enumerate() {
            positions[vertex as usize] = index;
        }
    }

    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.vertices.len()];
        for &vertex in &self.vertices {
            match seen.get_mut(vertex as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }
}

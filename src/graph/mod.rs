//! In-memory symmetric weighted graph keyed by dense token ids

pub mod loader;

use std::collections::HashSet;

/// Undirected weighted graph over non-negative integer node ids.
///
/// Node ids double as indices into the token vector matrix, so storage is a
/// set of flat arrays indexed by id. Absent ids cost one empty slot each.
/// Edges are inserted from both endpoints; the per-node membership set keeps
/// the adjacency lists duplicate-free, and the first insertion of an edge
/// fixes its weight.
pub struct Graph {
    present: Vec<bool>,
    labels: Vec<i32>,
    neighbor_sets: Vec<HashSet<i32>>,
    neighbors: Vec<Vec<i32>>,
    weights: Vec<Vec<f32>>,
    node_count: usize,
    edges_per_node: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::with_capacity(16, 10)
    }

    /// Pre-size for `nodes` id slots, reserving `edges_per_node` adjacency
    /// entries whenever a node first appears. Growth past `nodes` doubles.
    pub fn with_capacity(nodes: usize, edges_per_node: usize) -> Self {
        Self {
            present: vec![false; nodes],
            labels: vec![0; nodes],
            neighbor_sets: vec![HashSet::new(); nodes],
            neighbors: vec![Vec::new(); nodes],
            weights: vec![Vec::new(); nodes],
            node_count: 0,
            edges_per_node,
        }
    }

    /// Number of present nodes.
    pub fn size(&self) -> usize {
        self.node_count
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    fn ensure_capacity(&mut self, min_len: usize) {
        if min_len <= self.present.len() {
            return;
        }
        let new_len = min_len.max(self.present.len() * 2);
        self.present.resize(new_len, false);
        self.labels.resize(new_len, 0);
        self.neighbor_sets.resize(new_len, HashSet::new());
        self.neighbors.resize(new_len, Vec::new());
        self.weights.resize(new_len, Vec::new());
    }

    fn slot(&self, node: i32) -> Option<usize> {
        let i = usize::try_from(node).ok()?;
        (i < self.present.len() && self.present[i]).then_some(i)
    }

    pub fn add_node(&mut self, node: i32) {
        debug_assert!(node >= 0, "node ids are non-negative");
        let i = node as usize;
        self.ensure_capacity(i + 1);
        if !self.present[i] {
            self.present[i] = true;
            self.node_count += 1;
            self.neighbor_sets[i] = HashSet::with_capacity(self.edges_per_node);
            self.neighbors[i] = Vec::with_capacity(self.edges_per_node);
            self.weights[i] = Vec::with_capacity(self.edges_per_node);
        }
    }

    pub fn has_node(&self, node: i32) -> bool {
        self.slot(node).is_some()
    }

    /// Present node ids in ascending order.
    pub fn nodes(&self) -> Vec<i32> {
        let mut all = Vec::with_capacity(self.node_count);
        for (i, &present) in self.present.iter().enumerate() {
            if present {
                all.push(i as i32);
            }
        }
        all
    }

    /// Insert an undirected edge. Self-loops are ignored, and re-inserting an
    /// existing edge leaves the stored weight untouched.
    pub fn add_edge(&mut self, from: i32, to: i32, weight: f32) {
        if from == to {
            return;
        }
        self.add_node(from);
        self.add_node(to);
        let (f, t) = (from as usize, to as usize);
        if self.neighbor_sets[f].insert(to) {
            self.neighbors[f].push(to);
            self.weights[f].push(weight);
        }
        if self.neighbor_sets[t].insert(from) {
            self.neighbors[t].push(from);
            self.weights[t].push(weight);
        }
    }

    pub fn has_edge(&self, from: i32, to: i32) -> bool {
        self.slot(from)
            .map(|i| self.neighbor_sets[i].contains(&to))
            .unwrap_or(false)
    }

    /// Neighbor ids of `node`, in adjacency order; empty for absent nodes.
    pub fn neighbors(&self, node: i32) -> &[i32] {
        match self.slot(node) {
            Some(i) => &self.neighbors[i],
            None => &[],
        }
    }

    /// `(neighbor, weight)` pairs of `node`, in adjacency order.
    pub fn edges(&self, node: i32) -> impl Iterator<Item = (i32, f32)> + '_ {
        let (nbrs, wts): (&[i32], &[f32]) = match self.slot(node) {
            Some(i) => (&self.neighbors[i], &self.weights[i]),
            None => (&[], &[]),
        };
        nbrs.iter().copied().zip(wts.iter().copied())
    }

    /// Weight of edge `(from, to)`; 0 when the edge is absent.
    pub fn edge_weight(&self, from: i32, to: i32) -> f32 {
        let Some(i) = self.slot(from) else {
            return 0.0;
        };
        for (j, &neighbor) in self.neighbors[i].iter().enumerate() {
            if neighbor == to {
                return self.weights[i][j];
            }
        }
        0.0
    }

    /// Reorder every adjacency list, in tandem with its weights, ascending by
    /// weight. The strongest neighbors end up at the tail.
    pub fn sort_edges(&mut self) {
        for i in 0..self.present.len() {
            if !self.present[i] || self.neighbors[i].len() < 2 {
                continue;
            }
            let mut pairs: Vec<(i32, f32)> = self.neighbors[i]
                .iter()
                .copied()
                .zip(self.weights[i].iter().copied())
                .collect();
            pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
            for (j, (neighbor, weight)) in pairs.into_iter().enumerate() {
                self.neighbors[i][j] = neighbor;
                self.weights[i][j] = weight;
            }
        }
    }

    /// Propagation label of `node`; 0 until assigned.
    pub fn label(&self, node: i32) -> i32 {
        self.slot(node).map(|i| self.labels[i]).unwrap_or(0)
    }

    pub fn set_label(&mut self, node: i32, label: i32) {
        if let Some(i) = self.slot(node) {
            self.labels[i] = label;
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

//! Chinese Whispers label propagation over per-token ego networks

use std::collections::{HashMap, HashSet};

use rand::prelude::*;

use crate::config::WhispersConfig;
use crate::graph::Graph;

use super::Cluster;

/// No class can win a round on a weight sum at or below this floor, so edge
/// weights must stay above it. Cosine weights live in [-1, 1].
const WEIGHT_FLOOR: f32 = -10000.0;

/// Induce the senses of one token: build its ego network, propagate labels,
/// and collect the label groups that meet the minimum cluster size.
pub fn induce_token(
    graph: &Graph,
    node: i32,
    config: &WhispersConfig,
    rng: &mut dyn RngCore,
) -> Vec<Cluster> {
    let mut ego = token_ego_graph(graph, node, config.max_edges, config.max_connectivity);
    propagate(&mut ego, config.max_iterations, rng);
    extract_clusters(graph, &ego, node, config.min_cluster)
}

/// Build the ego network of `node`: the subgraph induced by its first
/// `max_edges` neighbors, where each of those neighbors contributes at most
/// its first `max_connectivity` adjacency entries.
///
/// The base token itself stays outside its own ego network, and neighbors
/// with no surviving connection to the rest do not appear at all.
pub fn token_ego_graph(
    graph: &Graph,
    node: i32,
    max_edges: usize,
    max_connectivity: usize,
) -> Graph {
    let neighbors = graph.neighbors(node);
    let nearest = &neighbors[..neighbors.len().min(max_edges)];
    let selected: HashSet<i32> = nearest.iter().copied().collect();

    let mut ego = Graph::new();
    for &neighbor in nearest {
        for (other, weight) in graph.edges(neighbor).take(max_connectivity) {
            if other != node && selected.contains(&other) {
                ego.add_edge(neighbor, other, weight);
            }
        }
    }
    ego
}

/// Run label propagation to a fixpoint or `max_iterations` sweeps.
///
/// Every node starts in its own class, numbered from 1 (0 is the "no winning
/// class" value). Each sweep visits the nodes in a fresh random order; a node
/// adopts the class with the largest incident weight sum, ties going to the
/// first maximal class reached in the per-sweep accumulation map.
pub fn propagate(ego: &mut Graph, max_iterations: usize, rng: &mut dyn RngCore) {
    let mut nodes = ego.nodes();
    for (i, &node) in nodes.iter().enumerate() {
        ego.set_label(node, i as i32 + 1);
    }

    for _ in 0..max_iterations {
        let mut changed = false;
        nodes.shuffle(rng);
        for &node in &nodes {
            let mut class_weights: HashMap<i32, f32> = HashMap::new();
            for (neighbor, weight) in ego.edges(node) {
                *class_weights.entry(ego.label(neighbor)).or_insert(0.0) += weight;
            }

            let mut max = WEIGHT_FLOOR;
            let mut winner = 0;
            for (&class, &sum) in &class_weights {
                if sum > max {
                    max = sum;
                    winner = class;
                }
            }

            if ego.label(node) != winner {
                ego.set_label(node, winner);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Partition the ego network by final label and keep the groups of at least
/// `min_cluster` members. Member weights are looked up in the full graph
/// (similarity to the base token), not in the ego network. Kept clusters get
/// sense ids 1, 2, ... in extraction order; dropped groups consume no id.
pub fn extract_clusters(
    graph: &Graph,
    ego: &Graph,
    base_node: i32,
    min_cluster: usize,
) -> Vec<Cluster> {
    let base_weights: HashMap<i32, f32> = graph.edges(base_node).collect();

    let mut remaining = ego.nodes();
    let mut clusters = Vec::new();
    let mut sense = 0;
    while !remaining.is_empty() {
        let class = ego.label(remaining[0]);
        let mut members = Vec::new();
        remaining.retain(|&node| {
            if ego.label(node) == class {
                let weight = base_weights.get(&node).copied().unwrap_or(0.0);
                members.push((node, weight));
                false
            } else {
                true
            }
        });

        if members.len() >= min_cluster {
            sense += 1;
            clusters.push(Cluster {
                base_node,
                sense_id: sense,
                members,
            });
        }
    }
    clusters
}

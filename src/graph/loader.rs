//! Similarity-graph file loading

use std::fs::File;
use std::io::{BufReader, Read};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::io::LeReader;

use super::Graph;

// Sized for a full vocabulary export; anything larger grows geometrically.
const INITIAL_NODES: usize = 200_000;
const INITIAL_EDGES_PER_NODE: usize = 220;

/// Load a similarity graph from a binary edge file.
///
/// The file is a headerless concatenation of `(from, to, weight)` triples in
/// little-endian order. Every triple is inserted from both endpoints, so the
/// loaded graph is symmetric even though the stream is directed: a token's
/// neighborhood is its own top-n united with the tokens that picked it.
pub fn load_graph(path: &str) -> Result<Graph> {
    let file = File::open(path).with_context(|| format!("opening graph file {path}"))?;
    read_graph(BufReader::new(file))
}

/// Stream edge triples out of `source` until EOF, then sort each adjacency
/// list ascending by weight.
pub fn read_graph(source: impl Read) -> Result<Graph> {
    let mut reader = LeReader::new(source);
    let mut graph = Graph::with_capacity(INITIAL_NODES, INITIAL_EDGES_PER_NODE);

    let started = Instant::now();
    let mut triples = 0u64;
    while let Some(from) = reader.try_read_i32()? {
        let to = reader.read_i32()?;
        let weight = reader.read_f32()?;
        graph.add_edge(from, to, weight);
        triples += 1;
    }
    log::info!(
        "loaded {} nodes from {} edge triples in {:.1}s",
        graph.size(),
        triples,
        started.elapsed().as_secs_f32()
    );

    let started = Instant::now();
    graph.sort_edges();
    log::info!(
        "sorted adjacency lists in {:.1}s",
        started.elapsed().as_secs_f32()
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::LeWriter;
    use std::io::Cursor;

    fn edge_bytes(triples: &[(i32, i32, f32)]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut w = LeWriter::new(&mut buf);
        for &(from, to, weight) in triples {
            w.write_i32(from).unwrap();
            w.write_i32(to).unwrap();
            w.write_f32(weight).unwrap();
        }
        buf
    }

    #[test]
    fn directed_triples_load_symmetric() {
        let bytes = edge_bytes(&[(0, 1, 0.9), (1, 2, 0.4), (2, 0, 0.7)]);
        let g = read_graph(Cursor::new(bytes)).unwrap();

        assert_eq!(g.size(), 3);
        for &(u, v) in &[(0, 1), (1, 2), (2, 0)] {
            assert!(g.has_edge(u, v));
            assert!(g.has_edge(v, u));
            assert_eq!(g.edge_weight(u, v), g.edge_weight(v, u));
        }
    }

    #[test]
    fn adjacency_is_sorted_after_load() {
        let bytes = edge_bytes(&[(0, 1, 0.9), (0, 2, 0.2), (0, 3, 0.5)]);
        let g = read_graph(Cursor::new(bytes)).unwrap();

        let weights: Vec<f32> = g.edges(0).map(|(_, w)| w).collect();
        assert_eq!(weights, vec![0.2, 0.5, 0.9]);
    }

    #[test]
    fn round_trip_preserves_the_edge_set() {
        let triples = [(0, 1, 0.5f32), (1, 2, 0.8), (3, 0, 0.1), (2, 3, 0.6)];
        let g = read_graph(Cursor::new(edge_bytes(&triples))).unwrap();

        assert_eq!(g.edge_count(), triples.len());
        for &(u, v, w) in &triples {
            assert_eq!(g.edge_weight(u, v), w);
            assert_eq!(g.edge_weight(v, u), w);
        }
    }

    #[test]
    fn duplicate_triples_keep_the_first_weight() {
        let bytes = edge_bytes(&[(0, 1, 0.5), (1, 0, 0.9)]);
        let g = read_graph(Cursor::new(bytes)).unwrap();

        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge_weight(0, 1), 0.5);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let mut bytes = edge_bytes(&[(0, 1, 0.5)]);
        bytes.truncate(10);
        assert!(read_graph(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn empty_stream_loads_an_empty_graph() {
        let g = read_graph(Cursor::new(Vec::new())).unwrap();
        assert_eq!(g.size(), 0);
    }
}

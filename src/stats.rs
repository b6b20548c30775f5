//! Run summary persistence

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use serde_json::{json, to_string_pretty};

use crate::cluster::pipeline::RunTotals;
use crate::config::WhispersConfig;
use crate::graph::Graph;

/// Write a JSON summary of a clustering run.
pub fn save_summary(
    path: &str,
    graph: &Graph,
    config: &WhispersConfig,
    totals: &RunTotals,
) -> Result<()> {
    log::info!("saving run summary to {path}");

    let avg_degree = if graph.size() == 0 {
        0.0
    } else {
        2.0 * graph.edge_count() as f64 / graph.size() as f64
    };
    let summary = json!({
        "graph": {
            "node_count": graph.size(),
            "edge_count": graph.edge_count(),
            "avg_degree": avg_degree,
        },
        "params": config,
        "clusters": {
            "total": totals.clusters,
            "clustered_tokens": totals.nodes,
            "elapsed_secs": totals.elapsed_secs,
        },
    });

    let mut file = File::create(path).with_context(|| format!("creating summary file {path}"))?;
    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_valid_json() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1, 0.5);
        let totals = RunTotals {
            nodes: 2,
            clusters: 0,
            elapsed_secs: 0.1,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        save_summary(
            path.to_str().unwrap(),
            &graph,
            &WhispersConfig::default(),
            &totals,
        )
        .unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["graph"]["node_count"], 2);
        assert_eq!(parsed["params"]["min_cluster"], 5);
        assert_eq!(parsed["clusters"]["total"], 0);
    }
}

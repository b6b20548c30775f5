//! Default parameters for graph export and sense clustering

use serde::Serialize;

/// Parameters for the similarity graph export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportConfig {
    /// Nearest neighbors kept per token
    pub neighbors: usize,

    /// Tokens per similarity batch (one GEMM each)
    pub batch_size: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            neighbors: 200,
            batch_size: 500,
        }
    }
}

/// Parameters for Chinese Whispers sense induction.
#[derive(Debug, Clone, Serialize)]
pub struct WhispersConfig {
    /// Neighbors considered when building a token's ego network
    pub max_edges: usize,

    /// Adjacency entries each neighbor contributes to an ego network
    pub max_connectivity: usize,

    /// Label propagation sweeps per token before giving up on convergence
    pub max_iterations: usize,

    /// Minimum members for a cluster to be kept
    pub min_cluster: usize,

    /// Fixed RNG seed for reproducible partitions; fresh entropy when unset
    pub seed: Option<u64>,
}

impl Default for WhispersConfig {
    fn default() -> Self {
        Self {
            max_edges: 200,
            max_connectivity: 200,
            max_iterations: 100,
            min_cluster: 5,
            seed: None,
        }
    }
}

//! Sense clustering module

pub mod pipeline;
pub mod whispers;

use serde::Serialize;

/// Queue marker: a cluster carrying this base node tells the writer that the
/// workers are done.
pub const END_OF_STREAM: i32 = -1;

/// One induced sense of a base token.
///
/// `members` holds `(node, weight)` pairs where the weight is the similarity
/// between the member and the base token in the full graph.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub base_node: i32,
    pub sense_id: i32,
    pub members: Vec<(i32, f32)>,
}

impl Cluster {
    pub fn sentinel() -> Self {
        Self {
            base_node: END_OF_STREAM,
            sense_id: END_OF_STREAM,
            members: Vec::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.base_node == END_OF_STREAM
    }
}

//! Graph error type.

use thiserror::Error;

/// Errors produced by `tn-graph`.  Vertices are reported by their `Debug`
/// rendering since the graph is generic over the vertex type.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("vertex {0} not found in graph")]
    VertexNotFound(String),

    #[error("vertex {0} already exists")]
    DuplicateVertex(String),

    #[error("an edge between {0} and {1} already exists")]
    DuplicateEdge(String, String),
}

pub type GraphResult<T> = Result<T, GraphError>;

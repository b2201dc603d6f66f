//! `tn-graph` — the city's walking and driving graphs, and path search.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                 |
//! |------------|----------------------------------------------------------|
//! | [`graph`]  | `TransitGraph`, `Weighted`, `UndirectedEdge`             |
//! | [`search`] | `SearchGraph` trait, `shortest_path`                     |
//! | [`error`]  | `GraphError`, `GraphResult<T>`                           |
//!
//! `shortest_path` is generic over [`SearchGraph`] so the same routine runs
//! over a static `TransitGraph` and over the implicit planning graph that
//! `tn-sim` derives from live bus positions.

pub mod error;
pub mod graph;
pub mod search;


pub use error::{GraphError, GraphResult};
pub use graph::{TransitGraph, UndirectedEdge, Weighted};
pub use search::{shortest_path, SearchGraph};

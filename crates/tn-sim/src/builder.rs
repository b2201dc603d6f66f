//! Builder for constructing a [`City`].

use rustc_hash::FxHashMap;

use tn_core::{CityConfig, VertexId};
use tn_graph::{TransitGraph, UndirectedEdge, Weighted};

use crate::vertex::Vertex;
use crate::{City, SimError, SimResult};

/// Collects vertices and edges, then validates everything at once in
/// [`build`](Self::build).
///
/// Walking and driving share one vertex set; an edge may exist in either
/// graph, both, or neither.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = CityBuilder::new(CityConfig::default());
/// let a = builder.vertex("Market");
/// let b = builder.vertex("Harbour");
/// builder.add_drive_edge(a, b, UndirectedEdge::new(4.0));
/// builder.add_walk_edge(a, b, UndirectedEdge::new(15.0));
/// let mut city = builder.build()?;
/// ```
#[derive(Default)]
pub struct CityBuilder {
    config:      CityConfig,
    names:       Vec<String>,
    by_name:     FxHashMap<String, VertexId>,
    walk_edges:  Vec<(VertexId, VertexId, UndirectedEdge)>,
    drive_edges: Vec<(VertexId, VertexId, UndirectedEdge)>,
}

impl CityBuilder {
    pub fn new(config: CityConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Replace the configuration.
    pub fn config(mut self, config: CityConfig) -> Self {
        self.config = config;
        self
    }

    /// The vertex called `name`, created on first use.
    pub fn vertex(&mut self, name: &str) -> VertexId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = VertexId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.by_name.insert(name.to_owned(), id);
        id
    }

    pub fn add_walk_edge(&mut self, a: VertexId, b: VertexId, edge: UndirectedEdge) -> &mut Self {
        self.walk_edges.push((a, b, edge));
        self
    }

    pub fn add_drive_edge(&mut self, a: VertexId, b: VertexId, edge: UndirectedEdge) -> &mut Self {
        self.drive_edges.push((a, b, edge));
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.names.len()
    }

    /// Validate inputs and return a city with no routes, buses or
    /// passengers, at time zero.
    pub fn build(self) -> SimResult<City> {
        self.config.validate()?;

        let mut walk = TransitGraph::new();
        let mut drive = TransitGraph::new();
        for i in 0..self.names.len() {
            walk.add_vertex(VertexId(i as u32))?;
            drive.add_vertex(VertexId(i as u32))?;
        }

        for (graph, edges, what) in [
            (&mut walk, &self.walk_edges, "walk edge weight"),
            (&mut drive, &self.drive_edges, "drive edge weight"),
        ] {
            for &(a, b, edge) in edges {
                for vertex in [a, b] {
                    if vertex.index() >= self.names.len() {
                        return Err(SimError::VertexNotFound(vertex));
                    }
                }
                for value in [edge.weight(), edge.reverse().weight()] {
                    if !(value.is_finite() && value > 0.0) {
                        return Err(SimError::InvalidDuration { what, value });
                    }
                }
                graph.add_edge(&a, edge, &b)?;
            }
        }

        let vertices = self.names.into_iter().map(Vertex::new).collect();
        Ok(City::new(self.config, vertices, walk, drive))
    }
}

//! A small undirected graph stored as an adjacency matrix.
//!
//! City graphs have tens of vertices, so the O(V²) matrix is cheap and makes
//! `edge(a, b)` a pair of index lookups.  Each undirected edge occupies two
//! cells: `[a][b]` holds the edge as given and `[b][a]` holds
//! `edge.reverse()`.  The cells are independent values, so an asymmetric
//! edge can carry a different weight in each direction.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::{GraphError, GraphResult};

// ── Edges ─────────────────────────────────────────────────────────────────────

/// An edge with a traversal cost.
pub trait Weighted: Clone {
    fn weight(&self) -> f64;

    /// The edge as seen from its other endpoint.
    fn reverse(&self) -> Self {
        self.clone()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UndirectedEdge {
    weight:         f64,
    reverse_weight: Option<f64>,
}

impl UndirectedEdge {
    /// Same weight in both directions.
    pub fn new(weight: f64) -> Self {
        Self { weight, reverse_weight: None }
    }

    /// `weight` forwards, `reverse_weight` when traversed backwards.
    pub fn asymmetric(weight: f64, reverse_weight: f64) -> Self {
        Self { weight, reverse_weight: Some(reverse_weight) }
    }
}

impl Weighted for UndirectedEdge {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn reverse(&self) -> Self {
        match self.reverse_weight {
            Some(back) => Self::asymmetric(back, self.weight),
            None => *self,
        }
    }
}

// ── TransitGraph ──────────────────────────────────────────────────────────────

pub struct TransitGraph<V, E> {
    vertices: Vec<V>,
    index:    FxHashMap<V, usize>,
    matrix:   Vec<Vec<Option<E>>>,
}

impl<V, E> Default for TransitGraph<V, E> {
    fn default() -> Self {
        Self { vertices: Vec::new(), index: FxHashMap::default(), matrix: Vec::new() }
    }
}

impl<V, E> TransitGraph<V, E>
where
    V: Eq + Hash + Clone + Debug,
    E: Weighted,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: V) -> GraphResult<()> {
        if self.index.contains_key(&vertex) {
            return Err(GraphError::DuplicateVertex(format!("{vertex:?}")));
        }
        self.index.insert(vertex.clone(), self.vertices.len());
        self.vertices.push(vertex);
        for row in &mut self.matrix {
            row.push(None);
        }
        self.matrix.push(vec![None; self.vertices.len()]);
        Ok(())
    }

    /// Connect `a` and `b`.  A self edge is accepted and ignored.
    pub fn add_edge(&mut self, a: &V, edge: E, b: &V) -> GraphResult<()> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        if i == j {
            return Ok(());
        }
        if self.matrix[i][j].is_some() {
            return Err(GraphError::DuplicateEdge(format!("{a:?}"), format!("{b:?}")));
        }
        self.matrix[j][i] = Some(edge.reverse());
        self.matrix[i][j] = Some(edge);
        Ok(())
    }

    /// Vertices adjacent to `vertex`, most recently added first.
    ///
    /// An unknown vertex has no neighbors.
    pub fn neighbors(&self, vertex: &V) -> Vec<V> {
        let Some(&i) = self.index.get(vertex) else {
            return Vec::new();
        };
        let row = &self.matrix[i];
        (0..self.vertices.len())
            .rev()
            .filter(|&j| row[j].is_some())
            .map(|j| self.vertices[j].clone())
            .collect()
    }

    /// The edge from `a` to `b`, oriented as seen from `a`.
    pub fn edge(&self, a: &V, b: &V) -> Option<&E> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        self.matrix[i][j].as_ref()
    }

    pub fn contains(&self, vertex: &V) -> bool {
        self.index.contains_key(vertex)
    }

    /// All vertices in insertion order.
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn index_of(&self, vertex: &V) -> GraphResult<usize> {
        self.index
            .get(vertex)
            .copied()
            .ok_or_else(|| GraphError::VertexNotFound(format!("{vertex:?}")))
    }
}

//! Frontier search over any [`SearchGraph`].
//!
//! # Semantics
//!
//! The frontier is a [`PriorityQueue`] ordered by best-known distance from
//! the origin.  A vertex's distance and parent are fixed the first time it
//! is discovered; later, cheaper discoveries do not relax it.  The search
//! therefore prefers paths with few hops among near-equal alternatives.  In
//! the planning graph, where a vertex's weight is the difference of absolute
//! ETAs, every path to a vertex has the same length and the rule costs
//! nothing.
//!
//! `projection` maps vertices to a key for the visited set: once a vertex is
//! expanded, every vertex sharing its projection is excluded from discovery.
//! Planning uses this to treat "stop X by any route" as visited once the
//! earliest appointment at X has been expanded.

use std::cell::RefCell;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};
use tn_schedule::PriorityQueue;

use crate::{TransitGraph, Weighted};

/// The minimal view of a graph that [`shortest_path`] needs.
pub trait SearchGraph {
    type Vertex: Clone + Eq + Hash;

    fn neighbors(&self, vertex: &Self::Vertex) -> Vec<Self::Vertex>;

    fn weight(&self, from: &Self::Vertex, to: &Self::Vertex) -> f64;
}

impl<V, E> SearchGraph for TransitGraph<V, E>
where
    V: Eq + Hash + Clone + std::fmt::Debug,
    E: Weighted,
{
    type Vertex = V;

    fn neighbors(&self, vertex: &V) -> Vec<V> {
        TransitGraph::neighbors(self, vertex)
    }

    fn weight(&self, from: &V, to: &V) -> f64 {
        self.edge(from, to).map_or(f64::INFINITY, Weighted::weight)
    }
}

/// Path from `origin` to the first dequeued vertex satisfying
/// `is_destination`, both ends included.  `None` if the reachable graph has
/// no such vertex.
pub fn shortest_path<G, K>(
    graph: &G,
    origin: G::Vertex,
    mut is_destination: impl FnMut(&G::Vertex) -> bool,
    projection: impl Fn(&G::Vertex) -> K,
) -> Option<Vec<G::Vertex>>
where
    G: SearchGraph,
    K: Eq + Hash,
{
    let distance: RefCell<FxHashMap<G::Vertex, f64>> =
        RefCell::new(FxHashMap::from_iter([(origin.clone(), 0.0)]));
    let mut parent: FxHashMap<G::Vertex, G::Vertex> = FxHashMap::default();
    let mut visited: FxHashSet<K> = FxHashSet::from_iter([projection(&origin)]);
    let mut queued: FxHashSet<G::Vertex> = FxHashSet::from_iter([origin.clone()]);

    let mut frontier = PriorityQueue::new(|v: &G::Vertex| {
        distance.borrow().get(v).copied().unwrap_or(f64::INFINITY)
    });
    frontier.enqueue(origin);

    let destination = loop {
        let current = frontier.dequeue()?;
        if is_destination(&current) {
            break current;
        }
        visited.insert(projection(&current));
        let base = distance.borrow().get(&current).copied().unwrap_or(f64::INFINITY);
        for neighbor in graph.neighbors(&current) {
            if visited.contains(&projection(&neighbor)) || !queued.insert(neighbor.clone()) {
                continue;
            }
            let cost = base + graph.weight(&current, &neighbor);
            distance.borrow_mut().insert(neighbor.clone(), cost);
            parent.insert(neighbor.clone(), current.clone());
            frontier.enqueue(neighbor);
        }
    };

    let mut path = vec![destination];
    while let Some(previous) = path.last().and_then(|v| parent.get(v)) {
        path.push(previous.clone());
    }
    path.reverse();
    Some(path)
}

//! Trip planning over live bus positions.
//!
//! The planning graph is implicit: its vertices are *appointments*
//! ("be at stop V at ETA E, having arrived by route R or on foot") and its
//! edges are generated on demand from the current state of every route.
//! [`tn_graph::shortest_path`] explores it with the physical vertex as the
//! visited-set projection, so the first appointment expanded at a stop
//! claims that stop.
//!
//! All ETAs are relative to the moment of planning.

use ordered_float::OrderedFloat;
use rustc_hash::FxHashSet;

use tn_core::{RouteId, VertexId};
use tn_graph::{SearchGraph, Weighted};

use crate::City;

/// One step of a passenger's plan.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlanningVertex {
    /// Route ridden to get here; `None` for walking.
    pub route:     Option<RouteId>,
    pub vertex:    VertexId,
    pub eta:       OrderedFloat<f64>,
    /// Set only on the search origin, which may board its own route.
    pub is_origin: bool,
}

impl PlanningVertex {
    pub fn new(route: Option<RouteId>, vertex: VertexId, eta: f64) -> Self {
        debug_assert!(eta.is_finite(), "planning to reach {vertex} at non-finite eta {eta}");
        Self { route, vertex, eta: OrderedFloat(eta), is_origin: false }
    }

    pub fn origin(route: Option<RouteId>, vertex: VertexId, eta: f64) -> Self {
        Self { is_origin: true, ..Self::new(route, vertex, eta) }
    }

    #[inline]
    pub fn eta(&self) -> f64 {
        self.eta.0
    }
}

/// Read-only planning view of a city.
pub struct PlanningGraph<'a> {
    city: &'a City,
}

impl<'a> PlanningGraph<'a> {
    pub fn new(city: &'a City) -> Self {
        Self { city }
    }

    /// Every stop after `from` on the next run of `route` that reaches
    /// `from` no earlier than `min_eta`, with cumulative ETAs.
    fn ride(&self, route: RouteId, from: VertexId, min_eta: f64, out: &mut Vec<PlanningVertex>) {
        let Some((_, appointment)) = self.city.next_arrival(route, from, min_eta) else {
            return;
        };
        let Some(r) = self.city.route(route) else { return };
        let Some(first) = r.arc_from(from) else { return };
        let drive = self.city.drive_graph();

        let mut eta = appointment + r.arc_weight(first, drive);
        let mut seen = FxHashSet::from_iter([first]);
        let mut cursor = r.next(first);
        while let Some(arc) = cursor {
            if !seen.insert(arc) {
                break;
            }
            let Some(stop) = r.arc(arc).map(|a| a.origin()) else { break };
            out.push(PlanningVertex::new(Some(route), stop, eta));
            eta += r.arc_weight(arc, drive);
            cursor = r.next(arc);
        }
    }
}

impl SearchGraph for PlanningGraph<'_> {
    type Vertex = PlanningVertex;

    fn neighbors(&self, v: &PlanningVertex) -> Vec<PlanningVertex> {
        let mut out = Vec::new();
        for route in self.city.routes() {
            if v.route == Some(route.id()) && !v.is_origin {
                continue;
            }
            self.ride(route.id(), v.vertex, v.eta(), &mut out);
        }
        // Later stops first, so among equal ETAs the longer ride wins.
        out.reverse();

        let walk = self.city.walk_graph();
        for neighbor in walk.neighbors(&v.vertex) {
            if let Some(edge) = walk.edge(&v.vertex, &neighbor) {
                out.push(PlanningVertex::new(None, neighbor, v.eta() + edge.weight()));
            }
        }
        out
    }

    fn weight(&self, from: &PlanningVertex, to: &PlanningVertex) -> f64 {
        to.eta() - from.eta()
    }
}

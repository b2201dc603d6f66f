//! Live-mutable bus routes.
//!
//! # Structure
//!
//! A route is a cycle of [`Waypoint`]s joined by directed [`Arc`]s.  Each
//! waypoint has at most one current *entry* arc and one *exit* arc; the
//! cycle obtained by following exits is the route's **core**.
//!
//! # Patching while buses drive
//!
//! [`Route::patch`] splices a new chain of arcs between two core vertices.
//! The arc it bypasses may still carry buses, so nothing is deleted
//! eagerly:
//!
//! ```text
//! Arc      disposed once   source detached  AND  no buses on it
//! Waypoint disposed once   no current entry AND  no stale entries
//!          (disposing a waypoint detaches the source of its exit arc)
//! ```
//!
//! A bus on a bypassed arc keeps driving it, arrives at the arc's
//! destination (which stays alive while any entry survives), and continues
//! along that waypoint's current exit, i.e. back onto the core.
//!
//! Arcs and waypoints live in per-route arenas; ids are never reused, so
//! id order is creation order.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use tn_core::{ArcId, BusId, RouteId, VertexId, WaypointId};
use tn_graph::Weighted;

use crate::city::DriveGraph;
use crate::{SimError, SimResult};

// ── Waypoint ──────────────────────────────────────────────────────────────────

/// A route's presence at one vertex.
#[derive(Debug, Clone)]
pub struct Waypoint {
    vertex:        VertexId,
    entry:         Option<ArcId>,
    stale_entries: BTreeSet<ArcId>,
    exit:          Option<ArcId>,
}

impl Waypoint {
    fn new(vertex: VertexId) -> Self {
        Self { vertex, entry: None, stale_entries: BTreeSet::new(), exit: None }
    }

    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    pub fn entry(&self) -> Option<ArcId> {
        self.entry
    }

    /// Former entries that are bypassed but not yet disposed.
    pub fn stale_entries(&self) -> &BTreeSet<ArcId> {
        &self.stale_entries
    }

    pub fn exit(&self) -> Option<ArcId> {
        self.exit
    }
}

// ── Arc ───────────────────────────────────────────────────────────────────────

/// A directed hop between two waypoints.
#[derive(Debug, Clone)]
pub struct Arc {
    origin:      VertexId,
    source:      Option<WaypointId>,
    destination: WaypointId,
    buses:       BTreeSet<BusId>,
}

impl Arc {
    /// The vertex the arc leaves from.  Kept after the source waypoint is gone.
    pub fn origin(&self) -> VertexId {
        self.origin
    }

    /// `None` once the arc has been bypassed.
    pub fn source(&self) -> Option<WaypointId> {
        self.source
    }

    pub fn destination(&self) -> WaypointId {
        self.destination
    }

    pub fn buses(&self) -> &BTreeSet<BusId> {
        &self.buses
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Route {
    id:        RouteId,
    waypoints: Vec<Option<Waypoint>>,
    arcs:      Vec<Option<Arc>>,
    by_vertex: FxHashMap<VertexId, WaypointId>,
    buses:     BTreeSet<BusId>,
    moribund:  bool,
}

impl Route {
    /// A two-stop shuttle `a → b → a`.
    pub(crate) fn new(id: RouteId, a: VertexId, b: VertexId, drive: &DriveGraph) -> SimResult<Self> {
        if a == b {
            return Err(SimError::RouteEndpointsIdentical(a));
        }
        for (from, to) in [(a, b), (b, a)] {
            if drive_weight(drive, from, to).is_none() {
                return Err(SimError::MissingDriveEdge { from, to });
            }
        }
        let mut route = Self {
            id,
            waypoints: Vec::new(),
            arcs:      Vec::new(),
            by_vertex: FxHashMap::default(),
            buses:     BTreeSet::new(),
            moribund:  false,
        };
        route.add_arc(a, b);
        route.add_arc(b, a);
        Ok(route)
    }

    pub fn id(&self) -> RouteId {
        self.id
    }

    /// `true` once the route has been retired; it stays in the city until its
    /// last bus detaches.
    pub fn is_moribund(&self) -> bool {
        self.moribund
    }

    pub(crate) fn mark_moribund(&mut self) {
        self.moribund = true;
    }

    pub fn buses(&self) -> &BTreeSet<BusId> {
        &self.buses
    }

    /// `true` if the route has a waypoint at `vertex` (core or not).
    pub fn has(&self, vertex: VertexId) -> bool {
        self.by_vertex.contains_key(&vertex)
    }

    /// `true` if following exits from `vertex` comes back to `vertex`.
    pub fn has_in_core(&self, vertex: VertexId) -> bool {
        let Some(first) = self.arc_from(vertex) else {
            return false;
        };
        let mut seen = FxHashSet::default();
        let mut cursor = self.next(first);
        while let Some(arc) = cursor {
            if arc == first {
                return true;
            }
            if !seen.insert(arc) {
                break;
            }
            cursor = self.next(arc);
        }
        false
    }

    /// The current exit arc at `vertex`.
    pub fn arc_from(&self, vertex: VertexId) -> Option<ArcId> {
        let waypoint = self.by_vertex.get(&vertex)?;
        self.waypoint(*waypoint)?.exit
    }

    /// The arc a bus takes after `arc`: the current exit of its destination.
    pub fn next(&self, arc: ArcId) -> Option<ArcId> {
        let destination = self.arc(arc)?.destination;
        self.waypoint(destination)?.exit
    }

    pub fn arc(&self, id: ArcId) -> Option<&Arc> {
        self.arcs.get(id.index())?.as_ref()
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.get(id.index())?.as_ref()
    }

    /// Live arcs in creation order, including bypassed ones still carrying
    /// buses.
    pub fn arcs(&self) -> impl Iterator<Item = (ArcId, &Arc)> + '_ {
        self.arcs
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.as_ref().map(|a| (ArcId(i as u32), a)))
    }

    pub fn waypoints(&self) -> impl Iterator<Item = (WaypointId, &Waypoint)> + '_ {
        self.waypoints
            .iter()
            .enumerate()
            .filter_map(|(i, w)| w.as_ref().map(|w| (WaypointId(i as u32), w)))
    }

    /// Vertices of the core in driving order, starting from the oldest core
    /// waypoint.
    pub fn core_vertices(&self) -> Vec<VertexId> {
        let Some(start) = self
            .waypoints()
            .find(|(_, w)| self.has_in_core(w.vertex))
            .and_then(|(_, w)| w.exit)
        else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut cursor = Some(start);
        while let Some(arc) = cursor {
            if !seen.insert(arc) {
                break;
            }
            if let Some(a) = self.arc(arc) {
                out.push(a.origin);
            }
            cursor = self.next(arc);
        }
        out
    }

    /// Drive time along `arc`, from its origin to its destination vertex.
    pub fn arc_weight(&self, arc: ArcId, drive: &DriveGraph) -> f64 {
        let Some(a) = self.arc(arc) else {
            return f64::INFINITY;
        };
        let Some(to) = self.waypoint(a.destination).map(Waypoint::vertex) else {
            return f64::INFINITY;
        };
        drive.edge(&a.origin, &to).map_or(f64::INFINITY, Weighted::weight)
    }

    /// Best `(bus, eta)` among this route's buses, ranked by `eta_of`.
    /// Returns `None` if the route does not visit `vertex` or no bus will.
    pub fn next_arrival(
        &self,
        vertex: VertexId,
        mut eta_of: impl FnMut(BusId) -> Option<f64>,
    ) -> Option<(BusId, f64)> {
        if !self.has(vertex) {
            return None;
        }
        let mut best: Option<(BusId, f64)> = None;
        for &bus in &self.buses {
            let Some(eta) = eta_of(bus) else { continue };
            if best.is_none_or(|(_, b)| eta < b) {
                best = Some((bus, eta));
            }
        }
        best
    }

    // ── Patching ──────────────────────────────────────────────────────────

    /// Splice `path` into the route so buses leaving `path[0]` follow it to
    /// `path[last]`.
    pub(crate) fn patch(&mut self, path: &[VertexId], drive: &DriveGraph) -> SimResult<()> {
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            return Err(SimError::PatchTooShort(path.len()));
        };
        if path.len() < 2 {
            return Err(SimError::PatchTooShort(path.len()));
        }
        if first == last {
            return Err(SimError::PatchEndpointsIdentical(first));
        }
        if self.moribund {
            return Err(SimError::RouteRetired(self.id));
        }
        for vertex in [first, last] {
            if !self.has_in_core(vertex) {
                return Err(SimError::PatchEndpointNotOnRoute { route: self.id, vertex });
            }
        }
        for hop in path.windows(2) {
            if drive_weight(drive, hop[0], hop[1]).is_none() {
                return Err(SimError::MissingDriveEdge { from: hop[0], to: hop[1] });
            }
        }

        // Back to front, so the old exit at `first` is replaced last.
        for i in (0..path.len() - 1).rev() {
            self.add_arc(path[i], path[i + 1]);
        }
        debug!(route = %self.id, stops = path.len(), "route patched");
        debug_assert!(self.has_in_core(first));
        debug_assert!(self.has_in_core(last));
        Ok(())
    }

    fn add_arc(&mut self, from: VertexId, to: VertexId) -> ArcId {
        let source = self.waypoint_at(from);
        let destination = self.waypoint_at(to);
        let arc = ArcId(self.arcs.len() as u32);
        self.arcs.push(Some(Arc { origin: from, source: Some(source), destination, buses: BTreeSet::new() }));
        // Entry first: replacing the exit may dispose the old arc, which
        // must not take `destination` down with it.
        self.set_entry(destination, arc);
        self.set_exit(source, arc);
        trace!(route = %self.id, %arc, %from, %to, "arc added");
        arc
    }

    fn waypoint_at(&mut self, vertex: VertexId) -> WaypointId {
        if let Some(&id) = self.by_vertex.get(&vertex) {
            return id;
        }
        let id = WaypointId(self.waypoints.len() as u32);
        self.waypoints.push(Some(Waypoint::new(vertex)));
        self.by_vertex.insert(vertex, id);
        id
    }

    fn set_entry(&mut self, waypoint: WaypointId, arc: ArcId) {
        if let Some(w) = self.waypoint_mut(waypoint) {
            if let Some(old) = w.entry.replace(arc) {
                w.stale_entries.insert(old);
            }
        }
    }

    fn set_exit(&mut self, waypoint: WaypointId, arc: ArcId) {
        let old = self.waypoint_mut(waypoint).and_then(|w| w.exit.replace(arc));
        if let Some(old) = old {
            self.detach_source(old);
        }
    }

    // ── Disposal ──────────────────────────────────────────────────────────

    fn detach_source(&mut self, arc: ArcId) {
        if let Some(a) = self.arc_mut(arc) {
            a.source = None;
        }
        self.maybe_dispose_arc(arc);
    }

    fn maybe_dispose_arc(&mut self, arc: ArcId) {
        let Some(a) = self.arc(arc) else {
            debug_assert!(false, "disposing unknown arc {arc}");
            return;
        };
        if a.source.is_some() || !a.buses.is_empty() {
            return;
        }
        let destination = a.destination;
        self.arcs[arc.index()] = None;
        trace!(route = %self.id, %arc, "arc disposed");
        self.detach_entry(destination, arc);
    }

    fn detach_entry(&mut self, waypoint: WaypointId, arc: ArcId) {
        let Some(w) = self.waypoint_mut(waypoint) else {
            debug_assert!(false, "detaching {arc} from unknown waypoint {waypoint}");
            return;
        };
        if w.entry == Some(arc) {
            w.entry = None;
        } else {
            let removed = w.stale_entries.remove(&arc);
            debug_assert!(removed, "{arc} is not an entry of {waypoint}");
        }
        if w.entry.is_some() || !w.stale_entries.is_empty() {
            return;
        }
        let exit = w.exit.take();
        let vertex = w.vertex;
        self.waypoints[waypoint.index()] = None;
        self.by_vertex.remove(&vertex);
        trace!(route = %self.id, %waypoint, %vertex, "waypoint disposed");
        if let Some(exit) = exit {
            self.detach_source(exit);
        }
    }

    // ── Buses ─────────────────────────────────────────────────────────────

    pub(crate) fn add_bus(&mut self, arc: ArcId, bus: BusId) {
        if let Some(a) = self.arc_mut(arc) {
            a.buses.insert(bus);
        }
        self.buses.insert(bus);
    }

    /// Take `bus` off `arc`, disposing the arc if it was bypassed and is now
    /// empty.  The bus stays on the route unless `leaving` is set.
    pub(crate) fn remove_bus(&mut self, arc: ArcId, bus: BusId, leaving: bool) {
        if let Some(a) = self.arc_mut(arc) {
            a.buses.remove(&bus);
        }
        if leaving {
            self.buses.remove(&bus);
        }
        self.maybe_dispose_arc(arc);
    }

    fn arc_mut(&mut self, id: ArcId) -> Option<&mut Arc> {
        self.arcs.get_mut(id.index())?.as_mut()
    }

    fn waypoint_mut(&mut self, id: WaypointId) -> Option<&mut Waypoint> {
        self.waypoints.get_mut(id.index())?.as_mut()
    }
}

/// Weight of the drive edge `from → to`, if it exists and is usable.
pub(crate) fn drive_weight(drive: &DriveGraph, from: VertexId, to: VertexId) -> Option<f64> {
    drive
        .edge(&from, &to)
        .map(Weighted::weight)
        .filter(|w| w.is_finite() && *w > 0.0)
}

//! The city: owns every entity and drives the event loop.
//!
//! # Replanning
//!
//! Passengers plan against the *current* bus positions, so any change to
//! the network can make a plan stale.  Every public mutation therefore ends
//! with [`City::replan_passengers`], which restarts every passenger.  Buses
//! are not restarted by a replan: their intent only depends on their own
//! arc, seats and stop.

use tracing::{debug, info};

use tn_core::{BusId, CityConfig, PassengerId, RouteId, SimRng, SimTime, VertexId};
use tn_graph::{TransitGraph, UndirectedEdge};
use tn_schedule::{self as schedule, restart, Agent, AgentHost, Decision, EventId, EventScheduler};

use crate::bus::{Bus, BusEffect};
use crate::network::Route;
use crate::observer::CityObserver;
use crate::passenger::{Passenger, PassengerEffect};
use crate::vertex::Vertex;
use crate::{SimError, SimResult};

pub type WalkGraph = TransitGraph<VertexId, UndirectedEdge>;
pub type DriveGraph = TransitGraph<VertexId, UndirectedEdge>;

/// An agent address inside a city.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AgentRef {
    Bus(BusId),
    Passenger(PassengerId),
}

/// Payload of a scheduled event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Bus(BusEffect),
    Passenger(PassengerEffect),
}

pub struct City {
    pub(crate) config:     CityConfig,
    pub(crate) vertices:   Vec<Vertex>,
    pub(crate) walk:       WalkGraph,
    pub(crate) drive:      DriveGraph,
    /// Sparse: retired routes leave a `None` slot that the next route reuses.
    pub(crate) routes:     Vec<Option<Route>>,
    pub(crate) buses:      Vec<Bus>,
    pub(crate) passengers: Vec<Passenger>,
    pub(crate) scheduler:  EventScheduler<(AgentRef, Effect)>,
    pub(crate) rng:        SimRng,
}

impl City {
    pub(crate) fn new(config: CityConfig, vertices: Vec<Vertex>, walk: WalkGraph, drive: DriveGraph) -> Self {
        Self {
            rng: SimRng::new(config.seed),
            config,
            vertices,
            walk,
            drive,
            routes: Vec::new(),
            buses: Vec::new(),
            passengers: Vec::new(),
            scheduler: EventScheduler::new(),
        }
    }

    // ── Topology ──────────────────────────────────────────────────────────

    /// Open a two-stop shuttle route between `a` and `b`.
    pub fn add_route(&mut self, a: VertexId, b: VertexId) -> SimResult<RouteId> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        let slot = self.routes.iter().position(Option::is_none).unwrap_or(self.routes.len());
        let id = RouteId(slot as u32);
        let route = Route::new(id, a, b, &self.drive)?;
        if slot == self.routes.len() {
            self.routes.push(Some(route));
        } else {
            self.routes[slot] = Some(route);
        }
        debug!(route = %id, %a, %b, "route added");
        self.replan_passengers()?;
        Ok(id)
    }

    /// Reroute `id` so buses leaving `path[0]` drive through `path` to
    /// `path[last]`.  Both endpoints must already be on the route's core.
    pub fn patch_route(&mut self, id: RouteId, path: &[VertexId]) -> SimResult<()> {
        for &vertex in path {
            self.check_vertex(vertex)?;
        }
        let route = self
            .routes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SimError::RouteNotFound(id))?;
        route.patch(path, &self.drive)?;
        self.replan_passengers()
    }

    /// Withdraw a route.  Its buses finish their current drive, unload
    /// everyone at the next stop and detach; the slot is released with the
    /// last one.
    pub fn retire_route(&mut self, id: RouteId) -> SimResult<()> {
        let route = self.route_mut(id)?;
        if route.is_moribund() {
            return Ok(());
        }
        route.mark_moribund();
        let buses: Vec<BusId> = route.buses().iter().copied().collect();
        debug!(route = %id, buses = buses.len(), "route retired");
        if buses.is_empty() {
            self.routes[id.index()] = None;
        } else {
            for bus in buses {
                self.buses[bus.index()].stopping = true;
                restart(self, AgentRef::Bus(bus))?;
            }
        }
        self.replan_passengers()
    }

    // ── Fleet ─────────────────────────────────────────────────────────────

    /// Put a new bus on `route`, parked at `at`.  `capacity` defaults to
    /// [`CityConfig::default_capacity`].
    pub fn add_bus(&mut self, route: RouteId, at: VertexId, capacity: Option<usize>) -> SimResult<BusId> {
        let capacity = capacity.unwrap_or(self.config.default_capacity);
        if capacity == 0 {
            return Err(SimError::ZeroCapacity);
        }
        let (loading_delay, unloading_delay) = (self.config.loading_delay, self.config.unloading_delay);
        let id = BusId(self.buses.len() as u32);
        let r = self.route_mut(route)?;
        if r.is_moribund() {
            return Err(SimError::RouteRetired(route));
        }
        let arc = r.arc_from(at).ok_or(SimError::VertexNotOnRoute { route, vertex: at })?;
        r.add_bus(arc, id);
        self.buses.push(Bus::new(route, arc, at, capacity, loading_delay, unloading_delay));
        debug!(bus = %id, %route, vertex = %at, capacity, "bus added");
        restart(self, AgentRef::Bus(id))?;
        self.replan_passengers()?;
        Ok(id)
    }

    /// Ask a bus to finish its drive, unload everyone and detach.
    pub fn stop_bus(&mut self, id: BusId) -> SimResult<()> {
        let bus = self.bus_mut(id)?;
        if bus.is_detached() || bus.stopping {
            return Ok(());
        }
        bus.stopping = true;
        debug!(bus = %id, "bus stopping");
        restart(self, AgentRef::Bus(id))?;
        self.replan_passengers()
    }

    // ── Population ────────────────────────────────────────────────────────

    /// Add a passenger standing at `vertex`.  `inactive_time` defaults to
    /// [`CityConfig::inactive_time`].
    pub fn add_passenger(
        &mut self,
        name: impl Into<String>,
        inactive_time: Option<f64>,
        vertex: VertexId,
    ) -> SimResult<PassengerId> {
        self.check_vertex(vertex)?;
        let inactive_time = inactive_time.unwrap_or(self.config.inactive_time);
        if !(inactive_time.is_finite() && inactive_time > 0.0) {
            return Err(SimError::InvalidDuration { what: "inactive_time", value: inactive_time });
        }
        let id = PassengerId(self.passengers.len() as u32);
        self.passengers.push(Passenger::new(name, inactive_time, vertex));
        self.place_passenger(id, vertex);
        debug!(passenger = %id, %vertex, "passenger added");
        self.replan_passengers()?;
        Ok(id)
    }

    /// Send a passenger to `destination` from wherever they stand.
    pub fn assign_trip(&mut self, id: PassengerId, destination: VertexId) -> SimResult<()> {
        self.check_vertex(destination)?;
        let p = self.passenger_mut(id)?;
        p.source = p.vertex;
        p.destination = Some(destination);
        debug!(passenger = %id, %destination, "trip assigned");
        restart(self, AgentRef::Passenger(id))
    }

    /// Restart every passenger so they plan against the current network.
    pub fn replan_passengers(&mut self) -> SimResult<()> {
        for i in 0..self.passengers.len() {
            restart(self, AgentRef::Passenger(PassengerId(i as u32)))?;
        }
        Ok(())
    }

    // ── Event loop ────────────────────────────────────────────────────────

    /// Fire everything due at the next event time and return it.
    pub fn step(&mut self) -> SimResult<SimTime> {
        schedule::step(self)
    }

    /// Step until the next event would be later than `end`.
    pub fn run_until<O: CityObserver>(&mut self, end: SimTime, observer: &mut O) -> SimResult<SimTime> {
        info!(from = %self.now(), to = %end, "run started");
        while self.scheduler.next_time().is_some_and(|t| t <= end) {
            let now = self.step()?;
            observer.on_step(self, now);
        }
        observer.on_run_end(self);
        info!(now = %self.now(), pending = self.scheduler.len(), "run finished");
        Ok(self.now())
    }

    // ── Observables ───────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn config(&self) -> &CityConfig {
        &self.config
    }

    /// Live routes in slot order, including retired ones whose buses have
    /// not all detached yet.
    pub fn routes(&self) -> impl Iterator<Item = &Route> + '_ {
        self.routes.iter().flatten()
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.index())?.as_ref()
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.buses.get(id.index())
    }

    pub fn buses(&self) -> impl Iterator<Item = (BusId, &Bus)> + '_ {
        self.buses.iter().enumerate().map(|(i, b)| (BusId(i as u32), b))
    }

    pub fn passenger(&self, id: PassengerId) -> Option<&Passenger> {
        self.passengers.get(id.index())
    }

    pub fn passengers(&self) -> impl Iterator<Item = (PassengerId, &Passenger)> + '_ {
        self.passengers.iter().enumerate().map(|(i, p)| (PassengerId(i as u32), p))
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn vertex_by_name(&self, name: &str) -> Option<VertexId> {
        self.vertices.iter().position(|v| v.name() == name).map(|i| VertexId(i as u32))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn walk_graph(&self) -> &WalkGraph {
        &self.walk
    }

    pub fn drive_graph(&self) -> &DriveGraph {
        &self.drive
    }

    /// Number of pending events.
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    // ── Internal lookups ──────────────────────────────────────────────────

    fn check_vertex(&self, id: VertexId) -> SimResult<()> {
        if id.index() < self.vertices.len() {
            Ok(())
        } else {
            Err(SimError::VertexNotFound(id))
        }
    }

    pub(crate) fn route_ref(&self, id: RouteId) -> SimResult<&Route> {
        self.route(id).ok_or(SimError::RouteNotFound(id))
    }

    pub(crate) fn route_mut(&mut self, id: RouteId) -> SimResult<&mut Route> {
        self.routes.get_mut(id.index()).and_then(Option::as_mut).ok_or(SimError::RouteNotFound(id))
    }

    pub(crate) fn bus_ref(&self, id: BusId) -> SimResult<&Bus> {
        self.buses.get(id.index()).ok_or(SimError::BusNotFound(id))
    }

    pub(crate) fn bus_mut(&mut self, id: BusId) -> SimResult<&mut Bus> {
        self.buses.get_mut(id.index()).ok_or(SimError::BusNotFound(id))
    }

    pub(crate) fn passenger_ref(&self, id: PassengerId) -> SimResult<&Passenger> {
        self.passengers.get(id.index()).ok_or(SimError::PassengerNotFound(id))
    }

    pub(crate) fn passenger_mut(&mut self, id: PassengerId) -> SimResult<&mut Passenger> {
        self.passengers.get_mut(id.index()).ok_or(SimError::PassengerNotFound(id))
    }
}

// ── Agent dispatch ────────────────────────────────────────────────────────────

impl AgentHost for City {
    type Agent = AgentRef;
    type Effect = Effect;
    type Error = SimError;

    fn scheduler(&self) -> &EventScheduler<(AgentRef, Effect)> {
        &self.scheduler
    }

    fn scheduler_mut(&mut self) -> &mut EventScheduler<(AgentRef, Effect)> {
        &mut self.scheduler
    }

    fn pending_event(&mut self, agent: AgentRef) -> &mut Option<EventId> {
        match agent {
            AgentRef::Bus(id) => &mut self.buses[id.index()].pending,
            AgentRef::Passenger(id) => &mut self.passengers[id.index()].pending,
        }
    }

    fn decide(&mut self, agent: AgentRef) -> SimResult<Option<Decision<Effect>>> {
        Ok(match agent {
            AgentRef::Bus(id) => {
                Bus::decide(self, id)?.map(|d| Decision::new(d.delay, Effect::Bus(d.effect)))
            }
            AgentRef::Passenger(id) => Passenger::decide(self, id)?
                .map(|d| Decision::new(d.delay, Effect::Passenger(d.effect))),
        })
    }

    fn apply(&mut self, agent: AgentRef, effect: Effect) -> SimResult<()> {
        match (agent, effect) {
            (AgentRef::Bus(id), Effect::Bus(e)) => Bus::apply(self, id, e),
            (AgentRef::Passenger(id), Effect::Passenger(e)) => Passenger::apply(self, id, e),
            (agent, effect) => {
                debug_assert!(false, "effect {effect:?} delivered to {agent:?}");
                Ok(())
            }
        }
    }
}

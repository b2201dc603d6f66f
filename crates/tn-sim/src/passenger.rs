//! Passengers: state, observables and decision logic.
//!
//! A passenger is in exactly one of these positions at any instant:
//!
//! | Position            | `vertex(now)` | `bus()` | Own event        |
//! |---------------------|---------------|---------|------------------|
//! | standing at a stop  | `Some`        | `None`  | none (waiting)   |
//! | walking             | `None`        | `None`  | arrival          |
//! | riding              | `None`        | `Some`  | none             |
//!
//! Boarding and alighting are driven by the bus; the passenger only replans
//! when the bus hands it over.  Idling at a destination is modelled as a
//! walk of `inactive_time` that starts and ends at the same vertex.

use tracing::{debug, trace};

use tn_core::{BusId, PassengerId, RouteId, SimTime, VertexId};
use tn_graph::shortest_path;
use tn_schedule::{restart, Agent, Decision, EventId};

use crate::city::AgentRef;
use crate::planner::{PlanningGraph, PlanningVertex};
use crate::{City, SimError, SimResult};

/// What a passenger does when its pending event fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PassengerEffect {
    Arrive,
}

#[derive(Debug, Clone)]
pub struct Passenger {
    pub(crate) name:           String,
    pub(crate) vertex:         Option<VertexId>,
    pub(crate) bus:            Option<BusId>,
    pub(crate) source:         Option<VertexId>,
    pub(crate) destination:    Option<VertexId>,
    pub(crate) boarding:       Option<(SimTime, SimTime)>,
    pub(crate) alighting:      Option<(SimTime, SimTime)>,
    pub(crate) departure_time: Option<SimTime>,
    pub(crate) arrival_time:   Option<SimTime>,
    pub(crate) inactive_time:  f64,
    pub(crate) plan:           Vec<PlanningVertex>,
    pub(crate) pending:        Option<EventId>,
}

impl Passenger {
    pub(crate) fn new(name: impl Into<String>, inactive_time: f64, vertex: VertexId) -> Self {
        Self {
            name: name.into(),
            vertex: None,
            bus: None,
            source: None,
            destination: None,
            boarding: None,
            alighting: None,
            departure_time: None,
            arrival_time: None,
            inactive_time,
            plan: vec![PlanningVertex::new(None, vertex, inactive_time)],
            pending: None,
        }
    }

    // ── Observables ───────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stop the passenger is standing at; `None` while walking or riding.
    pub fn vertex(&self, now: SimTime) -> Option<VertexId> {
        if self.departure_time.is_some_and(|d| d < now) {
            return None;
        }
        self.vertex
    }

    pub fn bus(&self) -> Option<BusId> {
        self.bus
    }

    pub fn source(&self) -> Option<VertexId> {
        self.source
    }

    pub fn destination(&self) -> Option<VertexId> {
        self.destination
    }

    pub fn inactive_time(&self) -> f64 {
        self.inactive_time
    }

    pub fn plan(&self) -> &[PlanningVertex] {
        &self.plan
    }

    /// Where the first step of the plan ends.
    pub fn immediate_destination(&self) -> Option<VertexId> {
        self.plan.first().map(|step| step.vertex)
    }

    /// Planned ETA of the whole trip, relative to when it was planned.
    pub fn duration(&self) -> Option<f64> {
        self.plan.last().map(PlanningVertex::eta)
    }

    pub fn is_boarding(&self) -> bool {
        self.boarding.is_some()
    }

    pub fn boarding_eta(&self, now: SimTime) -> Option<f64> {
        self.boarding.map(|(_, end)| end - now)
    }

    pub fn is_alighting(&self) -> bool {
        self.alighting.is_some()
    }

    pub fn alighting_eta(&self, now: SimTime) -> Option<f64> {
        self.alighting.map(|(_, end)| end - now)
    }

    /// Time left until the end of the current walk.
    pub fn eta(&self, now: SimTime) -> Option<f64> {
        self.arrival_time.map(|a| a - now)
    }

    pub fn transit_delay(&self) -> Option<f64> {
        Some(self.arrival_time? - self.departure_time?)
    }

    pub fn progress(&self, now: SimTime) -> Option<f64> {
        let (departure, arrival) = (self.departure_time?, self.arrival_time?);
        Some((now - departure) / (arrival - departure))
    }

    /// The vertex a walk started from, while it is a real walk rather than
    /// idling in place.
    pub fn walking_source(&self) -> Option<VertexId> {
        if self.departure_time.is_some() && self.vertex != self.immediate_destination() {
            debug_assert!(self.plan.first().is_some_and(|s| s.route.is_none()));
            return self.vertex;
        }
        None
    }

    /// `true` if standing at a stop intending to board a bus of `route`.
    pub fn is_waiting_for(&self, route: RouteId) -> bool {
        self.bus.is_none()
            && self.boarding.is_none()
            && self.plan.first().is_some_and(|s| s.route == Some(route))
    }

    pub(crate) fn begin_board(&mut self, now: SimTime, delay: f64) {
        self.boarding = Some((now, now + delay));
    }

    pub(crate) fn begin_alight(&mut self, now: SimTime, delay: f64) {
        self.alighting = Some((now, now + delay));
    }
}

// ── Decision logic ────────────────────────────────────────────────────────────

impl Agent<City> for Passenger {
    type Id = PassengerId;
    type Effect = PassengerEffect;
    type Error = SimError;

    fn decide(
        city: &mut City,
        id: PassengerId,
    ) -> SimResult<Option<Decision<PassengerEffect>>> {
        let now = city.now();
        let passenger = city.passenger_ref(id)?;

        if passenger.bus.is_some() {
            city.plan_from_bus(id);
            return Ok(None);
        }
        if passenger.boarding.is_some() {
            return Ok(None);
        }
        if passenger.vertex(now).is_none() {
            let delay = passenger.eta(now).unwrap_or(0.0);
            return Ok(Some(Decision::new(delay, PassengerEffect::Arrive)));
        }

        city.plan_passenger(id);
        let passenger = &mut city.passengers[id.index()];
        let Some(step) = passenger.plan.first().copied() else {
            return Ok(None);
        };
        if step.route.is_some() {
            trace!(passenger = %id, to = %step.vertex, "waiting for a bus");
            return Ok(None);
        }
        passenger.departure_time = Some(now);
        passenger.arrival_time = Some(now + step.eta());
        trace!(passenger = %id, to = %step.vertex, eta = step.eta(), "walking");
        Ok(Some(Decision::new(step.eta(), PassengerEffect::Arrive)))
    }

    fn apply(city: &mut City, id: PassengerId, effect: PassengerEffect) -> SimResult<()> {
        match effect {
            PassengerEffect::Arrive => {
                if let Some(vertex) = city.passenger_ref(id)?.immediate_destination() {
                    city.place_passenger(id, vertex);
                }
            }
        }
        Ok(())
    }
}

// ── City-side passenger mechanics ─────────────────────────────────────────────

impl City {
    /// Put `id` at `vertex`, off any bus.  Reaching the destination starts
    /// the idle period; reaching it again while idle ends the trip.
    pub(crate) fn place_passenger(&mut self, id: PassengerId, vertex: VertexId) {
        let p = &mut self.passengers[id.index()];
        if let Some(old) = p.vertex.take() {
            self.vertices[old.index()].remove_passenger(id);
        }
        if let Some(bus) = p.bus.take() {
            self.buses[bus.index()].unseat(id);
        }
        p.vertex = Some(vertex);
        self.vertices[vertex.index()].add_passenger(id);
        if p.destination == Some(vertex) {
            if p.source != p.destination {
                p.source = p.destination;
            } else {
                p.source = None;
                p.destination = None;
            }
        }
        p.departure_time = None;
        p.arrival_time = None;
    }

    /// Put `id` on `bus`, off any vertex.
    pub(crate) fn seat_passenger(&mut self, id: PassengerId, bus: BusId) {
        let p = &mut self.passengers[id.index()];
        if let Some(old) = p.vertex.take() {
            self.vertices[old.index()].remove_passenger(id);
        }
        if let Some(old) = p.bus.take() {
            self.buses[old.index()].unseat(id);
        }
        p.bus = Some(bus);
        self.buses[bus.index()].seat(id);
        p.departure_time = None;
        p.arrival_time = None;
    }

    pub(crate) fn end_board(&mut self, id: PassengerId, bus: BusId) -> SimResult<()> {
        self.passenger_mut(id)?.boarding = None;
        self.seat_passenger(id, bus);
        trace!(passenger = %id, %bus, "boarded");
        restart(self, AgentRef::Passenger(id))
    }

    pub(crate) fn end_alight(&mut self, id: PassengerId, vertex: VertexId) -> SimResult<()> {
        self.passenger_mut(id)?.alighting = None;
        self.place_passenger(id, vertex);
        trace!(passenger = %id, %vertex, "alighted");
        restart(self, AgentRef::Passenger(id))
    }

    /// Replan a passenger standing at a stop.
    pub(crate) fn plan_passenger(&mut self, id: PassengerId) {
        let p = &mut self.passengers[id.index()];
        p.departure_time = None;
        p.arrival_time = None;
        let Some(here) = p.vertex else {
            debug_assert!(false, "passenger {id} planned from a vertex while riding");
            return;
        };
        if p.destination.is_none() {
            p.source = Some(here);
            p.destination = self.rng.choose(self.walk.vertices()).copied();
        }
        let (source, destination, inactive_time) = (p.source, p.destination, p.inactive_time);

        let mut plan = None;
        if source != destination {
            let starter = PlanningVertex::origin(None, here, 0.0);
            plan = shortest_path(
                &PlanningGraph::new(self),
                starter,
                |v| Some(v.vertex) == destination,
                |v| v.vertex,
            )
            .map(|path| path[1..].to_vec())
            .filter(|steps| !steps.is_empty());
            if plan.is_none() {
                debug!(passenger = %id, from = %here, ?destination, "no plan found");
            }
        }
        self.passengers[id.index()].plan =
            plan.unwrap_or_else(|| vec![PlanningVertex::new(None, here, inactive_time)]);
    }

    /// Replan a riding passenger from the bus's next stop.  Keeps the old
    /// plan if the bus will never reach that stop.
    pub(crate) fn plan_from_bus(&mut self, id: PassengerId) {
        let now = self.now();
        let p = &self.passengers[id.index()];
        let (Some(bus_id), destination) = (p.bus, p.destination) else {
            return;
        };
        let Some(bus) = self.buses.get(bus_id.index()) else { return };
        let (Some(arc), route) = (bus.arc, bus.route) else { return };
        let next_stop = match bus.vertex(now) {
            Some(vertex) => Some(vertex),
            None => self
                .route(route)
                .and_then(|r| r.next(arc).and_then(|next| r.arc(next)))
                .map(|a| a.origin()),
        };
        let Some(next_stop) = next_stop else { return };
        let Some(eta) = self.bus_eta(bus_id, next_stop, 0.0) else { return };

        let starter = PlanningVertex::origin(Some(route), next_stop, eta);
        let plan = match shortest_path(
            &PlanningGraph::new(self),
            starter,
            |v| Some(v.vertex) == destination,
            |v| v.vertex,
        ) {
            Some(mut path) => {
                if path.len() > 1 && path[0].route == path[1].route {
                    path.remove(0);
                }
                path
            }
            None => vec![starter],
        };
        self.passengers[id.index()].plan = plan;
    }
}

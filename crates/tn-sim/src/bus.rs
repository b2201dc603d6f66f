//! Buses: state, observables and decision logic.
//!
//! A bus is always on exactly one arc of its route until it detaches.  While
//! parked it sits at the arc's origin; while driving it is between the
//! origin and the arc's destination.  At each stop it handles one passenger
//! at a time, unloading before loading:
//!
//! ```text
//! unloading ─┐
//! loading ───┼─ wait out the delay, then decide again
//! driving ───┘
//! parked ──── unload one → [stopping: detach when empty] → load one → depart
//! ```

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use tn_core::{ArcId, BusId, PassengerId, RouteId, SimTime, VertexId};
use tn_schedule::{restart, Agent, Decision, EventId};

use crate::city::AgentRef;
use crate::{City, SimError, SimResult};

/// What a bus does when its pending event fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEffect {
    FinishUnloading,
    FinishLoading,
    Arrive,
}

#[derive(Debug, Clone)]
pub struct Bus {
    pub(crate) route:           RouteId,
    pub(crate) arc:             Option<ArcId>,
    /// Origin of `arc`, where the bus parks.
    pub(crate) at:              VertexId,
    pub(crate) departure_time:  Option<SimTime>,
    pub(crate) arrival_time:    Option<SimTime>,
    pub(crate) alighting:       Option<PassengerId>,
    pub(crate) boarding:        Option<PassengerId>,
    pub(crate) boarding_index:  Option<usize>,
    pub(crate) waiting_until:   Option<SimTime>,
    pub(crate) seats:           Vec<Option<PassengerId>>,
    pub(crate) loading_delay:   f64,
    pub(crate) unloading_delay: f64,
    pub(crate) stopping:        bool,
    pub(crate) pending:         Option<EventId>,
}

impl Bus {
    pub(crate) fn new(
        route: RouteId,
        arc: ArcId,
        at: VertexId,
        capacity: usize,
        loading_delay: f64,
        unloading_delay: f64,
    ) -> Self {
        Self {
            route,
            arc: Some(arc),
            at,
            departure_time: None,
            arrival_time: None,
            alighting: None,
            boarding: None,
            boarding_index: None,
            waiting_until: None,
            seats: vec![None; capacity],
            loading_delay,
            unloading_delay,
            stopping: false,
            pending: None,
        }
    }

    // ── Observables ───────────────────────────────────────────────────────

    /// The route this bus serves; `None` once detached.
    pub fn route(&self) -> Option<RouteId> {
        self.arc.map(|_| self.route)
    }

    pub fn arc(&self) -> Option<ArcId> {
        self.arc
    }

    /// The stop the bus is parked at, or `None` while driving or detached.
    pub fn vertex(&self, now: SimTime) -> Option<VertexId> {
        self.arc?;
        if self.departure_time.is_some_and(|d| d < now) {
            return None;
        }
        Some(self.at)
    }

    /// Time left until the end of the current drive.
    pub fn eta(&self, now: SimTime) -> Option<f64> {
        self.arrival_time.map(|a| a - now)
    }

    /// Length of the current drive.
    pub fn transit_delay(&self) -> Option<f64> {
        Some(self.arrival_time? - self.departure_time?)
    }

    /// Fraction of the current drive completed, in `[0, 1]`.
    pub fn progress(&self, now: SimTime) -> Option<f64> {
        let (departure, arrival) = (self.departure_time?, self.arrival_time?);
        Some((now - departure) / (arrival - departure))
    }

    pub fn capacity(&self) -> usize {
        self.seats.len()
    }

    /// Seats in order; `None` is an empty seat.
    pub fn passengers(&self) -> &[Option<PassengerId>] {
        &self.seats
    }

    /// Seat reserved for the passenger currently boarding.
    pub fn boarding_index(&self) -> Option<usize> {
        self.boarding_index
    }

    pub fn boarding_passenger(&self) -> Option<PassengerId> {
        self.boarding
    }

    pub fn alighting_passenger(&self) -> Option<PassengerId> {
        self.alighting
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn is_detached(&self) -> bool {
        self.arc.is_none()
    }

    // ── Seats ─────────────────────────────────────────────────────────────

    pub(crate) fn seat(&mut self, passenger: PassengerId) {
        let free = self.seats.iter_mut().find(|s| s.is_none());
        debug_assert!(free.is_some(), "passenger {passenger} boarded a full bus");
        if let Some(seat) = free {
            *seat = Some(passenger);
        }
    }

    pub(crate) fn unseat(&mut self, passenger: PassengerId) {
        let seat = self.seats.iter_mut().find(|s| **s == Some(passenger));
        debug_assert!(seat.is_some(), "passenger {passenger} is not riding this bus");
        if let Some(seat) = seat {
            *seat = None;
        }
    }
}

// ── Decision logic ────────────────────────────────────────────────────────────

impl Agent<City> for Bus {
    type Id = BusId;
    type Effect = BusEffect;
    type Error = SimError;

    fn decide(city: &mut City, id: BusId) -> SimResult<Option<Decision<BusEffect>>> {
        let now = city.now();
        let bus = city.bus_ref(id)?;
        let Some(arc) = bus.arc else {
            return Ok(None);
        };

        if bus.alighting.is_some() || bus.boarding.is_some() {
            let effect = if bus.alighting.is_some() {
                BusEffect::FinishUnloading
            } else {
                BusEffect::FinishLoading
            };
            let delay = bus.waiting_until.map_or(0.0, |t| t - now);
            return Ok(Some(Decision::new(delay, effect)));
        }

        let Some(vertex) = bus.vertex(now) else {
            return Ok(Some(Decision::new(bus.eta(now).unwrap_or(0.0), BusEffect::Arrive)));
        };

        let route = bus.route;
        let stopping = bus.stopping;
        let (loading_delay, unloading_delay) = (bus.loading_delay, bus.unloading_delay);
        let free_seat = bus.seats.iter().position(Option::is_none);
        let alighting = bus.seats.iter().flatten().copied().find(|&p| {
            stopping || city.passengers[p.index()].immediate_destination() == Some(vertex)
        });
        let waiting: Vec<PassengerId> = city.vertices[vertex.index()]
            .passengers()
            .iter()
            .copied()
            .filter(|&p| city.passengers[p.index()].is_waiting_for(route))
            .collect();

        if let Some(passenger) = alighting {
            city.passengers[passenger.index()].begin_alight(now, unloading_delay);
            let bus = &mut city.buses[id.index()];
            bus.departure_time = None;
            bus.arrival_time = None;
            bus.alighting = Some(passenger);
            bus.waiting_until = Some(now + unloading_delay);
            trace!(bus = %id, %passenger, %vertex, "unloading");
            return Ok(Some(Decision::new(unloading_delay, BusEffect::FinishUnloading)));
        }

        if stopping {
            city.detach_bus(id)?;
            return Ok(None);
        }

        match (free_seat, waiting.first()) {
            (Some(seat), Some(&passenger)) => {
                city.passengers[passenger.index()].begin_board(now, loading_delay);
                let bus = &mut city.buses[id.index()];
                bus.departure_time = None;
                bus.arrival_time = None;
                bus.boarding = Some(passenger);
                bus.boarding_index = Some(seat);
                bus.waiting_until = Some(now + loading_delay);
                trace!(bus = %id, %passenger, %vertex, seat, "loading");
                return Ok(Some(Decision::new(loading_delay, BusEffect::FinishLoading)));
            }
            (None, _) => {
                // Full: let the people waiting reconsider.
                for passenger in waiting {
                    restart(city, AgentRef::Passenger(passenger))?;
                }
            }
            (Some(_), None) => {}
        }

        let delay = city.route_ref(route)?.arc_weight(arc, &city.drive);
        let bus = &mut city.buses[id.index()];
        bus.departure_time = Some(now);
        bus.arrival_time = Some(now + delay);
        trace!(bus = %id, from = %vertex, delay, "departing");
        Ok(Some(Decision::new(delay, BusEffect::Arrive)))
    }

    fn apply(city: &mut City, id: BusId, effect: BusEffect) -> SimResult<()> {
        match effect {
            BusEffect::FinishUnloading => {
                let bus = city.bus_mut(id)?;
                let passenger = bus.alighting.take();
                bus.waiting_until = None;
                let at = bus.at;
                if let Some(passenger) = passenger {
                    city.end_alight(passenger, at)?;
                }
            }
            BusEffect::FinishLoading => {
                let bus = city.bus_mut(id)?;
                let passenger = bus.boarding.take();
                bus.boarding_index = None;
                bus.waiting_until = None;
                if let Some(passenger) = passenger {
                    city.end_board(passenger, id)?;
                }
            }
            BusEffect::Arrive => city.bus_arrive(id)?,
        }
        Ok(())
    }
}

// ── City-side bus mechanics ───────────────────────────────────────────────────

impl City {
    /// Move `id` from its arc onto the next one.
    pub(crate) fn bus_arrive(&mut self, id: BusId) -> SimResult<()> {
        let bus = self.bus_ref(id)?;
        let (route_id, at) = (bus.route, bus.at);
        let Some(old) = bus.arc else {
            return Ok(());
        };
        let route = self.route_mut(route_id)?;
        let Some(next) = route.next(old) else {
            debug_assert!(false, "arc {old} of {route_id} has no successor");
            return Ok(());
        };
        let at = route.arc(next).map_or(at, |a| a.origin());
        route.add_bus(next, id);
        route.remove_bus(old, id, false);

        let bus = &mut self.buses[id.index()];
        bus.arc = Some(next);
        bus.at = at;
        bus.departure_time = None;
        bus.arrival_time = None;
        trace!(bus = %id, vertex = %at, "arrived");
        Ok(())
    }

    /// Take a stopping, empty bus off its route.  Frees the route's slot if
    /// it was retired and this was its last bus.
    pub(crate) fn detach_bus(&mut self, id: BusId) -> SimResult<()> {
        let bus = self.bus_mut(id)?;
        let Some(arc) = bus.arc.take() else {
            debug_assert!(false, "bus {id} detached twice");
            return Ok(());
        };
        let route_id = bus.route;
        bus.departure_time = None;
        bus.arrival_time = None;

        let slot = self
            .routes
            .get_mut(route_id.index())
            .ok_or(SimError::RouteNotFound(route_id))?;
        if let Some(route) = slot.as_mut() {
            route.remove_bus(arc, id, true);
            if route.is_moribund() && route.buses().is_empty() {
                *slot = None;
                debug!(route = %route_id, "retired route released");
            }
        }
        debug!(bus = %id, route = %route_id, "bus detached");
        self.replan_passengers()
    }

    /// Time until bus `id` next reaches `vertex`, at least `min_eta` from now.
    ///
    /// Loading and unloading delays are ignored.  Returns `Some(0.0)` when the
    /// bus is parked at `vertex` with room for one more (an empty seat or a
    /// rider getting off here) and `min_eta <= 0`.
    pub fn bus_eta(&self, id: BusId, vertex: VertexId, min_eta: f64) -> Option<f64> {
        if min_eta.is_nan() || min_eta == f64::INFINITY {
            return None;
        }
        let bus = self.buses.get(id.index())?;
        let arc = bus.arc?;
        let route = self.route(bus.route)?;
        let now = self.now();

        if min_eta <= 0.0 && bus.vertex(now) == Some(vertex) {
            let room = bus.seats.iter().any(|seat| match seat {
                None => true,
                Some(p) => self.passengers[p.index()].immediate_destination() == Some(vertex),
            });
            if room {
                return Some(0.0);
            }
        }

        let mut eta = bus.eta(now).unwrap_or_else(|| route.arc_weight(arc, &self.drive));
        let mut seen = FxHashSet::default();
        let mut cursor = route.next(arc);
        while let Some(a) = cursor {
            if seen.contains(&a) {
                break;
            }
            if eta >= min_eta {
                if route.arc(a)?.origin() == vertex {
                    return Some(eta);
                }
                seen.insert(a);
            }
            eta += route.arc_weight(a, &self.drive);
            cursor = route.next(a);
        }
        None
    }

    /// Soonest `(bus, eta)` among the non-stopping buses of `route` that
    /// reach `vertex` no earlier than `min_eta`.
    pub fn next_arrival(
        &self,
        route: RouteId,
        vertex: VertexId,
        min_eta: f64,
    ) -> Option<(BusId, f64)> {
        self.route(route)?.next_arrival(vertex, |bus| {
            let b = self.buses.get(bus.index())?;
            if b.stopping {
                return None;
            }
            self.bus_eta(bus, vertex, min_eta)
        })
    }
}

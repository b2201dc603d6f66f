//! Unit tests for tn-sim.

use std::io::Cursor;

use tn_core::{ArcId, CityConfig, PassengerId, SimTime, VertexId};
use tn_graph::{UndirectedEdge, Weighted};

use crate::{load_city_reader, City, CityBuilder, CityObserver, NoopObserver, SimError};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A city with one vertex per character of `names`, plus the given edges.
fn city(names: &str, drive: &[(usize, usize, f64)], walk: &[(usize, usize, f64)]) -> City {
    let mut builder = CityBuilder::new(CityConfig::default());
    let ids: Vec<VertexId> = names.chars().map(|c| builder.vertex(&c.to_string())).collect();
    for &(a, b, w) in drive {
        builder.add_drive_edge(ids[a], ids[b], UndirectedEdge::new(w));
    }
    for &(a, b, w) in walk {
        builder.add_walk_edge(ids[a], ids[b], UndirectedEdge::new(w));
    }
    builder.build().unwrap()
}

fn v(i: u32) -> VertexId {
    VertexId(i)
}

/// True while `p` has reached its destination and is idling there.
fn idle_at(city: &City, p: PassengerId, vertex: VertexId) -> bool {
    let passenger = city.passenger(p).unwrap();
    passenger.destination() == Some(vertex)
        && passenger.source() == Some(vertex)
        && passenger.bus().is_none()
}

#[derive(Default)]
struct Recorder {
    times: Vec<f64>,
    ended: bool,
}

impl CityObserver for Recorder {
    fn on_step(&mut self, _city: &City, now: SimTime) {
        self.times.push(now.0);
    }

    fn on_run_end(&mut self, _city: &City) {
        self.ended = true;
    }
}

// ── Route network ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod network {
    use super::*;

    #[test]
    fn new_route_is_a_two_stop_cycle() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let route = c.route(r).unwrap();

        assert!(route.has(v(0)) && route.has(v(1)));
        assert!(route.has_in_core(v(0)) && route.has_in_core(v(1)));
        assert_eq!(route.arcs().count(), 2);
        assert_eq!(route.core_vertices(), vec![v(0), v(1)]);

        let out = route.arc_from(v(0)).unwrap();
        assert_eq!(route.arc(out).unwrap().origin(), v(0));
        let back = route.next(out).unwrap();
        assert_eq!(route.arc(back).unwrap().origin(), v(1));
        assert_eq!(route.next(back), Some(out));
        assert_eq!(route.arc_weight(out, c.drive_graph()), 10.0);
        assert!(route.buses().is_empty());
    }

    #[test]
    fn route_creation_is_validated() {
        let mut c = city("ABC", &[(0, 1, 10.0)], &[]);
        assert!(matches!(c.add_route(v(0), v(0)), Err(SimError::RouteEndpointsIdentical(_))));
        assert!(matches!(c.add_route(v(0), v(2)), Err(SimError::MissingDriveEdge { .. })));
        assert!(matches!(c.add_route(v(0), v(9)), Err(SimError::VertexNotFound(_))));
        assert_eq!(c.routes().count(), 0);
    }

    #[test]
    fn patch_without_buses_disposes_bypassed_arc() {
        let mut c = city("ABC", &[(0, 1, 10.0), (0, 2, 4.0), (2, 1, 4.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        c.patch_route(r, &[v(0), v(2), v(1)]).unwrap();

        let route = c.route(r).unwrap();
        assert!(route.arc(ArcId(0)).is_none());
        assert_eq!(route.arcs().count(), 3);
        assert_eq!(route.core_vertices(), vec![v(0), v(2), v(1)]);
        assert!(route.has_in_core(v(2)));
    }

    #[test]
    fn bypassed_waypoint_is_disposed() {
        let mut c = city("ABC", &[(0, 1, 10.0), (0, 2, 4.0), (2, 1, 4.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        c.patch_route(r, &[v(0), v(2), v(1)]).unwrap();
        c.patch_route(r, &[v(0), v(1)]).unwrap();

        let route = c.route(r).unwrap();
        assert!(!route.has(v(2)));
        let live: Vec<ArcId> = route.arcs().map(|(id, _)| id).collect();
        assert_eq!(live, vec![ArcId(1), ArcId(4)]);
        assert_eq!(route.core_vertices(), vec![v(0), v(1)]);
    }

    #[test]
    fn occupied_arc_outlives_its_bypass() {
        let mut c = city("ABC", &[(0, 1, 10.0), (0, 2, 4.0), (2, 1, 4.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let bus = c.add_bus(r, v(0), None).unwrap();
        assert_eq!(c.bus(bus).unwrap().arc(), Some(ArcId(0)));

        c.patch_route(r, &[v(0), v(2), v(1)]).unwrap();
        {
            let route = c.route(r).unwrap();
            let old = route.arc(ArcId(0)).unwrap();
            assert!(old.source().is_none());
            assert!(old.buses().contains(&bus));
            assert_eq!(route.arcs().count(), 4);
        }

        // Arrives at B on the bypassed arc, then continues on the core.
        assert_eq!(c.step().unwrap(), SimTime(10.0));
        let route = c.route(r).unwrap();
        assert!(route.arc(ArcId(0)).is_none());
        assert_eq!(route.arcs().count(), 3);
        assert_eq!(c.bus(bus).unwrap().vertex(c.now()), Some(v(1)));

        // B → A, then onto the new A → C arc.
        assert_eq!(c.step().unwrap(), SimTime(20.0));
        assert_eq!(c.step().unwrap(), SimTime(24.0));
        assert_eq!(c.bus(bus).unwrap().vertex(c.now()), Some(v(2)));
    }

    #[test]
    fn patch_is_validated() {
        let mut c = city("ABCD", &[(0, 1, 10.0), (0, 2, 4.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        assert!(matches!(c.patch_route(r, &[]), Err(SimError::PatchTooShort(0))));
        assert!(matches!(c.patch_route(r, &[v(0)]), Err(SimError::PatchTooShort(1))));
        assert!(matches!(
            c.patch_route(r, &[v(0), v(2), v(0)]),
            Err(SimError::PatchEndpointsIdentical(_))
        ));
        assert!(matches!(
            c.patch_route(r, &[v(0), v(2)]),
            Err(SimError::PatchEndpointNotOnRoute { .. })
        ));
        assert!(matches!(
            c.patch_route(r, &[v(0), v(3), v(1)]),
            Err(SimError::MissingDriveEdge { .. })
        ));
        // Nothing changed.
        assert_eq!(c.route(r).unwrap().arcs().count(), 2);
    }

    #[test]
    fn occupied_waypoint_off_the_core() {
        let mut c = city("ABC", &[(0, 1, 10.0), (1, 2, 10.0), (2, 0, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        c.patch_route(r, &[v(1), v(2), v(0)]).unwrap();
        assert_eq!(c.route(r).unwrap().core_vertices(), vec![v(0), v(1), v(2)]);

        // Driving A → B while B is cut out of the loop.
        let bus = c.add_bus(r, v(0), None).unwrap();
        c.patch_route(r, &[v(0), v(2)]).unwrap();
        let route = c.route(r).unwrap();
        assert!(route.has(v(1)));
        assert!(!route.has_in_core(v(1)));
        assert!(route.has_in_core(v(0)) && route.has_in_core(v(2)));
        assert_eq!(route.core_vertices(), vec![v(0), v(2)]);
        assert!(matches!(
            c.patch_route(r, &[v(1), v(2)]),
            Err(SimError::PatchEndpointNotOnRoute { vertex, .. }) if vertex == v(1)
        ));

        // Reaching B releases it; the bus rejoins the core at C.
        assert_eq!(c.step().unwrap(), SimTime(10.0));
        assert!(!c.route(r).unwrap().has(v(1)));
        assert_eq!(c.step().unwrap(), SimTime(20.0));
        assert_eq!(c.bus(bus).unwrap().vertex(c.now()), Some(v(2)));
        let live: Vec<ArcId> = c.route(r).unwrap().arcs().map(|(id, _)| id).collect();
        assert_eq!(live, vec![ArcId(2), ArcId(4)]);
    }
}

// ── Buses ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod buses {
    use super::*;

    #[test]
    fn add_bus_is_validated() {
        let mut c = city("ABC", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        assert!(matches!(c.add_bus(r, v(2), None), Err(SimError::VertexNotOnRoute { .. })));
        assert!(matches!(c.add_bus(r, v(0), Some(0)), Err(SimError::ZeroCapacity)));
        assert!(matches!(
            c.add_bus(tn_core::RouteId(7), v(0), None),
            Err(SimError::RouteNotFound(_))
        ));
    }

    #[test]
    fn shuttles_between_stops() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let bus = c.add_bus(r, v(0), Some(3)).unwrap();

        let b = c.bus(bus).unwrap();
        assert_eq!(b.capacity(), 3);
        assert_eq!(b.route(), Some(r));
        assert_eq!(b.vertex(c.now()), Some(v(0)));
        assert_eq!(b.transit_delay(), Some(10.0));

        c.run_until(SimTime(5.0), &mut NoopObserver).unwrap();
        assert_eq!(c.now(), SimTime::ZERO);
        let b = c.bus(bus).unwrap();
        assert_eq!(b.vertex(SimTime(5.0)), None);
        assert_eq!(b.eta(SimTime(5.0)), Some(5.0));
        assert_eq!(b.progress(SimTime(5.0)), Some(0.5));

        assert_eq!(c.step().unwrap(), SimTime(10.0));
        assert_eq!(c.bus(bus).unwrap().vertex(c.now()), Some(v(1)));
    }

    #[test]
    fn eta_and_next_arrival() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let bus = c.add_bus(r, v(0), None).unwrap();

        // Parked at A with a free seat.
        assert_eq!(c.bus_eta(bus, v(0), 0.0), Some(0.0));
        assert_eq!(c.bus_eta(bus, v(1), 0.0), Some(10.0));
        // Next visit to A after the current one.
        assert_eq!(c.bus_eta(bus, v(0), 1.0), Some(20.0));
        assert_eq!(c.bus_eta(bus, v(1), 15.0), Some(30.0));
        assert_eq!(c.next_arrival(r, v(1), 0.0), Some((bus, 10.0)));
        assert_eq!(c.bus_eta(bus, v(0), f64::NAN), None);
    }

    #[test]
    fn stopped_bus_detaches_and_leaves_no_arrivals() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let bus = c.add_bus(r, v(0), None).unwrap();

        c.stop_bus(bus).unwrap();
        let b = c.bus(bus).unwrap();
        assert!(b.is_stopping());
        assert!(b.is_detached());
        assert_eq!(b.route(), None);
        assert!(c.route(r).unwrap().buses().is_empty());
        assert_eq!(c.next_arrival(r, v(1), 0.0), None);
        // An active route keeps its slot without buses.
        assert!(!c.route(r).unwrap().is_moribund());
    }
}

// ── Retirement ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod retirement {
    use super::*;

    #[test]
    fn empty_route_is_released_immediately() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        c.retire_route(r).unwrap();
        assert!(c.route(r).is_none());
        assert_eq!(c.routes().count(), 0);
        // The slot is reused.
        assert_eq!(c.add_route(v(0), v(1)).unwrap(), r);
    }

    #[test]
    fn buses_drain_one_by_one() {
        // A → B takes 10, B → A takes 20; a walker provides an event at t=5.
        let mut builder = CityBuilder::new(CityConfig::default());
        let (a, b, w) = (builder.vertex("A"), builder.vertex("B"), builder.vertex("W"));
        builder.add_drive_edge(a, b, UndirectedEdge::asymmetric(10.0, 20.0));
        builder.add_walk_edge(a, w, UndirectedEdge::new(5.0));
        let mut c = builder.build().unwrap();

        let r = c.add_route(a, b).unwrap();
        let first = c.add_bus(r, a, None).unwrap();
        let second = c.add_bus(r, b, None).unwrap();
        let walker = c.add_passenger("walker", Some(100.0), a).unwrap();
        c.assign_trip(walker, w).unwrap();
        assert_eq!(c.step().unwrap(), SimTime(5.0));

        c.retire_route(r).unwrap();
        let route = c.route(r).unwrap();
        assert!(route.is_moribund());
        assert_eq!(route.buses().len(), 2);
        assert_eq!(c.routes().count(), 1);
        assert!(matches!(c.patch_route(r, &[a, b]), Err(SimError::RouteRetired(_))));
        assert!(matches!(c.add_bus(r, a, None), Err(SimError::RouteRetired(_))));
        assert_eq!(c.next_arrival(r, b, 0.0), None);

        let mut remaining = 2;
        for _ in 0..10 {
            c.step().unwrap();
            let now = c.route(r).map_or(0, |route| route.buses().len());
            assert!(now <= remaining);
            assert_eq!(c.route(r).is_some(), now > 0);
            remaining = now;
            if remaining == 0 {
                break;
            }
        }
        assert_eq!(remaining, 0);
        assert_eq!(c.now(), SimTime(20.0));
        assert!(c.bus(first).unwrap().is_detached());
        assert!(c.bus(second).unwrap().is_detached());
    }

    #[test]
    fn riders_are_unloaded_at_the_next_stop() {
        // The walker reaches W at t=25, while the bus is between A and B.
        let mut c = city("ABW", &[(0, 1, 10.0)], &[(0, 2, 25.0)]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let bus = c.add_bus(r, v(0), None).unwrap();
        let p = c.add_passenger("ada", Some(1000.0), v(0)).unwrap();
        let walker = c.add_passenger("walker", Some(1000.0), v(0)).unwrap();
        c.assign_trip(p, v(1)).unwrap();
        c.assign_trip(walker, v(2)).unwrap();

        // Board at A (t=20..21), then retire while driving to B.
        while c.passenger(p).unwrap().bus().is_none() {
            c.step().unwrap();
        }
        assert_eq!(c.now(), SimTime(21.0));
        assert_eq!(c.step().unwrap(), SimTime(25.0));
        assert_eq!(c.bus(bus).unwrap().vertex(c.now()), None);
        c.retire_route(r).unwrap();
        assert_eq!(c.passenger(p).unwrap().immediate_destination(), Some(v(1)));

        c.run_until(SimTime(40.0), &mut NoopObserver).unwrap();
        assert!(c.route(r).is_none());
        assert!(c.bus(bus).unwrap().is_detached());
        assert!(c.passenger(p).unwrap().bus().is_none());
        assert!(idle_at(&c, p, v(1)));
    }

    #[test]
    fn retired_just_after_boarding_unloads_in_place() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let bus = c.add_bus(r, v(0), Some(1)).unwrap();
        let p = c.add_passenger("ada", Some(1000.0), v(0)).unwrap();
        c.assign_trip(p, v(1)).unwrap();
        while c.passenger(p).unwrap().bus().is_none() {
            c.step().unwrap();
        }
        assert_eq!(c.now(), SimTime(21.0));
        // Boarding is done and the bus has committed to leaving A.
        assert_eq!(c.bus(bus).unwrap().transit_delay(), Some(10.0));

        c.retire_route(r).unwrap();
        let b = c.bus(bus).unwrap();
        assert_eq!(b.alighting_passenger(), Some(p));
        assert_eq!(b.vertex(SimTime(21.5)), Some(v(0)));
        assert_eq!(b.eta(SimTime(21.5)), None);
        assert_eq!(b.progress(SimTime(21.5)), None);
        assert!(c.passenger(p).unwrap().is_alighting());

        assert_eq!(c.step().unwrap(), SimTime(22.0));
        assert!(c.bus(bus).unwrap().is_detached());
        assert!(c.route(r).is_none());
        let passenger = c.passenger(p).unwrap();
        assert_eq!(passenger.bus(), None);
        assert_eq!(passenger.vertex(c.now()), Some(v(0)));
        assert_eq!(c.pending_events(), 1);
    }
}

// ── Passengers ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod passengers {
    use super::*;

    #[test]
    fn add_passenger_is_validated() {
        let mut c = city("AB", &[], &[]);
        assert!(matches!(
            c.add_passenger("x", Some(0.0), v(0)),
            Err(SimError::InvalidDuration { .. })
        ));
        assert!(matches!(c.add_passenger("x", None, v(5)), Err(SimError::VertexNotFound(_))));
    }

    #[test]
    fn walks_to_destination_then_idles() {
        let mut c = city("AB", &[], &[(0, 1, 7.0)]);
        let p = c.add_passenger("ada", Some(10.0), v(0)).unwrap();
        c.assign_trip(p, v(1)).unwrap();

        let passenger = c.passenger(p).unwrap();
        assert_eq!(passenger.name(), "ada");
        assert_eq!(passenger.vertex(c.now()), Some(v(0)));
        assert_eq!(passenger.immediate_destination(), Some(v(1)));
        assert_eq!(passenger.eta(c.now()), Some(7.0));
        assert_eq!(passenger.walking_source(), Some(v(0)));
        assert_eq!(passenger.vertex(SimTime(1.0)), None);

        assert_eq!(c.step().unwrap(), SimTime(7.0));
        let passenger = c.passenger(p).unwrap();
        assert_eq!(passenger.vertex(c.now()), Some(v(1)));
        assert!(idle_at(&c, p, v(1)));
        assert_eq!(c.vertex(v(1)).unwrap().passengers(), &[p]);
        assert!(c.vertex(v(0)).unwrap().passengers().is_empty());

        // Idling is a walk in place.
        let passenger = c.passenger(p).unwrap();
        assert_eq!(passenger.walking_source(), None);
        assert_eq!(passenger.transit_delay(), Some(10.0));
    }

    #[test]
    fn unreachable_destination_idles_in_place() {
        let mut c = city("AB", &[], &[]);
        let p = c.add_passenger("ada", Some(10.0), v(0)).unwrap();
        c.assign_trip(p, v(1)).unwrap();
        let passenger = c.passenger(p).unwrap();
        assert_eq!(passenger.plan().len(), 1);
        assert_eq!(passenger.immediate_destination(), Some(v(0)));
        assert_eq!(passenger.duration(), Some(10.0));
    }

    #[test]
    fn single_route_trip() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let bus = c.add_bus(r, v(0), Some(1)).unwrap();
        let p = c.add_passenger("ada", None, v(0)).unwrap();
        c.assign_trip(p, v(1)).unwrap();
        assert!(c.passenger(p).unwrap().is_waiting_for(r));

        let mut states = Vec::new();
        for _ in 0..5 {
            let now = c.step().unwrap();
            let passenger = c.passenger(p).unwrap();
            assert!(
                passenger.vertex(now).is_none() || passenger.bus().is_none(),
                "on a bus and at a vertex at {now}"
            );
            let state = if passenger.is_boarding() {
                "boarding"
            } else if passenger.is_alighting() {
                "alighting"
            } else if passenger.bus().is_some() {
                "riding"
            } else if idle_at(&c, p, v(1)) {
                "idle"
            } else {
                "waiting"
            };
            states.push((now.0, state));
        }
        assert_eq!(
            states,
            vec![
                (10.0, "waiting"),
                (20.0, "boarding"),
                (21.0, "riding"),
                (31.0, "alighting"),
                (32.0, "idle"),
            ]
        );
        assert_eq!(c.passenger(p).unwrap().vertex(c.now()), Some(v(1)));
        assert_eq!(c.bus(bus).unwrap().passengers(), &[None]);
    }

    #[test]
    fn boarding_reserves_a_seat() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        let bus = c.add_bus(r, v(0), Some(2)).unwrap();
        let p = c.add_passenger("ada", Some(1000.0), v(0)).unwrap();
        c.assign_trip(p, v(1)).unwrap();

        c.step().unwrap();
        assert_eq!(c.step().unwrap(), SimTime(20.0));
        let b = c.bus(bus).unwrap();
        assert_eq!(b.boarding_index(), Some(0));
        assert_eq!(b.boarding_passenger(), Some(p));
        assert_eq!(c.passenger(p).unwrap().boarding_eta(c.now()), Some(1.0));

        assert_eq!(c.step().unwrap(), SimTime(21.0));
        let b = c.bus(bus).unwrap();
        assert_eq!(b.boarding_index(), None);
        assert_eq!(b.passengers(), &[Some(p), None]);
    }

    #[test]
    fn full_bus_serves_riders_in_turn() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        c.add_bus(r, v(0), Some(1)).unwrap();
        let first = c.add_passenger("ada", Some(1000.0), v(0)).unwrap();
        let second = c.add_passenger("bob", Some(1000.0), v(0)).unwrap();
        c.assign_trip(first, v(1)).unwrap();
        c.assign_trip(second, v(1)).unwrap();

        c.run_until(SimTime(40.0), &mut NoopObserver).unwrap();
        assert!(idle_at(&c, first, v(1)));
        assert!(c.passenger(second).unwrap().is_waiting_for(r));

        c.run_until(SimTime(60.0), &mut NoopObserver).unwrap();
        assert!(idle_at(&c, second, v(1)));
    }

    #[test]
    fn transfers_between_routes() {
        let mut c = city("ABC", &[(0, 1, 10.0), (1, 2, 10.0)], &[]);
        let first = c.add_route(v(0), v(1)).unwrap();
        let second = c.add_route(v(1), v(2)).unwrap();
        c.add_bus(first, v(0), None).unwrap();
        c.add_bus(second, v(1), None).unwrap();
        let p = c.add_passenger("ada", Some(1000.0), v(0)).unwrap();
        c.assign_trip(p, v(2)).unwrap();

        let plan: Vec<_> = c.passenger(p).unwrap().plan().iter().map(|s| (s.route, s.vertex)).collect();
        assert_eq!(plan, vec![(Some(first), v(1)), (Some(second), v(2))]);

        c.run_until(SimTime(100.0), &mut NoopObserver).unwrap();
        assert!(idle_at(&c, p, v(2)));
    }

    #[test]
    fn random_trips_are_reproducible() {
        fn run(seed: u64) -> Vec<(Option<VertexId>, Option<VertexId>)> {
            let config = CityConfig { seed, ..CityConfig::default() };
            let mut builder = CityBuilder::new(config);
            let ids: Vec<VertexId> = ["A", "B", "C", "D"].iter().map(|n| builder.vertex(n)).collect();
            for pair in ids.windows(2) {
                builder.add_walk_edge(pair[0], pair[1], UndirectedEdge::new(3.0));
            }
            builder.add_drive_edge(ids[0], ids[3], UndirectedEdge::new(5.0));
            let mut c = builder.build().unwrap();
            let r = c.add_route(ids[0], ids[3]).unwrap();
            c.add_bus(r, ids[0], Some(2)).unwrap();
            let people: Vec<PassengerId> = (0..4)
                .map(|i| c.add_passenger(format!("p{i}"), Some(2.0), ids[i]).unwrap())
                .collect();
            c.run_until(SimTime(200.0), &mut NoopObserver).unwrap();
            people
                .iter()
                .map(|&p| {
                    let passenger = c.passenger(p).unwrap();
                    (passenger.source(), passenger.destination())
                })
                .collect()
        }
        assert_eq!(run(7), run(7));
    }
}

// ── Event loop ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod event_loop {
    use super::*;

    #[test]
    fn run_until_reports_each_step() {
        let mut c = city("AB", &[(0, 1, 10.0)], &[]);
        let r = c.add_route(v(0), v(1)).unwrap();
        c.add_bus(r, v(0), None).unwrap();

        let mut recorder = Recorder::default();
        let end = c.run_until(SimTime(35.0), &mut recorder).unwrap();
        assert_eq!(recorder.times, vec![10.0, 20.0, 30.0]);
        assert!(recorder.ended);
        assert_eq!(end, SimTime(30.0));
        assert_eq!(c.pending_events(), 1);
    }

    #[test]
    fn empty_city_does_not_advance() {
        let mut c = city("A", &[], &[]);
        assert_eq!(c.step().unwrap(), SimTime::ZERO);
        let mut recorder = Recorder::default();
        c.run_until(SimTime(100.0), &mut recorder).unwrap();
        assert!(recorder.times.is_empty());
        assert!(recorder.ended);
    }
}

// ── Builder & loader ──────────────────────────────────────────────────────────

#[cfg(test)]
mod loading {
    use super::*;

    const CSV: &str = "\
from,to,weight,mode,reverse_weight
Market,Harbour,10,drive,
Market,Harbour,15,walk,
Harbour,Hill,6,drive,9
";

    #[test]
    fn loads_vertices_and_edges() {
        let builder = load_city_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(builder.vertex_count(), 3);
        let c = builder.build().unwrap();

        let market = c.vertex_by_name("Market").unwrap();
        let harbour = c.vertex_by_name("Harbour").unwrap();
        let hill = c.vertex_by_name("Hill").unwrap();
        assert_eq!(hill, VertexId(2));
        assert_eq!(c.vertex(hill).unwrap().name(), "Hill");

        let drive = c.drive_graph();
        assert_eq!(drive.edge(&harbour, &hill).map(Weighted::weight), Some(6.0));
        assert_eq!(drive.edge(&hill, &harbour).map(Weighted::weight), Some(9.0));
        assert_eq!(drive.edge(&market, &harbour).map(Weighted::weight), Some(10.0));
        assert_eq!(c.walk_graph().edge(&harbour, &market).map(Weighted::weight), Some(15.0));
        assert!(c.walk_graph().edge(&harbour, &hill).is_none());
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let csv = "from,to,weight,mode\nA,B,3,fly\n";
        assert!(matches!(load_city_reader(Cursor::new(csv)), Err(SimError::Parse(_))));
    }

    #[test]
    fn bad_weight_is_a_parse_error() {
        let csv = "from,to,weight,mode\nA,B,soon,walk\n";
        assert!(matches!(load_city_reader(Cursor::new(csv)), Err(SimError::Parse(_))));
    }

    #[test]
    fn builder_rejects_bad_input() {
        let mut builder = CityBuilder::new(CityConfig::default());
        let a = builder.vertex("A");
        let b = builder.vertex("B");
        assert_eq!(builder.vertex("A"), a);
        builder.add_walk_edge(a, b, UndirectedEdge::new(0.0));
        assert!(matches!(builder.build(), Err(SimError::InvalidDuration { .. })));

        let mut builder = CityBuilder::new(CityConfig::default());
        let a = builder.vertex("A");
        builder.add_drive_edge(a, VertexId(3), UndirectedEdge::new(1.0));
        assert!(matches!(builder.build(), Err(SimError::VertexNotFound(_))));

        let config = CityConfig { loading_delay: -1.0, ..CityConfig::default() };
        assert!(matches!(CityBuilder::new(config).build(), Err(SimError::Core(_))));
    }

    #[test]
    fn duplicate_edge_is_a_graph_error() {
        let mut builder = CityBuilder::new(CityConfig::default());
        let a = builder.vertex("A");
        let b = builder.vertex("B");
        builder.add_drive_edge(a, b, UndirectedEdge::new(1.0));
        builder.add_drive_edge(b, a, UndirectedEdge::new(2.0));
        assert!(matches!(builder.build(), Err(SimError::Graph(_))));
    }
}

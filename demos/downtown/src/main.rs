//! downtown — a small transit network driven end to end.
//!
//! Five stops, three shuttle routes, a handful of passengers choosing random
//! destinations.  Halfway through, the hill route is retired and its buses
//! drain off the network.
//!
//! ```text
//! downtown [config.json] [edges.csv]
//! ```
//!
//! Set `RUST_LOG=tn_sim=debug` (or `trace`) to follow individual agents.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use tn_core::{CityConfig, SimTime, VertexId};
use tn_sim::{City, CityObserver, load_city_csv, load_city_reader};

// ── Constants ─────────────────────────────────────────────────────────────────

const PASSENGER_COUNT: usize = 12;
const RETIRE_AT:       f64   = 200.0;
const END_AT:          f64   = 400.0;
const REPORT_EVERY:    usize = 50; // steps between progress lines

const EDGES_CSV: &str = "\
from,to,weight,mode,reverse_weight\n\
Market,Harbour,8,drive,\n\
Market,Station,4,drive,\n\
Station,Harbour,5,drive,\n\
Harbour,Hill,6,drive,9\n\
Hill,Park,7,drive,\n\
Market,Station,10,walk,\n\
Station,Harbour,12,walk,\n\
Harbour,Hill,20,walk,\n\
Hill,Park,9,walk,\n\
Park,Market,25,walk,\n\
";

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ProgressObserver {
    steps: usize,
}

impl CityObserver for ProgressObserver {
    fn on_step(&mut self, city: &City, now: SimTime) {
        self.steps += 1;
        if self.steps % REPORT_EVERY == 0 {
            let riding = city.passengers().filter(|(_, p)| p.bus().is_some()).count();
            println!(
                "  {now}  routes: {}  riding: {riding}/{PASSENGER_COUNT}  pending events: {}",
                city.routes().count(),
                city.pending_events(),
            );
        }
    }

    fn on_run_end(&mut self, city: &City) {
        println!("  run ended at {} after {} steps", city.now(), self.steps);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "downtown=info,tn_sim=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);

    // 1. Configuration.
    let config = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<CityConfig>(&text).with_context(|| format!("parsing {path}"))?
        }
        None => CityConfig::default(),
    };
    println!("=== downtown — transit network simulation ===");
    println!(
        "Seed: {}  |  Capacity: {}  |  Passengers: {PASSENGER_COUNT}",
        config.seed, config.default_capacity
    );

    // 2. Network.
    let builder = match args.next() {
        Some(path) => load_city_csv(Path::new(&path))?,
        None => load_city_reader(Cursor::new(EDGES_CSV))?,
    };
    let mut city = builder.config(config).build()?;
    println!("Network: {} stops", city.vertex_count());

    let stop = |name: &str| -> Result<VertexId> {
        city.vertex_by_name(name).with_context(|| format!("no stop named {name}"))
    };
    let (market, harbour, hill, station, park) =
        (stop("Market")?, stop("Harbour")?, stop("Hill")?, stop("Station")?, stop("Park")?);

    // 3. Routes and buses.
    let waterfront = city.add_route(market, harbour)?;
    city.patch_route(waterfront, &[market, station, harbour])?;
    let uphill = city.add_route(harbour, hill)?;
    let parkway = city.add_route(hill, park)?;

    city.add_bus(waterfront, market, Some(4))?;
    city.add_bus(waterfront, harbour, Some(4))?;
    city.add_bus(uphill, harbour, None)?;
    city.add_bus(uphill, hill, None)?;
    city.add_bus(parkway, park, Some(2))?;
    for route in city.routes() {
        info!(route = %route.id(), stops = ?route.core_vertices(), "route ready");
    }

    // 4. Passengers, spread over all stops.
    let stops = [market, harbour, hill, station, park];
    for i in 0..PASSENGER_COUNT {
        city.add_passenger(format!("rider-{i}"), None, stops[i % stops.len()])?;
    }

    // 5. Run, retire the hill shuttle, run again.
    let mut observer = ProgressObserver::default();
    println!("\nRunning to t={RETIRE_AT}...");
    city.run_until(SimTime(RETIRE_AT), &mut observer)?;

    city.retire_route(uphill)?;
    println!("\nRetired {uphill}; running to t={END_AT}...");
    city.run_until(SimTime(END_AT), &mut observer)?;

    // 6. Summary.
    println!("\nFinal state:");
    for (id, bus) in city.buses() {
        match bus.route() {
            Some(route) => println!("  {id}: {route}, {} seats", bus.capacity()),
            None => println!("  {id}: detached"),
        }
    }
    for (id, passenger) in city.passengers() {
        let place = match (passenger.vertex(city.now()), passenger.bus()) {
            (Some(v), _) => format!("at {}", city.vertex(v).map_or("?", |v| v.name())),
            (None, Some(bus)) => format!("riding {bus}"),
            (None, None) => "walking".to_owned(),
        };
        println!("  {id} ({}): {place}", passenger.name());
    }
    if city.route(uphill).is_none() {
        println!("{uphill} fully withdrawn");
    }

    Ok(())
}

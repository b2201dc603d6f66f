//! `tn-sim` — the transit city.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`city`]     | `City` (entity arenas, public API, agent dispatch)           |
//! | [`network`]  | `Route`, `Waypoint`, `Arc`: live-mutable route cycles       |
//! | [`bus`]      | `Bus`, `BusEffect`, ETA queries                              |
//! | [`passenger`]| `Passenger`, `PassengerEffect`, trip planning entry points   |
//! | [`planner`]  | `PlanningVertex`, `PlanningGraph`                            |
//! | [`vertex`]   | `Vertex`                                                     |
//! | [`builder`]  | `CityBuilder`                                                |
//! | [`loader`]   | `load_city_csv`, `load_city_reader`                          |
//! | [`observer`] | `CityObserver`, `NoopObserver`                               |
//! | [`error`]    | `SimError`, `SimResult<T>`                                   |
//!
//! # Driving a city
//!
//! ```rust,ignore
//! let mut city = load_city_csv(path)?.config(config).build()?;
//! let route = city.add_route(a, b)?;
//! city.add_bus(route, a, None)?;
//! city.add_passenger("ada", None, a)?;
//! city.run_until(SimTime(600.0), &mut NoopObserver)?;
//! ```
//!
//! Everything is single-threaded and deterministic for a given
//! `CityConfig::seed` and call sequence.

pub mod builder;
pub mod bus;
pub mod city;
pub mod error;
pub mod loader;
pub mod network;
pub mod observer;
pub mod passenger;
pub mod planner;
pub mod vertex;

#[cfg(test)]
mod tests;

pub use builder::CityBuilder;
pub use bus::{Bus, BusEffect};
pub use city::{AgentRef, City, DriveGraph, Effect, WalkGraph};
pub use error::{SimError, SimResult};
pub use loader::{load_city_csv, load_city_reader};
pub use network::{Arc, Route, Waypoint};
pub use observer::{CityObserver, NoopObserver};
pub use passenger::{Passenger, PassengerEffect};
pub use planner::{PlanningGraph, PlanningVertex};
pub use vertex::Vertex;

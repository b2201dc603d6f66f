//! `tn-core` — foundational types for the transit network simulation.
//!
//! This crate is a dependency of every other `tn-*` crate.  It has no `tn-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`ids`]    | `VertexId`, `RouteId`, `ArcId`, `WaypointId`, `BusId`, `PassengerId` |
//! | [`time`]   | `SimTime`: virtual (logical) simulation time              |
//! | [`rng`]    | `SimRng`: seeded simulation-level RNG                     |
//! | [`config`] | `CityConfig`: fleet and passenger defaults                |
//! | [`error`]  | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::CityConfig;
pub use error::{CoreError, CoreResult};
pub use ids::{ArcId, BusId, PassengerId, RouteId, VertexId, WaypointId};
pub use rng::SimRng;
pub use time::SimTime;

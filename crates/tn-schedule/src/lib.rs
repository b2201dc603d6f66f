//! `tn-schedule` — the discrete-event kernel.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`queue`]     | `PriorityQueue`: live-metric, insertion-stable min queue |
//! | [`scheduler`] | `EventScheduler`, `EventId`                               |
//! | [`agent`]     | `Decision`, `Agent`, `AgentHost`, `restart`, `step`       |
//! | [`error`]     | `ScheduleError`, `ScheduleResult<T>`                      |
//!
//! # Event model (summary)
//!
//! ```text
//! restart(agent):  cancel agent's pending event
//!                  decision = decide(agent)
//!                  if decision: schedule (agent, effect) at now + delay
//!
//! step():          pop earliest event, now = its time
//!                  apply(effect); restart(agent)
//!                  keep popping while event.time <= now
//! ```
//!
//! Agents never block.  All waiting is "schedule something later", and an
//! agent with nothing to do simply has no pending event until someone calls
//! `restart` on it.

pub mod agent;
pub mod error;
pub mod queue;
pub mod scheduler;


pub use agent::{restart, step, Agent, AgentHost, Decision};
pub use error::{ScheduleError, ScheduleResult};
pub use queue::PriorityQueue;
pub use scheduler::{EventId, EventScheduler};

//! The agent restart protocol.
//!
//! An agent is anything that repeatedly decides "in `delay` time units, do
//! `effect`".  The host (the world that owns the agents and the scheduler)
//! keeps at most one pending event per agent.  Whenever the world changes in
//! a way that could invalidate an agent's intent, the host calls
//! [`restart`] on it: the pending event is cancelled and the agent decides
//! afresh from the current state.
//!
//! Events carry `(agent, effect)` as plain data rather than closures, so
//! firing one is a call back into the host with full `&mut` access.

use std::fmt::Debug;

use tn_core::SimTime;

use crate::{EventId, EventScheduler, ScheduleError};

/// "After `delay`, apply `effect`."
#[derive(Clone, Debug, PartialEq)]
pub struct Decision<E> {
    pub delay:  f64,
    pub effect: E,
}

impl<E> Decision<E> {
    pub fn new(delay: f64, effect: E) -> Self {
        Self { delay, effect }
    }
}

/// Decision logic of one kind of agent living in world `W`.
///
/// Implementations take the whole world mutably because deciding often moves
/// other entities (a bus seating a passenger, a passenger leaving a vertex).
pub trait Agent<W> {
    type Id: Copy;
    type Effect;
    type Error;

    /// What to do next, or `None` to go dormant until restarted.
    fn decide(world: &mut W, id: Self::Id) -> Result<Option<Decision<Self::Effect>>, Self::Error>;

    /// Carry out a previously decided effect.
    fn apply(world: &mut W, id: Self::Id, effect: Self::Effect) -> Result<(), Self::Error>;
}

/// A world that owns an [`EventScheduler`] and dispatches agents.
pub trait AgentHost {
    type Agent: Copy + Debug;
    type Effect;
    type Error: From<ScheduleError>;

    fn scheduler(&self) -> &EventScheduler<(Self::Agent, Self::Effect)>;
    fn scheduler_mut(&mut self) -> &mut EventScheduler<(Self::Agent, Self::Effect)>;

    /// The agent's pending-event slot.
    fn pending_event(&mut self, agent: Self::Agent) -> &mut Option<EventId>;

    fn decide(&mut self, agent: Self::Agent)
    -> Result<Option<Decision<Self::Effect>>, Self::Error>;

    fn apply(&mut self, agent: Self::Agent, effect: Self::Effect) -> Result<(), Self::Error>;
}

/// Cancel `agent`'s pending event and let it decide again.
///
/// Starting an agent is its first restart.  A decision with a non-positive
/// delay is due immediately: its effect is applied in place and the agent
/// decides again, since the scheduler only accepts strictly future events.
pub fn restart<H: AgentHost>(host: &mut H, agent: H::Agent) -> Result<(), H::Error> {
    if let Some(id) = host.pending_event(agent).take() {
        host.scheduler_mut().remove_event(id);
    }
    while let Some(Decision { delay, effect }) = host.decide(agent)? {
        if delay <= 0.0 {
            host.apply(agent, effect)?;
            continue;
        }
        let at = host.scheduler().now() + delay;
        let id = host.scheduler_mut().add_event(at, (agent, effect))?;
        *host.pending_event(agent) = Some(id);
        break;
    }
    Ok(())
}

/// Advance to the next event time, firing everything due then.
///
/// Firing means `apply(effect)` followed by `restart(agent)`.  Returns the
/// new current time (unchanged if nothing is pending).
pub fn step<H: AgentHost>(host: &mut H) -> Result<SimTime, H::Error> {
    let Some(first) = host.scheduler_mut().pop_due(None) else {
        return Ok(host.scheduler().now());
    };
    fire(host, first)?;
    let now = host.scheduler().now();
    while let Some(event) = host.scheduler_mut().pop_due(Some(now)) {
        fire(host, event)?;
    }
    Ok(now)
}

fn fire<H: AgentHost>(host: &mut H, (agent, effect): (H::Agent, H::Effect)) -> Result<(), H::Error> {
    *host.pending_event(agent) = None;
    host.apply(agent, effect)?;
    restart(host, agent)
}

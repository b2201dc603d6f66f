//! The simulation clock plus its pending events.
//!
//! Events are kept in a `BTreeMap` keyed by `(time, sequence)`.  The
//! sequence number is a per-scheduler counter, so two events at the same time
//! fire in the order they were added, and an [`EventId`] is simply the key,
//! which makes cancellation a single O(log n) removal.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use tracing::trace;

use tn_core::SimTime;

use crate::{ScheduleError, ScheduleResult};

/// Handle to a pending event, returned by [`EventScheduler::add_event`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EventId {
    time: OrderedFloat<f64>,
    seq:  u64,
}

impl EventId {
    /// The time the event is (or was) due.
    pub fn time(self) -> SimTime {
        SimTime(self.time.0)
    }
}

/// Discrete-event queue over payloads of type `E`.
pub struct EventScheduler<E> {
    now:      SimTime,
    next_seq: u64,
    events:   BTreeMap<EventId, E>,
}

impl<E> Default for EventScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventScheduler<E> {
    pub fn new() -> Self {
        Self { now: SimTime::ZERO, next_seq: 0, events: BTreeMap::new() }
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `payload` at absolute time `at`.
    ///
    /// `at` must be finite and strictly later than [`now`](Self::now).
    pub fn add_event(&mut self, at: SimTime, payload: E) -> ScheduleResult<EventId> {
        if !at.is_finite() {
            return Err(ScheduleError::NonFinite(at));
        }
        if at <= self.now {
            return Err(ScheduleError::NotInFuture { at, now: self.now });
        }
        let id = EventId { time: OrderedFloat(at.0), seq: self.next_seq };
        self.next_seq += 1;
        self.events.insert(id, payload);
        trace!(%at, seq = id.seq, "event scheduled");
        Ok(id)
    }

    /// Cancel a pending event.  Returns its payload, or `None` if it already
    /// fired or was cancelled.
    pub fn remove_event(&mut self, id: EventId) -> Option<E> {
        let payload = self.events.remove(&id);
        if payload.is_some() {
            trace!(at = %id.time(), seq = id.seq, "event cancelled");
        }
        payload
    }

    /// Pop the earliest event if it is due no later than `horizon` (any event
    /// when `horizon` is `None`) and advance `now` to its time.
    pub fn pop_due(&mut self, horizon: Option<SimTime>) -> Option<E> {
        let (&id, _) = self.events.first_key_value()?;
        if horizon.is_some_and(|h| id.time() > h) {
            return None;
        }
        let payload = self.events.remove(&id)?;
        self.now = id.time();
        trace!(at = %self.now, seq = id.seq, "event fired");
        Some(payload)
    }

    /// Fire the earliest pending event, then every event due at the same
    /// instant (including ones `fire` adds for that instant's successors).
    ///
    /// Returns the new current time; with nothing pending, `now` is
    /// unchanged.
    pub fn step(&mut self, mut fire: impl FnMut(&mut Self, E)) -> SimTime {
        let Some(first) = self.pop_due(None) else {
            return self.now;
        };
        fire(self, first);
        let now = self.now;
        while let Some(payload) = self.pop_due(Some(now)) {
            fire(self, payload);
        }
        now
    }

    /// Time of the earliest pending event.
    pub fn next_time(&self) -> Option<SimTime> {
        self.events.keys().next().map(|id| id.time())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

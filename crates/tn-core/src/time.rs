//! Simulation time model.
//!
//! # Design
//!
//! Time is purely logical: a non-negative `f64` that only ever moves forward
//! when the event scheduler fires the next pending event.  There is no
//! mapping to wall-clock time; drivers that animate the simulation decide
//! how fast virtual time should appear to pass.
//!
//! Durations (delays, edge weights, ETAs) are plain `f64`.  `SimTime` is the
//! absolute instant; `SimTime - SimTime` yields a duration and
//! `SimTime + f64` yields a later instant.

use std::fmt;

/// An absolute instant of virtual simulation time.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.3}", self.0)
    }
}

//! City-wide simulation configuration.

use crate::{CoreError, CoreResult};

/// Defaults applied to buses and passengers created without explicit values,
/// plus the master RNG seed.
///
/// Typically loaded from a JSON file by the application crate and handed to
/// the city builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CityConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Seats on a bus added with `City::add_bus`.
    pub default_capacity: usize,

    /// Virtual time a passenger needs to board.
    pub loading_delay: f64,

    /// Virtual time a passenger needs to alight.
    pub unloading_delay: f64,

    /// How long a passenger lingers at a destination before choosing a new
    /// trip.
    pub inactive_time: f64,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            seed:             42,
            default_capacity: 1,
            loading_delay:    1.0,
            unloading_delay:  1.0,
            inactive_time:    10.0,
        }
    }
}

impl CityConfig {
    /// Reject values that would stall the event scheduler (zero or negative
    /// delays never produce a future event).
    pub fn validate(&self) -> CoreResult<()> {
        if self.default_capacity == 0 {
            return Err(CoreError::Config("default_capacity must be at least 1".into()));
        }
        for (name, value) in [
            ("loading_delay", self.loading_delay),
            ("unloading_delay", self.unloading_delay),
            ("inactive_time", self.inactive_time),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::Config(format!(
                    "{name} must be a positive finite duration, got {value}"
                )));
            }
        }
        Ok(())
    }
}

//! Observer trait for progress reporting and data collection.

use tn_core::SimTime;

use crate::City;

/// Callbacks invoked by [`City::run_until`].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: boarding counter
///
/// ```rust,ignore
/// struct Boardings(usize);
///
/// impl CityObserver for Boardings {
///     fn on_step(&mut self, city: &City, _now: SimTime) {
///         self.0 += city.buses().filter(|(_, b)| b.boarding_passenger().is_some()).count();
///     }
/// }
/// ```
pub trait CityObserver {
    /// Called after every event time has been fully processed.
    fn on_step(&mut self, _city: &City, _now: SimTime) {}

    /// Called once when `run_until` reaches its horizon.
    fn on_run_end(&mut self, _city: &City) {}
}

/// A [`CityObserver`] that does nothing.
pub struct NoopObserver;

impl CityObserver for NoopObserver {}

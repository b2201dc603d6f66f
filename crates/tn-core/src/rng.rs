//! Deterministic simulation-level RNG.
//!
//! The only stochastic decision in the simulation is a passenger picking a
//! fresh destination once a trip is over.  All such draws go through one
//! `SimRng` owned by the city and seeded from `CityConfig::seed`, so the same
//! seed and the same sequence of API calls always reproduce the same run.

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Simulation-level RNG for global operations.
///
/// Used only in the single-threaded simulation loop; no synchronisation.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}

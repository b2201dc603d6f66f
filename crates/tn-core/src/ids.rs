//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into arena `Vec`s via `id.0 as usize`, but callers should
//! prefer the `.index()` helper for clarity.
//!
//! `ArcId` and `WaypointId` are route-local: they index the arenas owned by
//! one `Route` and mean nothing outside it.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a physical location (stop / intersection) in the city.
    pub struct VertexId(u32);
}

typed_id! {
    /// Slot of a route in the city's sparse route array.  Slots of retired
    /// routes are reused by later routes.
    pub struct RouteId(u32);
}

typed_id! {
    /// Route-local index of a directed hop between two waypoints.
    pub struct ArcId(u32);
}

typed_id! {
    /// Route-local index of a waypoint (a route's view of a vertex).
    pub struct WaypointId(u32);
}

typed_id! {
    /// Index of a bus in the city's fleet.
    pub struct BusId(u32);
}

typed_id! {
    /// Index of a passenger in the city's population.
    pub struct PassengerId(u32);
}

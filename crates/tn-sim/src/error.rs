use thiserror::Error;

use tn_core::{BusId, CoreError, PassengerId, RouteId, VertexId};
use tn_graph::GraphError;
use tn_schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("route {0} not found")]
    RouteNotFound(RouteId),

    #[error("route {0} has been retired")]
    RouteRetired(RouteId),

    #[error("route endpoints must differ, got {0} twice")]
    RouteEndpointsIdentical(VertexId),

    #[error("a patch needs at least two vertices, got {0}")]
    PatchTooShort(usize),

    #[error("patch starts and ends at the same vertex {0}")]
    PatchEndpointsIdentical(VertexId),

    #[error("patch endpoint {vertex} is not in the core of route {route}")]
    PatchEndpointNotOnRoute { route: RouteId, vertex: VertexId },

    #[error("no drive edge with positive finite weight from {from} to {to}")]
    MissingDriveEdge { from: VertexId, to: VertexId },

    #[error("vertex {vertex} is not on route {route}")]
    VertexNotOnRoute { route: RouteId, vertex: VertexId },

    #[error("vertex {0} not found")]
    VertexNotFound(VertexId),

    #[error("bus {0} not found")]
    BusNotFound(BusId),

    #[error("passenger {0} not found")]
    PassengerNotFound(PassengerId),

    #[error("bus capacity must be at least 1")]
    ZeroCapacity,

    #[error("{what} must be positive and finite, got {value}")]
    InvalidDuration { what: &'static str, value: f64 },

    #[error("city parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;

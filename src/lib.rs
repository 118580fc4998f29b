//! Road corridors described by a cubic-spline reference line and two lateral
//! boundaries, with conversions between Cartesian and Frenet coordinates.
//!
//! A [Corridor] models one continuous drivable strip. Several corridors can be
//! chained into a [CorridorSequence], which exposes a single longitudinal axis
//! across all of them. Corridors are usually owned by a [CorridorNetwork],
//! which connects them and searches for routes through them.

pub use cgmath;
pub use corridor::{Boundaries, BoundaryDistances, CartesianPolylines, Corridor, CorridorAttributes};
pub use error::{CorridorError, Result};
pub use frenet::{CartesianState, FrenetFrame, FrenetPoint, FrenetPositionWithFrame, FrenetState};
pub use network::{CorridorNetwork, CorridorPath, CorridorPaths};
pub use polyline::FrenetPolyline;
pub use sequence::{CorridorSequence, SequencePosition};
pub use slotmap::{Key, KeyData};
pub use spline::CubicSpline;
pub use util::Interval;

mod corridor;
mod error;
mod frenet;
pub mod math;
mod network;
mod polyline;
mod sequence;
mod spline;
mod util;

slotmap::new_key_type! {
    /// Unique ID of a [Corridor].
    pub struct CorridorId;
}

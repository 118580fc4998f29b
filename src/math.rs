//! Mathematical structs and functions.

use cgmath::{Point2, Vector2};
pub use cubic::CubicFn;
pub use curve::{nearest_point_on_interval, sample_stations, OffsetCurve, ParametricCurve2d};
pub use util::*;

mod cubic;
mod curve;
mod util;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

use crate::error::Result;
use crate::frenet::{CartesianState, FrenetFrame, FrenetPoint, FrenetPositionWithFrame, FrenetState};
use crate::math::{sample_stations, OffsetCurve, ParametricCurve2d, Point2d, Vector2d};
use crate::polyline::FrenetPolyline;
use crate::spline::CubicSpline;
use crate::CorridorId;
use slotmap::Key;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A corridor represents a single continuous drivable strip,
/// such as one lane of a road.
///
/// It consists of a reference line, and a left and a right boundary which are
/// stored as lateral offsets from the reference line. By convention the left
/// boundary's offsets are positive and the right boundary's are negative.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Corridor {
    /// The corridor ID.
    id: CorridorId,
    /// The reference line, which defines the Frenet coordinate system.
    reference_line: CubicSpline,
    /// The left boundary.
    left_bound: FrenetPolyline,
    /// The right boundary.
    right_bound: FrenetPolyline,
}

/// The attributes of a corridor.
#[derive(Clone, Copy, Debug)]
pub struct CorridorAttributes<'a> {
    /// The points the reference line passes through.
    pub reference_line: &'a [Point2d],
    /// The directions of the reference line at its first and last points.
    /// The reference line has no curvature at its ends if this is `None`.
    pub end_tangents: Option<[Vector2d; 2]>,
    /// The boundaries of the corridor.
    pub boundaries: Boundaries<'a>,
}

/// The ways in which the boundaries of a corridor can be specified.
#[derive(Clone, Copy, Debug)]
pub enum Boundaries<'a> {
    /// Boundaries at constant signed lateral offsets from the reference line.
    Offsets { left: f64, right: f64 },
    /// Boundaries passing through the given points in world space,
    /// ordered in the direction of the reference line.
    Polylines {
        left: &'a [Point2d],
        right: &'a [Point2d],
    },
}

/// The signed lateral offsets of a corridor's boundaries.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundaryDistances {
    pub left: f64,
    pub right: f64,
}

/// A corridor sampled as polylines in world space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CartesianPolylines {
    pub reference: Vec<Point2d>,
    pub left: Vec<Point2d>,
    pub right: Vec<Point2d>,
}

impl Corridor {
    /// Creates a new corridor.
    pub fn new(attribs: &CorridorAttributes) -> Result<Self> {
        let reference_line = match attribs.end_tangents {
            Some([first, last]) => CubicSpline::with_tangents(attribs.reference_line, first, last)?,
            None => CubicSpline::new(attribs.reference_line)?,
        };

        let (left_bound, right_bound) = match attribs.boundaries {
            Boundaries::Offsets { left, right } => (
                FrenetPolyline::constant(reference_line.knots(), left)?,
                FrenetPolyline::constant(reference_line.knots(), right)?,
            ),
            Boundaries::Polylines { left, right } => (
                reference_line.to_frenet_polyline(left)?,
                reference_line.to_frenet_polyline(right)?,
            ),
        };

        let corridor = Self {
            id: CorridorId::null(),
            reference_line,
            left_bound,
            right_bound,
        };
        corridor.check_boundaries();

        log::debug!(
            "created corridor of length {:.3} m with {} left and {} right boundary points",
            corridor.length_reference_line(),
            corridor.left_bound.len(),
            corridor.right_bound.len()
        );

        Ok(corridor)
    }

    /// Creates a corridor whose boundaries lie at constant signed offsets from
    /// a natural spline through the given points.
    pub fn with_offsets(reference_line: &[Point2d], left: f64, right: f64) -> Result<Self> {
        Self::new(&CorridorAttributes {
            reference_line,
            end_tangents: None,
            boundaries: Boundaries::Offsets { left, right },
        })
    }

    /// Creates a corridor from explicit boundary polylines and a natural spline
    /// through the given points.
    pub fn with_boundaries(
        reference_line: &[Point2d],
        left: &[Point2d],
        right: &[Point2d],
    ) -> Result<Self> {
        Self::new(&CorridorAttributes {
            reference_line,
            end_tangents: None,
            boundaries: Boundaries::Polylines { left, right },
        })
    }

    /// Assigns the corridor's ID.
    pub(crate) fn with_id(self, id: CorridorId) -> Self {
        Self { id, ..self }
    }

    /// Gets the corridor's ID, which is null unless the corridor belongs to a network.
    pub fn id(&self) -> CorridorId {
        self.id
    }

    /// Gets the reference line.
    pub fn reference_line(&self) -> &CubicSpline {
        &self.reference_line
    }

    /// Gets the left boundary.
    pub fn left_bound(&self) -> &FrenetPolyline {
        &self.left_bound
    }

    /// Gets the right boundary.
    pub fn right_bound(&self) -> &FrenetPolyline {
        &self.right_bound
    }

    /// Gets the signed lateral offsets of both boundaries at the given arc length.
    pub fn signed_distances_at(&self, pos: f64) -> BoundaryDistances {
        BoundaryDistances {
            left: self.left_bound.deviation_at(pos),
            right: self.right_bound.deviation_at(pos),
        }
    }

    /// Gets the width of the corridor at the given arc length.
    pub fn width_at(&self, pos: f64) -> f64 {
        self.left_bound.deviation_at(pos) + self.right_bound.deviation_at(pos).abs()
    }

    /// Gets the lateral offset of the midpoint between the boundaries.
    /// Positive values mean the middle of the corridor lies left of the reference line.
    pub fn center_offset(&self, pos: f64) -> f64 {
        let distances = self.signed_distances_at(pos);
        (distances.left + distances.right) * 0.5
    }

    /// Gets the signed curvature of the reference line.
    pub fn curvature_at(&self, pos: f64) -> f64 {
        self.reference_line.curvature_at(pos)
    }

    /// Gets the length of the reference line in m.
    pub fn length_reference_line(&self) -> f64 {
        self.reference_line.total_length()
    }

    /// Gets the Frenet frame at the projection of a point onto the reference line.
    pub fn frenet_frame(&self, point: Point2d) -> FrenetFrame {
        self.reference_line.project(point, None).frame
    }

    /// Projects a point onto the reference line.
    /// See [CubicSpline::project].
    pub fn frenet_position_with_frame(
        &self,
        point: Point2d,
        hint: Option<f64>,
    ) -> FrenetPositionWithFrame {
        self.reference_line.project(point, hint)
    }

    /// Converts a polyline in world space into one relative to the reference line.
    pub fn to_frenet_polyline(&self, points: &[Point2d]) -> Result<FrenetPolyline> {
        self.reference_line.to_frenet_polyline(points)
    }

    /// Converts a point in Frenet coordinates into world space.
    pub fn to_cartesian_point(&self, point: FrenetPoint) -> Point2d {
        let position = self.reference_line.position_at(point.pos);
        let normal = self.reference_line.normal_at(point.pos);
        position + normal * point.lat
    }

    /// Converts a kinematic state relative to the reference line into world space.
    pub fn to_cartesian_state(&self, state: &FrenetState) -> CartesianState {
        self.reference_line.frame_at(state.pos).to_cartesian_state(state)
    }

    /// Converts a kinematic state in world space into one relative to the reference line.
    ///
    /// # Parameters
    /// * `state` - The state to convert
    /// * `hint` - An approximate arc length of the state, see [CubicSpline::project].
    pub fn to_frenet_state(&self, state: &CartesianState, hint: Option<f64>) -> FrenetState {
        let projection = self.reference_line.project(state.position, hint);
        projection.frame.to_frenet_state(state)
    }

    /// Samples the reference line every `step` m.
    /// See [CubicSpline::fill_cartesian_polyline].
    pub fn fill_cartesian_reference_polyline(&self, step: f64) -> Vec<Point2d> {
        self.reference_line.fill_cartesian_polyline(step)
    }

    /// Samples the reference line and both boundaries as polylines in world space.
    ///
    /// If `sample_boundaries` is set and `step` is positive, all three polylines
    /// are sampled at the same arc lengths, every `step` m and at the very end of
    /// the reference line, so that their points correspond index by index.
    /// Otherwise the boundaries are drawn through their own samples.
    pub fn fill_cartesian_polylines(
        &self,
        step: f64,
        sample_boundaries: bool,
    ) -> CartesianPolylines {
        if sample_boundaries && step > 0.0 {
            let stations = sample_stations(self.length_reference_line(), step);
            let left = OffsetCurve::new(&self.reference_line, |pos| {
                self.left_bound.deviation_at(pos)
            });
            let right = OffsetCurve::new(&self.reference_line, |pos| {
                self.right_bound.deviation_at(pos)
            });
            return CartesianPolylines {
                reference: stations.iter().map(|pos| self.reference_line.sample(*pos)).collect(),
                left: stations.iter().map(|pos| left.sample(*pos)).collect(),
                right: stations.iter().map(|pos| right.sample(*pos)).collect(),
            };
        }

        CartesianPolylines {
            reference: self.reference_line.fill_cartesian_polyline(step),
            left: self.left_bound.iter().map(|p| self.to_cartesian_point(*p)).collect(),
            right: self.right_bound.iter().map(|p| self.to_cartesian_point(*p)).collect(),
        }
    }

    /// Warns if the boundaries cross each other at any of their samples.
    fn check_boundaries(&self) {
        let crossing = self
            .left_bound
            .iter()
            .chain(self.right_bound.iter())
            .map(|p| p.pos)
            .find(|pos| self.left_bound.deviation_at(*pos) < self.right_bound.deviation_at(*pos));
        if let Some(pos) = crossing {
            log::warn!(
                "left boundary lies right of the right boundary at {:.3} m, \
                 corridor width is undefined there",
                pos
            );
        }
    }
}

impl fmt::Display for Corridor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Corridor {:?}", self.id)?;
        writeln!(f, "{}", self.reference_line)?;
        writeln!(f, "{}", self.left_bound)?;
        writeln!(f, "{}", self.right_bound)
    }
}

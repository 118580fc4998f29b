use crate::error::{CorridorError, Result};
use crate::frenet::{FrenetFrame, FrenetPoint, FrenetPositionWithFrame};
use crate::math::{
    nearest_point_on_interval, rot90, sample_stations, signed_curvature, signed_curvature_rate,
    CubicFn, ParametricCurve2d, Point2d, Vector2d,
};
use crate::polyline::FrenetPolyline;
use crate::util::Interval;
use cgmath::prelude::*;
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// The arc length tolerance to which projections are refined, in m.
const PROJECTION_TOLERANCE: f64 = 1e-10;

/// The maximum number of refinement steps per projection candidate.
const MAX_REFINE_ITERATIONS: usize = 64;

/// The maximum number of steps taken to find the parameter at an arc length.
const MAX_INVERSION_ITERATIONS: usize = 32;

/// The distance either side of an arc length hint which is searched
/// before falling back to a search of the whole curve, in m.
const HINT_WINDOW: f64 = 20.0;

/// The number of pieces each arc length integral is split into.
const QUADRATURE_PIECES: usize = 4;

/// Abscissae and weights of 5-point Gauss-Legendre quadrature on `[-1, 1]`.
const GAUSS_LEGENDRE: [(f64, f64); 5] = [
    (-0.906_179_845_938_664, 0.236_926_885_056_189_1),
    (-0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0.0, 0.568_888_888_888_888_9),
    (0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0.906_179_845_938_664, 0.236_926_885_056_189_1),
];

/// A planar cubic spline, queried by arc length.
///
/// The spline interpolates a sequence of points with one cubic segment per pair
/// of consecutive points, joined with continuous first and second derivatives.
/// The segments are fitted against the cumulative chord length of the points;
/// the arc length of each segment is then integrated numerically, and every
/// query maps its arc length back onto the fitted parameter.
///
/// Beyond either end the curve continues in a straight line along the end's
/// tangent, so every query is well defined for any arc length.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CubicSpline {
    /// The interpolated points.
    points: Vec<Point2d>,
    /// The fitted parameter at each point.
    params: Vec<f64>,
    /// The arc length at each point.
    knots: Vec<f64>,
    /// The x and y polynomials of each segment.
    segments: Vec<[CubicFn; 2]>,
}

impl CubicSpline {
    /// Fits a natural spline (zero curvature at both ends) through the points.
    pub fn new(points: &[Point2d]) -> Result<Self> {
        Self::fit(points, None)
    }

    /// Fits a spline through the points whose direction at the first and last
    /// points follows the given tangents. Only the direction of a tangent matters.
    pub fn with_tangents(points: &[Point2d], first: Vector2d, last: Vector2d) -> Result<Self> {
        let tangents = [first, last]
            .into_iter()
            .map(|t| {
                let mag = t.magnitude();
                if mag.is_finite() && mag > 0.0 {
                    Ok(t / mag)
                } else {
                    Err(CorridorError::DegenerateTangent)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::fit(points, Some([tangents[0], tangents[1]]))
    }

    fn fit(points: &[Point2d], tangents: Option<[Vector2d; 2]>) -> Result<Self> {
        if points.len() < 2 {
            return Err(CorridorError::TooFewPoints(points.len()));
        }
        if let Some(idx) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(CorridorError::NonFinitePoint(idx));
        }

        let mut params = Vec::with_capacity(points.len());
        params.push(0.0);
        for (idx, (a, b)) in points.iter().tuple_windows().enumerate() {
            let dist = a.distance(*b);
            if dist <= f64::EPSILON * (1.0 + a.to_vec().magnitude()) {
                return Err(CorridorError::CoincidentPoints(idx));
            }
            params.push(params[idx] + dist);
        }

        let xs = points.iter().map(|p| p.x).collect::<Vec<_>>();
        let ys = points.iter().map(|p| p.y).collect::<Vec<_>>();
        let moments_x = knot_moments(&params, &xs, tangents.map(|t| [t[0].x, t[1].x]));
        let moments_y = knot_moments(&params, &ys, tangents.map(|t| [t[0].y, t[1].y]));

        let segments = (0..points.len() - 1)
            .map(|i| {
                let (t1, t2) = (params[i], params[i + 1]);
                [
                    CubicFn::from_moments(t1, xs[i], moments_x[i], t2, xs[i + 1], moments_x[i + 1]),
                    CubicFn::from_moments(t1, ys[i], moments_y[i], t2, ys[i + 1], moments_y[i + 1]),
                ]
            })
            .collect::<Vec<_>>();

        let mut knots = Vec::with_capacity(points.len());
        knots.push(0.0);
        for (i, segment) in segments.iter().enumerate() {
            knots.push(knots[i] + segment_length(segment, params[i], params[i + 1]));
        }

        log::debug!(
            "fitted {} cubic spline through {} points, length {:.3} m (chords {:.3} m)",
            if tangents.is_some() { "clamped" } else { "natural" },
            points.len(),
            knots[knots.len() - 1],
            params[params.len() - 1]
        );

        Ok(Self {
            points: points.to_vec(),
            params,
            knots,
            segments,
        })
    }

    /// The length of the curve in m.
    pub fn total_length(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// The number of knots, which is the number of interpolated points.
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    /// Always false, since a spline has at least two knots.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The interpolated points.
    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// The arc length of each knot.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// The arc length of the knot with the given index.
    pub fn arc_length_at_index(&self, idx: usize) -> f64 {
        self.knots[idx]
    }

    /// Gets the position at the given arc length.
    pub fn position_at(&self, pos: f64) -> Point2d {
        self.sample(pos)
    }

    /// Gets the unit tangent vector at the given arc length.
    pub fn tangent_at(&self, pos: f64) -> Vector2d {
        self.sample_dt(pos)
    }

    /// Gets the unit normal vector at the given arc length, which points to the left.
    pub fn normal_at(&self, pos: f64) -> Vector2d {
        rot90(self.tangent_at(pos))
    }

    /// Gets the signed curvature at the given arc length.
    /// Positive values indicate the curve turns left.
    pub fn curvature_at(&self, pos: f64) -> f64 {
        match self.locate(pos) {
            Some((idx, t)) => signed_curvature(self.d1(idx, t), self.d2(idx, t)),
            None => 0.0,
        }
    }

    /// Gets the derivative of the curvature with respect to arc length.
    pub fn curvature_rate_at(&self, pos: f64) -> f64 {
        match self.locate(pos) {
            Some((idx, t)) => {
                let [x, y] = &self.segments[idx];
                signed_curvature_rate(
                    self.d1(idx, t),
                    self.d2(idx, t),
                    Vector2d::new(x.dy3(), y.dy3()),
                )
            }
            None => 0.0,
        }
    }

    /// Gets the Frenet frame at the given arc length.
    pub fn frame_at(&self, pos: f64) -> FrenetFrame {
        let (origin, tangent, curvature, curvature_rate) = match self.locate(pos) {
            Some((idx, t)) => {
                let [x, y] = &self.segments[idx];
                let (d1, d2) = (self.d1(idx, t), self.d2(idx, t));
                let d3 = Vector2d::new(x.dy3(), y.dy3());
                (
                    Point2d::new(x.y(t), y.y(t)),
                    d1.normalize(),
                    signed_curvature(d1, d2),
                    signed_curvature_rate(d1, d2, d3),
                )
            }
            None => (self.sample(pos), self.sample_dt(pos), 0.0, 0.0),
        };
        FrenetFrame {
            pos,
            origin,
            tangent,
            normal: rot90(tangent),
            curvature,
            curvature_rate,
        }
    }

    /// Projects a point onto the curve.
    ///
    /// Finds the closest point on the curve and returns the Frenet position of
    /// `point` relative to it, along with the frame at the closest point.
    /// Points behind the start or past the end of the curve are projected onto
    /// its straight extensions, giving a negative arc length or one greater
    /// than [total_length](Self::total_length).
    ///
    /// # Parameters
    /// * `point` - The point to project
    /// * `hint` - An approximate arc length of the result, such as the result of
    ///   projecting a nearby point. Limits the search to the curve around it.
    pub fn project(&self, point: Point2d, hint: Option<f64>) -> FrenetPositionWithFrame {
        let num_segments = self.segments.len();
        let window = match hint {
            Some(hint) if hint.is_finite() => {
                let range = Interval::disc(hint, HINT_WINDOW);
                self.segment_index(range.min)..=self.segment_index(range.max)
            }
            _ => 0..=num_segments - 1,
        };

        let (mut idx, mut t) = self.project_within(point, *window.start(), *window.end());

        // The closest point may lie outside of the window, so search everywhere.
        let at_window_edge = |t: f64| {
            (*window.start() > 0 && t <= self.params[*window.start()] + PROJECTION_TOLERANCE)
                || (*window.end() < num_segments - 1
                    && t >= self.params[*window.end() + 1] - PROJECTION_TOLERANCE)
        };
        if at_window_edge(t) {
            log::trace!("projection settled on the edge of the hint window, searching whole curve");
            (idx, t) = self.project_within(point, 0, num_segments - 1);
        }

        let mut pos = self.arc_length_at(idx, t);

        // Continue onto the straight extensions at either end
        let length = self.total_length();
        if pos <= PROJECTION_TOLERANCE || pos >= length - PROJECTION_TOLERANCE {
            let end = if pos <= PROJECTION_TOLERANCE { 0.0 } else { length };
            let along = (point - self.sample(end)).dot(self.sample_dt(end));
            if (end == 0.0 && along < 0.0) || (end == length && along > 0.0) {
                pos = end + along;
            }
        }

        let frame = self.frame_at(pos);
        let lat = frame.to_local(point).y;
        FrenetPositionWithFrame {
            position: FrenetPoint::new(pos, lat),
            frame,
        }
    }

    /// Projects a sequence of points onto the curve, creating a polyline in Frenet
    /// coordinates. Each projection is hinted with the previous result.
    pub fn to_frenet_polyline(&self, points: &[Point2d]) -> Result<FrenetPolyline> {
        let samples = points
            .iter()
            .scan(None, |hint, point| {
                let position = self.project(*point, *hint).position;
                *hint = Some(position.pos);
                Some(position)
            })
            .collect::<Vec<_>>();
        FrenetPolyline::from_projected(samples)
    }

    /// Samples the curve at intervals of `step` m, always including its end point.
    /// A non-positive step returns the interpolated points.
    pub fn fill_cartesian_polyline(&self, step: f64) -> Vec<Point2d> {
        if step > 0.0 {
            sample_stations(self.total_length(), step)
                .into_iter()
                .map(|pos| self.sample(pos))
                .collect()
        } else {
            self.points.clone()
        }
    }

    /// Finds the closest point within a range of segments,
    /// returning its segment and fitted parameter.
    fn project_within(&self, point: Point2d, first: usize, last: usize) -> (usize, f64) {
        // Coarse search over the chords between the knots
        let closest = (first..=last)
            .map(|i| (i, chord_distance2(self.points[i], self.points[i + 1], point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(first, |(i, _)| i);

        // Refine on the closest chord's segment and its neighbours.
        // Earlier candidates win ties.
        let candidates = closest.saturating_sub(1).max(first)..=usize::min(closest + 1, last);
        candidates
            .map(|i| {
                let bounds = Interval::new(self.params[i], self.params[i + 1]);
                let segment = Segment(&self.segments[i], bounds);
                let (t, dist2) = nearest_point_on_interval(
                    &segment,
                    point,
                    bounds,
                    PROJECTION_TOLERANCE,
                    MAX_REFINE_ITERATIONS,
                );
                (i, t, dist2)
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map_or((closest, self.params[closest]), |(i, t, _)| (i, t))
    }

    /// Gets the index of the segment containing the given arc length,
    /// clamped to the first or last segment.
    fn segment_index(&self, pos: f64) -> usize {
        let idx = self.knots.partition_point(|knot| *knot <= pos);
        idx.clamp(1, self.segments.len()) - 1
    }

    /// Gets the segment containing the given arc length and the fitted parameter
    /// at that arc length, or `None` if it lies beyond either end of the curve.
    fn locate(&self, pos: f64) -> Option<(usize, f64)> {
        if !(0.0..=self.total_length()).contains(&pos) {
            return None;
        }
        let idx = self.segment_index(pos);
        Some((idx, self.param_at(idx, pos)))
    }

    /// Finds the fitted parameter within a segment at which the arc length is `pos`.
    fn param_at(&self, idx: usize, pos: f64) -> f64 {
        let (t1, t2) = (self.params[idx], self.params[idx + 1]);
        let (s1, s2) = (self.knots[idx], self.knots[idx + 1]);
        let (mut lo, mut hi) = (t1, t2);
        let mut t = t1 + (t2 - t1) * (pos - s1) / (s2 - s1);

        for _ in 0..MAX_INVERSION_ITERATIONS {
            let error = s1 + segment_length(&self.segments[idx], t1, t) - pos;
            if error > 0.0 {
                hi = t;
            } else {
                lo = t;
            }
            let step = error / self.d1(idx, t).magnitude();
            if step.abs() < PROJECTION_TOLERANCE {
                break;
            }
            // Newton's method, falling back to bisection when it leaves the bracket
            t -= step;
            if !(t > lo && t < hi) {
                t = 0.5 * (lo + hi);
            }
        }
        t
    }

    /// Gets the arc length at a fitted parameter within a segment.
    fn arc_length_at(&self, idx: usize, t: f64) -> f64 {
        self.knots[idx] + segment_length(&self.segments[idx], self.params[idx], t)
    }

    /// The derivative with respect to the fitted parameter.
    fn d1(&self, idx: usize, t: f64) -> Vector2d {
        let [x, y] = &self.segments[idx];
        Vector2d::new(x.dy(t), y.dy(t))
    }

    /// The second derivative with respect to the fitted parameter.
    fn d2(&self, idx: usize, t: f64) -> Vector2d {
        let [x, y] = &self.segments[idx];
        Vector2d::new(x.dy2(t), y.dy2(t))
    }

    /// Gets the end of the curve nearest to an out-of-range arc length.
    fn extension_origin(&self, pos: f64) -> f64 {
        if pos < 0.0 {
            0.0
        } else {
            self.total_length()
        }
    }
}

/// A single segment of a spline in its fitted parameter.
struct Segment<'a>(&'a [CubicFn; 2], Interval<f64>);

impl ParametricCurve2d for Segment<'_> {
    fn sample(&self, t: f64) -> Point2d {
        let [x, y] = self.0;
        Point2d::new(x.y(t), y.y(t))
    }

    fn bounds(&self) -> Interval<f64> {
        self.1
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        let [x, y] = self.0;
        Vector2d::new(x.dy(t), y.dy(t))
    }

    fn sample_dt2(&self, t: f64) -> Vector2d {
        let [x, y] = self.0;
        Vector2d::new(x.dy2(t), y.dy2(t))
    }
}

/// The curve is parameterised by arc length, so its first derivative is the
/// unit tangent and its second is the curvature times the unit normal.
impl ParametricCurve2d for CubicSpline {
    fn sample(&self, pos: f64) -> Point2d {
        match self.locate(pos) {
            Some((idx, t)) => {
                let [x, y] = &self.segments[idx];
                Point2d::new(x.y(t), y.y(t))
            }
            None => {
                let end = self.extension_origin(pos);
                self.sample(end) + self.sample_dt(end) * (pos - end)
            }
        }
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, self.total_length())
    }

    fn sample_dt(&self, pos: f64) -> Vector2d {
        match self.locate(pos) {
            Some((idx, t)) => self.d1(idx, t).normalize(),
            None => self.sample_dt(self.extension_origin(pos)),
        }
    }

    fn sample_dt2(&self, pos: f64) -> Vector2d {
        match self.locate(pos) {
            Some((idx, t)) => {
                let d1 = self.d1(idx, t);
                rot90(d1.normalize()) * signed_curvature(d1, self.d2(idx, t))
            }
            None => Vector2d::zero(),
        }
    }
}

impl fmt::Display for CubicSpline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CubicSpline ({} knots, {:.3} m):", self.len(), self.total_length())?;
        for (pos, point) in self.knots.iter().zip(&self.points) {
            write!(f, " [{:.3}: ({:.3}, {:.3})]", pos, point.x, point.y)?;
        }
        Ok(())
    }
}

/// Computes the second derivatives at the knots of an interpolating cubic spline
/// through `(knots[i], values[i])`.
///
/// With `end_slopes` the first derivatives at both ends are fixed (clamped spline),
/// otherwise the second derivatives at both ends are zero (natural spline).
fn knot_moments(knots: &[f64], values: &[f64], end_slopes: Option<[f64; 2]>) -> Vec<f64> {
    let n = knots.len();
    let h = knots.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
    let slope = |i: usize| (values[i + 1] - values[i]) / h[i];

    let mut sub = vec![0.0; n];
    let mut diag = vec![1.0; n];
    let mut sup = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    for i in 1..n - 1 {
        sub[i] = h[i - 1];
        diag[i] = 2.0 * (h[i - 1] + h[i]);
        sup[i] = h[i];
        rhs[i] = 6.0 * (slope(i) - slope(i - 1));
    }

    if let Some([first, last]) = end_slopes {
        diag[0] = 2.0 * h[0];
        sup[0] = h[0];
        rhs[0] = 6.0 * (slope(0) - first);
        sub[n - 1] = h[n - 2];
        diag[n - 1] = 2.0 * h[n - 2];
        rhs[n - 1] = 6.0 * (last - slope(n - 2));
    }

    solve_tridiagonal(&sub, &diag, &sup, rhs)
}

/// Solves a tridiagonal linear system with the Thomas algorithm.
///
/// `sub[0]` and `sup[n - 1]` are ignored. The system must be diagonally
/// dominant, which holds for the spline systems built above.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], mut rhs: Vec<f64>) -> Vec<f64> {
    let n = diag.len();
    let mut c = vec![0.0; n];

    c[0] = sup[0] / diag[0];
    rhs[0] /= diag[0];
    for i in 1..n {
        let m = diag[i] - sub[i] * c[i - 1];
        c[i] = sup[i] / m;
        rhs[i] = (rhs[i] - sub[i] * rhs[i - 1]) / m;
    }
    for i in (0..n - 1).rev() {
        rhs[i] -= c[i] * rhs[i + 1];
    }

    rhs
}

/// The arc length of a segment between two values of its fitted parameter,
/// by composite Gauss-Legendre quadrature.
fn segment_length([x, y]: &[CubicFn; 2], t1: f64, t2: f64) -> f64 {
    let half = 0.5 * (t2 - t1) / QUADRATURE_PIECES as f64;
    (0..QUADRATURE_PIECES)
        .map(|piece| {
            let mid = t1 + (2 * piece + 1) as f64 * half;
            GAUSS_LEGENDRE
                .iter()
                .map(|(node, weight)| {
                    let t = mid + half * node;
                    weight * x.dy(t).hypot(y.dy(t))
                })
                .sum::<f64>()
        })
        .sum::<f64>()
        * half
}

/// The squared distance between a point and a line segment.
fn chord_distance2(a: Point2d, b: Point2d, point: Point2d) -> f64 {
    let ab = b - a;
    let t = ((point - a).dot(ab) / ab.magnitude2()).clamp(0.0, 1.0);
    (a + ab * t).distance2(point)
}

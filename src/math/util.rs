use super::{Point2d, Vector2d};
use cgmath::prelude::*;

/// Projects a point onto a local coordinate system.
///
/// # Parameters
/// * `point` - The point to project
/// * `origin` - The origin of the coordinate system
/// * `x_axis` - The basis vector pointing in the positive x-axis.
/// * `y_axis` - The basis vector pointing in the positive y-axis.
pub fn project_local(
    point: Point2d,
    origin: Point2d,
    x_axis: Vector2d,
    y_axis: Vector2d,
) -> Point2d {
    let point = point - origin;
    Point2d::new(point.dot(x_axis), point.dot(y_axis))
}

/// Rotates a vector 90 degrees anticlockwise.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Computes the signed curvature of a planar curve from its first and
/// second derivatives with respect to the curve parameter.
pub fn signed_curvature(d1: Vector2d, d2: Vector2d) -> f64 {
    d1.perp_dot(d2) / d1.magnitude().powi(3)
}

/// Computes the derivative of the signed curvature with respect to arc length,
/// given the first three derivatives of the curve with respect to its parameter.
pub fn signed_curvature_rate(d1: Vector2d, d2: Vector2d, d3: Vector2d) -> f64 {
    let speed2 = d1.magnitude2();
    let num = d1.perp_dot(d3) * speed2 - 3.0 * d1.perp_dot(d2) * d1.dot(d2);
    // |d1|^5 for the time derivative, one more |d1| to convert to arc length
    num / speed2.powi(3)
}

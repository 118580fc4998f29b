use super::ParametricCurve2d;
use crate::{math::Point2d, util::Interval};
use cgmath::prelude::*;

/// The number of sub-intervals sampled to seed the refinement.
const SEED_SUBDIVISIONS: usize = 4;

/// Finds the point on a section of a parametric curve which is closest to `point`.
///
/// The section is sampled at a few evenly spaced parameters to find a starting
/// guess and a bracket around it, which is then refined with Newton's method
/// on the derivative of the squared distance. Whenever a Newton step would leave
/// the bracket, the bracket is bisected instead, so the search always terminates
/// within `bounds`.
///
/// # Parameters
/// * `curve` - The curve to search
/// * `point` - The point to project
/// * `bounds` - The range of parameters to search
/// * `max_error` - The parameter tolerance at which to stop refining
/// * `max_iterations` - The maximum number of refinement steps
///
/// # Returns
/// The parameter of the closest point and its squared distance to `point`.
pub fn nearest_point_on_interval(
    curve: &impl ParametricCurve2d,
    point: Point2d,
    bounds: Interval<f64>,
    max_error: f64,
    max_iterations: usize,
) -> (f64, f64) {
    let dist2 = |t: f64| (curve.sample(t) - point).magnitude2();

    // Get initial guess for `t` and the samples either side of it
    let seed = (0..=SEED_SUBDIVISIONS)
        .map(|i| bounds.lerp(i as f64 / SEED_SUBDIVISIONS as f64))
        .map(|t| (t, dist2(t)))
        .enumerate()
        .min_by(|a, b| a.1 .1.total_cmp(&b.1 .1));
    let (idx, (mut t, seed_dist2)) = match seed {
        Some(seed) => seed,
        None => return (bounds.min, dist2(bounds.min)),
    };
    let mut lo = bounds.lerp(idx.saturating_sub(1) as f64 / SEED_SUBDIVISIONS as f64);
    let mut hi =
        bounds.lerp(usize::min(idx + 1, SEED_SUBDIVISIONS) as f64 / SEED_SUBDIVISIONS as f64);

    // Refine `t` with a bracketed Newton's method
    for _ in 0..max_iterations {
        let offset = curve.sample(t) - point;
        let dt = curve.sample_dt(t);
        let grad = dt.dot(offset);
        let hess = dt.magnitude2() + curve.sample_dt2(t).dot(offset);

        if grad == 0.0 {
            break;
        }
        if grad < 0.0 {
            lo = t;
        } else {
            hi = t;
        }

        let newton = t - grad / hess;
        if hess > 0.0 && (newton - t).abs() < max_error {
            t = bounds.clamp(newton);
            break;
        }
        t = if hess > 0.0 && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
        if hi - lo < max_error {
            break;
        }
    }

    let refined_dist2 = dist2(t);
    if refined_dist2 <= seed_dist2 {
        (t, refined_dist2)
    } else {
        (bounds.lerp(idx as f64 / SEED_SUBDIVISIONS as f64), seed_dist2)
    }
}

/// Computes evenly spaced stations along a curve of the given length.
///
/// The stations start at zero and are `step` apart. The last station is always
/// `length` itself: it is appended when the final full step falls short of the
/// end, or replaces the final station when that already lies within a
/// thousandth of a step of the end.
pub fn sample_stations(length: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || !(length > 0.0) {
        return vec![0.0, length.max(0.0)];
    }

    let count = (length / step).floor() as usize;
    let mut stations = (0..=count)
        .map(|i| i as f64 * step)
        .take_while(|s| *s <= length)
        .collect::<Vec<_>>();

    match stations.last_mut() {
        Some(last) if length - *last <= 0.001 * step && *last > 0.0 => *last = length,
        _ => stations.push(length),
    }

    stations
}

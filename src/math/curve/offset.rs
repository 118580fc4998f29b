use cgmath::InnerSpace;

use crate::math::{rot90, Point2d};
use crate::util::Interval;

use super::ParametricCurve2d;

/// A curve running alongside another curve at a lateral offset,
/// which may vary along the curve.
///
/// Positive offsets lie to the left of the inner curve.
pub struct OffsetCurve<C, F>
where
    C: ParametricCurve2d,
    F: Fn(f64) -> f64,
{
    inner: C,
    offset: F,
}

impl<C, F> OffsetCurve<C, F>
where
    C: ParametricCurve2d,
    F: Fn(f64) -> f64,
{
    pub fn new(curve: C, offset: F) -> Self {
        Self {
            inner: curve,
            offset,
        }
    }
}

impl<C, F> ParametricCurve2d for OffsetCurve<C, F>
where
    C: ParametricCurve2d,
    F: Fn(f64) -> f64,
{
    fn sample(&self, t: f64) -> Point2d {
        let c = self.inner.sample(t);
        let p = rot90(self.inner.sample_dt(t).normalize());
        let o = (self.offset)(t);
        c + p * o
    }

    fn bounds(&self) -> Interval<f64> {
        self.inner.bounds()
    }
}

//! Mathematical functions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cubic function.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CubicFn {
    coeffs: [f64; 4],
    offset: f64,
}

impl CubicFn {
    /// Creates the cubic through `(x1, y1)` and `(x2, y2)` whose second
    /// derivatives at those points are `m1` and `m2`.
    ///
    /// This is the form in which the segments of an interpolating spline are
    /// obtained once the second derivatives at the knots are known.
    pub fn from_moments(x1: f64, y1: f64, m1: f64, x2: f64, y2: f64, m2: f64) -> Self {
        let h = x2 - x1;
        let a = (m2 - m1) / (6.0 * h);
        let b = 0.5 * m1;
        let c = (y2 - y1) / h - h * (2.0 * m1 + m2) / 6.0;
        Self {
            coeffs: [a, b, c, y1],
            offset: -x1,
        }
    }

    pub fn y(&self, x: f64) -> f64 {
        self.y_and_dy(x).0
    }

    pub fn dy(&self, x: f64) -> f64 {
        self.y_and_dy(x).1
    }

    pub fn y_and_dy(&self, x: f64) -> (f64, f64) {
        let c = &self.coeffs;
        let x = x + self.offset;

        let y = c[0] * x * x * x + c[1] * x * x + c[2] * x + c[3];
        let dy = c[0] * 3. * x * x + c[1] * 2. * x + c[2];

        (y, dy)
    }

    /// The second derivative.
    pub fn dy2(&self, x: f64) -> f64 {
        let c = &self.coeffs;
        c[0] * 6. * (x + self.offset) + c[1] * 2.
    }

    /// The third derivative, which is constant.
    pub fn dy3(&self) -> f64 {
        self.coeffs[0] * 6.
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    #[test]
    pub fn from_moments() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        for _i in 0..100 {
            let x1 = rng.gen_range(-100.0..100.0);
            let x2 = x1 + rng.gen_range(0.5..50.0);
            let y1 = rng.gen_range(-100.0..100.0);
            let y2 = rng.gen_range(-100.0..100.0);
            let m1 = rng.gen_range(-1.0..1.0);
            let m2 = rng.gen_range(-1.0..1.0);
            let cubic = CubicFn::from_moments(x1, y1, m1, x2, y2, m2);

            assert_approx_eq!(cubic.y(x1), y1, 1e-6);
            assert_approx_eq!(cubic.y(x2), y2, 1e-6);
            assert_approx_eq!(cubic.dy2(x1), m1, 1e-6);
            assert_approx_eq!(cubic.dy2(x2), m2, 1e-6);
            assert_approx_eq!(cubic.dy3(), (m2 - m1) / (x2 - x1), 1e-6);
        }
    }

    #[test]
    pub fn straight_lines() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        for _i in 0..100 {
            let x1 = rng.gen_range(-100.0..100.0);
            let x2 = x1 + rng.gen_range(0.5..50.0);
            let y1 = rng.gen_range(-100.0..100.0);
            let y2 = rng.gen_range(-100.0..100.0);
            let dydx = (y2 - y1) / (x2 - x1);
            let cubic = CubicFn::from_moments(x1, y1, 0.0, x2, y2, 0.0);

            assert_approx_eq!(cubic.y(0.5 * (x1 + x2)), 0.5 * (y1 + y2), 1e-6);
            assert_approx_eq!(cubic.dy(x1), dydx, 1e-6);
            assert_approx_eq!(cubic.dy(0.5 * (x1 + x2)), dydx, 1e-6);
            assert_approx_eq!(cubic.dy(x2), dydx, 1e-6);
        }
    }
}

//! Frenet coordinates, frames and kinematic states.
//!
//! A Frenet position is measured along a reference line: `pos` is the arc
//! length from the start of the line, and `lat` is the signed lateral offset,
//! positive to the left of the direction of travel.

use crate::math::{project_local, Point2d, Vector2d};
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in Frenet coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrenetPoint {
    /// The arc length along the reference line in m.
    pub pos: f64,
    /// The signed lateral offset from the reference line in m.
    pub lat: f64,
}

impl FrenetPoint {
    /// Creates a new Frenet point.
    pub const fn new(pos: f64, lat: f64) -> Self {
        Self { pos, lat }
    }
}

/// The local coordinate frame of a reference line at a given arc length.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrenetFrame {
    /// The arc length of the frame's origin.
    pub pos: f64,
    /// The point on the reference line.
    pub origin: Point2d,
    /// The unit tangent of the reference line.
    pub tangent: Vector2d,
    /// The unit normal of the reference line, pointing left.
    pub normal: Vector2d,
    /// The signed curvature of the reference line in 1/m.
    pub curvature: f64,
    /// The derivative of the curvature with respect to arc length in 1/m².
    pub curvature_rate: f64,
}

/// A Frenet position together with the frame it was measured in.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrenetPositionWithFrame {
    pub position: FrenetPoint,
    pub frame: FrenetFrame,
}

/// A kinematic state expressed relative to a reference line.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrenetState {
    /// The arc length along the reference line in m.
    pub pos: f64,
    /// The rate of change of `pos` over time in m/s.
    pub pos_dt: f64,
    /// The rate of change of `pos_dt` over time in m/s².
    pub pos_dt2: f64,
    /// The signed lateral offset in m.
    pub lat: f64,
    /// The derivative of `lat` with respect to `pos`.
    pub lat_ds: f64,
    /// The second derivative of `lat` with respect to `pos` in 1/m.
    pub lat_ds2: f64,
}

/// A kinematic state in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CartesianState {
    /// The position in m.
    pub position: Point2d,
    /// The heading in radians, anticlockwise from the x-axis.
    pub heading: f64,
    /// The signed curvature of the path in 1/m.
    pub curvature: f64,
    /// The speed in m/s.
    pub vel: f64,
    /// The tangential acceleration in m/s².
    pub acc: f64,
}

impl FrenetState {
    /// The position of the state in Frenet coordinates.
    pub fn point(&self) -> FrenetPoint {
        FrenetPoint::new(self.pos, self.lat)
    }
}

impl CartesianState {
    /// The unit vector pointing in the direction of the heading.
    pub fn dir(&self) -> Vector2d {
        let (sin, cos) = self.heading.sin_cos();
        Vector2d::new(cos, sin)
    }
}

impl FrenetFrame {
    /// The heading of the reference line in radians.
    pub fn heading(&self) -> f64 {
        self.tangent.y.atan2(self.tangent.x)
    }

    /// Gets the point at the given lateral offset from the frame's origin.
    pub fn to_cartesian_point(&self, lat: f64) -> Point2d {
        self.origin + self.normal * lat
    }

    /// Expresses a point in the frame's axes.
    /// The x-coordinate is measured along the tangent, the y-coordinate along the normal.
    pub fn to_local(&self, point: Point2d) -> Point2d {
        project_local(point, self.origin, self.tangent, self.normal)
    }

    /// Converts a Frenet state measured in this frame into world coordinates.
    ///
    /// The state's `pos` is assumed to be the frame's own arc length. The result
    /// is undefined when the state lies beyond the reference line's centre of
    /// curvature (`1 - curvature * lat <= 0`).
    pub fn to_cartesian_state(&self, state: &FrenetState) -> CartesianState {
        let one_minus_kd = 1.0 - self.curvature * state.lat;
        let kd_ds = self.curvature_rate * state.lat + self.curvature * state.lat_ds;

        // Heading relative to the reference line
        let delta = state.lat_ds.atan2(one_minus_kd);
        let (sin_d, cos_d) = delta.sin_cos();
        let tan_d = sin_d / cos_d;

        let curvature = ((state.lat_ds2 + kd_ds * tan_d) * cos_d * cos_d / one_minus_kd
            + self.curvature)
            * cos_d
            / one_minus_kd;

        let lat_dt = state.lat_ds * state.pos_dt;
        let vel = f64::hypot(one_minus_kd * state.pos_dt, lat_dt);

        let delta_ds = one_minus_kd / cos_d * curvature - self.curvature;
        let acc = state.pos_dt2 * one_minus_kd / cos_d
            + state.pos_dt.powi(2) / cos_d * (state.lat_ds * delta_ds - kd_ds);

        let dir = self.tangent * cos_d + self.normal * sin_d;

        CartesianState {
            position: self.to_cartesian_point(state.lat),
            heading: dir.y.atan2(dir.x),
            curvature,
            vel,
            acc,
        }
    }

    /// Converts a world state into a Frenet state measured in this frame.
    ///
    /// The frame should be the one at the projection of `state.position`,
    /// so that the position lies on the frame's normal.
    pub fn to_frenet_state(&self, state: &CartesianState) -> FrenetState {
        let local = self.to_local(state.position);
        let lat = local.y;

        let dir = state.dir();
        let cos_d = dir.dot(self.tangent);
        let sin_d = dir.dot(self.normal);
        let tan_d = sin_d / cos_d;

        let one_minus_kd = 1.0 - self.curvature * lat;
        let lat_ds = one_minus_kd * tan_d;
        let kd_ds = self.curvature_rate * lat + self.curvature * lat_ds;
        let lat_ds2 = -kd_ds * tan_d
            + one_minus_kd / (cos_d * cos_d)
                * (state.curvature * one_minus_kd / cos_d - self.curvature);

        let pos_dt = state.vel * cos_d / one_minus_kd;
        let delta_ds = one_minus_kd / cos_d * state.curvature - self.curvature;
        let pos_dt2 =
            (state.acc * cos_d - pos_dt.powi(2) * (lat_ds * delta_ds - kd_ds)) / one_minus_kd;

        FrenetState {
            pos: self.pos + local.x,
            pos_dt,
            pos_dt2,
            lat,
            lat_ds,
            lat_ds2,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    fn frame(curvature: f64, curvature_rate: f64) -> FrenetFrame {
        let tangent = Vector2d::new(0.6, 0.8);
        FrenetFrame {
            pos: 12.0,
            origin: Point2d::new(3.0, -4.0),
            tangent,
            normal: Vector2d::new(-0.8, 0.6),
            curvature,
            curvature_rate,
        }
    }

    #[test]
    fn straight_state_keeps_speed() {
        let frame = frame(0.0, 0.0);
        let state = frame.to_cartesian_state(&FrenetState {
            pos: 12.0,
            pos_dt: 10.0,
            pos_dt2: 1.5,
            lat: 2.0,
            lat_ds: 0.0,
            lat_ds2: 0.0,
        });
        assert_approx_eq!(state.vel, 10.0);
        assert_approx_eq!(state.acc, 1.5);
        assert_approx_eq!(state.curvature, 0.0);
        assert_approx_eq!(state.heading, frame.heading());
        assert_approx_eq!(state.position.x, 3.0 - 1.6);
        assert_approx_eq!(state.position.y, -4.0 + 1.2);
    }

    #[test]
    fn offset_on_curve_scales_speed() {
        // Travelling parallel to a left-hand curve, 2 m inside it
        let frame = frame(0.1, 0.0);
        let state = frame.to_cartesian_state(&FrenetState {
            pos: 12.0,
            pos_dt: 10.0,
            pos_dt2: 0.0,
            lat: 2.0,
            lat_ds: 0.0,
            lat_ds2: 0.0,
        });
        assert_approx_eq!(state.vel, 8.0);
        assert_approx_eq!(state.curvature, 0.125);
        assert_approx_eq!(state.acc, 0.0);
    }

    #[test]
    fn state_round_trip() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Frenet frames are fun, honestly.");
        for _ in 0..100 {
            let frame = frame(rng.gen_range(-0.05..0.05), rng.gen_range(-0.01..0.01));
            let state = FrenetState {
                pos: frame.pos,
                pos_dt: rng.gen_range(0.5..30.0),
                pos_dt2: rng.gen_range(-3.0..3.0),
                lat: rng.gen_range(-4.0..4.0),
                lat_ds: rng.gen_range(-0.5..0.5),
                lat_ds2: rng.gen_range(-0.05..0.05),
            };
            let cartesian = frame.to_cartesian_state(&state);
            let result = frame.to_frenet_state(&cartesian);
            assert_approx_eq!(result.pos, state.pos, 1e-9);
            assert_approx_eq!(result.pos_dt, state.pos_dt, 1e-9);
            assert_approx_eq!(result.pos_dt2, state.pos_dt2, 1e-9);
            assert_approx_eq!(result.lat, state.lat, 1e-9);
            assert_approx_eq!(result.lat_ds, state.lat_ds, 1e-9);
            assert_approx_eq!(result.lat_ds2, state.lat_ds2, 1e-9);
        }
    }
}

use crate::error::{CorridorError, Result};
use crate::frenet::FrenetPoint;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A polyline in Frenet coordinates, describing how far a boundary
/// deviates from a reference line along its length.
///
/// Samples are ordered by arc length. Between samples the deviation is
/// interpolated linearly; before the first and after the last sample it
/// holds the value of the nearest sample.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrenetPolyline {
    points: Vec<FrenetPoint>,
}

impl FrenetPolyline {
    /// Creates a polyline with the same lateral offset at every given arc length.
    pub fn constant(knots: &[f64], offset: f64) -> Result<Self> {
        Self::from_projected(knots.iter().map(|pos| FrenetPoint::new(*pos, offset)).collect())
    }

    /// Creates a polyline from samples obtained by projecting a boundary onto a
    /// reference line. Samples which are out of order are sorted by arc length.
    pub(crate) fn from_projected(mut points: Vec<FrenetPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(CorridorError::EmptyBoundary);
        }
        if points.windows(2).any(|w| w[1].pos < w[0].pos) {
            log::warn!(
                "boundary of {} points doubles back along the reference line, \
                 sorting by arc length",
                points.len()
            );
            points.sort_by(|a, b| a.pos.total_cmp(&b.pos));
        }
        Ok(Self { points })
    }

    /// Gets the lateral deviation at the given arc length.
    pub fn deviation_at(&self, pos: f64) -> f64 {
        let idx = self.points.partition_point(|p| p.pos <= pos);
        if idx == 0 {
            return self.points[0].lat;
        }
        if idx == self.points.len() {
            return self.points[idx - 1].lat;
        }

        let (a, b) = (&self.points[idx - 1], &self.points[idx]);
        let span = b.pos - a.pos;
        if span > 0.0 {
            a.lat + (b.lat - a.lat) * (pos - a.pos) / span
        } else {
            a.lat
        }
    }

    /// The number of samples.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if there are no samples, which a constructed polyline never is.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Gets the sample with the given index.
    pub fn get(&self, idx: usize) -> Option<&FrenetPoint> {
        self.points.get(idx)
    }

    /// The samples of the polyline.
    pub fn points(&self) -> &[FrenetPoint] {
        &self.points
    }

    /// Iterates over the samples of the polyline.
    pub fn iter(&self) -> impl Iterator<Item = &FrenetPoint> + '_ {
        self.points.iter()
    }
}

impl fmt::Display for FrenetPolyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrenetPolyline ({} points):", self.len())?;
        for point in &self.points {
            write!(f, " [{:.3}, {:.3}]", point.pos, point.lat)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn polyline() -> FrenetPolyline {
        FrenetPolyline::from_projected(vec![
            FrenetPoint::new(0.0, 2.0),
            FrenetPoint::new(10.0, 4.0),
            FrenetPoint::new(30.0, 3.0),
        ])
        .unwrap()
    }

    #[test]
    fn interpolates_between_samples() {
        let polyline = polyline();
        assert_approx_eq!(polyline.deviation_at(0.0), 2.0);
        assert_approx_eq!(polyline.deviation_at(5.0), 3.0);
        assert_approx_eq!(polyline.deviation_at(10.0), 4.0);
        assert_approx_eq!(polyline.deviation_at(20.0), 3.5);
        assert_approx_eq!(polyline.deviation_at(30.0), 3.0);
    }

    #[test]
    fn holds_edge_values_outside_domain() {
        let polyline = polyline();
        assert_approx_eq!(polyline.deviation_at(-7.0), 2.0);
        assert_approx_eq!(polyline.deviation_at(1000.0), 3.0);
    }

    #[test]
    fn constant_offset() {
        let polyline = FrenetPolyline::constant(&[0.0, 4.0, 9.5], -1.5).unwrap();
        assert_eq!(polyline.len(), 3);
        assert!(polyline.iter().all(|p| p.lat == -1.5));
        assert_approx_eq!(polyline.deviation_at(6.0), -1.5);
    }

    #[test]
    fn single_sample_is_flat() {
        let polyline = FrenetPolyline::from_projected(vec![FrenetPoint::new(5.0, 1.0)]).unwrap();
        assert_eq!(polyline.deviation_at(-3.0), 1.0);
        assert_eq!(polyline.deviation_at(5.0), 1.0);
        assert_eq!(polyline.deviation_at(8.0), 1.0);
    }

    #[test]
    fn coincident_samples_form_a_step() {
        let polyline = FrenetPolyline::from_projected(vec![
            FrenetPoint::new(0.0, 1.0),
            FrenetPoint::new(5.0, 2.0),
            FrenetPoint::new(5.0, 6.0),
            FrenetPoint::new(10.0, 6.0),
        ])
        .unwrap();
        assert_approx_eq!(polyline.deviation_at(2.5), 1.5);
        assert_approx_eq!(polyline.deviation_at(7.5), 6.0);
    }

    #[test]
    fn sorts_and_rejects_empty() {
        let polyline = FrenetPolyline::from_projected(vec![
            FrenetPoint::new(10.0, 1.0),
            FrenetPoint::new(0.0, 3.0),
        ])
        .unwrap();
        assert_eq!(polyline.get(0), Some(&FrenetPoint::new(0.0, 3.0)));
        assert_eq!(
            FrenetPolyline::from_projected(vec![]).unwrap_err(),
            CorridorError::EmptyBoundary
        );
    }
}

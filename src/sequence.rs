use crate::corridor::{BoundaryDistances, Corridor};
use crate::error::{CorridorError, Result};
use crate::frenet::{FrenetPoint, FrenetPositionWithFrame};
use crate::math::Point2d;
use crate::CorridorId;
use std::sync::Arc;

/// The maximum number of times a projection may move on to a neighbouring corridor.
const MAX_NEIGHBOR_STEPS: usize = 2;

/// A chain of corridors, each starting where the previous one ends,
/// which share a single longitudinal coordinate.
///
/// The arc length at which each corridor starts is the sum of the lengths of
/// the corridors before it. The corridors are shared, not copied.
#[derive(Clone, Debug)]
pub struct CorridorSequence {
    /// The corridors, and the arc length at which each one starts.
    corridors: Vec<(f64, Arc<Corridor>)>,
}

/// The result of projecting a point onto a [CorridorSequence].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequencePosition {
    /// The index of the corridor in the sequence.
    pub index: usize,
    /// The ID of the corridor.
    pub corridor: CorridorId,
    /// The arc length at which the corridor starts.
    pub start_offset: f64,
    /// The position in the corridor's own coordinates.
    pub local: FrenetPositionWithFrame,
}

impl SequencePosition {
    /// The arc length along the whole sequence.
    pub fn global_pos(&self) -> f64 {
        self.start_offset + self.local.position.pos
    }

    /// The position in the sequence's coordinates.
    pub fn global_point(&self) -> FrenetPoint {
        FrenetPoint::new(self.global_pos(), self.local.position.lat)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Step {
    Back,
    Forward,
}

impl CorridorSequence {
    /// Creates a new sequence from corridors given in driving order.
    pub fn new(corridors: impl IntoIterator<Item = Arc<Corridor>>) -> Result<Self> {
        let mut offset = 0.0;
        let corridors = corridors
            .into_iter()
            .map(|corridor| {
                let start = offset;
                offset += corridor.length_reference_line();
                (start, corridor)
            })
            .collect::<Vec<_>>();

        if corridors.is_empty() {
            return Err(CorridorError::EmptySequence);
        }

        log::debug!(
            "created corridor sequence of {} corridors, length {:.3} m",
            corridors.len(),
            offset
        );

        Ok(Self { corridors })
    }

    /// The number of corridors.
    pub fn len(&self) -> usize {
        self.corridors.len()
    }

    /// Always false, since a sequence has at least one corridor.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over the corridors in order.
    pub fn corridors(&self) -> impl Iterator<Item = &Arc<Corridor>> + '_ {
        self.corridors.iter().map(|(_, corridor)| corridor)
    }

    /// Iterates over the arc lengths at which the corridors start.
    pub fn start_offsets(&self) -> impl Iterator<Item = f64> + '_ {
        self.corridors.iter().map(|(offset, _)| *offset)
    }

    /// Gets the total length of the sequence in m.
    pub fn total_length(&self) -> f64 {
        let (offset, corridor) = self.last();
        offset + corridor.length_reference_line()
    }

    /// Gets the signed lateral offsets of both boundaries at the given arc length.
    pub fn signed_distances_at(&self, pos: f64) -> BoundaryDistances {
        let (corridor, pos) = self.resolve(pos);
        corridor.signed_distances_at(pos)
    }

    /// Gets the width at the given arc length.
    pub fn width_at(&self, pos: f64) -> f64 {
        let (corridor, pos) = self.resolve(pos);
        corridor.width_at(pos)
    }

    /// Gets the offset of the middle of the corridor at the given arc length.
    pub fn center_offset_at(&self, pos: f64) -> f64 {
        let (corridor, pos) = self.resolve(pos);
        corridor.center_offset(pos)
    }

    /// Gets the curvature of the reference line at the given arc length.
    pub fn curvature_at(&self, pos: f64) -> f64 {
        let (corridor, pos) = self.resolve(pos);
        corridor.curvature_at(pos)
    }

    /// Converts a point in the sequence's Frenet coordinates into world space.
    pub fn to_cartesian_point(&self, point: FrenetPoint) -> Point2d {
        let (corridor, pos) = self.resolve(point.pos);
        corridor.to_cartesian_point(FrenetPoint::new(pos, point.lat))
    }

    /// Projects a point onto the sequence.
    ///
    /// The point is first projected onto the corridor at `start_pos`. If it lies
    /// before the start of that corridor it is projected onto the previous one,
    /// and if it lies past the end, onto the next one. This is repeated at most
    /// twice, always in the same direction, so points are expected to lie near
    /// `start_pos`.
    pub fn frenet_position_with_frame(&self, point: Point2d, start_pos: f64) -> SequencePosition {
        let mut index = self.index_at(start_pos);
        let (offset, corridor) = &self.corridors[index];
        let mut local = corridor.frenet_position_with_frame(point, Some(start_pos - offset));
        let mut direction = None;

        for _ in 0..MAX_NEIGHBOR_STEPS {
            let (_, corridor) = &self.corridors[index];
            let pos = local.position.pos;
            let step = if pos < 0.0 && index > 0 {
                Step::Back
            } else if pos > corridor.length_reference_line() && index + 1 < self.corridors.len() {
                Step::Forward
            } else {
                break;
            };
            if direction.is_some_and(|d| d != step) {
                break;
            }
            direction = Some(step);

            let (next_index, hint) = match step {
                Step::Back => (index - 1, self.corridors[index - 1].1.length_reference_line()),
                Step::Forward => (index + 1, 0.0),
            };
            log::trace!(
                "point at {:.3} m lies outside corridor {}, trying corridor {}",
                pos,
                index,
                next_index
            );
            index = next_index;
            local = self.corridors[index].1.frenet_position_with_frame(point, Some(hint));
        }

        let (start_offset, corridor) = &self.corridors[index];
        SequencePosition {
            index,
            corridor: corridor.id(),
            start_offset: *start_offset,
            local,
        }
    }

    /// Gets the index of the corridor containing the given arc length.
    /// Arc lengths before the start belong to the first corridor,
    /// and those after the end to the last.
    fn index_at(&self, pos: f64) -> usize {
        self.corridors
            .partition_point(|(offset, _)| *offset <= pos)
            .saturating_sub(1)
    }

    /// Gets the corridor containing the given arc length,
    /// and the arc length relative to the start of that corridor.
    fn resolve(&self, pos: f64) -> (&Corridor, f64) {
        let (offset, corridor) = &self.corridors[self.index_at(pos)];
        (corridor, pos - offset)
    }

    fn last(&self) -> &(f64, Arc<Corridor>) {
        &self.corridors[self.corridors.len() - 1]
    }
}

//! Error types.

use crate::CorridorId;
use thiserror::Error;

/// Errors raised while constructing splines, corridors and sequences.
///
/// Queries never fail; only construction does.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorridorError {
    #[error("at least two reference points are required, got {0}")]
    TooFewPoints(usize),

    #[error("points {0} and {} coincide", .0 + 1)]
    CoincidentPoints(usize),

    #[error("point {0} has a non-finite coordinate")]
    NonFinitePoint(usize),

    #[error("end tangent is zero or non-finite")]
    DegenerateTangent,

    #[error("boundary polyline has no points")]
    EmptyBoundary,

    #[error("a corridor sequence needs at least one corridor")]
    EmptySequence,

    #[error("corridor {0:?} is not part of the network")]
    UnknownCorridor(CorridorId),
}

impl CorridorError {
    /// Returns true if the error describes degenerate reference geometry.
    pub fn is_degenerate_input(&self) -> bool {
        matches!(
            self,
            Self::TooFewPoints(_)
                | Self::CoincidentPoints(_)
                | Self::NonFinitePoint(_)
                | Self::DegenerateTangent
        )
    }
}

pub type Result<T> = std::result::Result<T, CorridorError>;

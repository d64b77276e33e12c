//! Unified error handling for matcher construction.
//!
//! Matching itself never fails: missing bearings, invalid probes and empty
//! candidate sets all come back as empty result lists. Only building a
//! [`ProbeMatcher`](crate::ProbeMatcher) can be rejected.

use thiserror::Error;

/// Errors raised while validating a road network or matcher configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeMatchError {
    /// A road (or polyline) does not have enough coordinates to form a line.
    #[error(
        "road '{road_id}' has {point_count} points, at least {minimum_required} are required"
    )]
    InsufficientPoints {
        road_id: String,
        point_count: usize,
        minimum_required: usize,
    },

    /// A coordinate is NaN, infinite or outside the valid lat/lng range.
    #[error("road '{road_id}' has an invalid coordinate at index {index}")]
    InvalidCoordinate { road_id: String, index: usize },

    /// Two consecutive coordinates are identical, leaving a zero-length segment.
    #[error("road '{road_id}' has a zero-length segment at index {segment_index}")]
    DegenerateSegment {
        road_id: String,
        segment_index: usize,
    },

    /// A configuration value is out of its accepted domain.
    #[error("invalid matcher config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ProbeMatchError>;

/// Conversions from `Option` into [`ProbeMatchError`].
pub trait OptionExt<T> {
    /// Map `None` to [`ProbeMatchError::InsufficientPoints`].
    fn ok_or_insufficient_points(
        self,
        road_id: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_points(
        self,
        road_id: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T> {
        self.ok_or_else(|| ProbeMatchError::InsufficientPoints {
            road_id: road_id.to_string(),
            point_count,
            minimum_required,
        })
    }
}

//! # Probe Matcher
//!
//! Snap GPS probes onto a road network.
//!
//! This library provides:
//! - A bulk-built R-tree over road geometry padded by the match tolerance
//! - Per-probe matching with exact point-to-polyline projection
//! - Circular bearing comparison with optional reverse-direction matching
//! - Pointwise trace matching with bearings derived from consecutive fixes
//! - Parallel batch matching for large probe sets
//!
//! Matches are candidates, ranked by distance. No path is reconstructed.
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch and trace matching with rayon (default)
//! - **`synthetic`** - Synthetic road grids and random probes for benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use probematch::{GpsPoint, MatcherConfig, ProbeMatcher, Road};
//!
//! let roads = vec![Road::new(
//!     "road-1",
//!     vec![GpsPoint::new(38.909, -77.03), GpsPoint::new(38.910, -77.029)],
//! )];
//!
//! let config = MatcherConfig {
//!     compare_bearing: false,
//!     ..MatcherConfig::default()
//! };
//! let matcher = ProbeMatcher::new(roads, config).unwrap();
//!
//! let matches = matcher.match_probe(&GpsPoint::new(38.9095, -77.0295), None);
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].road_id, "road-1");
//! ```

use geo::{Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, ProbeMatchError, Result};

// Angle normalization and circular comparison
pub mod bearing;
pub use bearing::{compare_bearing, normalize_angle};

// Local planar geodesy
pub mod ruler;
pub use ruler::{PointOnLine, Ruler};

// R-tree over padded road/segment boxes
pub mod index;
pub use index::{IndexGranularity, Segment, SegmentArena, SpatialIndex};

// Probe matching
pub mod matcher;
pub use matcher::ProbeMatcher;

// Trace matching
pub mod trace;
pub use trace::trace_bearings;

// Synthetic networks for benchmarks and stress tests
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use probematch::GpsPoint;
/// let point = GpsPoint::new(38.9095, -77.0295); // Washington, DC
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

impl From<GpsPoint> for Coord {
    fn from(p: GpsPoint) -> Self {
        Coord {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

impl From<Coord> for GpsPoint {
    fn from(c: Coord) -> Self {
        GpsPoint::new(c.y, c.x)
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Bounds spanned by two corner points, in any order.
    pub fn from_corners(a: &GpsPoint, b: &GpsPoint) -> Self {
        Self {
            min_lat: a.latitude.min(b.latitude),
            max_lat: a.latitude.max(b.latitude),
            min_lng: a.longitude.min(b.longitude),
            max_lng: a.longitude.max(b.longitude),
        }
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Check whether `point` lies inside or on the edge of the bounds.
    pub fn contains(&self, point: &GpsPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        }
    }
}

/// A road: an identified polyline of at least two coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    /// Opaque identifier, carried through into match results
    pub id: String,
    /// Ordered coordinates
    pub coords: Vec<GpsPoint>,
}

impl Road {
    /// Create a road from an id and its coordinates.
    pub fn new(id: impl Into<String>, coords: Vec<GpsPoint>) -> Self {
        Self {
            id: id.into(),
            coords,
        }
    }

    /// The road geometry as a `geo` line string (x = longitude, y = latitude).
    pub fn line_string(&self) -> LineString {
        self.coords.iter().map(|&p| Coord::from(p)).collect()
    }

    /// Check that the road is a usable line.
    ///
    /// # Errors
    /// - [`ProbeMatchError::InsufficientPoints`] with fewer than two coordinates
    /// - [`ProbeMatchError::InvalidCoordinate`] for NaN or out-of-range values
    /// - [`ProbeMatchError::DegenerateSegment`] for repeated consecutive coordinates
    pub fn validate(&self) -> Result<()> {
        if self.coords.len() < 2 {
            return Err(ProbeMatchError::InsufficientPoints {
                road_id: self.id.clone(),
                point_count: self.coords.len(),
                minimum_required: 2,
            });
        }

        if let Some(index) = self.coords.iter().position(|p| !p.is_valid()) {
            return Err(ProbeMatchError::InvalidCoordinate {
                road_id: self.id.clone(),
                index,
            });
        }

        if let Some(segment_index) = self.coords.windows(2).position(|w| w[0] == w[1]) {
            return Err(ProbeMatchError::DegenerateSegment {
                road_id: self.id.clone(),
                segment_index,
            });
        }

        Ok(())
    }
}

/// A point sample to match, with an optional travel bearing in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub point: GpsPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
}

impl Probe {
    /// Create a probe without a bearing.
    pub fn new(point: GpsPoint) -> Self {
        Self {
            point,
            bearing: None,
        }
    }

    /// Create a probe travelling at `bearing` degrees.
    pub fn with_bearing(point: GpsPoint, bearing: f64) -> Self {
        Self {
            point,
            bearing: Some(bearing),
        }
    }
}

/// A road the probe was matched onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Position of the matched road in the network
    pub road_index: usize,
    /// ID of the matched road
    pub road_id: String,
    /// Probe projected onto the road geometry
    pub point: GpsPoint,
    /// Distance from probe to road in kilometers
    pub distance: f64,
    /// Segment of the road holding the projected point
    pub segment_index: usize,
    /// Compass bearing of that segment in `[0, 360)`
    pub bearing: f64,
}

/// Configuration for probe matching.
///
/// Deserializes from a camelCase options record; omitted keys take the
/// defaults below and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatcherConfig {
    /// Maximum distance in kilometers between a probe and a matching road.
    /// The boundary is inclusive. Default: 0.01 (10 meters)
    pub max_probe_distance: f64,

    /// Require the probe bearing to agree with the road segment bearing.
    /// Default: true
    pub compare_bearing: bool,

    /// Maximum bearing deviation in degrees.
    /// Default: 5.0
    pub max_bearing_range: f64,

    /// Also accept probes travelling opposite to the segment direction.
    /// Default: false
    pub bidirectional_bearing: bool,

    /// Whether the index holds whole roads or individual segments.
    /// Default: Segment
    pub granularity: IndexGranularity,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_probe_distance: 0.01,
            compare_bearing: true,
            max_bearing_range: 5.0,
            bidirectional_bearing: false,
            granularity: IndexGranularity::Segment,
        }
    }
}

impl MatcherConfig {
    /// Reject values no matcher can work with.
    pub fn validate(&self) -> Result<()> {
        if !self.max_probe_distance.is_finite() || self.max_probe_distance < 0.0 {
            return Err(ProbeMatchError::InvalidConfig {
                field: "max_probe_distance",
                reason: format!("must be a finite, non-negative number, got {}", self.max_probe_distance),
            });
        }
        if !self.max_bearing_range.is_finite() {
            return Err(ProbeMatchError::InvalidConfig {
                field: "max_bearing_range",
                reason: format!("must be finite, got {}", self.max_bearing_range),
            });
        }
        Ok(())
    }
}

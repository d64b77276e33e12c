//! Fast local geodesy anchored to one reference latitude.
//!
//! Distances, bearings and projections are computed on a flat plane whose
//! per-degree scale factors come from the WGS84 ellipsoid at the reference
//! latitude. Within a few hundred kilometers of that latitude the error is
//! well under 0.1%, which is plenty for match tolerances measured in meters.

use serde::{Deserialize, Serialize};

use crate::bearing::normalize_angle;
use crate::error::{OptionExt, Result};
use crate::{Bounds, GpsPoint};

/// WGS84 equatorial radius in kilometers.
const EQUATORIAL_RADIUS_KM: f64 = 6378.137;

/// WGS84 flattening.
const FLATTENING: f64 = 1.0 / 298.257223563;

/// Squared eccentricity.
const E2: f64 = FLATTENING * (2.0 - FLATTENING);

/// Closest point on a polyline to a query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointOnLine {
    /// Projected point lying on the polyline
    pub point: GpsPoint,
    /// Index of the segment (`coords[index]` to `coords[index + 1]`) holding the point
    pub index: usize,
    /// Fractional position along that segment, in `[0, 1]`
    pub t: f64,
}

/// Planar approximation of the ellipsoid around a reference latitude.
///
/// Build one per probe, or reuse one across a batch of nearby points.
///
/// # Example
/// ```
/// use probematch::{GpsPoint, ruler::Ruler};
///
/// let ruler = Ruler::new(38.909);
/// let a = GpsPoint::new(38.909, -77.03);
/// let b = GpsPoint::new(38.910, -77.029);
/// assert!(ruler.distance(&a, &b) > 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruler {
    kx: f64,
    ky: f64,
}

impl Ruler {
    /// Create a ruler anchored at `latitude` (degrees), measuring in kilometers.
    pub fn new(latitude: f64) -> Self {
        let m = EQUATORIAL_RADIUS_KM.to_radians();
        let coslat = latitude.to_radians().cos();
        let w2 = 1.0 / (1.0 - E2 * (1.0 - coslat * coslat));
        let w = w2.sqrt();

        Self {
            kx: m * w * coslat,
            ky: m * w * w2 * (1.0 - E2),
        }
    }

    /// Create a ruler anchored at the latitude of `point`.
    pub fn from_point(point: &GpsPoint) -> Self {
        Self::new(point.latitude)
    }

    /// Kilometers per degree of longitude at the reference latitude.
    pub fn kx(&self) -> f64 {
        self.kx
    }

    /// Kilometers per degree of latitude at the reference latitude.
    pub fn ky(&self) -> f64 {
        self.ky
    }

    /// Distance between two points in kilometers.
    pub fn distance(&self, a: &GpsPoint, b: &GpsPoint) -> f64 {
        let dx = wrap(a.longitude - b.longitude) * self.kx;
        let dy = (a.latitude - b.latitude) * self.ky;
        (dx * dx + dy * dy).sqrt()
    }

    /// Compass bearing from `a` to `b` in `[0, 360)`, 0 = north, clockwise.
    pub fn bearing(&self, a: &GpsPoint, b: &GpsPoint) -> f64 {
        let dx = wrap(b.longitude - a.longitude) * self.kx;
        let dy = (b.latitude - a.latitude) * self.ky;
        normalize_angle(dx.atan2(dy).to_degrees())
    }

    /// Total length of a polyline in kilometers.
    pub fn line_distance(&self, coords: &[GpsPoint]) -> f64 {
        coords
            .windows(2)
            .map(|w| self.distance(&w[0], &w[1]))
            .sum()
    }

    /// Project `point` onto the closest segment of `coords`.
    ///
    /// On exact ties the lowest segment index wins.
    ///
    /// # Errors
    /// [`ProbeMatchError::InsufficientPoints`](crate::ProbeMatchError::InsufficientPoints)
    /// when `coords` has fewer than two points.
    pub fn project_onto_polyline(&self, coords: &[GpsPoint], point: &GpsPoint) -> Result<PointOnLine> {
        let mut best: Option<(f64, PointOnLine)> = None;

        for (i, w) in coords.windows(2).enumerate() {
            let (projected, t) = self.project_onto_segment(&w[0], &w[1], point);
            let dx = wrap(point.longitude - projected.longitude) * self.kx;
            let dy = (point.latitude - projected.latitude) * self.ky;
            let sq_dist = dx * dx + dy * dy;

            if best.as_ref().is_none_or(|(min, _)| sq_dist < *min) {
                best = Some((
                    sq_dist,
                    PointOnLine {
                        point: projected,
                        index: i,
                        t,
                    },
                ));
            }
        }

        best.map(|(_, on_line)| on_line)
            .ok_or_insufficient_points("polyline", coords.len(), 2)
    }

    /// Project `point` onto the segment `a`-`b`.
    ///
    /// Returns the projected point and its clamped position `t` along the segment.
    pub fn project_onto_segment(&self, a: &GpsPoint, b: &GpsPoint, point: &GpsPoint) -> (GpsPoint, f64) {
        let dx = wrap(b.longitude - a.longitude) * self.kx;
        let dy = (b.latitude - a.latitude) * self.ky;

        if dx == 0.0 && dy == 0.0 {
            return (*a, 0.0);
        }

        let t = (wrap(point.longitude - a.longitude) * self.kx * dx
            + (point.latitude - a.latitude) * self.ky * dy)
            / (dx * dx + dy * dy);

        if t >= 1.0 {
            (*b, 1.0)
        } else if t > 0.0 {
            (
                GpsPoint::new(
                    a.latitude + dy / self.ky * t,
                    a.longitude + dx / self.kx * t,
                ),
                t,
            )
        } else {
            (*a, 0.0)
        }
    }

    /// Expand `bounds` by `tolerance_km` in every direction.
    ///
    /// The longitude padding is wider in degrees than the latitude padding
    /// everywhere except the equator.
    pub fn buffer_bounds(&self, bounds: &Bounds, tolerance_km: f64) -> Bounds {
        let v = tolerance_km / self.ky;
        let h = tolerance_km / self.kx;

        Bounds {
            min_lat: bounds.min_lat - v,
            max_lat: bounds.max_lat + v,
            min_lng: bounds.min_lng - h,
            max_lng: bounds.max_lng + h,
        }
    }
}

/// Wrap a longitude difference into `[-180, 180]`.
fn wrap(deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&deg) {
        deg
    } else {
        (deg + 180.0).rem_euclid(360.0) - 180.0
    }
}

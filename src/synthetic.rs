//! Synthetic road networks and probes for stress testing and benchmarking.
//!
//! Generates a jittered street grid plus uniformly scattered probes and
//! noisy traces that follow a road, all from a fixed seed.
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use probematch::synthetic::{SyntheticNetwork, random_probes};
//!
//! let network = SyntheticNetwork {
//!     rows: 4,
//!     cols: 4,
//!     ..SyntheticNetwork::default()
//! };
//!
//! let roads = network.generate();
//! assert_eq!(roads.len(), 8);
//!
//! let probes = random_probes(&network.bounds(), 100, 7);
//! assert_eq!(probes.len(), 100);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ruler::Ruler;
use crate::{Bounds, GpsPoint, Probe, Road};

/// A rectangular street grid of horizontal and vertical roads.
#[derive(Debug, Clone)]
pub struct SyntheticNetwork {
    /// South-west corner of the grid.
    pub origin: GpsPoint,
    /// Number of west-east roads.
    pub rows: usize,
    /// Number of south-north roads.
    pub cols: usize,
    /// Distance between parallel roads in kilometers.
    pub spacing_km: f64,
    /// Coordinates per road (at least 2).
    pub points_per_road: usize,
    /// Maximum sideways displacement of interior coordinates in kilometers.
    pub jitter_km: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for SyntheticNetwork {
    fn default() -> Self {
        Self {
            origin: GpsPoint::new(38.914, -77.056),
            rows: 10,
            cols: 10,
            spacing_km: 0.1,
            points_per_road: 12,
            jitter_km: 0.002,
            seed: 42,
        }
    }
}

impl SyntheticNetwork {
    fn ruler(&self) -> Ruler {
        Ruler::from_point(&self.origin)
    }

    /// Extent of the grid in kilometers along each axis.
    fn extent_km(&self, lines: usize) -> f64 {
        lines.saturating_sub(1).max(1) as f64 * self.spacing_km
    }

    /// Generate all roads: rows first (ids `row-N`), then columns (`col-N`).
    pub fn generate(&self) -> Vec<Road> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let ruler = self.ruler();
        let n = self.points_per_road.max(2);
        let width = self.extent_km(self.cols);
        let height = self.extent_km(self.rows);

        let mut roads = Vec::with_capacity(self.rows + self.cols);

        for r in 0..self.rows {
            let offset = r as f64 * self.spacing_km;
            let coords = (0..n)
                .map(|i| {
                    let along = width * i as f64 / (n - 1) as f64;
                    let side = offset + self.jitter(&mut rng, i, n);
                    self.offset_point(&ruler, along, side)
                })
                .collect();
            roads.push(Road::new(format!("row-{}", r), coords));
        }

        for c in 0..self.cols {
            let offset = c as f64 * self.spacing_km;
            let coords = (0..n)
                .map(|i| {
                    let along = height * i as f64 / (n - 1) as f64;
                    let side = offset + self.jitter(&mut rng, i, n);
                    self.offset_point(&ruler, side, along)
                })
                .collect();
            roads.push(Road::new(format!("col-{}", c), coords));
        }

        roads
    }

    /// Bounding box of the unjittered grid.
    pub fn bounds(&self) -> Bounds {
        let ruler = self.ruler();
        let far = self.offset_point(&ruler, self.extent_km(self.cols), self.extent_km(self.rows));
        Bounds::from_corners(&self.origin, &far)
    }

    /// Endpoints keep their grid position so roads still meet.
    fn jitter(&self, rng: &mut StdRng, i: usize, n: usize) -> f64 {
        if i == 0 || i == n - 1 || self.jitter_km <= 0.0 {
            return 0.0;
        }
        rng.gen_range(-self.jitter_km..self.jitter_km)
    }

    fn offset_point(&self, ruler: &Ruler, east_km: f64, north_km: f64) -> GpsPoint {
        GpsPoint::new(
            self.origin.latitude + north_km / ruler.ky(),
            self.origin.longitude + east_km / ruler.kx(),
        )
    }
}

/// Scatter `count` probes uniformly over `bounds`, each with a random bearing.
pub fn random_probes(bounds: &Bounds, count: usize, seed: u64) -> Vec<Probe> {
    let mut rng = StdRng::seed_from_u64(seed);
    let lat_span = bounds.max_lat - bounds.min_lat;
    let lng_span = bounds.max_lng - bounds.min_lng;

    (0..count)
        .map(|_| {
            let lat = bounds.min_lat + rng.r#gen::<f64>() * lat_span;
            let lng = bounds.min_lng + rng.r#gen::<f64>() * lng_span;
            Probe::with_bearing(GpsPoint::new(lat, lng), rng.gen_range(0.0..360.0))
        })
        .collect()
}

/// Sample a noisy trace travelling along `road` from its first to last point.
///
/// Each segment contributes `samples_per_segment` evenly spaced fixes,
/// displaced by up to `noise_km` on each axis.
pub fn trace_along(road: &Road, samples_per_segment: usize, noise_km: f64, seed: u64) -> Vec<GpsPoint> {
    let Some(first) = road.coords.first() else {
        return Vec::new();
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let ruler = Ruler::from_point(first);
    let samples = samples_per_segment.max(1);

    let noise = |rng: &mut StdRng| {
        if noise_km <= 0.0 {
            (0.0, 0.0)
        } else {
            (
                rng.gen_range(-noise_km..noise_km) / ruler.ky(),
                rng.gen_range(-noise_km..noise_km) / ruler.kx(),
            )
        }
    };

    let mut trace = Vec::with_capacity((road.coords.len() - 1) * samples + 1);
    for w in road.coords.windows(2) {
        for k in 0..samples {
            let t = k as f64 / samples as f64;
            let (dlat, dlng) = noise(&mut rng);
            trace.push(GpsPoint::new(
                w[0].latitude + (w[1].latitude - w[0].latitude) * t + dlat,
                w[0].longitude + (w[1].longitude - w[0].longitude) * t + dlng,
            ));
        }
    }

    if let Some(last) = road.coords.last() {
        let (dlat, dlng) = noise(&mut rng);
        trace.push(GpsPoint::new(last.latitude + dlat, last.longitude + dlng));
    }

    trace
}

//! Probe matching against an indexed road network.
//!
//! Matching runs in two stages:
//! - the spatial index returns candidates whose padded box holds the probe
//! - each candidate is checked exactly: bearing (when enabled) and the true
//!   projected distance against `max_probe_distance`
//!
//! Survivors are sorted by distance. Matching never fails; anything that
//! cannot be matched yields an empty list.

use std::collections::HashSet;

use log::{debug, info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::bearing::{compare_bearing, normalize_angle};
use crate::error::Result;
use crate::index::{IndexGranularity, SegmentArena, SpatialIndex};
use crate::ruler::Ruler;
use crate::{GpsPoint, MatchResult, MatcherConfig, Probe, Road};

/// Matches probes onto a fixed road network.
///
/// Immutable after construction, so one matcher can be shared across
/// threads without locking.
#[derive(Debug)]
pub struct ProbeMatcher {
    roads: Vec<Road>,
    segments: SegmentArena,
    index: SpatialIndex,
    config: MatcherConfig,
}

impl ProbeMatcher {
    /// Validate the network and configuration, then build the index.
    ///
    /// An empty network is accepted and matches nothing.
    ///
    /// # Errors
    /// Returns the first validation failure from [`MatcherConfig::validate`]
    /// or [`Road::validate`].
    pub fn new(roads: Vec<Road>, config: MatcherConfig) -> Result<Self> {
        config.validate()?;

        for road in &roads {
            if let Err(e) = road.validate() {
                warn!("[Matcher] Rejecting road network: {}", e);
                return Err(e);
            }
        }

        let segments = SegmentArena::from_roads(&roads);
        let index = match config.granularity {
            IndexGranularity::Road => SpatialIndex::for_roads(&roads, config.max_probe_distance),
            IndexGranularity::Segment => SpatialIndex::for_segments(&segments, config.max_probe_distance),
        };

        info!(
            "[Index] Built {} {:?} entries from {} roads ({} segments)",
            index.len(),
            config.granularity,
            roads.len(),
            segments.len()
        );

        Ok(Self {
            roads,
            segments,
            index,
            config,
        })
    }

    /// Build a matcher with the default configuration.
    pub fn with_defaults(roads: Vec<Road>) -> Result<Self> {
        Self::new(roads, MatcherConfig::default())
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// All roads, in the order they were supplied.
    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    /// Resolve a [`MatchResult::road_index`] back to its road.
    pub fn road(&self, road_index: usize) -> Option<&Road> {
        self.roads.get(road_index)
    }

    pub fn segments(&self) -> &SegmentArena {
        &self.segments
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Match a single probe, using a ruler anchored at the probe's latitude.
    ///
    /// With `compare_bearing` enabled, a missing (or non-finite) bearing
    /// yields no matches. Otherwise the bearing is ignored.
    ///
    /// # Example
    /// ```
    /// use probematch::{GpsPoint, MatcherConfig, ProbeMatcher, Road};
    ///
    /// let road = Road::new("r", vec![GpsPoint::new(38.909, -77.03), GpsPoint::new(38.910, -77.029)]);
    /// let matcher = ProbeMatcher::new(vec![road], MatcherConfig::default()).unwrap();
    /// let probe = GpsPoint::new(38.9095, -77.0295);
    ///
    /// assert!(matcher.match_probe(&probe, None).is_empty());
    /// let bearing = matcher.segments().get(0).unwrap().bearing;
    /// assert_eq!(matcher.match_probe(&probe, Some(bearing + 1.0)).len(), 1);
    /// ```
    pub fn match_probe(&self, point: &GpsPoint, bearing: Option<f64>) -> Vec<MatchResult> {
        self.match_probe_with_ruler(point, bearing, &Ruler::from_point(point))
    }

    /// Match a single probe with a caller-supplied ruler.
    ///
    /// Reusing one ruler across a batch of nearby probes avoids rebuilding
    /// it per call, at the cost of accuracy as probes drift away from the
    /// ruler's reference latitude.
    pub fn match_probe_with_ruler(
        &self,
        point: &GpsPoint,
        bearing: Option<f64>,
        ruler: &Ruler,
    ) -> Vec<MatchResult> {
        let bearing = bearing.filter(|b| b.is_finite()).map(normalize_angle);
        if self.config.compare_bearing && bearing.is_none() {
            return Vec::new();
        }

        if !point.is_valid() {
            debug!("[Matcher] Skipping invalid probe {:?}", point);
            return Vec::new();
        }

        let mut hits = self.index.query(point);
        // R-tree order is unspecified; handle order makes distance ties deterministic
        hits.sort_unstable();

        let mut matches = match self.config.granularity {
            IndexGranularity::Segment => self.filter_segment_hits(&hits, point, bearing, ruler),
            IndexGranularity::Road => self.filter_road_hits(&hits, point, bearing, ruler),
        };

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        if self.config.granularity == IndexGranularity::Segment {
            let mut seen = HashSet::with_capacity(matches.len());
            matches.retain(|m| seen.insert(m.road_index));
        }

        matches
    }

    /// Match a batch of independent probes.
    ///
    /// Output order follows input order. Runs on the rayon pool with the
    /// `parallel` feature.
    pub fn match_probes(&self, probes: &[Probe]) -> Vec<Vec<MatchResult>> {
        #[cfg(feature = "parallel")]
        let results: Vec<Vec<MatchResult>> = probes
            .par_iter()
            .map(|p| self.match_probe(&p.point, p.bearing))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Vec<MatchResult>> = probes
            .iter()
            .map(|p| self.match_probe(&p.point, p.bearing))
            .collect();

        results
    }

    /// Exact filtering of per-segment candidates.
    ///
    /// Bearings are precomputed per segment, so the bearing test runs
    /// before the projection.
    fn filter_segment_hits(
        &self,
        hits: &[usize],
        point: &GpsPoint,
        bearing: Option<f64>,
        ruler: &Ruler,
    ) -> Vec<MatchResult> {
        let mut matches = Vec::with_capacity(hits.len());

        for &handle in hits {
            let Some(segment) = self.segments.get(handle) else {
                continue;
            };

            if !self.bearing_matches(segment.bearing, bearing) {
                continue;
            }

            let (projected, _) = ruler.project_onto_segment(&segment.start, &segment.end, point);
            let distance = ruler.distance(point, &projected);
            if distance > self.config.max_probe_distance {
                continue;
            }

            matches.push(self.result(segment.road, segment.index, projected, distance, segment.bearing));
        }

        matches
    }

    /// Exact filtering of per-road candidates.
    ///
    /// The segment bearing is only known after projecting onto the whole
    /// road, so the distance test comes first. The bearing is measured at
    /// the segment start, as in [`SegmentArena::from_roads`].
    fn filter_road_hits(
        &self,
        hits: &[usize],
        point: &GpsPoint,
        bearing: Option<f64>,
        ruler: &Ruler,
    ) -> Vec<MatchResult> {
        let mut matches = Vec::with_capacity(hits.len());

        for &road_index in hits {
            let Some(road) = self.roads.get(road_index) else {
                continue;
            };
            let Ok(on_line) = ruler.project_onto_polyline(&road.coords, point) else {
                continue;
            };

            let distance = ruler.distance(point, &on_line.point);
            if distance > self.config.max_probe_distance {
                continue;
            }

            let (start, end) = (&road.coords[on_line.index], &road.coords[on_line.index + 1]);
            let segment_bearing = Ruler::from_point(start).bearing(start, end);
            if !self.bearing_matches(segment_bearing, bearing) {
                continue;
            }

            matches.push(self.result(road_index, on_line.index, on_line.point, distance, segment_bearing));
        }

        matches
    }

    fn bearing_matches(&self, segment_bearing: f64, bearing: Option<f64>) -> bool {
        if !self.config.compare_bearing {
            return true;
        }
        bearing.is_some_and(|b| {
            compare_bearing(
                segment_bearing,
                b,
                self.config.max_bearing_range,
                self.config.bidirectional_bearing,
            )
        })
    }

    fn result(
        &self,
        road_index: usize,
        segment_index: usize,
        point: GpsPoint,
        distance: f64,
        bearing: f64,
    ) -> MatchResult {
        MatchResult {
            road_index,
            road_id: self.roads[road_index].id.clone(),
            point,
            distance,
            segment_index,
            bearing,
        }
    }
}

//! Pointwise matching of ordered GPS traces.

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::matcher::ProbeMatcher;
use crate::ruler::Ruler;
use crate::{GpsPoint, MatchResult};

/// Derive a bearing for every point of a trace.
///
/// Each point heads towards its successor. The last point has no successor
/// and reuses the previous bearing; a single-point trace has none at all.
///
/// ```
/// use probematch::{GpsPoint, Ruler, trace_bearings};
///
/// let trace = [GpsPoint::new(0.0, 0.0), GpsPoint::new(0.001, 0.0)];
/// let bearings = trace_bearings(&Ruler::new(0.0), &trace);
/// assert_eq!(bearings, vec![Some(0.0), Some(0.0)]);
/// ```
pub fn trace_bearings(ruler: &Ruler, trace: &[GpsPoint]) -> Vec<Option<f64>> {
    let mut last = None;
    trace
        .iter()
        .enumerate()
        .map(|(i, point)| {
            if let Some(next) = trace.get(i + 1) {
                last = Some(ruler.bearing(point, next));
            }
            last
        })
        .collect()
}

impl ProbeMatcher {
    /// Match every point of `trace`, returning one result list per point.
    ///
    /// A single ruler anchored at the first point is shared by the whole
    /// trace. The output always has the same length as the input; points
    /// without matches get an empty list.
    pub fn match_trace(&self, trace: &[GpsPoint]) -> Vec<Vec<MatchResult>> {
        let Some(first) = trace.first() else {
            return Vec::new();
        };

        let ruler = Ruler::from_point(first);
        let bearings = trace_bearings(&ruler, trace);

        debug!("[Trace] Matching {} points", trace.len());

        #[cfg(feature = "parallel")]
        let results: Vec<Vec<MatchResult>> = trace
            .par_iter()
            .zip(bearings.par_iter())
            .map(|(point, bearing)| self.match_probe_with_ruler(point, *bearing, &ruler))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Vec<MatchResult>> = trace
            .iter()
            .zip(bearings.iter())
            .map(|(point, bearing)| self.match_probe_with_ruler(point, *bearing, &ruler))
            .collect();

        results
    }
}

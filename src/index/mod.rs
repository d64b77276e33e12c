//! Spatial indexing of padded road geometry.
//!
//! Uses a bulk-loaded R-tree of bounding boxes, each grown by the match
//! tolerance so a probe within tolerance of a road always lands inside
//! that road's box. The index only prunes; exact distance and bearing
//! checks happen in the matcher.

pub mod arena;

pub use arena::{Segment, SegmentArena};

use geo::BoundingRect;
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

use crate::ruler::Ruler;
use crate::{Bounds, GpsPoint, Road};

/// What each index entry stands for.
///
/// Both modes measure a segment's bearing with a ruler anchored at the
/// segment's start, so the same segment always reports the same bearing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexGranularity {
    /// One box per road; handles are road positions.
    Road,
    /// One box per segment; handles point into the [`SegmentArena`].
    #[default]
    Segment,
}

/// A padded bounding box with a handle back to its geometry.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    pub handle: usize,
    pub bounds: Bounds,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_lng, self.bounds.min_lat],
            [self.bounds.max_lng, self.bounds.max_lat],
        )
    }
}

/// Immutable point-containment index over padded boxes.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::build(Vec::new())
    }
}

impl SpatialIndex {
    /// Bulk-load an index from prepared entries.
    ///
    /// An empty entry list gives an empty index that never returns candidates.
    pub fn build(entries: Vec<IndexEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Index one padded box per road.
    pub fn for_roads(roads: &[Road], tolerance_km: f64) -> Self {
        let entries = roads
            .iter()
            .enumerate()
            .filter_map(|(handle, road)| {
                let rect = road.line_string().bounding_rect()?;
                Some(IndexEntry {
                    handle,
                    bounds: pad_bounds(&Bounds::from(rect), tolerance_km),
                })
            })
            .collect();

        Self::build(entries)
    }

    /// Index one padded box per segment of `arena`.
    pub fn for_segments(arena: &SegmentArena, tolerance_km: f64) -> Self {
        let entries = arena
            .iter()
            .map(|(handle, segment)| IndexEntry {
                handle,
                bounds: pad_bounds(&Bounds::from_corners(&segment.start, &segment.end), tolerance_km),
            })
            .collect();

        Self::build(entries)
    }

    /// Handles of every entry whose box contains `point`.
    ///
    /// Boxes touching the point on their boundary count. Order is unspecified.
    pub fn query(&self, point: &GpsPoint) -> Vec<usize> {
        let probe = AABB::from_point([point.longitude, point.latitude]);

        self.tree
            .locate_in_envelope_intersecting(&probe)
            .map(|entry| entry.handle)
            .collect()
    }

    /// Get the number of indexed entries.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Grow `bounds` so it holds every point within `tolerance_km` of it.
///
/// Degrees of latitude are shortest nearest the equator and degrees of
/// longitude shortest nearest the pole, so each axis is padded with the
/// ruler where its degrees are shortest. The longitude ruler sits past the
/// box edge by the latitude padding, where a qualifying point may lie.
fn pad_bounds(bounds: &Bounds, tolerance_km: f64) -> Bounds {
    let equatorward = if bounds.min_lat <= 0.0 && bounds.max_lat >= 0.0 {
        0.0
    } else {
        bounds.min_lat.abs().min(bounds.max_lat.abs())
    };
    let v = tolerance_km / Ruler::new(equatorward).ky();

    let poleward = (bounds.min_lat.abs().max(bounds.max_lat.abs()) + v).min(90.0);
    let h = tolerance_km / Ruler::new(poleward).kx();

    Bounds {
        min_lat: bounds.min_lat - v,
        max_lat: bounds.max_lat + v,
        min_lng: bounds.min_lng - h,
        max_lng: bounds.max_lng + h,
    }
}

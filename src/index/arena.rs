//! Dense storage for the segments of a road network.
//!
//! Segments are exploded from roads once and addressed by integer handle,
//! so index entries stay small and geometry has one owner.

use serde::{Deserialize, Serialize};

use crate::ruler::Ruler;
use crate::{GpsPoint, Road};

/// One edge of a road, between `coords[index]` and `coords[index + 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of the owning road in the network
    pub road: usize,
    /// Segment index within the owning road
    pub index: usize,
    pub start: GpsPoint,
    pub end: GpsPoint,
    /// Compass bearing from `start` to `end` in `[0, 360)`
    pub bearing: f64,
}

/// Append-only collection of every segment in a network.
#[derive(Debug, Clone, Default)]
pub struct SegmentArena {
    segments: Vec<Segment>,
}

impl SegmentArena {
    /// Explode every road into its segments.
    ///
    /// Each bearing is measured with a ruler anchored at the segment's start.
    /// Roads with fewer than two points contribute nothing.
    pub fn from_roads(roads: &[Road]) -> Self {
        let capacity = roads
            .iter()
            .map(|r| r.coords.len().saturating_sub(1))
            .sum();
        let mut arena = Self {
            segments: Vec::with_capacity(capacity),
        };

        for (road_idx, road) in roads.iter().enumerate() {
            for (j, w) in road.coords.windows(2).enumerate() {
                arena.push(Segment {
                    road: road_idx,
                    index: j,
                    start: w[0],
                    end: w[1],
                    bearing: Ruler::from_point(&w[0]).bearing(&w[0], &w[1]),
                });
            }
        }

        arena
    }

    fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Look up a segment by handle.
    pub fn get(&self, handle: usize) -> Option<&Segment> {
        self.segments.get(handle)
    }

    /// Iterate over `(handle, segment)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Segment)> {
        self.segments.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

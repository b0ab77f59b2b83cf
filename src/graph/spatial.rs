//! A static 2-D KD index over node coordinates.
//!
//! Points are sorted once into an implicit KD layout (median split, alternating
//! longitude/latitude axes) and never mutated afterwards, so the index can be
//! shared freely between threads.
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `build` | \(O(n \log n)\) | One `select_nth_unstable` per split |
//! | `range` | \(O(\sqrt{n} + k)\) | `k` = number of reported points |

use super::{BoundingBox, Coordinate, NodeId};

/// Default leaf bucket size below which ranges are scanned linearly.
pub const DEFAULT_BUCKET: usize = 64;

#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    id: NodeId,
    lng: f64,
    lat: f64,
}

impl IndexedPoint {
    #[inline]
    fn axis(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.lng
        } else {
            self.lat
        }
    }

    #[inline]
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lng, self.lat)
    }
}

/// Immutable KD-sorted point index.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    points: Vec<IndexedPoint>,
    bucket: usize,
}

impl SpatialIndex {
    /// Builds an index with the default bucket size.
    pub fn build(points: impl IntoIterator<Item = (NodeId, Coordinate)>) -> Self {
        Self::with_bucket(points, DEFAULT_BUCKET)
    }

    /// Builds an index whose leaves hold at most `bucket` points.
    ///
    /// # Panics
    /// Panics if `bucket == 0`.
    pub fn with_bucket(points: impl IntoIterator<Item = (NodeId, Coordinate)>, bucket: usize) -> Self {
        assert!(bucket != 0, "bucket must be > 0");
        let mut points: Vec<IndexedPoint> = points
            .into_iter()
            .map(|(id, c)| IndexedPoint {
                id,
                lng: c.longitude,
                lat: c.latitude,
            })
            .collect();

        // Explicit stack of half-open ranges and their split axis.
        let mut stack = vec![(0usize, points.len(), 0usize)];
        while let Some((lo, hi, axis)) = stack.pop() {
            if hi - lo <= bucket {
                continue;
            }
            let mid = lo + (hi - lo) / 2;
            points[lo..hi].select_nth_unstable_by(mid - lo, |a, b| a.axis(axis).total_cmp(&b.axis(axis)));
            stack.push((lo, mid, 1 - axis));
            stack.push((mid + 1, hi, 1 - axis));
        }

        Self { points, bucket }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Identifiers of every point inside `bbox` (edges inclusive), in index order.
    pub fn range(&self, bbox: &BoundingBox) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self.points.len(), 0usize)];

        while let Some((lo, hi, axis)) = stack.pop() {
            if hi - lo <= self.bucket {
                out.extend(
                    self.points[lo..hi]
                        .iter()
                        .filter(|p| bbox.contains(p.coordinate()))
                        .map(|p| p.id),
                );
                continue;
            }

            let mid = lo + (hi - lo) / 2;
            let pivot = &self.points[mid];
            if bbox.contains(pivot.coordinate()) {
                out.push(pivot.id);
            }

            let (min, max) = if axis == 0 {
                (bbox.min_lng, bbox.max_lng)
            } else {
                (bbox.min_lat, bbox.max_lat)
            };
            if min <= pivot.axis(axis) {
                stack.push((lo, mid, 1 - axis));
            }
            if max >= pivot.axis(axis) {
                stack.push((mid + 1, hi, 1 - axis));
            }
        }

        out
    }
}

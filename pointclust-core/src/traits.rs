//! Core traits for pointclust

use crate::{point::*, point_cloud::*};

/// Trait for nearest neighbor search functionality
///
/// Implementations are built once over a fixed set of points and are read-only
/// afterwards, so a single index may be queried from many threads at once.
/// Returned ids are positions in the slice the index was built from.
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point
    ///
    /// Results are `(id, distance)` pairs ordered by ascending distance, ties
    /// broken by ascending id. Fewer than `k` pairs are returned only when the
    /// index holds fewer than `k` points.
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)>;

    /// Find all neighbors within a given radius (inclusive)
    ///
    /// Order is unspecified, every id appears at most once. A stored point
    /// that coincides with `query` is always part of the result.
    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)>;

    /// Same as [`find_radius_neighbors`](Self::find_radius_neighbors) without the distances
    fn find_radius_indices(&self, query: &Point3f, radius: f32) -> Vec<usize> {
        self.find_radius_neighbors(query, radius)
            .into_iter()
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Number of indexed points
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for objects with an axis-aligned extent
pub trait Bounded {
    /// Get the bounding box of the object as `(min, max)`
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Midpoint of the bounding box
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

impl<T: Positioned> Bounded for PointCloud<T> {
    /// Component-wise `(min, max)` over all points; the origin for an empty cloud
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let mut positions = self.points.iter().map(Positioned::position);
        let Some(first) = positions.next() else {
            return (Point3f::origin(), Point3f::origin());
        };
        positions.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)))
    }
}

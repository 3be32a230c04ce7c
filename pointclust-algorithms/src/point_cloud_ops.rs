//! Point cloud operations including k-nearest neighbors search

use pointclust_core::{NearestNeighborSearch, PointCloud, Positioned, Result};
use rayon::prelude::*;

use crate::nearest_neighbor::KdTree;

/// Extension trait for PointCloud to add k-nearest neighbors functionality
pub trait PointCloudNeighbors {
    /// Find the k nearest neighbors of every point in the cloud using a KD-tree
    ///
    /// Element `i` of the result holds the `(index, distance)` pairs of the
    /// k points closest to point `i`, excluding point `i` itself, in ascending
    /// distance order (ties by ascending index). Queries run in parallel over
    /// the read-only tree.
    ///
    /// # Example
    /// ```rust
    /// use pointclust_core::{PointCloud, Point3f};
    /// use pointclust_algorithms::point_cloud_ops::PointCloudNeighbors;
    ///
    /// let mut cloud = PointCloud::new();
    /// cloud.push(Point3f::new(0.0, 0.0, 0.0));
    /// cloud.push(Point3f::new(1.0, 0.0, 0.0));
    /// cloud.push(Point3f::new(0.0, 1.0, 0.0));
    ///
    /// let neighbors = cloud.k_nearest_neighbors(2).unwrap();
    /// assert_eq!(neighbors[0].len(), 2);
    /// ```
    fn k_nearest_neighbors(&self, k: usize) -> Result<Vec<Vec<(usize, f32)>>>;

    /// Mean distance from every point to its k nearest neighbors (self excluded)
    fn mean_neighbor_distances(&self, k: usize) -> Result<Vec<f32>> {
        Ok(self
            .k_nearest_neighbors(k)?
            .iter()
            .map(|neighbors| {
                if neighbors.is_empty() {
                    return 0.0;
                }
                neighbors.iter().map(|(_, d)| *d as f64).sum::<f64>() as f32 / neighbors.len() as f32
            })
            .collect())
    }
}

impl<T: Positioned + Sync> PointCloudNeighbors for PointCloud<T> {
    fn k_nearest_neighbors(&self, k: usize) -> Result<Vec<Vec<(usize, f32)>>> {
        let kdtree = KdTree::new(&self.points)?;

        Ok(self.points
            .par_iter()
            .enumerate()
            .map(|(i, point)| {
                let mut neighbors = kdtree.find_k_nearest(&point.position(), k + 1); // +1 to exclude self
                neighbors.retain(|&(idx, _)| idx != i);
                neighbors.truncate(k);
                neighbors
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointclust_core::{Error, Point3f};

    #[test]
    fn test_point_cloud_k_nearest_neighbors() {
        let mut cloud = PointCloud::new();
        cloud.push(Point3f::new(0.0, 0.0, 0.0));
        cloud.push(Point3f::new(1.0, 0.0, 0.0));
        cloud.push(Point3f::new(0.0, 1.0, 0.0));
        cloud.push(Point3f::new(1.0, 1.0, 0.0));

        let neighbors = cloud.k_nearest_neighbors(2).unwrap();
        assert_eq!(neighbors.len(), 4);

        // Each point should have 2 neighbors (excluding itself)
        for (i, point_neighbors) in neighbors.iter().enumerate() {
            assert_eq!(point_neighbors.len(), 2);
            assert!(point_neighbors.iter().all(|(idx, _)| *idx != i));
        }
        // point 0 is equidistant from 1 and 2
        assert_eq!(neighbors[0].iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_self_excluded_among_duplicates() {
        let cloud = PointCloud::from_points(vec![Point3f::new(0.0, 0.0, 0.0); 4]);
        let neighbors = cloud.k_nearest_neighbors(3).unwrap();
        assert_eq!(neighbors[3].iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(neighbors[0].iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_mean_neighbor_distances() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(3.0, 0.0, 0.0),
        ]);
        let means = cloud.mean_neighbor_distances(1).unwrap();
        assert_eq!(means, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_empty_cloud_is_rejected() {
        let cloud = PointCloud::<Point3f>::new();
        assert!(matches!(cloud.k_nearest_neighbors(2), Err(Error::InvalidInput(_))));
    }
}

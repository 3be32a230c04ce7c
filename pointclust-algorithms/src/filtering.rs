//! Filtering algorithms

use std::collections::HashMap;
use std::time::Instant;

use log::debug;
use pointclust_core::{Centroid, Error, Point3f, PointCloud, Positioned, Result};

use crate::point_cloud_ops::PointCloudNeighbors;

/// Integer voxel coordinates `(floor(x/s), floor(y/s), floor(z/s))`
pub type VoxelKey = (i64, i64, i64);

/// Voxel containing `point` for voxel edge length `voxel_size`
#[inline]
pub fn voxel_key(point: &Point3f, voxel_size: f32) -> VoxelKey {
    (
        (point.x / voxel_size).floor() as i64,
        (point.y / voxel_size).floor() as i64,
        (point.z / voxel_size).floor() as i64,
    )
}

/// Voxel grid downsampling
///
/// This algorithm reduces the density of a point cloud by grouping points into voxels
/// and replacing every occupied voxel with the centroid of the points inside it.
/// Attributes that take part in [`Centroid`] (such as colors) are averaged as well.
///
/// Output points appear in the order their voxel was first seen while scanning the
/// input, so the result is deterministic for a given input order and voxel size.
/// The output holds exactly one point per occupied voxel.
///
/// # Arguments
/// * `cloud` - Input point cloud
/// * `voxel_size` - Size of each voxel cube
///
/// # Returns
/// * `Result<PointCloud<T>>` - Downsampled point cloud
///
/// # Example
/// ```rust
/// use pointclust_core::{PointCloud, Point3f};
/// use pointclust_algorithms::voxel_down_sample;
///
/// fn main() -> pointclust_core::Result<()> {
///     let cloud = PointCloud::from_points(vec![
///         Point3f::new(0.0, 0.0, 0.0),
///         Point3f::new(0.1, 0.0, 0.0),
///         Point3f::new(0.0, 0.1, 0.0),
///         Point3f::new(0.5, 0.5, 0.5),
///     ]);
///
///     let filtered = voxel_down_sample(&cloud, 0.2)?;
///     assert_eq!(filtered.len(), 2);
///     Ok(())
/// }
/// ```
pub fn voxel_down_sample<T: Centroid>(cloud: &PointCloud<T>, voxel_size: f32) -> Result<PointCloud<T>> {
    if !(voxel_size > 0.0) || !voxel_size.is_finite() {
        return Err(Error::invalid_parameter(format!(
            "voxel_size must be positive, got {voxel_size}"
        )));
    }

    let start = Instant::now();

    // Group points by voxel, remembering first-seen order
    let mut slot_of_voxel: HashMap<VoxelKey, usize> = HashMap::new();
    let mut accumulators: Vec<(T::Accumulator, usize)> = Vec::new();

    for point in &cloud.points {
        let key = voxel_key(&point.position(), voxel_size);
        let slot = *slot_of_voxel.entry(key).or_insert_with(|| {
            accumulators.push((T::Accumulator::default(), 0));
            accumulators.len() - 1
        });
        let (acc, count) = &mut accumulators[slot];
        T::accumulate(acc, point);
        *count += 1;
    }

    let downsampled: PointCloud<T> = accumulators
        .iter()
        .map(|(acc, count)| T::finish(acc, *count))
        .collect();

    debug!(
        "voxel downsampling: {} -> {} points (voxel size {}) in {:?}",
        cloud.len(),
        downsampled.len(),
        voxel_size,
        start.elapsed()
    );

    Ok(downsampled)
}

/// Per-point inlier decision of the statistical outlier filter
///
/// Returns a mask with `true` for every point whose mean distance to its `k_neighbors`
/// nearest neighbors is at most `mean + std_ratio * std_dev`, where mean and standard
/// deviation are taken over all points. When the standard deviation is numerically
/// zero every point is an inlier.
///
/// Fails with [`Error::InvalidParameter`] under the same conditions as
/// [`statistical_outlier_removal`], `std_ratio <= 0` included.
pub fn statistical_inlier_mask<T: Positioned + Sync>(
    cloud: &PointCloud<T>,
    k_neighbors: usize,
    std_ratio: f32,
) -> Result<Vec<bool>> {
    if k_neighbors == 0 {
        return Err(Error::invalid_parameter("k_neighbors must be greater than 0"));
    }

    if cloud.len() <= k_neighbors {
        return Err(Error::invalid_parameter(format!(
            "statistical outlier removal needs more than k_neighbors = {} points, got {}",
            k_neighbors,
            cloud.len()
        )));
    }

    if !(std_ratio > 0.0) || !std_ratio.is_finite() {
        return Err(Error::invalid_parameter(format!(
            "std_ratio must be positive, got {std_ratio}"
        )));
    }

    let mean_distances = cloud.mean_neighbor_distances(k_neighbors)?;

    // Compute global statistics (sample standard deviation)
    let n = mean_distances.len() as f64;
    let global_mean = mean_distances.iter().map(|&d| d as f64).sum::<f64>() / n;
    let variance = mean_distances
        .iter()
        .map(|&d| (d as f64 - global_mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let global_std_dev = variance.sqrt();

    if global_std_dev <= global_mean.abs() * 1e-6 {
        debug!("statistical outlier removal: uniform neighbor spacing, keeping all points");
        return Ok(vec![true; mean_distances.len()]);
    }

    let threshold = global_mean + std_ratio as f64 * global_std_dev;
    Ok(mean_distances
        .iter()
        .map(|&d| d as f64 <= threshold)
        .collect())
}

/// Statistical outlier removal filter
///
/// This algorithm removes points that are statistical outliers based on the distance
/// to their k-nearest neighbors. For each point, it computes the mean distance to
/// its k nearest neighbors (excluding the point itself). Points with mean distances
/// that exceed the global mean by more than `std_ratio` standard deviations are
/// considered outliers and removed. Retained points keep their relative order.
///
/// # Arguments
/// * `cloud` - Input point cloud
/// * `k_neighbors` - Number of nearest neighbors to consider for each point
/// * `std_ratio` - Standard deviation multiplier for outlier detection
///
/// # Returns
/// * `Result<(PointCloud<T>, usize)>` - Filtered point cloud and the number of removed points
///
/// # Errors
/// Returns [`Error::InvalidParameter`] when `k_neighbors` is 0, when the cloud holds
/// `k_neighbors` points or fewer, or when `std_ratio` is not a positive finite number.
/// A non-positive ratio would turn the threshold into a cut below the mean distance,
/// which is rejected the same way as by Open3D's `remove_statistical_outlier`.
///
/// # Example
/// ```rust
/// use pointclust_core::{PointCloud, Point3f};
/// use pointclust_algorithms::statistical_outlier_removal;
///
/// fn main() -> pointclust_core::Result<()> {
///     let mut points: Vec<Point3f> = (0..10)
///         .flat_map(|i| (0..10).map(move |j| Point3f::new(i as f32, j as f32, 0.0)))
///         .collect();
///     points.push(Point3f::new(0.0, 0.0, 1000.0)); // outlier
///
///     let (filtered, removed) = statistical_outlier_removal(&PointCloud::from_points(points), 5, 2.0)?;
///     assert_eq!(removed, 1);
///     assert_eq!(filtered.len(), 100);
///     Ok(())
/// }
/// ```
pub fn statistical_outlier_removal<T: Positioned + Clone + Sync>(
    cloud: &PointCloud<T>,
    k_neighbors: usize,
    std_ratio: f32,
) -> Result<(PointCloud<T>, usize)> {
    let start = Instant::now();
    let mask = statistical_inlier_mask(cloud, k_neighbors, std_ratio)?;

    let filtered: PointCloud<T> = cloud.points
        .iter()
        .zip(mask.iter())
        .filter(|(_, &keep)| keep)
        .map(|(point, _)| point.clone())
        .collect();
    let removed = cloud.len() - filtered.len();

    debug!(
        "statistical outlier removal: removed {} of {} points (k = {}, std_ratio = {}) in {:?}",
        removed,
        cloud.len(),
        k_neighbors,
        std_ratio,
        start.elapsed()
    );

    Ok((filtered, removed))
}

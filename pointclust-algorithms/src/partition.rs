//! Splitting a labeled point cloud into one cloud per label

use std::collections::BTreeMap;

use pointclust_core::{Bounded, Error, Label, Point3f, PointCloud, Positioned, Result, PositionSum};

/// Split `cloud` into one point cloud per distinct label
///
/// Noise points (label `-1`) form their own group. Points keep their relative
/// order inside each group, and the map iterates in ascending label order.
///
/// # Example
/// ```rust
/// use pointclust_core::{PointCloud, Point3f};
/// use pointclust_algorithms::partition_clusters;
///
/// let cloud = PointCloud::from_points(vec![
///     Point3f::new(0.0, 0.0, 0.0),
///     Point3f::new(1.0, 1.0, 1.0),
///     Point3f::new(2.0, 2.0, 2.0),
/// ]);
/// let groups = partition_clusters(&cloud, &[0, 0, -1]).unwrap();
/// assert_eq!(groups[&0].len(), 2);
/// assert_eq!(groups[&-1].len(), 1);
/// ```
pub fn partition_clusters<T: Clone>(cloud: &PointCloud<T>, labels: &[Label]) -> Result<BTreeMap<Label, PointCloud<T>>> {
    if labels.len() != cloud.len() {
        return Err(Error::invalid_argument(format!(
            "label count {} does not match point count {}",
            labels.len(),
            cloud.len()
        )));
    }

    let mut groups: BTreeMap<Label, PointCloud<T>> = BTreeMap::new();
    for (point, &label) in cloud.points.iter().zip(labels) {
        groups.entry(label).or_default().push(point.clone());
    }
    Ok(groups)
}

/// Per-cluster statistics
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub label: Label,
    pub point_count: usize,
    pub centroid: Point3f,
    /// Axis-aligned bounds as `(min, max)`
    pub bounds: (Point3f, Point3f),
}

impl ClusterSummary {
    /// Summarize one non-empty group of points
    pub fn from_cloud<T: Positioned>(label: Label, cloud: &PointCloud<T>) -> Self {
        let mut sum = PositionSum::default();
        for point in &cloud.points {
            sum.add(&point.position());
        }
        Self {
            label,
            point_count: cloud.len(),
            centroid: sum.mean(cloud.len().max(1)),
            bounds: cloud.bounding_box(),
        }
    }

    pub fn is_noise(&self) -> bool {
        pointclust_core::is_noise(self.label)
    }
}

/// Summaries for every group of a partition, in ascending label order
pub fn summarize_clusters<T: Positioned>(groups: &BTreeMap<Label, PointCloud<T>>) -> Vec<ClusterSummary> {
    groups
        .iter()
        .map(|(&label, cloud)| ClusterSummary::from_cloud(label, cloud))
        .collect()
}

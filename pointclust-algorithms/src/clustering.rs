//! Density-based clustering (DBSCAN)
//!
//! Points are scanned in index order. A point whose `eps`-neighborhood (itself
//! included) holds at least `min_samples` points is a core point and seeds a
//! new cluster, which then grows through every point density-reachable from
//! it. Non-core points reached from a core point become border points of that
//! cluster; everything else is labeled [`NOISE`].
//!
//! Cluster ids depend on scan order, cluster membership does not: reordering
//! the input yields the same partition of points up to a renaming of ids
//! (border points within `eps` of two clusters go to whichever is found first).

use std::time::Instant;

use log::debug;
use pointclust_core::{Error, Label, NearestNeighborSearch, PointCloud, Positioned, Result, NOISE};
use serde::{Deserialize, Serialize};

use crate::nearest_neighbor::{SpatialIndex, SpatialIndexKind};

/// DBSCAN parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbscanParams {
    /// Neighborhood radius
    pub eps: f32,
    /// Minimum neighborhood size (the point itself included) for a core point
    pub min_samples: usize,
    /// Spatial index built over the input
    pub index: SpatialIndexKind,
}

impl DbscanParams {
    pub fn new(eps: f32, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples,
            index: SpatialIndexKind::default(),
        }
    }

    pub fn with_index(mut self, index: SpatialIndexKind) -> Self {
        self.index = index;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.eps > 0.0) || !self.eps.is_finite() {
            return Err(Error::invalid_parameter(format!(
                "eps must be positive, got {}",
                self.eps
            )));
        }
        if self.min_samples == 0 {
            return Err(Error::invalid_parameter("min_samples must be at least 1"));
        }
        Ok(())
    }
}

/// Output of a DBSCAN run
#[derive(Debug, Clone, PartialEq)]
pub struct DbscanResult {
    /// One label per input point: a cluster id in `0..cluster_count` or [`NOISE`]
    pub labels: Vec<Label>,
    /// Number of clusters found
    pub cluster_count: usize,
    /// `true` for core points
    pub core_mask: Vec<bool>,
}

impl DbscanResult {
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    pub fn core_count(&self) -> usize {
        self.core_mask.iter().filter(|&&c| c).count()
    }
}

/// Scan state of a single point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointState {
    Unvisited,
    /// Visited, not core, not (yet) reached by any cluster
    Noise,
    Cluster(Label),
}

/// DBSCAN clusterer
///
/// # Example
/// ```rust
/// use pointclust_core::{PointCloud, Point3f, NOISE};
/// use pointclust_algorithms::{Dbscan, DbscanParams};
///
/// let cloud = PointCloud::from_points(vec![
///     Point3f::new(0.0, 0.0, 0.0),
///     Point3f::new(0.01, 0.0, 0.0),
///     Point3f::new(0.02, 0.0, 0.0),
///     Point3f::new(10.0, 10.0, 10.0),
/// ]);
///
/// let result = Dbscan::new(DbscanParams::new(0.05, 2)).fit(&cloud).unwrap();
/// assert_eq!(result.labels, vec![0, 0, 0, NOISE]);
/// assert_eq!(result.cluster_count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Dbscan {
    params: DbscanParams,
}

impl Dbscan {
    pub fn new(params: DbscanParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DbscanParams {
        &self.params
    }

    /// Cluster a point cloud, building the configured spatial index over it
    pub fn fit<T: Positioned>(&self, cloud: &PointCloud<T>) -> Result<DbscanResult> {
        self.params.validate()?;
        if cloud.is_empty() {
            return Err(Error::invalid_input("cannot cluster an empty point cloud"));
        }

        let start = Instant::now();
        let index = SpatialIndex::build(&cloud.points, self.params.index, self.params.eps)?;
        debug!(
            "dbscan: built {:?} index over {} points in {:?}",
            self.params.index,
            cloud.len(),
            start.elapsed()
        );

        self.fit_with_index(cloud, &index)
    }

    /// Cluster a point cloud using a caller-supplied index built over the same points
    pub fn fit_with_index<T, S>(&self, cloud: &PointCloud<T>, index: &S) -> Result<DbscanResult>
    where
        T: Positioned,
        S: NearestNeighborSearch + ?Sized,
    {
        self.params.validate()?;
        if cloud.is_empty() {
            return Err(Error::invalid_input("cannot cluster an empty point cloud"));
        }
        if index.len() != cloud.len() {
            return Err(Error::invalid_argument(format!(
                "index holds {} points but the cloud has {}",
                index.len(),
                cloud.len()
            )));
        }

        let start = Instant::now();
        let eps = self.params.eps;
        let min_samples = self.params.min_samples;
        let n = cloud.len();

        let mut state = vec![PointState::Unvisited; n];
        let mut core_mask = vec![false; n];
        let mut next_cluster: Label = 0;
        let mut worklist: Vec<usize> = Vec::new();

        for p in 0..n {
            if state[p] != PointState::Unvisited {
                continue;
            }

            let neighbors = index.find_radius_indices(&cloud.points[p].position(), eps);
            if neighbors.len() < min_samples {
                // may still be claimed as a border point later
                state[p] = PointState::Noise;
                continue;
            }

            let cluster = next_cluster;
            state[p] = PointState::Cluster(cluster);
            core_mask[p] = true;
            worklist.clear();
            worklist.extend(neighbors);

            while let Some(q) = worklist.pop() {
                match state[q] {
                    PointState::Noise => {
                        // border point, never expands the cluster
                        state[q] = PointState::Cluster(cluster);
                    }
                    PointState::Unvisited => {
                        state[q] = PointState::Cluster(cluster);
                        let reach = index.find_radius_indices(&cloud.points[q].position(), eps);
                        if reach.len() >= min_samples {
                            core_mask[q] = true;
                            worklist.extend(
                                reach.into_iter().filter(|&r| !matches!(state[r], PointState::Cluster(_))),
                            );
                        }
                    }
                    PointState::Cluster(_) => {}
                }
            }

            next_cluster += 1;
        }

        let labels: Vec<Label> = state
            .into_iter()
            .map(|s| match s {
                PointState::Cluster(label) => label,
                PointState::Noise | PointState::Unvisited => NOISE,
            })
            .collect();

        let result = DbscanResult {
            labels,
            cluster_count: next_cluster as usize,
            core_mask,
        };

        debug!(
            "dbscan: {} points -> {} clusters, {} core, {} noise (eps = {}, min_samples = {}) in {:?}",
            n,
            result.cluster_count,
            result.core_count(),
            result.noise_count(),
            eps,
            min_samples,
            start.elapsed()
        );

        Ok(result)
    }
}

/// Cluster `cloud` with DBSCAN and return one label per point (`-1` = noise)
pub fn dbscan<T: Positioned>(cloud: &PointCloud<T>, eps: f32, min_samples: usize) -> Result<Vec<Label>> {
    Ok(Dbscan::new(DbscanParams::new(eps, min_samples)).fit(cloud)?.labels)
}

/// Run DBSCAN over an existing spatial index built from `cloud`'s points
pub fn dbscan_with_index<T, S>(
    cloud: &PointCloud<T>,
    index: &S,
    eps: f32,
    min_samples: usize,
) -> Result<DbscanResult>
where
    T: Positioned,
    S: NearestNeighborSearch + ?Sized,
{
    Dbscan::new(DbscanParams::new(eps, min_samples)).fit_with_index(cloud, index)
}

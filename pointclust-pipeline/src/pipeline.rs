//! Clustering pipeline
//!
//! Runs the stages in order for one cloud:
//! voxel downsampling, optional statistical outlier removal, DBSCAN and
//! partitioning into per-cluster clouds. Several clouds can be processed in
//! parallel with [`run_batch`]; each one gets its own pipeline run and no
//! state is shared between them.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use log::info;
use pointclust_algorithms::{
    partition_clusters, statistical_outlier_removal, summarize_clusters, voxel_down_sample, ClusterSummary, Dbscan,
    DbscanResult,
};
use pointclust_core::{Centroid, Error, Label, PointCloud, Positioned, Result};
use rayon::prelude::*;

use crate::config::CloudConfig;
use crate::io::PointSource;

/// Everything produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput<T> {
    /// Number of points handed to the pipeline
    pub input_count: usize,
    /// Number of points left after voxel downsampling
    pub downsampled_count: usize,
    /// Points removed by outlier filtering (0 when disabled)
    pub removed_outliers: usize,
    /// The cloud that was clustered; `labels` is parallel to it
    pub processed: PointCloud<T>,
    pub labels: Vec<Label>,
    pub core_mask: Vec<bool>,
    pub cluster_count: usize,
    /// One cloud per label, noise included under `-1`
    pub clusters: BTreeMap<Label, PointCloud<T>>,
    pub summaries: Vec<ClusterSummary>,
    pub elapsed: Duration,
}

impl<T> PipelineOutput<T> {
    pub fn noise_count(&self) -> usize {
        self.clusters.get(&pointclust_core::NOISE).map_or(0, |c| c.len())
    }
}

/// Pipeline for a single cloud configuration
#[derive(Debug, Clone)]
pub struct ClusterPipeline {
    config: CloudConfig,
}

impl ClusterPipeline {
    /// Create a pipeline, rejecting invalid configuration up front
    pub fn new(config: CloudConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Downsample and, when configured, remove outliers
    ///
    /// Returns the filtered cloud and the number of removed outliers.
    pub fn preprocess<T>(&self, cloud: &PointCloud<T>) -> Result<(PointCloud<T>, usize)>
    where
        T: Centroid + Clone + Sync,
    {
        if cloud.is_empty() {
            return Err(Error::invalid_input("cannot process an empty point cloud"));
        }

        let downsampled = voxel_down_sample(cloud, self.config.voxel_size)?;
        match &self.config.outlier_removal {
            Some(outliers) => statistical_outlier_removal(&downsampled, outliers.k_neighbors, outliers.std_ratio),
            None => Ok((downsampled, 0)),
        }
    }

    /// Cluster an already preprocessed cloud
    pub fn cluster<T: Positioned>(&self, processed: &PointCloud<T>) -> Result<DbscanResult> {
        Dbscan::new(self.config.clustering.params()).fit(processed)
    }

    /// Run every stage on `cloud`
    pub fn run<T>(&self, cloud: &PointCloud<T>) -> Result<PipelineOutput<T>>
    where
        T: Centroid + Clone + Sync,
    {
        let start = Instant::now();

        let (processed, removed_outliers) = self.preprocess(cloud)?;
        let downsampled_count = processed.len() + removed_outliers;

        let DbscanResult {
            labels,
            cluster_count,
            core_mask,
        } = self.cluster(&processed)?;

        let clusters = partition_clusters(&processed, &labels)?;
        let summaries = summarize_clusters(&clusters);

        let output = PipelineOutput {
            input_count: cloud.len(),
            downsampled_count,
            removed_outliers,
            processed,
            labels,
            core_mask,
            cluster_count,
            clusters,
            summaries,
            elapsed: start.elapsed(),
        };

        info!(
            "pipeline: {} points -> {} after downsampling, {} outliers removed, {} clusters, {} noise points in {:?}",
            output.input_count,
            output.downsampled_count,
            output.removed_outliers,
            output.cluster_count,
            output.noise_count(),
            output.elapsed
        );

        Ok(output)
    }

    /// Read a cloud from `source` and run every stage on it
    pub fn run_source<T, S>(&self, source: &mut S) -> Result<PipelineOutput<T>>
    where
        T: Centroid + Clone + Sync,
        S: PointSource<T> + ?Sized,
    {
        let cloud = source.read_points()?;
        self.run(&cloud)
    }
}

/// One named cloud together with its processing settings
#[derive(Debug, Clone)]
pub struct ClusterJob<T> {
    pub name: String,
    pub cloud: PointCloud<T>,
    pub config: CloudConfig,
}

impl<T> ClusterJob<T> {
    pub fn new(name: impl Into<String>, cloud: PointCloud<T>, config: CloudConfig) -> Self {
        Self {
            name: name.into(),
            cloud,
            config,
        }
    }
}

/// Result of one job of a batch
#[derive(Debug)]
pub struct JobOutput<T> {
    pub name: String,
    pub result: Result<PipelineOutput<T>>,
}

/// Process several clouds in parallel
///
/// Jobs are independent: one failing job does not affect the others.
/// Results come back in the order of `jobs`.
pub fn run_batch<T>(jobs: &[ClusterJob<T>]) -> Vec<JobOutput<T>>
where
    T: Centroid + Clone + Send + Sync,
{
    jobs.par_iter()
        .map(|job| {
            info!("Clustering {} ({} points)...", job.name, job.cloud.len());
            let result = ClusterPipeline::new(job.config.clone()).and_then(|pipeline| pipeline.run(&job.cloud));
            JobOutput {
                name: job.name.clone(),
                result,
            }
        })
        .collect()
}

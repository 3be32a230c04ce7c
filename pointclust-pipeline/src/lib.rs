//! # pointclust Pipeline
//!
//! Configuration and orchestration of the clustering stages.
//!
//! A [`ClusterPipeline`] takes one [`CloudConfig`] and runs voxel
//! downsampling, optional outlier removal, DBSCAN and partitioning on a cloud.
//! [`run_batch`] processes several clouds in parallel, and [`export_clusters`]
//! hands the resulting groups to a [`ClusterSink`].
//!
//! ```rust
//! use pointclust_core::{Point3f, PointCloud};
//! use pointclust_pipeline::{CloudConfig, ClusterPipeline};
//!
//! let cloud: PointCloud<Point3f> = (0..40)
//!     .map(|i| Point3f::new(i as f32 * 0.01, 0.0, 0.0))
//!     .collect();
//! let config = CloudConfig::ideal().with_voxel_size(0.001).with_clustering(0.02, 3);
//! let output = ClusterPipeline::new(config).unwrap().run(&cloud).unwrap();
//! assert_eq!(output.cluster_count, 1);
//! ```

pub mod config;
pub mod io;
pub mod pipeline;

pub use config::*;
pub use io::*;
pub use pipeline::*;

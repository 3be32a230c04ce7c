//! # pointclust
//!
//! Density-based clustering of 3D point clouds.
//!
//! This is the umbrella crate that provides convenient access to all pointclust
//! functionality. You can use this crate to get everything in one place, or use
//! individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Points, point clouds, cluster labels and the error type
//! - **Algorithms**: Spatial indexes, voxel downsampling, statistical outlier
//!   removal, DBSCAN and cluster partitioning
//! - **Pipeline**: Per-cloud configuration, single and batch pipeline runs,
//!   point source and cluster sink seams
//!
//! ## Quick Start
//!
//! ```rust
//! use pointclust::prelude::*;
//!
//! let points: Vec<Point3f> = (0..30)
//!     .map(|i| Point3f::new(i as f32 * 0.01, 0.0, 0.0))
//!     .collect();
//! let cloud = PointCloud::from_points(points);
//!
//! let downsampled = voxel_down_sample(&cloud, 0.001).unwrap();
//! let labels = dbscan(&downsampled, 0.02, 3).unwrap();
//! let clusters = partition_clusters(&downsampled, &labels).unwrap();
//! assert_eq!(clusters.len(), 1);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables algorithms and pipeline
//! - `algorithms`: Processing stages
//! - `pipeline`: Pipeline orchestration (implies `algorithms`)
//! - `all`: Enables all features

// Re-export core functionality
pub use pointclust_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use pointclust_algorithms as algorithms;

#[cfg(feature = "pipeline")]
pub use pointclust_pipeline as pipeline;

/// Convenient imports for common use cases
pub mod prelude {
    pub use pointclust_core::*;

    #[cfg(feature = "algorithms")]
    pub use pointclust_algorithms::*;

    #[cfg(feature = "pipeline")]
    pub use pointclust_pipeline::*;
}

//! # pointclust Algorithms
//!
//! Processing stages for 3D point clouds.
//!
//! This crate provides spatial indexing (kd-tree, uniform grid), voxel grid
//! downsampling, statistical outlier removal, DBSCAN clustering and
//! partitioning of a labeled cloud into per-cluster clouds. Every stage reads
//! its input by reference and returns newly allocated output.

pub mod filtering;
pub mod nearest_neighbor;
pub mod point_cloud_ops;
pub mod clustering;
pub mod partition;

// Re-export commonly used items
pub use filtering::*;
pub use nearest_neighbor::*;
pub use point_cloud_ops::*;
pub use clustering::*;
pub use partition::*;

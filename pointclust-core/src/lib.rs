//! Core data structures and traits for pointclust
//!
//! This crate provides the fundamental types shared by every processing stage:
//! points, point clouds, cluster labels, the nearest neighbor search contract
//! and the error type.

pub mod point;
pub mod point_cloud;
pub mod label;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use label::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

// Type aliases for easier imports
pub type Point = Point3f;

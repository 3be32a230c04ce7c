//! Pipeline configuration
//!
//! Every parameter a stage needs is passed explicitly through these structs.
//! They derive serde traits so a front end can load them from any format; all
//! fields fall back to their defaults when omitted.

use pointclust_algorithms::{DbscanParams, SpatialIndexKind};
use pointclust_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Statistical outlier removal settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Number of nearest neighbors used for the mean distance of each point
    pub k_neighbors: usize,
    /// Points farther than `mean + std_ratio * std_dev` are removed
    pub std_ratio: f32,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 20,
            std_ratio: 2.0,
        }
    }
}

/// DBSCAN settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Density-reachability radius
    pub eps: f32,
    /// Minimum neighborhood size (point included) of a core point
    pub min_samples: usize,
    /// Spatial index used for neighborhood queries
    pub index: SpatialIndexKind,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            eps: 0.05,
            min_samples: 10,
            index: SpatialIndexKind::KdTree,
        }
    }
}

impl ClusteringConfig {
    pub fn params(&self) -> DbscanParams {
        DbscanParams::new(self.eps, self.min_samples).with_index(self.index)
    }
}

/// Processing settings for one input cloud
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Edge length of the downsampling voxels
    pub voxel_size: f32,
    /// Outlier removal runs only when this is set
    pub outlier_removal: Option<OutlierConfig>,
    pub clustering: ClusteringConfig,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self::ideal()
    }
}

impl CloudConfig {
    /// Settings for clean, synthetic scans: no outlier removal, tight clusters
    pub fn ideal() -> Self {
        Self {
            voxel_size: 0.05,
            outlier_removal: None,
            clustering: ClusteringConfig {
                eps: 0.05,
                min_samples: 10,
                index: SpatialIndexKind::KdTree,
            },
        }
    }

    /// Settings for noisy sensor scans: outlier removal and a wider, denser neighborhood
    pub fn real_world() -> Self {
        Self {
            voxel_size: 0.05,
            outlier_removal: Some(OutlierConfig::default()),
            clustering: ClusteringConfig {
                eps: 0.1,
                min_samples: 20,
                index: SpatialIndexKind::KdTree,
            },
        }
    }

    pub fn with_voxel_size(mut self, voxel_size: f32) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    pub fn with_outlier_removal(mut self, outlier_removal: Option<OutlierConfig>) -> Self {
        self.outlier_removal = outlier_removal;
        self
    }

    pub fn with_clustering(mut self, eps: f32, min_samples: usize) -> Self {
        self.clustering.eps = eps;
        self.clustering.min_samples = min_samples;
        self
    }

    pub fn with_index(mut self, index: SpatialIndexKind) -> Self {
        self.clustering.index = index;
        self
    }

    /// Reject invalid parameters before any stage runs
    pub fn validate(&self) -> Result<()> {
        if !(self.voxel_size > 0.0) || !self.voxel_size.is_finite() {
            return Err(Error::invalid_parameter(format!(
                "voxel_size must be positive, got {}",
                self.voxel_size
            )));
        }
        if let Some(outliers) = &self.outlier_removal {
            if outliers.k_neighbors == 0 {
                return Err(Error::invalid_parameter("k_neighbors must be greater than 0"));
            }
            if !(outliers.std_ratio > 0.0) || !outliers.std_ratio.is_finite() {
                return Err(Error::invalid_parameter(format!(
                    "std_ratio must be positive, got {}",
                    outliers.std_ratio
                )));
            }
        }
        self.clustering.params().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let ideal = CloudConfig::ideal();
        assert_eq!(ideal.voxel_size, 0.05);
        assert!(ideal.outlier_removal.is_none());
        assert_eq!(ideal.clustering.eps, 0.05);
        assert_eq!(ideal.clustering.min_samples, 10);

        let real = CloudConfig::real_world();
        assert_eq!(real.outlier_removal, Some(OutlierConfig { k_neighbors: 20, std_ratio: 2.0 }));
        assert_eq!(real.clustering.eps, 0.1);
        assert_eq!(real.clustering.min_samples, 20);
        assert!(real.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            CloudConfig::ideal().with_voxel_size(0.0).validate(),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            CloudConfig::ideal().with_clustering(-0.1, 5).validate(),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            CloudConfig::ideal().with_clustering(0.1, 0).validate(),
            Err(Error::InvalidParameter(_))
        ));
        let bad_outliers = CloudConfig::ideal().with_outlier_removal(Some(OutlierConfig {
            k_neighbors: 0,
            std_ratio: 2.0,
        }));
        assert!(matches!(bad_outliers.validate(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_toml_serialization() {
        let config = CloudConfig::real_world().with_index(SpatialIndexKind::UniformGrid);
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[outlier_removal]"));
        assert!(toml_string.contains("[clustering]"));
        assert!(toml_string.contains("index = \"uniform_grid\""));

        let parsed: CloudConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_toml_deserialization_with_defaults() {
        let toml_content = r#"
voxel_size = 0.02

[clustering]
eps = 0.2
"#;
        let config: CloudConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.voxel_size, 0.02);
        assert!(config.outlier_removal.is_none());
        assert_eq!(config.clustering.eps, 0.2);
        assert_eq!(config.clustering.min_samples, 10);
        assert_eq!(config.clustering.index, SpatialIndexKind::KdTree);
    }
}

//! Seams to the point source and cluster sink collaborators
//!
//! File formats live outside this workspace. A reader only has to produce a
//! [`PointCloud`], a writer only has to accept one cloud per cluster label.

use std::collections::BTreeMap;

use log::info;
use pointclust_core::{Label, PointCloud, Result};

/// Produces the raw points of one scan
pub trait PointSource<T> {
    fn read_points(&mut self) -> Result<PointCloud<T>>;
}

/// Accepts the points of one cluster at a time
pub trait ClusterSink<T> {
    /// `name` is the suggested output name, see [`cluster_output_name`]
    fn write_cluster(&mut self, name: &str, label: Label, cloud: &PointCloud<T>) -> Result<()>;
}

/// Output name of one cluster: `"{prefix}_cluster_{label}"`
pub fn cluster_output_name(prefix: &str, label: Label) -> String {
    format!("{prefix}_cluster_{label}")
}

/// Hand every group of a partition to `sink`, in ascending label order
///
/// Returns the number of clusters written. The first sink error aborts the export.
pub fn export_clusters<T, S>(prefix: &str, clusters: &BTreeMap<Label, PointCloud<T>>, sink: &mut S) -> Result<usize>
where
    S: ClusterSink<T> + ?Sized,
{
    for (&label, cloud) in clusters {
        let name = cluster_output_name(prefix, label);
        sink.write_cluster(&name, label, cloud)?;
        info!("Cluster {} saved as {} ({} points)", label, name, cloud.len());
    }
    Ok(clusters.len())
}

/// A point source over points already in memory
#[derive(Debug, Clone)]
pub struct MemorySource<T> {
    cloud: PointCloud<T>,
}

impl<T> MemorySource<T> {
    pub fn new(cloud: PointCloud<T>) -> Self {
        Self { cloud }
    }
}

impl<T: Clone> PointSource<T> for MemorySource<T> {
    fn read_points(&mut self) -> Result<PointCloud<T>> {
        Ok(self.cloud.clone())
    }
}

/// A sink that keeps every written cluster in memory
#[derive(Debug, Clone)]
pub struct MemorySink<T> {
    pub written: Vec<(String, Label, PointCloud<T>)>,
}

impl<T> MemorySink<T> {
    pub fn new() -> Self {
        Self { written: Vec::new() }
    }

    pub fn names(&self) -> Vec<&str> {
        self.written.iter().map(|(name, _, _)| name.as_str()).collect()
    }
}

impl<T> Default for MemorySink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ClusterSink<T> for MemorySink<T> {
    fn write_cluster(&mut self, name: &str, label: Label, cloud: &PointCloud<T>) -> Result<()> {
        self.written.push((name.to_string(), label, cloud.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointclust_core::{Error, Point3f, NOISE};

    struct FailingSink;

    impl ClusterSink<Point3f> for FailingSink {
        fn write_cluster(&mut self, _name: &str, _label: Label, _cloud: &PointCloud<Point3f>) -> Result<()> {
            Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }
    }

    fn clusters() -> BTreeMap<Label, PointCloud<Point3f>> {
        let mut clusters = BTreeMap::new();
        clusters.insert(1, PointCloud::from_points(vec![Point3f::new(1.0, 0.0, 0.0)]));
        clusters.insert(NOISE, PointCloud::from_points(vec![Point3f::new(9.0, 9.0, 9.0)]));
        clusters.insert(0, PointCloud::from_points(vec![Point3f::origin(), Point3f::origin()]));
        clusters
    }

    #[test]
    fn test_cluster_output_name() {
        assert_eq!(cluster_output_name("ideal_data", 3), "ideal_data_cluster_3");
        assert_eq!(cluster_output_name("real_world_data", NOISE), "real_world_data_cluster_-1");
    }

    #[test]
    fn test_export_clusters_in_label_order() {
        let mut sink = MemorySink::new();
        let written = export_clusters("scan", &clusters(), &mut sink).unwrap();
        assert_eq!(written, 3);
        assert_eq!(sink.names(), vec!["scan_cluster_-1", "scan_cluster_0", "scan_cluster_1"]);
        assert_eq!(sink.written[1].2.len(), 2);
    }

    #[test]
    fn test_export_propagates_sink_errors() {
        let result = export_clusters("scan", &clusters(), &mut FailingSink);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new(PointCloud::from_points(vec![Point3f::origin()]));
        assert_eq!(source.read_points().unwrap().len(), 1);
    }
}

//! Integration tests for pointclust-algorithms
//!
//! These tests check properties that must hold across the processing stages:
//! downsampling bounds and idempotence, label ranges, density-connectivity,
//! permutation invariance of DBSCAN membership and lossless partitioning.

use std::collections::BTreeSet;

use pointclust_algorithms::*;
use pointclust_core::{NearestNeighborSearch, Point3f, PointCloud, NOISE};
use rand::prelude::*;
use rand::rngs::StdRng;

/// Gaussian-ish blobs around the given centers plus uniform background noise
fn create_blob_cloud(centers: &[Point3f], per_blob: usize, noise: usize, seed: u64) -> PointCloud<Point3f> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::new();
    for center in centers {
        for _ in 0..per_blob {
            // sum of uniforms approximates a normal distribution
            let mut offset = || (0..4).map(|_| rng.gen_range(-0.5f32..0.5)).sum::<f32>() * 0.25;
            points.push(Point3f::new(center.x + offset(), center.y + offset(), center.z + offset()));
        }
    }
    for _ in 0..noise {
        points.push(Point3f::new(
            rng.gen_range(-50.0..50.0),
            rng.gen_range(-50.0..50.0),
            rng.gen_range(-50.0..50.0),
        ));
    }
    PointCloud::from_points(points)
}

fn blob_centers() -> Vec<Point3f> {
    vec![
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(10.0, 0.0, 0.0),
        Point3f::new(0.0, 10.0, 5.0),
    ]
}

/// Partition as a set of sets of original point ids, ignoring label values
fn membership(labels: &[i32], ids: &[usize]) -> BTreeSet<BTreeSet<usize>> {
    let mut groups: std::collections::BTreeMap<i32, BTreeSet<usize>> = Default::default();
    for (pos, &label) in labels.iter().enumerate() {
        if label != NOISE {
            groups.entry(label).or_default().insert(ids[pos]);
        }
    }
    groups.into_values().collect()
}

#[test]
fn test_downsample_bounds_and_size() {
    let cloud = create_blob_cloud(&blob_centers(), 500, 50, 1);
    let voxel_size = 0.2;
    let downsampled = voxel_down_sample(&cloud, voxel_size).unwrap();

    assert!(downsampled.len() <= cloud.len());

    let occupied: BTreeSet<VoxelKey> = cloud.points.iter().map(|p| voxel_key(p, voxel_size)).collect();
    assert_eq!(downsampled.len(), occupied.len());
    for point in &downsampled.points {
        assert!(occupied.contains(&voxel_key(point, voxel_size)));
    }
}

#[test]
fn test_downsample_is_idempotent() {
    let cloud = create_blob_cloud(&blob_centers(), 400, 0, 2);
    let once = voxel_down_sample(&cloud, 0.25).unwrap();
    let twice = voxel_down_sample(&once, 0.25).unwrap();
    assert_eq!(once.len(), twice.len());
    for (a, b) in once.points.iter().zip(twice.points.iter()) {
        assert!((a - b).norm() < 1e-5);
    }
}

#[test]
fn test_downsample_is_deterministic() {
    let cloud = create_blob_cloud(&blob_centers(), 300, 30, 3);
    assert_eq!(voxel_down_sample(&cloud, 0.1).unwrap(), voxel_down_sample(&cloud, 0.1).unwrap());
}

#[test]
fn test_outlier_removal_far_point_scenario() {
    let mut points = Vec::new();
    for i in 0..10 {
        for j in 0..10 {
            points.push(Point3f::new(i as f32, j as f32, 0.0));
        }
    }
    points.push(Point3f::new(4.5, 4.5, 1000.0));
    let cloud = PointCloud::from_points(points);

    let (filtered, removed) = statistical_outlier_removal(&cloud, 5, 2.0).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(filtered.points, cloud.points[..100].to_vec());
}

#[test]
fn test_dbscan_label_range_and_core_connectivity() {
    let cloud = create_blob_cloud(&blob_centers(), 300, 40, 4);
    let eps = 0.3;
    let result = Dbscan::new(DbscanParams::new(eps, 8)).fit(&cloud).unwrap();

    assert_eq!(result.labels.len(), cloud.len());
    for &label in &result.labels {
        assert!(label == NOISE || (0..result.cluster_count as i32).contains(&label));
    }
    // every label id in range is actually used
    assert_eq!(pointclust_core::cluster_count(&result.labels), result.cluster_count);

    // a core point shares its label with every point within eps, and such points are never noise
    let tree = KdTree::new(&cloud.points).unwrap();
    for (i, point) in cloud.points.iter().enumerate() {
        if !result.core_mask[i] {
            continue;
        }
        for j in tree.find_radius_indices(point, eps) {
            assert_ne!(result.labels[j], NOISE);
            if result.core_mask[j] {
                assert_eq!(result.labels[i], result.labels[j]);
            }
        }
    }
}

#[test]
fn test_dbscan_membership_is_permutation_invariant() {
    let cloud = create_blob_cloud(&blob_centers(), 250, 25, 5);
    let eps = 0.35;
    let min_samples = 6;

    let ids: Vec<usize> = (0..cloud.len()).collect();
    let labels = dbscan(&cloud, eps, min_samples).unwrap();
    let reference = membership(&labels, &ids);
    assert_eq!(reference.len(), 3);

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..3 {
        let mut shuffled_ids = ids.clone();
        shuffled_ids.shuffle(&mut rng);
        let shuffled = cloud.select(&shuffled_ids);
        let shuffled_labels = dbscan(&shuffled, eps, min_samples).unwrap();
        assert_eq!(membership(&shuffled_labels, &shuffled_ids), reference);
    }
}

#[test]
fn test_dbscan_kd_tree_and_grid_agree_on_large_input() {
    let cloud = create_blob_cloud(&blob_centers(), 3000, 300, 6);
    let params = DbscanParams::new(0.15, 10);
    let tree = Dbscan::new(params).fit(&cloud).unwrap();
    let grid = Dbscan::new(params.with_index(SpatialIndexKind::UniformGrid)).fit(&cloud).unwrap();
    assert_eq!(tree, grid);
}

#[test]
fn test_partition_round_trip() {
    let cloud = create_blob_cloud(&blob_centers(), 200, 20, 7);
    let labels = dbscan(&cloud, 0.3, 5).unwrap();
    let groups = partition_clusters(&cloud, &labels).unwrap();

    let total: usize = groups.values().map(|g| g.len()).sum();
    assert_eq!(total, cloud.len());

    let key = |p: &Point3f| (p.x.to_bits(), p.y.to_bits(), p.z.to_bits());
    let mut original: Vec<_> = cloud.points.iter().map(key).collect();
    let mut recombined: Vec<_> = groups.values().flat_map(|g| g.points.iter().map(key)).collect();
    original.sort_unstable();
    recombined.sort_unstable();
    assert_eq!(original, recombined);
}

#[test]
fn test_full_chain() {
    let cloud = create_blob_cloud(&blob_centers(), 2000, 100, 8);
    let downsampled = voxel_down_sample(&cloud, 0.05).unwrap();
    let (filtered, removed) = statistical_outlier_removal(&downsampled, 20, 2.0).unwrap();
    assert_eq!(filtered.len() + removed, downsampled.len());

    let result = Dbscan::new(DbscanParams::new(0.3, 10)).fit(&filtered).unwrap();
    assert!(result.cluster_count >= 3);
    let groups = partition_clusters(&filtered, &result.labels).unwrap();
    let summaries = summarize_clusters(&groups);
    assert_eq!(
        summaries.iter().filter(|s| !s.is_noise()).count(),
        result.cluster_count
    );
}

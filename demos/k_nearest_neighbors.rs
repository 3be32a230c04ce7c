//! Nearest neighbor queries with the kd-tree, the uniform grid and brute force

use pointclust_algorithms::{BruteForceSearch, KdTree, PointCloudNeighbors, UniformGrid};
use pointclust_core::{NearestNeighborSearch, Point3f, PointCloud};
use rand::prelude::*;
use rand::rngs::StdRng;

fn main() -> anyhow::Result<()> {
    println!("=== K-Nearest Neighbors ===\n");

    let mut cloud = PointCloud::new();
    for x in 0..5 {
        for y in 0..5 {
            for z in 0..3 {
                cloud.push(Point3f::new(x as f32, y as f32, z as f32));
            }
        }
    }

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        cloud.push(Point3f::new(
            rng.gen_range(-2.0..7.0),
            rng.gen_range(-2.0..7.0),
            rng.gen_range(-1.0..4.0),
        ));
    }
    println!("Point cloud with {} points\n", cloud.len());

    println!("1. Neighbors of every point (self excluded):");
    let neighbors = cloud.k_nearest_neighbors(3)?;
    for (i, point_neighbors) in neighbors.iter().take(5).enumerate() {
        println!("   Point {}: {:?}", i, point_neighbors);
    }
    println!("   ... and {} more points\n", neighbors.len().saturating_sub(5));

    let kdtree = KdTree::new(&cloud.points)?;
    let grid = UniformGrid::new(&cloud.points, 1.0)?;
    let brute_force = BruteForceSearch::new(&cloud.points)?;

    let query = Point3f::new(2.5, 2.5, 1.5);
    println!("2. Five nearest neighbors of {:?}:", query);
    for (i, (idx, distance)) in kdtree.find_k_nearest(&query, 5).iter().enumerate() {
        println!("   {}. Point {} at distance {:.3}", i + 1, idx, distance);
    }
    println!();

    let radius = 2.0;
    let within = grid.find_radius_neighbors(&query, radius);
    println!("3. {} points within radius {} (grid with {} cells)\n", within.len(), radius, grid.cell_count());

    println!("4. Index agreement over 100 random queries:");
    let queries: Vec<Point3f> = (0..100)
        .map(|_| Point3f::new(rng.gen_range(-1.0..6.0), rng.gen_range(-1.0..6.0), rng.gen_range(0.0..3.0)))
        .collect();
    let agree = queries.iter().all(|q| {
        let expected = brute_force.find_k_nearest(q, 5);
        kdtree.find_k_nearest(q, 5) == expected && grid.find_k_nearest(q, 5) == expected
    });
    println!("   kd-tree and grid match brute force: {}", agree);

    Ok(())
}

//! Cluster an ideal and a real-world scan side by side
//!
//! Both scans are generated here: a few box-shaped objects sampled on a
//! regular lattice, and a copy of them with sensor jitter, background clutter
//! and stray far-away returns. The ideal scan runs without outlier removal, the
//! real-world scan with it, and every cluster is exported under
//! `ideal_data_cluster_<label>` / `real_world_data_cluster_<label>`.
//!
//! Usage: `compare_scans [real_world_config.toml]`

use anyhow::Context;
use log::info;
use pointclust_core::{Point3f, PointCloud};
use pointclust_pipeline::{export_clusters, run_batch, CloudConfig, ClusterJob, MemorySink};
use rand::prelude::*;
use rand::rngs::StdRng;

/// Axis-aligned boxes given as (min corner, size)
fn scene_objects() -> Vec<(Point3f, Point3f)> {
    vec![
        (Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 1.0, 0.6)),
        (Point3f::new(3.0, 0.5, 0.0), Point3f::new(0.6, 0.6, 1.2)),
        (Point3f::new(1.0, 3.0, 0.0), Point3f::new(1.5, 0.5, 0.8)),
    ]
}

fn sample_objects(spacing: f32) -> Vec<Point3f> {
    let mut points = Vec::new();
    for (min, size) in scene_objects() {
        let steps = |extent: f32| (extent / spacing).round() as usize + 1;
        for i in 0..steps(size.x) {
            for j in 0..steps(size.y) {
                for k in 0..steps(size.z) {
                    points.push(Point3f::new(
                        min.x + i as f32 * spacing,
                        min.y + j as f32 * spacing,
                        min.z + k as f32 * spacing,
                    ));
                }
            }
        }
    }
    points
}

fn ideal_scan() -> PointCloud<Point3f> {
    PointCloud::from_points(sample_objects(0.02))
}

fn real_world_scan(seed: u64) -> PointCloud<Point3f> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points: Vec<Point3f> = sample_objects(0.02)
        .into_iter()
        .map(|p| {
            Point3f::new(
                p.x + rng.gen_range(-0.005..0.005),
                p.y + rng.gen_range(-0.005..0.005),
                p.z + rng.gen_range(-0.005..0.005),
            )
        })
        .collect();

    for _ in 0..2_000 {
        points.push(Point3f::new(
            rng.gen_range(-2.0..6.0),
            rng.gen_range(-2.0..6.0),
            rng.gen_range(0.0..3.0),
        ));
    }
    for _ in 0..50 {
        points.push(Point3f::new(
            rng.gen_range(50.0..80.0),
            rng.gen_range(50.0..80.0),
            rng.gen_range(20.0..40.0),
        ));
    }
    points.shuffle(&mut rng);
    PointCloud::from_points(points)
}

fn load_real_world_config() -> anyhow::Result<CloudConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let content = std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
            let config = toml::from_str(&content).with_context(|| format!("failed to parse {path}"))?;
            info!("Loaded real-world settings from {}", path);
            Ok(config)
        }
        None => Ok(CloudConfig::real_world()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Ideal vs Real-World Scan Clustering ===\n");

    let jobs = vec![
        ClusterJob::new("ideal_data", ideal_scan(), CloudConfig::ideal()),
        ClusterJob::new("real_world_data", real_world_scan(42), load_real_world_config()?),
    ];

    let mut sink = MemorySink::new();
    for job_output in run_batch(&jobs) {
        let output = job_output
            .result
            .with_context(|| format!("clustering {} failed", job_output.name))?;

        println!("{}:", job_output.name);
        println!("   Input points:        {}", output.input_count);
        println!("   After downsampling:  {}", output.downsampled_count);
        println!("   Outliers removed:    {}", output.removed_outliers);
        println!("   Clusters:            {}", output.cluster_count);
        println!("   Noise points:        {}", output.noise_count());
        println!("   Time:                {:?}", output.elapsed);

        for summary in output.summaries.iter().filter(|s| !s.is_noise()) {
            let (min, max) = summary.bounds;
            println!(
                "   Cluster {:>3}: {:>6} points, centroid ({:.2}, {:.2}, {:.2}), extent ({:.2}, {:.2}, {:.2})",
                summary.label,
                summary.point_count,
                summary.centroid.x,
                summary.centroid.y,
                summary.centroid.z,
                max.x - min.x,
                max.y - min.y,
                max.z - min.z,
            );
        }

        let written = export_clusters(&job_output.name, &output.clusters, &mut sink)?;
        println!("   Exported {} point groups\n", written);
    }

    println!("Outputs: {}", sink.names().join(", "));
    Ok(())
}

//! Nearest neighbor search implementations
//!
//! Three interchangeable structures implement [`NearestNeighborSearch`]:
//!
//! - [`KdTree`]: balanced median-split tree, the general purpose choice
//! - [`UniformGrid`]: spatial hash with a fixed cell size, fast on evenly
//!   spread data when the cell size is close to the query radius
//! - [`BruteForceSearch`]: linear scan, used for tiny inputs and as a reference
//!
//! Every structure borrows the points it indexes instead of copying them, so
//! the point cloud cannot be mutated while an index over it is alive.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use pointclust_core::{Error, NearestNeighborSearch, Point3f, Positioned, Result};
use serde::{Deserialize, Serialize};

/// Maximum number of points stored in a kd-tree leaf
const LEAF_SIZE: usize = 16;

const NO_CHILD: u32 = u32::MAX;

#[inline]
fn squared_distance(a: &Point3f, b: &Point3f) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx * dx + dy * dy + dz * dz
}

#[inline]
fn axis_value(p: &Point3f, axis: usize) -> f32 {
    match axis {
        0 => p.x,
        1 => p.y,
        _ => p.z,
    }
}

fn ensure_not_empty<T>(points: &[T]) -> Result<()> {
    if points.is_empty() {
        return Err(Error::invalid_input(
            "cannot build a spatial index over an empty point set",
        ));
    }
    Ok(())
}

/// Candidate in a k-nearest search, ordered by (distance, id)
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f32,
    idx: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.idx.cmp(&other.idx))
    }
}

/// Bounded max-heap keeping the k best candidates seen so far
struct KnnHeap {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

impl KnnHeap {
    fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    fn offer(&mut self, idx: usize, dist_sq: f32) {
        let candidate = Candidate { dist_sq, idx };
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// Squared distance a new candidate must not exceed to still matter
    fn bound(&self) -> f32 {
        if self.is_full() {
            self.heap.peek().map_or(f32::INFINITY, |c| c.dist_sq)
        } else {
            f32::INFINITY
        }
    }

    fn into_sorted(self) -> Vec<(usize, f32)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.idx, c.dist_sq.sqrt()))
            .collect()
    }
}

/// Which spatial index a stage should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialIndexKind {
    /// Balanced kd-tree
    #[default]
    KdTree,
    /// Uniform hash grid; the cell size is supplied when the index is built
    UniformGrid,
}

/// A spatial index whose concrete structure is chosen at runtime
pub enum SpatialIndex<'a, T> {
    KdTree(KdTree<'a, T>),
    UniformGrid(UniformGrid<'a, T>),
}

impl<'a, T: Positioned> SpatialIndex<'a, T> {
    /// Build the structure selected by `kind`
    ///
    /// `cell_size` is only used by [`SpatialIndexKind::UniformGrid`].
    pub fn build(points: &'a [T], kind: SpatialIndexKind, cell_size: f32) -> Result<Self> {
        match kind {
            SpatialIndexKind::KdTree => Ok(SpatialIndex::KdTree(KdTree::new(points)?)),
            SpatialIndexKind::UniformGrid => {
                Ok(SpatialIndex::UniformGrid(UniformGrid::new(points, cell_size)?))
            }
        }
    }
}

impl<'a, T: Positioned> NearestNeighborSearch for SpatialIndex<'a, T> {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        match self {
            SpatialIndex::KdTree(tree) => tree.find_k_nearest(query, k),
            SpatialIndex::UniformGrid(grid) => grid.find_k_nearest(query, k),
        }
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        match self {
            SpatialIndex::KdTree(tree) => tree.find_radius_neighbors(query, radius),
            SpatialIndex::UniformGrid(grid) => grid.find_radius_neighbors(query, radius),
        }
    }

    fn find_radius_indices(&self, query: &Point3f, radius: f32) -> Vec<usize> {
        match self {
            SpatialIndex::KdTree(tree) => tree.find_radius_indices(query, radius),
            SpatialIndex::UniformGrid(grid) => grid.find_radius_indices(query, radius),
        }
    }

    fn len(&self) -> usize {
        match self {
            SpatialIndex::KdTree(tree) => tree.len(),
            SpatialIndex::UniformGrid(grid) => grid.len(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct KdNode {
    min: [f32; 3],
    max: [f32; 3],
    // NO_CHILD for leaves
    left: u32,
    right: u32,
    // leaf range into `indices`
    start: u32,
    end: u32,
}

impl KdNode {
    fn is_leaf(&self) -> bool {
        self.left == NO_CHILD
    }

    /// Squared distance from `p` to this node's bounding box (0 if inside)
    fn box_distance_sq(&self, p: &Point3f) -> f32 {
        let mut d2 = 0.0;
        for axis in 0..3 {
            let v = axis_value(p, axis);
            if v < self.min[axis] {
                d2 += (self.min[axis] - v).powi(2);
            } else if v > self.max[axis] {
                d2 += (v - self.max[axis]).powi(2);
            }
        }
        d2
    }
}

/// KD-Tree implementation for nearest neighbor search
///
/// Built once in O(N log N) by recursive median splits along the widest axis
/// of each node's bounding box. Leaves hold up to 16 points; queries prune
/// whole subtrees by their bounding boxes.
pub struct KdTree<'a, T> {
    points: &'a [T],
    nodes: Vec<KdNode>,
    indices: Vec<usize>,
    root: u32,
}

impl<'a, T: Positioned> KdTree<'a, T> {
    pub fn new(points: &'a [T]) -> Result<Self> {
        ensure_not_empty(points)?;

        let mut tree = Self {
            points,
            nodes: Vec::with_capacity(2 * points.len() / LEAF_SIZE + 1),
            indices: (0..points.len()).collect(),
            root: 0,
        };
        tree.root = tree.build_recursive(0, points.len());
        Ok(tree)
    }

    fn build_recursive(&mut self, start: usize, end: usize) -> u32 {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for &idx in &self.indices[start..end] {
            let p = self.points[idx].position();
            for axis in 0..3 {
                let v = axis_value(&p, axis);
                min[axis] = min[axis].min(v);
                max[axis] = max[axis].max(v);
            }
        }

        let count = end - start;
        let extent = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];

        // Leaf: few points, or all points coincide
        if count <= LEAF_SIZE || extent.iter().all(|&e| !(e > 0.0)) {
            let node_idx = self.nodes.len() as u32;
            self.nodes.push(KdNode {
                min,
                max,
                left: NO_CHILD,
                right: NO_CHILD,
                start: start as u32,
                end: end as u32,
            });
            return node_idx;
        }

        let axis = if extent[0] >= extent[1] && extent[0] >= extent[2] {
            0
        } else if extent[1] >= extent[2] {
            1
        } else {
            2
        };

        let points = self.points;
        let half = count / 2;
        self.indices[start..end].select_nth_unstable_by(half, |&a, &b| {
            let va = axis_value(&points[a].position(), axis);
            let vb = axis_value(&points[b].position(), axis);
            va.total_cmp(&vb).then(a.cmp(&b))
        });

        let mid = start + half;
        let left = self.build_recursive(start, mid);
        let right = self.build_recursive(mid, end);

        let node_idx = self.nodes.len() as u32;
        self.nodes.push(KdNode {
            min,
            max,
            left,
            right,
            start: 0,
            end: 0,
        });
        node_idx
    }

    fn radius_recursive(&self, node_idx: u32, query: &Point3f, radius_sq: f32, out: &mut Vec<(usize, f32)>) {
        let node = &self.nodes[node_idx as usize];
        if node.box_distance_sq(query) > radius_sq {
            return;
        }

        if node.is_leaf() {
            for &idx in &self.indices[node.start as usize..node.end as usize] {
                let d2 = squared_distance(&self.points[idx].position(), query);
                if d2 <= radius_sq {
                    out.push((idx, d2));
                }
            }
            return;
        }

        self.radius_recursive(node.left, query, radius_sq, out);
        self.radius_recursive(node.right, query, radius_sq, out);
    }

    fn knn_recursive(&self, node_idx: u32, query: &Point3f, heap: &mut KnnHeap) {
        let node = &self.nodes[node_idx as usize];
        // strict comparison keeps equidistant points with smaller ids reachable
        if node.box_distance_sq(query) > heap.bound() {
            return;
        }

        if node.is_leaf() {
            for &idx in &self.indices[node.start as usize..node.end as usize] {
                heap.offer(idx, squared_distance(&self.points[idx].position(), query));
            }
            return;
        }

        let left = &self.nodes[node.left as usize];
        let right = &self.nodes[node.right as usize];
        let (first, second) = if left.box_distance_sq(query) <= right.box_distance_sq(query) {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        self.knn_recursive(first, query, heap);
        self.knn_recursive(second, query, heap);
    }
}

impl<'a, T: Positioned> NearestNeighborSearch for KdTree<'a, T> {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        if k == 0 {
            return Vec::new();
        }
        let mut heap = KnnHeap::new(k.min(self.points.len()));
        self.knn_recursive(self.root, query, &mut heap);
        heap.into_sorted()
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        if !(radius >= 0.0) {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.radius_recursive(self.root, query, radius * radius, &mut out);
        out.into_iter().map(|(idx, d2)| (idx, d2.sqrt())).collect()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

type CellKey = (i64, i64, i64);

/// Uniform spatial hash grid for nearest neighbor search
///
/// Points are bucketed into cubic cells of `cell_size`. Radius queries visit
/// the block of cells covering the query sphere; k-nearest queries visit
/// shells of cells around the query until no unvisited cell can hold a
/// closer point. When a block would contain more cells than the grid has
/// occupied cells, the occupied cells are scanned directly instead.
pub struct UniformGrid<'a, T> {
    points: &'a [T],
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    key_min: CellKey,
    key_max: CellKey,
}

impl<'a, T: Positioned> UniformGrid<'a, T> {
    pub fn new(points: &'a [T], cell_size: f32) -> Result<Self> {
        if !(cell_size > 0.0) || !cell_size.is_finite() {
            return Err(Error::invalid_parameter(format!(
                "grid cell size must be positive and finite, got {cell_size}"
            )));
        }
        ensure_not_empty(points)?;

        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        let mut key_min = (i64::MAX, i64::MAX, i64::MAX);
        let mut key_max = (i64::MIN, i64::MIN, i64::MIN);
        for (idx, point) in points.iter().enumerate() {
            let key = cell_key(&point.position(), cell_size);
            key_min = (key_min.0.min(key.0), key_min.1.min(key.1), key_min.2.min(key.2));
            key_max = (key_max.0.max(key.0), key_max.1.max(key.1), key_max.2.max(key.2));
            cells.entry(key).or_default().push(idx);
        }

        Ok(Self {
            points,
            cell_size,
            cells,
            key_min,
            key_max,
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn offer_ids(&self, ids: &[usize], query: &Point3f, heap: &mut KnnHeap) {
        for &idx in ids {
            heap.offer(idx, squared_distance(&self.points[idx].position(), query));
        }
    }

    fn visit_cell<F: FnMut(usize)>(&self, key: &CellKey, visit: &mut F) {
        if let Some(ids) = self.cells.get(key) {
            ids.iter().copied().for_each(&mut *visit);
        }
    }

    /// Largest shell radius (in cells) that can still contain occupied cells
    ///
    /// Keys saturate at the `i64` range for far-away coordinates, so the
    /// differences are taken in `i128`.
    fn max_ring(&self, center: CellKey) -> i64 {
        let (c, lo, hi) = (widen(center), widen(self.key_min), widen(self.key_max));
        let ring = [c.0 - lo.0, hi.0 - c.0, c.1 - lo.1, hi.1 - c.1, c.2 - lo.2, hi.2 - c.2]
            .into_iter()
            .max()
            .unwrap_or(0)
            .max(0);
        ring.min(i64::MAX as i128) as i64
    }

    /// Distance from `query` to the outside of the block of cells within
    /// Chebyshev distance `ring` of the query's own cell
    fn covered_distance(&self, query: &Point3f, center: CellKey, ring: i64) -> f32 {
        let c = self.cell_size as f64;
        let coords = [query.x as f64, query.y as f64, query.z as f64];
        let keys = [center.0, center.1, center.2];
        let mut margin = f64::INFINITY;
        for axis in 0..3 {
            let lo = (keys[axis] as f64 - ring as f64) * c;
            let hi = (keys[axis] as f64 + ring as f64 + 1.0) * c;
            margin = margin.min(coords[axis] - lo).min(hi - coords[axis]);
        }
        margin.max(0.0) as f32
    }
}

#[inline]
fn cell_key(p: &Point3f, cell_size: f32) -> CellKey {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

#[inline]
fn widen(key: CellKey) -> (i128, i128, i128) {
    (key.0 as i128, key.1 as i128, key.2 as i128)
}

#[inline]
fn chebyshev(a: CellKey, b: CellKey) -> i128 {
    let (a, b) = (widen(a), widen(b));
    (a.0 - b.0).abs().max((a.1 - b.1).abs()).max((a.2 - b.2).abs())
}

/// Key of the cell `offset` away from `center`, `None` past the key range
#[inline]
fn offset_key(center: CellKey, dx: i64, dy: i64, dz: i64) -> Option<CellKey> {
    Some((
        center.0.checked_add(dx)?,
        center.1.checked_add(dy)?,
        center.2.checked_add(dz)?,
    ))
}

impl<'a, T: Positioned> NearestNeighborSearch for UniformGrid<'a, T> {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        if k == 0 {
            return Vec::new();
        }
        let mut heap = KnnHeap::new(k.min(self.points.len()));
        let center = cell_key(query, self.cell_size);
        let max_ring = self.max_ring(center);

        let mut ring = 0i64;
        loop {
            let side = (2 * ring + 1) as u128;
            if side * side * side > self.cells.len() as u128 {
                // the shell walk would cost more than scanning what is left
                for (key, ids) in &self.cells {
                    if chebyshev(*key, center) >= ring as i128 {
                        self.offer_ids(ids, query, &mut heap);
                    }
                }
                break;
            }

            for dx in -ring..=ring {
                for dy in -ring..=ring {
                    for dz in -ring..=ring {
                        if dx.abs().max(dy.abs()).max(dz.abs()) != ring {
                            continue;
                        }
                        if let Some(ids) = offset_key(center, dx, dy, dz).and_then(|key| self.cells.get(&key)) {
                            self.offer_ids(ids, query, &mut heap);
                        }
                    }
                }
            }

            if ring >= max_ring {
                break;
            }
            let covered = self.covered_distance(query, center, ring);
            if heap.is_full() && heap.bound() < covered * covered {
                break;
            }
            ring += 1;
        }

        heap.into_sorted()
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        if !(radius >= 0.0) {
            return Vec::new();
        }
        let radius_sq = radius * radius;
        let lo = cell_key(&Point3f::new(query.x - radius, query.y - radius, query.z - radius), self.cell_size);
        let hi = cell_key(&Point3f::new(query.x + radius, query.y + radius, query.z + radius), self.cell_size);

        let mut out = Vec::new();
        let mut check = |idx: usize| {
            let d2 = squared_distance(&self.points[idx].position(), query);
            if d2 <= radius_sq {
                out.push((idx, d2.sqrt()));
            }
        };

        let span = |a: i64, b: i64| (b as i128 - a as i128 + 1).max(0) as u128;
        let block = span(lo.0, hi.0)
            .saturating_mul(span(lo.1, hi.1))
            .saturating_mul(span(lo.2, hi.2));
        if block > self.cells.len() as u128 {
            for (key, ids) in &self.cells {
                let inside = (lo.0..=hi.0).contains(&key.0)
                    && (lo.1..=hi.1).contains(&key.1)
                    && (lo.2..=hi.2).contains(&key.2);
                if inside {
                    ids.iter().copied().for_each(&mut check);
                }
            }
        } else {
            for x in lo.0..=hi.0 {
                for y in lo.1..=hi.1 {
                    for z in lo.2..=hi.2 {
                        self.visit_cell(&(x, y, z), &mut check);
                    }
                }
            }
        }
        out
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Simple brute force nearest neighbor search for small datasets
pub struct BruteForceSearch<'a, T> {
    points: &'a [T],
}

impl<'a, T: Positioned> BruteForceSearch<'a, T> {
    pub fn new(points: &'a [T]) -> Result<Self> {
        ensure_not_empty(points)?;
        Ok(Self { points })
    }
}

impl<'a, T: Positioned> NearestNeighborSearch for BruteForceSearch<'a, T> {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let mut distances: Vec<Candidate> = self.points
            .iter()
            .enumerate()
            .map(|(idx, point)| Candidate {
                dist_sq: squared_distance(&point.position(), query),
                idx,
            })
            .collect();

        distances.sort_unstable();
        distances.truncate(k);
        distances
            .into_iter()
            .map(|c| (c.idx, c.dist_sq.sqrt()))
            .collect()
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        let radius_squared = radius * radius;
        self.points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let distance_squared = squared_distance(&point.position(), query);
                if distance_squared <= radius_squared {
                    Some((idx, distance_squared.sqrt()))
                } else {
                    None
                }
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointclust_core::ColoredPoint3f;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn random_points(n: usize, seed: u64) -> Vec<Point3f> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Point3f::new(
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-1.0..1.0),
                )
            })
            .collect()
    }

    fn sorted_ids(mut neighbors: Vec<(usize, f32)>) -> Vec<usize> {
        let mut ids: Vec<usize> = neighbors.drain(..).map(|(idx, _)| idx).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let points: Vec<Point3f> = Vec::new();
        assert!(matches!(KdTree::new(&points), Err(Error::InvalidInput(_))));
        assert!(matches!(UniformGrid::new(&points, 1.0), Err(Error::InvalidInput(_))));
        assert!(matches!(BruteForceSearch::new(&points), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_grid_rejects_bad_cell_size() {
        let points = vec![Point3f::origin()];
        assert!(matches!(UniformGrid::new(&points, 0.0), Err(Error::InvalidParameter(_))));
        assert!(matches!(UniformGrid::new(&points, -1.0), Err(Error::InvalidParameter(_))));
        assert!(matches!(UniformGrid::new(&points, f32::NAN), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_radius_includes_coincident_point() {
        let points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(5.0, 5.0, 5.0),
        ];
        let tree = KdTree::new(&points).unwrap();
        let grid = UniformGrid::new(&points, 0.5).unwrap();

        assert_eq!(sorted_ids(tree.find_radius_neighbors(&points[0], 0.0)), vec![0]);
        assert_eq!(sorted_ids(grid.find_radius_neighbors(&points[0], 0.0)), vec![0]);
        assert_eq!(sorted_ids(tree.find_radius_neighbors(&points[0], 1.0)), vec![0, 1]);
        assert_eq!(sorted_ids(grid.find_radius_neighbors(&points[0], 1.0)), vec![0, 1]);
    }

    #[test]
    fn test_radius_matches_brute_force() {
        let points = random_points(2000, 7);
        let brute = BruteForceSearch::new(&points).unwrap();
        let tree = KdTree::new(&points).unwrap();
        let grid = UniformGrid::new(&points, 0.3).unwrap();

        for (q, radius) in [(0usize, 0.3f32), (17, 0.75), (999, 1.5), (1500, 4.0)] {
            let query = points[q];
            let expected = sorted_ids(brute.find_radius_neighbors(&query, radius));
            assert_eq!(sorted_ids(tree.find_radius_neighbors(&query, radius)), expected);
            assert_eq!(sorted_ids(grid.find_radius_neighbors(&query, radius)), expected);
            assert_eq!(tree.find_radius_indices(&query, radius).len(), expected.len());
        }
    }

    #[test]
    fn test_radius_results_are_duplicate_free() {
        let points = random_points(500, 3);
        let grid = UniformGrid::new(&points, 0.1).unwrap();
        let ids = grid.find_radius_indices(&Point3f::origin(), 2.0);
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());
    }

    #[test]
    fn test_k_nearest_matches_brute_force() {
        let points = random_points(1500, 11);
        let brute = BruteForceSearch::new(&points).unwrap();
        let tree = KdTree::new(&points).unwrap();
        let grid = UniformGrid::new(&points, 0.25).unwrap();

        let queries = [points[0], points[700], Point3f::new(40.0, -3.0, 0.0), Point3f::origin()];
        for query in &queries {
            for k in [1usize, 5, 20] {
                let expected: Vec<usize> = brute.find_k_nearest(query, k).into_iter().map(|(i, _)| i).collect();
                let from_tree: Vec<usize> = tree.find_k_nearest(query, k).into_iter().map(|(i, _)| i).collect();
                let from_grid: Vec<usize> = grid.find_k_nearest(query, k).into_iter().map(|(i, _)| i).collect();
                assert_eq!(from_tree, expected);
                assert_eq!(from_grid, expected);
            }
        }
    }

    #[test]
    fn test_k_nearest_ties_break_by_id() {
        // four points at equal distance from the origin
        let points = vec![
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(-1.0, 0.0, 0.0),
            Point3f::new(9.0, 9.0, 9.0),
        ];
        let tree = KdTree::new(&points).unwrap();
        let grid = UniformGrid::new(&points, 0.7).unwrap();
        let brute = BruteForceSearch::new(&points).unwrap();

        let query = Point3f::origin();
        for result in [
            tree.find_k_nearest(&query, 3),
            grid.find_k_nearest(&query, 3),
            brute.find_k_nearest(&query, 3),
        ] {
            let ids: Vec<usize> = result.iter().map(|(i, _)| *i).collect();
            assert_eq!(ids, vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_k_nearest_distances_ascending() {
        let points = random_points(300, 5);
        let tree = KdTree::new(&points).unwrap();
        let result = tree.find_k_nearest(&Point3f::new(0.5, 0.5, 0.0), 25);
        assert_eq!(result.len(), 25);
        for pair in result.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn test_k_larger_than_point_count() {
        let points = vec![Point3f::origin(), Point3f::new(1.0, 0.0, 0.0)];
        let tree = KdTree::new(&points).unwrap();
        let grid = UniformGrid::new(&points, 1.0).unwrap();
        assert_eq!(tree.find_k_nearest(&Point3f::origin(), 10).len(), 2);
        assert_eq!(grid.find_k_nearest(&Point3f::origin(), 10).len(), 2);
        assert!(tree.find_k_nearest(&Point3f::origin(), 0).is_empty());
    }

    #[test]
    fn test_duplicate_points_build_leaf() {
        let points = vec![Point3f::new(1.0, 1.0, 1.0); 100];
        let tree = KdTree::new(&points).unwrap();
        assert_eq!(tree.find_radius_neighbors(&Point3f::new(1.0, 1.0, 1.0), 0.0).len(), 100);
        let nearest = tree.find_k_nearest(&Point3f::new(1.0, 1.0, 1.0), 3);
        assert_eq!(nearest.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_index_over_colored_points() {
        let points = vec![
            ColoredPoint3f::new(Point3f::new(0.0, 0.0, 0.0), [255, 0, 0]),
            ColoredPoint3f::new(Point3f::new(0.1, 0.0, 0.0), [0, 255, 0]),
            ColoredPoint3f::new(Point3f::new(3.0, 0.0, 0.0), [0, 0, 255]),
        ];
        let index = SpatialIndex::build(&points, SpatialIndexKind::UniformGrid, 0.2).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(sorted_ids(index.find_radius_neighbors(&Point3f::origin(), 0.2)), vec![0, 1]);
    }

    #[test]
    fn test_sparse_grid_far_query() {
        // a tiny cell size relative to the spread forces the occupied-cell fallback
        let points = vec![Point3f::origin(), Point3f::new(1000.0, 0.0, 0.0)];
        let grid = UniformGrid::new(&points, 0.01).unwrap();
        let nearest = grid.find_k_nearest(&Point3f::new(999.0, 0.0, 0.0), 1);
        assert_eq!(nearest[0].0, 1);
        assert_eq!(grid.find_radius_indices(&Point3f::new(500.0, 0.0, 0.0), 600.0).len(), 2);
    }

    #[test]
    fn test_grid_queries_with_saturated_cell_keys() {
        let points = vec![Point3f::new(-1.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0)];
        let grid = UniformGrid::new(&points, 0.01).unwrap();

        let nearest = grid.find_k_nearest(&Point3f::new(1e30, 0.0, 0.0), 1);
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].0, 1);
        assert_eq!(grid.find_k_nearest(&Point3f::new(-1e30, 0.0, 0.0), 2).len(), 2);

        assert_eq!(sorted_ids(grid.find_radius_neighbors(&Point3f::origin(), 1e20)), vec![0, 1]);
    }

    #[test]
    fn test_grid_over_points_with_saturated_keys() {
        let points = vec![
            Point3f::new(-1e30, 0.0, 0.0),
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(0.5, 0.0, 0.0),
            Point3f::new(1e30, 0.0, 0.0),
        ];
        let grid = UniformGrid::new(&points, 0.01).unwrap();
        let brute = BruteForceSearch::new(&points).unwrap();

        for query in [Point3f::new(1e30, 0.0, 0.0), Point3f::origin(), Point3f::new(-1e18, 1.0, 0.0)] {
            assert_eq!(grid.find_k_nearest(&query, 4).len(), 4);
            assert_eq!(grid.find_k_nearest(&query, 2)[0].0, brute.find_k_nearest(&query, 2)[0].0);
        }
    }
}

//! Point clouds
//!
//! A point's index in [`PointCloud::points`] is its identity for the duration of a
//! processing stage: label arrays, masks and neighbor ids all refer to it.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::point::*;

/// Ordered set of points of any element type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

impl<T> PointCloud<T> {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, id: usize) -> &T {
        &self.points[id]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_points(iter.into_iter().collect())
    }
}

impl<T: Clone> PointCloud<T> {
    /// Build a new cloud from the points at `indices`, in the given order
    ///
    /// # Panics
    /// Panics if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        indices.iter().map(|&i| self.points[i].clone()).collect()
    }
}

impl<T: Positioned> PointCloud<T> {
    /// Copy out the bare coordinates of every point
    pub fn positions(&self) -> Vec<Point3f> {
        self.points.iter().map(Positioned::position).collect()
    }
}

impl PointCloud<ColoredPoint3f> {
    /// Build a colored cloud from parallel position and color arrays
    pub fn from_parts(positions: Vec<Point3f>, colors: Vec<[u8; 3]>) -> crate::Result<Self> {
        if positions.len() != colors.len() {
            return Err(crate::Error::invalid_argument(format!(
                "color count {} does not match point count {}",
                colors.len(),
                positions.len()
            )));
        }
        Ok(positions
            .into_iter()
            .zip(colors)
            .map(|(position, color)| ColoredPoint3f { position, color })
            .collect())
    }

    /// Drop the colors, keeping only coordinates
    pub fn without_colors(&self) -> PointCloud<Point3f> {
        PointCloud::from_points(self.positions())
    }
}

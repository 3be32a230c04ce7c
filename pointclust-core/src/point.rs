//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A point with color information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColoredPoint3f {
    pub position: Point3f,
    pub color: [u8; 3],
}

impl ColoredPoint3f {
    pub fn new(position: Point3f, color: [u8; 3]) -> Self {
        Self { position, color }
    }
}

impl Default for ColoredPoint3f {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            color: [255, 255, 255],
        }
    }
}

impl From<ColoredPoint3f> for Point3f {
    fn from(point: ColoredPoint3f) -> Self {
        point.position
    }
}

/// Point types that carry a 3D position
///
/// Every processing stage is generic over this trait so that per-point
/// attributes (such as color) travel with the coordinate they belong to.
pub trait Positioned {
    fn position(&self) -> Point3f;
}

impl Positioned for Point3f {
    #[inline]
    fn position(&self) -> Point3f {
        *self
    }
}

impl Positioned for ColoredPoint3f {
    #[inline]
    fn position(&self) -> Point3f {
        self.position
    }
}

/// Point types that can be averaged into a single representative
///
/// Used by voxel downsampling: every point falling into a voxel is
/// accumulated and the voxel emits one point built by [`Centroid::finish`].
pub trait Centroid: Positioned + Sized {
    type Accumulator: Default;

    fn accumulate(acc: &mut Self::Accumulator, point: &Self);

    /// `count` is the number of accumulated points and is never zero
    fn finish(acc: &Self::Accumulator, count: usize) -> Self;
}

/// Running coordinate sum kept in double precision
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionSum(Vector3<f64>);

impl PositionSum {
    #[inline]
    pub fn add(&mut self, p: &Point3f) {
        self.0 += Vector3::new(p.x as f64, p.y as f64, p.z as f64);
    }

    #[inline]
    pub fn mean(&self, count: usize) -> Point3f {
        let m = self.0 / count as f64;
        Point3f::new(m.x as f32, m.y as f32, m.z as f32)
    }
}

impl Centroid for Point3f {
    type Accumulator = PositionSum;

    fn accumulate(acc: &mut PositionSum, point: &Self) {
        acc.add(point);
    }

    fn finish(acc: &PositionSum, count: usize) -> Self {
        acc.mean(count)
    }
}

impl Centroid for ColoredPoint3f {
    type Accumulator = (PositionSum, [u64; 3]);

    fn accumulate(acc: &mut Self::Accumulator, point: &Self) {
        acc.0.add(&point.position);
        for (sum, &channel) in acc.1.iter_mut().zip(point.color.iter()) {
            *sum += channel as u64;
        }
    }

    fn finish(acc: &Self::Accumulator, count: usize) -> Self {
        let n = count as u64;
        // round half up per channel
        let color = acc.1.map(|sum| ((sum + n / 2) / n).min(255) as u8);
        Self {
            position: acc.0.mean(count),
            color,
        }
    }
}

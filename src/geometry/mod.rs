//! 2D outlines, tessellated regions and triangle meshes.
//!
//! Outlines come from SVG paths (via usvg) with curves flattened by lyon.
//! A [`Region`] is the filled area of an outline, tessellated by lyon and
//! described both as CCW triangles and as oriented boundary loops. A
//! [`TriMesh`] is the welded 3D triangle soup that gets exported.

mod bounds;
mod mesh;
mod outline;
mod region;

pub use bounds::Bounds;
pub use mesh::{TriMesh, Vec3};
pub use outline::{Contour, Outline, path_outlines};
pub use region::{FillRule, Region};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        (*other - *self).length()
    }

    /// z component of the 3D cross product
    pub fn cross(&self, other: &Point2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn dot(&self, other: &Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl std::ops::Add for Point2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Twice the signed area of triangle `a b c` (positive when CCW)
pub fn orient2d(a: Point2, b: Point2, c: Point2) -> f64 {
    (b - a).cross(&(c - a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ops() {
        let p = Point2::new(3.0, 4.0) - Point2::new(0.0, 0.0);
        assert_eq!(p.length(), 5.0);
        assert_eq!(Point2::new(1.0, 0.0).cross(&Point2::new(0.0, 1.0)), 1.0);
    }

    #[test]
    fn test_orient2d() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert!(orient2d(a, b, c) > 0.0);
        assert!(orient2d(a, c, b) < 0.0);
    }
}

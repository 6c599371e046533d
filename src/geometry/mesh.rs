use std::collections::HashMap;

/// Vertex welding grid in mm
const WELD_GRID: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalized(&self) -> Vec3 {
        let len = self.length();
        if len > 0.0 { *self * (1.0 / len) } else { *self }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Indexed triangle mesh with welded vertices
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    index: HashMap<(i64, i64, i64), u32>,
}

impl TriMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn weld(&mut self, p: Vec3) -> u32 {
        let key = (
            (p.x / WELD_GRID).round() as i64,
            (p.y / WELD_GRID).round() as i64,
            (p.z / WELD_GRID).round() as i64,
        );
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.vertices.len() as u32;
        self.vertices.push(p);
        self.index.insert(key, idx);
        idx
    }

    /// Add a triangle wound so its normal points along `outward`
    pub fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, outward: Vec3) {
        let ia = self.weld(a);
        let ib = self.weld(b);
        let ic = self.weld(c);
        if ia == ib || ib == ic || ic == ia {
            return;
        }
        let normal = (b - a).cross(&(c - a));
        if normal.dot(&outward) < 0.0 {
            self.faces.push([ia, ic, ib]);
        } else {
            self.faces.push([ia, ib, ic]);
        }
    }

    /// Add a planar quad `a b c d` as two triangles
    pub fn push_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3, outward: Vec3) {
        self.push_triangle(a, b, c, outward);
        self.push_triangle(a, c, d, outward);
    }

    pub fn triangle(&self, face: &[u32; 3]) -> [Vec3; 3] {
        [
            self.vertices[face[0] as usize],
            self.vertices[face[1] as usize],
            self.vertices[face[2] as usize],
        ]
    }

    pub fn face_normal(&self, face: &[u32; 3]) -> Vec3 {
        let [a, b, c] = self.triangle(face);
        (b - a).cross(&(c - a)).normalized()
    }

    /// Enclosed volume (divergence theorem); meaningful for closed meshes
    pub fn volume(&self) -> f64 {
        let signed: f64 = self
            .faces
            .iter()
            .map(|f| {
                let [a, b, c] = self.triangle(f);
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum();
        signed.abs()
    }

    /// (min, max) corners, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                Vec3::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
                Vec3::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
            )
        }))
    }

    /// Every directed edge is used exactly once and its reverse exactly once
    pub fn is_closed(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }
        let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
        for f in &self.faces {
            for (a, b) in [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])] {
                *edges.entry((a, b)).or_insert(0) += 1;
            }
        }
        edges
            .iter()
            .all(|(&(a, b), &count)| count == 1 && edges.get(&(b, a)) == Some(&1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> TriMesh {
        let mut mesh = TriMesh::new("cube");
        let p = |x: f64, y: f64, z: f64| Vec3::new(x, y, z);
        mesh.push_quad(p(0., 0., 0.), p(1., 0., 0.), p(1., 1., 0.), p(0., 1., 0.), -Vec3::Z);
        mesh.push_quad(p(0., 0., 1.), p(1., 0., 1.), p(1., 1., 1.), p(0., 1., 1.), Vec3::Z);
        mesh.push_quad(p(0., 0., 0.), p(1., 0., 0.), p(1., 0., 1.), p(0., 0., 1.), -Vec3::Y);
        mesh.push_quad(p(0., 1., 0.), p(1., 1., 0.), p(1., 1., 1.), p(0., 1., 1.), Vec3::Y);
        mesh.push_quad(p(0., 0., 0.), p(0., 1., 0.), p(0., 1., 1.), p(0., 0., 1.), -Vec3::X);
        mesh.push_quad(p(1., 0., 0.), p(1., 1., 0.), p(1., 1., 1.), p(1., 0., 1.), Vec3::X);
        mesh
    }

    #[test]
    fn test_cube_is_closed() {
        let cube = unit_cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 12);
        assert!(cube.is_closed());
        assert!((cube.volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orientation_follows_outward() {
        let cube = unit_cube();
        for face in &cube.faces {
            let [a, b, c] = cube.triangle(face);
            let centroid = (a + b + c) * (1.0 / 3.0);
            let from_center = centroid - Vec3::new(0.5, 0.5, 0.5);
            assert!(cube.face_normal(face).dot(&from_center) > 0.0);
        }
    }

    #[test]
    fn test_open_mesh_not_closed() {
        let mut mesh = TriMesh::new("tri");
        mesh.push_triangle(Vec3::new(0., 0., 0.), Vec3::X, Vec3::Y, Vec3::Z);
        assert!(!mesh.is_closed());
    }

    #[test]
    fn test_nearby_vertices_weld() {
        let mut mesh = TriMesh::new("weld");
        mesh.push_triangle(Vec3::new(0., 0., 0.), Vec3::X, Vec3::Y, Vec3::Z);
        mesh.push_triangle(Vec3::new(1e-9, 0., 0.), Vec3::Y, Vec3::new(-1., 0., 0.), Vec3::Z);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_degenerate_triangle_skipped() {
        let mut mesh = TriMesh::new("degenerate");
        mesh.push_triangle(Vec3::X, Vec3::X, Vec3::Y, Vec3::Z);
        assert!(mesh.is_empty());
    }
}

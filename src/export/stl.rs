//! Binary STL encoding.

use crate::geometry::TriMesh;

/// Encode `mesh` as binary STL with per-facet normals
pub fn stl_bytes(mesh: &TriMesh) -> std::io::Result<Vec<u8>> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .faces
        .iter()
        .map(|face| {
            let [a, b, c] = mesh.triangle(face);
            let n = mesh.face_normal(face);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([a.x as f32, a.y as f32, a.z as f32]),
                    stl_io::Vertex::new([b.x as f32, b.y as f32, b.z as f32]),
                    stl_io::Vertex::new([c.x as f32, c.y as f32, c.z as f32]),
                ],
            }
        })
        .collect();

    let mut bytes = Vec::with_capacity(84 + 50 * triangles.len());
    stl_io::write_stl(&mut bytes, triangles.iter())?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    #[test]
    fn test_binary_layout() {
        let mut mesh = TriMesh::new("tri");
        mesh.push_triangle(Vec3::new(0.0, 0.0, 0.0), Vec3::X, Vec3::Y, Vec3::Z);
        let bytes = stl_bytes(&mesh).unwrap();

        // 80 byte header, u32 count, 50 bytes per facet
        assert_eq!(bytes.len(), 84 + 50);
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 1);

        let read = stl_io::read_stl(&mut std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(read.faces.len(), 1);
        assert_eq!(read.vertices.len(), 3);
    }
}

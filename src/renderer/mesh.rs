use std::collections::HashSet;

use glam::Vec3;

/// Indexed triangle list with per-vertex normals, stored as flat `f32` triples
/// so it can be written straight into a vertex buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices * 3),
            normals: Vec::with_capacity(vertices * 3),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position.to_array());
        self.normals.extend_from_slice(&normal.to_array());
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.vertices[index * 3..index * 3 + 3])
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.vertices.is_empty() {
            return None;
        }

        let (min, max) = self.vertices.chunks_exact(3).fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), chunk| {
                let p = Vec3::from_slice(chunk);
                (min.min(p), max.max(p))
            },
        );
        Some((min, max))
    }

    /// Unique triangle edges as a line list, used for wireframe drawing.
    pub fn edge_indices(&self) -> Vec<u32> {
        let mut seen = HashSet::with_capacity(self.indices.len());
        let mut edges = Vec::with_capacity(self.indices.len() * 2);

        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.extend_from_slice(&[a, b]);
                }
            }
        }

        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        let mut mesh = TriangleMesh::default();
        let a = mesh.push_vertex(Vec3::new(0.0, 0.0, 0.0), Vec3::Z);
        let b = mesh.push_vertex(Vec3::new(1.0, 0.0, 0.0), Vec3::Z);
        let c = mesh.push_vertex(Vec3::new(1.0, 1.0, 0.0), Vec3::Z);
        let d = mesh.push_vertex(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);
        mesh.push_triangle(a, b, c);
        mesh.push_triangle(a, c, d);
        mesh
    }

    #[test]
    fn counts_follow_pushes() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let (min, max) = quad().bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.0));
        assert!(TriangleMesh::default().bounds().is_none());
    }

    #[test]
    fn shared_edges_are_emitted_once() {
        // two triangles sharing the diagonal a-c: 5 unique edges
        assert_eq!(quad().edge_indices().len(), 10);
    }
}

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Scalars per emitted vertex: position followed by normal.
pub const FLOATS_PER_VERTEX: usize = 6;

/// Scalars per emitted triangle.
pub const FLOATS_PER_TRIANGLE: usize = 3 * FLOATS_PER_VERTEX;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// Interleaved `(position, normal)` records in emission order.
///
/// Rebuilt from scratch every frame; never patched in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    data: Vec<f32>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            data: Vec::with_capacity(triangles.saturating_mul(FLOATS_PER_TRIANGLE)),
        }
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) {
        self.data.extend_from_slice(&position.to_array());
        self.data.extend_from_slice(&normal.to_array());
    }

    /// Emits a flat-shaded triangle: one normal replicated on all three corners.
    pub fn push_flat_triangle(&mut self, corners: [Vec3; 3], normal: Vec3) {
        for corner in corners {
            self.push_vertex(corner, normal);
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len() / FLOATS_PER_VERTEX
    }

    pub fn triangle_count(&self) -> usize {
        self.data.len() / FLOATS_PER_TRIANGLE
    }

    pub fn vertices(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.data.chunks_exact(FLOATS_PER_VERTEX).map(|v| {
            (
                Vec3::new(v[0], v[1], v[2]),
                Vec3::new(v[3], v[4], v[5]),
            )
        })
    }

    /// Corners and per-corner normals of each emitted triangle.
    pub fn triangles(&self) -> impl Iterator<Item = ([Vec3; 3], [Vec3; 3])> + '_ {
        self.data.chunks_exact(FLOATS_PER_TRIANGLE).map(|tri| {
            let vertex = |i: usize| {
                let v = &tri[i * FLOATS_PER_VERTEX..(i + 1) * FLOATS_PER_VERTEX];
                (Vec3::new(v[0], v[1], v[2]), Vec3::new(v[3], v[4], v[5]))
            };
            let (p0, n0) = vertex(0);
            let (p1, n1) = vertex(1);
            let (p2, n2) = vertex(2);
            ([p0, p1, p2], [n0, n1, n2])
        })
    }

    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.vertices().map(|(p, _)| p);
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;

        for p in iter {
            min = min.min(p);
            max = max.max(p);
        }

        Some(Aabb {
            min: min.to_array(),
            max: max.to_array(),
        })
    }
}

impl From<Vec<f32>> for MeshBuffer {
    fn from(data: Vec<f32>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_triangle_layout() {
        let mut mesh = MeshBuffer::new();
        mesh.push_flat_triangle([Vec3::X, Vec3::Y, Vec3::Z], Vec3::ONE);
        assert_eq!(mesh.as_slice().len(), FLOATS_PER_TRIANGLE);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(&mesh.as_slice()[0..6], &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn triangles_iterates_corners_in_order() {
        let mut mesh = MeshBuffer::new();
        mesh.push_flat_triangle([Vec3::X, Vec3::Y, Vec3::Z], Vec3::NEG_Z);
        let (corners, normals) = mesh.triangles().next().expect("triangle");
        assert_eq!(corners, [Vec3::X, Vec3::Y, Vec3::Z]);
        assert_eq!(normals, [Vec3::NEG_Z; 3]);
    }

    #[test]
    fn bounds_for_simple_points() {
        let mut mesh = MeshBuffer::new();
        mesh.push_vertex(Vec3::new(1.0, -2.0, 0.5), Vec3::Y);
        mesh.push_vertex(Vec3::new(-3.0, 4.0, 2.0), Vec3::Y);
        let bounds = mesh.bounds().expect("bounds");
        assert_eq!(bounds.min, [-3.0, -2.0, 0.5]);
        assert_eq!(bounds.max, [1.0, 4.0, 2.0]);
        assert!(MeshBuffer::new().bounds().is_none());
    }
}

use glam::Vec3;

const X: f32 = 0.525_731_1;
const Z: f32 = 0.850_650_8;

/// Scalars in the flattened base solid: 20 triangles, 3 vertices, 3 coordinates.
pub const FLAT_LEN: usize = 180;

/// Scalars describing one base triangle inside the flattened list.
pub const TRIANGLE_STRIDE: usize = 9;

const VERTICES: [[f32; 3]; 12] = [
    [-X, Z, 0.0],
    [X, Z, 0.0],
    [-X, -Z, 0.0],
    [X, -Z, 0.0],
    [0.0, -X, Z],
    [0.0, X, Z],
    [0.0, -X, -Z],
    [0.0, X, -Z],
    [Z, 0.0, -X],
    [Z, 0.0, X],
    [-Z, 0.0, -X],
    [-Z, 0.0, X],
];

const TRIANGLES: [[usize; 3]; 20] = [
    // 5 faces around point 0
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    // 5 adjacent faces
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    // 5 faces around point 3
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    // 5 adjacent faces
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// The 12-vertex, 20-face base solid every sphere is subdivided from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Icosahedron {
    vertices: [Vec3; 12],
    triangles: [[usize; 3]; 20],
}

impl Default for Icosahedron {
    fn default() -> Self {
        Self::new()
    }
}

impl Icosahedron {
    pub fn new() -> Self {
        Self {
            vertices: VERTICES.map(Vec3::from),
            triangles: TRIANGLES,
        }
    }

    pub fn vertices(&self) -> &[Vec3; 12] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]; 20] {
        &self.triangles
    }

    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let [a, b, c] = *self.triangles.get(index)?;
        Some([self.vertices[a], self.vertices[b], self.vertices[c]])
    }

    /// Every triangle's corners in table order, 9 scalars per triangle.
    pub fn flatten(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(FLAT_LEN);
        for corners in (0..self.triangles.len()).filter_map(|index| self.triangle(index)) {
            for corner in corners {
                out.extend_from_slice(&corner.to_array());
            }
        }
        out
    }
}

/// Flattened base solid consumed by [`crate::subdivide_icosahedron`].
pub fn build_icosahedron() -> Vec<f32> {
    Icosahedron::new().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_twelve_unit_vertices() {
        let ico = Icosahedron::new();
        assert_eq!(ico.vertices().len(), 12);
        for v in ico.vertices() {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn flat_list_has_expected_layout() {
        let flat = build_icosahedron();
        assert_eq!(flat.len(), FLAT_LEN);
        assert_eq!(flat.len() / TRIANGLE_STRIDE, 20);

        // first triangle is (0, 11, 5)
        assert_eq!(&flat[0..3], &[-X, Z, 0.0]);
        assert_eq!(&flat[3..6], &[-Z, 0.0, X]);
        assert_eq!(&flat[6..9], &[0.0, X, Z]);

        // last triangle is (9, 8, 1)
        assert_eq!(&flat[171..174], &[Z, 0.0, X]);
        assert_eq!(&flat[177..180], &[X, Z, 0.0]);
    }

    #[test]
    fn every_vertex_is_shared_by_five_faces() {
        let ico = Icosahedron::new();
        let mut counts = [0; 12];
        for tri in ico.triangles() {
            for &i in tri {
                counts[i] += 1;
            }
        }
        assert!(counts.iter().all(|&c| c == 5));
    }

    #[test]
    fn faces_wind_consistently() {
        let ico = Icosahedron::new();
        for index in 0..20 {
            let [a, b, c] = ico.triangle(index).expect("triangle");
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "face {index} winds inward");
        }
        assert!(ico.triangle(20).is_none());
    }
}

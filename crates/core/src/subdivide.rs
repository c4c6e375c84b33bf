use glam::Vec3;

use crate::icosahedron::TRIANGLE_STRIDE;
use crate::math::{face_normal, normalize};
use crate::mesh::MeshBuffer;

/// Stand-in for an interpolation factor of exactly zero, which would collapse
/// every midpoint onto its base vertex.
pub const INTERPOLATION_EPSILON: f32 = 0.0001;

fn leaves_per_face(depth: u32) -> usize {
    4usize.checked_pow(depth).unwrap_or(usize::MAX)
}

/// Number of leaf triangles produced from the 20 base faces at `depth`.
/// Saturates at `usize::MAX` for depths no buffer could hold.
pub fn leaf_triangle_count(depth: u32) -> usize {
    leaves_per_face(depth).saturating_mul(20)
}

/// Length in scalars of the buffer produced at `depth`.
pub fn buffer_len(depth: u32) -> usize {
    leaf_triangle_count(depth).saturating_mul(crate::mesh::FLOATS_PER_TRIANGLE)
}

fn effective_interpolation(interpolation: f32) -> f32 {
    if interpolation == 0.0 {
        INTERPOLATION_EPSILON
    } else {
        interpolation
    }
}

struct WorkItem {
    corners: [Vec3; 3],
    depth: u32,
}

/// Splits triangle `(a, b, c)` `depth` times and appends the flat-shaded
/// leaves to `out`.
///
/// Each split pulls the edge point `a + b * interpolation` back onto the unit
/// sphere, so `1.0` yields a sphere and values near zero stay close to the
/// flat face. Leaves are emitted in depth-first order of the children
/// `(a, ab, ca)`, `(b, bc, ab)`, `(c, ca, bc)`, `(ab, bc, ca)`.
pub fn subdivide_triangle(
    a: Vec3,
    b: Vec3,
    c: Vec3,
    depth: u32,
    interpolation: f32,
    out: &mut MeshBuffer,
) {
    let t = effective_interpolation(interpolation);
    let mut stack = vec![WorkItem {
        corners: [a, b, c],
        depth,
    }];

    while let Some(WorkItem { corners, depth }) = stack.pop() {
        let [a, b, c] = corners;
        if depth == 0 {
            out.push_flat_triangle(corners, face_normal(a, b, c));
            continue;
        }

        let ab = normalize(a + b * t);
        let bc = normalize(b + c * t);
        let ca = normalize(c + a * t);
        let depth = depth - 1;

        // reversed so the first child is popped first
        stack.push(WorkItem {
            corners: [ab, bc, ca],
            depth,
        });
        stack.push(WorkItem {
            corners: [c, ca, bc],
            depth,
        });
        stack.push(WorkItem {
            corners: [b, bc, ab],
            depth,
        });
        stack.push(WorkItem {
            corners: [a, ab, ca],
            depth,
        });
    }
}

/// Subdivides every 9-scalar triangle of `base` and concatenates the leaves.
///
/// Scalars past the last complete triangle are ignored.
pub fn subdivide_icosahedron(base: &[f32], depth: u32, interpolation: f32) -> MeshBuffer {
    let triangles = base.len() / TRIANGLE_STRIDE;
    let mut out = MeshBuffer::with_capacity(triangles.saturating_mul(leaves_per_face(depth)));

    for tri in base.chunks_exact(TRIANGLE_STRIDE) {
        let a = Vec3::new(tri[0], tri[1], tri[2]);
        let b = Vec3::new(tri[3], tri[4], tri[5]);
        let c = Vec3::new(tri[6], tri[7], tri[8]);
        subdivide_triangle(a, b, c, depth, interpolation, &mut out);
    }

    out
}

use egui_wgpu::wgpu;
use icosphere_core::FLOATS_PER_VERTEX;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Vertex {
    pub(crate) position: [f32; 3],
    pub(crate) normal: [f32; 3],
}

pub(crate) const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct LineVertex {
    pub(crate) position: [f32; 3],
    pub(crate) color: [f32; 3],
}

pub(crate) const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// Reads an interleaved position/normal stream. A trailing partial record is dropped.
pub(crate) fn vertices_from_interleaved(data: &[f32]) -> Vec<Vertex> {
    data.chunks_exact(FLOATS_PER_VERTEX)
        .map(|v| Vertex {
            position: [v[0], v[1], v[2]],
            normal: [v[3], v[4], v[5]],
        })
        .collect()
}

/// Edge list for a triangle list: three segments per triangle, shared edges repeated.
pub(crate) fn wireframe_vertices(vertices: &[Vertex], color: [f32; 3]) -> Vec<LineVertex> {
    let mut lines = Vec::with_capacity(vertices.len() * 2);
    for tri in vertices.chunks_exact(3) {
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            lines.push(LineVertex {
                position: tri[a].position,
                color,
            });
            lines.push(LineVertex {
                position: tri[b].position,
                color,
            });
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_matches_interleaved_stride() {
        assert_eq!(
            std::mem::size_of::<Vertex>(),
            FLOATS_PER_VERTEX * std::mem::size_of::<f32>()
        );
    }

    #[test]
    fn interleaved_stream_splits_into_vertices() {
        let data = [
            1.0, 2.0, 3.0, 0.0, 1.0, 0.0, //
            4.0, 5.0, 6.0, 0.0, 0.0, 1.0, //
            9.0, 9.0,
        ];
        let vertices = vertices_from_interleaved(&data);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].position, [4.0, 5.0, 6.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(bytemuck::cast_slice::<Vertex, f32>(&vertices), &data[..12]);
    }

    #[test]
    fn wireframe_emits_three_edges_per_triangle() {
        let corner = |x: f32| Vertex {
            position: [x, 0.0, 0.0],
            normal: [0.0, 1.0, 0.0],
        };
        let vertices = [corner(0.0), corner(1.0), corner(2.0), corner(3.0)];
        let lines = wireframe_vertices(&vertices, [1.0; 3]);
        assert_eq!(lines.len(), 6);
        let xs: Vec<f32> = lines.iter().map(|l| l.position[0]).collect();
        assert_eq!(xs, [0.0, 1.0, 1.0, 2.0, 2.0, 0.0]);
    }
}

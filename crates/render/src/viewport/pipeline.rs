use std::borrow::Cow;

use egui_wgpu::wgpu::util::DeviceExt as _;

use super::mesh::{LineVertex, Vertex, LINE_ATTRIBUTES, VERTEX_ATTRIBUTES};

pub(super) const DEPTH_FORMAT: egui_wgpu::wgpu::TextureFormat =
    egui_wgpu::wgpu::TextureFormat::Depth24Plus;

/// Smallest vertex buffer allocation; buffers grow in powers of two from here.
const MIN_BUFFER_BYTES: u64 = 64 * 1024;

const SHADER: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    light_pos: vec3<f32>,
    _pad0: f32,
    light_color: vec3<f32>,
    _pad1: f32,
    object_color: vec3<f32>,
    _pad2: f32,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) world_pos: vec3<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = uniforms.model * vec4<f32>(input.position, 1.0);
    out.world_pos = world.xyz;
    out.normal = (uniforms.model * vec4<f32>(input.normal, 0.0)).xyz;
    out.position = uniforms.projection * uniforms.view * world;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let mode = i32(uniforms.params.x + 0.5);
    if mode == 1 {
        return vec4<f32>(normal * 0.5 + vec3<f32>(0.5), 1.0);
    }
    let ambient = uniforms.params.y * uniforms.light_color;
    let light_dir = normalize(uniforms.light_pos - input.world_pos);
    let diffuse = max(dot(normal, light_dir), 0.0) * uniforms.light_color;
    let color = min((ambient + diffuse) * uniforms.object_color, vec3<f32>(1.0));
    return vec4<f32>(color, 1.0);
}

struct LineInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
};

struct LineOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_line(input: LineInput) -> LineOutput {
    var out: LineOutput;
    out.position =
        uniforms.projection * uniforms.view * uniforms.model * vec4<f32>(input.position, 1.0);
    out.color = input.color;
    return out;
}

@fragment
fn fs_line(input: LineOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(input.color, 1.0);
}
"#;

const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var blit_tex: texture_2d<f32>;

@group(0) @binding(1)
var blit_sampler: sampler;

struct BlitOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOut {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );
    var out: BlitOut;
    out.position = vec4<f32>(positions[index], 0.0, 1.0);
    out.uv = uvs[index];
    return out;
}

@fragment
fn fs_blit(input: BlitOut) -> @location(0) vec4<f32> {
    return textureSample(blit_tex, blit_sampler, input.uv);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub(super) struct Uniforms {
    pub(super) model: [[f32; 4]; 4],
    pub(super) view: [[f32; 4]; 4],
    pub(super) projection: [[f32; 4]; 4],
    pub(super) light_pos: [f32; 3],
    pub(super) _pad0: f32,
    pub(super) light_color: [f32; 3],
    pub(super) _pad1: f32,
    pub(super) object_color: [f32; 3],
    pub(super) _pad2: f32,
    /// x: shading mode, y: ambient strength.
    pub(super) params: [f32; 4],
}

/// A vertex buffer that is rewritten in place and reallocated only when a
/// frame outgrows it.
pub(super) struct GrowableBuffer {
    label: &'static str,
    pub(super) buffer: egui_wgpu::wgpu::Buffer,
    pub(super) capacity: u64,
    pub(super) count: u32,
}

impl GrowableBuffer {
    fn new(device: &egui_wgpu::wgpu::Device, label: &'static str) -> Self {
        Self {
            label,
            buffer: create_vertex_buffer(device, label, MIN_BUFFER_BYTES),
            capacity: MIN_BUFFER_BYTES,
            count: 0,
        }
    }

    /// Returns true when the buffer had to be reallocated.
    pub(super) fn write<T: bytemuck::Pod>(
        &mut self,
        device: &egui_wgpu::wgpu::Device,
        queue: &egui_wgpu::wgpu::Queue,
        items: &[T],
    ) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(items);
        let needed = bytes.len() as u64;
        let grew = needed > self.capacity;
        if grew {
            let capacity = required_capacity(needed);
            tracing::debug!(
                "growing {} from {} to {} bytes",
                self.label,
                self.capacity,
                capacity
            );
            self.buffer = create_vertex_buffer(device, self.label, capacity);
            self.capacity = capacity;
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.count = items.len() as u32;
        grew
    }
}

pub(super) fn required_capacity(needed: u64) -> u64 {
    needed.max(MIN_BUFFER_BYTES).next_power_of_two()
}

fn create_vertex_buffer(
    device: &egui_wgpu::wgpu::Device,
    label: &'static str,
    size: u64,
) -> egui_wgpu::wgpu::Buffer {
    device.create_buffer(&egui_wgpu::wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: egui_wgpu::wgpu::BufferUsages::VERTEX | egui_wgpu::wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub(super) struct PipelineState {
    pub(super) mesh_pipeline: egui_wgpu::wgpu::RenderPipeline,
    pub(super) line_pipeline: egui_wgpu::wgpu::RenderPipeline,
    pub(super) blit_pipeline: egui_wgpu::wgpu::RenderPipeline,
    pub(super) blit_bind_group: egui_wgpu::wgpu::BindGroup,
    blit_bind_group_layout: egui_wgpu::wgpu::BindGroupLayout,
    blit_sampler: egui_wgpu::wgpu::Sampler,
    pub(super) offscreen_view: egui_wgpu::wgpu::TextureView,
    pub(super) depth_view: egui_wgpu::wgpu::TextureView,
    offscreen_size: [u32; 2],
    pub(super) uniform_buffer: egui_wgpu::wgpu::Buffer,
    pub(super) uniform_bind_group: egui_wgpu::wgpu::BindGroup,
    pub(super) mesh: GrowableBuffer,
    pub(super) wireframe: GrowableBuffer,
    pub(super) frame_version: u64,
    pub(super) wireframe_version: u64,
}

impl PipelineState {
    pub(super) fn new(
        device: &egui_wgpu::wgpu::Device,
        target_format: egui_wgpu::wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(egui_wgpu::wgpu::ShaderModuleDescriptor {
            label: Some("icosphere_viewport_shader"),
            source: egui_wgpu::wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER)),
        });

        let uniform_buffer =
            device.create_buffer_init(&egui_wgpu::wgpu::util::BufferInitDescriptor {
                label: Some("icosphere_viewport_uniforms"),
                contents: bytemuck::bytes_of(&Uniforms {
                    model: glam::Mat4::IDENTITY.to_cols_array_2d(),
                    view: glam::Mat4::IDENTITY.to_cols_array_2d(),
                    projection: glam::Mat4::IDENTITY.to_cols_array_2d(),
                    light_pos: [0.0, 0.0, 3.0],
                    _pad0: 0.0,
                    light_color: [1.0, 0.5, 0.31],
                    _pad1: 0.0,
                    object_color: [1.0, 0.5, 0.31],
                    _pad2: 0.0,
                    params: [0.0, 0.75, 0.0, 0.0],
                }),
                usage: egui_wgpu::wgpu::BufferUsages::UNIFORM
                    | egui_wgpu::wgpu::BufferUsages::COPY_DST,
            });

        let uniform_layout =
            device.create_bind_group_layout(&egui_wgpu::wgpu::BindGroupLayoutDescriptor {
                label: Some("icosphere_viewport_uniform_layout"),
                entries: &[egui_wgpu::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: egui_wgpu::wgpu::ShaderStages::VERTEX
                        | egui_wgpu::wgpu::ShaderStages::FRAGMENT,
                    ty: egui_wgpu::wgpu::BindingType::Buffer {
                        ty: egui_wgpu::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&egui_wgpu::wgpu::BindGroupDescriptor {
            label: Some("icosphere_viewport_uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[egui_wgpu::wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout =
            device.create_pipeline_layout(&egui_wgpu::wgpu::PipelineLayoutDescriptor {
                label: Some("icosphere_viewport_layout"),
                bind_group_layouts: &[&uniform_layout],
                push_constant_ranges: &[],
            });

        let color_target = [Some(egui_wgpu::wgpu::ColorTargetState {
            format: target_format,
            blend: Some(egui_wgpu::wgpu::BlendState::REPLACE),
            write_mask: egui_wgpu::wgpu::ColorWrites::ALL,
        })];

        let mesh_pipeline =
            device.create_render_pipeline(&egui_wgpu::wgpu::RenderPipelineDescriptor {
                label: Some("icosphere_mesh_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: egui_wgpu::wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: egui_wgpu::wgpu::PipelineCompilationOptions::default(),
                    buffers: &[egui_wgpu::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>()
                            as egui_wgpu::wgpu::BufferAddress,
                        step_mode: egui_wgpu::wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    }],
                },
                fragment: Some(egui_wgpu::wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: egui_wgpu::wgpu::PipelineCompilationOptions::default(),
                    targets: &color_target,
                }),
                primitive: egui_wgpu::wgpu::PrimitiveState {
                    topology: egui_wgpu::wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                // pushed back slightly so wireframe edges win the depth test
                depth_stencil: Some(egui_wgpu::wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: egui_wgpu::wgpu::CompareFunction::LessEqual,
                    stencil: egui_wgpu::wgpu::StencilState::default(),
                    bias: egui_wgpu::wgpu::DepthBiasState {
                        constant: 2,
                        slope_scale: 1.0,
                        clamp: 0.0,
                    },
                }),
                multisample: egui_wgpu::wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let line_pipeline =
            device.create_render_pipeline(&egui_wgpu::wgpu::RenderPipelineDescriptor {
                label: Some("icosphere_wireframe_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: egui_wgpu::wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_line"),
                    compilation_options: egui_wgpu::wgpu::PipelineCompilationOptions::default(),
                    buffers: &[egui_wgpu::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<LineVertex>()
                            as egui_wgpu::wgpu::BufferAddress,
                        step_mode: egui_wgpu::wgpu::VertexStepMode::Vertex,
                        attributes: &LINE_ATTRIBUTES,
                    }],
                },
                fragment: Some(egui_wgpu::wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_line"),
                    compilation_options: egui_wgpu::wgpu::PipelineCompilationOptions::default(),
                    targets: &color_target,
                }),
                primitive: egui_wgpu::wgpu::PrimitiveState {
                    topology: egui_wgpu::wgpu::PrimitiveTopology::LineList,
                    ..Default::default()
                },
                depth_stencil: Some(egui_wgpu::wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: egui_wgpu::wgpu::CompareFunction::LessEqual,
                    stencil: egui_wgpu::wgpu::StencilState::default(),
                    bias: egui_wgpu::wgpu::DepthBiasState::default(),
                }),
                multisample: egui_wgpu::wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let blit_shader = device.create_shader_module(egui_wgpu::wgpu::ShaderModuleDescriptor {
            label: Some("icosphere_viewport_blit"),
            source: egui_wgpu::wgpu::ShaderSource::Wgsl(Cow::Borrowed(BLIT_SHADER)),
        });

        let blit_bind_group_layout =
            device.create_bind_group_layout(&egui_wgpu::wgpu::BindGroupLayoutDescriptor {
                label: Some("icosphere_viewport_blit_layout"),
                entries: &[
                    egui_wgpu::wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: egui_wgpu::wgpu::ShaderStages::FRAGMENT,
                        ty: egui_wgpu::wgpu::BindingType::Texture {
                            sample_type: egui_wgpu::wgpu::TextureSampleType::Float {
                                filterable: true,
                            },
                            view_dimension: egui_wgpu::wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    egui_wgpu::wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: egui_wgpu::wgpu::ShaderStages::FRAGMENT,
                        ty: egui_wgpu::wgpu::BindingType::Sampler(
                            egui_wgpu::wgpu::SamplerBindingType::Filtering,
                        ),
                        count: None,
                    },
                ],
            });

        let blit_sampler = device.create_sampler(&egui_wgpu::wgpu::SamplerDescriptor {
            label: Some("icosphere_viewport_blit_sampler"),
            mag_filter: egui_wgpu::wgpu::FilterMode::Linear,
            min_filter: egui_wgpu::wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let blit_pipeline_layout =
            device.create_pipeline_layout(&egui_wgpu::wgpu::PipelineLayoutDescriptor {
                label: Some("icosphere_viewport_blit_pipeline_layout"),
                bind_group_layouts: &[&blit_bind_group_layout],
                push_constant_ranges: &[],
            });

        let blit_pipeline =
            device.create_render_pipeline(&egui_wgpu::wgpu::RenderPipelineDescriptor {
                label: Some("icosphere_viewport_blit_pipeline"),
                layout: Some(&blit_pipeline_layout),
                vertex: egui_wgpu::wgpu::VertexState {
                    module: &blit_shader,
                    entry_point: Some("vs_blit"),
                    compilation_options: egui_wgpu::wgpu::PipelineCompilationOptions::default(),
                    buffers: &[],
                },
                fragment: Some(egui_wgpu::wgpu::FragmentState {
                    module: &blit_shader,
                    entry_point: Some("fs_blit"),
                    compilation_options: egui_wgpu::wgpu::PipelineCompilationOptions::default(),
                    targets: &color_target,
                }),
                primitive: egui_wgpu::wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: egui_wgpu::wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let (offscreen_view, depth_view) = create_offscreen_targets(device, target_format, 1, 1);
        let blit_bind_group =
            create_blit_bind_group(device, &blit_bind_group_layout, &offscreen_view, &blit_sampler);

        tracing::info!("viewport pipelines created for {:?}", target_format);

        Self {
            mesh_pipeline,
            line_pipeline,
            blit_pipeline,
            blit_bind_group,
            blit_bind_group_layout,
            blit_sampler,
            offscreen_view,
            depth_view,
            offscreen_size: [1, 1],
            uniform_buffer,
            uniform_bind_group,
            mesh: GrowableBuffer::new(device, "icosphere_mesh_vertices"),
            wireframe: GrowableBuffer::new(device, "icosphere_wireframe_vertices"),
            frame_version: 0,
            wireframe_version: 0,
        }
    }
}

fn create_blit_bind_group(
    device: &egui_wgpu::wgpu::Device,
    layout: &egui_wgpu::wgpu::BindGroupLayout,
    view: &egui_wgpu::wgpu::TextureView,
    sampler: &egui_wgpu::wgpu::Sampler,
) -> egui_wgpu::wgpu::BindGroup {
    device.create_bind_group(&egui_wgpu::wgpu::BindGroupDescriptor {
        label: Some("icosphere_viewport_blit_group"),
        layout,
        entries: &[
            egui_wgpu::wgpu::BindGroupEntry {
                binding: 0,
                resource: egui_wgpu::wgpu::BindingResource::TextureView(view),
            },
            egui_wgpu::wgpu::BindGroupEntry {
                binding: 1,
                resource: egui_wgpu::wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_offscreen_targets(
    device: &egui_wgpu::wgpu::Device,
    target_format: egui_wgpu::wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> (egui_wgpu::wgpu::TextureView, egui_wgpu::wgpu::TextureView) {
    let size = egui_wgpu::wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    };
    let color = device.create_texture(&egui_wgpu::wgpu::TextureDescriptor {
        label: Some("icosphere_viewport_offscreen"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: egui_wgpu::wgpu::TextureDimension::D2,
        format: target_format,
        usage: egui_wgpu::wgpu::TextureUsages::RENDER_ATTACHMENT
            | egui_wgpu::wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let depth = device.create_texture(&egui_wgpu::wgpu::TextureDescriptor {
        label: Some("icosphere_viewport_depth"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: egui_wgpu::wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: egui_wgpu::wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    (
        color.create_view(&egui_wgpu::wgpu::TextureViewDescriptor::default()),
        depth.create_view(&egui_wgpu::wgpu::TextureViewDescriptor::default()),
    )
}

/// Recreates the offscreen color/depth pair when the viewport size changes.
pub(super) fn ensure_offscreen_targets(
    device: &egui_wgpu::wgpu::Device,
    pipeline: &mut PipelineState,
    target_format: egui_wgpu::wgpu::TextureFormat,
    width: u32,
    height: u32,
) {
    let size = [width.max(1), height.max(1)];
    if pipeline.offscreen_size == size {
        return;
    }

    let (offscreen_view, depth_view) =
        create_offscreen_targets(device, target_format, size[0], size[1]);
    pipeline.blit_bind_group = create_blit_bind_group(
        device,
        &pipeline.blit_bind_group_layout,
        &offscreen_view,
        &pipeline.blit_sampler,
    );
    pipeline.offscreen_view = offscreen_view;
    pipeline.depth_view = depth_view;
    pipeline.offscreen_size = size;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        // three mat4 plus four 16-byte rows
        assert_eq!(std::mem::size_of::<Uniforms>(), 3 * 64 + 4 * 16);
    }

    #[test]
    fn capacity_grows_in_powers_of_two() {
        assert_eq!(required_capacity(0), MIN_BUFFER_BYTES);
        assert_eq!(required_capacity(MIN_BUFFER_BYTES + 1), MIN_BUFFER_BYTES * 2);
        // depth 3 sphere: 3840 vertices of 24 bytes
        assert_eq!(required_capacity(3840 * 24), 128 * 1024);
    }
}

use std::sync::{Arc, Mutex};

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use egui::epaint::Rect;
use egui_wgpu::{CallbackResources, CallbackTrait};

use super::mesh::wireframe_vertices;
use super::pipeline::{ensure_offscreen_targets, PipelineState, Uniforms};
use super::{ViewportDisplay, ViewportFrameState, ViewportShadingMode, ViewportStatsState};

pub(super) struct ViewportCallback {
    pub(super) target_format: egui_wgpu::wgpu::TextureFormat,
    pub(super) rect: Rect,
    pub(super) display: ViewportDisplay,
    pub(super) stats: Arc<Mutex<ViewportStatsState>>,
    pub(super) frame: Arc<Mutex<ViewportFrameState>>,
}

impl CallbackTrait for ViewportCallback {
    fn prepare(
        &self,
        device: &egui_wgpu::wgpu::Device,
        queue: &egui_wgpu::wgpu::Queue,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        egui_encoder: &mut egui_wgpu::wgpu::CommandEncoder,
        callback_resources: &mut CallbackResources,
    ) -> Vec<egui_wgpu::wgpu::CommandBuffer> {
        if callback_resources.get::<PipelineState>().is_none() {
            callback_resources.insert(PipelineState::new(device, self.target_format));
        }
        let Some(pipeline) = callback_resources.get_mut::<PipelineState>() else {
            return Vec::new();
        };

        let width = (self.rect.width() * screen_descriptor.pixels_per_point)
            .round()
            .max(1.0) as u32;
        let height = (self.rect.height() * screen_descriptor.pixels_per_point)
            .round()
            .max(1.0) as u32;
        ensure_offscreen_targets(device, pipeline, self.target_format, width, height);

        let Ok(frame) = self.frame.lock() else {
            return Vec::new();
        };

        let mut reallocated = false;
        let uploaded = frame.version != pipeline.frame_version;
        if uploaded {
            reallocated |= pipeline.mesh.write(device, queue, frame.vertices.as_slice());
            pipeline.frame_version = frame.version;
        }
        // edges are rebuilt lazily, only while the overlay is visible
        if self.display.wireframe && frame.version != pipeline.wireframe_version {
            let lines =
                wireframe_vertices(frame.vertices.as_slice(), self.display.wireframe_color);
            reallocated |= pipeline.wireframe.write(device, queue, &lines);
            pipeline.wireframe_version = frame.version;
        }

        let draw_count = frame.draw_count.min(pipeline.mesh.count);
        let camera_pos = frame.view.inverse().w_axis.truncate();
        let shading_mode = match self.display.shading_mode {
            ViewportShadingMode::Lit => 0.0,
            ViewportShadingMode::Normals => 1.0,
        };
        let uniforms = Uniforms {
            model: frame.model.to_cols_array_2d(),
            view: frame.view.to_cols_array_2d(),
            projection: frame.projection.to_cols_array_2d(),
            light_pos: camera_pos.to_array(),
            _pad0: 0.0,
            light_color: self.display.light_color,
            _pad1: 0.0,
            object_color: self.display.object_color,
            _pad2: 0.0,
            params: [shading_mode, self.display.ambient_strength, 0.0, 0.0],
        };
        drop(frame);

        queue.write_buffer(&pipeline.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        if let Ok(mut stats_state) = self.stats.lock() {
            stats_state.record_frame(Instant::now());
            let stats = &mut stats_state.stats;
            stats.vertex_count = draw_count;
            stats.triangle_count = draw_count / 3;
            stats.buffer_bytes = pipeline.mesh.capacity + pipeline.wireframe.capacity;
            if uploaded {
                stats.uploads += 1;
            }
            if reallocated {
                stats.buffer_reallocations += 1;
            }
        }

        let [r, g, b] = self.display.background;
        let mut render_pass = egui_encoder.begin_render_pass(&egui_wgpu::wgpu::RenderPassDescriptor {
            label: Some("icosphere_viewport_offscreen"),
            color_attachments: &[Some(egui_wgpu::wgpu::RenderPassColorAttachment {
                view: &pipeline.offscreen_view,
                resolve_target: None,
                depth_slice: None,
                ops: egui_wgpu::wgpu::Operations {
                    load: egui_wgpu::wgpu::LoadOp::Clear(egui_wgpu::wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: 1.0,
                    }),
                    store: egui_wgpu::wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(egui_wgpu::wgpu::RenderPassDepthStencilAttachment {
                view: &pipeline.depth_view,
                depth_ops: Some(egui_wgpu::wgpu::Operations {
                    load: egui_wgpu::wgpu::LoadOp::Clear(1.0),
                    store: egui_wgpu::wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        if draw_count > 0 {
            render_pass.set_pipeline(&pipeline.mesh_pipeline);
            render_pass.set_bind_group(0, &pipeline.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, pipeline.mesh.buffer.slice(..));
            render_pass.draw(0..draw_count, 0..1);

            let line_count = (draw_count / 3 * 6).min(pipeline.wireframe.count);
            if self.display.wireframe && line_count > 0 {
                render_pass.set_pipeline(&pipeline.line_pipeline);
                render_pass.set_vertex_buffer(0, pipeline.wireframe.buffer.slice(..));
                render_pass.draw(0..line_count, 0..1);
            }
        }

        Vec::new()
    }

    fn paint(
        &self,
        info: egui::epaint::PaintCallbackInfo,
        render_pass: &mut egui_wgpu::wgpu::RenderPass<'static>,
        callback_resources: &CallbackResources,
    ) {
        let viewport = info.viewport_in_pixels();
        let clip = info.clip_rect_in_pixels();
        if viewport.width_px <= 0
            || viewport.height_px <= 0
            || clip.width_px <= 0
            || clip.height_px <= 0
        {
            return;
        }

        let Some(pipeline) = callback_resources.get::<PipelineState>() else {
            return;
        };

        render_pass.set_viewport(
            viewport.left_px as f32,
            viewport.top_px as f32,
            viewport.width_px as f32,
            viewport.height_px as f32,
            0.0,
            1.0,
        );
        render_pass.set_scissor_rect(
            clip.left_px.max(0) as u32,
            clip.top_px.max(0) as u32,
            clip.width_px.max(0) as u32,
            clip.height_px.max(0) as u32,
        );
        render_pass.set_pipeline(&pipeline.blit_pipeline);
        render_pass.set_bind_group(0, &pipeline.blit_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

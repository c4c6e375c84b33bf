use std::sync::{Arc, Mutex};

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use egui::epaint::{PaintCallback, Rect};
use egui_wgpu::Callback;
use glam::Mat4;
use icosphere_core::{Renderer, TransformSlot};

mod callback;
mod mesh;
mod pipeline;

use callback::ViewportCallback;
use mesh::{vertices_from_interleaved, Vertex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportShadingMode {
    Lit,
    Normals,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewportDisplay {
    pub shading_mode: ViewportShadingMode,
    pub wireframe: bool,
    pub object_color: [f32; 3],
    pub light_color: [f32; 3],
    pub wireframe_color: [f32; 3],
    pub background: [f32; 3],
    pub ambient_strength: f32,
}

impl Default for ViewportDisplay {
    fn default() -> Self {
        Self {
            shading_mode: ViewportShadingMode::Lit,
            wireframe: true,
            object_color: [1.0, 0.5, 0.31],
            light_color: [1.0, 0.5, 0.31],
            wireframe_color: [0.95, 0.9, 0.8],
            background: [0.1, 0.1, 0.12],
            ambient_strength: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewportStats {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub vertex_count: u32,
    pub triangle_count: u32,
    pub buffer_bytes: u64,
    pub buffer_reallocations: u64,
    pub uploads: u64,
}

struct ViewportStatsState {
    last_frame: Option<Instant>,
    stats: ViewportStats,
}

impl ViewportStatsState {
    fn record_frame(&mut self, now: Instant) {
        if let Some(last) = self.last_frame {
            let dt = (now - last).as_secs_f32();
            if dt > 0.0 {
                let fps = 1.0 / dt;
                let frame_ms = dt * 1000.0;
                if self.stats.fps == 0.0 {
                    self.stats.fps = fps;
                    self.stats.frame_time_ms = frame_ms;
                } else {
                    let alpha = 0.1;
                    self.stats.fps += (fps - self.stats.fps) * alpha;
                    self.stats.frame_time_ms += (frame_ms - self.stats.frame_time_ms) * alpha;
                }
            }
        }
        self.last_frame = Some(now);
    }
}

/// Latest frame handed over by the frame driver, read by the paint callback.
struct ViewportFrameState {
    version: u64,
    vertices: Arc<Vec<Vertex>>,
    model: Mat4,
    view: Mat4,
    projection: Mat4,
    draw_count: u32,
}

impl Default for ViewportFrameState {
    fn default() -> Self {
        Self {
            version: 0,
            vertices: Arc::new(Vec::new()),
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            draw_count: 0,
        }
    }
}

/// wgpu viewport that receives frames through [`Renderer`] and paints them
/// inside an egui rect.
pub struct ViewportRenderer {
    target_format: egui_wgpu::wgpu::TextureFormat,
    stats: Arc<Mutex<ViewportStatsState>>,
    frame: Arc<Mutex<ViewportFrameState>>,
}

impl ViewportRenderer {
    pub fn new(target_format: egui_wgpu::wgpu::TextureFormat) -> Self {
        Self {
            target_format,
            stats: Arc::new(Mutex::new(ViewportStatsState {
                last_frame: None,
                stats: ViewportStats::default(),
            })),
            frame: Arc::new(Mutex::new(ViewportFrameState::default())),
        }
    }

    pub fn paint_callback(&self, rect: Rect, display: ViewportDisplay) -> PaintCallback {
        Callback::new_paint_callback(
            rect,
            ViewportCallback {
                target_format: self.target_format,
                rect,
                display,
                stats: self.stats.clone(),
                frame: self.frame.clone(),
            },
        )
    }

    pub fn stats_snapshot(&self) -> ViewportStats {
        self.stats
            .lock()
            .map(|state| state.stats)
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl ViewportRenderer {
    fn frame_version(&self) -> u64 {
        self.frame.lock().map(|state| state.version).unwrap_or(0)
    }

    fn pending_draw_count(&self) -> u32 {
        self.frame
            .lock()
            .map(|state| state.draw_count.min(state.vertices.len() as u32))
            .unwrap_or(0)
    }

    fn transform(&self, slot: TransformSlot) -> Mat4 {
        self.frame
            .lock()
            .map(|state| match slot {
                TransformSlot::Model => state.model,
                TransformSlot::View => state.view,
                TransformSlot::Projection => state.projection,
            })
            .unwrap_or(Mat4::IDENTITY)
    }
}

impl Renderer for ViewportRenderer {
    fn replace_vertices(&mut self, vertices: &[f32]) {
        let vertices = Arc::new(vertices_from_interleaved(vertices));
        if let Ok(mut state) = self.frame.lock() {
            state.version = state.version.wrapping_add(1);
            state.vertices = vertices;
        }
    }

    fn set_transform(&mut self, slot: TransformSlot, matrix: Mat4) {
        if let Ok(mut state) = self.frame.lock() {
            match slot {
                TransformSlot::Model => state.model = matrix,
                TransformSlot::View => state.view = matrix,
                TransformSlot::Projection => state.projection = matrix,
            }
        }
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        if let Ok(mut state) = self.frame.lock() {
            if vertex_count as usize > state.vertices.len() {
                tracing::warn!(
                    "draw of {} vertices exceeds buffer of {}; clamping",
                    vertex_count,
                    state.vertices.len()
                );
            }
            state.draw_count = vertex_count;
        }
    }
}

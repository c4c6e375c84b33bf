#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::icosahedron::build_icosahedron;
use crate::input::{InputEvent, InputSource};
use crate::mesh::{MeshBuffer, FLOATS_PER_VERTEX};
use crate::subdivide::subdivide_icosahedron;

pub const SUBDIVISION_DEPTH: u32 = 3;

/// Deepest level the driver will generate: 1.3M triangles, 3.9M vertices.
pub const MAX_SUBDIVISION_DEPTH: u32 = 8;

/// Angular rate of the sine driving the morph between solid and sphere.
pub const MORPH_RATE: f32 = 0.25;

/// Interpolation factor for `time` seconds, oscillating within `[0, 1]`.
pub fn interpolation_at(time: f32) -> f32 {
    ((MORPH_RATE * time).sin() + 1.0) / 2.0
}

/// Places the sphere at `translation` and spins it about Y by `time` radians.
pub fn model_matrix(time: f32, translation: Vec3) -> Mat4 {
    Mat4::from_translation(translation) * Mat4::from_rotation_y(time)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformSlot {
    Model,
    View,
    Projection,
}

impl TransformSlot {
    /// Uniform name the shader expects for this slot.
    pub fn name(self) -> &'static str {
        match self {
            TransformSlot::Model => "model",
            TransformSlot::View => "view",
            TransformSlot::Projection => "projection",
        }
    }
}

/// Sink for one frame of geometry.
///
/// `vertices` is interleaved position and normal, 6 scalars per vertex. Each
/// call to `replace_vertices` supersedes the previous buffer entirely.
pub trait Renderer {
    fn replace_vertices(&mut self, vertices: &[f32]);
    fn set_transform(&mut self, slot: TransformSlot, matrix: Mat4);
    fn draw_triangles(&mut self, vertex_count: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub time: f32,
    pub interpolation: f32,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub generation_ms: f32,
}

/// Owns the base solid and camera and turns each tick into a full mesh upload.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    base: Vec<f32>,
    camera: Camera,
    translation: Vec3,
    depth: u32,
    last_frame: Option<FrameStats>,
}

impl FrameDriver {
    pub fn new(camera: Camera) -> Self {
        Self {
            base: build_icosahedron(),
            camera,
            translation: Vec3::ZERO,
            depth: SUBDIVISION_DEPTH,
            last_frame: None,
        }
    }

    /// Depths past [`MAX_SUBDIVISION_DEPTH`] are clamped to it.
    pub fn with_depth(mut self, depth: u32) -> Self {
        if depth > MAX_SUBDIVISION_DEPTH {
            tracing::warn!("subdivision depth {depth} clamped to {MAX_SUBDIVISION_DEPTH}");
        }
        self.depth = depth.min(MAX_SUBDIVISION_DEPTH);
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn last_frame(&self) -> Option<FrameStats> {
        self.last_frame
    }

    /// Regenerates the sphere for an explicit interpolation factor.
    pub fn generate(&self, interpolation: f32) -> MeshBuffer {
        subdivide_icosahedron(&self.base, self.depth, interpolation)
    }

    /// Applies one event to the camera. Returns `FrameStatus::Quit` for a quit
    /// request and leaves the camera untouched.
    pub fn apply_event(&mut self, event: InputEvent, delta_time: f32) -> FrameStatus {
        match event {
            InputEvent::Quit => return FrameStatus::Quit,
            InputEvent::Look { dx, dy } => self.camera.look(dx, dy),
            InputEvent::Move {
                direction,
                magnitude,
            } => self.camera.translate(direction, delta_time * magnitude),
            InputEvent::Zoom { delta } => self.camera.zoom(delta),
            InputEvent::SetCameraMode { mode } => self.camera.set_mode(mode),
            InputEvent::ToggleCameraMode => self.camera.toggle_mode(),
        }
        FrameStatus::Continue
    }

    /// Drains `input`, rebuilds the mesh for `time` and submits it to `renderer`.
    /// Nothing is drawn once a quit event is seen.
    pub fn run_frame<I, R>(
        &mut self,
        time: f32,
        delta_time: f32,
        input: &mut I,
        renderer: &mut R,
    ) -> FrameStatus
    where
        I: InputSource + ?Sized,
        R: Renderer + ?Sized,
    {
        for event in input.poll_events() {
            if self.apply_event(event, delta_time) == FrameStatus::Quit {
                tracing::info!("quit requested at t={time:.2}s");
                return FrameStatus::Quit;
            }
        }

        let start = Instant::now();
        let interpolation = interpolation_at(time);
        let mesh = self.generate(interpolation);
        let generation_ms = start.elapsed().as_secs_f32() * 1000.0;

        let vertex_count = mesh.as_slice().len() / FLOATS_PER_VERTEX;
        tracing::debug!(
            "regenerated {} triangles at t={:.3} (interp {:.3}) in {:.2}ms",
            mesh.triangle_count(),
            time,
            interpolation,
            generation_ms
        );

        renderer.replace_vertices(mesh.as_slice());
        renderer.set_transform(TransformSlot::Model, model_matrix(time, self.translation));
        renderer.set_transform(TransformSlot::View, self.camera.view_matrix());
        renderer.set_transform(TransformSlot::Projection, self.camera.projection());
        renderer.draw_triangles(u32::try_from(vertex_count).unwrap_or(u32::MAX));

        self.last_frame = Some(FrameStats {
            time,
            interpolation,
            vertex_count,
            triangle_count: mesh.triangle_count(),
            generation_ms,
        });
        FrameStatus::Continue
    }
}

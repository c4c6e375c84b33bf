use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::{normalize, normalized_cross};

/// Degrees of yaw/pitch per unit of look input.
pub const LOOK_SENSITIVITY: f32 = 0.1;
/// World units per second of movement input.
pub const MOVE_SPEED: f32 = 25.0;
/// Orbit distance change per unit of zoom input.
pub const ZOOM_SPEED: f32 = 5.0;
pub const PITCH_LIMIT_DEGREES: f32 = 89.0;
pub const ZOOM_LIMIT: f32 = 1000.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;
pub const DEFAULT_FOV_DEGREES: f32 = 45.0;
pub const WORLD_UP: Vec3 = Vec3::Y;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    FirstPerson,
    Orbit,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::FirstPerson => CameraMode::Orbit,
            CameraMode::Orbit => CameraMode::FirstPerson,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraMode::FirstPerson => "First person",
            CameraMode::Orbit => "Orbit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

fn wrap_yaw(yaw: f32) -> f32 {
    let wrapped = yaw.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES)
}

/// Yaw and pitch in degrees. Yaw stays in `[0, 360)`, pitch in `[-89, 89]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    yaw: f32,
    pitch: f32,
}

impl Orientation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw: wrap_yaw(yaw),
            pitch: clamp_pitch(pitch),
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    fn apply_look(&mut self, dx: f32, dy: f32) {
        self.yaw = wrap_yaw(self.yaw + dx * LOOK_SENSITIVITY);
        self.pitch = clamp_pitch(self.pitch - dy * LOOK_SENSITIVITY);
    }

    /// Spherical-to-Cartesian direction for this yaw/pitch.
    pub fn direction(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        normalize(Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        ))
    }
}

/// Behaviour shared by both camera modes.
pub trait CameraRig {
    fn look(&mut self, dx: f32, dy: f32);
    fn translate(&mut self, direction: MoveDirection, delta_time: f32, up: Vec3);
    fn zoom(&mut self, delta: f32);
    fn view_matrix(&self, up: Vec3) -> Mat4;
    fn position(&self) -> Vec3;
    fn orientation(&self) -> Orientation;
}

/// Free-look camera that translates its own position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstPersonRig {
    orientation: Orientation,
    position: Vec3,
    forward: Vec3,
}

impl Default for FirstPersonRig {
    fn default() -> Self {
        // yaw 270 faces -Z
        Self::new(Vec3::new(0.0, 0.0, 3.0), Orientation::new(270.0, 0.0))
    }
}

impl FirstPersonRig {
    pub fn new(position: Vec3, orientation: Orientation) -> Self {
        Self {
            orientation,
            position,
            forward: orientation.direction(),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }
}

impl CameraRig for FirstPersonRig {
    fn look(&mut self, dx: f32, dy: f32) {
        self.orientation.apply_look(dx, dy);
        self.forward = self.orientation.direction();
    }

    fn translate(&mut self, direction: MoveDirection, delta_time: f32, up: Vec3) {
        let speed = MOVE_SPEED * delta_time;
        let right = normalized_cross(self.forward, up);
        match direction {
            MoveDirection::Forward => self.position += self.forward * speed,
            MoveDirection::Backward => self.position -= self.forward * speed,
            MoveDirection::Left => self.position -= right * speed,
            MoveDirection::Right => self.position += right * speed,
        }
    }

    fn zoom(&mut self, _delta: f32) {}

    fn view_matrix(&self, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, up)
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Camera circling a movable target at a signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitRig {
    orientation: Orientation,
    distance: f32,
    target: Vec3,
}

impl Default for OrbitRig {
    fn default() -> Self {
        // yaw 90 puts the camera on +Z
        Self::new(Vec3::ZERO, 3.0, Orientation::new(90.0, 0.0))
    }
}

impl OrbitRig {
    pub fn new(target: Vec3, distance: f32, orientation: Orientation) -> Self {
        Self {
            orientation,
            distance: distance.clamp(-ZOOM_LIMIT, ZOOM_LIMIT),
            target,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Unit offset from the target toward the camera, before scaling by distance.
    fn offset_direction(&self) -> Vec3 {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            -(self.orientation.yaw - 90.0).to_radians(),
            self.orientation.pitch.to_radians(),
            0.0,
        );
        rotation * Vec3::Z
    }

    /// Direction the camera faces; defined even when the distance is zero.
    pub fn look_direction(&self) -> Vec3 {
        let offset = self.offset_direction();
        if self.distance < 0.0 {
            offset
        } else {
            -offset
        }
    }
}

impl CameraRig for OrbitRig {
    fn look(&mut self, dx: f32, dy: f32) {
        self.orientation.apply_look(dx, dy);
    }

    fn translate(&mut self, direction: MoveDirection, delta_time: f32, up: Vec3) {
        let speed = MOVE_SPEED * delta_time;
        let facing = self.look_direction();

        let mut right = normalized_cross(facing, up);
        right.y = 0.0;
        let right = normalize(right);

        let mut forward = facing;
        forward.y = 0.0;
        let forward = normalize(forward);

        match direction {
            MoveDirection::Forward => self.target += forward * speed,
            MoveDirection::Backward => self.target -= forward * speed,
            MoveDirection::Right => self.target += right * speed,
            MoveDirection::Left => self.target -= right * speed,
        }
    }

    fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - ZOOM_SPEED * delta).clamp(-ZOOM_LIMIT, ZOOM_LIMIT);
    }

    fn view_matrix(&self, up: Vec3) -> Mat4 {
        Mat4::look_to_rh(self.position(), self.look_direction(), up)
    }

    fn position(&self) -> Vec3 {
        self.target + self.offset_direction() * self.distance
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Two-mode camera. Each mode keeps its own state, so switching away and back
/// restores the previous view.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    mode: CameraMode,
    first_person: FirstPersonRig,
    orbit: OrbitRig,
    fov_degrees: f32,
    screen_size: [u32; 2],
    up: Vec3,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_mode(width, height, CameraMode::FirstPerson)
    }

    pub fn with_mode(width: u32, height: u32, mode: CameraMode) -> Self {
        Self {
            mode,
            first_person: FirstPersonRig::default(),
            orbit: OrbitRig::default(),
            fov_degrees: DEFAULT_FOV_DEGREES,
            screen_size: [width, height],
            up: WORLD_UP,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        if self.mode != mode {
            tracing::debug!("camera mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    pub fn first_person(&self) -> &FirstPersonRig {
        &self.first_person
    }

    pub fn orbit(&self) -> &OrbitRig {
        &self.orbit
    }

    fn active_rig(&self) -> &dyn CameraRig {
        match self.mode {
            CameraMode::FirstPerson => &self.first_person,
            CameraMode::Orbit => &self.orbit,
        }
    }

    fn active_rig_mut(&mut self) -> &mut dyn CameraRig {
        match self.mode {
            CameraMode::FirstPerson => &mut self.first_person,
            CameraMode::Orbit => &mut self.orbit,
        }
    }

    pub fn look(&mut self, dx: f32, dy: f32) {
        self.active_rig_mut().look(dx, dy);
    }

    pub fn translate(&mut self, direction: MoveDirection, delta_time: f32) {
        let up = self.up;
        self.active_rig_mut().translate(direction, delta_time, up);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.active_rig_mut().zoom(delta);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.active_rig().view_matrix(self.up)
    }

    pub fn position(&self) -> Vec3 {
        self.active_rig().position()
    }

    pub fn orientation(&self) -> Orientation {
        self.active_rig().orientation()
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn set_fov_degrees(&mut self, fov: f32) {
        self.fov_degrees = fov.clamp(1.0, 179.0);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen_size = [width, height];
    }

    pub fn aspect_ratio(&self) -> f32 {
        let [width, height] = self.screen_size;
        width.max(1) as f32 / height.max(1) as f32
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect_ratio(),
            NEAR_PLANE,
            FAR_PLANE,
        )
    }

    /// Orbits `target` at `distance` and parks the first-person camera on the
    /// +X side of it, facing back toward the target.
    pub fn look_at(&mut self, target: Vec3, distance: f32) {
        self.orbit = OrbitRig::new(target, distance, self.orbit.orientation);
        self.first_person = FirstPersonRig::new(
            target + Vec3::new(distance, 0.0, 0.0),
            Orientation::new(180.0, 0.0),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn default_first_person_faces_negative_z() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode(), CameraMode::FirstPerson);
        assert_vec_close(camera.first_person().forward(), Vec3::NEG_Z);
        assert_vec_close(camera.position(), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn default_orbit_sits_on_positive_z() {
        let camera = Camera::with_mode(800, 600, CameraMode::Orbit);
        assert_vec_close(camera.position(), Vec3::new(0.0, 0.0, 3.0));
        assert_vec_close(camera.orbit().look_direction(), Vec3::NEG_Z);
    }

    #[test]
    fn pitch_is_clamped_for_large_input() {
        for mode in [CameraMode::FirstPerson, CameraMode::Orbit] {
            let mut camera = Camera::with_mode(800, 600, mode);
            camera.look(0.0, -1.0e6);
            assert_eq!(camera.orientation().pitch(), PITCH_LIMIT_DEGREES);
            for _ in 0..100 {
                camera.look(0.0, 5_000.0);
            }
            assert_eq!(camera.orientation().pitch(), -PITCH_LIMIT_DEGREES);
        }
    }

    #[test]
    fn yaw_wraps_into_range() {
        let mut camera = Camera::new(800, 600);
        for dx in [1.0e5, -3.7e4, 3600.0, -0.000_01, 12_345.6] {
            camera.look(dx, 0.0);
            let yaw = camera.orientation().yaw();
            assert!((0.0..360.0).contains(&yaw), "yaw {yaw} escaped");
        }
        assert_eq!(Orientation::new(-90.0, 0.0).yaw(), 270.0);
    }

    #[test]
    fn switching_modes_restores_view() {
        let mut camera = Camera::new(1280, 720);
        camera.look(120.0, -40.0);
        camera.translate(MoveDirection::Forward, 0.1);
        let first_person_view = camera.view_matrix();

        camera.set_mode(CameraMode::Orbit);
        camera.look(-300.0, 80.0);
        camera.zoom(2.0);
        camera.translate(MoveDirection::Left, 0.05);
        let orbit_view = camera.view_matrix();

        camera.set_mode(CameraMode::FirstPerson);
        assert_eq!(camera.view_matrix(), first_person_view);

        camera.toggle_mode();
        assert_eq!(camera.mode(), CameraMode::Orbit);
        assert_eq!(camera.view_matrix(), orbit_view);
    }

    #[test]
    fn first_person_moves_along_forward_and_strafes() {
        let mut camera = Camera::new(800, 600);
        camera.translate(MoveDirection::Forward, 0.1);
        assert_vec_close(camera.position(), Vec3::new(0.0, 0.0, 3.0 - 2.5));

        camera.translate(MoveDirection::Right, 0.1);
        // forward -Z crossed with up +Y points +X
        assert_vec_close(camera.position(), Vec3::new(2.5, 0.0, 0.5));

        camera.translate(MoveDirection::Left, 0.1);
        camera.translate(MoveDirection::Backward, 0.1);
        assert_vec_close(camera.position(), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn first_person_ignores_zoom() {
        let mut camera = Camera::new(800, 600);
        let before = camera.clone();
        camera.zoom(10.0);
        assert_eq!(camera, before);
    }

    #[test]
    fn orbit_pans_target_on_ground_plane() {
        let mut camera = Camera::with_mode(800, 600, CameraMode::Orbit);
        camera.look(0.0, -300.0);
        let start_y = camera.orbit().target().y;
        camera.translate(MoveDirection::Forward, 0.1);
        camera.translate(MoveDirection::Right, 0.1);
        let target = camera.orbit().target();
        assert!((target.y - start_y).abs() < 1e-6);
        assert!(target.length() > 0.0);
    }

    #[test]
    fn orbit_forward_pan_moves_toward_view() {
        let mut camera = Camera::with_mode(800, 600, CameraMode::Orbit);
        camera.translate(MoveDirection::Forward, 0.1);
        assert_vec_close(camera.orbit().target(), Vec3::new(0.0, 0.0, -2.5));
        assert_vec_close(camera.position(), Vec3::new(0.0, 0.0, 0.5));
    }

    #[test]
    fn orbit_zoom_is_clamped() {
        let mut camera = Camera::with_mode(800, 600, CameraMode::Orbit);
        camera.zoom(1.0);
        assert!((camera.orbit().distance() - (3.0 - ZOOM_SPEED)).abs() < 1e-6);
        camera.zoom(-1.0e6);
        assert_eq!(camera.orbit().distance(), ZOOM_LIMIT);
        camera.zoom(1.0e6);
        assert_eq!(camera.orbit().distance(), -ZOOM_LIMIT);
    }

    #[test]
    fn orbit_view_is_finite_at_zero_distance() {
        let mut camera = Camera::with_mode(800, 600, CameraMode::Orbit);
        camera.look_at(Vec3::new(1.0, 2.0, 3.0), 0.0);
        assert!(camera.view_matrix().is_finite());
        camera.translate(MoveDirection::Forward, 0.1);
        assert!(camera.orbit().target().is_finite());
    }

    #[test]
    fn look_at_places_both_rigs() {
        let mut camera = Camera::new(800, 600);
        camera.look_at(Vec3::new(1.0, 0.0, 0.0), 4.0);
        assert_vec_close(camera.position(), Vec3::new(5.0, 0.0, 0.0));
        assert_vec_close(camera.first_person().forward(), Vec3::NEG_X);

        camera.set_mode(CameraMode::Orbit);
        assert_eq!(camera.orbit().target(), Vec3::new(1.0, 0.0, 0.0));
        assert!((camera.position().distance(Vec3::X) - 4.0).abs() < 1e-4);
    }

    #[test]
    fn projection_uses_screen_aspect() {
        let mut camera = Camera::new(1600, 800);
        assert!((camera.aspect_ratio() - 2.0).abs() < 1e-6);
        let projection = camera.projection();
        assert!(projection.is_finite());
        assert!((projection.y_axis.y / projection.x_axis.x - 2.0).abs() < 1e-4);

        camera.resize(0, 0);
        assert!(camera.projection().is_finite());
    }

    #[test]
    fn origin_is_in_front_of_default_cameras() {
        for mode in [CameraMode::FirstPerson, CameraMode::Orbit] {
            let camera = Camera::with_mode(800, 600, mode);
            let clip = camera.projection() * camera.view_matrix() * glam::Vec4::W;
            let ndc = clip.truncate() / clip.w;
            assert!(clip.w > 0.0);
            assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
            assert!((0.0..=1.0).contains(&ndc.z));
        }
    }
}

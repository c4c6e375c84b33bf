mod camera;
mod frame;
mod icosahedron;
mod input;
mod math;
mod mesh;
mod settings;
mod subdivide;

pub use camera::{
    Camera, CameraMode, CameraRig, FirstPersonRig, MoveDirection, OrbitRig, Orientation,
    DEFAULT_FOV_DEGREES, FAR_PLANE, LOOK_SENSITIVITY, MOVE_SPEED, NEAR_PLANE,
    PITCH_LIMIT_DEGREES, WORLD_UP, ZOOM_LIMIT, ZOOM_SPEED,
};
pub use frame::{
    interpolation_at, model_matrix, FrameDriver, FrameStats, FrameStatus, Renderer,
    TransformSlot, MAX_SUBDIVISION_DEPTH, MORPH_RATE, SUBDIVISION_DEPTH,
};
pub use icosahedron::{build_icosahedron, Icosahedron, FLAT_LEN, TRIANGLE_STRIDE};
pub use input::{EventQueue, InputEvent, InputSource};
pub use math::{face_normal, normalize, normalized_cross, ZERO_LENGTH_FALLBACK};
pub use mesh::{Aabb, MeshBuffer, FLOATS_PER_TRIANGLE, FLOATS_PER_VERTEX};
pub use settings::{
    CameraSettings, DisplaySettings, PanelSettings, ShadingMode, ViewerSettings,
    SETTINGS_VERSION,
};
pub use subdivide::{
    buffer_len, leaf_triangle_count, subdivide_icosahedron, subdivide_triangle,
    INTERPOLATION_EPSILON,
};

use serde::{Deserialize, Serialize};

use crate::camera::{CameraMode, DEFAULT_FOV_DEGREES};

pub const SETTINGS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub version: u32,
    pub panels: PanelSettings,
    pub display: DisplaySettings,
    pub camera: CameraSettings,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            panels: PanelSettings::default(),
            display: DisplaySettings::default(),
            camera: CameraSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub show_debug: bool,
    pub show_console: bool,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            show_debug: true,
            show_console: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShadingMode {
    Lit,
    Normals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub shading_mode: ShadingMode,
    /// Draws every leaf triangle's edges over the shaded surface.
    pub wireframe: bool,
    pub show_stats: bool,
    pub object_color: [f32; 3],
    pub light_color: [f32; 3],
    pub background: [f32; 3],
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            shading_mode: ShadingMode::Lit,
            wireframe: true,
            show_stats: true,
            object_color: [1.0, 0.5, 0.31],
            light_color: [1.0, 0.5, 0.31],
            background: [0.1, 0.1, 0.12],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub initial_mode: CameraMode,
    pub fov_degrees: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            initial_mode: CameraMode::FirstPerson,
            fov_degrees: DEFAULT_FOV_DEGREES,
        }
    }
}

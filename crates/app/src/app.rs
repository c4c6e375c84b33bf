use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use eframe::egui;
use icosphere_core::{
    Camera, CameraMode, FrameDriver, FrameStatus, InputEvent, InputSource, ShadingMode,
    ViewerSettings,
};
use render::{ViewportDisplay, ViewportRenderer, ViewportShadingMode};
use rfd::FileDialog;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

mod input;

use input::EguiInput;

const MAX_LOG_LINES: usize = 500;
const DEFAULT_SETTINGS_PATH: &str = "settings/icosphere.json";
/// Longest frame step fed to the camera, so a stalled frame does not teleport it.
const MAX_FRAME_DELTA: f32 = 0.1;

#[derive(Clone)]
pub(crate) struct ConsoleBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl ConsoleBuffer {
    fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    fn push_line(&self, line: String) {
        let Ok(mut lines) = self.lines.lock() else {
            return;
        };
        lines.push_back(line);
        while lines.len() > MAX_LOG_LINES {
            lines.pop_front();
        }
    }

    fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }
}

struct ConsoleMakeWriter {
    buffer: ConsoleBuffer,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            buffer: self.buffer.clone(),
        }
    }
}

struct ConsoleWriter {
    buffer: ConsoleBuffer,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        for line in text.lines() {
            self.buffer.push_line(line.to_string());
        }

        let _ = io::stdout().write_all(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stdout().flush();
        Ok(())
    }
}

/// Animation time that can be frozen without stopping camera input.
#[derive(Debug, Clone, Copy, Default)]
struct AnimationClock {
    time: f32,
    paused: bool,
}

impl AnimationClock {
    fn advance(&mut self, delta_time: f32) -> f32 {
        if !self.paused {
            self.time += delta_time;
        }
        self.time
    }
}

pub(crate) struct IcosphereApp {
    settings: ViewerSettings,
    settings_path: Option<PathBuf>,
    console: ConsoleBuffer,
    log_level: LevelFilter,
    log_level_state: Arc<AtomicU8>,
    viewport_renderer: Option<ViewportRenderer>,
    driver: FrameDriver,
    input: EguiInput,
    clock: AnimationClock,
}

impl IcosphereApp {
    pub(crate) fn new(console: ConsoleBuffer, log_level_state: Arc<AtomicU8>) -> Self {
        let settings = ViewerSettings::default();
        Self {
            driver: FrameDriver::new(camera_from_settings(&settings)),
            settings,
            settings_path: None,
            console,
            log_level: LevelFilter::INFO,
            log_level_state,
            viewport_renderer: None,
            input: EguiInput::default(),
            clock: AnimationClock::default(),
        }
    }

    fn reset_settings(&mut self) {
        self.settings = ViewerSettings::default();
        self.settings_path = None;
        self.apply_camera_settings();
        tracing::info!("settings reset to defaults");
    }

    fn save_settings_to(&self, path: &Path) -> io::Result<()> {
        let data = serde_json::to_vec_pretty(&self.settings).map_err(io::Error::other)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)?;
        Ok(())
    }

    fn load_settings_from(&mut self, path: &Path) -> io::Result<()> {
        let data = std::fs::read(path)?;
        let settings: ViewerSettings = serde_json::from_slice(&data)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.settings = settings;
        self.settings_path = Some(path.to_path_buf());
        self.apply_camera_settings();
        Ok(())
    }

    fn apply_camera_settings(&mut self) {
        let camera = self.driver.camera_mut();
        camera.set_mode(self.settings.camera.initial_mode);
        camera.set_fov_degrees(self.settings.camera.fov_degrees);
    }

    fn set_log_level(&mut self, new_level: LevelFilter) {
        if new_level == self.log_level {
            return;
        }

        self.log_level_state
            .store(level_filter_to_u8(new_level), Ordering::Relaxed);
        self.log_level = new_level;
    }

    pub(crate) fn try_load_default_settings(&mut self) {
        let path = Path::new(DEFAULT_SETTINGS_PATH);
        if !path.exists() {
            return;
        }

        match self.load_settings_from(path) {
            Ok(()) => {
                tracing::info!("default settings loaded");
            }
            Err(err) => {
                tracing::error!("failed to load default settings: {}", err);
            }
        }
    }

    fn viewport_display(&self) -> ViewportDisplay {
        let display = &self.settings.display;
        ViewportDisplay {
            shading_mode: match display.shading_mode {
                ShadingMode::Lit => ViewportShadingMode::Lit,
                ShadingMode::Normals => ViewportShadingMode::Normals,
            },
            wireframe: display.wireframe,
            object_color: display.object_color,
            light_color: display.light_color,
            background: display.background,
            ..ViewportDisplay::default()
        }
    }
}

fn camera_delta(frame_dt: f32) -> f32 {
    frame_dt.min(MAX_FRAME_DELTA)
}

/// Drops input gathered while there is nothing to drive, keeping only a quit.
fn discard_pending_input(input: &mut impl InputSource) -> FrameStatus {
    if input.poll_events().contains(&InputEvent::Quit) {
        FrameStatus::Quit
    } else {
        FrameStatus::Continue
    }
}

fn camera_from_settings(settings: &ViewerSettings) -> Camera {
    let mut camera = Camera::with_mode(1, 1, settings.camera.initial_mode);
    camera.set_fov_degrees(settings.camera.fov_degrees);
    camera
}

impl eframe::App for IcosphereApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.sync_wgpu_renderer(frame);
        let frame_dt = ctx.input(|i| i.stable_dt);
        let time = self.clock.advance(frame_dt);
        let delta_time = camera_delta(frame_dt);
        self.input.collect_keyboard(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                self.file_menu(ui);

                ui.separator();
                ui.label("icosphere");
                ui.separator();
                ui.checkbox(&mut self.settings.panels.show_debug, "Debug");
                ui.checkbox(&mut self.settings.panels.show_console, "Console");
                ui.separator();
                ui.checkbox(&mut self.clock.paused, "Pause");
                ui.label(format!("Camera: {}", self.driver.camera().mode().label()));
            });
        });

        if self.settings.panels.show_debug || self.settings.panels.show_console {
            egui::SidePanel::right("side_panels")
                .resizable(true)
                .default_width(280.0)
                .show(ctx, |ui| {
                    if self.settings.panels.show_debug {
                        egui::CollapsingHeader::new("Debug")
                            .default_open(true)
                            .show(ui, |ui| self.debug_panel(ui));
                    }

                    if self.settings.panels.show_console {
                        egui::CollapsingHeader::new("Console")
                            .default_open(true)
                            .show(ui, |ui| {
                                egui::ScrollArea::vertical()
                                    .stick_to_bottom(true)
                                    .show(ui, |ui| {
                                        for line in self.console.snapshot() {
                                            ui.label(line);
                                        }
                                    });
                            });
                    }
                });
        }

        let mut status = FrameStatus::Continue;
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let (rect, response) = ui.allocate_exact_size(available, egui::Sense::click_and_drag());
            self.input.collect_viewport(&response);

            let pixels_per_point = ctx.pixels_per_point();
            self.driver.camera_mut().resize(
                (rect.width() * pixels_per_point).round().max(1.0) as u32,
                (rect.height() * pixels_per_point).round().max(1.0) as u32,
            );

            let display = self.viewport_display();
            let Some(renderer) = self.viewport_renderer.as_mut() else {
                ui.painter()
                    .rect_filled(rect, 0.0, egui::Color32::from_rgb(28, 28, 28));
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "WGPU not ready",
                    egui::FontId::proportional(14.0),
                    egui::Color32::GRAY,
                );
                status = discard_pending_input(&mut self.input);
                return;
            };

            status = self.driver.run_frame(time, delta_time, &mut self.input, renderer);
            let callback = renderer.paint_callback(rect, display);
            ui.painter().add(egui::Shape::Callback(callback));

            if self.settings.display.show_stats {
                self.stats_overlay(ui, rect);
            }
        });

        if status == FrameStatus::Quit {
            tracing::info!("closing viewer");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        ctx.request_repaint();
    }
}

impl IcosphereApp {
    fn file_menu(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("File", |ui| {
            if ui.button("Reset settings").clicked() {
                self.reset_settings();
                ui.close();
            }

            if ui.button("Open settings...").clicked() {
                if let Some(path) = FileDialog::new()
                    .add_filter("Viewer settings", &["json"])
                    .pick_file()
                {
                    match self.load_settings_from(&path) {
                        Ok(()) => {
                            tracing::info!("settings loaded from {:?}", path);
                        }
                        Err(err) => {
                            tracing::error!("failed to load settings: {}", err);
                        }
                    }
                }
                ui.close();
            }

            if ui.button("Save settings").clicked() {
                let path = self
                    .settings_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
                match self.save_settings_to(&path) {
                    Ok(()) => {
                        tracing::info!("settings saved to {:?}", path);
                        self.settings_path = Some(path);
                    }
                    Err(err) => {
                        tracing::error!("failed to save settings: {}", err);
                    }
                }
                ui.close();
            }

            if ui.button("Save settings as...").clicked() {
                if let Some(path) = FileDialog::new()
                    .add_filter("Viewer settings", &["json"])
                    .set_file_name("icosphere.json")
                    .save_file()
                {
                    match self.save_settings_to(&path) {
                        Ok(()) => {
                            tracing::info!("settings saved to {:?}", path);
                            self.settings_path = Some(path);
                        }
                        Err(err) => {
                            tracing::error!("failed to save settings: {}", err);
                        }
                    }
                }
                ui.close();
            }

            ui.separator();
            if ui.button("Quit").clicked() {
                self.input.push(InputEvent::Quit);
                ui.close();
            }
        });
    }

    fn debug_panel(&mut self, ui: &mut egui::Ui) {
        ui.label("Camera");
        let current = self.driver.camera().mode();
        ui.horizontal(|ui| {
            for mode in [CameraMode::FirstPerson, CameraMode::Orbit] {
                if ui.selectable_label(current == mode, mode.label()).clicked() {
                    self.input.push(InputEvent::SetCameraMode { mode });
                }
            }
        });
        let mut fov = self.driver.camera().fov_degrees();
        if ui
            .add(egui::Slider::new(&mut fov, 20.0..=120.0).text("FOV"))
            .changed()
        {
            self.driver.camera_mut().set_fov_degrees(fov);
            self.settings.camera.fov_degrees = fov;
        }
        egui::ComboBox::from_label("Start mode")
            .selected_text(self.settings.camera.initial_mode.label())
            .show_ui(ui, |ui| {
                for mode in [CameraMode::FirstPerson, CameraMode::Orbit] {
                    ui.selectable_value(&mut self.settings.camera.initial_mode, mode, mode.label());
                }
            });
        if ui.button("Reset view").clicked() {
            let mode = self.driver.camera().mode();
            let mut camera = camera_from_settings(&self.settings);
            camera.set_mode(mode);
            *self.driver.camera_mut() = camera;
        }

        ui.separator();
        ui.label("Display");
        ui.checkbox(&mut self.settings.display.wireframe, "Wireframe");
        ui.checkbox(&mut self.settings.display.show_stats, "Stats overlay");
        let shading = &mut self.settings.display.shading_mode;
        egui::ComboBox::from_label("Shading")
            .selected_text(match shading {
                ShadingMode::Lit => "Lit",
                ShadingMode::Normals => "Normals",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(shading, ShadingMode::Lit, "Lit");
                ui.selectable_value(shading, ShadingMode::Normals, "Normals");
            });
        ui.horizontal(|ui| {
            ui.color_edit_button_rgb(&mut self.settings.display.object_color);
            ui.label("Object");
            ui.color_edit_button_rgb(&mut self.settings.display.light_color);
            ui.label("Light");
            ui.color_edit_button_rgb(&mut self.settings.display.background);
            ui.label("Background");
        });

        ui.separator();
        ui.label("Animation");
        ui.add(
            egui::DragValue::new(&mut self.clock.time)
                .speed(0.05)
                .prefix("t = ")
                .suffix(" s"),
        );
        if let Some(stats) = self.driver.last_frame() {
            ui.label(format!(
                "Interpolation: {:.3}\nRegenerated in {:.2} ms",
                stats.interpolation, stats.generation_ms
            ));
        }

        ui.separator();
        egui::ComboBox::from_label("Log level")
            .selected_text(format!("{:?}", self.log_level))
            .show_ui(ui, |ui| {
                for level in [
                    LevelFilter::ERROR,
                    LevelFilter::WARN,
                    LevelFilter::INFO,
                    LevelFilter::DEBUG,
                    LevelFilter::TRACE,
                ] {
                    if ui
                        .selectable_label(self.log_level == level, format!("{:?}", level))
                        .clicked()
                    {
                        self.set_log_level(level);
                    }
                }
            });
    }

    fn stats_overlay(&self, ui: &egui::Ui, rect: egui::Rect) {
        let Some(renderer) = &self.viewport_renderer else {
            return;
        };
        let stats = renderer.stats_snapshot();
        let camera = self.driver.camera();
        let position = camera.position();
        let mut text = format!(
            "FPS: {:.1}\nFrame: {:.2} ms\nVerts: {}\nTris: {}\nBuffer: {} KiB ({} grows, {} uploads)\nCamera: {} ({:.2}, {:.2}, {:.2})",
            stats.fps,
            stats.frame_time_ms,
            stats.vertex_count,
            stats.triangle_count,
            stats.buffer_bytes / 1024,
            stats.buffer_reallocations,
            stats.uploads,
            camera.mode().label(),
            position.x,
            position.y,
            position.z,
        );
        if let Some(frame) = self.driver.last_frame() {
            text.push_str(&format!("\nMorph: {:.3}", frame.interpolation));
        }
        if self.clock.paused {
            text.push_str("\nPaused");
        }

        let font_id = egui::FontId::monospace(12.0);
        let galley = ui.fonts_mut(|f| f.layout_no_wrap(text, font_id, egui::Color32::WHITE));
        let padding = egui::vec2(6.0, 4.0);
        let bg_rect = egui::Rect::from_min_size(
            rect.min + egui::vec2(8.0, 8.0),
            galley.size() + padding * 2.0,
        );
        let painter = ui.painter();
        painter.rect_filled(bg_rect, 4.0, egui::Color32::from_black_alpha(160));
        painter.galley(bg_rect.min + padding, galley, egui::Color32::WHITE);
    }

    fn sync_wgpu_renderer(&mut self, frame: &eframe::Frame) {
        if self.viewport_renderer.is_some() {
            return;
        }
        let Some(render_state) = frame.wgpu_render_state() else {
            return;
        };
        tracing::info!("wgpu viewport ready ({:?})", render_state.target_format);
        self.viewport_renderer = Some(ViewportRenderer::new(render_state.target_format));
    }
}

pub(crate) fn setup_tracing() -> (ConsoleBuffer, Arc<AtomicU8>) {
    let console = ConsoleBuffer::new();
    let log_level_state = Arc::new(AtomicU8::new(level_filter_to_u8(LevelFilter::INFO)));
    let filter_state = log_level_state.clone();
    let filter_layer = tracing_subscriber::filter::filter_fn(move |metadata| {
        metadata.level() <= &level_from_u8(filter_state.load(Ordering::Relaxed))
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(ConsoleMakeWriter {
            buffer: console.clone(),
        });

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter_layer))
        .init();

    (console, log_level_state)
}

fn level_filter_to_u8(level: LevelFilter) -> u8 {
    match level {
        LevelFilter::OFF => 0,
        LevelFilter::ERROR => 1,
        LevelFilter::WARN => 2,
        LevelFilter::INFO => 3,
        LevelFilter::DEBUG => 4,
        LevelFilter::TRACE => 5,
    }
}

fn level_from_u8(value: u8) -> Level {
    match value {
        0 | 1 => Level::ERROR,
        2 => Level::WARN,
        3 => Level::INFO,
        4 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

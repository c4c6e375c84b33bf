use std::path::{Path, PathBuf};

use glam::Mat4;
use icosphere_core::{
    interpolation_at, Aabb, Camera, EventQueue, FrameDriver, FrameStatus, MeshBuffer, Renderer,
    TransformSlot, FLOATS_PER_VERTEX, MAX_SUBDIVISION_DEPTH, SUBDIVISION_DEPTH,
};
use serde::Serialize;

#[derive(Debug, PartialEq)]
struct HeadlessArgs {
    depth: u32,
    interpolation: Option<f32>,
    time: f32,
    save_path: Option<PathBuf>,
    print: bool,
    help: bool,
}

impl Default for HeadlessArgs {
    fn default() -> Self {
        Self {
            depth: SUBDIVISION_DEPTH,
            interpolation: None,
            time: 0.0,
            save_path: None,
            print: false,
            help: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct MeshSummary {
    depth: u32,
    time: f32,
    interpolation: f32,
    triangle_count: usize,
    vertex_count: usize,
    bounds: Option<Aabb>,
    model: [[f32; 4]; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    vertices: Option<Vec<f32>>,
}

/// Renderer that keeps the last submitted frame in memory.
#[derive(Default)]
struct CaptureRenderer {
    vertices: Vec<f32>,
    model: Mat4,
    draw_count: u32,
}

impl Renderer for CaptureRenderer {
    fn replace_vertices(&mut self, vertices: &[f32]) {
        self.vertices = vertices.to_vec();
    }

    fn set_transform(&mut self, slot: TransformSlot, matrix: Mat4) {
        if slot == TransformSlot::Model {
            self.model = matrix;
        }
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        self.draw_count = vertex_count;
    }
}

pub(crate) fn maybe_run_headless(args: &[String]) -> Result<bool, String> {
    if !args.iter().any(|arg| arg == "--headless") {
        return Ok(false);
    }

    let parsed = parse_headless_args(args)?;
    if parsed.help {
        print_headless_help();
        return Ok(true);
    }

    let summary = run_pipeline(&parsed)?;
    tracing::info!(
        "headless: depth {} at interpolation {:.4}: {} triangles, {} vertices",
        summary.depth,
        summary.interpolation,
        summary.triangle_count,
        summary.vertex_count
    );

    if let Some(path) = &parsed.save_path {
        save_summary_json(&summary, path)?;
        tracing::info!("headless: saved mesh to {:?}", path);
    }

    if parsed.print {
        let printable = MeshSummary {
            vertices: None,
            ..summary
        };
        let json = serde_json::to_string_pretty(&printable).map_err(|err| err.to_string())?;
        println!("{json}");
    }

    tracing::info!("headless: completed");
    Ok(true)
}

fn parse_headless_args(args: &[String]) -> Result<HeadlessArgs, String> {
    let mut parsed = HeadlessArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--headless" => {}
            "--depth" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--depth requires a value".to_string())?;
                let depth: u32 = value
                    .parse()
                    .map_err(|_| format!("invalid depth {value:?}"))?;
                if depth > MAX_SUBDIVISION_DEPTH {
                    return Err(format!("depth {depth} exceeds maximum {MAX_SUBDIVISION_DEPTH}"));
                }
                parsed.depth = depth;
            }
            "--interpolation" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--interpolation requires a value".to_string())?;
                let t: f32 = value
                    .parse()
                    .map_err(|_| format!("invalid interpolation {value:?}"))?;
                if !t.is_finite() {
                    return Err(format!("invalid interpolation {value:?}"));
                }
                parsed.interpolation = Some(t);
            }
            "--time" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--time requires seconds".to_string())?;
                let time: f32 = value
                    .parse()
                    .map_err(|_| format!("invalid time {value:?}"))?;
                if !time.is_finite() {
                    return Err(format!("invalid time {value:?}"));
                }
                parsed.time = time;
            }
            "--save" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--save requires a path".to_string())?;
                parsed.save_path = Some(PathBuf::from(value));
            }
            "--print" => {
                parsed.print = true;
            }
            "--help" => {
                parsed.help = true;
            }
            _ => {}
        }
    }

    Ok(parsed)
}

fn print_headless_help() {
    println!(
        "Headless mode options:\n  --headless\n  --depth <n>            subdivision depth (default {SUBDIVISION_DEPTH}, max {MAX_SUBDIVISION_DEPTH})\n  --interpolation <t>    fixed interpolation factor\n  --time <seconds>       animation time (ignored with --interpolation)\n  --save <path>          write summary and vertex data as JSON\n  --print                print the summary"
    );
}

fn run_pipeline(args: &HeadlessArgs) -> Result<MeshSummary, String> {
    let mut driver = FrameDriver::new(Camera::new(1280, 720)).with_depth(args.depth);

    let (mesh, interpolation, model) = match args.interpolation {
        Some(t) => (
            driver.generate(t),
            t,
            icosphere_core::model_matrix(args.time, driver.translation()),
        ),
        None => {
            let mut capture = CaptureRenderer::default();
            let status = driver.run_frame(args.time, 0.0, &mut EventQueue::new(), &mut capture);
            if status != FrameStatus::Continue {
                return Err("frame driver stopped before drawing".to_string());
            }
            if capture.draw_count as usize * FLOATS_PER_VERTEX != capture.vertices.len() {
                return Err(format!(
                    "draw count {} does not match {} uploaded scalars",
                    capture.draw_count,
                    capture.vertices.len()
                ));
            }
            (
                MeshBuffer::from(capture.vertices),
                interpolation_at(args.time),
                capture.model,
            )
        }
    };

    let keep_vertices = args.save_path.is_some();
    Ok(MeshSummary {
        depth: args.depth,
        time: args.time,
        interpolation,
        triangle_count: mesh.triangle_count(),
        vertex_count: mesh.vertex_count(),
        bounds: mesh.bounds(),
        model: model.to_cols_array_2d(),
        vertices: keep_vertices.then(|| mesh.into_vec()),
    })
}

fn save_summary_json(summary: &MeshSummary, path: &Path) -> Result<(), String> {
    let data = serde_json::to_vec_pretty(summary).map_err(|err| err.to_string())?;
    std::fs::write(path, data).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn not_headless_without_flag() {
        assert_eq!(maybe_run_headless(&args(&["icosphere"])), Ok(false));
    }

    #[test]
    fn parses_all_options() {
        let parsed = parse_headless_args(&args(&[
            "icosphere",
            "--headless",
            "--depth",
            "2",
            "--interpolation",
            "0.5",
            "--time",
            "3",
            "--save",
            "out.json",
            "--print",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            HeadlessArgs {
                depth: 2,
                interpolation: Some(0.5),
                time: 3.0,
                save_path: Some(PathBuf::from("out.json")),
                print: true,
                help: false,
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_headless_args(&args(&["--headless", "--depth"])).is_err());
        assert!(parse_headless_args(&args(&["--headless", "--depth", "x"])).is_err());
        assert!(parse_headless_args(&args(&["--headless", "--depth", "9"])).is_err());
        assert!(parse_headless_args(&args(&["--headless", "--interpolation", "NaN"])).is_err());
        assert!(parse_headless_args(&args(&["--headless", "--time", "soon"])).is_err());
    }

    #[test]
    fn pipeline_through_frame_driver() {
        let summary = run_pipeline(&HeadlessArgs {
            time: 1.0,
            ..HeadlessArgs::default()
        })
        .expect("pipeline");
        assert_eq!(summary.triangle_count, 1280);
        assert_eq!(summary.vertex_count, 3840);
        assert!((summary.interpolation - interpolation_at(1.0)).abs() < 1e-6);
        assert!(summary.vertices.is_none());
    }

    #[test]
    fn full_interpolation_has_unit_bounds() {
        let summary = run_pipeline(&HeadlessArgs {
            depth: 2,
            interpolation: Some(1.0),
            save_path: Some(PathBuf::from("unused.json")),
            ..HeadlessArgs::default()
        })
        .expect("pipeline");
        assert_eq!(summary.triangle_count, 320);
        let bounds = summary.bounds.expect("bounds");
        for axis in 0..3 {
            assert!(bounds.max[axis] <= 1.0 + 1e-5);
            assert!(bounds.min[axis] >= -1.0 - 1e-5);
        }
        let vertices = summary.vertices.expect("vertices kept for saving");
        assert_eq!(vertices.len(), 320 * 18);
    }
}

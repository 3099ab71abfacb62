//! meander-bench: CLI for curve parameter experimentation and diagnostics.
//!
//! Runs the space-filling curve builder on one or more image files with
//! configurable parameters, printing per-run timing and path-quality
//! diagnostics. Useful for:
//!
//! - Tuning `alpha` and `block` against real imagery
//! - Comparing alignment strategies on frame sequences
//! - Measuring core vs dispatch time
//! - Writing visit-order heatmaps to inspect curve shape
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin meander-bench -- [OPTIONS] <IMAGE_PATH>...
//! ```
//!
//! A single image runs the single-frame entry point; several images are
//! treated as an ordered frame sequence and aligned per `--align`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use meander::{AlignStrategy, BuildMetrics, Coord, CurveConfig, CurvePath};

/// Curve parameter experimentation and diagnostics for meander.
#[derive(Parser)]
#[command(name = "meander-bench", version)]
struct Cli {
    /// Input image paths (PNG, JPEG, BMP, WebP). Several paths form an
    /// ordered frame sequence.
    #[arg(required = true)]
    image_paths: Vec<PathBuf>,

    /// Weight between pixel similarity (0.0) and block centering (1.0).
    #[arg(long, default_value_t = 0.03)]
    alpha: f64,

    /// Block side length for the centering pull.
    #[arg(long, default_value_t = 10)]
    block: u32,

    /// Alignment strategy for frame sequences.
    #[arg(long, value_enum, default_value_t = Align::None)]
    align: Align,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Output the report as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Write a grayscale visit-order heatmap per frame into this directory.
    #[arg(long)]
    heatmap_dir: Option<PathBuf>,
}

/// Alignment strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Align {
    /// Leave frame paths as produced.
    None,
    /// Brute-force L1 rotation matching.
    L1,
    /// FFT circular cross-correlation.
    L2,
}

impl From<Align> for AlignStrategy {
    fn from(value: Align) -> Self {
        match value {
            Align::None => Self::None,
            Align::L1 => Self::L1Norm,
            Align::L2 => Self::L2Norm,
        }
    }
}

/// Per-frame entry of the report.
#[derive(Serialize)]
struct FrameReport {
    path: String,
    rows: usize,
    cols: usize,
    path_len: usize,
    /// Summed per-step luminance difference along the curve.
    curve_cost: f64,
    /// Summed per-step luminance difference along a row-major raster scan.
    raster_cost: f64,
}

/// Full run report.
#[derive(Serialize)]
struct Report {
    config: CurveConfig,
    runs: usize,
    core_ms_mean: f64,
    total_ms_mean: f64,
    frames: Vec<FrameReport>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.runs == 0 {
        eprintln!("Error: --runs must be at least 1");
        return ExitCode::FAILURE;
    }

    let config = CurveConfig {
        alpha: cli.alpha,
        block: cli.block,
        align: cli.align.into(),
    };

    let mut images = Vec::with_capacity(cli.image_paths.len());
    for path in &cli.image_paths {
        match image::open(path) {
            Ok(img) => images.push(img),
            Err(err) => {
                eprintln!("Error: failed to open {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }
    log::info!("loaded {} frame(s)", images.len());

    let mut core_ms = 0.0;
    let mut total_ms = 0.0;
    let mut paths: Vec<CurvePath> = Vec::new();
    for _ in 0..cli.runs {
        let (run_paths, metrics) = match run_once(&images, &config) {
            Ok(result) => result,
            Err(err) => {
                eprintln!("Error: {err}");
                return ExitCode::FAILURE;
            }
        };
        core_ms += ms(metrics.core);
        total_ms += ms(metrics.total);
        paths = run_paths;
    }

    let frames = cli
        .image_paths
        .iter()
        .zip(&images)
        .zip(&paths)
        .map(|((path, img), curve)| frame_report(path, img, curve))
        .collect();
    let report = Report {
        config,
        runs: cli.runs,
        core_ms_mean: core_ms / cli.runs as f64,
        total_ms_mean: total_ms / cli.runs as f64,
        frames,
    };

    if let Some(dir) = &cli.heatmap_dir {
        if let Err(err) = write_heatmaps(dir, &cli.image_paths, &images, &paths) {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("Error: failed to serialize report: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&report);
    }
    ExitCode::SUCCESS
}

/// One timed invocation over the whole input set.
fn run_once(
    images: &[image::DynamicImage],
    config: &CurveConfig,
) -> Result<(Vec<CurvePath>, BuildMetrics), meander::CurveError> {
    if images.len() == 1 {
        let (path, metrics) = meander::build_path_dynamic_with_metrics(&images[0], config)?;
        Ok((vec![path], metrics))
    } else {
        meander::build_paths_dynamic_with_metrics(images, config)
    }
}

fn ms(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Summed per-step luminance L1 difference along an ordering.
fn ordering_cost(luma: &image::ImageBuffer<image::Luma<f32>, Vec<f32>>, order: &[Coord]) -> f64 {
    order
        .windows(2)
        .map(|w| {
            let a = luma.get_pixel(w[0].c as u32, w[0].r as u32).0[0];
            let b = luma.get_pixel(w[1].c as u32, w[1].r as u32).0[0];
            f64::from((a - b).abs())
        })
        .sum()
}

fn frame_report(path: &Path, img: &image::DynamicImage, curve: &CurvePath) -> FrameReport {
    let luma = img.to_luma32f();
    let rows = img.height() as usize;
    let cols = img.width() as usize;
    let raster: Vec<Coord> = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| Coord::new(r, c)))
        .collect();
    FrameReport {
        path: path.display().to_string(),
        rows,
        cols,
        path_len: curve.len(),
        curve_cost: ordering_cost(&luma, curve.coords()),
        raster_cost: ordering_cost(&luma, &raster),
    }
}

/// Write one grayscale heatmap per frame: pixels are shaded by their rank
/// along the curve, early positions dark.
fn write_heatmaps(
    dir: &Path,
    image_paths: &[PathBuf],
    images: &[image::DynamicImage],
    paths: &[CurvePath],
) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|err| format!("cannot create {}: {err}", dir.display()))?;
    for ((source, img), curve) in image_paths.iter().zip(images).zip(paths) {
        let mut heatmap = image::GrayImage::new(img.width(), img.height());
        let denom = curve.len().saturating_sub(1).max(1) as f64;
        for (rank, p) in curve.coords().iter().enumerate() {
            let shade = (rank as f64 / denom * 255.0).round() as u8;
            heatmap.put_pixel(p.c as u32, p.r as u32, image::Luma([shade]));
        }
        let stem = source
            .file_stem()
            .map_or_else(|| "frame".to_owned(), |s| s.to_string_lossy().into_owned());
        let out = dir.join(format!("heatmap_{stem}.png"));
        heatmap
            .save(&out)
            .map_err(|err| format!("cannot write {}: {err}", out.display()))?;
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!(
        "config: alpha={} block={} align={}",
        report.config.alpha, report.config.block, report.config.align
    );
    println!(
        "timing over {} run(s): core {:.2} ms, total {:.2} ms",
        report.runs, report.core_ms_mean, report.total_ms_mean
    );
    for frame in &report.frames {
        let improvement = if frame.raster_cost > 0.0 {
            100.0 * (1.0 - frame.curve_cost / frame.raster_cost)
        } else {
            0.0
        };
        println!(
            "{}: {}x{}, {} pixels, curve cost {:.1} vs raster {:.1} ({improvement:+.1}%)",
            frame.path, frame.rows, frame.cols, frame.path_len, frame.curve_cost, frame.raster_cost
        );
    }
}

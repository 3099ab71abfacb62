//! meander: data-adaptive space-filling curves over pixel grids.
//!
//! Builds a Hamiltonian-like closed curve visiting every pixel of an image
//! exactly once, shaped so that consecutive pixels along the curve are
//! perceptually close. The curve linearizes 2D imagery into 1D signals for
//! heatmaps, timelines and differential encodings.
//!
//! # Construction
//!
//! 1. Every 2x2 pixel block becomes a *super-node* carrying a 4-pixel
//!    cycle; super-nodes form an (R/2) x (C/2) lattice.
//! 2. Prim's algorithm grows a spanning tree over the lattice. Each
//!    absorption surgically rewires the pixel graph — two facing edges
//!    removed, two crossing edges added — fusing the cycles.
//! 3. Edge costs mix the exact pixel-difference delta of the merge with a
//!    block-centering pull, weighted by `alpha`.
//! 4. When the tree spans the lattice, the pixel graph is a single cycle,
//!    walked from pixel (0, 0) into the output path.
//!
//! For frame sequences, an optional alignment pass rotates (and possibly
//! reverses) each frame's curve to best match its predecessor, under L1 or
//! FFT-accelerated L2 scoring.
//!
//! # Example
//!
//! ```
//! use meander::{build_path, CurveConfig, Frame};
//!
//! let frame = Frame::from_fn(4, 4, 1, |r, c, _| (r * 4 + c) as f64);
//! let path = build_path(&frame, &CurveConfig::default()).unwrap();
//! assert_eq!(path.len(), 16);
//! ```

pub mod align;
pub mod cost;
pub mod diagnostics;
pub mod fft;
pub mod frame;
pub mod graph;
pub mod lattice;
pub mod prim;
pub mod types;

use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::cost::DataDrivenCost;
use crate::prim::CurveBuilder;

pub use crate::diagnostics::{BuildMetrics, GraphAudit};
pub use crate::frame::{Channel, DynFrame, Frame};
pub use crate::types::{AlignStrategy, Coord, CurveConfig, CurveError, CurvePath, Dimensions};

/// Check a frame against the grid preconditions: even dimensions, at least
/// 2x2.
fn validate_shape<T: Channel>(frame: &Frame<T>) -> Result<(), CurveError> {
    let (rows, cols) = (frame.rows(), frame.cols());
    if rows < 2 || cols < 2 {
        return Err(CurveError::InvalidShape(format!(
            "grid must be at least 2x2, got {rows}x{cols}"
        )));
    }
    if rows % 2 != 0 || cols % 2 != 0 {
        return Err(CurveError::InvalidShape(format!(
            "grid dimensions must be even, got {rows}x{cols}"
        )));
    }
    Ok(())
}

/// Build the curve for a single frame.
///
/// The returned path is a permutation of the full grid; consecutive
/// entries (and the last/first pair) differ by exactly one lattice step.
///
/// # Errors
///
/// [`CurveError::InvalidParameter`] for out-of-range configuration,
/// [`CurveError::InvalidShape`] for odd or too-small grids, and
/// [`CurveError::InvariantViolation`] if the construction audit fails.
pub fn build_path<T: Channel>(
    frame: &Frame<T>,
    config: &CurveConfig,
) -> Result<CurvePath, CurveError> {
    build_path_with_metrics(frame, config).map(|(path, _)| path)
}

/// [`build_path`] plus wall-clock metrics for the core and the whole
/// dispatch.
///
/// # Errors
///
/// Same as [`build_path`].
pub fn build_path_with_metrics<T: Channel>(
    frame: &Frame<T>,
    config: &CurveConfig,
) -> Result<(CurvePath, BuildMetrics), CurveError> {
    let dispatch_start = Instant::now();
    config.validate()?;
    validate_shape(frame)?;

    let core_start = Instant::now();
    let cost = DataDrivenCost::new(frame, config.alpha, config.block);
    let (path, _audit) = CurveBuilder::new(frame.rows(), frame.cols()).run(&cost)?;
    let end = Instant::now();

    Ok((
        path,
        BuildMetrics {
            core: end - core_start,
            total: end - dispatch_start,
        },
    ))
}

/// Build one curve per frame, then align each to its predecessor.
///
/// All frames must share dimensions and channel count. Per-frame
/// construction runs in parallel (frames are independent); alignment is
/// sequential because frame `i` aligns against the already-aligned frame
/// `i - 1`.
///
/// # Errors
///
/// Same as [`build_path`], plus [`CurveError::InvalidShape`] for an empty
/// sequence or mismatched frames.
pub fn build_paths<T: Channel>(
    frames: &[Frame<T>],
    config: &CurveConfig,
) -> Result<Vec<CurvePath>, CurveError> {
    build_paths_with_metrics(frames, config).map(|(paths, _)| paths)
}

/// [`build_paths`] plus wall-clock metrics covering all frames.
///
/// # Errors
///
/// Same as [`build_paths`].
pub fn build_paths_with_metrics<T: Channel>(
    frames: &[Frame<T>],
    config: &CurveConfig,
) -> Result<(Vec<CurvePath>, BuildMetrics), CurveError> {
    let dispatch_start = Instant::now();
    config.validate()?;
    let Some(first) = frames.first() else {
        return Err(CurveError::InvalidShape(
            "frame sequence is empty".to_owned(),
        ));
    };
    validate_shape(first)?;
    for (index, frame) in frames.iter().enumerate().skip(1) {
        if frame.dimensions() != first.dimensions() || frame.channels() != first.channels() {
            return Err(CurveError::InvalidShape(format!(
                "frame {index} is {}x{} ({} channels), expected {} ({} channels)",
                frame.rows(),
                frame.cols(),
                frame.channels(),
                first.dimensions(),
                first.channels()
            )));
        }
    }

    let core_start = Instant::now();
    let mut paths: Vec<CurvePath> = frames
        .par_iter()
        .map(|frame| {
            let cost = DataDrivenCost::new(frame, config.alpha, config.block);
            CurveBuilder::new(frame.rows(), frame.cols())
                .run(&cost)
                .map(|(path, _)| path)
        })
        .collect::<Result<_, _>>()?;

    align::align_frames(frames, &mut paths, config.align);
    let end = Instant::now();
    debug!(
        "built {} aligned frame paths ({})",
        paths.len(),
        config.align
    );

    Ok((
        paths,
        BuildMetrics {
            core: end - core_start,
            total: end - dispatch_start,
        },
    ))
}

/// [`build_path`] for a decoded image of runtime-determined pixel format.
///
/// # Errors
///
/// Same as [`build_path`], plus [`CurveError::UnsupportedDtype`] for image
/// formats outside the accepted set (u8, u16, f32, f64 channels).
pub fn build_path_dynamic(
    image: &image::DynamicImage,
    config: &CurveConfig,
) -> Result<CurvePath, CurveError> {
    build_path_dynamic_with_metrics(image, config).map(|(path, _)| path)
}

/// [`build_path_dynamic`] plus wall-clock metrics. The dtype conversion is
/// counted in `total` but not `core`.
///
/// # Errors
///
/// Same as [`build_path_dynamic`].
pub fn build_path_dynamic_with_metrics(
    image: &image::DynamicImage,
    config: &CurveConfig,
) -> Result<(CurvePath, BuildMetrics), CurveError> {
    let dispatch_start = Instant::now();
    let (path, metrics) = match DynFrame::from_image(image)? {
        DynFrame::U8(frame) => build_path_with_metrics(&frame, config)?,
        DynFrame::U16(frame) => build_path_with_metrics(&frame, config)?,
        DynFrame::F32(frame) => build_path_with_metrics(&frame, config)?,
        DynFrame::F64(frame) => build_path_with_metrics(&frame, config)?,
    };
    Ok((
        path,
        BuildMetrics {
            core: metrics.core,
            total: dispatch_start.elapsed(),
        },
    ))
}

/// [`build_paths`] for decoded images of runtime-determined pixel format.
///
/// # Errors
///
/// Same as [`build_paths`], plus [`CurveError::UnsupportedDtype`] when a
/// frame's format is outside the accepted set or the frames disagree on
/// format.
pub fn build_paths_dynamic(
    images: &[image::DynamicImage],
    config: &CurveConfig,
) -> Result<Vec<CurvePath>, CurveError> {
    build_paths_dynamic_with_metrics(images, config).map(|(paths, _)| paths)
}

/// [`build_paths_dynamic`] plus wall-clock metrics. The dtype conversion
/// is counted in `total` but not `core`.
///
/// # Errors
///
/// Same as [`build_paths_dynamic`].
pub fn build_paths_dynamic_with_metrics(
    images: &[image::DynamicImage],
    config: &CurveConfig,
) -> Result<(Vec<CurvePath>, BuildMetrics), CurveError> {
    let dispatch_start = Instant::now();
    let Some((head, tail)) = images.split_first() else {
        return Err(CurveError::InvalidShape(
            "frame sequence is empty".to_owned(),
        ));
    };

    macro_rules! gather {
        ($head:expr, $variant:ident) => {{
            let mut frames = vec![$head];
            for (index, image) in tail.iter().enumerate() {
                match DynFrame::from_image(image)? {
                    DynFrame::$variant(frame) => frames.push(frame),
                    other => {
                        return Err(CurveError::UnsupportedDtype(format!(
                            "frame {} is {}, expected {} like frame 0",
                            index + 1,
                            other.dtype_name(),
                            stringify!($variant).to_lowercase()
                        )))
                    }
                }
            }
            build_paths_with_metrics(&frames, config)?
        }};
    }

    let (paths, metrics) = match DynFrame::from_image(head)? {
        DynFrame::U8(frame) => gather!(frame, U8),
        DynFrame::U16(frame) => gather!(frame, U16),
        DynFrame::F32(frame) => gather!(frame, F32),
        DynFrame::F64(frame) => gather!(frame, F64),
    };
    Ok((
        paths,
        BuildMetrics {
            core: metrics.core,
            total: dispatch_start.elapsed(),
        },
    ))
}

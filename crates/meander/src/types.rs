//! Shared types for the curve construction core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A pixel coordinate on the grid: row first, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row index (0 at the top).
    pub r: usize,
    /// Column index (0 at the left).
    pub c: usize,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(r: usize, c: usize) -> Self {
        Self { r, c }
    }

    /// Flat row-major index into an array of `cols`-wide rows.
    #[must_use]
    pub const fn index(self, cols: usize) -> usize {
        self.r * cols + self.c
    }

    /// Manhattan distance to another coordinate.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> usize {
        self.r.abs_diff(other.r) + self.c.abs_diff(other.c)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.r, self.c)
    }
}

/// Pixel grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of pixel rows.
    pub rows: usize,
    /// Number of pixel columns.
    pub cols: usize,
}

impl Dimensions {
    /// Total number of pixels.
    #[must_use]
    pub const fn pixels(self) -> usize {
        self.rows * self.cols
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// An ordered traversal of every pixel on the grid.
///
/// Produced by the curve builder as a closed Hamiltonian cycle: consecutive
/// entries (and the last/first pair) differ by exactly one lattice step.
/// The aligner mutates paths in place via [`reverse`](Self::reverse) and
/// [`rotate_left`](Self::rotate_left); both preserve the cycle structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePath(Vec<Coord>);

impl CurvePath {
    /// Create a path from an ordered coordinate list.
    #[must_use]
    pub const fn new(coords: Vec<Coord>) -> Self {
        Self(coords)
    }

    /// Returns `true` if the path has no coordinates.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of coordinates in the path.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// All coordinates in traversal order.
    #[must_use]
    pub fn coords(&self) -> &[Coord] {
        &self.0
    }

    /// Consume the path, returning the underlying coordinate list.
    #[must_use]
    pub fn into_coords(self) -> Vec<Coord> {
        self.0
    }

    /// Reverse the traversal direction in place.
    pub fn reverse(&mut self) {
        self.0.reverse();
    }

    /// Rotate the cycle in place so the entry at `shift` becomes first.
    ///
    /// # Panics
    ///
    /// Panics if `shift > len`.
    pub fn rotate_left(&mut self, shift: usize) {
        self.0.rotate_left(shift);
    }
}

/// Frame alignment strategy for multi-frame runs.
///
/// Frames after the first are rotated (and possibly reversed) so their
/// traversal best matches the preceding frame. See the `align` module for
/// scoring details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlignStrategy {
    /// Leave every frame's traversal as produced.
    #[default]
    None,
    /// Minimize the summed per-position L1 pixel difference; brute-force
    /// over all rotations.
    L1Norm,
    /// Maximize circular cross-correlation, computed via FFT.
    L2Norm,
}

impl fmt::Display for AlignStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::L1Norm => f.write_str("L1-norm"),
            Self::L2Norm => f.write_str("L2-norm"),
        }
    }
}

/// Configuration for curve construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Weight in `[0, 1]` balancing pixel similarity against the
    /// block-centering pull. At `0.0` only pixel differences matter; at
    /// `1.0` only block geometry does.
    pub alpha: f64,

    /// Side length of the super-node blocks the centering term pulls
    /// toward. Must be at least 1.
    pub block: u32,

    /// How to align frames after per-frame construction. Ignored by
    /// single-frame entry points.
    pub align: AlignStrategy,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            alpha: 0.03,
            block: 10,
            align: AlignStrategy::None,
        }
    }
}

impl CurveConfig {
    /// Check every parameter, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidParameter`] with a human-readable
    /// description of the violated rule.
    pub fn validate(&self) -> Result<(), CurveError> {
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(CurveError::InvalidParameter(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        if self.block < 1 {
            return Err(CurveError::InvalidParameter(format!(
                "block must be at least 1, got {}",
                self.block
            )));
        }
        Ok(())
    }
}

/// Errors surfaced by curve construction and alignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    /// Grid shape is unusable: odd or zero dimensions, mismatched frames,
    /// or a buffer whose length disagrees with its declared shape.
    #[error("invalid grid shape: {0}")]
    InvalidShape(String),

    /// A configuration parameter is out of its documented range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The pixel format is not one of the supported channel types.
    #[error("unsupported pixel format: {0}")]
    UnsupportedDtype(String),

    /// The post-construction graph audit failed. This indicates a bug in
    /// the merge rewiring, not bad input.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

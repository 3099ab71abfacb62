//! Pixel frames: the caller-owned image data the curve builder reads.
//!
//! A [`Frame`] is a dense row-major `rows x cols x channels` buffer generic
//! over the channel type. The builder never mutates frames; it widens channel
//! values to `f64` through the [`Channel`] trait and works in floating point
//! from there.
//!
//! [`DynFrame`] is the runtime-dtype boundary: it converts an
//! [`image::DynamicImage`] into whichever typed frame matches its storage,
//! so callers with decoded images do not need to know the dtype up front.

use image::DynamicImage;

use crate::types::{CurveError, Dimensions};

/// A pixel channel type the curve builder accepts.
///
/// All cost arithmetic happens in `f64`; implementations only provide the
/// lossless widening conversion.
pub trait Channel: Copy + Send + Sync + 'static {
    /// Widen the channel value to `f64`.
    fn to_f64(self) -> f64;
}

impl Channel for u8 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Channel for u16 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Channel for f32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Channel for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// A dense row-major pixel buffer: `rows x cols` pixels of `channels`
/// channel values each.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T> {
    rows: usize,
    cols: usize,
    channels: usize,
    data: Vec<T>,
}

impl<T: Channel> Frame<T> {
    /// Wrap an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidShape`] when `channels` is zero or the
    /// buffer length differs from `rows * cols * channels`.
    pub fn from_raw(
        rows: usize,
        cols: usize,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self, CurveError> {
        if channels == 0 {
            return Err(CurveError::InvalidShape(
                "frames need at least one channel".to_owned(),
            ));
        }
        let expected = rows * cols * channels;
        if data.len() != expected {
            return Err(CurveError::InvalidShape(format!(
                "buffer holds {} values but {rows}x{cols}x{channels} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            channels,
            data,
        })
    }

    /// Build a frame by evaluating `f(row, col, channel)` for every sample.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is zero.
    #[must_use]
    pub fn from_fn<F: FnMut(usize, usize, usize) -> T>(
        rows: usize,
        cols: usize,
        channels: usize,
        mut f: F,
    ) -> Self {
        assert!(channels > 0, "frames need at least one channel");
        let mut data = Vec::with_capacity(rows * cols * channels);
        for r in 0..rows {
            for c in 0..cols {
                for k in 0..channels {
                    data.push(f(r, c, k));
                }
            }
        }
        Self {
            rows,
            cols,
            channels,
            data,
        }
    }

    /// Number of pixel rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of pixel columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of channels per pixel.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// The channel values of one pixel.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    #[must_use]
    pub fn pixel(&self, r: usize, c: usize) -> &[T] {
        debug_assert!(r < self.rows && c < self.cols, "pixel ({r}, {c}) out of bounds");
        let start = (r * self.cols + c) * self.channels;
        &self.data[start..start + self.channels]
    }
}

/// A frame whose channel type was chosen at runtime.
///
/// This is the dtype-dispatch boundary mirroring the accepted pixel formats:
/// unsigned 8-bit, unsigned 16-bit, 32-bit float, 64-bit float.
#[derive(Debug, Clone)]
pub enum DynFrame {
    /// Unsigned 8-bit channels.
    U8(Frame<u8>),
    /// Unsigned 16-bit channels.
    U16(Frame<u16>),
    /// 32-bit float channels.
    F32(Frame<f32>),
    /// 64-bit float channels.
    F64(Frame<f64>),
}

impl DynFrame {
    /// Convert a decoded image into the typed frame matching its storage.
    ///
    /// Alpha channels are kept as ordinary channels; the cost function
    /// treats every channel alike.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::UnsupportedDtype`] for image formats outside
    /// the accepted set.
    pub fn from_image(image: &DynamicImage) -> Result<Self, CurveError> {
        let rows = image.height() as usize;
        let cols = image.width() as usize;
        match image {
            DynamicImage::ImageLuma8(buf) => {
                Frame::from_raw(rows, cols, 1, buf.as_raw().clone()).map(Self::U8)
            }
            DynamicImage::ImageLumaA8(buf) => {
                Frame::from_raw(rows, cols, 2, buf.as_raw().clone()).map(Self::U8)
            }
            DynamicImage::ImageRgb8(buf) => {
                Frame::from_raw(rows, cols, 3, buf.as_raw().clone()).map(Self::U8)
            }
            DynamicImage::ImageRgba8(buf) => {
                Frame::from_raw(rows, cols, 4, buf.as_raw().clone()).map(Self::U8)
            }
            DynamicImage::ImageLuma16(buf) => {
                Frame::from_raw(rows, cols, 1, buf.as_raw().clone()).map(Self::U16)
            }
            DynamicImage::ImageLumaA16(buf) => {
                Frame::from_raw(rows, cols, 2, buf.as_raw().clone()).map(Self::U16)
            }
            DynamicImage::ImageRgb16(buf) => {
                Frame::from_raw(rows, cols, 3, buf.as_raw().clone()).map(Self::U16)
            }
            DynamicImage::ImageRgba16(buf) => {
                Frame::from_raw(rows, cols, 4, buf.as_raw().clone()).map(Self::U16)
            }
            DynamicImage::ImageRgb32F(buf) => {
                Frame::from_raw(rows, cols, 3, buf.as_raw().clone()).map(Self::F32)
            }
            DynamicImage::ImageRgba32F(buf) => {
                Frame::from_raw(rows, cols, 4, buf.as_raw().clone()).map(Self::F32)
            }
            other => Err(CurveError::UnsupportedDtype(format!(
                "image color type {:?} is not in the accepted set (u8, u16, f32, f64)",
                other.color()
            ))),
        }
    }

    /// Short name of the stored channel type, for error messages.
    #[must_use]
    pub const fn dtype_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
        }
    }

    /// Grid dimensions, independent of the channel type.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        match self {
            Self::U8(f) => f.dimensions(),
            Self::U16(f) => f.dimensions(),
            Self::F32(f) => f.dimensions(),
            Self::F64(f) => f.dimensions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_length_mismatch() {
        let result = Frame::from_raw(2, 2, 1, vec![0u8; 5]);
        assert!(matches!(result, Err(CurveError::InvalidShape(_))));
    }

    #[test]
    fn from_raw_rejects_zero_channels() {
        let result = Frame::<u8>::from_raw(2, 2, 0, Vec::new());
        assert!(matches!(result, Err(CurveError::InvalidShape(_))));
    }

    #[test]
    fn pixel_accessor_is_row_major() {
        let frame = Frame::from_fn(2, 3, 2, |r, c, k| (r * 100 + c * 10 + k) as u16);
        assert_eq!(frame.pixel(0, 0), &[0, 1]);
        assert_eq!(frame.pixel(1, 2), &[120, 121]);
    }

    #[test]
    fn dyn_frame_from_luma8() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_fn(4, 2, |x, y| {
            image::Luma([(y * 4 + x) as u8])
        }));
        let frame = DynFrame::from_image(&img).unwrap();
        assert_eq!(frame.dtype_name(), "u8");
        let DynFrame::U8(frame) = frame else {
            panic!("expected a u8 frame");
        };
        assert_eq!(frame.rows(), 2);
        assert_eq!(frame.cols(), 4);
        assert_eq!(frame.channels(), 1);
        assert_eq!(frame.pixel(1, 3), &[7]);
    }

    #[test]
    fn dyn_frame_from_rgb8_keeps_three_channels() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            2,
            2,
            image::Rgb([10, 20, 30]),
        ));
        let frame = DynFrame::from_image(&img).unwrap();
        let DynFrame::U8(frame) = frame else {
            panic!("expected a u8 frame");
        };
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.pixel(0, 1), &[10, 20, 30]);
    }

    #[test]
    fn channel_widening_is_exact_for_integers() {
        assert_eq!(255u8.to_f64(), 255.0);
        assert_eq!(65535u16.to_f64(), 65535.0);
        assert_eq!(1.5f32.to_f64(), 1.5);
    }
}

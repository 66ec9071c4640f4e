//! Stride-aware image views for zero-copy frame ingestion.

use thiserror::Error;

/// Reasons a borrowed buffer cannot be viewed as an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Row stride is shorter than one row of pixels.
    #[error("stride ({stride}) cannot be less than row length ({row_len})")]
    StrideTooSmall {
        /// Supplied stride in bytes.
        stride: usize,
        /// Bytes needed for one row.
        row_len: usize,
    },
    /// Buffer does not cover the requested dimensions.
    #[error("buffer size ({len}) is too small for {width}x{height} image with stride {stride} (required: {required})")]
    BufferTooSmall {
        /// Supplied buffer length.
        len: usize,
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
        /// Row stride in bytes.
        stride: usize,
        /// Minimum buffer length.
        required: usize,
    },
}

fn check_layout(
    len: usize,
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
) -> Result<(), ImageError> {
    let row_len = width * channels;
    if stride < row_len {
        return Err(ImageError::StrideTooSmall { stride, row_len });
    }
    let required = if height > 0 {
        (height - 1) * stride + row_len
    } else {
        0
    };
    if len < required {
        return Err(ImageError::BufferTooSmall {
            len,
            width,
            height,
            stride,
            required,
        });
    }
    Ok(())
}

/// A view into a single-channel 8-bit buffer with explicit stride support.
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    /// Pixel bytes, `stride` bytes per row.
    pub data: &'a [u8],
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Distance between row starts in bytes.
    pub stride: usize,
}

impl<'a> ImageView<'a> {
    /// Create a new view after validating that the buffer size matches the dimensions and stride.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self, ImageError> {
        check_layout(data.len(), width, height, stride, 1)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// View over a tightly packed buffer the caller has already sized.
    pub(crate) fn dense(data: &'a [u8], width: usize, height: usize) -> Self {
        debug_assert!(data.len() >= width * height);
        Self {
            data,
            width,
            height,
            stride: width,
        }
    }

    /// Safe accessor for a specific row.
    #[inline(always)]
    #[must_use]
    pub fn get_row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height, "Row index {y} out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Safe accessor for a specific pixel.
    #[inline(always)]
    #[must_use]
    pub fn get_pixel(&self, x: usize, y: usize) -> u8 {
        assert!(x < self.width, "Column index {x} out of bounds");
        self.get_row(y)[x]
    }
}

/// A view into an interleaved 3-channel BGR buffer.
#[derive(Clone, Copy)]
pub struct BgrImageView<'a> {
    /// Interleaved B, G, R bytes, `stride` bytes per row.
    pub data: &'a [u8],
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Distance between row starts in bytes (at least `3 * width`).
    pub stride: usize,
}

impl<'a> BgrImageView<'a> {
    /// Create a new BGR view after validating buffer size, dimensions and stride.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self, ImageError> {
        check_layout(data.len(), width, height, stride, 3)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// The interleaved bytes of row `y` (`3 * width` long).
    #[inline(always)]
    #[must_use]
    pub fn get_row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height, "Row index {y} out of bounds");
        let start = y * self.stride;
        &self.data[start..start + 3 * self.width]
    }

    /// The `[b, g, r]` triple at `(x, y)`.
    #[inline(always)]
    #[must_use]
    pub fn get_pixel(&self, x: usize, y: usize) -> [u8; 3] {
        assert!(x < self.width, "Column index {x} out of bounds");
        let row = self.get_row(y);
        [row[3 * x], row[3 * x + 1], row[3 * x + 2]]
    }
}

/// A camera frame handed to a detector.
#[derive(Clone, Copy)]
pub enum Frame<'a> {
    /// Color frame; the detector isolates the target channel.
    Bgr(BgrImageView<'a>),
    /// Pre-isolated single-channel frame; used as-is before binarization.
    Gray(ImageView<'a>),
}

impl Frame<'_> {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Frame::Bgr(v) => v.width,
            Frame::Gray(v) => v.width,
        }
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        match self {
            Frame::Bgr(v) => v.height,
            Frame::Gray(v) => v.height,
        }
    }

    /// True if the frame holds no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl<'a> From<ImageView<'a>> for Frame<'a> {
    fn from(view: ImageView<'a>) -> Self {
        Frame::Gray(view)
    }
}

impl<'a> From<BgrImageView<'a>> for Frame<'a> {
    fn from(view: BgrImageView<'a>) -> Self {
        Frame::Bgr(view)
    }
}

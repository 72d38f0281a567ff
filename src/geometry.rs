//! Screen rectangles and cropping.
//!
//! A [`CaptureRect`] is always normalized: `(x, y)` is the top-left corner
//! and the size is non-negative. Constructing one from two arbitrary drag
//! points goes through [`CaptureRect::from_corners`], so the drag direction
//! never leaks into the rest of the pipeline.

use crate::error::ReportError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A region in screen-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CaptureRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalize two opposite corners into a rectangle.
    ///
    /// The origin is `(min(ax, bx), min(ay, by))` and the size is
    /// `(|ax - bx|, |ay - by|)` for every drag direction.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: a.0.abs_diff(b.0),
            height: a.1.abs_diff(b.1),
        }
    }

    /// Zero width or zero height: "no selection".
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// True when the rectangle lies entirely inside a `width × height` image
    /// anchored at the origin.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() <= i64::from(width)
            && self.bottom() <= i64::from(height)
    }

    /// Same rectangle expressed relative to another origin.
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }

    /// Cut this region out of `image` into a new, independent buffer.
    ///
    /// # Errors
    /// * [`ReportError::SelectionCancelled`] for a zero-area rectangle
    /// * [`ReportError::RegionOutOfBounds`] when the rectangle exceeds the image
    pub fn crop(&self, image: &RgbaImage) -> Result<RgbaImage, ReportError> {
        if self.is_empty() {
            return Err(ReportError::SelectionCancelled);
        }
        if !self.fits_within(image.width(), image.height()) {
            return Err(ReportError::RegionOutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                image_width: image.width(),
                image_height: image.height(),
            });
        }
        Ok(image::imageops::crop_imm(
            image,
            self.x as u32,
            self.y as u32,
            self.width,
            self.height,
        )
        .to_image())
    }
}

impl fmt::Display for CaptureRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

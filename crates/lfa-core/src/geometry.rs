//! Display-to-native coordinate mapping.
//!
//! The preview surface is usually drawn at a different size than the image's
//! native resolution. Pointer events arrive in surface coordinates and must be
//! mapped into native pixel space before they can drive a selection.

use serde::{Deserialize, Serialize};

use crate::error::{LfaError, Result};

/// A point in native image pixel space.
///
/// Points are not clamped to the image; out-of-range values are legal
/// intermediate results while a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen placement of the rendered surface plus its backing buffer size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBounds {
    /// Left edge of the surface in pointer coordinates
    pub left: f64,
    /// Top edge of the surface in pointer coordinates
    pub top: f64,
    /// Displayed width (on-screen)
    pub width: f64,
    /// Displayed height (on-screen)
    pub height: f64,
    /// Backing buffer width (native image width)
    pub buffer_width: u32,
    /// Backing buffer height (native image height)
    pub buffer_height: u32,
}

impl SurfaceBounds {
    /// Surface anchored at the origin, displayed at `width` x `height`.
    pub fn at_origin(width: f64, height: f64, buffer_width: u32, buffer_height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
            buffer_width,
            buffer_height,
        }
    }

    /// Scale factors derived from this surface.
    pub fn transform(&self) -> Result<DisplayTransform> {
        DisplayTransform::new(
            self.width,
            self.height,
            self.buffer_width,
            self.buffer_height,
        )
    }
}

/// Ratio between the native image size and its displayed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub display_width: f64,
    pub display_height: f64,
    pub native_width: u32,
    pub native_height: u32,
    scale_x: f64,
    scale_y: f64,
}

impl DisplayTransform {
    /// Build a transform, rejecting surfaces that would produce a zero,
    /// infinite or NaN scale factor.
    pub fn new(
        display_width: f64,
        display_height: f64,
        native_width: u32,
        native_height: u32,
    ) -> Result<Self> {
        let invalid = || LfaError::InvalidSurface {
            width: display_width,
            height: display_height,
        };

        if !(display_width.is_finite() && display_width > 0.0)
            || !(display_height.is_finite() && display_height > 0.0)
        {
            return Err(invalid());
        }
        if native_width == 0 || native_height == 0 {
            return Err(invalid());
        }

        Ok(Self {
            display_width,
            display_height,
            native_width,
            native_height,
            scale_x: native_width as f64 / display_width,
            scale_y: native_height as f64 / display_height,
        })
    }

    /// Identity transform for an image displayed at native size.
    pub fn native(width: u32, height: u32) -> Result<Self> {
        Self::new(width as f64, height as f64, width, height)
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Map a surface-relative offset (already minus the surface origin) to native space.
    pub fn apply(&self, dx: f64, dy: f64) -> Point {
        Point::new(dx * self.scale_x, dy * self.scale_y)
    }
}

/// Map a pointer position on the display surface into native image pixels.
///
/// No clamping is performed; callers decide how to treat points that fall
/// outside the image.
pub fn to_native(pointer: Point, surface: &SurfaceBounds) -> Result<Point> {
    let transform = surface.transform()?;
    Ok(transform.apply(pointer.x - surface.left, pointer.y - surface.top))
}

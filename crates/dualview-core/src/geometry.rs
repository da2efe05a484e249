//! Fit geometry
//!
//! Maps a source frame into a target frame under one of the three fit
//! policies. The same formula drives the display surface's render and the
//! control surface's live preview (scaled down by a constant factor).
//!
//! In manual mode the pan offset is added to the centred position as raw
//! canvas pixels: it is *not* multiplied by the current zoom. This matches the
//! composite `translate(-50%, -50%) translate(tx, ty) scale(s)` applied by the
//! display, where the scale is about the element centre.

use crate::types::{Size, TransformState, VideoFitMode};
use serde::{Deserialize, Serialize};

/// Half-pixel slack before a rect counts as escaping its viewport
pub const CROP_TOLERANCE: f64 = 0.5;

/// Axis-aligned rectangle in target-frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// All four components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Uniformly rescale position and size
    pub fn scaled(&self, factor: f64) -> Rect {
        Rect {
            x: self.x * factor,
            y: self.y * factor,
            w: self.w * factor,
            h: self.h * factor,
        }
    }
}

/// Scale factor the fit policy applies to the source
pub fn fit_scale(fit: VideoFitMode, transform: &TransformState, source: Size, target: Size) -> f64 {
    let ratio_x = target.width / source.width;
    let ratio_y = target.height / source.height;
    match fit {
        VideoFitMode::Contain => ratio_x.min(ratio_y),
        VideoFitMode::Cover => ratio_x.max(ratio_y),
        VideoFitMode::None => transform.scale,
    }
}

/// Compute the displayed video rectangle in target-frame coordinates.
///
/// `contain` and `cover` centre the scaled source; `none` centres it at
/// `transform.scale` and then shifts by the unscaled pan amount. The result
/// may extend past the target (cover, manual): cropping is the viewport's job.
///
/// A zero or unknown source size yields a non-finite rect; callers check
/// [`Rect::is_finite`] before drawing anything derived from it.
pub fn compute_rect(fit: VideoFitMode, transform: &TransformState, source: Size, target: Size) -> Rect {
    let scale = fit_scale(fit, transform, source, target);
    let (pan_x, pan_y) = match fit {
        VideoFitMode::None => (transform.translate_x, transform.translate_y),
        _ => (0.0, 0.0),
    };

    let w = source.width * scale;
    let h = source.height * scale;
    Rect {
        x: (target.width - w) / 2.0 + pan_x,
        y: (target.height - h) / 2.0 + pan_y,
        w,
        h,
    }
}

/// Does `rect` extend past a `width` x `height` viewport by more than the
/// half-pixel tolerance on any edge
pub fn escapes(rect: &Rect, width: f64, height: f64) -> bool {
    rect.x < -CROP_TOLERANCE
        || rect.y < -CROP_TOLERANCE
        || rect.right() > width + CROP_TOLERANCE
        || rect.bottom() > height + CROP_TOLERANCE
}

/// Control-surface preview: the output canvas drawn at a smaller width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewGeometry {
    canvas: Size,
    factor: f64,
}

impl PreviewGeometry {
    /// Preview `preview_width` pixels wide, keeping the canvas aspect ratio
    pub fn new(preview_width: f64, canvas: Size) -> Self {
        Self {
            canvas,
            factor: preview_width / canvas.width,
        }
    }

    /// Preview pixels per canvas pixel
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Preview box dimensions
    pub fn size(&self) -> Size {
        Size::new(self.canvas.width * self.factor, self.canvas.height * self.factor)
    }

    /// The display's rect mapped into preview pixels
    pub fn preview_rect(&self, fit: VideoFitMode, transform: &TransformState, source: Size) -> Rect {
        compute_rect(fit, transform, source, self.canvas).scaled(self.factor)
    }

    /// Whether the preview should flag cropping.
    ///
    /// `None` while the geometry is not finite (local file metadata pending).
    pub fn crop_indicator(&self, rect: &Rect) -> Option<bool> {
        if !rect.is_finite() {
            return None;
        }
        let size = self.size();
        Some(escapes(rect, size.width, size.height))
    }

    /// Convert a drag delta in preview pixels to canvas pixels
    pub fn canvas_delta(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx / self.factor, dy / self.factor)
    }
}

/// CSS-like transform the display applies to the source-sized player element
/// centred in the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl RenderTransform {
    pub fn new(fit: VideoFitMode, transform: &TransformState, source: Size, target: Size) -> Self {
        let scale = fit_scale(fit, transform, source, target);
        match fit {
            VideoFitMode::None => Self {
                scale,
                translate_x: transform.translate_x,
                translate_y: transform.translate_y,
            },
            _ => Self { scale, translate_x: 0.0, translate_y: 0.0 },
        }
    }

    /// Render as a CSS `transform` value
    pub fn to_css(&self) -> String {
        if self.translate_x == 0.0 && self.translate_y == 0.0 {
            format!("translate(-50%, -50%) scale({})", self.scale)
        } else {
            format!(
                "translate(-50%, -50%) translate({}px, {}px) scale({})",
                self.translate_x, self.translate_y, self.scale
            )
        }
    }
}

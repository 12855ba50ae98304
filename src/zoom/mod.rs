// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Zoom and pan state
//!
//! A [`ZoomTransform`] maps canvas coordinates to viewport coordinates as
//! `viewport = canvas * k + (x, y)`. The controller keeps one per pipeline.

mod store;

pub use store::{FileZoomStore, MemoryZoomStore, ZoomStore};

use serde::{Deserialize, Serialize};

/// Translation and scale of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, k: 1.0 }
    }
}

/// Zoom step and scale bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub factor: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            factor: 1.1,
            min_scale: 0.2,
            max_scale: 1.8,
        }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, k: f64) -> f64 {
        k.clamp(self.min_scale, self.max_scale)
    }
}

/// Size of the visible area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    /// Smallest rectangle around all of `rects`
    pub fn bounding(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
        rects.into_iter().reduce(|a, b| a.union(&b))
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl ZoomTransform {
    /// Scale about the viewport center, staying within `limits`
    pub fn scaled(&self, ratio: f64, limits: &ZoomLimits, viewport: Option<Viewport>) -> Self {
        let k = limits.clamp(self.k * ratio);
        let (cx, cy) = viewport
            .map(|v| (v.width / 2.0, v.height / 2.0))
            .unwrap_or((0.0, 0.0));
        let applied = k / self.k;
        Self {
            x: cx - (cx - self.x) * applied,
            y: cy - (cy - self.y) * applied,
            k,
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            k: self.k,
        }
    }

    /// The canvas rectangle currently visible in `viewport`
    pub fn visible_area(&self, viewport: Viewport) -> Rect {
        Rect::new(
            -self.x / self.k,
            -self.y / self.k,
            viewport.width / self.k,
            viewport.height / self.k,
        )
    }
}

/// Transform that fits `content` inside `viewport` with `padding` on each side
pub fn zoom_to_fit(
    content: Rect,
    viewport: Viewport,
    padding: f64,
    limits: &ZoomLimits,
) -> ZoomTransform {
    let avail_w = (viewport.width - 2.0 * padding).max(1.0);
    let avail_h = (viewport.height - 2.0 * padding).max(1.0);

    let k = if content.width <= 0.0 || content.height <= 0.0 {
        1.0
    } else {
        (avail_w / content.width).min(avail_h / content.height)
    };
    let k = limits.clamp(k);

    let (cx, cy) = content.center();
    ZoomTransform {
        x: viewport.width / 2.0 - cx * k,
        y: viewport.height / 2.0 - cy * k,
        k,
    }
}

/// Transform that brings `content` into view, or `None` when it is already
/// fully visible. The content center lands at `x_pct`/`y_pct` percent of the
/// viewport; the scale is kept unless the content does not fit.
pub fn zoom_to_reveal(
    content: Rect,
    current: ZoomTransform,
    viewport: Viewport,
    x_pct: Option<f64>,
    y_pct: Option<f64>,
    limits: &ZoomLimits,
) -> Option<ZoomTransform> {
    let visible = current.visible_area(viewport);
    let fully_visible = content.x >= visible.x
        && content.y >= visible.y
        && content.right() <= visible.right()
        && content.bottom() <= visible.bottom();
    if fully_visible && x_pct.is_none() && y_pct.is_none() {
        return None;
    }

    let fits = content.width * current.k <= viewport.width
        && content.height * current.k <= viewport.height;
    let k = if fits {
        current.k
    } else {
        zoom_to_fit(content, viewport, 0.0, limits).k
    };

    let (cx, cy) = content.center();
    let tx = viewport.width * x_pct.unwrap_or(50.0) / 100.0;
    let ty = viewport.height * y_pct.unwrap_or(50.0) / 100.0;
    Some(ZoomTransform {
        x: tx - cx * k,
        y: ty - cy * k,
        k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_in_clamps() {
        let limits = ZoomLimits::default();
        let mut zoom = ZoomTransform::default();
        for _ in 0..20 {
            zoom = zoom.scaled(limits.factor, &limits, None);
        }
        assert!((zoom.k - 1.8).abs() < f64::EPSILON);

        for _ in 0..40 {
            zoom = zoom.scaled(1.0 / limits.factor, &limits, None);
        }
        assert!((zoom.k - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scale_keeps_viewport_center() {
        let limits = ZoomLimits::default();
        let viewport = Viewport::new(800.0, 600.0);
        let zoom = ZoomTransform::default().scaled(1.1, &limits, Some(viewport));

        // canvas point under the center stays under the center
        let canvas_x = (400.0 - zoom.x) / zoom.k;
        assert!((canvas_x - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_to_fit_centers_content() {
        let limits = ZoomLimits::default();
        let content = Rect::new(0.0, 0.0, 400.0, 300.0);
        let zoom = zoom_to_fit(content, Viewport::new(800.0, 600.0), 0.0, &limits);

        assert!((zoom.k - 1.8).abs() < 1e-9);
        let (cx, cy) = content.center();
        assert!((cx * zoom.k + zoom.x - 400.0).abs() < 1e-9);
        assert!((cy * zoom.k + zoom.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_reveal_visible_content_is_none() {
        let limits = ZoomLimits::default();
        let viewport = Viewport::new(800.0, 600.0);
        let content = Rect::new(10.0, 10.0, 50.0, 50.0);

        let current = ZoomTransform::default();
        assert!(zoom_to_reveal(content, current, viewport, None, None, &limits).is_none());

        let far = Rect::new(2000.0, 2000.0, 50.0, 50.0);
        let zoom = zoom_to_reveal(far, current, viewport, None, None, &limits).unwrap();
        assert!((zoom.k - 1.0).abs() < f64::EPSILON);
        assert!((2025.0 + zoom.x - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_rect() {
        let rect = Rect::bounding([
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(20.0, 5.0, 10.0, 20.0),
        ])
        .unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 30.0, 25.0));
        assert!(Rect::bounding(Vec::new()).is_none());
    }
}

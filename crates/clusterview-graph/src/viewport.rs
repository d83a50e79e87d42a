use crate::geometry::{Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Padding in rendered pixels kept around the fitted extent.
    pub fit_padding: f32,
    /// Applied to the fitted zoom to leave breathing room.
    pub zoom_factor: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fit_padding: 600.0,
            zoom_factor: 0.9,
            min_zoom: 0.15,
            max_zoom: 2.0,
        }
    }
}

/// Pan/zoom state of the drawing surface.
///
/// `rendered = model * zoom + pan`, in CSS pixels of a `width x height`
/// canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
    pub pan: Vec2,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, config: &ViewportConfig) -> Self {
        Self {
            width,
            height,
            zoom: 1.0_f32.clamp(config.min_zoom, config.max_zoom),
            pan: Vec2::ZERO,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return self.min_zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Zoom and centre on `extent`. Returns false and leaves the viewport
    /// untouched when there is nothing to fit.
    pub fn fit(&mut self, extent: Option<Rect>, padding: f32) -> bool {
        let Some(extent) = extent else {
            return false;
        };
        if !extent.min.is_finite() || !extent.max.is_finite() {
            tracing::warn!("Ignoring viewport fit to a non-finite extent");
            return false;
        }

        let bw = extent.width();
        let bh = extent.height();
        let zoom = if bw <= 0.0 && bh <= 0.0 {
            self.max_zoom
        } else {
            let zx = if bw > 0.0 { (self.width - 2.0 * padding) / bw } else { f32::INFINITY };
            let zy = if bh > 0.0 { (self.height - 2.0 * padding) / bh } else { f32::INFINITY };
            zx.min(zy)
        };
        self.zoom = self.clamp_zoom(zoom);
        self.pan = Vec2::new(
            (self.width - self.zoom * (extent.min.x + extent.max.x)) * 0.5,
            (self.height - self.zoom * (extent.min.y + extent.max.y)) * 0.5,
        );
        true
    }

    /// Multiply the zoom, keeping the model point under the viewport centre
    /// fixed.
    pub fn scale_zoom(&mut self, factor: f32) {
        let center = Vec2::new(self.width * 0.5, self.height * 0.5);
        let anchor = self.rendered_to_model(center);
        self.zoom = self.clamp_zoom(self.zoom * factor);
        self.pan = center - anchor * self.zoom;
    }

    pub fn model_to_rendered(&self, model: Vec2) -> Vec2 {
        model * self.zoom + self.pan
    }

    pub fn rendered_to_model(&self, rendered: Vec2) -> Vec2 {
        (rendered - self.pan) * (1.0 / self.zoom)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1200.0, 600.0, &ViewportConfig::default())
    }
}

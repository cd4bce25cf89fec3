//! Time ↔ pixel conversion under a bounded zoom factor.

use serde::{Deserialize, Serialize};

use crate::config::ZoomConfig;

/// Snaps `seconds` to the nearest frame boundary at `fps`.
///
/// Non-positive or non-finite frame rates leave the value untouched.
pub fn quantize(seconds: f64, fps: f64) -> f64 {
    if !(fps.is_finite() && fps > 0.0) || !seconds.is_finite() {
        return seconds;
    }
    (seconds * fps).round() / fps
}

/// Length of a single frame in seconds.
pub fn frame_duration(fps: f64) -> f64 {
    if fps.is_finite() && fps > 0.0 {
        1.0 / fps
    } else {
        0.0
    }
}

/// Effective zoom range derived from the project and viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl ZoomBounds {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Converts between elapsed time and horizontal pixel offsets.
#[derive(Debug, Clone)]
pub struct CoordinateModel {
    config: ZoomConfig,
    zoom: f64,
    fps: f64,
    duration: f64,
    viewport_width: f64,
    shortest_clip: Option<f64>,
    bounds: ZoomBounds,
}

impl CoordinateModel {
    pub fn new(config: ZoomConfig, fps: f64, viewport_width: f64) -> Self {
        let mut model = Self {
            zoom: config.initial,
            config,
            fps,
            duration: 0.0,
            viewport_width,
            shortest_clip: None,
            bounds: ZoomBounds { min: 0.0, max: 0.0 },
        };
        model.refresh_bounds();
        model
    }

    /// Current pixels per second.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    pub fn to_pixels(&self, seconds: f64) -> f64 {
        seconds * self.zoom
    }

    pub fn to_seconds(&self, pixels: f64) -> f64 {
        pixels / self.zoom
    }

    pub fn quantize(&self, seconds: f64) -> f64 {
        quantize(seconds, self.fps)
    }

    pub fn frame_duration(&self) -> f64 {
        frame_duration(self.fps)
    }

    /// Content width needed to show the whole timeline.
    pub fn content_width(&self) -> f64 {
        self.to_pixels(self.duration)
    }

    /// Requests a zoom level. Out of range values are clamped silently and a
    /// NaN request keeps the current zoom.
    pub fn set_zoom(&mut self, requested: f64) -> f64 {
        if !requested.is_nan() {
            self.zoom = self.bounds.clamp(requested);
        }
        self.zoom
    }

    /// Scales the zoom by `factor` while keeping the time under `anchor_x`
    /// (viewport pixels) in place. Returns the adjusted scroll offset.
    pub fn zoom_about(&mut self, factor: f64, anchor_x: f64, scroll_left: f64) -> f64 {
        let anchor_time = self.to_seconds(scroll_left + anchor_x);
        self.set_zoom(self.zoom * factor);
        (self.to_pixels(anchor_time) - anchor_x).max(0.0)
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
        self.refresh_bounds();
    }

    pub fn set_fps(&mut self, fps: f64) {
        self.fps = fps;
        self.refresh_bounds();
    }

    /// Updates the project extent the bounds are derived from.
    pub fn set_extent(&mut self, duration: f64, shortest_clip: Option<f64>) {
        self.duration = duration.max(0.0);
        self.shortest_clip = shortest_clip.filter(|value| value.is_finite() && *value > 0.0);
        self.refresh_bounds();
    }

    fn refresh_bounds(&mut self) {
        let config = &self.config;
        let mut min = config.absolute_min.max(config.base_min);
        if let Some(shortest) = self.shortest_clip {
            min = min.max(config.min_clip_pixels / shortest);
        }

        let mut max = config.absolute_max;
        if self.fps.is_finite() && self.fps > 0.0 {
            max = max.min(self.fps * config.max_pixels_per_frame);
        }
        if self.viewport_width.is_finite()
            && self.viewport_width > 0.0
            && config.min_seconds_visible > 0.0
        {
            max = max.min(self.viewport_width / config.min_seconds_visible);
        }

        // Zooming in past the ceiling would break frame density, so a floor
        // above it collapses onto the ceiling.
        let max = max.max(f64::MIN_POSITIVE);
        let min = min.min(max);
        self.bounds = ZoomBounds { min, max };
        self.zoom = if self.zoom.is_nan() {
            min
        } else {
            self.bounds.clamp(self.zoom)
        };
    }
}

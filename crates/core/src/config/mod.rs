use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub zoom: ZoomConfig,
    pub interaction: InteractionConfig,
    pub persistence: PersistenceConfig,
    pub captions: CaptionStyle,
    /// Frame rate used when a timeline does not carry its own.
    pub default_fps: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomConfig::default(),
            interaction: InteractionConfig::default(),
            persistence: PersistenceConfig::default(),
            captions: CaptionStyle::default(),
            default_fps: 30.0,
        }
    }
}

impl EditorConfig {
    /// Parses a configuration document. Missing fields fall back to defaults.
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Bounds used by the coordinate model when clamping the zoom factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Initial pixels per second.
    pub initial: f64,
    /// Absolute floor for the zoom factor.
    pub absolute_min: f64,
    /// Configured lower bound before clip-width constraints apply.
    pub base_min: f64,
    /// Configured ceiling.
    pub absolute_max: f64,
    /// Narrowest on-screen width the shortest clip may be shrunk to.
    pub min_clip_pixels: f64,
    pub max_pixels_per_frame: f64,
    /// Smallest time window the viewport may be zoomed into.
    pub min_seconds_visible: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            initial: 50.0,
            absolute_min: 2.0,
            base_min: 10.0,
            absolute_max: 1_200.0,
            min_clip_pixels: 12.0,
            max_pixels_per_frame: 24.0,
            min_seconds_visible: 1.0,
        }
    }
}

/// Thresholds driving pointer interaction on clips.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Width of the resize handle on each clip edge, in pixels.
    pub edge_handle_pixels: f64,
    /// Pointer travel below which a release counts as a click.
    pub slop_pixels: f64,
    /// How far past the current end of the timeline a clip may be dragged.
    pub drag_overflow_seconds: f64,
    /// Distance from a viewport edge at which auto-scroll kicks in.
    pub auto_scroll_edge_pixels: f64,
    /// Auto-scroll speed at full penetration, in pixels per frame.
    pub auto_scroll_max_speed: f64,
    /// Floor for resized clip durations; one frame when unset.
    pub min_clip_seconds: Option<f64>,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            edge_handle_pixels: 8.0,
            slop_pixels: 3.0,
            drag_overflow_seconds: 10.0,
            auto_scroll_edge_pixels: 40.0,
            auto_scroll_max_speed: 24.0,
            min_clip_seconds: None,
        }
    }
}

/// Persistence tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

/// Where caption text layers are anchored on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPlacement {
    Top,
    Center,
    Bottom,
}

/// Active caption styling used when deriving compositor text layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub placement: CaptionPlacement,
    pub font_family: String,
    pub font_size: f32,
    pub color: String,
    /// Styling strength in `[0, 1]`.
    pub intensity: f32,
    /// Text layers are suppressed at or below this intensity.
    pub min_intensity: f32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            placement: CaptionPlacement::Bottom,
            font_family: "Inter".to_string(),
            font_size: 42.0,
            color: "#ffffff".to_string(),
            intensity: 1.0,
            min_intensity: 0.05,
        }
    }
}

impl Default for CaptionPlacement {
    fn default() -> Self {
        Self::Bottom
    }
}

//! Editor tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds and step sizes used by the interaction layer.
///
/// Distances marked "screen" are in device pixels and are converted through
/// the camera before being compared with world geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Screen distance below which a press/release pair counts as a click.
    pub drag_threshold: f64,
    /// Squared screen distance below which a marquee counts as a background click.
    pub marquee_click_threshold_sq: f64,
    /// Maximum gap between two presses on the same text element to start editing.
    pub double_click_ms: u64,
    /// Created elements smaller than this (world units) in either dimension are discarded.
    pub min_create_size: f64,
    /// Floor for the selection box during resize.
    pub min_resize_size: f64,
    /// Cascade step for keyboard paste.
    pub paste_offset: f64,
    /// Screen size of resize handles.
    pub handle_size: f64,
    /// Screen tolerance for element hit-testing.
    pub hit_tolerance: f64,
    /// Zoom factor per wheel notch.
    pub zoom_step: f64,
    /// Arrow-key nudge in world units.
    pub nudge: f64,
    /// Arrow-key nudge with shift held.
    pub nudge_large: f64,
    /// Minimum time between autosaves.
    pub autosave_interval_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            marquee_click_threshold_sq: 25.0,
            double_click_ms: 300,
            min_create_size: 5.0,
            min_resize_size: 1.0,
            paste_offset: 20.0,
            handle_size: 8.0,
            hit_tolerance: 2.0,
            zoom_step: 1.1,
            nudge: 1.0,
            nudge_large: 10.0,
            autosave_interval_secs: 30,
        }
    }
}

impl EditorConfig {
    /// Parse a config, filling missing fields with defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}

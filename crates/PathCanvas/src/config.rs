//! # Configuration
//!
//! This module defines the configuration struct for the Editor.

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::history::CascadeUndo;

/// Configuration parameters for the Editor.
///
/// These settings allow the host application to tune the feel of the canvas
/// interactions. Missing fields fall back to their defaults when loaded from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Lower zoom bound. Default: 0.1.
    pub min_scale: f64,
    /// Upper zoom bound. Default: 5.0.
    pub max_scale: f64,
    /// Zoom factor per wheel step. Default: 1.1.
    pub zoom_step: f64,
    /// Screen pixels a press must travel before it counts as a drag. Default: 5.0.
    pub drag_threshold: f64,
    /// Maximum number of undoable commands. Default: 100.
    pub history_limit: usize,
    /// Node hit radius in canvas units. Default: 20.0.
    pub node_radius: f64,
    /// Distance from a path's segment that still counts as a hit. Default: 5.0.
    pub path_hit_tolerance: f64,
    /// What undoing a node deletion restores.
    pub cascade_undo: CascadeUndo,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_step: 1.1,
            drag_threshold: 5.0,
            history_limit: 100,
            node_radius: 20.0,
            path_hit_tolerance: 5.0,
            cascade_undo: CascadeUndo::NodeOnly,
        }
    }
}

impl CanvasConfig {
    /// Parses a config from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(EditorError::Validation(format!(
                "invalid zoom range [{}, {}]",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.zoom_step > 1.0) {
            return Err(EditorError::Validation(format!(
                "zoom_step must be greater than 1, got {}",
                self.zoom_step
            )));
        }
        if self.drag_threshold < 0.0 || self.node_radius <= 0.0 || self.path_hit_tolerance < 0.0 {
            return Err(EditorError::Validation(
                "distances must be non-negative".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(EditorError::Validation(
                "history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "history_limit": 10, "cascade_undo": "compound" }"#;
        let config = CanvasConfig::from_json_str(json).unwrap();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.cascade_undo, CascadeUndo::Compound);
        assert_eq!(config.zoom_step, 1.1);
        assert_eq!(config.drag_threshold, 5.0);
    }

    #[test]
    fn rejects_inverted_zoom_range() {
        let err = CanvasConfig::from_json_str(r#"{ "min_scale": 3.0, "max_scale": 2.0 }"#);
        assert!(matches!(err, Err(EditorError::Validation(_))));
    }
}

//! # Viewport System
//!
//! This module handles the canvas mathematics.
//! It provides utilities to transform between Canvas Space (where nodes live) and
//! Screen Space (the pixels of the host's drawing surface).

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;

/// The current camera state: where we are looking (pan) and how close (scale).
///
/// This is the persisted part of the view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal translation in screen pixels.
    pub x: f64,
    /// Vertical translation in screen pixels.
    pub y: f64,
    /// The scale factor.
    /// - 1.0 = 100% scale.
    /// - Greater than 1.0 = Zoomed In.
    /// - Less than 1.0 = Zoomed Out.
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn translation(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Converts a point from **Screen Space** to **Canvas Space**.
///
/// Formula: `Canvas = (Screen - Translation) / Scale`
pub fn screen_to_canvas(p: DVec2, viewport: &Viewport) -> DVec2 {
    (p - viewport.translation()) / viewport.scale
}

/// Converts a point from **Canvas Space** to **Screen Space**.
///
/// Formula: `Screen = (Canvas * Scale) + Translation`
pub fn canvas_to_screen(p: DVec2, viewport: &Viewport) -> DVec2 {
    p * viewport.scale + viewport.translation()
}

/// The View combines the Viewport with the zoom limits.
/// It is the single source of truth for coordinate conversions.
#[derive(Clone, Debug)]
pub struct View {
    viewport: Viewport,
    min_scale: f64,
    max_scale: f64,
    zoom_step: f64,
}

impl Default for View {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

impl View {
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            viewport: Viewport::default(),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_step: config.zoom_step,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replaces the viewport, clamping its scale into range.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Viewport {
            scale: self.clamp_scale(viewport.scale),
            ..viewport
        };
    }

    pub fn screen_to_canvas(&self, p: DVec2) -> DVec2 {
        screen_to_canvas(p, &self.viewport)
    }

    pub fn canvas_to_screen(&self, p: DVec2) -> DVec2 {
        canvas_to_screen(p, &self.viewport)
    }

    /// Zooms by `steps` wheel clicks around the screen point `anchor`.
    ///
    /// Positive steps zoom in. The canvas point under `anchor` stays under `anchor`.
    /// Returns `false` if the scale was already at its bound.
    pub fn zoom_at(&mut self, anchor: DVec2, steps: i32) -> bool {
        let old_scale = self.viewport.scale;
        let new_scale = self.clamp_scale(old_scale * self.zoom_step.powi(steps));
        if (new_scale - old_scale).abs() < f64::EPSILON {
            return false;
        }

        // 1. Where is the anchor in canvas space before zoom?
        let anchor_canvas = self.screen_to_canvas(anchor);

        // 2. Pick the translation that maps it back under the anchor.
        let translation = anchor - anchor_canvas * new_scale;
        self.viewport = Viewport {
            x: translation.x,
            y: translation.y,
            scale: new_scale,
        };
        true
    }

    /// Translates the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: DVec2) {
        self.viewport.x += delta.x;
        self.viewport.y += delta.y;
    }

    /// Back to identity.
    pub fn reset(&mut self) {
        self.viewport = Viewport::default();
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            1.0_f64.clamp(self.min_scale, self.max_scale)
        }
    }
}

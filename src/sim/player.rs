//! Player motion and scale animation

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::Settings;
use crate::clamp_lenient;
use crate::consts::*;

/// Motion tuning, usually taken from [`Settings`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionTuning {
    pub follow_gain: f32,
    pub entry_duration: f32,
    pub entry_amplitude: f32,
    pub entry_oscillations: f32,
    pub pulse_amplitude: f32,
    pub pulse_frequency: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for MotionTuning {
    fn from(s: &Settings) -> Self {
        Self {
            follow_gain: s.follow_gain,
            entry_duration: s.entry_duration,
            entry_amplitude: s.entry_amplitude,
            entry_oscillations: s.entry_oscillations,
            pulse_amplitude: s.pulse_amplitude,
            pulse_frequency: s.pulse_frequency,
        }
    }
}

/// The player's catcher
///
/// `x` is the horizontal center, `y` the top edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
    pub target_x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Composite render scale (entry x pulse)
    pub scale: f32,
    pub entry_elapsed: f32,
    pub pulse_elapsed: f32,
    canvas_width: f32,
    tuning: MotionTuning,
}

impl Player {
    pub fn new(canvas_width: f32, canvas_height: f32, tuning: MotionTuning) -> Self {
        let x = canvas_width / 2.0;
        let mut player = Self {
            x,
            target_x: x,
            y: canvas_height - PLAYER_HEIGHT - PLAYER_BOTTOM_MARGIN,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            scale: 1.0,
            entry_elapsed: 0.0,
            pulse_elapsed: 0.0,
            canvas_width,
            tuning,
        };
        player.scale = player.entry_scale() * player.pulse_scale();
        player
    }

    /// Set the follow target; clamped so the player stays on the canvas
    pub fn set_target(&mut self, x: f32) {
        if !x.is_finite() {
            return;
        }
        let half = self.width / 2.0;
        self.target_x = clamp_lenient(x, half, self.canvas_width - half);
    }

    /// Ease toward the target and advance the scale animations
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let blend = (dt * self.tuning.follow_gain).min(1.0);
        self.x += (self.target_x - self.x) * blend;

        self.entry_elapsed = (self.entry_elapsed + dt).min(self.tuning.entry_duration);
        self.pulse_elapsed += dt;
        self.scale = self.entry_scale() * self.pulse_scale();
    }

    /// One-shot settle: starts at 1 + amplitude, oscillates, and reaches
    /// exactly 1.0 only when the entry duration completes.
    pub fn entry_scale(&self) -> f32 {
        let duration = self.tuning.entry_duration;
        if duration <= 0.0 || self.entry_elapsed >= duration {
            return 1.0;
        }
        let t = self.entry_elapsed / duration;
        // Wobble factor stays within [0.5, 1] so the curve never dips to 1.0 early
        let wobble = 0.75 + 0.25 * (t * self.tuning.entry_oscillations * TAU).cos();
        1.0 + self.tuning.entry_amplitude * (1.0 - t) * wobble
    }

    /// Continuous pulse centered on 1.0
    pub fn pulse_scale(&self) -> f32 {
        1.0 + self.tuning.pulse_amplitude * (self.pulse_elapsed * self.tuning.pulse_frequency * TAU).sin()
    }

    pub fn entry_finished(&self) -> bool {
        self.entry_elapsed >= self.tuning.entry_duration
    }

    /// Unscaled collision rectangle
    pub fn rect(&self) -> Rect {
        Rect::new(self.x - self.width / 2.0, self.y, self.width, self.height)
    }

    /// Rectangle with the composite scale applied around its center
    pub fn render_rect(&self) -> Rect {
        let base = self.rect();
        Rect::centered(base.center(), Vec2::new(self.width, self.height) * self.scale)
    }
}

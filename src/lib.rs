//! Note Fall - falling-note rhythm game core
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (patterns, spawning, collisions, scoring)
//! - `editor`: Timeline editor for authoring note patterns
//! - `renderer`: Draw-request generation against an abstract surface
//! - `scene`: Scene driver and the play/editor scenes
//! - `persistence`: Pattern storage with fallback to built-in data
//! - `audio`: Audio collaborator seam with session liveness guards

pub mod audio;
pub mod editor;
pub mod error;
pub mod persistence;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod sim;

pub use error::{NoteFallError, Result};
pub use settings::{EffectsQuality, Settings};

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (logical pixels)
    pub const CANVAS_WIDTH: f32 = 400.0;
    pub const CANVAS_HEIGHT: f32 = 640.0;

    /// Number of lanes notes fall through
    pub const LANE_COUNT: usize = 4;
    /// Number of note type descriptors
    pub const NOTE_TYPE_COUNT: usize = 3;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 60.0;
    pub const PLAYER_HEIGHT: f32 = 60.0;
    /// Gap between player bottom and playfield bottom
    pub const PLAYER_BOTTOM_MARGIN: f32 = 80.0;

    /// Fallback generator period when a level has no pattern (seconds)
    pub const FALLBACK_SPAWN_INTERVAL: f32 = 0.8;

    /// Points for a hit when the type has no explicit value
    pub const DEFAULT_POINTS: u64 = 1;
    /// Points lost per miss (score floors at zero)
    pub const MISS_PENALTY: u64 = 1;

    /// Lifetime of floating hit/miss markers (seconds)
    pub const MARKER_LIFETIME: f32 = 0.6;

    /// Longest frame delta the scene driver forwards (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Time an ended session stays on screen before returning home (seconds)
    pub const RESULT_LINGER: f32 = 2.0;

    /// Editor defaults
    pub const EDITOR_PX_PER_SECOND: f32 = 50.0;
    pub const EDITOR_TAP_THRESHOLD_PX: f32 = 10.0;
    pub const EDITOR_NOTE_HEIGHT: f32 = 12.0;
    /// Pointer travel before a pressed note starts moving
    pub const EDITOR_DRAG_SLOP_PX: f32 = 4.0;
    pub const SCROLLBAR_WIDTH: f32 = 24.0;
    pub const SCROLLBAR_ARROW_HEIGHT: f32 = 24.0;
    pub const SCROLLBAR_MIN_HANDLE_HEIGHT: f32 = 30.0;
}

/// Round a time to the 2-decimal precision used for authored notes
#[inline]
pub fn round_time(t: f32) -> f32 {
    (t * 100.0).round() / 100.0
}

/// Clamp without panicking when the range is inverted (collapses to `min`)
#[inline]
pub fn clamp_lenient(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        min
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_time() {
        assert_eq!(round_time(1.234), 1.23);
        assert_eq!(round_time(1.235_1), 1.24);
        assert_eq!(round_time(0.0), 0.0);
    }

    #[test]
    fn test_clamp_lenient_inverted_range() {
        assert_eq!(clamp_lenient(5.0, 10.0, 2.0), 10.0);
        assert_eq!(clamp_lenient(5.0, 0.0, 2.0), 2.0);
    }
}

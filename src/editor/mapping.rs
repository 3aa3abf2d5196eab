//! Time <-> pixel <-> lane transforms for the timeline track

use glam::Vec2;

use crate::sim::Rect;

/// Maps between song time, track-local pixels and lanes
///
/// `time_at` and `local_y_at` are exact inverses for a fixed scale and offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineMapping {
    pub px_per_second: f32,
    pub scroll_offset_px: f32,
    /// Track viewport in canvas coordinates
    pub viewport: Rect,
    pub lane_count: usize,
    /// Song length (seconds)
    pub duration: f32,
}

impl TimelineMapping {
    /// Song time at a viewport-local y
    #[inline]
    pub fn time_at(&self, local_y: f32) -> f32 {
        (self.scroll_offset_px + local_y) / self.px_per_second
    }

    /// Viewport-local y of a song time
    #[inline]
    pub fn local_y_at(&self, time: f32) -> f32 {
        time * self.px_per_second - self.scroll_offset_px
    }

    pub fn lane_width(&self) -> f32 {
        self.viewport.size.x / self.lane_count.max(1) as f32
    }

    /// Lane under a viewport-local x, clamped to the valid range
    pub fn lane_at(&self, local_x: f32) -> usize {
        let last = self.lane_count.saturating_sub(1);
        let lane = (local_x / self.lane_width()).floor();
        if lane.is_nan() || lane < 0.0 {
            0
        } else {
            (lane as usize).min(last)
        }
    }

    /// Canvas point to viewport-local coordinates
    #[inline]
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        p - self.viewport.min
    }

    /// Canvas y of a song time
    pub fn canvas_y_at(&self, time: f32) -> f32 {
        self.viewport.min.y + self.local_y_at(time)
    }

    /// Left edge (canvas x) of a lane
    pub fn lane_x(&self, lane: usize) -> f32 {
        self.viewport.min.x + lane as f32 * self.lane_width()
    }

    pub fn timeline_height(&self) -> f32 {
        (self.duration * self.px_per_second).max(0.0)
    }

    pub fn max_scroll(&self) -> f32 {
        (self.timeline_height() - self.viewport.size.y).max(0.0)
    }

    pub fn clamp_scroll(&self, px: f32) -> f32 {
        if px.is_finite() {
            px.clamp(0.0, self.max_scroll())
        } else {
            0.0
        }
    }

    /// A pixel distance expressed in seconds at the current scale
    pub fn px_to_seconds(&self, px: f32) -> f32 {
        px / self.px_per_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> TimelineMapping {
        TimelineMapping {
            px_per_second: 50.0,
            scroll_offset_px: 100.0,
            viewport: Rect::new(0.0, 60.0, 376.0, 580.0),
            lane_count: 4,
            duration: 60.0,
        }
    }

    #[test]
    fn test_time_mapping_example() {
        let m = mapping();
        assert_eq!(m.time_at(150.0), 5.0);
        assert_eq!(m.local_y_at(5.0), 150.0);
    }

    #[test]
    fn test_lane_clamps() {
        let m = mapping();
        assert_eq!(m.lane_width(), 94.0);
        assert_eq!(m.lane_at(-5.0), 0);
        assert_eq!(m.lane_at(93.9), 0);
        assert_eq!(m.lane_at(94.0), 1);
        assert_eq!(m.lane_at(10_000.0), 3);
    }

    #[test]
    fn test_scroll_limits() {
        let m = mapping();
        assert_eq!(m.timeline_height(), 3000.0);
        assert_eq!(m.max_scroll(), 2420.0);
        assert_eq!(m.clamp_scroll(-10.0), 0.0);
        assert_eq!(m.clamp_scroll(9_999.0), 2420.0);

        let short = TimelineMapping { duration: 5.0, ..mapping() };
        assert_eq!(short.max_scroll(), 0.0);
    }

    #[test]
    fn test_to_local() {
        let m = mapping();
        assert_eq!(m.to_local(Vec2::new(10.0, 70.0)), Vec2::new(10.0, 10.0));
        assert_eq!(m.canvas_y_at(5.0), 210.0);
    }
}

//! Vertical scroll bar geometry
//!
//! Layout, top to bottom: up arrow, handle track, down arrow.

use glam::Vec2;

use crate::sim::Rect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollBar {
    /// Whole bar including both arrows (canvas coordinates)
    pub bounds: Rect,
    pub arrow_height: f32,
    pub min_handle_height: f32,
}

impl ScrollBar {
    pub fn up_arrow(&self) -> Rect {
        Rect::new(self.bounds.min.x, self.bounds.min.y, self.bounds.size.x, self.arrow_height)
    }

    pub fn down_arrow(&self) -> Rect {
        let max = self.bounds.max();
        Rect::new(self.bounds.min.x, max.y - self.arrow_height, self.bounds.size.x, self.arrow_height)
    }

    /// Height available to the handle between the arrows
    pub fn inner_height(&self) -> f32 {
        (self.bounds.size.y - 2.0 * self.arrow_height).max(0.0)
    }

    /// `max(min, viewport/timeline * inner)`, never taller than the inner track
    pub fn handle_height(&self, viewport_height: f32, timeline_height: f32) -> f32 {
        let ratio = if timeline_height > 0.0 {
            (viewport_height / timeline_height).min(1.0)
        } else {
            1.0
        };
        let inner = self.inner_height();
        (ratio * inner).max(self.min_handle_height).min(inner)
    }

    /// Valid range for the handle's top edge
    pub fn handle_range(&self, handle_height: f32) -> (f32, f32) {
        let min_y = self.bounds.min.y + self.arrow_height;
        let max_y = self.bounds.min.y + self.bounds.size.y - self.arrow_height - handle_height;
        (min_y, max_y.max(min_y))
    }

    /// Handle top for a scroll offset
    pub fn handle_y(&self, scroll: f32, max_scroll: f32, handle_height: f32) -> f32 {
        let (min_y, max_y) = self.handle_range(handle_height);
        if max_scroll <= 0.0 {
            return min_y;
        }
        min_y + (scroll / max_scroll).clamp(0.0, 1.0) * (max_y - min_y)
    }

    /// Scroll offset for a requested handle top (clamped into range)
    pub fn scroll_for_handle_y(&self, handle_y: f32, max_scroll: f32, handle_height: f32) -> f32 {
        let (min_y, max_y) = self.handle_range(handle_height);
        let range = max_y - min_y;
        if range <= 0.0 || max_scroll <= 0.0 {
            return 0.0;
        }
        let y = handle_y.clamp(min_y, max_y);
        (y - min_y) / range * max_scroll
    }

    pub fn handle_rect(&self, scroll: f32, max_scroll: f32, handle_height: f32) -> Rect {
        Rect {
            min: Vec2::new(self.bounds.min.x, self.handle_y(scroll, max_scroll, handle_height)),
            size: Vec2::new(self.bounds.size.x, handle_height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> ScrollBar {
        ScrollBar {
            bounds: Rect::new(376.0, 60.0, 24.0, 580.0),
            arrow_height: 24.0,
            min_handle_height: 30.0,
        }
    }

    #[test]
    fn test_handle_height() {
        let bar = bar();
        assert_eq!(bar.inner_height(), 532.0);
        // 580 / 3000 * 532 = 102.85..
        let h = bar.handle_height(580.0, 3000.0);
        assert!((h - 580.0 / 3000.0 * 532.0).abs() < 1e-3);
        assert_eq!(bar.handle_height(580.0, 100_000.0), 30.0);
        assert_eq!(bar.handle_height(580.0, 100.0), 532.0);
    }

    #[test]
    fn test_handle_mapping_endpoints() {
        let bar = bar();
        let h = 100.0;
        let (min_y, max_y) = bar.handle_range(h);
        assert_eq!(min_y, 84.0);
        assert_eq!(max_y, 60.0 + 580.0 - 24.0 - 100.0);
        assert_eq!(bar.scroll_for_handle_y(min_y - 50.0, 2000.0, h), 0.0);
        assert_eq!(bar.scroll_for_handle_y(max_y + 50.0, 2000.0, h), 2000.0);
        assert_eq!(bar.handle_y(2000.0, 2000.0, h), max_y);
        assert_eq!(bar.handle_y(0.0, 0.0, h), min_y);
    }

    #[test]
    fn test_arrows() {
        let bar = bar();
        assert_eq!(bar.up_arrow(), Rect::new(376.0, 60.0, 24.0, 24.0));
        assert_eq!(bar.down_arrow(), Rect::new(376.0, 616.0, 24.0, 24.0));
    }
}

//! Rendering seam
//!
//! The core never talks to a drawing API directly. It computes geometry and
//! color and issues requests against [`RenderSurface`]; hosts implement the
//! trait for their canvas. [`CommandList`] records requests for replay or tests.

pub mod shapes;

use glam::Vec2;

pub use shapes::{draw_editor, draw_session};

use crate::sim::Rect;

pub type Color = [f32; 4];

/// Colors for game elements
pub mod colors {
    use super::Color;

    pub const BACKGROUND: Color = [0.04, 0.03, 0.1, 1.0];
    pub const PLAYER: Color = [1.0, 0.85, 0.3, 1.0];
    pub const HIT_TEXT: Color = [0.4, 1.0, 0.5, 1.0];
    pub const MISS_TEXT: Color = [1.0, 0.35, 0.35, 1.0];
    pub const HUD_TEXT: Color = [1.0, 1.0, 1.0, 1.0];
    pub const LANE_DIVIDER: Color = [1.0, 1.0, 1.0, 0.08];
    pub const GRID_LINE: Color = [1.0, 1.0, 1.0, 0.15];
    pub const SCROLL_TRACK: Color = [1.0, 1.0, 1.0, 0.1];
    pub const SCROLL_HANDLE: Color = [1.0, 1.0, 1.0, 0.5];
    pub const SCROLL_ARROW: Color = [1.0, 1.0, 1.0, 0.3];
    pub const DRAG_OUTLINE: Color = [1.0, 1.0, 1.0, 1.0];
}

/// Multiply a color's alpha
#[inline]
pub fn with_alpha(color: Color, alpha: f32) -> Color {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// Text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Drawing primitives the host must provide
pub trait RenderSurface {
    fn clear(&mut self, color: Color);
    /// Filled rectangle rotated by `rotation` radians about its center
    fn fill_rect(&mut self, rect: Rect, rotation: f32, color: Color);
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color);
    fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color);
    fn text(&mut self, text: &str, pos: Vec2, size: f32, align: TextAlign, color: Color);
}

/// A recorded draw request
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    FillRect { rect: Rect, rotation: f32, color: Color },
    FillRoundedRect { rect: Rect, radius: f32, color: Color },
    StrokeRect { rect: Rect, width: f32, color: Color },
    FillCircle { center: Vec2, radius: f32, color: Color },
    StrokeCircle { center: Vec2, radius: f32, width: f32, color: Color },
    Text { text: String, pos: Vec2, size: f32, align: TextAlign, color: Color },
}

/// Surface that records every request
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    pub commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Replay onto another surface
    pub fn replay(&self, surface: &mut dyn RenderSurface) {
        for command in &self.commands {
            match command.clone() {
                DrawCommand::Clear(color) => surface.clear(color),
                DrawCommand::FillRect { rect, rotation, color } => surface.fill_rect(rect, rotation, color),
                DrawCommand::FillRoundedRect { rect, radius, color } => {
                    surface.fill_rounded_rect(rect, radius, color)
                }
                DrawCommand::StrokeRect { rect, width, color } => surface.stroke_rect(rect, width, color),
                DrawCommand::FillCircle { center, radius, color } => surface.fill_circle(center, radius, color),
                DrawCommand::StrokeCircle {
                    center,
                    radius,
                    width,
                    color,
                } => surface.stroke_circle(center, radius, width, color),
                DrawCommand::Text {
                    text,
                    pos,
                    size,
                    align,
                    color,
                } => surface.text(&text, pos, size, align, color),
            }
        }
    }
}

impl RenderSurface for CommandList {
    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, rotation: f32, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, rotation, color });
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillRoundedRect { rect, radius, color });
    }

    fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color) {
        self.commands.push(DrawCommand::StrokeRect { rect, width, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            width,
            color,
        });
    }

    fn text(&mut self, text: &str, pos: Vec2, size: f32, align: TextAlign, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            size,
            align,
            color,
        });
    }
}

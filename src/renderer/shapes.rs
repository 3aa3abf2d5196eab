//! Draw-request builders for the play session and the editor

use glam::Vec2;

use super::{RenderSurface, TextAlign, colors, with_alpha};
use crate::consts::*;
use crate::editor::{DragState, HEADER_HEIGHT, PALETTE_RADIUS, TimelineEditor, done_button, palette_center};
use crate::sim::{EffectKind, FallingEntity, GameState, MarkerKind, NOTE_TYPES, Rect, note_type};

/// Draw one falling entity according to its effect kind
fn draw_entity(entity: &FallingEntity, surface: &mut dyn RenderSurface) {
    let kind = entity.kind();
    let size = entity.size * entity.scale();
    let rect = Rect::centered(entity.pos, Vec2::splat(size));
    let color = with_alpha(kind.color, entity.alpha());

    match kind.effect {
        EffectKind::Rotate => surface.fill_rect(rect, entity.rotation(), color),
        EffectKind::Pulse => surface.fill_circle(entity.pos, size / 2.0, color),
        EffectKind::Fade => surface.fill_rounded_rect(rect, size * 0.25, color),
    }
}

/// Full frame for a running (or ended) session
pub fn draw_session(state: &GameState, surface: &mut dyn RenderSurface) {
    surface.clear(colors::BACKGROUND);

    // Lane dividers
    let lane_width = state.canvas_width / LANE_COUNT as f32;
    for lane in 1..LANE_COUNT {
        let x = lane as f32 * lane_width;
        surface.fill_rect(Rect::new(x - 0.5, 0.0, 1.0, state.canvas_height), 0.0, colors::LANE_DIVIDER);
    }

    for entity in &state.entities {
        draw_entity(entity, surface);
    }

    for particle in &state.particles {
        surface.fill_circle(particle.pos, particle.size, with_alpha(particle.color, particle.life));
    }

    let player = state.player.render_rect();
    surface.fill_rounded_rect(player, player.size.x * 0.2, colors::PLAYER);

    for marker in &state.markers {
        let (text, color) = match marker.kind {
            MarkerKind::Hit => ("HIT", colors::HIT_TEXT),
            MarkerKind::Miss => ("MISS", colors::MISS_TEXT),
        };
        surface.text(text, marker.pos, 18.0, TextAlign::Center, with_alpha(color, marker.alpha()));
    }

    // HUD
    surface.text(
        &format!("Score {}", state.score.score),
        Vec2::new(12.0, 28.0),
        20.0,
        TextAlign::Left,
        colors::HUD_TEXT,
    );
    surface.text(
        &format!("Miss {}", state.score.misses),
        Vec2::new(state.canvas_width - 12.0, 28.0),
        20.0,
        TextAlign::Right,
        colors::HUD_TEXT,
    );
    if state.is_over() {
        surface.text(
            "FINISHED",
            Vec2::new(state.canvas_width / 2.0, state.canvas_height / 2.0),
            36.0,
            TextAlign::Center,
            colors::HUD_TEXT,
        );
    }
}

/// Full frame for the timeline editor
pub fn draw_editor(editor: &TimelineEditor, surface: &mut dyn RenderSurface) {
    surface.clear(colors::BACKGROUND);
    let mapping = editor.mapping();
    let viewport = mapping.viewport;

    for lane in 1..LANE_COUNT {
        let x = mapping.lane_x(lane);
        surface.fill_rect(Rect::new(x - 0.5, viewport.min.y, 1.0, viewport.size.y), 0.0, colors::LANE_DIVIDER);
    }

    for (second, y) in editor.second_marks() {
        surface.fill_rect(Rect::new(viewport.min.x, y, viewport.size.x, 1.0), 0.0, colors::GRID_LINE);
        surface.text(
            &format!("{}s", second),
            Vec2::new(viewport.min.x + 4.0, y - 2.0),
            10.0,
            TextAlign::Left,
            colors::GRID_LINE,
        );
    }

    let dragging = match editor.drag_state() {
        DragState::DraggingNote { index, .. } => Some(index),
        _ => None,
    };
    for (index, rect) in editor.visible_notes() {
        let Some(note) = editor.pattern().get(index) else {
            continue;
        };
        surface.fill_rounded_rect(rect, 3.0, note_type(note.note_type).color);
        if dragging == Some(index) {
            surface.stroke_rect(rect, 2.0, colors::DRAG_OUTLINE);
        }
    }

    // Scroll bar
    let bar = editor.scrollbar();
    surface.fill_rect(bar.bounds, 0.0, colors::SCROLL_TRACK);
    surface.fill_rect(bar.up_arrow(), 0.0, colors::SCROLL_ARROW);
    surface.fill_rect(bar.down_arrow(), 0.0, colors::SCROLL_ARROW);
    surface.fill_rounded_rect(editor.handle_rect(), bar.bounds.size.x / 2.0, colors::SCROLL_HANDLE);

    // Header: type palette (selected outlined), note count, done button
    for (i, ty) in NOTE_TYPES.iter().enumerate() {
        let center = palette_center(i);
        surface.fill_circle(center, PALETTE_RADIUS, ty.color);
        if i == editor.selected_type() {
            surface.stroke_circle(center, PALETTE_RADIUS + 4.0, 2.0, colors::DRAG_OUTLINE);
        }
    }
    let header_mid = HEADER_HEIGHT / 2.0;
    surface.text(
        &format!("{} notes", editor.pattern().len()),
        Vec2::new(CANVAS_WIDTH / 2.0, header_mid),
        14.0,
        TextAlign::Center,
        colors::HUD_TEXT,
    );
    let done = done_button();
    surface.fill_rounded_rect(done, 6.0, colors::SCROLL_HANDLE);
    surface.text("Done", done.center(), 14.0, TextAlign::Center, colors::HUD_TEXT);
}

//! Timeline editor
//!
//! Authoring view over one mutable pattern copy. The track shows time running
//! downward; each lane is a column. Input is three pointer calls; at most one
//! drag mode is active at a time and a new drag can only begin from idle.
//!
//! Pressing an existing note arms a drag. The note only moves once the pointer
//! travels past a small slop distance; releasing without moving is a tap and
//! deletes the note. Pressing empty track toggles: an existing note in the
//! same lane within the tap threshold is removed, otherwise one is inserted.

pub mod mapping;
pub mod scrollbar;

use glam::Vec2;

pub use mapping::TimelineMapping;
pub use scrollbar::ScrollBar;

use crate::consts::*;
use crate::sim::{NoteEvent, Pattern, Rect};
use crate::{Settings, round_time};

/// Pointer interaction mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// A note was pressed; `moved` flips once the pointer leaves the slop radius
    DraggingNote { index: usize, origin: Vec2, moved: bool },
    /// Offset between pointer y and handle top at grab time
    DraggingScrollHandle { grab_offset: f32 },
}

/// What a pointer call did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorAction {
    None,
    Inserted(usize),
    Deleted(NoteEvent),
    NotePressed(usize),
    NoteMoved(usize),
    NoteDropped,
    HandleGrabbed,
    Scrolled,
    /// A drag referenced a note that no longer exists
    DragAborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Height of the header strip above the track (palette, done button)
pub const HEADER_HEIGHT: f32 = 60.0;
pub const PALETTE_RADIUS: f32 = 12.0;

/// Center of the palette swatch for a note type
pub fn palette_center(note_type: usize) -> Vec2 {
    Vec2::new(24.0 + note_type as f32 * 40.0, HEADER_HEIGHT / 2.0)
}

/// Palette swatch under a canvas point
pub fn palette_at(p: Vec2) -> Option<usize> {
    (0..NOTE_TYPE_COUNT).find(|&i| palette_center(i).distance(p) <= PALETTE_RADIUS)
}

/// Header button that leaves the editor
pub fn done_button() -> Rect {
    Rect::new(CANVAS_WIDTH - 80.0, 12.0, 68.0, HEADER_HEIGHT - 24.0)
}

/// Default editor layout: a header strip, the track, and a scroll bar on the right
pub fn default_layout() -> (Rect, ScrollBar) {
    let header = HEADER_HEIGHT;
    let viewport = Rect::new(0.0, header, CANVAS_WIDTH - SCROLLBAR_WIDTH, CANVAS_HEIGHT - header);
    let scrollbar = ScrollBar {
        bounds: Rect::new(CANVAS_WIDTH - SCROLLBAR_WIDTH, header, SCROLLBAR_WIDTH, CANVAS_HEIGHT - header),
        arrow_height: SCROLLBAR_ARROW_HEIGHT,
        min_handle_height: SCROLLBAR_MIN_HANDLE_HEIGHT,
    };
    (viewport, scrollbar)
}

/// Editor session over one pattern
#[derive(Debug, Clone)]
pub struct TimelineEditor {
    pattern: Pattern,
    mapping: TimelineMapping,
    scrollbar: ScrollBar,
    selected_type: usize,
    drag: DragState,
    tap_threshold_px: f32,
    note_height: f32,
    dirty: bool,
}

impl TimelineEditor {
    pub fn new(pattern: Pattern, duration: f32, settings: &Settings) -> Self {
        let (viewport, mut scrollbar) = default_layout();
        scrollbar.min_handle_height = settings.min_handle_height;
        Self::with_layout(pattern, duration, settings, viewport, scrollbar)
    }

    pub fn with_layout(
        mut pattern: Pattern,
        duration: f32,
        settings: &Settings,
        viewport: Rect,
        scrollbar: ScrollBar,
    ) -> Self {
        pattern.sort();
        Self {
            pattern,
            mapping: TimelineMapping {
                px_per_second: settings.px_per_second,
                scroll_offset_px: 0.0,
                viewport,
                lane_count: LANE_COUNT,
                duration: duration.max(0.0),
            },
            scrollbar,
            selected_type: 0,
            drag: DragState::Idle,
            tap_threshold_px: settings.tap_threshold_px,
            note_height: EDITOR_NOTE_HEIGHT,
            dirty: false,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn mapping(&self) -> &TimelineMapping {
        &self.mapping
    }

    pub fn scrollbar(&self) -> &ScrollBar {
        &self.scrollbar
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn duration(&self) -> f32 {
        self.mapping.duration
    }

    pub fn scroll_offset(&self) -> f32 {
        self.mapping.scroll_offset_px
    }

    pub fn selected_type(&self) -> usize {
        self.selected_type
    }

    /// Whether the pattern changed since load or the last `mark_saved`
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Type used for newly inserted notes (out-of-range falls back to 0)
    pub fn set_selected_type(&mut self, note_type: usize) {
        self.selected_type = if note_type < NOTE_TYPE_COUNT { note_type } else { 0 };
    }

    /// Tap threshold in seconds at the current scale
    pub fn threshold_seconds(&self) -> f32 {
        self.mapping.px_to_seconds(self.tap_threshold_px)
    }

    // === Scrolling ===

    pub fn set_scroll(&mut self, px: f32) {
        self.mapping.scroll_offset_px = self.mapping.clamp_scroll(px);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.set_scroll(self.mapping.scroll_offset_px + delta);
    }

    /// Move by half a viewport
    pub fn scroll_step(&mut self, direction: ScrollDirection) {
        let step = self.mapping.viewport.size.y / 2.0;
        match direction {
            ScrollDirection::Up => self.scroll_by(-step),
            ScrollDirection::Down => self.scroll_by(step),
        }
    }

    pub fn handle_height(&self) -> f32 {
        self.scrollbar
            .handle_height(self.mapping.viewport.size.y, self.mapping.timeline_height())
    }

    pub fn handle_rect(&self) -> Rect {
        self.scrollbar.handle_rect(
            self.mapping.scroll_offset_px,
            self.mapping.max_scroll(),
            self.handle_height(),
        )
    }

    /// Change zoom, keeping the time at the top of the viewport in place
    pub fn set_px_per_second(&mut self, px_per_second: f32) {
        if !px_per_second.is_finite() || px_per_second <= 0.0 {
            return;
        }
        let top_time = self.mapping.time_at(0.0);
        self.mapping.px_per_second = px_per_second;
        self.set_scroll(top_time * px_per_second);
    }

    // === Pattern lifecycle ===

    /// Swap in a new pattern (e.g. song switch); any active drag is aborted
    pub fn replace_pattern(&mut self, mut pattern: Pattern, duration: f32) {
        if self.drag != DragState::Idle {
            log::debug!("Aborting drag on pattern replacement");
        }
        pattern.sort();
        self.pattern = pattern;
        self.mapping.duration = duration.max(0.0);
        self.mapping.scroll_offset_px = 0.0;
        self.drag = DragState::Idle;
        self.dirty = false;
    }

    /// Sorted copy of the pattern for export/persistence
    pub fn export(&self) -> Pattern {
        let mut pattern = self.pattern.clone();
        pattern.sort();
        pattern
    }

    // === Geometry ===

    /// Bounding box of a note in canvas coordinates
    pub fn note_rect(&self, index: usize) -> Option<Rect> {
        let note = self.pattern.get(index)?;
        let lane = note.lane.min(LANE_COUNT - 1);
        let pad = 2.0;
        Some(Rect::new(
            self.mapping.lane_x(lane) + pad,
            self.mapping.canvas_y_at(note.time) - self.note_height / 2.0,
            self.mapping.lane_width() - 2.0 * pad,
            self.note_height,
        ))
    }

    /// Notes whose box intersects the viewport, with their boxes
    pub fn visible_notes(&self) -> Vec<(usize, Rect)> {
        (0..self.pattern.len())
            .filter_map(|i| self.note_rect(i).map(|r| (i, r)))
            .filter(|(_, r)| r.intersects(&self.mapping.viewport))
            .collect()
    }

    /// Topmost visible note under a canvas point
    pub fn note_at(&self, p: Vec2) -> Option<usize> {
        self.visible_notes()
            .into_iter()
            .rev()
            .find(|(_, r)| r.contains(p))
            .map(|(i, _)| i)
    }

    /// Whole seconds visible in the viewport with their canvas y
    pub fn second_marks(&self) -> Vec<(u32, f32)> {
        let first = self.mapping.time_at(0.0).max(0.0).ceil() as u32;
        let last = self
            .mapping
            .time_at(self.mapping.viewport.size.y)
            .min(self.mapping.duration)
            .floor();
        if last < 0.0 {
            return Vec::new();
        }
        (first..=last as u32)
            .map(|s| (s, self.mapping.canvas_y_at(s as f32)))
            .collect()
    }

    // === Authoring operations ===

    /// Toggle at a viewport-local point: delete a nearby note or insert one
    ///
    /// Taps past the end of the song (beyond the threshold) do nothing; taps
    /// just past it act on the end time for both lookup and insertion.
    pub fn toggle_at(&mut self, local: Vec2) -> EditorAction {
        let threshold = self.threshold_seconds();
        let raw = self.mapping.time_at(local.y);
        if raw > self.mapping.duration + threshold {
            return EditorAction::None;
        }
        let time = raw.clamp(0.0, self.mapping.duration);
        let lane = self.mapping.lane_at(local.x);

        if let Some(index) = self.pattern.find_near(lane, time, threshold) {
            return match self.pattern.remove(index) {
                Some(note) => {
                    self.dirty = true;
                    log::debug!("Deleted note at {:.2}s lane {}", note.time, note.lane);
                    EditorAction::Deleted(note)
                }
                None => EditorAction::None,
            };
        }

        let time = round_time(time);
        let index = self
            .pattern
            .insert(NoteEvent::new(time, lane, self.selected_type));
        self.dirty = true;
        log::debug!("Inserted note at {:.2}s lane {}", time, lane);
        EditorAction::Inserted(index)
    }

    // === Pointer state machine ===

    pub fn pointer_down(&mut self, x: f32, y: f32) -> EditorAction {
        if self.drag != DragState::Idle {
            return EditorAction::None;
        }
        let p = Vec2::new(x, y);

        let handle = self.handle_rect();
        if handle.contains(p) {
            self.drag = DragState::DraggingScrollHandle {
                grab_offset: y - handle.min.y,
            };
            return EditorAction::HandleGrabbed;
        }
        if self.scrollbar.up_arrow().contains(p) {
            self.scroll_step(ScrollDirection::Up);
            return EditorAction::Scrolled;
        }
        if self.scrollbar.down_arrow().contains(p) {
            self.scroll_step(ScrollDirection::Down);
            return EditorAction::Scrolled;
        }

        if !self.mapping.viewport.contains(p) {
            return EditorAction::None;
        }
        if let Some(index) = self.note_at(p) {
            self.drag = DragState::DraggingNote {
                index,
                origin: p,
                moved: false,
            };
            return EditorAction::NotePressed(index);
        }
        self.toggle_at(self.mapping.to_local(p))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> EditorAction {
        let p = Vec2::new(x, y);
        match self.drag {
            DragState::Idle => EditorAction::None,
            DragState::DraggingNote { index, origin, moved } => {
                if index >= self.pattern.len() {
                    self.drag = DragState::Idle;
                    return EditorAction::DragAborted;
                }
                if !moved && p.distance(origin) < EDITOR_DRAG_SLOP_PX {
                    return EditorAction::None;
                }
                self.drag = DragState::DraggingNote {
                    index,
                    origin,
                    moved: true,
                };

                let local = self.mapping.to_local(p);
                let time = round_time(self.mapping.time_at(local.y).clamp(0.0, self.mapping.duration));
                let lane = self.mapping.lane_at(local.x);
                if let Some(note) = self.pattern.get_mut(index) {
                    note.time = time;
                    note.lane = lane;
                    self.dirty = true;
                }
                EditorAction::NoteMoved(index)
            }
            DragState::DraggingScrollHandle { grab_offset } => {
                let handle_height = self.handle_height();
                let scroll = self.scrollbar.scroll_for_handle_y(
                    y - grab_offset,
                    self.mapping.max_scroll(),
                    handle_height,
                );
                self.set_scroll(scroll);
                EditorAction::Scrolled
            }
        }
    }

    pub fn pointer_up(&mut self, _x: f32, _y: f32) -> EditorAction {
        let drag = std::mem::replace(&mut self.drag, DragState::Idle);
        match drag {
            DragState::Idle | DragState::DraggingScrollHandle { .. } => EditorAction::None,
            DragState::DraggingNote { index, moved, .. } => {
                if index >= self.pattern.len() {
                    return EditorAction::DragAborted;
                }
                if moved {
                    self.pattern.sort();
                    EditorAction::NoteDropped
                } else {
                    match self.pattern.remove(index) {
                        Some(note) => {
                            self.dirty = true;
                            log::debug!("Deleted note at {:.2}s lane {}", note.time, note.lane);
                            EditorAction::Deleted(note)
                        }
                        None => EditorAction::None,
                    }
                }
            }
        }
    }
}

//! Falling note entities and their type descriptors

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::pattern::NoteEvent;
use crate::consts::*;

/// Per-type animation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Continuous spin
    Rotate,
    /// Breathing size oscillation
    Pulse,
    /// Alpha oscillating between faint and opaque
    Fade,
}

/// Mutable animation phase carried by an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimPhase {
    Rotate { angle: f32 },
    Pulse { phase: f32 },
    Fade { alpha: f32, rising: bool },
}

/// Signature of a per-kind animation step
pub type AnimUpdate = fn(&mut AnimPhase, f32);

const ROTATE_SPEED: f32 = 3.0; // radians per second
const PULSE_SPEED: f32 = 6.0; // radians of phase per second
const PULSE_AMPLITUDE: f32 = 0.15;
const FADE_SPEED: f32 = 1.5; // alpha per second
const FADE_MIN_ALPHA: f32 = 0.3;

fn update_rotate(phase: &mut AnimPhase, dt: f32) {
    if let AnimPhase::Rotate { angle } = phase {
        *angle = (*angle + ROTATE_SPEED * dt) % TAU;
    }
}

fn update_pulse(phase: &mut AnimPhase, dt: f32) {
    if let AnimPhase::Pulse { phase: p } = phase {
        *p = (*p + PULSE_SPEED * dt) % TAU;
    }
}

fn update_fade(phase: &mut AnimPhase, dt: f32) {
    if let AnimPhase::Fade { alpha, rising } = phase {
        if *rising {
            *alpha += FADE_SPEED * dt;
            if *alpha >= 1.0 {
                *alpha = 1.0;
                *rising = false;
            }
        } else {
            *alpha -= FADE_SPEED * dt;
            if *alpha <= FADE_MIN_ALPHA {
                *alpha = FADE_MIN_ALPHA;
                *rising = true;
            }
        }
    }
}

impl EffectKind {
    /// Animation phase for a freshly spawned entity
    pub fn initial_phase(self) -> AnimPhase {
        match self {
            EffectKind::Rotate => AnimPhase::Rotate { angle: 0.0 },
            EffectKind::Pulse => AnimPhase::Pulse { phase: 0.0 },
            EffectKind::Fade => AnimPhase::Fade {
                alpha: 1.0,
                rising: false,
            },
        }
    }

    /// Update function for this kind
    pub fn updater(self) -> AnimUpdate {
        match self {
            EffectKind::Rotate => update_rotate,
            EffectKind::Pulse => update_pulse,
            EffectKind::Fade => update_fade,
        }
    }
}

/// Immutable note type descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteType {
    pub name: &'static str,
    pub color: [f32; 4],
    pub effect: EffectKind,
    /// Fall speed (pixels/second)
    pub speed: f32,
    /// Edge length of the square entity
    pub size: f32,
    /// Points on hit; `None` uses the configured default
    pub points: Option<u64>,
}

/// Note type table, indexed by `NoteEvent::note_type`
pub static NOTE_TYPES: [NoteType; NOTE_TYPE_COUNT] = [
    NoteType {
        name: "spinner",
        color: [0.35, 0.75, 1.0, 1.0],
        effect: EffectKind::Rotate,
        speed: 220.0,
        size: 40.0,
        points: None,
    },
    NoteType {
        name: "heart",
        color: [1.0, 0.4, 0.6, 1.0],
        effect: EffectKind::Pulse,
        speed: 260.0,
        size: 36.0,
        points: Some(2),
    },
    NoteType {
        name: "ghost",
        color: [0.75, 0.6, 1.0, 1.0],
        effect: EffectKind::Fade,
        speed: 300.0,
        size: 32.0,
        points: Some(3),
    },
];

/// Resolve a type index, falling back to type 0 when out of range
pub fn note_type(index: usize) -> &'static NoteType {
    NOTE_TYPES.get(index).unwrap_or(&NOTE_TYPES[0])
}

/// Horizontal center of a lane
pub fn lane_center(lane: usize, canvas_width: f32) -> f32 {
    let lane = lane.min(LANE_COUNT - 1);
    (lane as f32 + 0.5) * canvas_width / LANE_COUNT as f32
}

/// A live falling note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingEntity {
    pub id: u32,
    /// Center position
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    pub note_type: usize,
    pub anim: AnimPhase,
}

impl FallingEntity {
    /// Instantiate from an emitted event, bottom edge at the playfield top
    pub fn from_event(id: u32, event: &NoteEvent, x: f32) -> Self {
        let ty = note_type(event.note_type);
        Self {
            id,
            pos: Vec2::new(x, -ty.size / 2.0),
            size: ty.size,
            speed: ty.speed,
            note_type: event.note_type,
            anim: ty.effect.initial_phase(),
        }
    }

    pub fn kind(&self) -> &'static NoteType {
        note_type(self.note_type)
    }

    /// Fall and animate
    pub fn advance(&mut self, dt: f32) {
        self.pos.y += self.speed * dt;
        (self.kind().effect.updater())(&mut self.anim, dt);
    }

    /// Collision rectangle (unscaled)
    pub fn rect(&self) -> Rect {
        Rect::centered(self.pos, Vec2::splat(self.size))
    }

    /// Bottom (leading) edge y
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size / 2.0
    }

    /// Render scale from the pulse animation
    pub fn scale(&self) -> f32 {
        match self.anim {
            AnimPhase::Pulse { phase } => 1.0 + PULSE_AMPLITUDE * phase.sin(),
            _ => 1.0,
        }
    }

    pub fn rotation(&self) -> f32 {
        match self.anim {
            AnimPhase::Rotate { angle } => angle,
            _ => 0.0,
        }
    }

    pub fn alpha(&self) -> f32 {
        match self.anim {
            AnimPhase::Fade { alpha, .. } => alpha,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_type_falls_back() {
        assert_eq!(note_type(99), &NOTE_TYPES[0]);
        let entity = FallingEntity::from_event(1, &NoteEvent::new(0.0, 0, 99), 50.0);
        assert_eq!(entity.kind().effect, EffectKind::Rotate);
        assert_eq!(entity.size, NOTE_TYPES[0].size);
    }

    #[test]
    fn test_spawn_above_playfield() {
        let entity = FallingEntity::from_event(1, &NoteEvent::new(0.0, 2, 1), 250.0);
        assert_eq!(entity.bottom(), 0.0);
        assert_eq!(entity.pos.x, 250.0);
    }

    #[test]
    fn test_advance_moves_down_and_animates() {
        let mut entity = FallingEntity::from_event(1, &NoteEvent::new(0.0, 0, 0), 50.0);
        let y = entity.pos.y;
        entity.advance(0.5);
        assert!((entity.pos.y - (y + entity.speed * 0.5)).abs() < 1e-4);
        assert!(entity.rotation() > 0.0);
    }

    #[test]
    fn test_fade_bounces_between_limits() {
        let mut phase = EffectKind::Fade.initial_phase();
        let update = EffectKind::Fade.updater();
        for _ in 0..200 {
            update(&mut phase, 0.05);
            if let AnimPhase::Fade { alpha, .. } = phase {
                assert!((FADE_MIN_ALPHA..=1.0).contains(&alpha));
            }
        }
    }

    #[test]
    fn test_updater_ignores_mismatched_phase() {
        let mut phase = AnimPhase::Pulse { phase: 1.0 };
        (EffectKind::Rotate.updater())(&mut phase, 1.0);
        assert_eq!(phase, AnimPhase::Pulse { phase: 1.0 });
    }

    #[test]
    fn test_lane_center() {
        assert_eq!(lane_center(0, 400.0), 50.0);
        assert_eq!(lane_center(3, 400.0), 350.0);
        assert_eq!(lane_center(17, 400.0), 350.0);
    }
}

//! Collision detection and scoring
//!
//! Axis-aligned rectangles only. A frame's resolution tests every live entity
//! once against the player, then checks the lower boundary, then removes
//! everything resolved.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::FallingEntity;

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size / 2.0,
            size,
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }

    /// Half-open overlap test: both axis projections must overlap with
    /// nonzero extent, so rectangles that only touch do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.size.x <= 0.0 || self.size.y <= 0.0 || other.size.x <= 0.0 || other.size.y <= 0.0 {
            return false;
        }
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x && other.min.x < a_max.x && self.min.y < b_max.y && other.min.y < a_max.y
    }

    /// Point containment, inclusive of the top/left edges
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.min.x && p.x < max.x && p.y >= self.min.y && p.y < max.y
    }
}

/// Score and miss counters for a play session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    pub score: u64,
    pub misses: u32,
}

impl ScoreState {
    fn apply_hit(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Returns the points actually deducted
    fn apply_miss(&mut self, penalty: u64) -> u64 {
        let deducted = penalty.min(self.score);
        self.score -= deducted;
        self.misses = self.misses.saturating_add(1);
        deducted
    }
}

/// Scoring parameters for one frame
#[derive(Debug, Clone, Copy)]
pub struct ScoringRules {
    /// Points for types without an explicit value
    pub default_points: u64,
    pub miss_penalty: u64,
    /// Playfield lower boundary (y)
    pub bottom: f32,
}

/// How an entity left play
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Hit { points: u64 },
    Miss { deducted: u64 },
}

/// A resolved entity, reported for feedback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub entity_id: u32,
    pub note_type: usize,
    pub pos: Vec2,
    pub color: [f32; 4],
    pub outcome: Outcome,
}

/// Resolve hits and misses for one frame
///
/// Entities neither hit nor past the boundary are left untouched. Removals
/// happen after the full pass, in reverse index order.
pub fn resolve_frame(
    entities: &mut Vec<FallingEntity>,
    player: &Rect,
    rules: &ScoringRules,
    score: &mut ScoreState,
) -> Vec<Resolution> {
    let mut resolved = Vec::new();
    let mut remove = Vec::new();

    for (index, entity) in entities.iter().enumerate() {
        let kind = entity.kind();
        let outcome = if entity.rect().intersects(player) {
            let points = kind.points.unwrap_or(rules.default_points);
            score.apply_hit(points);
            Outcome::Hit { points }
        } else if entity.bottom() > rules.bottom {
            Outcome::Miss {
                deducted: score.apply_miss(rules.miss_penalty),
            }
        } else {
            continue;
        };

        remove.push(index);
        resolved.push(Resolution {
            entity_id: entity.id,
            note_type: entity.note_type,
            pos: entity.pos,
            color: kind.color,
            outcome,
        });
    }

    for &index in remove.iter().rev() {
        entities.remove(index);
    }

    resolved
}

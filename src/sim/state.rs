//! Play session state
//!
//! Everything a running level mutates lives in [`GameState`].

use std::f32::consts::TAU;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{ScoreState, ScoringRules};
use super::entity::FallingEntity;
use super::pattern::{Level, Pattern};
use super::player::{MotionTuning, Player};
use super::scheduler::SpawnScheduler;
use crate::Settings;
use crate::consts::*;

/// Current phase of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Session is over; further ticks are no-ops
    Ended,
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Audio reported the end of the track
    AudioEnded,
    /// Audio failed; treated as a normal end
    AudioError(String),
    /// No audio timeline: the level ran out of notes and time
    PatternFinished,
}

/// Things that happened during a tick (audio cues, HUD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Spawned { entity_id: u32, note_type: usize },
    Hit { entity_id: u32, note_type: usize, points: u64 },
    Miss { entity_id: u32, deducted: u64 },
    SessionEnded(EndReason),
}

/// Floating hit/miss text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub pos: Vec2,
    /// Seconds remaining
    pub ttl: f32,
}

impl Marker {
    /// Opacity from remaining lifetime (1 -> 0)
    pub fn alpha(&self) -> f32 {
        (self.ttl / MARKER_LIFETIME).clamp(0.0, 1.0)
    }
}

const MARKER_RISE_SPEED: f32 = 60.0;
const BURST_SPEED: f32 = 180.0;
const PARTICLE_DRAG: f32 = 0.92;

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: [f32; 4],
    pub life: f32, // 0-1, decreases over time
    pub size: f32,
}

/// Complete play session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub level: Level,
    pub phase: GamePhase,
    pub score: ScoreState,
    pub player: Player,
    pub scheduler: SpawnScheduler,
    pub entities: Vec<FallingEntity>,
    pub markers: Vec<Marker>,
    pub particles: Vec<Particle>,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub settings: Settings,
    /// When false, the level is bounded by the audio track rather than its notes
    pub audio_timeline: bool,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl GameState {
    pub fn new(level: Level, settings: Settings, seed: u64) -> Self {
        let tuning = MotionTuning::from(&settings);
        let scheduler = SpawnScheduler::new(seed, settings.fallback_interval).with_fallback_end(level.duration);
        log::info!(
            "Starting '{}' ({} notes, {:.1}s)",
            level.title,
            level.spawns.len(),
            level.duration
        );
        Self {
            level,
            phase: GamePhase::Playing,
            score: ScoreState::default(),
            player: Player::new(CANVAS_WIDTH, CANVAS_HEIGHT, tuning),
            scheduler,
            entities: Vec::new(),
            markers: Vec::new(),
            particles: Vec::new(),
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            settings,
            audio_timeline: false,
            rng: Pcg32::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn pattern(&self) -> &Pattern {
        &self.level.spawns
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Ended
    }

    pub fn elapsed(&self) -> f32 {
        self.scheduler.elapsed()
    }

    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules {
            default_points: self.settings.default_points,
            miss_penalty: self.settings.miss_penalty,
            bottom: self.canvas_height,
        }
    }

    /// Mark the session over; returns false if it already was
    pub fn end(&mut self, reason: &EndReason) -> bool {
        if self.phase == GamePhase::Ended {
            return false;
        }
        self.phase = GamePhase::Ended;
        log::info!(
            "Session '{}' ended ({:?}): score {}, misses {}",
            self.level.title,
            reason,
            self.score.score,
            self.score.misses
        );
        true
    }

    pub fn spawn_marker(&mut self, kind: MarkerKind, pos: Vec2) {
        self.markers.push(Marker {
            kind,
            pos,
            ttl: MARKER_LIFETIME,
        });
    }

    /// Radial burst of particles in `color`, respecting the quality cap
    pub fn spawn_burst(&mut self, pos: Vec2, color: [f32; 4]) {
        let quality = self.settings.quality;
        let room = quality.max_particles().saturating_sub(self.particles.len());
        let count = quality.burst_particles().min(room);
        for i in 0..count {
            let theta = i as f32 / count as f32 * TAU;
            self.particles.push(Particle {
                pos,
                vel: Vec2::new(theta.cos(), theta.sin()) * BURST_SPEED,
                color,
                life: 1.0,
                size: 4.0,
            });
        }
    }

    /// Age markers and particles, dropping expired ones
    pub fn update_feedback(&mut self, dt: f32) {
        for marker in &mut self.markers {
            marker.ttl -= dt;
            marker.pos.y -= MARKER_RISE_SPEED * dt;
        }
        self.markers.retain(|m| m.ttl > 0.0);

        for particle in &mut self.particles {
            particle.pos += particle.vel * dt;
            particle.vel *= PARTICLE_DRAG;
            particle.life -= dt * 2.0;
            particle.size *= 0.98;
        }
        self.particles.retain(|p| p.life > 0.0);
    }
}

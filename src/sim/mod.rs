//! Frame-driven simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Simulation time advances only through `tick`
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod entity;
pub mod pattern;
pub mod player;
pub mod scheduler;
pub mod state;
pub mod tick;

pub use collision::{Outcome, Rect, Resolution, ScoreState, ScoringRules, resolve_frame};
pub use entity::{AnimPhase, EffectKind, FallingEntity, NOTE_TYPES, NoteType, lane_center, note_type};
pub use pattern::{Level, NoteEvent, Pattern, generate_pattern};
pub use player::{MotionTuning, Player};
pub use scheduler::SpawnScheduler;
pub use state::{EndReason, GameEvent, GamePhase, GameState, Marker, MarkerKind, Particle};
pub use tick::{TickInput, tick};

//! Per-frame simulation update
//!
//! Order within one tick: player motion, feedback aging, entity motion,
//! spawn emission, collision, boundary misses, removal, end-of-level check.

use rand::Rng;

use super::collision::{Outcome, resolve_frame};
use super::entity::{FallingEntity, lane_center, note_type};
use super::state::{EndReason, GameEvent, GameState, MarkerKind};

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer x (absolute canvas coordinates) driving the player target
    pub pointer_x: Option<f32>,
    /// End-of-session signal delivered by the audio collaborator
    pub audio_end: Option<EndReason>,
}

/// Advance the session by `dt` seconds of wall time
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.is_over() {
        return events;
    }

    if let Some(reason) = &input.audio_end {
        if state.end(reason) {
            events.push(GameEvent::SessionEnded(reason.clone()));
        }
        return events;
    }

    let dt = if dt.is_finite() && dt > 0.0 {
        dt * state.settings.playback_rate
    } else {
        0.0
    };

    if let Some(x) = input.pointer_x {
        state.player.set_target(x);
    }
    state.player.update(dt);
    state.update_feedback(dt);

    for entity in &mut state.entities {
        entity.advance(dt);
    }

    spawn_due(state, dt, &mut events);

    let player_rect = state.player.rect();
    let rules = state.scoring_rules();
    let resolved = resolve_frame(&mut state.entities, &player_rect, &rules, &mut state.score);
    for r in resolved {
        match r.outcome {
            Outcome::Hit { points } => {
                state.spawn_marker(MarkerKind::Hit, r.pos);
                state.spawn_burst(r.pos, r.color);
                events.push(GameEvent::Hit {
                    entity_id: r.entity_id,
                    note_type: r.note_type,
                    points,
                });
            }
            Outcome::Miss { deducted } => {
                state.spawn_marker(MarkerKind::Miss, r.pos);
                events.push(GameEvent::Miss {
                    entity_id: r.entity_id,
                    deducted,
                });
            }
        }
    }

    if !state.audio_timeline && level_finished(state) {
        let reason = EndReason::PatternFinished;
        if state.end(&reason) {
            events.push(GameEvent::SessionEnded(reason));
        }
    }

    events
}

/// Instantiate entities for every event the scheduler reports as due
fn spawn_due(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let fallback = state.level.spawns.is_empty();
    let due = state.scheduler.advance(&state.level.spawns, dt);

    for event in due {
        let id = state.next_entity_id();
        let x = if fallback {
            let half = note_type(event.note_type).size / 2.0;
            let max = (state.canvas_width - half).max(half + 1.0);
            state.rng.random_range(half..max)
        } else {
            lane_center(event.lane, state.canvas_width)
        };
        state.entities.push(FallingEntity::from_event(id, &event, x));
        events.push(GameEvent::Spawned {
            entity_id: id,
            note_type: event.note_type,
        });
    }
}

fn level_finished(state: &GameState) -> bool {
    let notes_done = state.level.spawns.is_empty() || state.scheduler.is_exhausted(&state.level.spawns);
    notes_done && state.entities.is_empty() && state.elapsed() >= state.level.duration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::consts::*;
    use crate::sim::pattern::{Level, NoteEvent, Pattern};

    fn level(events: Vec<NoteEvent>, duration: f32) -> Level {
        Level::new("Test", "test.mp3", duration).with_spawns(Pattern::from_events(events))
    }

    #[test]
    fn test_spawn_at_lane_center() {
        let mut state = GameState::new(level(vec![NoteEvent::new(0.0, 1, 0)], 10.0), Settings::default(), 1);
        let events = tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.entities.len(), 1);
        assert_eq!(state.entities[0].pos.x, lane_center(1, CANVAS_WIDTH));
        assert!(matches!(events[0], GameEvent::Spawned { .. }));
    }

    #[test]
    fn test_catch_up_spawns_everything() {
        let spawns = vec![
            NoteEvent::new(0.0, 0, 0),
            NoteEvent::new(0.8, 1, 0),
            NoteEvent::new(1.6, 2, 0),
        ];
        let mut state = GameState::new(level(spawns, 10.0), Settings::default(), 1);
        tick(&mut state, &TickInput::default(), 2.0);
        assert_eq!(state.entities.len(), 3);
    }

    #[test]
    fn test_spawned_note_overlapping_player_scores_same_frame() {
        let mut state = GameState::new(level(vec![NoteEvent::new(0.0, 0, 0)], 10.0), Settings::default(), 1);
        // Stretch the player over the spawn area so the fresh entity overlaps
        state.player.y = -40.0;
        state.player.height = 80.0;
        state.player.x = lane_center(0, CANVAS_WIDTH);
        state.player.target_x = state.player.x;
        let events = tick(&mut state, &TickInput::default(), 0.001);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Hit { .. })));
        assert_eq!(state.score.score, 1);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_missed_note_counts() {
        let mut state = GameState::new(level(vec![NoteEvent::new(0.0, 0, 0)], 10.0), Settings::default(), 1);
        state.player.set_target(CANVAS_WIDTH);
        for _ in 0..400 {
            tick(&mut state, &TickInput { pointer_x: Some(CANVAS_WIDTH), ..Default::default() }, 1.0 / 60.0);
        }
        assert_eq!(state.score.misses, 1);
        assert_eq!(state.score.score, 0);
        assert_eq!(state.markers.len(), 0);
    }

    #[test]
    fn test_audio_end_stops_session() {
        let mut state = GameState::new(level(vec![NoteEvent::new(5.0, 0, 0)], 10.0), Settings::default(), 1);
        let input = TickInput {
            audio_end: Some(EndReason::AudioError("decode failed".into())),
            ..Default::default()
        };
        let events = tick(&mut state, &input, 0.016);
        assert!(matches!(events[0], GameEvent::SessionEnded(EndReason::AudioError(_))));
        assert!(tick(&mut state, &TickInput::default(), 10.0).is_empty());
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_level_finishes_without_audio() {
        let mut state = GameState::new(level(vec![NoteEvent::new(0.0, 0, 0)], 1.0), Settings::default(), 1);
        let mut ended = false;
        for _ in 0..600 {
            let events = tick(&mut state, &TickInput::default(), 1.0 / 60.0);
            if events.iter().any(|e| matches!(e, GameEvent::SessionEnded(EndReason::PatternFinished))) {
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert!(state.is_over());
    }

    #[test]
    fn test_audio_timeline_keeps_session_alive() {
        let mut state = GameState::new(level(vec![NoteEvent::new(0.0, 0, 0)], 1.0), Settings::default(), 1);
        state.audio_timeline = true;
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        }
        assert!(!state.is_over());
    }

    #[test]
    fn test_empty_pattern_session_finishes() {
        let mut state = GameState::new(Level::new("Empty", "", 5.0), Settings::default(), 4);
        let mut spawned = 0;
        for _ in 0..60 * 30 {
            for event in tick(&mut state, &TickInput::default(), 1.0 / 60.0) {
                if matches!(event, GameEvent::Spawned { .. }) {
                    spawned += 1;
                }
            }
            if state.is_over() {
                break;
            }
        }
        assert!(state.is_over());
        assert!(spawned > 0);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_fallback_spawns_inside_canvas() {
        let mut state = GameState::new(Level::new("Empty", "", 30.0), Settings::default(), 3);
        tick(&mut state, &TickInput::default(), 5.0);
        assert!(!state.entities.is_empty());
        for entity in &state.entities {
            assert!(entity.pos.x >= entity.size / 2.0);
            assert!(entity.pos.x <= CANVAS_WIDTH - entity.size / 2.0);
        }
    }

    #[test]
    fn test_determinism() {
        let run = |seed| {
            let mut state = GameState::new(Level::new("Empty", "", 30.0), Settings::default(), seed);
            for i in 0..300 {
                let input = TickInput {
                    pointer_x: Some((i as f32 * 7.0) % CANVAS_WIDTH),
                    ..Default::default()
                };
                tick(&mut state, &input, 1.0 / 60.0);
            }
            (state.score, state.entities.len(), state.player.x)
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn test_playback_rate_scales_time() {
        let settings = Settings {
            playback_rate: 2.0,
            ..Default::default()
        };
        let mut state = GameState::new(level(vec![NoteEvent::new(1.0, 0, 0)], 10.0), settings, 1);
        tick(&mut state, &TickInput::default(), 0.5);
        assert_eq!(state.entities.len(), 1);
        assert_eq!(state.elapsed(), 1.0);
    }
}

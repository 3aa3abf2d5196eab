//! Spawn scheduling
//!
//! Advances a simulation clock and emits due note events from a pattern, or
//! from a seeded periodic generator when the pattern is empty.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::pattern::{NoteEvent, Pattern};
use crate::consts::*;

/// Emits note events as simulation time passes
///
/// Due-ness is always checked against the cumulative elapsed time with `<=`,
/// so a large step catches up on every event it crosses.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    elapsed: f32,
    /// Index of the next pattern event to emit
    cursor: usize,
    /// Fallback generator: number of notes synthesized so far
    fallback_emitted: u32,
    fallback_interval: f32,
    /// Fallback slots after this time are never emitted
    fallback_end: f32,
    rng: Pcg32,
}

impl SpawnScheduler {
    pub fn new(seed: u64, fallback_interval: f32) -> Self {
        Self {
            elapsed: 0.0,
            cursor: 0,
            fallback_emitted: 0,
            fallback_interval: if fallback_interval > 0.0 {
                fallback_interval
            } else {
                FALLBACK_SPAWN_INTERVAL
            },
            fallback_end: f32::INFINITY,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Stop the fallback generator at `end` seconds (the level duration)
    pub fn with_fallback_end(mut self, end: f32) -> Self {
        if !end.is_nan() {
            self.fallback_end = end;
        }
        self
    }

    /// Simulation time in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of pattern events already emitted
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewind to the start (e.g. after the pattern was replaced)
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.cursor = 0;
        self.fallback_emitted = 0;
    }

    /// Whether every pattern event has been emitted
    pub fn is_exhausted(&self, pattern: &Pattern) -> bool {
        !pattern.is_empty() && self.cursor >= pattern.len()
    }

    /// Advance the clock by `delta` seconds and return every newly due event
    pub fn advance(&mut self, pattern: &Pattern, delta: f32) -> Vec<NoteEvent> {
        let mut due = Vec::new();
        self.advance_into(pattern, delta, &mut due);
        due
    }

    /// Like [`advance`](Self::advance) but appends into a caller-owned buffer
    pub fn advance_into(&mut self, pattern: &Pattern, delta: f32, out: &mut Vec<NoteEvent>) {
        if delta.is_finite() && delta > 0.0 {
            self.elapsed += delta;
        }

        if pattern.is_empty() {
            self.emit_fallback(out);
            return;
        }

        while let Some(event) = pattern.get(self.cursor) {
            if event.time > self.elapsed {
                break;
            }
            out.push(*event);
            self.cursor += 1;
        }
    }

    fn emit_fallback(&mut self, out: &mut Vec<NoteEvent>) {
        loop {
            // Derive each slot from its index so repeated additions never drift
            let time = (self.fallback_emitted + 1) as f32 * self.fallback_interval;
            if time > self.elapsed || time > self.fallback_end {
                break;
            }
            out.push(NoteEvent::new(
                time,
                self.rng.random_range(0..LANE_COUNT),
                self.rng.random_range(0..NOTE_TYPE_COUNT),
            ));
            self.fallback_emitted += 1;
        }
    }
}

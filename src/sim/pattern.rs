//! Note events, patterns and level descriptors
//!
//! A [`Pattern`] is the single source of truth shared by playback (read-only)
//! and the timeline editor (read-write). It is kept sorted ascending by time.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{NoteFallError, Result, round_time};

/// A single falling-note record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Song time in seconds
    pub time: f32,
    /// Note type index (resolved through the type table, falls back to 0)
    #[serde(rename = "type")]
    pub note_type: usize,
    pub lane: usize,
}

impl NoteEvent {
    pub fn new(time: f32, lane: usize, note_type: usize) -> Self {
        Self {
            time,
            note_type,
            lane,
        }
    }
}

/// Time-sorted sequence of note events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NoteEvent>", into = "Vec<NoteEvent>")]
pub struct Pattern {
    events: Vec<NoteEvent>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pattern from arbitrary events (sorted on the way in)
    pub fn from_events(events: Vec<NoteEvent>) -> Self {
        let mut pattern = Self { events };
        pattern.sort();
        pattern
    }

    /// Stable sort by time
    pub fn sort(&mut self) {
        self.events.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    pub fn is_sorted(&self) -> bool {
        self.events.windows(2).all(|w| w[0].time <= w[1].time)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NoteEvent> {
        self.events.get(index)
    }

    /// Mutable access without re-sorting (used while dragging)
    pub fn get_mut(&mut self, index: usize) -> Option<&mut NoteEvent> {
        self.events.get_mut(index)
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteEvent> {
        self.events.iter()
    }

    /// Insert and re-sort, returning the new index of the event
    pub fn insert(&mut self, event: NoteEvent) -> usize {
        // Equal times go after existing ties, matching a stable sort of push + sort
        let index = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(index, event);
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<NoteEvent> {
        (index < self.events.len()).then(|| self.events.remove(index))
    }

    /// Nearest event in `lane` whose time lies within `threshold` of `time`
    pub fn find_near(&self, lane: usize, time: f32, threshold: f32) -> Option<usize> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.lane == lane)
            .map(|(i, e)| (i, (e.time - time).abs()))
            .filter(|&(_, d)| d <= threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Time of the last event (0 for an empty pattern)
    pub fn end_time(&self) -> f32 {
        self.events.last().map(|e| e.time).unwrap_or(0.0)
    }

    /// Decode and validate persisted JSON
    ///
    /// Out-of-range note types are accepted (they resolve to the default type
    /// at playback); bad times and lanes reject the whole pattern.
    pub fn from_json(json: &str) -> Result<Self> {
        let events: Vec<NoteEvent> = serde_json::from_str(json)?;
        Self::try_from(events)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.events)?)
    }
}

impl TryFrom<Vec<NoteEvent>> for Pattern {
    type Error = NoteFallError;

    /// Validate times and lanes, then sort
    fn try_from(events: Vec<NoteEvent>) -> Result<Self> {
        for (index, event) in events.iter().enumerate() {
            if !event.time.is_finite() || event.time < 0.0 {
                return Err(NoteFallError::invalid_note(
                    index,
                    format!("invalid time {}", event.time),
                ));
            }
            if event.lane >= LANE_COUNT {
                return Err(NoteFallError::invalid_note(
                    index,
                    format!("lane {} out of range", event.lane),
                ));
            }
        }
        Ok(Self::from_events(events))
    }
}

impl From<Pattern> for Vec<NoteEvent> {
    fn from(pattern: Pattern) -> Self {
        pattern.events
    }
}

impl<'a> IntoIterator for &'a Pattern {
    type Item = &'a NoteEvent;
    type IntoIter = std::slice::Iter<'a, NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Generate a seeded pattern: one note every `interval` seconds up to `duration`
pub fn generate_pattern(seed: u64, duration: f32, interval: f32) -> Pattern {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut events = Vec::new();
    if interval <= 0.0 {
        return Pattern::new();
    }

    let mut step = 1u32;
    loop {
        // Multiply rather than accumulate so long songs don't drift
        let time = round_time(step as f32 * interval);
        if time > duration {
            break;
        }
        events.push(NoteEvent::new(
            time,
            rng.random_range(0..LANE_COUNT),
            rng.random_range(0..NOTE_TYPE_COUNT),
        ));
        step += 1;
    }

    Pattern::from_events(events)
}

/// A playable level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub title: String,
    #[serde(rename = "audioRef")]
    pub audio_ref: String,
    /// Song length in seconds
    pub duration: f32,
    pub spawns: Pattern,
}

impl Level {
    pub fn new(title: impl Into<String>, audio_ref: impl Into<String>, duration: f32) -> Self {
        Self {
            title: title.into(),
            audio_ref: audio_ref.into(),
            duration,
            spawns: Pattern::new(),
        }
    }

    pub fn with_spawns(mut self, spawns: Pattern) -> Self {
        self.spawns = spawns;
        self
    }

    /// Built-in level catalogue; default patterns are generated at load
    pub fn builtin() -> Vec<Level> {
        vec![
            Level::new("Morning Drizzle", "audio/morning_drizzle.mp3", 60.0)
                .with_spawns(generate_pattern(0x5eed_0001, 60.0, 1.0)),
            Level::new("Neon Steps", "audio/neon_steps.mp3", 75.0)
                .with_spawns(generate_pattern(0x5eed_0002, 75.0, 0.75)),
            Level::new("Starfall", "audio/starfall.mp3", 90.0)
                .with_spawns(generate_pattern(0x5eed_0003, 90.0, 0.5)),
        ]
    }

    /// Storage key for this level's authored pattern
    pub fn pattern_key(&self) -> String {
        let slug: String = self
            .title
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("note_fall_pattern_{}", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_events_sorts() {
        let pattern = Pattern::from_events(vec![
            NoteEvent::new(1.6, 0, 0),
            NoteEvent::new(0.0, 1, 0),
            NoteEvent::new(0.8, 2, 1),
        ]);
        assert!(pattern.is_sorted());
        assert_eq!(pattern.get(0).unwrap().lane, 1);
        assert_eq!(pattern.end_time(), 1.6);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut pattern = Pattern::from_events(vec![NoteEvent::new(1.0, 0, 0), NoteEvent::new(3.0, 0, 0)]);
        let index = pattern.insert(NoteEvent::new(2.0, 1, 0));
        assert_eq!(index, 1);
        let index = pattern.insert(NoteEvent::new(1.0, 2, 0));
        assert_eq!(index, 1);
        assert!(pattern.is_sorted());
        assert_eq!(pattern.len(), 4);
    }

    #[test]
    fn test_find_near_respects_lane_and_threshold() {
        let pattern = Pattern::from_events(vec![NoteEvent::new(1.0, 0, 0), NoteEvent::new(1.1, 1, 0)]);
        assert_eq!(pattern.find_near(0, 1.15, 0.2), Some(0));
        assert_eq!(pattern.find_near(1, 1.15, 0.2), Some(1));
        assert_eq!(pattern.find_near(2, 1.0, 0.2), None);
        assert_eq!(pattern.find_near(0, 1.5, 0.2), None);
    }

    #[test]
    fn test_json_uses_type_field() {
        let pattern = Pattern::from_events(vec![NoteEvent::new(0.5, 2, 1)]);
        let json = pattern.to_json().unwrap();
        assert_eq!(json, r#"[{"time":0.5,"type":1,"lane":2}]"#);
        assert_eq!(Pattern::from_json(&json).unwrap(), pattern);
    }

    #[test]
    fn test_from_json_rejects_bad_lane_keeps_bad_type() {
        assert!(Pattern::from_json(r#"[{"time":0.5,"type":0,"lane":9}]"#).is_err());
        assert!(Pattern::from_json(r#"[{"time":-1.0,"type":0,"lane":0}]"#).is_err());
        let pattern = Pattern::from_json(r#"[{"time":0.5,"type":42,"lane":0}]"#).unwrap();
        assert_eq!(pattern.get(0).unwrap().note_type, 42);
    }

    #[test]
    fn test_level_decode_sorts_and_validates_spawns() {
        let json = r#"{"title":"T","audioRef":"t.ogg","duration":4.0,
            "spawns":[{"time":2.0,"type":0,"lane":0},{"time":0.5,"type":1,"lane":3}]}"#;
        let level: Level = serde_json::from_str(json).unwrap();
        assert!(level.spawns.is_sorted());
        assert_eq!(level.spawns.get(0).unwrap().time, 0.5);

        let bad = r#"{"title":"T","audioRef":"t.ogg","duration":4.0,
            "spawns":[{"time":2.0,"type":0,"lane":0},{"time":0.5,"type":0,"lane":9}]}"#;
        assert!(serde_json::from_str::<Level>(bad).is_err());
        assert!(serde_json::from_str::<Pattern>(r#"[{"time":1.0,"type":0,"lane":7}]"#).is_err());
    }

    #[test]
    fn test_generate_pattern_deterministic() {
        let a = generate_pattern(7, 10.0, 0.5);
        let b = generate_pattern(7, 10.0, 0.5);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert!(a.is_sorted());
        assert!(a.iter().all(|e| e.lane < LANE_COUNT && e.note_type < NOTE_TYPE_COUNT));
    }

    #[test]
    fn test_pattern_key_slug() {
        let level = Level::new("Neon Steps!", "x", 1.0);
        assert_eq!(level.pattern_key(), "note_fall_pattern_neon_steps_");
    }
}

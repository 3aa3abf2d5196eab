//! Game settings and tuning
//!
//! Persisted separately from authored patterns through the same [`Storage`] seam.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::consts::*;
use crate::persistence::Storage;

/// Visual effects preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EffectsQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl EffectsQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectsQuality::Low => "Low",
            EffectsQuality::Medium => "Medium",
            EffectsQuality::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(EffectsQuality::Low),
            "medium" | "med" => Some(EffectsQuality::Medium),
            "high" => Some(EffectsQuality::High),
            _ => None,
        }
    }

    /// Particles emitted by one hit burst
    pub fn burst_particles(&self) -> usize {
        match self {
            EffectsQuality::Low => 6,
            EffectsQuality::Medium => 12,
            EffectsQuality::High => 24,
        }
    }

    /// Maximum live particles
    pub fn max_particles(&self) -> usize {
        match self {
            EffectsQuality::Low => 60,
            EffectsQuality::Medium => 200,
            EffectsQuality::High => 600,
        }
    }
}

/// Settings and gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: EffectsQuality,

    // === Player motion ===
    /// Follow gain K in `pos += (target - pos) * min(dt * K, 1)`
    pub follow_gain: f32,
    /// Entry settle animation length (seconds)
    pub entry_duration: f32,
    /// Entry overshoot above 1.0 at session start
    pub entry_amplitude: f32,
    /// Oscillations during the entry settle
    pub entry_oscillations: f32,
    /// Continuous pulse amplitude around 1.0
    pub pulse_amplitude: f32,
    /// Continuous pulse frequency (Hz)
    pub pulse_frequency: f32,

    // === Scoring ===
    pub miss_penalty: u64,
    pub default_points: u64,

    // === Playback ===
    /// Fallback generator period when the level has no pattern (seconds)
    pub fallback_interval: f32,
    /// Simulation time scale (1.0 = realtime)
    pub playback_rate: f32,

    // === Editor ===
    pub px_per_second: f32,
    pub tap_threshold_px: f32,
    pub min_handle_height: f32,

    // === Audio ===
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: EffectsQuality::Medium,

            follow_gain: 10.0,
            entry_duration: 0.6,
            entry_amplitude: 0.35,
            entry_oscillations: 2.0,
            pulse_amplitude: 0.04,
            pulse_frequency: 2.0,

            miss_penalty: MISS_PENALTY,
            default_points: DEFAULT_POINTS,

            fallback_interval: FALLBACK_SPAWN_INTERVAL,
            playback_rate: 1.0,

            px_per_second: EDITOR_PX_PER_SECOND,
            tap_threshold_px: EDITOR_TAP_THRESHOLD_PX,
            min_handle_height: SCROLLBAR_MIN_HANDLE_HEIGHT,

            music_volume: 0.7,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "note_fall_settings";

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Replace nonsensical values (zero/negative rates, NaN) with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let positive = |v: f32, d: f32| if v.is_finite() && v > 0.0 { v } else { d };
        self.follow_gain = positive(self.follow_gain, defaults.follow_gain);
        self.entry_duration = positive(self.entry_duration, defaults.entry_duration);
        self.fallback_interval = positive(self.fallback_interval, defaults.fallback_interval);
        self.playback_rate = positive(self.playback_rate, defaults.playback_rate);
        self.px_per_second = positive(self.px_per_second, defaults.px_per_second);
        self.tap_threshold_px = positive(self.tap_threshold_px, defaults.tap_threshold_px);
        self.min_handle_height = positive(self.min_handle_height, defaults.min_handle_height);

        // Zero disables the effect; negatives and non-finite values do not
        let non_negative = |v: f32, d: f32| if v.is_finite() && v >= 0.0 { v } else { d };
        self.entry_amplitude = non_negative(self.entry_amplitude, defaults.entry_amplitude);
        self.entry_oscillations = non_negative(self.entry_oscillations, defaults.entry_oscillations);
        self.pulse_amplitude = non_negative(self.pulse_amplitude, defaults.pulse_amplitude);
        self.pulse_frequency = non_negative(self.pulse_frequency, defaults.pulse_frequency);
        self.music_volume = if self.music_volume.is_finite() {
            self.music_volume.clamp(0.0, 1.0)
        } else {
            defaults.music_volume
        };
        self
    }

    /// Load settings, falling back to defaults on absence or corruption
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Settings unavailable: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings; failures are logged and swallowed
    pub fn save(&self, storage: &mut dyn Storage) {
        let result = self
            .to_json()
            .and_then(|json| storage.set_item(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"follow_gain": 4.0}"#).unwrap();
        assert_eq!(settings.follow_gain, 4.0);
        assert_eq!(settings.miss_penalty, MISS_PENALTY);
        assert_eq!(settings.quality, EffectsQuality::Medium);
    }

    #[test]
    fn test_sanitize_rejects_zero_rate() {
        let settings = Settings::from_json(r#"{"playback_rate": 0.0, "music_volume": 3.0}"#).unwrap();
        assert_eq!(settings.playback_rate, 1.0);
        assert_eq!(settings.music_volume, 1.0);
    }

    #[test]
    fn test_sanitize_motion_and_editor_fields() {
        let settings = Settings {
            entry_amplitude: f32::NAN,
            entry_oscillations: -1.0,
            pulse_amplitude: f32::INFINITY,
            pulse_frequency: 0.0,
            min_handle_height: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        let defaults = Settings::default();
        assert_eq!(settings.entry_amplitude, defaults.entry_amplitude);
        assert_eq!(settings.entry_oscillations, defaults.entry_oscillations);
        assert_eq!(settings.pulse_amplitude, defaults.pulse_amplitude);
        assert_eq!(settings.pulse_frequency, 0.0);
        assert_eq!(settings.min_handle_height, defaults.min_handle_height);
    }

    #[test]
    fn test_load_save_roundtrip() {
        let mut storage = MemoryStorage::new();
        let settings = Settings {
            quality: EffectsQuality::High,
            miss_penalty: 3,
            ..Default::default()
        };
        settings.save(&mut storage);
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_load_corrupt_falls_back() {
        let mut storage = MemoryStorage::new();
        storage.set_item(Settings::STORAGE_KEY, "{not json").unwrap();
        assert_eq!(Settings::load(&storage), Settings::default());
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!(EffectsQuality::parse("MED"), Some(EffectsQuality::Medium));
        assert_eq!(EffectsQuality::parse("ultra"), None);
        assert!(EffectsQuality::High.burst_particles() > EffectsQuality::Low.burst_particles());
    }
}

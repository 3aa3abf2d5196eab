//! Audio collaborator seam
//!
//! Playback itself is external. The core hands the backend a [`SessionSignal`]
//! to report "ended" or "error"; those callbacks may arrive at any point,
//! including after the session that started playback has been torn down, so
//! every delivery is checked against the session's liveness flag.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::Result;
use crate::sim::{EndReason, GameEvent};

/// Short sound cues derived from gameplay events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Hit,
    Miss,
    SessionEnd,
}

impl SoundCue {
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Spawned { .. } => None,
            GameEvent::Hit { .. } => Some(SoundCue::Hit),
            GameEvent::Miss { .. } => Some(SoundCue::Miss),
            GameEvent::SessionEnded(_) => Some(SoundCue::SessionEnd),
        }
    }
}

#[derive(Debug, Default)]
struct SessionFlags {
    alive: Cell<bool>,
    end: RefCell<Option<EndReason>>,
}

/// Owned by a play session; hands out signals and collects their delivery
#[derive(Debug)]
pub struct SessionGuard {
    flags: Rc<SessionFlags>,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGuard {
    pub fn new() -> Self {
        let flags = SessionFlags::default();
        flags.alive.set(true);
        Self {
            flags: Rc::new(flags),
        }
    }

    /// Callback handle for the audio backend
    pub fn signal(&self) -> SessionSignal {
        SessionSignal {
            flags: Rc::downgrade(&self.flags),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.flags.alive.get()
    }

    /// Stop accepting deliveries (scene exit, session replaced)
    pub fn invalidate(&self) {
        self.flags.alive.set(false);
        self.flags.end.borrow_mut().take();
    }

    /// Pending end-of-session reason, if one was delivered
    pub fn take_end(&self) -> Option<EndReason> {
        self.flags.end.borrow_mut().take()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.flags.alive.set(false);
    }
}

/// Ended/error callbacks given to the audio backend
#[derive(Debug, Clone)]
pub struct SessionSignal {
    flags: Weak<SessionFlags>,
}

impl SessionSignal {
    /// Track finished
    pub fn ended(&self) {
        self.deliver(EndReason::AudioEnded);
    }

    /// Playback failed; ends the session without surfacing an error
    pub fn errored(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Audio error: {}", message);
        self.deliver(EndReason::AudioError(message));
    }

    /// Whether a delivery would still reach a live session
    pub fn is_live(&self) -> bool {
        self.flags.upgrade().is_some_and(|f| f.alive.get())
    }

    fn deliver(&self, reason: EndReason) {
        let Some(flags) = self.flags.upgrade() else {
            log::debug!("Dropping audio callback for a finished session");
            return;
        };
        if !flags.alive.get() {
            log::debug!("Dropping audio callback for a stale session");
            return;
        }
        let mut end = flags.end.borrow_mut();
        // First reason wins
        if end.is_none() {
            *end = Some(reason);
        }
    }
}

/// External music playback
pub trait AudioBackend {
    /// Start the track; ended/error are reported later through `signal`
    fn play(&mut self, audio_ref: &str, signal: SessionSignal) -> Result<()>;

    fn stop(&mut self);

    /// Whether the track bounds the session (true for real playback)
    fn drives_timeline(&self) -> bool {
        true
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn cue(&mut self, _cue: SoundCue) {}
}

/// Backend that plays nothing; sessions end on their own pattern
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioBackend for SilentAudio {
    fn play(&mut self, audio_ref: &str, _signal: SessionSignal) -> Result<()> {
        log::debug!("Silent audio: not playing '{}'", audio_ref);
        Ok(())
    }

    fn stop(&mut self) {}

    fn drives_timeline(&self) -> bool {
        false
    }
}

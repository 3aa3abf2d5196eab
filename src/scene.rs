//! Scenes and the driver that switches between them
//!
//! A scene only overrides the hooks it needs. The driver owns the current
//! scene and at most one pending transition; transitions requested during
//! update or input are applied after the frame has rendered, so a scene never
//! sees its state torn down mid-update.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::Settings;
use crate::audio::{AudioBackend, SessionGuard, SoundCue};
use crate::consts::*;
use crate::editor::{HEADER_HEIGHT, TimelineEditor, done_button, palette_at};
use crate::persistence::{PatternRepository, Storage};
use crate::renderer::{RenderSurface, draw_editor, draw_session};
use crate::sim::{EndReason, GameState, Level, TickInput, tick};

/// Requested scene change
pub enum Transition {
    To(Box<dyn Scene>),
    /// Back to whatever the host considers home (menu, level list)
    Home,
}

/// Per-call context handed to scene hooks
#[derive(Default)]
pub struct SceneContext {
    pending: Option<Transition>,
}

impl SceneContext {
    /// Ask for a scene change; the latest request before the frame ends wins
    pub fn request(&mut self, transition: Transition) {
        if self.pending.is_some() {
            log::debug!("Replacing pending scene transition");
        }
        self.pending = Some(transition);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Scene lifecycle; every hook defaults to a no-op
pub trait Scene {
    fn name(&self) -> &'static str;

    fn on_enter(&mut self) {}

    fn on_exit(&mut self) {}

    fn update(&mut self, _dt: f32, _ctx: &mut SceneContext) {}

    fn render(&self, _surface: &mut dyn RenderSurface) {}

    fn pointer_down(&mut self, _p: Vec2, _ctx: &mut SceneContext) {}

    fn pointer_move(&mut self, _p: Vec2, _ctx: &mut SceneContext) {}

    fn pointer_up(&mut self, _p: Vec2, _ctx: &mut SceneContext) {}
}

/// Builds the home scene on demand
pub type SceneFactory = Box<dyn FnMut() -> Box<dyn Scene>>;

/// Owns the current scene and applies deferred transitions
pub struct SceneDriver {
    current: Box<dyn Scene>,
    ctx: SceneContext,
    home: SceneFactory,
}

impl SceneDriver {
    pub fn new(mut home: SceneFactory) -> Self {
        let mut current = home();
        current.on_enter();
        log::info!("Scene: {}", current.name());
        Self {
            current,
            ctx: SceneContext::default(),
            home,
        }
    }

    pub fn current_name(&self) -> &'static str {
        self.current.name()
    }

    /// Host-initiated transition, applied at the end of the next frame
    pub fn request(&mut self, transition: Transition) {
        self.ctx.request(transition);
    }

    pub fn has_pending(&self) -> bool {
        self.ctx.has_pending()
    }

    /// One frame: update, render, then switch scenes if one was requested
    pub fn frame(&mut self, dt: f32, surface: &mut dyn RenderSurface) {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.current.update(dt, &mut self.ctx);
        self.current.render(surface);
        self.apply_pending();
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.current.pointer_down(Vec2::new(x, y), &mut self.ctx);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.current.pointer_move(Vec2::new(x, y), &mut self.ctx);
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.current.pointer_up(Vec2::new(x, y), &mut self.ctx);
    }

    fn apply_pending(&mut self) {
        let Some(transition) = self.ctx.pending.take() else {
            return;
        };
        let next = match transition {
            Transition::To(scene) => scene,
            Transition::Home => (self.home)(),
        };
        self.current.on_exit();
        log::info!("Scene: {} -> {}", self.current.name(), next.name());
        self.current = next;
        self.current.on_enter();
    }
}

/// One play session of a level
pub struct PlayScene {
    state: GameState,
    audio: Box<dyn AudioBackend>,
    guard: SessionGuard,
    pointer_x: Option<f32>,
    start_error: Option<EndReason>,
    linger: f32,
    exit_requested: bool,
}

impl PlayScene {
    pub fn new(level: Level, settings: Settings, seed: u64, audio: Box<dyn AudioBackend>) -> Self {
        Self {
            state: GameState::new(level, settings, seed),
            audio,
            guard: SessionGuard::new(),
            pointer_x: None,
            start_error: None,
            linger: 0.0,
            exit_requested: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }
}

impl Scene for PlayScene {
    fn name(&self) -> &'static str {
        "play"
    }

    fn on_enter(&mut self) {
        self.state.audio_timeline = self.audio.drives_timeline();
        self.audio.set_volume(self.state.settings.music_volume);
        if let Err(e) = self.audio.play(&self.state.level.audio_ref, self.guard.signal()) {
            log::warn!("Audio failed to start for '{}': {}", self.state.level.title, e);
            self.start_error = Some(EndReason::AudioError(e.to_string()));
        }
    }

    fn on_exit(&mut self) {
        self.guard.invalidate();
        self.audio.stop();
        log::info!(
            "Session '{}' left with score {} ({} misses)",
            self.state.level.title,
            self.state.score.score,
            self.state.score.misses
        );
    }

    fn update(&mut self, dt: f32, ctx: &mut SceneContext) {
        let input = TickInput {
            pointer_x: self.pointer_x,
            audio_end: self.start_error.take().or_else(|| self.guard.take_end()),
        };
        for event in tick(&mut self.state, &input, dt) {
            if let Some(cue) = SoundCue::for_event(&event) {
                self.audio.cue(cue);
            }
        }

        if self.state.is_over() && !self.exit_requested {
            self.linger += dt;
            if self.linger >= RESULT_LINGER {
                self.exit_requested = true;
                ctx.request(Transition::Home);
            }
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) {
        draw_session(&self.state, surface);
    }

    fn pointer_down(&mut self, p: Vec2, _ctx: &mut SceneContext) {
        self.pointer_x = Some(p.x);
    }

    fn pointer_move(&mut self, p: Vec2, _ctx: &mut SceneContext) {
        self.pointer_x = Some(p.x);
    }
}

/// Timeline editor over one level's pattern
pub struct EditorScene<S: Storage> {
    level: Level,
    editor: TimelineEditor,
    repo: Rc<RefCell<PatternRepository<S>>>,
}

impl<S: Storage> EditorScene<S> {
    pub fn new(level: Level, settings: &Settings, repo: Rc<RefCell<PatternRepository<S>>>) -> Self {
        let editor = TimelineEditor::new(level.spawns.clone(), level.duration, settings);
        Self { level, editor, repo }
    }

    pub fn editor(&self) -> &TimelineEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut TimelineEditor {
        &mut self.editor
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Persist pending edits; true when nothing is left unsaved
    pub fn save(&mut self) -> bool {
        if !self.editor.is_dirty() {
            return true;
        }
        let saved = self.repo.borrow_mut().save(&self.level, &self.editor.export());
        if saved {
            self.editor.mark_saved();
        }
        saved
    }

    /// Save the current song and load another one (aborts any drag)
    pub fn switch_level(&mut self, level: Level) {
        self.save();
        let pattern = self.repo.borrow().load(&level);
        self.editor.replace_pattern(pattern, level.duration);
        self.level = level;
    }
}

impl<S: Storage> Scene for EditorScene<S> {
    fn name(&self) -> &'static str {
        "editor"
    }

    fn on_enter(&mut self) {
        let pattern = self.repo.borrow().load(&self.level);
        self.editor.replace_pattern(pattern, self.level.duration);
    }

    fn on_exit(&mut self) {
        self.save();
    }

    fn render(&self, surface: &mut dyn RenderSurface) {
        draw_editor(&self.editor, surface);
    }

    fn pointer_down(&mut self, p: Vec2, ctx: &mut SceneContext) {
        // Leaving; the pattern is about to be saved
        if ctx.has_pending() {
            return;
        }
        if done_button().contains(p) {
            ctx.request(Transition::Home);
            return;
        }
        if p.y < HEADER_HEIGHT {
            if let Some(note_type) = palette_at(p) {
                self.editor.set_selected_type(note_type);
            }
            return;
        }
        self.editor.pointer_down(p.x, p.y);
    }

    fn pointer_move(&mut self, p: Vec2, ctx: &mut SceneContext) {
        if ctx.has_pending() {
            return;
        }
        self.editor.pointer_move(p.x, p.y);
    }

    fn pointer_up(&mut self, p: Vec2, ctx: &mut SceneContext) {
        if ctx.has_pending() {
            return;
        }
        self.editor.pointer_up(p.x, p.y);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::audio::{SessionSignal, SilentAudio};
    use crate::editor::palette_center;
    use crate::persistence::MemoryStorage;
    use crate::renderer::CommandList;
    use crate::sim::{GamePhase, NoteEvent, Pattern};
    use crate::{NoteFallError, Result};

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every hook call; optionally requests a transition on update
    struct Probe {
        name: &'static str,
        log: Log,
        leave_on_update: bool,
    }

    impl Scene for Probe {
        fn name(&self) -> &'static str {
            self.name
        }
        fn on_enter(&mut self) {
            self.log.borrow_mut().push(format!("{}:enter", self.name));
        }
        fn on_exit(&mut self) {
            self.log.borrow_mut().push(format!("{}:exit", self.name));
        }
        fn update(&mut self, _dt: f32, ctx: &mut SceneContext) {
            self.log.borrow_mut().push(format!("{}:update", self.name));
            if self.leave_on_update {
                ctx.request(Transition::Home);
            }
        }
        fn render(&self, _surface: &mut dyn RenderSurface) {
            self.log.borrow_mut().push(format!("{}:render", self.name));
        }
    }

    fn home_factory(log: &Log) -> SceneFactory {
        let log = log.clone();
        Box::new(move || {
            Box::new(Probe {
                name: "home",
                log: log.clone(),
                leave_on_update: false,
            }) as Box<dyn Scene>
        })
    }

    /// Keeps the signal so tests can fire late callbacks
    #[derive(Default)]
    struct CapturingAudio {
        signal: Rc<RefCell<Option<SessionSignal>>>,
        stopped: Rc<Cell<bool>>,
        cues: Rc<RefCell<Vec<SoundCue>>>,
    }

    impl AudioBackend for CapturingAudio {
        fn play(&mut self, _audio_ref: &str, signal: SessionSignal) -> Result<()> {
            *self.signal.borrow_mut() = Some(signal);
            Ok(())
        }
        fn stop(&mut self) {
            self.stopped.set(true);
        }
        fn cue(&mut self, cue: SoundCue) {
            self.cues.borrow_mut().push(cue);
        }
    }

    struct FailingAudio;

    impl AudioBackend for FailingAudio {
        fn play(&mut self, audio_ref: &str, _signal: SessionSignal) -> Result<()> {
            Err(NoteFallError::Audio(format!("cannot decode {}", audio_ref)))
        }
        fn stop(&mut self) {}
    }

    fn level() -> Level {
        Level::new("Scene Test", "scene.ogg", 1.0)
            .with_spawns(Pattern::from_events(vec![NoteEvent::new(0.0, 1, 0)]))
    }

    fn editor_level() -> Level {
        Level::new("Editor Test", "editor.ogg", 30.0)
            .with_spawns(Pattern::from_events(vec![NoteEvent::new(0.0, 1, 0)]))
    }

    #[test]
    fn test_transition_applied_after_render() {
        let log: Log = Rc::default();
        let mut driver = SceneDriver::new(home_factory(&log));
        driver.request(Transition::To(Box::new(Probe {
            name: "leaver",
            log: log.clone(),
            leave_on_update: true,
        })));
        let mut surface = CommandList::new();
        driver.frame(0.016, &mut surface);
        assert_eq!(driver.current_name(), "leaver");

        log.borrow_mut().clear();
        driver.frame(0.016, &mut surface);
        assert_eq!(
            *log.borrow(),
            vec!["leaver:update", "leaver:render", "leaver:exit", "home:enter"]
        );
        assert_eq!(driver.current_name(), "home");
        assert!(!driver.has_pending());
    }

    #[test]
    fn test_leaving_play_invalidates_audio_signal() {
        let log: Log = Rc::default();
        let audio = CapturingAudio::default();
        let signal = audio.signal.clone();
        let stopped = audio.stopped.clone();

        let mut driver = SceneDriver::new(home_factory(&log));
        driver.request(Transition::To(Box::new(PlayScene::new(
            level(),
            Settings::default(),
            7,
            Box::new(audio),
        ))));
        let mut surface = CommandList::new();
        driver.frame(0.016, &mut surface);
        assert_eq!(driver.current_name(), "play");
        let late = signal.borrow().clone().unwrap();
        assert!(late.is_live());

        driver.request(Transition::Home);
        driver.frame(0.016, &mut surface);
        assert!(stopped.get());
        assert!(!late.is_live());
        late.ended();
        late.errored("device lost");
        assert_eq!(driver.current_name(), "home");
    }

    #[test]
    fn test_audio_end_delivered_on_next_update() {
        let audio = CapturingAudio::default();
        let signal = audio.signal.clone();
        let cues = audio.cues.clone();
        let mut scene = PlayScene::new(level(), Settings::default(), 7, Box::new(audio));
        let mut ctx = SceneContext::default();
        scene.on_enter();
        assert!(scene.state().audio_timeline);

        signal.borrow().as_ref().unwrap().ended();
        scene.update(0.016, &mut ctx);
        assert_eq!(scene.state().phase, GamePhase::Ended);
        assert_eq!(*cues.borrow(), vec![SoundCue::SessionEnd]);
    }

    #[test]
    fn test_audio_start_failure_ends_session() {
        let mut scene = PlayScene::new(level(), Settings::default(), 7, Box::new(FailingAudio));
        let mut ctx = SceneContext::default();
        scene.on_enter();
        scene.update(0.016, &mut ctx);
        assert!(scene.state().is_over());
    }

    #[test]
    fn test_silent_session_returns_home() {
        let log: Log = Rc::default();
        let mut driver = SceneDriver::new(home_factory(&log));
        driver.request(Transition::To(Box::new(PlayScene::new(
            level(),
            Settings::default(),
            3,
            Box::new(SilentAudio),
        ))));
        let mut surface = CommandList::new();
        driver.frame(0.016, &mut surface);
        assert_eq!(driver.current_name(), "play");

        let mut frames = 0;
        while driver.current_name() == "play" && frames < 2000 {
            surface.clear_commands();
            driver.frame(1.0 / 60.0, &mut surface);
            frames += 1;
        }
        assert_eq!(driver.current_name(), "home");
        assert!(surface.texts().any(|t| t == "FINISHED"));
    }

    #[test]
    fn test_editor_saves_on_exit() {
        let repo = Rc::new(RefCell::new(PatternRepository::new(MemoryStorage::new())));
        let log: Log = Rc::default();
        let mut driver = SceneDriver::new(home_factory(&log));
        driver.request(Transition::To(Box::new(EditorScene::new(
            editor_level(),
            &Settings::default(),
            repo.clone(),
        ))));
        let mut surface = CommandList::new();
        driver.frame(0.016, &mut surface);
        assert_eq!(driver.current_name(), "editor");

        // Pick type 2, then tap empty track in lane 3 (local y 100 -> 2.0s)
        let swatch = palette_center(2);
        driver.pointer_down(swatch.x, swatch.y);
        driver.pointer_up(swatch.x, swatch.y);
        driver.pointer_down(330.0, HEADER_HEIGHT + 100.0);
        driver.pointer_up(330.0, HEADER_HEIGHT + 100.0);

        let done = done_button().center();
        driver.pointer_down(done.x, done.y);
        assert!(driver.has_pending());
        driver.frame(0.016, &mut surface);
        assert_eq!(driver.current_name(), "home");

        let saved = repo.borrow().get(&editor_level()).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved.get(1), Some(&NoteEvent::new(2.0, 3, 2)));
    }

    #[test]
    fn test_editor_ignores_input_after_done() {
        let repo = Rc::new(RefCell::new(PatternRepository::new(MemoryStorage::new())));
        let mut scene = EditorScene::new(editor_level(), &Settings::default(), repo);
        let mut ctx = SceneContext::default();
        scene.on_enter();

        let done = done_button().center();
        scene.pointer_down(done, &mut ctx);
        assert!(ctx.has_pending());
        let track = Vec2::new(330.0, HEADER_HEIGHT + 100.0);
        scene.pointer_down(track, &mut ctx);
        scene.pointer_up(track, &mut ctx);
        assert_eq!(scene.editor().pattern().len(), 1);
        assert!(!scene.editor().is_dirty());
    }

    #[test]
    fn test_switch_level_keeps_edits() {
        let repo = Rc::new(RefCell::new(PatternRepository::new(MemoryStorage::new())));
        let mut scene = EditorScene::new(editor_level(), &Settings::default(), repo.clone());
        scene.on_enter();
        scene.editor_mut().toggle_at(Vec2::new(10.0, 50.0));
        assert!(scene.editor().is_dirty());

        let other = Level::new("Other", "other.ogg", 20.0);
        scene.switch_level(other.clone());
        assert_eq!(scene.level(), &other);
        assert!(scene.editor().pattern().is_empty());
        assert_eq!(repo.borrow().load(&editor_level()).len(), 2);
    }
}

//! Note Fall headless runner
//!
//! Plays every built-in level with silent audio and an autopilot pointer,
//! then logs the results. Authored patterns and settings are read from the
//! directory named by `NOTE_FALL_DATA` when it is set.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use note_fall::persistence::{FileStorage, MemoryStorage};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Note Fall (headless) starting...");

    match std::env::var("NOTE_FALL_DATA") {
        Ok(dir) => {
            log::info!("Using pattern storage at {}", dir);
            native::run(FileStorage::new(dir));
        }
        Err(_) => native::run(MemoryStorage::new()),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library and drive scenes themselves
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use note_fall::Settings;
    use note_fall::audio::SilentAudio;
    use note_fall::persistence::{PatternRepository, Storage};
    use note_fall::renderer::CommandList;
    use note_fall::scene::{PlayScene, Scene, SceneContext};
    use note_fall::sim::{GameState, Level};

    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Hard stop for levels whose session never ends
    const MAX_FRAMES: u32 = 60 * 60 * 10;

    pub fn run<S: Storage>(storage: S) {
        let settings = Settings::load(&storage);
        let repo = PatternRepository::new(storage);

        for (i, level) in Level::builtin().iter().enumerate() {
            let level = repo.resolve_level(level);
            log::info!(
                "Playing '{}' ({} notes, {:.0}s)",
                level.title,
                level.spawns.len(),
                level.duration
            );
            let (score, misses) = play(level, settings.clone(), i as u64 + 1);
            log::info!("Result: score {} with {} misses", score, misses);
        }
    }

    /// Run one session to completion, steering toward the lowest note
    fn play(level: Level, settings: Settings, seed: u64) -> (u64, u32) {
        let mut scene = PlayScene::new(level, settings, seed, Box::new(SilentAudio));
        let mut ctx = SceneContext::default();
        let mut surface = CommandList::new();
        scene.on_enter();

        let mut frames = 0;
        while !ctx.has_pending() && frames < MAX_FRAMES {
            if let Some(x) = autopilot_x(scene.state()) {
                scene.pointer_move(glam::Vec2::new(x, 0.0), &mut ctx);
            }
            scene.update(FRAME_DT, &mut ctx);
            surface.clear_commands();
            scene.render(&mut surface);
            frames += 1;
        }
        if frames >= MAX_FRAMES {
            log::warn!("Session did not finish within {} frames", MAX_FRAMES);
        }
        log::debug!("Last frame issued {} draw commands", surface.commands.len());

        let score = scene.state().score;
        scene.on_exit();
        (score.score, score.misses)
    }

    fn autopilot_x(state: &GameState) -> Option<f32> {
        state
            .entities
            .iter()
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|e| e.pos.x)
    }
}

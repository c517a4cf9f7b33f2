//! Screens demo
//!
//! Runs the demo screens through the engine's fixed-step loop. Without the
//! `window` feature every frame goes to the recording headless backend and a
//! summary is logged; with it, `--window` opens a GLFW window and renders
//! through OpenGL.
//!
//! ```text
//! screens_demo [--frames N] [--config demo.toml] [--screen showcase|light_field] [--window]
//! ```

mod screens;
#[cfg(feature = "window")]
mod window;

use std::path::{Path, PathBuf};

use clap::Parser;
use deferred_engine::foundation::logging;
use deferred_engine::prelude::*;
use thiserror::Error;

const DEFAULT_CONFIG: &str = "demo.toml";
const DEFAULT_FRAMES: u32 = 600;
const FRAME_TIME: f32 = 1.0 / 60.0;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] deferred_engine::core::ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[cfg(feature = "window")]
    #[error("Window error: {0}")]
    Window(#[from] window::WindowError),
}

/// Runs the demo screens headless or in a window
#[derive(Parser, Debug)]
#[command(name = "screens_demo", version)]
struct Options {
    /// Frames to run in headless mode
    #[arg(long, value_name = "N", default_value_t = DEFAULT_FRAMES)]
    frames: u32,

    /// Application config file (TOML, RON or JSON); demo.toml is used when present
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Screen to start on
    #[arg(long, default_value = screens::DEFAULT_SCREEN)]
    screen: String,

    /// Open a window instead of rendering headless
    #[arg(long = "window")]
    windowed: bool,
}

fn load_config(path: Option<&Path>) -> Result<ApplicationConfig, DemoError> {
    let config = match path {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => ApplicationConfig::load_from_file(DEFAULT_CONFIG)?,
        None => ApplicationConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "audio")]
fn audio_system() -> AudioSystem {
    use deferred_engine::audio::{AudioBackendConfig, RodioBackend};

    match AudioSystem::new(Box::new(RodioBackend::new()), &AudioBackendConfig::default()) {
        Ok(audio) => audio,
        Err(e) => {
            log::warn!("Audio disabled: {}", e);
            AudioSystem::silent()
        }
    }
}

#[cfg(not(feature = "audio"))]
fn audio_system() -> AudioSystem {
    AudioSystem::silent()
}

/// Build an engine on `backend` with every screen registered and the
/// requested one active
fn build_engine(config: ApplicationConfig, backend: Box<dyn RenderBackend>, screen: &str) -> Result<Engine, DemoError> {
    let mut engine = Engine::new(config, backend)?.with_audio(audio_system());
    screens::register_all(&mut engine)?;
    engine.switch_screen(screen)?;
    Ok(engine)
}

fn run_headless(config: ApplicationConfig, options: &Options) -> Result<(), DemoError> {
    let mut engine = build_engine(config, Box::new(HeadlessBackend::new()), &options.screen)?;

    let mut totals = FrameStats::default();
    for frame in 0..options.frames {
        // Visit the other screen halfway through
        if frame == options.frames / 2 {
            engine.handle_event(InputEvent::Key { key: KeyCode::Tab, pressed: true })?;
            engine.handle_event(InputEvent::Key { key: KeyCode::Tab, pressed: false })?;
        }
        let stats = engine.frame(FRAME_TIME)?;
        totals.draw_calls += stats.draw_calls;
        totals.shadow_draw_calls += stats.shadow_draw_calls;
        totals.lights_rendered += stats.lights_rendered;
        totals.skipped_entries += stats.skipped_entries;
        totals.culled_entries += stats.culled_entries;

        if frame % 120 == 0 {
            log::info!(
                "[{}] frame {}: {} draws, {} shadow draws, {} lights",
                engine.active_screen().unwrap_or("-"),
                frame,
                stats.draw_calls,
                stats.shadow_draw_calls,
                stats.lights_rendered
            );
        }
        if !engine.is_running() {
            break;
        }
    }

    log::info!(
        "Rendered {} frames: {} draws, {} shadow draws, {} lights, {} culled, {} stale",
        options.frames,
        totals.draw_calls,
        totals.shadow_draw_calls,
        totals.lights_rendered,
        totals.culled_entries,
        totals.skipped_entries
    );
    engine.shutdown();
    Ok(())
}

fn run() -> Result<(), DemoError> {
    let options = Options::parse();
    let config = load_config(options.config.as_deref())?;
    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting screens demo ({:?})", options);

    if options.windowed {
        #[cfg(feature = "window")]
        return window::run(config, &options.screen);
        #[cfg(not(feature = "window"))]
        log::warn!("Built without the `window` feature; running headless");
    }
    run_headless(config, &options)
}

fn main() {
    if let Err(e) = run() {
        // Logging may not be up yet when config loading fails
        eprintln!("screens_demo: {}", e);
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Options::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let options = Options::try_parse_from(["screens_demo"]).unwrap();
        assert_eq!(options.frames, DEFAULT_FRAMES);
        assert_eq!(options.screen, screens::DEFAULT_SCREEN);
        assert!(options.config.is_none());
        assert!(!options.windowed);
    }

    #[test]
    fn test_all_options() {
        let options = Options::try_parse_from([
            "screens_demo", "--frames", "30", "--config", "other.ron", "--screen", "light_field", "--window",
        ])
        .unwrap();
        assert_eq!(options.frames, 30);
        assert_eq!(options.config.as_deref(), Some(Path::new("other.ron")));
        assert_eq!(options.screen, "light_field");
        assert!(options.windowed);
    }

    #[test]
    fn test_rejects_bad_frame_count() {
        assert!(Options::try_parse_from(["screens_demo", "--frames", "many"]).is_err());
        assert!(Options::try_parse_from(["screens_demo", "--speed", "2"]).is_err());
    }
}

pub mod config;
pub mod error;
pub mod input_manager;
pub mod particles;
pub mod renderer;
pub mod state;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use config::Config;
use error::ParticlesError;
use input_manager::InputAction;
use state::{FrameLoopState, LoopEvent, State};

pub const DEFAULT_CONFIG_PATH: &str = "particles.cfg";
pub const DEFAULT_SPRITE_PATH: &str = "particle.png";

pub struct App {
    config: Config,
    sprite_path: PathBuf,
    phase: FrameLoopState,
    state: Option<State>,
    setup_error: Option<ParticlesError>,
}

impl App {
    pub fn new(config: Config, sprite_path: PathBuf) -> Self {
        Self {
            config,
            sprite_path,
            phase: FrameLoopState::Uninitialized,
            state: None,
            setup_error: None,
        }
    }

    pub fn phase(&self) -> FrameLoopState {
        self.phase
    }

    fn advance_phase(&mut self, event: LoopEvent) {
        match self.phase.transition(event) {
            Some(next) => {
                if next != self.phase {
                    log::debug!("Frame loop {:?} -> {:?}", self.phase, next);
                }
                self.phase = next;
            }
            None => log::warn!("Ignoring {:?} while {:?}", event, self.phase),
        }
    }

    fn setup(&self, event_loop: &ActiveEventLoop) -> Result<State, ParticlesError> {
        let mut window_attributes = Window::default_attributes()
            .with_title("particles")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        if self.config.fullscreen {
            window_attributes = window_attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = event_loop
            .create_window(window_attributes)
            .map_err(|e| ParticlesError::ContextCreation(format!("window: {e}")))?;

        pollster::block_on(State::new(Arc::new(window), &self.config, &self.sprite_path))
    }

    fn terminate(&mut self, event_loop: &ActiveEventLoop) {
        self.advance_phase(LoopEvent::CloseRequested);
        event_loop.exit();
    }

    /// The setup error that stopped the event loop, if any.
    pub fn take_setup_error(&mut self) -> Option<ParticlesError> {
        self.setup_error.take()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase != FrameLoopState::Uninitialized {
            return;
        }

        match self.setup(event_loop) {
            Ok(state) => {
                state.request_redraw();
                self.state = Some(state);
                self.advance_phase(LoopEvent::SetupComplete);
            }
            Err(e) => {
                // Reported once by the caller of `run()`.
                self.setup_error = Some(e);
                self.advance_phase(LoopEvent::SetupFailed);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if self.phase == FrameLoopState::Terminated {
                    return;
                }
                self.advance_phase(LoopEvent::FrameStarted);
                if let Some(state) = self.state.as_mut() {
                    state.frame();
                    state.request_redraw();
                }
            }
            _ => {
                if state.input(&event) == InputAction::Exit {
                    self.terminate(event_loop);
                }
            }
        }
    }
}

/// Command line: `particles [CONFIG_PATH] [SPRITE_PATH]`.
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let sprite_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_SPRITE_PATH));

    let config = Config::load(&config_path)?;
    log::info!("Loaded {:?} from {}", config, config_path.display());

    let event_loop = EventLoop::new().map_err(|e| ParticlesError::ContextCreation(format!("event loop: {e}")))?;
    let mut app = App::new(config, sprite_path);

    event_loop
        .run_app(&mut app)
        .map_err(|e| ParticlesError::ContextCreation(format!("event loop: {e}")))?;

    if let Some(e) = app.take_setup_error() {
        return Err(e.into());
    }

    log::info!("Shut down cleanly");
    Ok(())
}

/// Tagged one line description of a fatal error.
pub fn fatal_diagnostic(error: &anyhow::Error) -> String {
    match error.downcast_ref::<ParticlesError>() {
        Some(e) => e.diagnostic(),
        None => format!("[main] {error:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_diagnostic_uses_the_stage_tag() {
        let error: anyhow::Error = ParticlesError::ContextCreation("no adapter".to_string()).into();
        assert_eq!(fatal_diagnostic(&error), "[context] could not create graphics context: no adapter");

        let other = anyhow::anyhow!("boom");
        assert_eq!(fatal_diagnostic(&other), "[main] boom");
    }

    #[test]
    fn app_starts_uninitialized() {
        let mut app = App::new(Config::default(), PathBuf::from(DEFAULT_SPRITE_PATH));
        assert_eq!(app.phase(), FrameLoopState::Uninitialized);
        assert!(app.take_setup_error().is_none());
    }
}

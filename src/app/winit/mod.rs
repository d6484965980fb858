//! Winit-based Demo Runner
//!
//! # Overview
//!
//! - [`App`]: Builder holding the window configuration
//! - `AppRunner`: Internal event loop handler driving one [`Demo`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use glesdemo::app::winit::App;
//! use glesdemo::demos::SphereDemo;
//! use glesdemo::settings::SphereSettings;
//!
//! fn main() -> glesdemo::errors::Result<()> {
//!     App::new()
//!         .with_title("sphere")
//!         .run(SphereDemo::new(SphereSettings::default()))
//! }
//! ```
//!
//! The runner renders one frame per redraw and requests the next redraw as
//! soon as the loop goes idle. Closing the window, releasing Escape or a
//! SIGINT/SIGTERM stops the loop; the demo is deinitialized while its
//! context is still current.

use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::WindowId;

use super::signal::ShutdownSignal;
use super::window::GlWindow;
use crate::demos::Demo;
use crate::errors::{DemoError, Result};
use crate::settings::WindowSettings;

/// Application builder for launching a demo in a window.
#[derive(Debug, Clone, Default)]
pub struct App {
    settings: WindowSettings,
    shutdown: Option<ShutdownSignal>,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole window configuration, usually the one returned by
    /// [`parse_command_line`](super::cli::parse_command_line).
    #[must_use]
    pub fn with_settings(mut self, settings: WindowSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.settings.title = title.into();
        self
    }

    /// Uses `signal` to stop the loop instead of installing the process-wide
    /// SIGINT/SIGTERM handler.
    #[must_use]
    pub fn with_shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    /// Runs `demo` until the window closes.
    ///
    /// Blocks the calling thread. Returns the first fatal error raised while
    /// creating the window or initializing, rendering or tearing down the demo.
    pub fn run<D: Demo>(self, demo: D) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let shutdown = self.shutdown.unwrap_or_else(ShutdownSignal::install_or_warn);
        let mut runner = AppRunner::new(self.settings, shutdown, demo);
        event_loop.run_app(&mut runner)?;

        match runner.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct AppRunner<D: Demo> {
    settings: WindowSettings,
    shutdown: ShutdownSignal,
    demo: D,
    window: Option<GlWindow>,
    modifiers: ModifiersState,

    error: Option<DemoError>,
    frames: u64,
    start_time: Instant,
    finished: bool,
}

impl<D: Demo> AppRunner<D> {
    fn new(settings: WindowSettings, shutdown: ShutdownSignal, demo: D) -> Self {
        Self {
            settings,
            shutdown,
            demo,
            window: None,
            modifiers: ModifiersState::empty(),
            error: None,
            frames: 0,
            start_time: Instant::now(),
            finished: false,
        }
    }

    fn fail(&mut self, err: DemoError) {
        log::error!("{}: {err}", self.demo.name());
        if self.error.is_none() {
            self.error = Some(err);
        }
        if let Some(window) = &mut self.window {
            window.stop();
        }
    }

    fn render_frame(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        match self.demo.render_frame(window.driver()) {
            Ok(()) => {}
            Err(DemoError::ForeignContext) => {
                log::warn!("{}: context changed, frame skipped", self.demo.name());
                return;
            }
            Err(err) => {
                self.fail(err);
                return;
            }
        }
        if let Err(err) = window.swap_buffers() {
            self.fail(err);
            return;
        }
        self.frames += 1;
    }

    /// Deinitializes the demo and releases the context. Runs once.
    fn finish(&mut self, event_loop: &ActiveEventLoop) {
        if self.finished {
            return;
        }
        self.finished = true;

        if let Some(mut window) = self.window.take() {
            if let Err(err) = self.demo.deinit(window.driver()) {
                log::error!("{}: deinit failed: {err}", self.demo.name());
                self.error = self.error.take().or(Some(err));
            }
            if let Err(err) = window.shutdown() {
                log::error!("{}: shutdown failed: {err}", self.demo.name());
                self.error = self.error.take().or(Some(err));
            }
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            log::info!(
                "{}: {} frames in {elapsed:.2}s ({:.1} fps)",
                self.demo.name(),
                self.frames,
                self.frames as f64 / elapsed
            );
        }
        event_loop.exit();
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Released {
            return;
        }
        if event.logical_key == Key::Named(NamedKey::Escape)
            && !self.modifiers.alt_key()
            && !self.modifiers.control_key()
            && let Some(window) = &mut self.window
        {
            window.stop();
        }
    }
}

impl<D: Demo> ApplicationHandler for AppRunner<D> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.finished {
            return;
        }

        log::info!("{}: creating window", self.demo.name());
        let window = match GlWindow::create(event_loop, &self.settings, self.demo.requires_depth()) {
            Ok(window) => window,
            Err(err) => {
                self.fail(err);
                self.finish(event_loop);
                return;
            }
        };

        let init = self.demo.init(window.driver());
        self.window = Some(window);
        if let Err(err) = init {
            self.fail(err);
            self.finish(event_loop);
            return;
        }

        self.start_time = Instant::now();
        self.frames = 0;
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.window.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(window) = &mut self.window {
                    window.stop();
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = &self.window {
                    window.resize(size.width, size.height);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::RedrawRequested => self.render_frame(),
            _ => {}
        }

        if self.window.as_ref().is_some_and(|window| !window.is_running()) {
            self.finish(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.shutdown.is_raised() {
            if let Some(window) = &mut self.window {
                window.stop();
            }
            self.finish(event_loop);
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.finish(event_loop);
    }
}

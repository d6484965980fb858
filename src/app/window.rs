//! EGL window bootstrap.
//!
//! [`GlWindow`] owns a winit window together with the glutin display,
//! surface and GL ES 2 context created for it, and the [`GlowDriver`] loaded
//! from that context. The context is made current on creation and stays
//! current until [`GlWindow::shutdown`].

use std::ffi::CStr;
use std::num::NonZeroU32;
use std::rc::Rc;

use glutin::config::{Api, ConfigTemplateBuilder};
use glutin::context::{
    AsRawContext, ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, RawContext, Version,
};
use glutin::display::{AsRawDisplay, Display, DisplayApiPreference, RawDisplay};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window};

use crate::errors::{DemoError, Result};
use crate::gl::{ContextId, GlDriver, GlowDriver};
use crate::settings::WindowSettings;

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

#[allow(unreachable_patterns)]
fn context_id(display: &Display, context: &PossiblyCurrentContext) -> ContextId {
    let display = match display.raw_display() {
        RawDisplay::Egl(ptr) => ptr as usize,
        _ => 0,
    };
    let context = match context.raw_context() {
        RawContext::Egl(ptr) => ptr as usize,
        _ => 0,
    };
    ContextId::new(display, context)
}

/// A window with a current GL ES 2 context.
///
/// Field order is drop order: GL state goes before the window it renders to.
pub struct GlWindow {
    gl: GlowDriver,
    surface: Option<Surface<WindowSurface>>,
    context: Option<Rc<PossiblyCurrentContext>>,
    display: Display,
    window: Window,
    running: bool,
}

impl GlWindow {
    /// Creates the window, the EGL display, config, surface and context, and
    /// makes the context current.
    pub fn create(event_loop: &ActiveEventLoop, settings: &WindowSettings, depth: bool) -> Result<Self> {
        let mut attributes = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(PhysicalSize::new(settings.width, settings.height));
        if settings.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = event_loop.create_window(attributes)?;

        let display_handle = window.display_handle()?.as_raw();
        let display = unsafe { Display::new(display_handle, DisplayApiPreference::Egl)? };

        let template = ConfigTemplateBuilder::new()
            .with_api(Api::GLES2)
            .with_alpha_size(0)
            .with_depth_size(if depth { 16 } else { 0 })
            .with_transparency(false)
            .build();
        let config = unsafe { display.find_configs(template)? }
            .next()
            .ok_or_else(|| DemoError::Window("no EGL config supports GL ES 2".to_string()))?;

        let (width, height): (u32, u32) = window.inner_size().into();
        let raw_window_handle = window.window_handle()?.as_raw();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            non_zero(width),
            non_zero(height),
        );
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes)? };

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(2, 0))))
            .build(Some(raw_window_handle));
        let context = unsafe { display.create_context(&config, &context_attributes)? }.make_current(&surface)?;

        let interval = if settings.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            log::warn!("failed to set swap interval: {err}");
        }

        let gl = unsafe { glow::Context::from_loader_function_cstr(|s: &CStr| display.get_proc_address(s)) };
        let gl = GlowDriver::new(gl);
        let context = Rc::new(context);
        gl.context_tracker()
            .attach(context_id(&display, &context), &context, |context: &PossiblyCurrentContext| {
                context.is_current()
            });
        gl.log_driver_info();
        gl.set_viewport(0, 0, width as i32, height as i32);

        log::info!(
            "window {width}x{height}{}, vsync {}",
            if settings.fullscreen { " fullscreen" } else { "" },
            if settings.vsync { "on" } else { "off" }
        );

        Ok(Self {
            gl,
            surface: Some(surface),
            context: Some(context),
            display,
            window,
            running: true,
        })
    }

    #[must_use]
    pub fn driver(&self) -> &GlowDriver {
        &self.gl
    }

    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Current drawable size in pixels.
    #[must_use]
    pub fn target_size(&self) -> (u32, u32) {
        self.window.inner_size().into()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Clears the running flag; the runner shuts down after the current event.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Presents the back buffer.
    pub fn swap_buffers(&self) -> Result<()> {
        match (&self.surface, &self.context) {
            (Some(surface), Some(context)) => Ok(surface.swap_buffers(&**context)?),
            _ => Err(DemoError::Window("swap after shutdown".to_string())),
        }
    }

    /// Resizes the surface and the viewport; zero sizes are ignored.
    pub fn resize(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("ignoring resize to {width}x{height}");
            return;
        }
        if let (Some(surface), Some(context)) = (&self.surface, &self.context) {
            surface.resize(&**context, non_zero(width), non_zero(height));
            self.gl.set_viewport(0, 0, width as i32, height as i32);
        }
    }

    /// Releases the context and drops the surface.
    pub fn shutdown(&mut self) -> Result<()> {
        self.running = false;
        self.gl.context_tracker().detach();
        let released = match self.context.take().map(Rc::try_unwrap) {
            Some(Ok(context)) => context.make_not_current().map(drop),
            Some(Err(_)) => {
                log::warn!("GL context still referenced at shutdown; left current");
                Ok(())
            }
            None => Ok(()),
        };
        self.surface = None;
        log::info!("GL context released");
        Ok(released?)
    }
}

//! Demo Applications
//!
//! Each demo owns the GL objects it draws with and follows the same
//! lifecycle:
//!
//! 1. [`Demo::init`] captures the current context and creates every
//!    resource. Any failure tears down what was created so far.
//! 2. [`Demo::render_frame`] draws one frame, checking that the captured
//!    context is still current.
//! 3. [`Demo::deinit`] deletes everything. It refuses to run against a
//!    foreign context and is a no-op once resources are gone.
//!
//! The window runner in [`crate::app::winit`] drives a single demo; tests
//! drive them directly against the in-memory `HeadlessDriver`.

pub mod hello;
pub mod sphere;

pub use hello::HelloDemo;
pub use sphere::SphereDemo;

use crate::errors::Result;
use crate::gl::GlDriver;
use crate::renderer::context::LifecycleState;

/// A self-contained GL ES 2 demo.
pub trait Demo {
    /// Short name used in logs and the window title.
    fn name(&self) -> &'static str;

    /// Whether the surface needs a depth buffer.
    fn requires_depth(&self) -> bool {
        false
    }

    fn init<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()>;

    fn render_frame<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()>;

    fn deinit<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()>;

    fn state(&self) -> LifecycleState;

    /// True while GL objects created by `init` have not been deleted. A demo
    /// dropped in this state leaks them and logs a warning.
    fn holds_resources(&self) -> bool;
}

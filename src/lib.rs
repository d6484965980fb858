//! OpenGL ES 2 demo toolkit.
//!
//! Shader compilation with source patches, program linking, a polar UV
//! sphere generator, buffer and texture upload helpers, and two demos
//! ([`SphereDemo`], [`HelloDemo`]) that own their GL resources through an
//! init / render / deinit lifecycle.
//!
//! All GL access goes through the [`GlDriver`] trait. [`GlowDriver`] wraps a
//! real context created by [`app::GlWindow`]; `HeadlessDriver` (behind the
//! default `headless` feature) emulates one in memory so the lifecycle can be
//! exercised without a display.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use glesdemo::{App, SphereDemo, SphereSettings};
//!
//! fn main() -> glesdemo::Result<()> {
//!     App::new().run(SphereDemo::new(SphereSettings::default()))
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod assets;
pub mod demos;
pub mod errors;
pub mod gl;
pub mod renderer;
pub mod resources;
pub mod settings;

pub use app::App;
pub use demos::{Demo, HelloDemo, SphereDemo};
pub use errors::{DemoError, Result};
pub use gl::{GlDriver, GlowDriver};
#[cfg(feature = "headless")]
pub use gl::HeadlessDriver;
pub use resources::primitives::{SphereOptions, build_polar_sphere};
pub use settings::{HelloSettings, SphereSettings, WindowSettings};

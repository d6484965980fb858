//! Windowed Demo Host
//!
//! - [`cli`]: bootstrap and `-app` command line options
//! - [`window`]: winit window plus glutin EGL context
//! - [`signal`]: SIGINT / SIGTERM shutdown flag
//! - [`winit`]: the event loop runner

pub mod cli;
pub mod signal;
pub mod window;
pub mod winit;

pub use cli::{AppOptions, parse_command_line, usage};
pub use signal::ShutdownSignal;
pub use window::GlWindow;
pub use self::winit::App;

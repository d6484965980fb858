//! Bump-mapped rotating sphere.
//!
//! ```text
//! sphere [-f] [-n] [-s WIDTHxHEIGHT] [-app normal_map rockwall_NH.raw 64 64] [-app tile 4]
//! ```

use std::process::ExitCode;

use anyhow::Context;
use glesdemo::app::{App, parse_command_line};
use glesdemo::{SphereDemo, SphereSettings, WindowSettings};

fn run(window: WindowSettings, sphere: SphereSettings) -> anyhow::Result<()> {
    App::new()
        .with_settings(window)
        .run(SphereDemo::new(sphere))
        .context("sphere demo failed")
}

fn main() -> ExitCode {
    env_logger::init();

    let mut sphere = SphereSettings::default();
    let window = match parse_command_line(std::env::args(), &mut sphere) {
        Ok(window) => window,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match run(window.with_title("sphere"), sphere) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

//! Two-colour flashing quad.

use std::process::ExitCode;

use anyhow::Context;
use glesdemo::app::{App, parse_command_line};
use glesdemo::{HelloDemo, HelloSettings};

fn main() -> ExitCode {
    env_logger::init();

    let mut hello = HelloSettings::default();
    let window = match parse_command_line(std::env::args(), &mut hello) {
        Ok(window) => window.with_title("hello"),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let result = App::new()
        .with_settings(window)
        .run(HelloDemo::new(hello))
        .context("hello demo failed");
    if let Err(err) = result {
        log::error!("{err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

//! Command line parsing.
//!
//! Bootstrap options configure the window:
//!
//! ```text
//!   -h               Show this help text
//!   -f               Force full screen
//!   -n               Don't sync to vblank
//!   -s WIDTHxHEIGHT  Force surface size
//! ```
//!
//! Everything following `-app` belongs to the demo and is handed to its
//! [`AppOptions`] implementation. Any unrecognised or malformed argument
//! yields [`DemoError::Cli`] carrying the combined usage text.

use crate::assets::texture::TextureDesc;
use crate::errors::{DemoError, Result};
use crate::settings::{HelloSettings, SphereSettings, WindowSettings};

const BOOTSTRAP_USAGE: &str = "\
options:
  -h                 Show this help text
  -f                 Force full screen
  -n                 Don't sync to vblank
  -s WIDTHxHEIGHT    Force surface size
";

/// Demo-specific options introduced by `-app`.
pub trait AppOptions {
    /// Parses the option starting at `args[0]`, the word after `-app`.
    ///
    /// Returns how many arguments were consumed, or `None` when the option is
    /// unknown or its values are malformed.
    fn parse_app_option(&mut self, args: &[String]) -> Option<usize>;

    /// Usage lines for the demo options.
    fn usage(&self) -> &'static str {
        ""
    }
}

impl AppOptions for SphereSettings {
    fn parse_app_option(&mut self, args: &[String]) -> Option<usize> {
        match args.first()?.as_str() {
            option @ ("normal_map" | "albedo_map") => {
                let [_, file, width, height] = args.get(..4)? else {
                    return None;
                };
                let (width, height) = (width.parse().ok()?, height.parse().ok()?);
                let desc = if option == "normal_map" { &mut self.normal_map } else { &mut self.albedo_map };
                *desc = TextureDesc::new(file, width, height);
                Some(4)
            }
            "tile" => {
                self.tile = parse_positive(args.get(1)?)?;
                Some(2)
            }
            "anim_step" => {
                self.anim_step = parse_positive(args.get(1)?)?;
                Some(2)
            }
            _ => None,
        }
    }

    fn usage(&self) -> &'static str {
        "  -app normal_map <filename> <width> <height>  Raw file and dimensions of the normal map
  -app albedo_map <filename> <width> <height>  Raw file and dimensions of the albedo map
  -app tile <n>                                Tile textures n times along U, half as much along V
  -app anim_step <step>                        Rotation step per frame, in radians
"
    }
}

impl AppOptions for HelloSettings {
    fn parse_app_option(&mut self, _args: &[String]) -> Option<usize> {
        None
    }
}

fn parse_size(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once('x')?;
    let (w, h) = (w.parse().ok()?, h.parse().ok()?);
    (w > 0 && h > 0).then_some((w, h))
}

fn parse_positive(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn compose_usage(program: &str, app_usage: &str) -> String {
    let mut text = format!("Usage: {program} [<options>]\n{BOOTSTRAP_USAGE}");
    if !app_usage.is_empty() {
        text.push_str("app options:\n");
        text.push_str(app_usage);
    }
    text
}

/// Full usage text for `program` with the demo's options appended.
#[must_use]
pub fn usage(program: &str, app: &impl AppOptions) -> String {
    compose_usage(program, app.usage())
}

/// Parses `args` (program name first) into window settings, feeding `-app`
/// options to `app`.
pub fn parse_command_line<I>(args: I, app: &mut impl AppOptions) -> Result<WindowSettings>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let program = args.next().unwrap_or_else(|| "glesdemo".to_string());
    let args: Vec<String> = args.collect();

    let app_usage = app.usage();
    let fail = |problem: Option<String>| {
        let text = compose_usage(&program, app_usage);
        DemoError::Cli(match problem {
            Some(problem) => format!("{problem}\n{text}"),
            None => text,
        })
    };

    let mut settings = WindowSettings::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" => return Err(fail(None)),
            "-f" => settings.fullscreen = true,
            "-n" => settings.vsync = false,
            "-s" => {
                let Some((width, height)) = args.get(i + 1).and_then(|v| parse_size(v)) else {
                    return Err(fail(Some("Invalid surface size".to_string())));
                };
                settings.width = width;
                settings.height = height;
                i += 1;
            }
            "-app" => {
                let Some(consumed) = app.parse_app_option(&args[i + 1..]).filter(|&n| n > 0) else {
                    let option = args.get(i + 1).map_or("<missing>", String::as_str);
                    return Err(fail(Some(format!("Invalid app option: {option}"))));
                };
                i += consumed;
            }
            other => return Err(fail(Some(format!("Unrecognised argument: {other}")))),
        }
        i += 1;
    }

    Ok(settings)
}

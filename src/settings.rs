//! Demo Configuration
//!
//! Plain settings structs with defaults matching the stock demos. Every field
//! can be overridden from the command line (see [`crate::app::cli`]) or with
//! the builder-style `with_*` methods.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use glesdemo::settings::{SphereSettings, WindowSettings};
//!
//! let window = WindowSettings::default().with_size(800, 600).with_vsync(false);
//! let sphere = SphereSettings::default()
//!     .with_tile(4.0)
//!     .with_albedo_map("bricks.raw", 256, 256);
//! ```

use std::path::PathBuf;

use crate::assets::texture::TextureDesc;
use crate::renderer::shader::{ShaderPatch, ShaderSource};
use crate::resources::primitives::SphereOptions;

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Window and surface configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Swap interval 1 when set, 0 otherwise.
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "glesdemo".to_string(),
            width: 512,
            height: 512,
            fullscreen: false,
            vsync: true,
        }
    }
}

impl WindowSettings {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }
}

// ---------------------------------------------------------------------------
// Sphere demo
// ---------------------------------------------------------------------------

pub const PHONG_BUMP_TANG_VS: &str = include_str!("../assets/shaders/phong_bump_tang.glslv");
pub const PHONG_BUMP_TANG_FS: &str = include_str!("../assets/shaders/phong_bump_tang.glslf");

/// Configuration of the bump-mapped sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereSettings {
    pub normal_map: TextureDesc,
    pub albedo_map: TextureDesc,
    /// Texture repeats along U; V repeats half as often.
    pub tile: f32,
    /// Rotation advance per frame, in radians.
    pub anim_step: f32,
    pub rows: u32,
    pub cols: u32,
    pub radius: f32,
    pub vertex_shader: ShaderSource,
    pub fragment_shader: ShaderSource,
    pub patches: Vec<ShaderPatch>,
}

impl Default for SphereSettings {
    fn default() -> Self {
        let mesh = SphereOptions::default();
        Self {
            normal_map: TextureDesc::new("rockwall_NH.raw", 64, 64),
            albedo_map: TextureDesc::new("rockwall.raw", 256, 256),
            tile: mesh.tile,
            anim_step: 3.0 / 40.0,
            rows: mesh.rows,
            cols: mesh.cols,
            radius: mesh.radius,
            vertex_shader: ShaderSource::Embedded(PHONG_BUMP_TANG_VS),
            fragment_shader: ShaderSource::Embedded(PHONG_BUMP_TANG_FS),
            patches: Vec::new(),
        }
    }
}

impl SphereSettings {
    /// Mesh parameters for [`build_polar_sphere`](crate::resources::build_polar_sphere).
    #[must_use]
    pub fn sphere_options(&self) -> SphereOptions {
        SphereOptions {
            rows: self.rows,
            cols: self.cols,
            radius: self.radius,
            tile: self.tile,
        }
    }

    #[must_use]
    pub fn with_normal_map(mut self, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        self.normal_map = TextureDesc::new(path, width, height);
        self
    }

    #[must_use]
    pub fn with_albedo_map(mut self, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        self.albedo_map = TextureDesc::new(path, width, height);
        self
    }

    #[must_use]
    pub fn with_tile(mut self, tile: f32) -> Self {
        self.tile = tile;
        self
    }

    #[must_use]
    pub fn with_anim_step(mut self, anim_step: f32) -> Self {
        self.anim_step = anim_step;
        self
    }

    #[must_use]
    pub fn with_grid(mut self, rows: u32, cols: u32) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    #[must_use]
    pub fn with_shaders(mut self, vertex: ShaderSource, fragment: ShaderSource) -> Self {
        self.vertex_shader = vertex;
        self.fragment_shader = fragment;
        self
    }

    #[must_use]
    pub fn with_patch(mut self, find: impl Into<String>, replace: impl Into<String>) -> Self {
        self.patches.push(ShaderPatch::new(find, replace));
        self
    }
}

// ---------------------------------------------------------------------------
// Hello demo
// ---------------------------------------------------------------------------

pub const HELLO_GL_VS: &str = include_str!("../assets/shaders/hello-gl.v.glsl");
pub const HELLO_GL_FS: &str = include_str!("../assets/shaders/hello-gl.f.glsl");

/// Configuration of the flashing quad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloSettings {
    pub vertex_shader: ShaderSource,
    pub fragment_shader: ShaderSource,
    pub patches: Vec<ShaderPatch>,
    /// RGBA colours the quad blends between, bound as 1x1 textures.
    pub colors: [[u8; 4]; 2],
}

impl Default for HelloSettings {
    fn default() -> Self {
        Self {
            vertex_shader: ShaderSource::Embedded(HELLO_GL_VS),
            fragment_shader: ShaderSource::Embedded(HELLO_GL_FS),
            patches: Vec::new(),
            colors: [[255, 128, 0, 255], [0, 64, 255, 255]],
        }
    }
}

impl HelloSettings {
    #[must_use]
    pub fn with_colors(mut self, from: [u8; 4], to: [u8; 4]) -> Self {
        self.colors = [from, to];
        self
    }

    #[must_use]
    pub fn with_shaders(mut self, vertex: ShaderSource, fragment: ShaderSource) -> Self {
        self.vertex_shader = vertex;
        self.fragment_shader = fragment;
        self
    }

    #[must_use]
    pub fn with_patch(mut self, find: impl Into<String>, replace: impl Into<String>) -> Self {
        self.patches.push(ShaderPatch::new(find, replace));
        self
    }
}

//! Flashing full-screen quad.
//!
//! Two 1x1 textures hold the configured colours; the fragment shader mixes
//! them with `blend_factor`, which follows a sine of the sub-second part of
//! the monotonic clock.

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use super::Demo;
use crate::assets::texture::create_solid_texture;
use crate::errors::{DemoError, Result};
use crate::gl::{BufferHandle, GlDriver, ProgramHandle, ShaderHandle, TextureHandle, check_gl_error};
use crate::renderer::attributes::{ActiveAttributes, AttributeSemantic};
use crate::renderer::buffer::upload_buffer;
use crate::renderer::context::{ContextGuard, LifecycleState};
use crate::renderer::shader::{ShaderKind, compile_shader_source, link_program};
use crate::renderer::uniforms::{UniformSemantic, UniformTable};
use crate::resources::primitives::{Quad, QuadVertex, create_quad};
use crate::settings::HelloSettings;

/// Uniforms of `hello-gl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloUniform {
    BlendFactor,
    Texture0,
    Texture1,
}

impl UniformSemantic for HelloUniform {
    const ALL: &'static [Self] = &[Self::BlendFactor, Self::Texture0, Self::Texture1];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::BlendFactor => "blend_factor",
            Self::Texture0 => "textures[0]",
            Self::Texture1 => "textures[1]",
        }
    }
}

/// `sin(frac · 2π) · 0.5 + 0.5` of the sub-second part of `elapsed`.
#[must_use]
pub fn blend_factor(elapsed: Duration) -> f32 {
    let frac = elapsed.subsec_nanos() as f32 / 1e9;
    (frac * TAU).sin() * 0.5 + 0.5
}

#[derive(Debug)]
pub struct HelloDemo {
    settings: HelloSettings,
    state: LifecycleState,
    context: ContextGuard,
    start: Instant,

    quad: Quad,
    textures: [Option<TextureHandle>; 2],
    vertex_shader: Option<ShaderHandle>,
    fragment_shader: Option<ShaderHandle>,
    program: Option<ProgramHandle>,
    vertex_buffer: Option<BufferHandle>,
    element_buffer: Option<BufferHandle>,

    uniforms: UniformTable<HelloUniform>,
    attributes: ActiveAttributes,
}

impl HelloDemo {
    #[must_use]
    pub fn new(settings: HelloSettings) -> Self {
        Self {
            settings,
            state: LifecycleState::Uninitialized,
            context: ContextGuard::default(),
            start: Instant::now(),
            quad: create_quad(),
            textures: [None; 2],
            vertex_shader: None,
            fragment_shader: None,
            program: None,
            vertex_buffer: None,
            element_buffer: None,
            uniforms: UniformTable::new(),
            attributes: ActiveAttributes::new(),
        }
    }

    #[must_use]
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    #[must_use]
    pub fn uniforms(&self) -> &UniformTable<HelloUniform> {
        &self.uniforms
    }

    #[must_use]
    pub fn textures(&self) -> [Option<TextureHandle>; 2] {
        self.textures
    }

    fn try_init<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()> {
        self.context.capture(gl)?;

        for (slot, color) in self.settings.colors.into_iter().enumerate() {
            self.textures[slot] = Some(create_solid_texture(gl, color)?);
        }

        let patches = &self.settings.patches;
        let vertex = compile_shader_source(gl, ShaderKind::Vertex, &self.settings.vertex_shader, patches)?;
        self.vertex_shader = Some(vertex);
        let fragment =
            compile_shader_source(gl, ShaderKind::Fragment, &self.settings.fragment_shader, patches)?;
        self.fragment_shader = Some(fragment);

        let program = link_program(gl, vertex, fragment)?;
        self.program = Some(program);

        self.uniforms = UniformTable::resolve(gl, program);
        self.attributes = ActiveAttributes::resolve(gl, program, &[("position", AttributeSemantic::Position)]);

        let vertex_buffer = gl
            .create_buffer()
            .map_err(|message| DemoError::ObjectAllocation { kind: "buffer", message })?;
        self.vertex_buffer = Some(vertex_buffer);
        let element_buffer = gl
            .create_buffer()
            .map_err(|message| DemoError::ObjectAllocation { kind: "buffer", message })?;
        self.element_buffer = Some(element_buffer);

        upload_buffer(gl, glow::ARRAY_BUFFER, vertex_buffer, self.quad.vertex_bytes())?;
        upload_buffer(gl, glow::ELEMENT_ARRAY_BUFFER, element_buffer, self.quad.index_bytes())?;

        check_gl_error(gl, "hello demo init")
    }

    fn release<G: GlDriver + ?Sized>(&mut self, gl: &G) {
        if let Some(program) = self.program.take() {
            gl.delete_program(program);
        }
        for shader in [self.vertex_shader.take(), self.fragment_shader.take()].into_iter().flatten() {
            gl.delete_shader(shader);
        }
        for texture in self.textures.iter_mut().filter_map(Option::take) {
            gl.delete_texture(texture);
        }
        for buffer in [self.vertex_buffer.take(), self.element_buffer.take()].into_iter().flatten() {
            gl.delete_buffer(buffer);
        }

        self.uniforms.clear();
        self.attributes.clear();
        self.context.release();
    }
}

impl Demo for HelloDemo {
    fn name(&self) -> &'static str {
        "hello"
    }

    fn init<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()> {
        if self.state == LifecycleState::Ready {
            log::warn!("hello demo is already initialized");
            return Ok(());
        }

        self.state = LifecycleState::Initializing;
        match self.try_init(gl) {
            Ok(()) => {
                self.state = LifecycleState::Ready;
                log::info!("hello demo ready");
                Ok(())
            }
            Err(err) => {
                log::error!("hello demo init failed: {err}");
                self.release(gl);
                self.state = LifecycleState::Error;
                Err(err)
            }
        }
    }

    fn render_frame<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()> {
        if self.state != LifecycleState::Ready {
            return Err(DemoError::NotInitialized);
        }
        self.context.check(gl)?;
        let Some(program) = self.program else {
            return Err(DemoError::NotInitialized);
        };

        gl.use_program(Some(program));

        if let Some(location) = self.uniforms.get(HelloUniform::BlendFactor) {
            gl.uniform_1f(location, blend_factor(self.start.elapsed()));
        }
        for (unit, sampler) in [HelloUniform::Texture0, HelloUniform::Texture1].into_iter().enumerate() {
            let (Some(texture), Some(location)) = (self.textures[unit], self.uniforms.get(sampler)) else {
                continue;
            };
            gl.active_texture(unit as u32);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.uniform_1i(location, unit as i32);
        }

        gl.bind_buffer(glow::ARRAY_BUFFER, self.vertex_buffer);
        self.attributes.setup_pointers::<G, QuadVertex>(gl)?;
        self.attributes.enable_all(gl);

        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, self.element_buffer);
        gl.draw_elements_u16(glow::TRIANGLE_STRIP, self.quad.indices.len() as i32, 0);

        self.attributes.disable_all(gl);

        check_gl_error(gl, "hello demo frame")
    }

    fn deinit<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()> {
        if self.context.captured().is_none() {
            return Ok(());
        }
        self.context.check(gl)?;

        self.release(gl);
        self.state = LifecycleState::Destroyed;
        log::info!("hello demo resources released");
        Ok(())
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn holds_resources(&self) -> bool {
        self.context.captured().is_some()
    }
}

impl Drop for HelloDemo {
    fn drop(&mut self) {
        if self.holds_resources() {
            log::warn!("hello demo dropped without deinit; GL objects leak until the context is destroyed");
        }
    }
}

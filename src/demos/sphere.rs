//! Rotating Bump-Mapped Sphere
//!
//! The sphere demo owns two textures, a vertex and a fragment shader, one
//! program, a vertex and an index buffer, and a vertex array object when the
//! driver supports them.
//!
//! # Frame
//!
//! Each frame rotates the sphere by `Rx(angle - π/2) · Ry(angle) · Rz(angle)`,
//! scales x by the viewport aspect (height over width) and flips z into GL
//! screen space. Light and viewer sit at infinity along the screen z axis,
//! so both are passed in object space as `Rᵀ · ẑ` with `w = 0`.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat3, Mat4, Vec3, Vec4};

use super::Demo;
use crate::assets::texture::load_texture;
use crate::errors::{DemoError, Result};
use crate::gl::{
    BufferHandle, GlDriver, ProgramHandle, ShaderHandle, TextureHandle, VertexArrayHandle,
    check_gl_error,
};
use crate::renderer::attributes::{ActiveAttributes, AttributeSemantic};
use crate::renderer::buffer::upload_indexed_mesh;
use crate::renderer::context::{ContextGuard, LifecycleState};
use crate::renderer::shader::{ShaderKind, compile_shader_source, link_program};
use crate::renderer::uniforms::{UniformSemantic, UniformTable};
use crate::resources::mesh::Vertex;
use crate::resources::primitives::build_polar_sphere;
use crate::settings::SphereSettings;

/// Uniforms of `phong_bump_tang`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SphereUniform {
    Mvp,
    LightDirection,
    ViewerDirection,
    NormalMap,
    AlbedoMap,
}

impl UniformSemantic for SphereUniform {
    const ALL: &'static [Self] = &[
        Self::Mvp,
        Self::LightDirection,
        Self::ViewerDirection,
        Self::NormalMap,
        Self::AlbedoMap,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Mvp => "mvp",
            Self::LightDirection => "lp_obj",
            Self::ViewerDirection => "vp_obj",
            Self::NormalMap => "normal_map",
            Self::AlbedoMap => "albedo_map",
        }
    }
}

const ATTRIBUTES: [(&str, AttributeSemantic); 3] = [
    ("at_Vertex", AttributeSemantic::Position),
    ("at_Normal", AttributeSemantic::Normal),
    ("at_MultiTexCoord0", AttributeSemantic::TexCoord),
];

/// Texture slots; the slot index is also the texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    Normal = 0,
    Albedo = 1,
}

impl TextureSlot {
    const ALL: [Self; 2] = [Self::Normal, Self::Albedo];

    fn sampler(self) -> SphereUniform {
        match self {
            Self::Normal => SphereUniform::NormalMap,
            Self::Albedo => SphereUniform::AlbedoMap,
        }
    }
}

/// Resource manager and renderer of the sphere demo.
#[derive(Debug)]
pub struct SphereDemo {
    settings: SphereSettings,
    state: LifecycleState,
    context: ContextGuard,

    textures: [Option<TextureHandle>; 2],
    vertex_shader: Option<ShaderHandle>,
    fragment_shader: Option<ShaderHandle>,
    program: Option<ProgramHandle>,
    vertex_array: Option<VertexArrayHandle>,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,

    uniforms: UniformTable<SphereUniform>,
    attributes: ActiveAttributes,
    face_count: usize,
    angle: f32,
}

impl SphereDemo {
    #[must_use]
    pub fn new(settings: SphereSettings) -> Self {
        Self {
            settings,
            state: LifecycleState::Uninitialized,
            context: ContextGuard::default(),
            textures: [None; 2],
            vertex_shader: None,
            fragment_shader: None,
            program: None,
            vertex_array: None,
            vertex_buffer: None,
            index_buffer: None,
            uniforms: UniformTable::new(),
            attributes: ActiveAttributes::new(),
            face_count: 0,
            angle: 0.0,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SphereSettings {
        &self.settings
    }

    /// Current rotation angle in radians, in `[0, 2π)`.
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.face_count
    }

    #[must_use]
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    #[must_use]
    pub fn texture(&self, slot: TextureSlot) -> Option<TextureHandle> {
        self.textures[slot as usize]
    }

    #[must_use]
    pub fn vertex_buffer(&self) -> Option<BufferHandle> {
        self.vertex_buffer
    }

    #[must_use]
    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    #[must_use]
    pub fn vertex_array(&self) -> Option<VertexArrayHandle> {
        self.vertex_array
    }

    #[must_use]
    pub fn uniforms(&self) -> &UniformTable<SphereUniform> {
        &self.uniforms
    }

    #[must_use]
    pub fn attributes(&self) -> &ActiveAttributes {
        &self.attributes
    }

    /// Object rotation for the current angle.
    #[must_use]
    pub fn rotation(&self) -> Mat3 {
        rotation(self.angle)
    }

    fn try_init<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()> {
        let context = self.context.capture(gl)?;
        log::debug!("sphere demo captured context {context:?}");

        let use_vao = gl.supports_vertex_array_objects();

        gl.enable(glow::CULL_FACE);
        gl.disable(glow::DEPTH_TEST);
        gl.clear_color(0.0, 0.0, 0.0, 1.0);

        // Textures
        self.textures[TextureSlot::Normal as usize] = Some(load_texture(gl, &self.settings.normal_map)?);
        self.textures[TextureSlot::Albedo as usize] = Some(load_texture(gl, &self.settings.albedo_map)?);

        // Program
        let patches = &self.settings.patches;
        let vertex = compile_shader_source(gl, ShaderKind::Vertex, &self.settings.vertex_shader, patches)?;
        self.vertex_shader = Some(vertex);
        let fragment =
            compile_shader_source(gl, ShaderKind::Fragment, &self.settings.fragment_shader, patches)?;
        self.fragment_shader = Some(fragment);

        let program = link_program(gl, vertex, fragment)?;
        self.program = Some(program);

        self.uniforms = UniformTable::resolve(gl, program);
        self.attributes = ActiveAttributes::resolve(gl, program, &ATTRIBUTES);

        // Geometry
        if use_vao {
            let vao = gl
                .create_vertex_array()
                .map_err(|message| DemoError::ObjectAllocation { kind: "vertex array", message })?;
            self.vertex_array = Some(vao);
        }
        let vertex_buffer = gl
            .create_buffer()
            .map_err(|message| DemoError::ObjectAllocation { kind: "buffer", message })?;
        self.vertex_buffer = Some(vertex_buffer);
        let index_buffer = gl
            .create_buffer()
            .map_err(|message| DemoError::ObjectAllocation { kind: "buffer", message })?;
        self.index_buffer = Some(index_buffer);

        let mesh = build_polar_sphere(&self.settings.sphere_options())?;
        upload_indexed_mesh(gl, vertex_buffer, index_buffer, &mesh)?;
        self.face_count = mesh.face_count();

        if let Some(vao) = self.vertex_array {
            gl.bind_vertex_array(Some(vao));
            let bound = self.bind_geometry(gl);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            bound?;
        }

        check_gl_error(gl, "sphere demo init")
    }

    /// Binds both buffers and points the attributes at the vertex layout.
    fn bind_geometry<G: GlDriver + ?Sized>(&self, gl: &G) -> Result<()> {
        gl.bind_buffer(glow::ARRAY_BUFFER, self.vertex_buffer);
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, self.index_buffer);
        self.attributes.setup_pointers::<G, Vertex>(gl)
    }

    /// Deletes every owned object and forgets the captured context.
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
        for buffer in [self.vertex_buffer.take(), self.index_buffer.take()].into_iter().flatten() {
            gl.delete_buffer(buffer);
        }
        if let Some(vao) = self.vertex_array.take() {
            gl.delete_vertex_array(vao);
        }

        self.uniforms.clear();
        self.attributes.clear();
        self.face_count = 0;
        self.context.release();
    }
}

/// `Rz(angle) · Ry(angle) · Rx(angle - π/2)`: the x tilt is applied to the
/// model first.
#[must_use]
pub fn rotation(angle: f32) -> Mat3 {
    Mat3::from_rotation_z(angle) * Mat3::from_rotation_y(angle) * Mat3::from_rotation_x(angle - FRAC_PI_2)
}

/// Model-view-projection for `rotation` on a viewport with the given aspect
/// (height over width).
#[must_use]
pub fn model_view_projection(rotation: Mat3, aspect: f32) -> Mat4 {
    Mat4::from_mat3(Mat3::from_diagonal(Vec3::new(aspect, 1.0, -1.0)) * rotation)
}

/// Object-space direction of a light or viewer at infinity on the screen z axis.
#[must_use]
pub fn eye_direction(rotation: Mat3) -> Vec4 {
    rotation.row(2).extend(0.0)
}

impl Demo for SphereDemo {
    fn name(&self) -> &'static str {
        "sphere"
    }

    fn init<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()> {
        if self.state == LifecycleState::Ready {
            log::warn!("sphere demo is already initialized");
            return Ok(());
        }

        self.state = LifecycleState::Initializing;
        match self.try_init(gl) {
            Ok(()) => {
                self.state = LifecycleState::Ready;
                log::info!(
                    "sphere demo ready: {} faces, {} uniforms, {} attributes, vao {}",
                    self.face_count,
                    self.uniforms.resolved(),
                    self.attributes.len(),
                    if self.vertex_array.is_some() { "on" } else { "off" }
                );
                Ok(())
            }
            Err(err) => {
                log::error!("sphere demo init failed: {err}");
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

        gl.clear(glow::COLOR_BUFFER_BIT);

        let rotation = rotation(self.angle);
        let [_, _, width, height] = gl.viewport();
        let aspect = if width > 0 { height as f32 / width as f32 } else { 1.0 };
        let mvp = model_view_projection(rotation, aspect);
        let eye = eye_direction(rotation).to_array();

        self.angle = (self.angle + self.settings.anim_step) % TAU;

        gl.use_program(Some(program));

        if let Some(location) = self.uniforms.get(SphereUniform::Mvp) {
            gl.uniform_matrix_4(location, &mvp.to_cols_array());
        }
        if let Some(location) = self.uniforms.get(SphereUniform::LightDirection) {
            gl.uniform_4f(location, eye);
        }
        if let Some(location) = self.uniforms.get(SphereUniform::ViewerDirection) {
            gl.uniform_4f(location, eye);
        }

        for slot in TextureSlot::ALL {
            let (Some(texture), Some(location)) = (self.textures[slot as usize], self.uniforms.get(slot.sampler()))
            else {
                continue;
            };
            gl.active_texture(slot as u32);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.uniform_1i(location, slot as i32);
        }

        match self.vertex_array {
            Some(vao) => gl.bind_vertex_array(Some(vao)),
            None => self.bind_geometry(gl)?,
        }

        self.attributes.enable_all(gl);
        gl.draw_elements_u16(glow::TRIANGLES, (self.face_count * 3) as i32, 0);
        self.attributes.disable_all(gl);

        if self.vertex_array.is_some() {
            gl.bind_vertex_array(None);
        }

        check_gl_error(gl, "sphere demo frame")
    }

    fn deinit<G: GlDriver + ?Sized>(&mut self, gl: &G) -> Result<()> {
        if self.context.captured().is_none() {
            return Ok(());
        }
        self.context.check(gl)?;

        self.release(gl);
        self.state = LifecycleState::Destroyed;
        log::info!("sphere demo resources released");
        Ok(())
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn holds_resources(&self) -> bool {
        self.context.captured().is_some()
    }
}

impl Drop for SphereDemo {
    fn drop(&mut self) {
        if self.holds_resources() {
            log::warn!("sphere demo dropped without deinit; GL objects leak until the context is destroyed");
        }
    }
}

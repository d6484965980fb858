//! GL Driver Seam
//!
//! Every GL entry point the demos touch goes through [`GlDriver`]. Two
//! implementations are provided:
//!
//! | Driver | Backing | Use |
//! |--------|---------|-----|
//! | [`GlowDriver`] | `glow::Context` loaded from an EGL context | the real demos |
//! | `HeadlessDriver` | in-memory object tables | tests, no GPU required (`headless` feature) |
//!
//! Object names are carried as non-zero newtypes ([`ShaderHandle`],
//! [`ProgramHandle`], ...). "Unallocated" is `None` at the owner, never a
//! zero name. Enumerants (targets, capabilities, formats) are the plain GL
//! values re-exported by `glow`.

use std::num::NonZeroU32;

use crate::errors::{DemoError, Result};
use crate::renderer::shader::ShaderKind;

pub mod glow_driver;
#[cfg(feature = "headless")]
pub mod headless;

pub use glow_driver::GlowDriver;
#[cfg(feature = "headless")]
pub use headless::HeadlessDriver;

/// GLES2 `LUMINANCE` pixel format.
pub const LUMINANCE: u32 = 0x1909;
/// GLES2 `LUMINANCE_ALPHA` pixel format.
pub const LUMINANCE_ALPHA: u32 = 0x190A;

macro_rules! gl_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wraps a driver-assigned name.
            #[must_use]
            pub const fn from_raw(raw: NonZeroU32) -> Self {
                Self(raw)
            }

            /// The driver-assigned name.
            #[must_use]
            pub const fn raw(self) -> u32 {
                self.0.get()
            }

            #[must_use]
            pub const fn non_zero(self) -> NonZeroU32 {
                self.0
            }
        }
    };
}

gl_handle!(
    /// A shader object name.
    ShaderHandle
);
gl_handle!(
    /// A program object name.
    ProgramHandle
);
gl_handle!(
    /// A buffer object name.
    BufferHandle
);
gl_handle!(
    /// A texture object name.
    TextureHandle
);
gl_handle!(
    /// A vertex array object name (`OES_vertex_array_object` or GL ES 3).
    VertexArrayHandle
);

/// A resolved uniform location. Absent uniforms are `None` at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Identity of the (display, context) pair current on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId {
    pub display: usize,
    pub context: usize,
}

impl ContextId {
    #[must_use]
    pub const fn new(display: usize, context: usize) -> Self {
        Self { display, context }
    }
}

/// The GL ES 2 surface used by the demos.
///
/// Methods take `&self` like `glow::HasContext`; the contract is
/// single-threaded use on the thread owning the current context.
pub trait GlDriver {
    // ─── Context & capabilities ──────────────────────────────────────────

    /// The display/context pair current on this thread, if any.
    fn current_context(&self) -> Option<ContextId>;

    /// `GL_SHADER_COMPILER`; false on binary-only drivers.
    fn has_shader_compiler(&self) -> bool;

    /// Whether vertex array objects are available.
    fn supports_vertex_array_objects(&self) -> bool;

    /// Pops one error flag, `None` for `GL_NO_ERROR`.
    fn get_error(&self) -> Option<u32>;

    // ─── Shaders ─────────────────────────────────────────────────────────

    fn create_shader(&self, kind: ShaderKind) -> std::result::Result<ShaderHandle, String>;
    fn shader_source(&self, shader: ShaderHandle, source: &str);
    fn compile_shader(&self, shader: ShaderHandle);
    fn shader_compile_status(&self, shader: ShaderHandle) -> bool;
    /// `GL_INFO_LOG_LENGTH`, including the terminating NUL if the driver counts it.
    fn shader_info_log_length(&self, shader: ShaderHandle) -> usize;
    /// Copies the info log into `buf`, returning the number of bytes written.
    fn shader_info_log(&self, shader: ShaderHandle, buf: &mut [u8]) -> usize;
    fn delete_shader(&self, shader: ShaderHandle);
    /// `glIsShader` on an arbitrary name.
    fn is_shader(&self, raw: u32) -> bool;

    // ─── Programs ────────────────────────────────────────────────────────

    fn create_program(&self) -> std::result::Result<ProgramHandle, String>;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&self, program: ProgramHandle);
    fn program_link_status(&self, program: ProgramHandle) -> bool;
    fn program_info_log_length(&self, program: ProgramHandle) -> usize;
    fn program_info_log(&self, program: ProgramHandle, buf: &mut [u8]) -> usize;
    fn delete_program(&self, program: ProgramHandle);
    /// `glIsProgram` on an arbitrary name.
    fn is_program(&self, raw: u32) -> bool;
    fn use_program(&self, program: Option<ProgramHandle>);
    fn get_uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn get_attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;
    fn uniform_matrix_4(&self, location: UniformLocation, column_major: &[f32; 16]);
    fn uniform_4f(&self, location: UniformLocation, value: [f32; 4]);
    fn uniform_1f(&self, location: UniformLocation, value: f32);
    fn uniform_1i(&self, location: UniformLocation, value: i32);

    // ─── Buffers ─────────────────────────────────────────────────────────

    fn create_buffer(&self) -> std::result::Result<BufferHandle, String>;
    fn bind_buffer(&self, target: u32, buffer: Option<BufferHandle>);
    fn buffer_data(&self, target: u32, data: &[u8], usage: u32);
    fn delete_buffer(&self, buffer: BufferHandle);

    /// Reads back a buffer's contents. GL ES 2 has no such entry point, so
    /// drivers return `None` unless they can.
    fn read_buffer(&self, _target: u32, _buffer: BufferHandle) -> Option<Vec<u8>> {
        None
    }

    // ─── Textures ────────────────────────────────────────────────────────

    fn create_texture(&self) -> std::result::Result<TextureHandle, String>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: u32, texture: Option<TextureHandle>);
    fn pixel_store_i32(&self, pname: u32, value: i32);
    fn tex_parameter_i32(&self, target: u32, pname: u32, value: i32);
    fn tex_image_2d(&self, target: u32, width: u32, height: u32, format: u32, pixels: &[u8]);
    fn generate_mipmap(&self, target: u32);
    fn delete_texture(&self, texture: TextureHandle);

    // ─── Vertex arrays & attributes ──────────────────────────────────────

    fn create_vertex_array(&self) -> std::result::Result<VertexArrayHandle, String>;
    fn bind_vertex_array(&self, vao: Option<VertexArrayHandle>);
    fn delete_vertex_array(&self, vao: VertexArrayHandle);
    fn enable_vertex_attrib_array(&self, location: u32);
    fn disable_vertex_attrib_array(&self, location: u32);
    fn vertex_attrib_pointer_f32(&self, location: u32, components: i32, stride: i32, offset: i32);

    // ─── Fixed state & drawing ───────────────────────────────────────────

    fn enable(&self, capability: u32);
    fn disable(&self, capability: u32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: u32);
    fn viewport(&self) -> [i32; 4];
    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn draw_elements_u16(&self, mode: u32, count: i32, offset: i32);
}

/// Drains the driver error queue after `operation`, returning the first
/// error as [`DemoError::GlOperation`].
pub fn check_gl_error<G: GlDriver + ?Sized>(gl: &G, operation: &str) -> Result<()> {
    let Some(first) = gl.get_error() else {
        return Ok(());
    };

    let mut extra = 0;
    while gl.get_error().is_some() {
        extra += 1;
    }

    log::error!(
        "GL error {} after {operation}{}",
        error_name(first),
        if extra > 0 { format!(" (+{extra} more)") } else { String::new() }
    );

    Err(DemoError::GlOperation {
        operation: operation.to_string(),
        code: first,
    })
}

/// Symbolic name of a `glGetError` code.
#[must_use]
pub fn error_name(code: u32) -> &'static str {
    match code {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        _ => "unknown GL error",
    }
}

/// Bytes per pixel for an unsized GL ES 2 pixel format.
#[must_use]
pub fn bytes_per_pixel(format: u32) -> Option<usize> {
    match format {
        LUMINANCE | glow::ALPHA => Some(1),
        LUMINANCE_ALPHA => Some(2),
        glow::RGB => Some(3),
        glow::RGBA => Some(4),
        _ => None,
    }
}

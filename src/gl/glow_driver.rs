//! [`GlDriver`] over a `glow::Context`.
//!
//! The window bootstrap loads the function pointers from the EGL display and
//! attaches the context it owns to [`GlowDriver::context_tracker`]; glow
//! itself has no notion of context identity, so every identity check asks
//! the platform whether that context is still current.

use std::num::NonZeroU32;

use glow::{HasContext, PixelUnpackData};

use super::{
    BufferHandle, ContextId, GlDriver, ProgramHandle, ShaderHandle, TextureHandle,
    UniformLocation, VertexArrayHandle,
};
use crate::renderer::context::ContextTracker;
use crate::renderer::shader::ShaderKind;

/// Real GL driver.
///
/// Every call is forwarded to glow inside an `unsafe` block. The owner must
/// only call into the driver while the context it was loaded from is current
/// on the calling thread; [`GlWindow`](crate::app::window::GlWindow) upholds
/// this by owning both.
pub struct GlowDriver {
    gl: glow::Context,
    context: ContextTracker,
    vertex_array_objects: bool,
}

impl GlowDriver {
    #[must_use]
    pub fn new(gl: glow::Context) -> Self {
        let vertex_array_objects = {
            let version = gl.version();
            let extensions = gl.supported_extensions();
            version.major >= 3
                || extensions.contains("GL_OES_vertex_array_object")
                || extensions.contains("GL_ARB_vertex_array_object")
        };

        Self {
            gl,
            context: ContextTracker::new(),
            vertex_array_objects,
        }
    }

    #[must_use]
    pub fn context_tracker(&self) -> &ContextTracker {
        &self.context
    }

    /// Logs vendor, renderer and version strings.
    pub fn log_driver_info(&self) {
        fn norm(value: String) -> String {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                "<unknown>".to_string()
            } else {
                trimmed.to_string()
            }
        }

        unsafe {
            let vendor = norm(self.gl.get_parameter_string(glow::VENDOR));
            let renderer = norm(self.gl.get_parameter_string(glow::RENDERER));
            let version = norm(self.gl.get_parameter_string(glow::VERSION));
            let glsl = norm(self.gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION));
            log::info!("GL driver: {renderer} [{vendor}], {version}, GLSL {glsl}");
        }
        log::info!(
            "vertex array objects: {}",
            if self.vertex_array_objects { "available" } else { "unavailable" }
        );
    }

    fn copy_log(log: &str, buf: &mut [u8]) -> usize {
        let bytes = log.as_bytes();
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        if n < buf.len() {
            buf[n] = 0;
            n + 1
        } else {
            n
        }
    }
}

fn uniform(location: UniformLocation) -> glow::UniformLocation {
    glow::NativeUniformLocation(location.0)
}

impl GlDriver for GlowDriver {
    fn current_context(&self) -> Option<ContextId> {
        self.context.current()
    }

    fn has_shader_compiler(&self) -> bool {
        unsafe { self.gl.get_parameter_i32(glow::SHADER_COMPILER) != 0 }
    }

    fn supports_vertex_array_objects(&self) -> bool {
        self.vertex_array_objects
    }

    fn get_error(&self) -> Option<u32> {
        let code = unsafe { self.gl.get_error() };
        (code != glow::NO_ERROR).then_some(code)
    }

    // ─── Shaders ─────────────────────────────────────────────────────────

    fn create_shader(&self, kind: ShaderKind) -> Result<ShaderHandle, String> {
        let shader = unsafe { self.gl.create_shader(kind.gl_enum())? };
        Ok(ShaderHandle::from_raw(shader.0))
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        unsafe { self.gl.shader_source(glow::NativeShader(shader.non_zero()), source) }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.compile_shader(glow::NativeShader(shader.non_zero())) }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        unsafe { self.gl.get_shader_compile_status(glow::NativeShader(shader.non_zero())) }
    }

    fn shader_info_log_length(&self, shader: ShaderHandle) -> usize {
        let log = unsafe { self.gl.get_shader_info_log(glow::NativeShader(shader.non_zero())) };
        if log.is_empty() { 0 } else { log.len() + 1 }
    }

    fn shader_info_log(&self, shader: ShaderHandle, buf: &mut [u8]) -> usize {
        let log = unsafe { self.gl.get_shader_info_log(glow::NativeShader(shader.non_zero())) };
        Self::copy_log(&log, buf)
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.non_zero())) }
    }

    fn is_shader(&self, raw: u32) -> bool {
        NonZeroU32::new(raw).is_some_and(|name| unsafe { self.gl.is_shader(glow::NativeShader(name)) })
    }

    // ─── Programs ────────────────────────────────────────────────────────

    fn create_program(&self) -> Result<ProgramHandle, String> {
        let program = unsafe { self.gl.create_program()? };
        Ok(ProgramHandle::from_raw(program.0))
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl.attach_shader(
                glow::NativeProgram(program.non_zero()),
                glow::NativeShader(shader.non_zero()),
            );
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        unsafe { self.gl.link_program(glow::NativeProgram(program.non_zero())) }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        unsafe { self.gl.get_program_link_status(glow::NativeProgram(program.non_zero())) }
    }

    fn program_info_log_length(&self, program: ProgramHandle) -> usize {
        let log = unsafe { self.gl.get_program_info_log(glow::NativeProgram(program.non_zero())) };
        if log.is_empty() { 0 } else { log.len() + 1 }
    }

    fn program_info_log(&self, program: ProgramHandle, buf: &mut [u8]) -> usize {
        let log = unsafe { self.gl.get_program_info_log(glow::NativeProgram(program.non_zero())) };
        Self::copy_log(&log, buf)
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.non_zero())) }
    }

    fn is_program(&self, raw: u32) -> bool {
        NonZeroU32::new(raw).is_some_and(|name| unsafe { self.gl.is_program(glow::NativeProgram(name)) })
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.non_zero())));
        }
    }

    fn get_uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.non_zero()), name)
                .map(|location| UniformLocation(location.0))
        }
    }

    fn get_attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        unsafe {
            self.gl
                .get_attrib_location(glow::NativeProgram(program.non_zero()), name)
        }
    }

    fn uniform_matrix_4(&self, location: UniformLocation, column_major: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&uniform(location)), false, column_major);
        }
    }

    fn uniform_4f(&self, location: UniformLocation, value: [f32; 4]) {
        unsafe { self.gl.uniform_4_f32_slice(Some(&uniform(location)), &value) }
    }

    fn uniform_1f(&self, location: UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&uniform(location)), value) }
    }

    fn uniform_1i(&self, location: UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&uniform(location)), value) }
    }

    // ─── Buffers ─────────────────────────────────────────────────────────

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        let buffer = unsafe { self.gl.create_buffer()? };
        Ok(BufferHandle::from_raw(buffer.0))
    }

    fn bind_buffer(&self, target: u32, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl
                .bind_buffer(target, buffer.map(|b| glow::NativeBuffer(b.non_zero())));
        }
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { self.gl.buffer_data_u8_slice(target, data, usage) }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.non_zero())) }
    }

    // ─── Textures ────────────────────────────────────────────────────────

    fn create_texture(&self) -> Result<TextureHandle, String> {
        let texture = unsafe { self.gl.create_texture()? };
        Ok(TextureHandle::from_raw(texture.0))
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, target: u32, texture: Option<TextureHandle>) {
        unsafe {
            self.gl
                .bind_texture(target, texture.map(|t| glow::NativeTexture(t.non_zero())));
        }
    }

    fn pixel_store_i32(&self, pname: u32, value: i32) {
        unsafe { self.gl.pixel_store_i32(pname, value) }
    }

    fn tex_parameter_i32(&self, target: u32, pname: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(target, pname, value) }
    }

    fn tex_image_2d(&self, target: u32, width: u32, height: u32, format: u32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_image_2d(
                target,
                0,
                format as i32,
                width as i32,
                height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn generate_mipmap(&self, target: u32) {
        unsafe { self.gl.generate_mipmap(target) }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.non_zero())) }
    }

    // ─── Vertex arrays & attributes ──────────────────────────────────────

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        let vao = unsafe { self.gl.create_vertex_array()? };
        Ok(VertexArrayHandle::from_raw(vao.0))
    }

    fn bind_vertex_array(&self, vao: Option<VertexArrayHandle>) {
        unsafe {
            self.gl
                .bind_vertex_array(vao.map(|v| glow::NativeVertexArray(v.non_zero())));
        }
    }

    fn delete_vertex_array(&self, vao: VertexArrayHandle) {
        unsafe { self.gl.delete_vertex_array(glow::NativeVertexArray(vao.non_zero())) }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn disable_vertex_attrib_array(&self, location: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(location) }
    }

    fn vertex_attrib_pointer_f32(&self, location: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, stride, offset);
        }
    }

    // ─── Fixed state & drawing ───────────────────────────────────────────

    fn enable(&self, capability: u32) {
        unsafe { self.gl.enable(capability) }
    }

    fn disable(&self, capability: u32) {
        unsafe { self.gl.disable(capability) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { self.gl.clear(mask) }
    }

    fn viewport(&self) -> [i32; 4] {
        let mut vp = [0; 4];
        unsafe { self.gl.get_parameter_i32_slice(glow::VIEWPORT, &mut vp) };
        vp
    }

    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn draw_elements_u16(&self, mode: u32, count: i32, offset: i32) {
        unsafe { self.gl.draw_elements(mode, count, glow::UNSIGNED_SHORT, offset) }
    }
}

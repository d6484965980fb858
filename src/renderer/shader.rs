//! Shader Compilation & Program Linking
//!
//! This module turns GLSL ES source text into linked GL programs.
//!
//! # Overview
//!
//! - [`apply_patches`] rewrites the source with an ordered list of textual
//!   substitutions before it reaches the driver.
//! - [`compile_shader`] checks for a compiler, compiles one stage and reports
//!   the driver log on failure.
//! - [`link_program`] validates both stage handles, links them and reports
//!   the link log on failure.
//!
//! Failed compiles and links never leave an object behind: the shader or
//! program is deleted before the error is returned.
//!
//! # Usage
//!
//! ```rust,ignore
//! let patches = [ShaderPatch::new("highp", "mediump")];
//! let vs = compile_shader(&gl, ShaderKind::Vertex, VS_SOURCE, &patches)?;
//! let fs = compile_shader(&gl, ShaderKind::Fragment, FS_SOURCE, &patches)?;
//! let program = link_program(&gl, vs, fs)?;
//! ```

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::assets::io::load_file;
use crate::errors::{DemoError, Result};
use crate::gl::{GlDriver, ProgramHandle, ShaderHandle, check_gl_error};

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    /// The GL shader type enumerant.
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            ShaderKind::Vertex => glow::VERTEX_SHADER,
            ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderKind::Vertex => "vertex",
            ShaderKind::Fragment => "fragment",
        })
    }
}

// ============================================================================
// Source Patching
// ============================================================================

/// A textual substitution applied to shader source before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPatch {
    pub find: String,
    pub replace: String,
}

impl ShaderPatch {
    #[must_use]
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }

    fn is_noop(&self) -> bool {
        self.find.is_empty() || self.find == self.replace
    }
}

/// Applies `patches` in order, replacing every occurrence of each `find`.
///
/// Scanning resumes after the inserted replacement, so a replacement that
/// contains its own `find` string is not rewritten again. Returns the patched
/// text and the total number of substitutions.
#[must_use]
pub fn apply_patches(source: &str, patches: &[ShaderPatch]) -> (String, usize) {
    let mut text = source.to_string();
    let mut total = 0;

    for patch in patches.iter().filter(|patch| !patch.is_noop()) {
        log::debug!("shader patch: '{}' -> '{}'", patch.find, patch.replace);

        let mut pos = 0;
        while let Some(found) = text[pos..].find(&patch.find) {
            let at = pos + found;
            text.replace_range(at..at + patch.find.len(), &patch.replace);
            pos = at + patch.replace.len();
            total += 1;
        }
    }

    if !patches.is_empty() {
        log::debug!("shader patch substitutions: {total}");
    }
    (text, total)
}

// ============================================================================
// Sources
// ============================================================================

/// Where a shader's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// Text compiled into the binary.
    Embedded(&'static str),
    /// Text read from disk at init.
    File(PathBuf),
}

impl ShaderSource {
    /// Resolves the source text, reading the file if needed.
    pub fn load(&self) -> Result<Cow<'static, str>> {
        match self {
            ShaderSource::Embedded(text) => Ok(Cow::Borrowed(text)),
            ShaderSource::File(path) => read_source(path).map(Cow::Owned),
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    let file = load_file(path, 0)?;
    String::from_utf8(file.data).map_err(|err| DemoError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
    })
}

// ============================================================================
// Compile & Link
// ============================================================================

/// Decodes a driver info log, keeping at most `reported_len` bytes and
/// dropping trailing NULs.
#[must_use]
pub fn diagnostic_text(buf: &[u8], reported_len: usize) -> String {
    let text = &buf[..reported_len.min(buf.len())];
    let end = text.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
    String::from_utf8_lossy(&text[..end]).into_owned()
}

fn read_info_log(len: usize, read: impl FnOnce(&mut [u8]) -> usize) -> String {
    if len == 0 {
        return String::new();
    }
    let mut buf = vec![0u8; len];
    read(&mut buf);
    diagnostic_text(&buf, len)
}

/// Compiles one shader stage from `source` after applying `patches`.
pub fn compile_shader<G: GlDriver + ?Sized>(
    gl: &G,
    kind: ShaderKind,
    source: &str,
    patches: &[ShaderPatch],
) -> Result<ShaderHandle> {
    if !gl.has_shader_compiler() {
        log::error!("no shader compiler present (binary only?)");
        return Err(DemoError::NoCompiler);
    }

    let (text, _) = apply_patches(source, patches);

    let shader = gl
        .create_shader(kind)
        .map_err(|message| DemoError::ObjectAllocation { kind: "shader", message })?;
    if !gl.is_shader(shader.raw()) {
        log::error!("new {kind} shader {} is not a valid shader object", shader.raw());
        gl.delete_shader(shader);
        return Err(DemoError::InvalidHandle {
            kind: "shader",
            raw: shader.raw(),
        });
    }

    gl.shader_source(shader, &text);
    gl.compile_shader(shader);

    if let Err(err) = check_gl_error(gl, "glCompileShader") {
        log::error!("cannot compile {kind} shader (binary only?)");
        gl.delete_shader(shader);
        return Err(err);
    }

    if !gl.shader_compile_status(shader) {
        let log = read_info_log(gl.shader_info_log_length(shader), |buf| {
            gl.shader_info_log(shader, buf)
        });
        log::error!("{kind} shader compile log:\n{log}");
        gl.delete_shader(shader);
        return Err(DemoError::Compile { kind, log });
    }

    Ok(shader)
}

/// Loads `path` through the file loader and compiles it.
pub fn compile_shader_file<G: GlDriver + ?Sized>(
    gl: &G,
    kind: ShaderKind,
    path: &Path,
    patches: &[ShaderPatch],
) -> Result<ShaderHandle> {
    let source = read_source(path)?;
    log::debug!("compiling {kind} shader from {}", path.display());
    compile_shader(gl, kind, &source, patches)
}

pub fn compile_shader_source<G: GlDriver + ?Sized>(
    gl: &G,
    kind: ShaderKind,
    source: &ShaderSource,
    patches: &[ShaderPatch],
) -> Result<ShaderHandle> {
    match source {
        ShaderSource::Embedded(text) => compile_shader(gl, kind, text, patches),
        ShaderSource::File(path) => compile_shader_file(gl, kind, path, patches),
    }
}

/// Links a vertex and a fragment shader into a new program.
///
/// Both handles must name live shader objects. The shaders stay owned by the
/// caller whether or not linking succeeds.
pub fn link_program<G: GlDriver + ?Sized>(
    gl: &G,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
) -> Result<ProgramHandle> {
    for shader in [vertex, fragment] {
        if !gl.is_shader(shader.raw()) {
            log::error!("argument {} is not a valid shader object", shader.raw());
            return Err(DemoError::InvalidHandle {
                kind: "shader",
                raw: shader.raw(),
            });
        }
    }

    let program = gl
        .create_program()
        .map_err(|message| DemoError::ObjectAllocation { kind: "program", message })?;
    if !gl.is_program(program.raw()) {
        log::error!("new program {} is not a valid program object", program.raw());
        gl.delete_program(program);
        return Err(DemoError::InvalidHandle {
            kind: "program",
            raw: program.raw(),
        });
    }

    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);

    if let Err(err) = check_gl_error(gl, "glLinkProgram") {
        gl.delete_program(program);
        return Err(err);
    }

    if !gl.program_link_status(program) {
        let log = read_info_log(gl.program_info_log_length(program), |buf| {
            gl.program_info_log(program, buf)
        });
        log::error!("shader program link log:\n{log}");
        gl.delete_program(program);
        return Err(DemoError::Link { log });
    }

    Ok(program)
}

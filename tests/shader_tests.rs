//! Shader Compile & Link Tests
//!
//! Tests for:
//! - Source patching
//! - Compile diagnostics and cleanup of failed shaders
//! - Binary-only drivers
//! - Link validation, diagnostics and cleanup of failed programs

use std::num::NonZeroU32;

use glesdemo::errors::DemoError;
use glesdemo::gl::headless::ObjectKind;
use glesdemo::gl::{GlDriver, HeadlessDriver, ShaderHandle};
use glesdemo::renderer::shader::{
    ShaderKind, ShaderPatch, ShaderSource, apply_patches, compile_shader, compile_shader_source,
    diagnostic_text, link_program,
};

const VS: &str = "
attribute vec3 at_Vertex;
uniform mat4 mvp;
varying vec2 tcoord;
void main() { tcoord = at_Vertex.xy; gl_Position = mvp * vec4(at_Vertex, 1.0); }
";

const FS: &str = "
precision mediump float;
uniform sampler2D albedo_map;
varying vec2 tcoord;
void main() { gl_FragColor = texture2D(albedo_map, tcoord); }
";

fn compile_pair(gl: &HeadlessDriver) -> (ShaderHandle, ShaderHandle) {
    let vs = compile_shader(gl, ShaderKind::Vertex, VS, &[]).unwrap();
    let fs = compile_shader(gl, ShaderKind::Fragment, FS, &[]).unwrap();
    (vs, fs)
}

// ============================================================================
// Patches
// ============================================================================

#[test]
fn patches_replace_every_occurrence_in_order() {
    let patches = [
        ShaderPatch::new("mediump", "highp"),
        ShaderPatch::new("highp float", "highp float /* patched */"),
    ];
    let (text, count) = apply_patches("precision mediump float; mediump", &patches);
    assert_eq!(text, "precision highp float /* patched */; highp");
    assert_eq!(count, 3);
}

#[test]
fn empty_and_identity_patches_are_skipped() {
    let patches = [ShaderPatch::new("", "x"), ShaderPatch::new("main", "main")];
    let (text, count) = apply_patches(VS, &patches);
    assert_eq!(text, VS);
    assert_eq!(count, 0);
}

#[test]
fn compiled_source_includes_patches() {
    let gl = HeadlessDriver::new();
    let patches = [ShaderPatch::new("mediump", "lowp")];
    let shader = compile_shader(&gl, ShaderKind::Fragment, FS, &patches).unwrap();
    let text = gl.shader_source_text(shader).unwrap();
    assert!(text.contains("precision lowp float"));
    assert!(!text.contains("mediump"));
}

// ============================================================================
// Compile
// ============================================================================

#[test]
fn valid_shader_compiles() {
    let gl = HeadlessDriver::new();
    let shader = compile_shader(&gl, ShaderKind::Vertex, VS, &[]).unwrap();
    assert!(gl.is_shader(shader.raw()));
    assert!(gl.shader_compile_status(shader));
    assert_eq!(gl.pending_errors(), 0);
}

#[test]
fn invalid_shader_reports_log_and_is_deleted() {
    let gl = HeadlessDriver::new();
    match compile_shader(&gl, ShaderKind::Fragment, "void main() { gl_FragColor = vec4(1.0);", &[]) {
        Err(DemoError::Compile { kind, log }) => {
            assert_eq!(kind, ShaderKind::Fragment);
            assert!(log.contains("error"), "log: {log}");
            assert!(!log.ends_with('\0'));
        }
        other => panic!("expected compile error, got {other:?}"),
    }
    assert_eq!(gl.live_count(ObjectKind::Shader), 0);
}

#[test]
fn binary_only_driver_has_no_compiler() {
    let gl = HeadlessDriver::new().without_compiler();
    let result = compile_shader(&gl, ShaderKind::Vertex, VS, &[]);
    assert!(matches!(result, Err(DemoError::NoCompiler)));
    assert_eq!(gl.live_objects(), 0);
}

#[test]
fn pending_gl_error_fails_compile() {
    let gl = HeadlessDriver::new();
    gl.inject_error(glow::INVALID_OPERATION);
    match compile_shader(&gl, ShaderKind::Vertex, VS, &[]) {
        Err(DemoError::GlOperation { code, .. }) => assert_eq!(code, glow::INVALID_OPERATION),
        other => panic!("expected GL error, got {other:?}"),
    }
    assert_eq!(gl.live_count(ObjectKind::Shader), 0);
    assert_eq!(gl.pending_errors(), 0);
}

#[test]
fn shader_file_is_loaded_and_compiled() {
    let path = std::env::temp_dir().join(format!("glesdemo-shader-{}.glslv", std::process::id()));
    std::fs::write(&path, VS).unwrap();

    let gl = HeadlessDriver::new();
    let shader = compile_shader_source(&gl, ShaderKind::Vertex, &ShaderSource::File(path.clone()), &[]).unwrap();
    assert_eq!(gl.shader_source_text(shader).as_deref(), Some(VS));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_shader_file_is_an_io_error() {
    let gl = HeadlessDriver::new();
    let source = ShaderSource::File("does/not/exist.glslf".into());
    let result = compile_shader_source(&gl, ShaderKind::Fragment, &source, &[]);
    assert!(matches!(result, Err(DemoError::Io { .. })));
    assert_eq!(gl.live_objects(), 0);
}

// ============================================================================
// Link
// ============================================================================

#[test]
fn link_resolves_declared_interface() {
    let gl = HeadlessDriver::new();
    let (vs, fs) = compile_pair(&gl);
    let program = link_program(&gl, vs, fs).unwrap();

    assert!(gl.program_link_status(program));
    assert!(gl.get_uniform_location(program, "mvp").is_some());
    assert!(gl.get_uniform_location(program, "albedo_map").is_some());
    assert!(gl.get_uniform_location(program, "normal_map").is_none());
    assert_eq!(gl.get_attrib_location(program, "at_Vertex"), Some(0));
}

#[test]
fn invalid_shader_handle_is_rejected_before_program_creation() {
    let gl = HeadlessDriver::new();
    let (vs, _) = compile_pair(&gl);
    let bogus = ShaderHandle::from_raw(NonZeroU32::new(4242).unwrap());

    match link_program(&gl, vs, bogus) {
        Err(DemoError::InvalidHandle { kind, raw }) => {
            assert_eq!(kind, "shader");
            assert_eq!(raw, 4242);
        }
        other => panic!("expected invalid handle, got {other:?}"),
    }
    assert_eq!(gl.live_count(ObjectKind::Program), 0);
}

#[test]
fn unrecognised_new_shader_is_deleted() {
    let gl = HeadlessDriver::new().with_unrecognised_names(ObjectKind::Shader);
    match compile_shader(&gl, ShaderKind::Vertex, VS, &[]) {
        Err(DemoError::InvalidHandle { kind, .. }) => assert_eq!(kind, "shader"),
        other => panic!("expected invalid handle, got {other:?}"),
    }
    assert_eq!(gl.live_objects(), 0);
}

#[test]
fn unrecognised_new_program_is_deleted() {
    let gl = HeadlessDriver::new().with_unrecognised_names(ObjectKind::Program);
    let (vs, fs) = compile_pair(&gl);

    match link_program(&gl, vs, fs) {
        Err(DemoError::InvalidHandle { kind, .. }) => assert_eq!(kind, "program"),
        other => panic!("expected invalid handle, got {other:?}"),
    }
    assert_eq!(gl.live_count(ObjectKind::Program), 0);
    assert_eq!(gl.live_count(ObjectKind::Shader), 2);
}

#[test]
fn deleted_shader_cannot_be_linked() {
    let gl = HeadlessDriver::new();
    let (vs, fs) = compile_pair(&gl);
    gl.delete_shader(fs);
    assert!(matches!(link_program(&gl, vs, fs), Err(DemoError::InvalidHandle { .. })));
}

#[test]
fn link_failure_reports_log_and_deletes_program() {
    let gl = HeadlessDriver::new();
    let vs = compile_shader(&gl, ShaderKind::Vertex, VS, &[]).unwrap();
    let fs_source = "varying vec3 l_tan; void main() { gl_FragColor = vec4(l_tan, 1.0); }";
    let fs = compile_shader(&gl, ShaderKind::Fragment, fs_source, &[]).unwrap();

    match link_program(&gl, vs, fs) {
        Err(DemoError::Link { log }) => assert!(log.contains("l_tan"), "log: {log}"),
        other => panic!("expected link error, got {other:?}"),
    }
    assert_eq!(gl.live_count(ObjectKind::Program), 0);
    // shaders stay with the caller
    assert_eq!(gl.live_count(ObjectKind::Shader), 2);
}

#[test]
fn two_vertex_shaders_do_not_link() {
    let gl = HeadlessDriver::new();
    let a = compile_shader(&gl, ShaderKind::Vertex, VS, &[]).unwrap();
    let b = compile_shader(&gl, ShaderKind::Vertex, VS, &[]).unwrap();
    assert!(matches!(link_program(&gl, a, b), Err(DemoError::Link { .. })));
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn diagnostics_respect_reported_length() {
    let buf = b"0:3(1): error: bad\0\0\0";
    assert_eq!(diagnostic_text(buf, buf.len()), "0:3(1): error: bad");
    assert_eq!(diagnostic_text(buf, 7), "0:3(1):");
    assert_eq!(diagnostic_text(buf, 0), "");
}

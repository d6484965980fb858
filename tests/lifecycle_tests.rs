//! Demo Lifecycle Tests
//!
//! Tests for:
//! - Sphere demo init / render / deinit against the headless driver
//! - Rollback of partially created resources on every init failure
//! - Context identity checks on render and deinit
//! - Live context tracking for the windowed driver
//! - Uniform and attribute handling per frame
//! - Hello demo quad and blend factor

use std::cell::Cell;
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use glesdemo::demos::hello::blend_factor;
use glesdemo::demos::sphere::{TextureSlot, eye_direction, model_view_projection, rotation};
use glesdemo::demos::{Demo, HelloDemo, SphereDemo};
use glesdemo::errors::DemoError;
use glesdemo::gl::headless::{HEADLESS_CONTEXT, ObjectKind, UniformValue};
use glesdemo::gl::{ContextId, GlDriver, HeadlessDriver};
use glesdemo::renderer::buffer::read_back;
use glesdemo::renderer::context::{ContextTracker, LifecycleState};
use glesdemo::renderer::shader::ShaderSource;
use glesdemo::resources::primitives::build_polar_sphere;
use glesdemo::settings::{HelloSettings, PHONG_BUMP_TANG_VS, SphereSettings};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Raw texture files in a per-test temp directory, removed on drop.
struct TextureFixture {
    dir: PathBuf,
}

impl TextureFixture {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("glesdemo-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        // 4x4 RGBA normal map, 8x8 RGB albedo
        std::fs::write(dir.join("normal.raw"), [128u8; 4 * 4 * 4]).unwrap();
        std::fs::write(dir.join("albedo.raw"), [200u8; 8 * 8 * 3]).unwrap();
        Self { dir }
    }

    fn settings(&self) -> SphereSettings {
        SphereSettings::default()
            .with_normal_map(self.dir.join("normal.raw"), 4, 4)
            .with_albedo_map(self.dir.join("albedo.raw"), 8, 8)
    }
}

impl Drop for TextureFixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

const FS_NORMAL_ONLY: &str = "
precision mediump float;
uniform sampler2D normal_map;
varying vec2 tcoord;
void main() { gl_FragColor = texture2D(normal_map, tcoord); }
";

const FS_UNWRITTEN_VARYING: &str = "
precision mediump float;
varying vec3 bitangent;
void main() { gl_FragColor = vec4(bitangent, 1.0); }
";

// ============================================================================
// Sphere: happy path
// ============================================================================

#[test]
fn sphere_init_creates_every_resource() {
    let fixture = TextureFixture::new("init");
    let gl = HeadlessDriver::new();
    let mut demo = SphereDemo::new(fixture.settings());

    demo.init(&gl).unwrap();

    assert_eq!(demo.state(), LifecycleState::Ready);
    assert_eq!(gl.live_count(ObjectKind::Texture), 2);
    assert_eq!(gl.live_count(ObjectKind::Shader), 2);
    assert_eq!(gl.live_count(ObjectKind::Program), 1);
    assert_eq!(gl.live_count(ObjectKind::Buffer), 2);
    assert_eq!(gl.live_count(ObjectKind::VertexArray), 1);
    assert_eq!(demo.face_count(), 3968);
    assert_eq!(demo.uniforms().resolved(), 5);
    assert_eq!(demo.attributes().len(), 3);
    assert!(gl.is_enabled(glow::CULL_FACE));
    assert!(!gl.is_enabled(glow::DEPTH_TEST));
    assert_eq!(gl.current_clear_color(), [0.0, 0.0, 0.0, 1.0]);

    let normal = gl.texture_info(demo.texture(TextureSlot::Normal).unwrap()).unwrap();
    assert_eq!((normal.width, normal.height, normal.format), (4, 4, glow::RGBA));
    assert!(normal.mipmapped);
    let albedo = gl.texture_info(demo.texture(TextureSlot::Albedo).unwrap()).unwrap();
    assert_eq!((albedo.width, albedo.height, albedo.format), (8, 8, glow::RGB));

    demo.deinit(&gl).unwrap();
}

#[test]
fn sphere_frame_draws_all_faces() {
    let fixture = TextureFixture::new("frame");
    let gl = HeadlessDriver::new();
    let mut demo = SphereDemo::new(fixture.settings());
    demo.init(&gl).unwrap();

    demo.render_frame(&gl).unwrap();

    let calls = gl.draw_calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.mode, glow::TRIANGLES);
    assert_eq!(call.count, 3968 * 3);
    assert_eq!(call.program, demo.program().map(|p| p.raw()));
    assert_eq!(call.vertex_array, demo.vertex_array().map(|v| v.raw()));
    assert_eq!(call.enabled_attributes, [0, 1, 2]);
    assert_eq!(
        call.textures,
        [
            demo.texture(TextureSlot::Normal).map(|t| t.raw()),
            demo.texture(TextureSlot::Albedo).map(|t| t.raw()),
        ]
    );

    // attributes are disabled again after the draw
    assert!(gl.enabled_attributes().is_empty());
    assert_eq!(gl.pending_errors(), 0);

    demo.deinit(&gl).unwrap();
}

#[test]
fn sphere_frame_writes_uniforms_for_current_angle() {
    let fixture = TextureFixture::new("uniforms");
    let gl = HeadlessDriver::new().with_viewport([0, 0, 800, 400]);
    let mut demo = SphereDemo::new(fixture.settings());
    demo.init(&gl).unwrap();
    let program = demo.program().unwrap();

    demo.render_frame(&gl).unwrap();

    let expected = model_view_projection(rotation(0.0), 0.5).to_cols_array();
    assert_eq!(gl.uniform(program, "mvp"), Some(UniformValue::Mat4(expected)));

    let eye = eye_direction(rotation(0.0)).to_array();
    assert_eq!(gl.uniform(program, "lp_obj"), Some(UniformValue::Vec4(eye)));
    assert_eq!(gl.uniform(program, "vp_obj"), Some(UniformValue::Vec4(eye)));
    assert!(approx(eye[1], -1.0));
    assert!(approx(eye[3], 0.0));

    assert_eq!(gl.uniform(program, "normal_map"), Some(UniformValue::Int(0)));
    assert_eq!(gl.uniform(program, "albedo_map"), Some(UniformValue::Int(1)));

    assert!(approx(demo.angle(), 3.0 / 40.0));

    demo.deinit(&gl).unwrap();
}

#[test]
fn sphere_rotation_tilts_about_x_before_spinning() {
    let fixture = TextureFixture::new("rotation");
    let gl = HeadlessDriver::new().with_viewport([0, 0, 800, 400]);
    let mut demo = SphereDemo::new(fixture.settings().with_anim_step(1.0));
    demo.init(&gl).unwrap();
    let program = demo.program().unwrap();

    // second frame renders at angle 1.0
    demo.render_frame(&gl).unwrap();
    demo.render_frame(&gl).unwrap();

    #[rustfmt::skip]
    let expected_mvp = [
        0.145_963, 0.454_649, 0.841_471, 0.0,
        -0.476_861, 0.072_075, 0.291_927, 0.0,
        -0.036_038, 0.887_750, -0.454_649, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    let Some(UniformValue::Mat4(mvp)) = gl.uniform(program, "mvp") else {
        panic!("mvp not written");
    };
    for (i, (actual, expected)) in mvp.iter().zip(expected_mvp).enumerate() {
        assert!((actual - expected).abs() < 1e-4, "mvp[{i}] = {actual}, expected {expected}");
    }

    let expected_eye = [-0.841_471, -0.291_927, 0.454_649, 0.0];
    for name in ["lp_obj", "vp_obj"] {
        let Some(UniformValue::Vec4(eye)) = gl.uniform(program, name) else {
            panic!("{name} not written");
        };
        for (actual, expected) in eye.iter().zip(expected_eye) {
            assert!((actual - expected).abs() < 1e-4, "{name}: {eye:?}");
        }
    }

    demo.deinit(&gl).unwrap();
}

#[test]
fn sphere_angle_wraps_at_full_turn() {
    let fixture = TextureFixture::new("wrap");
    let gl = HeadlessDriver::new();
    let mut demo = SphereDemo::new(fixture.settings().with_anim_step(3.0));
    demo.init(&gl).unwrap();

    for _ in 0..3 {
        demo.render_frame(&gl).unwrap();
        assert!(demo.angle() >= 0.0 && demo.angle() < TAU);
    }
    assert!((demo.angle() - (9.0 - TAU)).abs() < 1e-4);

    demo.deinit(&gl).unwrap();
}

#[test]
fn sphere_buffers_hold_generated_mesh() {
    let fixture = TextureFixture::new("readback");
    let gl = HeadlessDriver::new();
    let settings = fixture.settings().with_grid(9, 17);
    let mesh = build_polar_sphere(&settings.sphere_options()).unwrap();
    let mut demo = SphereDemo::new(settings);
    demo.init(&gl).unwrap();

    let vertices = read_back(&gl, glow::ARRAY_BUFFER, demo.vertex_buffer().unwrap()).unwrap();
    let indices = read_back(&gl, glow::ELEMENT_ARRAY_BUFFER, demo.index_buffer().unwrap()).unwrap();
    assert_eq!(vertices, mesh.vertex_bytes());
    assert_eq!(indices, mesh.index_bytes());
    assert_eq!(demo.face_count(), mesh.face_count());

    demo.deinit(&gl).unwrap();
}

#[test]
fn sphere_without_vertex_arrays_binds_buffers_each_frame() {
    let fixture = TextureFixture::new("novao");
    let gl = HeadlessDriver::new().without_vertex_arrays();
    let mut demo = SphereDemo::new(fixture.settings());
    demo.init(&gl).unwrap();
    assert!(demo.vertex_array().is_none());
    assert_eq!(gl.live_count(ObjectKind::VertexArray), 0);

    demo.render_frame(&gl).unwrap();
    demo.render_frame(&gl).unwrap();

    let calls = gl.draw_calls();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        assert_eq!(call.vertex_array, None);
        assert_eq!(call.element_buffer, demo.index_buffer().map(|b| b.raw()));
    }

    demo.deinit(&gl).unwrap();
    assert_eq!(gl.live_objects(), 0);
}

#[test]
fn sphere_second_init_is_a_no_op() {
    let fixture = TextureFixture::new("reinit");
    let gl = HeadlessDriver::new();
    let mut demo = SphereDemo::new(fixture.settings());
    demo.init(&gl).unwrap();
    let live = gl.live_objects();

    demo.init(&gl).unwrap();
    assert_eq!(gl.live_objects(), live);

    demo.deinit(&gl).unwrap();
}

// ============================================================================
// Sphere: teardown
// ============================================================================

#[test]
fn sphere_deinit_releases_everything_once() {
    let fixture = TextureFixture::new("deinit");
    let gl = HeadlessDriver::new();
    let mut demo = SphereDemo::new(fixture.settings());
    demo.init(&gl).unwrap();
    demo.render_frame(&gl).unwrap();

    demo.deinit(&gl).unwrap();
    assert_eq!(gl.live_objects(), 0);
    assert_eq!(demo.state(), LifecycleState::Destroyed);
    assert!(demo.program().is_none());

    // nothing left to release
    demo.deinit(&gl).unwrap();
    assert_eq!(gl.pending_errors(), 0);
}

#[test]
fn deinit_before_init_is_a_no_op() {
    let gl = HeadlessDriver::new();
    let mut demo = SphereDemo::new(SphereSettings::default());
    demo.deinit(&gl).unwrap();
    assert_eq!(demo.state(), LifecycleState::Uninitialized);
}

#[test]
fn render_requires_init() {
    let gl = HeadlessDriver::new();
    let mut demo = SphereDemo::new(SphereSettings::default());
    assert!(matches!(demo.render_frame(&gl), Err(DemoError::NotInitialized)));
    assert!(gl.draw_calls().is_empty());
}

// ============================================================================
// Sphere: failures and rollback
// ============================================================================

#[test]
fn init_without_current_context_fails() {
    let fixture = TextureFixture::new("nocontext");
    let gl = HeadlessDriver::new();
    gl.make_current(None);
    let mut demo = SphereDemo::new(fixture.settings());

    assert!(matches!(demo.init(&gl), Err(DemoError::NoContext)));
    assert_eq!(gl.live_objects(), 0);
    assert_eq!(demo.state(), LifecycleState::Error);
}

#[test]
fn missing_texture_rolls_back() {
    let gl = HeadlessDriver::new();
    let settings = SphereSettings::default().with_normal_map("missing/normal.raw", 64, 64);
    let mut demo = SphereDemo::new(settings);

    assert!(matches!(demo.init(&gl), Err(DemoError::Io { .. })));
    assert_eq!(gl.live_objects(), 0);
    assert_eq!(demo.state(), LifecycleState::Error);
}

#[test]
fn link_failure_rolls_back_textures_and_shaders() {
    let fixture = TextureFixture::new("linkfail");
    let gl = HeadlessDriver::new();
    let settings = fixture.settings().with_shaders(
        ShaderSource::Embedded(PHONG_BUMP_TANG_VS),
        ShaderSource::Embedded(FS_UNWRITTEN_VARYING),
    );
    let mut demo = SphereDemo::new(settings);

    match demo.init(&gl) {
        Err(DemoError::Link { log }) => assert!(log.contains("bitangent")),
        other => panic!("expected link failure, got {other:?}"),
    }
    assert_eq!(gl.live_objects(), 0);
    assert_eq!(demo.state(), LifecycleState::Error);
    assert!(matches!(demo.render_frame(&gl), Err(DemoError::NotInitialized)));
}

#[test]
fn buffer_out_of_memory_rolls_back() {
    let fixture = TextureFixture::new("oom");
    let gl = HeadlessDriver::new().with_buffer_capacity(1024);
    let mut demo = SphereDemo::new(fixture.settings());

    match demo.init(&gl) {
        Err(DemoError::GlOperation { code, .. }) => assert_eq!(code, glow::OUT_OF_MEMORY),
        other => panic!("expected GL error, got {other:?}"),
    }
    assert_eq!(gl.live_objects(), 0);
}

#[test]
fn failed_init_can_be_retried() {
    let fixture = TextureFixture::new("retry");
    let gl = HeadlessDriver::new();
    gl.make_current(None);
    let mut demo = SphereDemo::new(fixture.settings());
    assert!(demo.init(&gl).is_err());

    gl.make_current(Some(HEADLESS_CONTEXT));
    demo.init(&gl).unwrap();
    assert_eq!(demo.state(), LifecycleState::Ready);
    demo.deinit(&gl).unwrap();
}

// ============================================================================
// Sphere: context identity
// ============================================================================

#[test]
fn foreign_context_blocks_render_and_deinit() {
    let fixture = TextureFixture::new("foreign");
    let gl = HeadlessDriver::new();
    let mut demo = SphereDemo::new(fixture.settings());
    demo.init(&gl).unwrap();
    let live = gl.live_objects();

    gl.make_current(Some(ContextId::new(2, 2)));
    assert!(matches!(demo.render_frame(&gl), Err(DemoError::ForeignContext)));
    assert!(matches!(demo.deinit(&gl), Err(DemoError::ForeignContext)));
    assert!(gl.draw_calls().is_empty());
    assert_eq!(gl.live_objects(), live);
    assert_eq!(demo.state(), LifecycleState::Ready);

    gl.make_current(Some(HEADLESS_CONTEXT));
    demo.deinit(&gl).unwrap();
    assert_eq!(gl.live_objects(), 0);
}

// ============================================================================
// Sphere: optional uniforms
// ============================================================================

#[test]
fn tracked_context_is_reported_only_while_current() {
    let current = Rc::new(Cell::new(true));
    let tracker = ContextTracker::new();
    let id = ContextId::new(7, 9);
    assert_eq!(tracker.current(), None);

    tracker.attach(id, &current, |current: &Cell<bool>| current.get());
    assert_eq!(tracker.current(), Some(id));

    // another context made current on this thread
    current.set(false);
    assert_eq!(tracker.current(), None);
    current.set(true);
    assert_eq!(tracker.current(), Some(id));

    tracker.detach();
    assert_eq!(tracker.current(), None);
}

#[test]
fn tracked_context_is_gone_once_owner_releases_it() {
    let owner = Rc::new(Cell::new(true));
    let tracker = ContextTracker::new();
    tracker.attach(ContextId::new(1, 2), &owner, |current: &Cell<bool>| current.get());

    // the tracker never keeps the owner alive
    let released = Rc::try_unwrap(owner).unwrap();
    assert!(released.get());
    assert_eq!(tracker.current(), None);
}

#[test]
fn absent_uniforms_are_skipped() {
    let fixture = TextureFixture::new("absent");
    let gl = HeadlessDriver::new();
    let settings = fixture.settings().with_shaders(
        ShaderSource::Embedded(PHONG_BUMP_TANG_VS),
        ShaderSource::Embedded(FS_NORMAL_ONLY),
    );
    let mut demo = SphereDemo::new(settings);
    demo.init(&gl).unwrap();
    let program = demo.program().unwrap();
    assert_eq!(demo.uniforms().resolved(), 4);

    demo.render_frame(&gl).unwrap();

    assert_eq!(gl.uniform(program, "albedo_map"), None);
    assert_eq!(gl.uniform(program, "normal_map"), Some(UniformValue::Int(0)));
    assert_eq!(gl.draw_calls()[0].textures[1], None);
    assert_eq!(gl.pending_errors(), 0);

    demo.deinit(&gl).unwrap();
}

#[test]
fn patched_shaders_still_link() {
    let fixture = TextureFixture::new("patch");
    let gl = HeadlessDriver::new();
    let settings = fixture.settings().with_patch("32.0", "8.0");
    let mut demo = SphereDemo::new(settings);
    demo.init(&gl).unwrap();
    demo.render_frame(&gl).unwrap();
    demo.deinit(&gl).unwrap();
}

// ============================================================================
// Hello
// ============================================================================

#[test]
fn blend_factor_follows_subsecond_sine() {
    assert!(approx(blend_factor(Duration::ZERO), 0.5));
    assert!(approx(blend_factor(Duration::from_millis(250)), 1.0));
    assert!(approx(blend_factor(Duration::from_millis(750)), 0.0));
    assert!(approx(blend_factor(Duration::from_millis(3250)), 1.0));
}

#[test]
fn hello_lifecycle() {
    let gl = HeadlessDriver::new();
    let mut demo = HelloDemo::new(HelloSettings::default().with_colors([255, 0, 0, 255], [0, 0, 255, 255]));

    demo.init(&gl).unwrap();
    assert_eq!(gl.live_count(ObjectKind::Texture), 2);
    assert_eq!(gl.live_count(ObjectKind::Buffer), 2);
    assert_eq!(gl.live_count(ObjectKind::Program), 1);
    assert_eq!(demo.uniforms().resolved(), 3);

    for texture in demo.textures() {
        let info = gl.texture_info(texture.unwrap()).unwrap();
        assert_eq!((info.width, info.height, info.format), (1, 1, glow::RGBA));
    }

    demo.render_frame(&gl).unwrap();
    let program = demo.program().unwrap();
    let calls = gl.draw_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].mode, glow::TRIANGLE_STRIP);
    assert_eq!(calls[0].count, 4);
    assert_eq!(calls[0].enabled_attributes, [0]);
    assert!(gl.enabled_attributes().is_empty());

    match gl.uniform(program, "blend_factor") {
        Some(UniformValue::Float(value)) => assert!((0.0..=1.0).contains(&value)),
        other => panic!("expected blend factor, got {other:?}"),
    }
    assert_eq!(gl.uniform(program, "textures[0]"), Some(UniformValue::Int(0)));
    assert_eq!(gl.uniform(program, "textures[1]"), Some(UniformValue::Int(1)));

    demo.deinit(&gl).unwrap();
    assert_eq!(gl.live_objects(), 0);
    assert_eq!(demo.state(), LifecycleState::Destroyed);
}

#[test]
fn both_demos_report_held_resources_until_deinit() {
    let fixture = TextureFixture::new("held");
    let gl = HeadlessDriver::new();
    let mut sphere = SphereDemo::new(fixture.settings());
    let mut hello = HelloDemo::new(HelloSettings::default());
    assert!(!sphere.holds_resources());
    assert!(!hello.holds_resources());

    sphere.init(&gl).unwrap();
    hello.init(&gl).unwrap();
    assert!(sphere.holds_resources());
    assert!(hello.holds_resources());

    // a refused deinit keeps the objects
    gl.make_current(Some(ContextId::new(2, 2)));
    assert!(matches!(hello.deinit(&gl), Err(DemoError::ForeignContext)));
    assert!(hello.holds_resources());
    gl.make_current(Some(HEADLESS_CONTEXT));

    sphere.deinit(&gl).unwrap();
    hello.deinit(&gl).unwrap();
    assert!(!sphere.holds_resources());
    assert!(!hello.holds_resources());
}

#[test]
fn failed_hello_init_holds_nothing() {
    let gl = HeadlessDriver::new().without_compiler();
    let mut demo = HelloDemo::new(HelloSettings::default());
    assert!(matches!(demo.init(&gl), Err(DemoError::NoCompiler)));
    assert!(!demo.holds_resources());
    assert_eq!(gl.live_objects(), 0);
}

#[test]
fn hello_and_sphere_share_a_context() {
    let fixture = TextureFixture::new("shared");
    let gl = HeadlessDriver::new();
    let mut sphere = SphereDemo::new(fixture.settings());
    let mut hello = HelloDemo::new(HelloSettings::default());

    sphere.init(&gl).unwrap();
    hello.init(&gl).unwrap();
    sphere.render_frame(&gl).unwrap();
    hello.render_frame(&gl).unwrap();

    hello.deinit(&gl).unwrap();
    assert!(gl.live_objects() > 0);
    sphere.deinit(&gl).unwrap();
    assert_eq!(gl.live_objects(), 0);
    assert_eq!(gl.get_error(), None);
}

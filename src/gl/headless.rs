//! Headless GL Driver
//!
//! A software model of the GL ES 2 object tables, used to exercise the
//! resource lifecycle without a GPU.
//!
//! # Overview
//!
//! The driver keeps every object the demos allocate (shaders, programs,
//! buffers, textures, vertex arrays) in a single name table, queues GL error
//! codes the way a real driver does, and records draw calls and uniform
//! writes so tests can inspect them afterwards.
//!
//! Shader "compilation" is a structural check rather than a GLSL front end:
//! a shader compiles when it declares `main` and its braces and parentheses
//! balance. Linking requires one compiled vertex and one compiled fragment
//! shader, and every `varying` the fragment stage reads must be declared by
//! the vertex stage. Uniform and attribute locations are assigned from the
//! top-level declarations in the sources.
//!
//! # Usage
//!
//! ```rust,ignore
//! let gl = HeadlessDriver::new().with_buffer_capacity(1024);
//! let mut demo = SphereDemo::new(settings);
//! demo.init(&gl)?;
//! assert!(gl.live_objects() > 0);
//! demo.deinit(&gl)?;
//! assert_eq!(gl.live_objects(), 0);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::num::NonZeroU32;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    BufferHandle, ContextId, GlDriver, ProgramHandle, ShaderHandle, TextureHandle,
    UniformLocation, VertexArrayHandle, bytes_per_pixel,
};
use crate::renderer::shader::ShaderKind;

/// Identity reported by a fresh [`HeadlessDriver`].
pub const HEADLESS_CONTEXT: ContextId = ContextId::new(1, 1);

/// Object categories tracked by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Shader,
    Program,
    Buffer,
    Texture,
    VertexArray,
}

/// A recorded uniform write.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Mat4([f32; 16]),
    Vec4([f32; 4]),
    Float(f32),
    Int(i32),
}

/// Storage description of an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub mipmapped: bool,
}

/// A recorded `glDrawElements` call and the state it observed.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: u32,
    pub count: i32,
    pub offset: i32,
    pub program: Option<u32>,
    pub vertex_array: Option<u32>,
    pub element_buffer: Option<u32>,
    /// Enabled attribute locations, ascending.
    pub enabled_attributes: Vec<u32>,
    /// Texture bound to units 0 and 1.
    pub textures: [Option<u32>; 2],
}

// ============================================================================
// Object model
// ============================================================================

#[derive(Debug)]
struct ShaderObject {
    kind: ShaderKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: FxHashMap<String, u32>,
    attributes: FxHashMap<String, u32>,
}

#[derive(Debug)]
enum Object {
    Shader(ShaderObject),
    Program(ProgramObject),
    Buffer(Vec<u8>),
    Texture(Option<TextureInfo>),
    VertexArray { element_buffer: Option<u32> },
}

impl Object {
    fn kind(&self) -> ObjectKind {
        match self {
            Object::Shader(_) => ObjectKind::Shader,
            Object::Program(_) => ObjectKind::Program,
            Object::Buffer(_) => ObjectKind::Buffer,
            Object::Texture(_) => ObjectKind::Texture,
            Object::VertexArray { .. } => ObjectKind::VertexArray,
        }
    }
}

#[derive(Debug)]
struct State {
    next_name: NonZeroU32,
    objects: FxHashMap<u32, Object>,
    errors: VecDeque<u32>,

    current: Option<ContextId>,
    compiler: bool,
    vertex_arrays: bool,
    buffer_capacity: Option<usize>,
    unrecognised: Option<ObjectKind>,

    array_buffer: Option<u32>,
    element_buffer: Option<u32>,
    vertex_array: Option<u32>,
    program: Option<u32>,
    active_unit: u32,
    textures: FxHashMap<u32, u32>,
    enabled_attributes: BTreeSet<u32>,
    capabilities: FxHashSet<u32>,
    clear_color: [f32; 4],
    viewport: [i32; 4],

    draw_calls: Vec<DrawCall>,
    uniform_values: FxHashMap<(u32, u32), UniformValue>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            next_name: NonZeroU32::MIN,
            objects: FxHashMap::default(),
            errors: VecDeque::new(),
            current: Some(HEADLESS_CONTEXT),
            compiler: true,
            vertex_arrays: true,
            buffer_capacity: None,
            unrecognised: None,
            array_buffer: None,
            element_buffer: None,
            vertex_array: None,
            program: None,
            active_unit: 0,
            textures: FxHashMap::default(),
            enabled_attributes: BTreeSet::new(),
            capabilities: FxHashSet::default(),
            clear_color: [0.0; 4],
            viewport: [0, 0, 512, 512],
            draw_calls: Vec::new(),
            uniform_values: FxHashMap::default(),
        }
    }
}

impl State {
    fn allocate(&mut self, object: Object) -> Result<NonZeroU32, String> {
        let name = self.next_name;
        self.next_name = name
            .checked_add(1)
            .ok_or_else(|| "object name space exhausted".to_string())?;
        self.objects.insert(name.get(), object);
        Ok(name)
    }

    fn raise(&mut self, code: u32) {
        self.errors.push_back(code);
    }

    fn shader_mut(&mut self, name: u32) -> Option<&mut ShaderObject> {
        match self.objects.get_mut(&name) {
            Some(Object::Shader(shader)) => Some(shader),
            _ => None,
        }
    }

    fn program(&self, name: u32) -> Option<&ProgramObject> {
        match self.objects.get(&name) {
            Some(Object::Program(program)) => Some(program),
            _ => None,
        }
    }

    fn bound_element_buffer(&self) -> Option<u32> {
        match self.vertex_array.and_then(|vao| self.objects.get(&vao)) {
            Some(Object::VertexArray { element_buffer }) => *element_buffer,
            _ => self.element_buffer,
        }
    }

    fn set_element_buffer(&mut self, buffer: Option<u32>) {
        if let Some(vao) = self.vertex_array {
            if let Some(Object::VertexArray { element_buffer }) = self.objects.get_mut(&vao) {
                *element_buffer = buffer;
                return;
            }
        }
        self.element_buffer = buffer;
    }

    fn bound_buffer(&self, target: u32) -> Option<u32> {
        match target {
            glow::ARRAY_BUFFER => self.array_buffer,
            glow::ELEMENT_ARRAY_BUFFER => self.bound_element_buffer(),
            _ => None,
        }
    }

    fn write_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        match self.program {
            Some(program) => {
                self.uniform_values.insert((program, location.0), value);
            }
            None => self.raise(glow::INVALID_OPERATION),
        }
    }

    fn link(&mut self, name: u32) {
        let attached = match self.program(name) {
            Some(program) => program.attached.clone(),
            None => {
                self.raise(glow::INVALID_OPERATION);
                return;
            }
        };

        let mut vertex = None;
        let mut fragment = None;
        for shader in &attached {
            if let Some(Object::Shader(shader)) = self.objects.get(shader) {
                match shader.kind {
                    ShaderKind::Vertex => vertex = Some(shader),
                    ShaderKind::Fragment => fragment = Some(shader),
                }
            }
        }

        let outcome = match (vertex, fragment) {
            (Some(vs), Some(fs)) if vs.compiled && fs.compiled => {
                link_interface(&vs.source, &fs.source)
            }
            (Some(_), Some(_)) => Err("error: attached shaders are not compiled".to_string()),
            (None, _) => Err("error: no vertex shader attached".to_string()),
            (_, None) => Err("error: no fragment shader attached".to_string()),
        };

        if let Some(Object::Program(program)) = self.objects.get_mut(&name) {
            match outcome {
                Ok((uniforms, attributes)) => {
                    program.linked = true;
                    program.log.clear();
                    program.uniforms = uniforms;
                    program.attributes = attributes;
                }
                Err(log) => {
                    program.linked = false;
                    program.log = log;
                    program.uniforms.clear();
                    program.attributes.clear();
                }
            }
        }
    }
}

// ============================================================================
// Fake GLSL front end
// ============================================================================

/// A top-level `uniform`/`attribute`/`varying` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    storage: &'static str,
    name: String,
    array_len: Option<u32>,
}

const PRECISION_QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];

fn declarations(source: &str) -> Vec<Declaration> {
    let stripped: String = source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| line.split("//").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    let mut decls = Vec::new();
    for statement in stripped.split(';') {
        let statement = statement.rsplit(['{', '}']).next().unwrap_or_default();
        let mut tokens = statement.split_whitespace();
        let storage = match tokens.next() {
            Some("uniform") => "uniform",
            Some("attribute") => "attribute",
            Some("varying") => "varying",
            _ => continue,
        };

        let rest: Vec<&str> = tokens
            .filter(|token| !PRECISION_QUALIFIERS.contains(token))
            .skip(1)
            .collect();

        for item in rest.join(" ").split(',') {
            let item: String = item.chars().filter(|c| !c.is_whitespace()).collect();
            if item.is_empty() {
                continue;
            }
            let (name, array_len) = match item.split_once('[') {
                Some((name, len)) => (name.to_string(), len.trim_end_matches(']').parse().ok()),
                None => (item, None),
            };
            decls.push(Declaration { storage, name, array_len });
        }
    }
    decls
}

fn compile_log(source: &str) -> Option<String> {
    let mut braces = 0i32;
    let mut parens = 0i32;
    for (line_no, line) in source.lines().enumerate() {
        for c in line.split("//").next().unwrap_or_default().chars() {
            match c {
                '{' => braces += 1,
                '}' => braces -= 1,
                '(' => parens += 1,
                ')' => parens -= 1,
                _ => {}
            }
            if braces < 0 || parens < 0 {
                return Some(format!("0:{}(1): error: syntax error, unexpected '{c}'", line_no + 1));
            }
        }
    }

    if braces != 0 {
        Some("0:0(0): error: syntax error, unbalanced braces".to_string())
    } else if parens != 0 {
        Some("0:0(0): error: syntax error, unbalanced parentheses".to_string())
    } else if !source.contains("main") {
        Some("0:0(0): error: function `main' not defined".to_string())
    } else {
        None
    }
}

type LocationTable = FxHashMap<String, u32>;

fn link_interface(vertex: &str, fragment: &str) -> Result<(LocationTable, LocationTable), String> {
    let vs = declarations(vertex);
    let fs = declarations(fragment);

    let vs_varyings: FxHashSet<&str> = vs
        .iter()
        .filter(|d| d.storage == "varying")
        .map(|d| d.name.as_str())
        .collect();
    if let Some(missing) = fs
        .iter()
        .find(|d| d.storage == "varying" && !vs_varyings.contains(d.name.as_str()))
    {
        return Err(format!(
            "error: fragment shader varying {} not written by vertex shader",
            missing.name
        ));
    }

    let mut uniforms = LocationTable::default();
    let mut next = 0;
    for decl in vs.iter().chain(&fs).filter(|d| d.storage == "uniform") {
        if uniforms.contains_key(&decl.name) {
            continue;
        }
        match decl.array_len {
            Some(len) => {
                uniforms.insert(decl.name.clone(), next);
                for element in 0..len {
                    uniforms.insert(format!("{}[{element}]", decl.name), next + element);
                }
                next += len.max(1);
            }
            None => {
                uniforms.insert(decl.name.clone(), next);
                next += 1;
            }
        }
    }

    let attributes = vs
        .iter()
        .filter(|d| d.storage == "attribute")
        .zip(0..)
        .map(|(decl, location)| (decl.name.clone(), location))
        .collect();

    Ok((uniforms, attributes))
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

fn log_length(log: &str) -> usize {
    if log.is_empty() { 0 } else { log.len() + 1 }
}

// ============================================================================
// Driver
// ============================================================================

/// In-memory [`GlDriver`].
#[derive(Debug, Default)]
pub struct HeadlessDriver {
    state: RefCell<State>,
}

impl HeadlessDriver {
    /// A driver with [`HEADLESS_CONTEXT`] current, a shader compiler and
    /// vertex array support.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a binary-only driver.
    #[must_use]
    pub fn without_compiler(self) -> Self {
        self.state.borrow_mut().compiler = false;
        self
    }

    /// Reports no vertex array object support.
    #[must_use]
    pub fn without_vertex_arrays(self) -> Self {
        self.state.borrow_mut().vertex_arrays = false;
        self
    }

    /// Raises `GL_OUT_OF_MEMORY` for buffer uploads larger than `bytes`.
    #[must_use]
    pub fn with_buffer_capacity(self, bytes: usize) -> Self {
        self.state.borrow_mut().buffer_capacity = Some(bytes);
        self
    }

    /// `glIsShader` / `glIsProgram` deny every live object of `kind`, as a
    /// driver handing out names it does not recognise would.
    #[must_use]
    pub fn with_unrecognised_names(self, kind: ObjectKind) -> Self {
        self.state.borrow_mut().unrecognised = Some(kind);
        self
    }

    #[must_use]
    pub fn with_viewport(self, viewport: [i32; 4]) -> Self {
        self.state.borrow_mut().viewport = viewport;
        self
    }

    /// Switches the context reported as current.
    pub fn make_current(&self, context: Option<ContextId>) {
        self.state.borrow_mut().current = context;
    }

    /// Queues an error code as if the next call had raised it.
    pub fn inject_error(&self, code: u32) {
        self.state.borrow_mut().raise(code);
    }

    // ─── Inspection ──────────────────────────────────────────────────────

    /// Number of live objects of every kind.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.state.borrow().objects.len()
    }

    #[must_use]
    pub fn live_count(&self, kind: ObjectKind) -> usize {
        self.state
            .borrow()
            .objects
            .values()
            .filter(|object| object.kind() == kind)
            .count()
    }

    /// Source last submitted to `shader`.
    #[must_use]
    pub fn shader_source_text(&self, shader: ShaderHandle) -> Option<String> {
        match self.state.borrow().objects.get(&shader.raw()) {
            Some(Object::Shader(shader)) => Some(shader.source.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn texture_info(&self, texture: TextureHandle) -> Option<TextureInfo> {
        match self.state.borrow().objects.get(&texture.raw()) {
            Some(Object::Texture(info)) => *info,
            _ => None,
        }
    }

    /// Last value written to the uniform `name` of `program`.
    #[must_use]
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let location = *state.program(program.raw())?.uniforms.get(name)?;
        state.uniform_values.get(&(program.raw(), location)).cloned()
    }

    #[must_use]
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draw_calls.clone()
    }

    /// Currently enabled attribute locations, ascending.
    #[must_use]
    pub fn enabled_attributes(&self) -> Vec<u32> {
        self.state.borrow().enabled_attributes.iter().copied().collect()
    }

    #[must_use]
    pub fn is_enabled(&self, capability: u32) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    #[must_use]
    pub fn current_clear_color(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    /// Number of queued, unread error codes.
    #[must_use]
    pub fn pending_errors(&self) -> usize {
        self.state.borrow().errors.len()
    }
}

impl GlDriver for HeadlessDriver {
    fn current_context(&self) -> Option<ContextId> {
        self.state.borrow().current
    }

    fn has_shader_compiler(&self) -> bool {
        self.state.borrow().compiler
    }

    fn supports_vertex_array_objects(&self) -> bool {
        self.state.borrow().vertex_arrays
    }

    fn get_error(&self) -> Option<u32> {
        self.state.borrow_mut().errors.pop_front()
    }

    // ─── Shaders ─────────────────────────────────────────────────────────

    fn create_shader(&self, kind: ShaderKind) -> Result<ShaderHandle, String> {
        let name = self.state.borrow_mut().allocate(Object::Shader(ShaderObject {
            kind,
            source: String::new(),
            compiled: false,
            log: String::new(),
        }))?;
        Ok(ShaderHandle::from_raw(name))
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        let mut state = self.state.borrow_mut();
        match state.shader_mut(shader.raw()) {
            Some(object) => object.source = source.to_string(),
            None => state.raise(glow::INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        let compiler = state.compiler;
        let compiled = state.shader_mut(shader.raw()).map(|object| {
            if compiler {
                let log = compile_log(&object.source);
                object.compiled = log.is_none();
                object.log = log.unwrap_or_default();
            }
            compiler
        });
        match compiled {
            Some(true) => {}
            Some(false) => state.raise(glow::INVALID_OPERATION),
            None => state.raise(glow::INVALID_VALUE),
        }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.state
            .borrow_mut()
            .shader_mut(shader.raw())
            .is_some_and(|object| object.compiled)
    }

    fn shader_info_log_length(&self, shader: ShaderHandle) -> usize {
        self.state
            .borrow_mut()
            .shader_mut(shader.raw())
            .map_or(0, |object| log_length(&object.log))
    }

    fn shader_info_log(&self, shader: ShaderHandle, buf: &mut [u8]) -> usize {
        self.state
            .borrow_mut()
            .shader_mut(shader.raw())
            .map_or(0, |object| copy_log(&object.log, buf))
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(Object::Shader(_)) = state.objects.get(&shader.raw()) {
            state.objects.remove(&shader.raw());
        }
    }

    fn is_shader(&self, raw: u32) -> bool {
        let state = self.state.borrow();
        state.unrecognised != Some(ObjectKind::Shader)
            && matches!(state.objects.get(&raw), Some(Object::Shader(_)))
    }

    // ─── Programs ────────────────────────────────────────────────────────

    fn create_program(&self) -> Result<ProgramHandle, String> {
        let name = self
            .state
            .borrow_mut()
            .allocate(Object::Program(ProgramObject::default()))?;
        Ok(ProgramHandle::from_raw(name))
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        if !matches!(state.objects.get(&shader.raw()), Some(Object::Shader(_))) {
            state.raise(glow::INVALID_VALUE);
            return;
        }
        let error = match state.objects.get_mut(&program.raw()) {
            Some(Object::Program(object)) if object.attached.contains(&shader.raw()) => {
                Some(glow::INVALID_OPERATION)
            }
            Some(Object::Program(object)) => {
                object.attached.push(shader.raw());
                None
            }
            _ => Some(glow::INVALID_VALUE),
        };
        if let Some(code) = error {
            state.raise(code);
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        self.state.borrow_mut().link(program.raw());
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.state
            .borrow()
            .program(program.raw())
            .is_some_and(|object| object.linked)
    }

    fn program_info_log_length(&self, program: ProgramHandle) -> usize {
        self.state
            .borrow()
            .program(program.raw())
            .map_or(0, |object| log_length(&object.log))
    }

    fn program_info_log(&self, program: ProgramHandle, buf: &mut [u8]) -> usize {
        self.state
            .borrow()
            .program(program.raw())
            .map_or(0, |object| copy_log(&object.log, buf))
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(Object::Program(_)) = state.objects.get(&program.raw()) {
            state.objects.remove(&program.raw());
            state.uniform_values.retain(|(owner, _), _| *owner != program.raw());
            if state.program == Some(program.raw()) {
                state.program = None;
            }
        }
    }

    fn is_program(&self, raw: u32) -> bool {
        let state = self.state.borrow();
        state.unrecognised != Some(ObjectKind::Program)
            && matches!(state.objects.get(&raw), Some(Object::Program(_)))
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.borrow_mut();
        match program {
            None => state.program = None,
            Some(program) => match state.program(program.raw()) {
                Some(object) if object.linked => state.program = Some(program.raw()),
                _ => state.raise(glow::INVALID_OPERATION),
            },
        }
    }

    fn get_uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let object = state.program(program.raw()).filter(|object| object.linked)?;
        object.uniforms.get(name).copied().map(UniformLocation)
    }

    fn get_attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let object = state.program(program.raw()).filter(|object| object.linked)?;
        object.attributes.get(name).copied()
    }

    fn uniform_matrix_4(&self, location: UniformLocation, column_major: &[f32; 16]) {
        self.state
            .borrow_mut()
            .write_uniform(location, UniformValue::Mat4(*column_major));
    }

    fn uniform_4f(&self, location: UniformLocation, value: [f32; 4]) {
        self.state
            .borrow_mut()
            .write_uniform(location, UniformValue::Vec4(value));
    }

    fn uniform_1f(&self, location: UniformLocation, value: f32) {
        self.state
            .borrow_mut()
            .write_uniform(location, UniformValue::Float(value));
    }

    fn uniform_1i(&self, location: UniformLocation, value: i32) {
        self.state
            .borrow_mut()
            .write_uniform(location, UniformValue::Int(value));
    }

    // ─── Buffers ─────────────────────────────────────────────────────────

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        let name = self.state.borrow_mut().allocate(Object::Buffer(Vec::new()))?;
        Ok(BufferHandle::from_raw(name))
    }

    fn bind_buffer(&self, target: u32, buffer: Option<BufferHandle>) {
        let mut state = self.state.borrow_mut();
        let raw = buffer.map(BufferHandle::raw);
        if let Some(raw) = raw {
            if !matches!(state.objects.get(&raw), Some(Object::Buffer(_))) {
                state.raise(glow::INVALID_OPERATION);
                return;
            }
        }
        match target {
            glow::ARRAY_BUFFER => state.array_buffer = raw,
            glow::ELEMENT_ARRAY_BUFFER => state.set_element_buffer(raw),
            _ => state.raise(glow::INVALID_ENUM),
        }
    }

    fn buffer_data(&self, target: u32, data: &[u8], _usage: u32) {
        let mut state = self.state.borrow_mut();
        let Some(bound) = state.bound_buffer(target) else {
            state.raise(glow::INVALID_OPERATION);
            return;
        };
        if state.buffer_capacity.is_some_and(|capacity| data.len() > capacity) {
            state.raise(glow::OUT_OF_MEMORY);
            return;
        }
        if let Some(Object::Buffer(contents)) = state.objects.get_mut(&bound) {
            *contents = data.to_vec();
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        let raw = buffer.raw();
        if !matches!(state.objects.get(&raw), Some(Object::Buffer(_))) {
            return;
        }
        state.objects.remove(&raw);
        if state.array_buffer == Some(raw) {
            state.array_buffer = None;
        }
        if state.element_buffer == Some(raw) {
            state.element_buffer = None;
        }
        for object in state.objects.values_mut() {
            if let Object::VertexArray { element_buffer } = object {
                if *element_buffer == Some(raw) {
                    *element_buffer = None;
                }
            }
        }
    }

    fn read_buffer(&self, _target: u32, buffer: BufferHandle) -> Option<Vec<u8>> {
        match self.state.borrow().objects.get(&buffer.raw()) {
            Some(Object::Buffer(contents)) => Some(contents.clone()),
            _ => None,
        }
    }

    // ─── Textures ────────────────────────────────────────────────────────

    fn create_texture(&self) -> Result<TextureHandle, String> {
        let name = self.state.borrow_mut().allocate(Object::Texture(None))?;
        Ok(TextureHandle::from_raw(name))
    }

    fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
    }

    fn bind_texture(&self, _target: u32, texture: Option<TextureHandle>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        match texture {
            None => {
                state.textures.remove(&unit);
            }
            Some(texture) if matches!(state.objects.get(&texture.raw()), Some(Object::Texture(_))) => {
                state.textures.insert(unit, texture.raw());
            }
            Some(_) => state.raise(glow::INVALID_OPERATION),
        }
    }

    fn pixel_store_i32(&self, pname: u32, value: i32) {
        if pname != glow::UNPACK_ALIGNMENT && pname != glow::PACK_ALIGNMENT {
            self.state.borrow_mut().raise(glow::INVALID_ENUM);
        } else if ![1, 2, 4, 8].contains(&value) {
            self.state.borrow_mut().raise(glow::INVALID_VALUE);
        }
    }

    fn tex_parameter_i32(&self, _target: u32, _pname: u32, _value: i32) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        if !state.textures.contains_key(&unit) {
            state.raise(glow::INVALID_OPERATION);
        }
    }

    fn tex_image_2d(&self, _target: u32, width: u32, height: u32, format: u32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        let Some(bound) = state.textures.get(&unit).copied() else {
            state.raise(glow::INVALID_OPERATION);
            return;
        };
        let Some(bpp) = bytes_per_pixel(format) else {
            state.raise(glow::INVALID_ENUM);
            return;
        };
        if pixels.len() < width as usize * height as usize * bpp {
            state.raise(glow::INVALID_OPERATION);
            return;
        }
        if let Some(Object::Texture(info)) = state.objects.get_mut(&bound) {
            *info = Some(TextureInfo {
                width,
                height,
                format,
                mipmapped: false,
            });
        }
    }

    fn generate_mipmap(&self, _target: u32) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        let bound = state.textures.get(&unit).copied();
        let updated = match bound.and_then(|name| state.objects.get_mut(&name)) {
            Some(Object::Texture(Some(info))) => {
                info.mipmapped = true;
                true
            }
            _ => false,
        };
        if !updated {
            state.raise(glow::INVALID_OPERATION);
        }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        let raw = texture.raw();
        if matches!(state.objects.get(&raw), Some(Object::Texture(_))) {
            state.objects.remove(&raw);
            state.textures.retain(|_, bound| *bound != raw);
        }
    }

    // ─── Vertex arrays & attributes ──────────────────────────────────────

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        let mut state = self.state.borrow_mut();
        if !state.vertex_arrays {
            return Err("vertex array objects are not supported".to_string());
        }
        let name = state.allocate(Object::VertexArray { element_buffer: None })?;
        Ok(VertexArrayHandle::from_raw(name))
    }

    fn bind_vertex_array(&self, vao: Option<VertexArrayHandle>) {
        let mut state = self.state.borrow_mut();
        match vao {
            None => state.vertex_array = None,
            Some(vao) if matches!(state.objects.get(&vao.raw()), Some(Object::VertexArray { .. })) => {
                state.vertex_array = Some(vao.raw());
            }
            Some(_) => state.raise(glow::INVALID_OPERATION),
        }
    }

    fn delete_vertex_array(&self, vao: VertexArrayHandle) {
        let mut state = self.state.borrow_mut();
        let raw = vao.raw();
        if matches!(state.objects.get(&raw), Some(Object::VertexArray { .. })) {
            state.objects.remove(&raw);
            if state.vertex_array == Some(raw) {
                state.vertex_array = None;
            }
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.state.borrow_mut().enabled_attributes.insert(location);
    }

    fn disable_vertex_attrib_array(&self, location: u32) {
        self.state.borrow_mut().enabled_attributes.remove(&location);
    }

    fn vertex_attrib_pointer_f32(&self, _location: u32, components: i32, stride: i32, offset: i32) {
        if !(1..=4).contains(&components) || stride < 0 || offset < 0 {
            self.state.borrow_mut().raise(glow::INVALID_VALUE);
        }
    }

    // ─── Fixed state & drawing ───────────────────────────────────────────

    fn enable(&self, capability: u32) {
        self.state.borrow_mut().capabilities.insert(capability);
    }

    fn disable(&self, capability: u32) {
        self.state.borrow_mut().capabilities.remove(&capability);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear(&self, _mask: u32) {}

    fn viewport(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = [x, y, width, height];
    }

    fn draw_elements_u16(&self, mode: u32, count: i32, offset: i32) {
        let mut state = self.state.borrow_mut();
        let element_buffer = state.bound_element_buffer();
        if state.program.is_none() || element_buffer.is_none() {
            state.raise(glow::INVALID_OPERATION);
            return;
        }
        let call = DrawCall {
            mode,
            count,
            offset,
            program: state.program,
            vertex_array: state.vertex_array,
            element_buffer,
            enabled_attributes: state.enabled_attributes.iter().copied().collect(),
            textures: [state.textures.get(&0).copied(), state.textures.get(&1).copied()],
        };
        state.draw_calls.push(call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "
        attribute vec4 position;
        attribute highp vec2 uv;
        uniform mat4 mvp;
        varying vec2 v_uv;
        void main() { v_uv = uv; gl_Position = mvp * position; }
    ";

    const FS: &str = "
        #ifdef GL_ES
        precision mediump float;
        #endif
        uniform sampler2D textures[2]; // two layers
        uniform float blend_factor;
        varying vec2 v_uv;
        void main() { gl_FragColor = texture2D(textures[0], v_uv) * blend_factor; }
    ";

    #[test]
    fn declarations_skip_precision_and_comments() {
        let decls = declarations(FS);
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["textures", "blend_factor", "v_uv"]);
        assert_eq!(decls[0].array_len, Some(2));
    }

    #[test]
    fn compile_log_catches_unbalanced_source() {
        assert!(compile_log(VS).is_none());
        assert!(compile_log("void main() {").is_some());
        assert!(compile_log("void f() {}").is_some());
    }

    #[test]
    fn link_assigns_array_element_locations() {
        let (uniforms, attributes) = link_interface(VS, FS).unwrap();
        assert_eq!(uniforms["textures"], uniforms["textures[0]"]);
        assert_eq!(uniforms["textures[1]"], uniforms["textures[0]"] + 1);
        assert_eq!(attributes["position"], 0);
        assert_eq!(attributes["uv"], 1);
    }

    #[test]
    fn link_rejects_unwritten_varying() {
        let fs = "varying vec3 v_normal; void main() { gl_FragColor = vec4(v_normal, 1.0); }";
        assert!(link_interface(VS, fs).is_err());
    }

    #[test]
    fn buffer_upload_over_capacity_raises_out_of_memory() {
        let gl = HeadlessDriver::new().with_buffer_capacity(4);
        let buffer = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
        gl.buffer_data(glow::ARRAY_BUFFER, &[0; 8], glow::STATIC_DRAW);
        assert_eq!(gl.get_error(), Some(glow::OUT_OF_MEMORY));
        assert_eq!(gl.read_buffer(glow::ARRAY_BUFFER, buffer), Some(Vec::new()));
    }
}

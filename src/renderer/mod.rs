//! GPU resource layer.
//!
//! - [`shader`]: source patching, compilation and program linking
//! - [`buffer`]: vertex and element buffer uploads
//! - [`attributes`] / [`uniforms`]: locations resolved once after linking
//! - [`context`]: context identity checks and the resource lifecycle

pub mod attributes;
pub mod buffer;
pub mod context;
pub mod shader;
pub mod uniforms;

pub use attributes::{ActiveAttributes, AttributeSemantic};
pub use buffer::{read_back, upload_buffer, upload_indexed_mesh};
pub use context::{ContextGuard, LifecycleState};
pub use shader::{
    ShaderKind, ShaderPatch, ShaderSource, apply_patches, compile_shader, compile_shader_file,
    compile_shader_source, link_program,
};
pub use uniforms::{UniformSemantic, UniformTable};

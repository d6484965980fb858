//! CPU-side geometry
//!
//! - Mesh: interleaved vertices and 16-bit triangle indices
//! - Primitives: the polar sphere and the full-screen quad

pub mod mesh;
pub mod primitives;

pub use mesh::{IndexedMesh, Vertex, VertexAttribute, VertexLayout};
pub use primitives::{Quad, QuadVertex, SphereOptions, build_polar_sphere, create_quad};

//! CPU-side mesh data.
//!
//! Vertices are interleaved `#[repr(C)]` structs cast to bytes with
//! `bytemuck`, so the upload is the verbatim in-memory layout.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::renderer::attributes::AttributeSemantic;

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub components: i32,
    pub offset: usize,
}

impl VertexAttribute {
    #[must_use]
    pub const fn new(components: i32, offset: usize) -> Self {
        Self { components, offset }
    }
}

/// An interleaved vertex type and the attributes it provides.
pub trait VertexLayout: Pod {
    const STRIDE: usize = size_of::<Self>();

    /// Where `semantic` lives in the vertex, if it is present.
    fn attribute(semantic: AttributeSemantic) -> Option<VertexAttribute>;
}

/// Position, normal and texture coordinate, 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
}

impl VertexLayout for Vertex {
    fn attribute(semantic: AttributeSemantic) -> Option<VertexAttribute> {
        Some(match semantic {
            AttributeSemantic::Position => VertexAttribute::new(3, offset_of!(Vertex, position)),
            AttributeSemantic::Normal => VertexAttribute::new(3, offset_of!(Vertex, normal)),
            AttributeSemantic::TexCoord => VertexAttribute::new(2, offset_of!(Vertex, texcoord)),
        })
    }
}

/// A triangle list with 16-bit indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<[u16; 3]>,
}

impl IndexedMesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

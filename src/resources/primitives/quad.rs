use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};

use crate::renderer::attributes::AttributeSemantic;
use crate::resources::mesh::{VertexAttribute, VertexLayout};

/// A clip-space 2D position.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

impl VertexLayout for QuadVertex {
    fn attribute(semantic: AttributeSemantic) -> Option<VertexAttribute> {
        match semantic {
            AttributeSemantic::Position => Some(VertexAttribute::new(2, offset_of!(QuadVertex, position))),
            AttributeSemantic::Normal | AttributeSemantic::TexCoord => None,
        }
    }
}

/// A full-viewport quad drawn as a 4-index triangle strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    pub vertices: [QuadVertex; 4],
    pub indices: [u16; 4],
}

impl Quad {
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Corners in strip order: bottom-left, bottom-right, top-left, top-right.
#[must_use]
pub fn create_quad() -> Quad {
    let corner = |x: f32, y: f32| QuadVertex { position: [x, y] };
    Quad {
        vertices: [corner(-1.0, -1.0), corner(1.0, -1.0), corner(-1.0, 1.0), corner(1.0, 1.0)],
        indices: [0, 1, 2, 3],
    }
}

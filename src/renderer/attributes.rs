//! Vertex attribute bindings resolved after linking.

use smallvec::SmallVec;

use crate::errors::{DemoError, Result};
use crate::gl::{GlDriver, ProgramHandle};
use crate::resources::mesh::VertexLayout;

/// What a vertex attribute carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    Position,
    Normal,
    TexCoord,
}

/// The attribute locations a program consumes, in registration order.
///
/// Arrays are enabled right before a draw and disabled right after it, so
/// the list is walked symmetrically by [`enable_all`](Self::enable_all) and
/// [`disable_all`](Self::disable_all).
#[derive(Debug, Clone, Default)]
pub struct ActiveAttributes {
    entries: SmallVec<[(u32, AttributeSemantic); 4]>,
}

impl ActiveAttributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up each `(name, semantic)` pair in `program`. Names the program
    /// does not use are skipped.
    pub fn resolve<G: GlDriver + ?Sized>(
        gl: &G,
        program: ProgramHandle,
        names: &[(&str, AttributeSemantic)],
    ) -> Self {
        let mut attributes = Self::new();
        for &(name, semantic) in names {
            let location = gl.get_attrib_location(program, name);
            log::debug!("attribute {name}: {location:?}");
            attributes.register(location, semantic);
        }
        attributes
    }

    /// Records a resolved location. Returns `false` for an absent one.
    pub fn register(&mut self, location: Option<u32>, semantic: AttributeSemantic) -> bool {
        match location {
            Some(location) => {
                self.entries.push((location, semantic));
                true
            }
            None => false,
        }
    }

    /// Points every registered attribute at its field of `V` in the bound
    /// `ARRAY_BUFFER`.
    pub fn setup_pointers<G: GlDriver + ?Sized, V: VertexLayout>(&self, gl: &G) -> Result<()> {
        let stride = V::STRIDE as i32;
        for &(location, semantic) in &self.entries {
            let field = V::attribute(semantic).ok_or(DemoError::UnsupportedAttribute(semantic))?;
            gl.vertex_attrib_pointer_f32(location, field.components, stride, field.offset as i32);
        }
        Ok(())
    }

    pub fn enable_all<G: GlDriver + ?Sized>(&self, gl: &G) {
        for &(location, _) in &self.entries {
            gl.enable_vertex_attrib_array(location);
        }
    }

    pub fn disable_all<G: GlDriver + ?Sized>(&self, gl: &G) {
        for &(location, _) in &self.entries {
            gl.disable_vertex_attrib_array(location);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, AttributeSemantic)> + '_ {
        self.entries.iter().copied()
    }
}

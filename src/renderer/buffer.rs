//! GPU buffer uploads.
//!
//! Uploads are one-shot `STATIC_DRAW` copies of the verbatim bytes. Each
//! target is bound, filled and unbound again, so call these while no vertex
//! array object is bound or the element binding of that VAO is lost.

use crate::errors::Result;
use crate::gl::{BufferHandle, GlDriver, check_gl_error};
use crate::resources::mesh::IndexedMesh;

/// Copies `data` into `buffer` through `target`.
pub fn upload_buffer<G: GlDriver + ?Sized>(
    gl: &G,
    target: u32,
    buffer: BufferHandle,
    data: &[u8],
) -> Result<()> {
    gl.bind_buffer(target, Some(buffer));
    gl.buffer_data(target, data, glow::STATIC_DRAW);
    gl.bind_buffer(target, None);

    check_gl_error(
        gl,
        &format!("uploading {} bytes to {} buffer {}", data.len(), target_name(target), buffer.raw()),
    )
}

/// Uploads a mesh's vertices to `vertex_buffer` and its triangle indices to
/// `index_buffer`.
pub fn upload_indexed_mesh<G: GlDriver + ?Sized>(
    gl: &G,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    mesh: &IndexedMesh,
) -> Result<()> {
    upload_buffer(gl, glow::ARRAY_BUFFER, vertex_buffer, mesh.vertex_bytes())?;
    upload_buffer(gl, glow::ELEMENT_ARRAY_BUFFER, index_buffer, mesh.index_bytes())?;

    log::debug!(
        "uploaded mesh: {} vertex bytes, {} index bytes",
        mesh.vertex_bytes().len(),
        mesh.index_bytes().len()
    );
    Ok(())
}

/// Buffer contents, where the driver can read them back.
#[must_use]
pub fn read_back<G: GlDriver + ?Sized>(gl: &G, target: u32, buffer: BufferHandle) -> Option<Vec<u8>> {
    gl.read_buffer(target, buffer)
}

fn target_name(target: u32) -> &'static str {
    match target {
        glow::ARRAY_BUFFER => "vertex",
        glow::ELEMENT_ARRAY_BUFFER => "element",
        _ => "unknown",
    }
}

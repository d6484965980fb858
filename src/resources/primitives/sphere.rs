use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::errors::{DemoError, Result};
use crate::resources::mesh::{IndexedMesh, Vertex};

/// Largest vertex count a 16-bit index buffer can address.
pub const MAX_INDEXED_VERTICES: usize = 1 << 16;

/// Polar sphere tessellation, Z-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereOptions {
    /// Latitude rings including both poles.
    pub rows: u32,
    /// Longitude samples per ring; the first and last coincide on the seam.
    pub cols: u32,
    pub radius: f32,
    /// Texture repeats around the equator; pole to pole repeats `tile / 2`.
    pub tile: f32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            rows: 33,
            cols: 65,
            radius: 1.0,
            tile: 2.0,
        }
    }
}

impl SphereOptions {
    /// Smallest grid: one interior ring between the poles, three columns of
    /// faces around it.
    pub const MIN_ROWS: u32 = 3;
    pub const MIN_COLS: u32 = 4;

    #[must_use]
    pub fn is_valid_grid(&self) -> bool {
        self.rows >= Self::MIN_ROWS && self.cols >= Self::MIN_COLS
    }

    /// `(rows - 2) * cols` ring vertices plus `cols - 1` per pole; zero for
    /// grids below the minimum.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        if !self.is_valid_grid() {
            return 0;
        }
        let (rows, cols) = (self.rows as usize, self.cols as usize);
        (rows - 2) * cols + 2 * (cols - 1)
    }

    /// Zero for grids below the minimum.
    #[must_use]
    pub fn face_count(&self) -> usize {
        if !self.is_valid_grid() {
            return 0;
        }
        let (rows, cols) = (self.rows as usize, self.cols as usize);
        ((rows - 3) * 2 + 2) * (cols - 1)
    }
}

/// Builds a UV sphere whose poles are fans of `cols - 1` coincident
/// vertices, one per column, so every pole triangle gets its own U.
///
/// Triangles wind counter-clockwise seen from outside.
pub fn build_polar_sphere(options: &SphereOptions) -> Result<IndexedMesh> {
    let SphereOptions { rows, cols, radius, tile } = *options;
    if !options.is_valid_grid() {
        return Err(DemoError::InvalidMeshDimensions { rows, cols });
    }

    let vertex_count = options.vertex_count();
    if vertex_count > MAX_INDEXED_VERTICES {
        return Err(DemoError::MeshCapacity {
            rows,
            cols,
            vertex_count,
            limit: MAX_INDEXED_VERTICES,
        });
    }

    let last_col = (cols - 1) as f32;
    let last_row = (rows - 1) as f32;
    let mut vertices = Vec::with_capacity(vertex_count);

    // North pole
    for j in 0..cols - 1 {
        vertices.push(Vertex {
            position: [0.0, 0.0, radius],
            normal: [0.0, 0.0, 1.0],
            texcoord: [tile * (j as f32 + 0.5) / last_col, tile * 0.5],
        });
    }

    // Interior rings, top to bottom
    for i in 1..rows - 1 {
        let decl = FRAC_PI_2 - i as f32 * PI / last_row;
        let (sin_decl, cos_decl) = decl.sin_cos();

        for j in 0..cols {
            let azim = j as f32 * TAU / last_col;
            let (sin_azim, cos_azim) = azim.sin_cos();
            let normal = [cos_decl * cos_azim, cos_decl * sin_azim, sin_decl];

            vertices.push(Vertex {
                position: normal.map(|n| n * radius),
                normal,
                texcoord: [
                    tile * j as f32 / last_col,
                    tile * (last_row - i as f32) / (2.0 * last_row),
                ],
            });
        }
    }

    // South pole
    for j in 0..cols - 1 {
        vertices.push(Vertex {
            position: [0.0, 0.0, -radius],
            normal: [0.0, 0.0, -1.0],
            texcoord: [tile * (j as f32 + 0.5) / last_col, 0.0],
        });
    }

    // Interior vertex (i, j) sits at j + i * cols - 1 since the north pole
    // has one vertex fewer than a full ring.
    let ring = |i: u32, j: u32| (j + i * cols - 1) as u16;
    let south = |j: u32| ((rows - 1) * cols - 1 + j) as u16;

    let mut indices = Vec::with_capacity(options.face_count());

    for j in 0..cols - 1 {
        indices.push([j as u16, ring(1, j), ring(1, j + 1)]);
    }

    for i in 1..rows - 2 {
        for j in 0..cols - 1 {
            indices.push([ring(i, j + 1), ring(i, j), ring(i + 1, j + 1)]);
            indices.push([ring(i + 1, j), ring(i + 1, j + 1), ring(i, j)]);
        }
    }

    for j in 0..cols - 1 {
        indices.push([ring(rows - 2, j + 1), ring(rows - 2, j), south(j)]);
    }

    debug_assert_eq!(vertices.len(), vertex_count);
    debug_assert_eq!(indices.len(), options.face_count());

    log::info!("sphere mesh: {} vertices, {} faces", vertices.len(), indices.len());

    Ok(IndexedMesh { vertices, indices })
}

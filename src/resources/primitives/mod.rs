pub mod quad;
pub mod sphere;

pub use quad::{Quad, QuadVertex, create_quad};
pub use sphere::{MAX_INDEXED_VERTICES, SphereOptions, build_polar_sphere};

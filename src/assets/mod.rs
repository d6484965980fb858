//! File and texture loading.

pub mod io;
pub mod texture;

pub use io::{FileBuffer, file_size, load_file};
pub use texture::{
    PixelData, TextureDesc, create_solid_texture, decode_pixels, load_texture, load_texture_2d,
};

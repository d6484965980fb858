//! 2D texture loading.
//!
//! Raw pixel dumps carry no header: the caller supplies the dimensions and
//! the bytes per pixel follow from the file length. PNG and TGA files are
//! decoded with `image` and must match the supplied dimensions.

use std::path::{Path, PathBuf};

use crate::assets::io::load_file;
use crate::errors::{DemoError, Result};
use crate::gl::{GlDriver, LUMINANCE, LUMINANCE_ALPHA, TextureHandle, check_gl_error};

/// A texture file and its expected size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl TextureDesc {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }
}

/// Decoded pixels ready for `glTexImage2D`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelData {
    pub format: u32,
    pub pixels: Vec<u8>,
}

fn invalid(path: &Path, reason: impl Into<String>) -> DemoError {
    DemoError::InvalidTexture {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn is_encoded_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png") || ext.eq_ignore_ascii_case("tga"))
}

/// Reads `path` and returns its pixels in a GL ES 2 upload format.
pub fn decode_pixels(path: &Path, width: u32, height: u32) -> Result<PixelData> {
    if width == 0 || height == 0 {
        return Err(invalid(path, format!("zero dimension {width}x{height}")));
    }

    if is_encoded_image(path) {
        let image = image::open(path).map_err(|err| invalid(path, err.to_string()))?;
        if image.width() != width || image.height() != height {
            return Err(invalid(
                path,
                format!("image is {}x{}, expected {width}x{height}", image.width(), image.height()),
            ));
        }
        return Ok(PixelData {
            format: glow::RGBA,
            pixels: image.into_rgba8().into_raw(),
        });
    }

    let file = load_file(path, 0)?;
    let texels = width as usize * height as usize;
    let format = match (file.len % texels, file.len / texels) {
        (0, 1) => LUMINANCE,
        (0, 2) => LUMINANCE_ALPHA,
        (0, 3) => glow::RGB,
        (0, 4) => glow::RGBA,
        _ => {
            return Err(invalid(
                path,
                format!("{} bytes do not form a {width}x{height} image", file.len),
            ));
        }
    };

    let mut pixels = file.data;
    pixels.truncate(file.len);
    Ok(PixelData { format, pixels })
}

/// Creates a mipmapped, repeating 2D texture from `path`.
///
/// The texture is deleted again if any step after its creation fails.
pub fn load_texture_2d<G: GlDriver + ?Sized>(
    gl: &G,
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
) -> Result<TextureHandle> {
    let path = path.as_ref();
    let data = decode_pixels(path, width, height)?;
    let texture = create_texture(gl, width, height, &data)?;

    log::info!("loaded texture {} ({width}x{height})", path.display());
    Ok(texture)
}

pub fn load_texture<G: GlDriver + ?Sized>(gl: &G, desc: &TextureDesc) -> Result<TextureHandle> {
    load_texture_2d(gl, &desc.path, desc.width, desc.height)
}

/// A 1x1 RGBA texture of a single colour.
pub fn create_solid_texture<G: GlDriver + ?Sized>(gl: &G, rgba: [u8; 4]) -> Result<TextureHandle> {
    let data = PixelData {
        format: glow::RGBA,
        pixels: rgba.to_vec(),
    };
    create_texture(gl, 1, 1, &data)
}

fn create_texture<G: GlDriver + ?Sized>(
    gl: &G,
    width: u32,
    height: u32,
    data: &PixelData,
) -> Result<TextureHandle> {
    let texture = gl
        .create_texture()
        .map_err(|message| DemoError::ObjectAllocation { kind: "texture", message })?;

    if let Err(err) = upload(gl, texture, width, height, data) {
        gl.delete_texture(texture);
        return Err(err);
    }
    Ok(texture)
}

fn upload<G: GlDriver + ?Sized>(
    gl: &G,
    texture: TextureHandle,
    width: u32,
    height: u32,
    data: &PixelData,
) -> Result<()> {
    gl.bind_texture(glow::TEXTURE_2D, Some(texture));
    gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
    gl.tex_image_2d(glow::TEXTURE_2D, width, height, data.format, &data.pixels);

    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR_MIPMAP_LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
    gl.generate_mipmap(glow::TEXTURE_2D);

    let result = check_gl_error(gl, "uploading texture");
    gl.bind_texture(glow::TEXTURE_2D, None);
    result
}

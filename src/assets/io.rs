use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::errors::{DemoError, Result};

/// File contents, possibly zero-padded past the real length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBuffer {
    pub data: Vec<u8>,
    /// Length of the file on disk; `data` may be longer.
    pub len: usize,
}

impl FileBuffer {
    /// The file bytes without padding.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

fn io_error(path: &Path, source: io::Error) -> DemoError {
    DemoError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Size of the file at `path` in bytes.
pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|err| io_error(path, err))
}

/// Reads the whole file at `path`.
///
/// With `round_to_log2 > 0` the buffer is zero-padded up to a multiple of
/// `1 << round_to_log2` bytes. A file that shrinks between the size query
/// and the read fails with `UnexpectedEof`.
pub fn load_file(path: impl AsRef<Path>, round_to_log2: u32) -> Result<FileBuffer> {
    let path = path.as_ref();

    let alignment = 1usize.checked_shl(round_to_log2).ok_or_else(|| {
        io_error(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, format!("padding 2^{round_to_log2} is too large")),
        )
    })?;

    let mut file = File::open(path).map_err(|err| io_error(path, err))?;
    let len = file.metadata().map_err(|err| io_error(path, err))?.len();
    let len = usize::try_from(len)
        .map_err(|_| io_error(path, io::Error::new(io::ErrorKind::OutOfMemory, "file too large")))?;

    let padded = len.next_multiple_of(alignment);
    let mut data = vec![0u8; padded];
    file.read_exact(&mut data[..len]).map_err(|err| io_error(path, err))?;

    log::debug!("loaded {} ({len} bytes, buffer {padded})", path.display());

    Ok(FileBuffer { data, len })
}

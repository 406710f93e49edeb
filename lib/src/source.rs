//! The compressed image presented as a contiguous, byte-addressable, read-only region.

use std::fs::File;
#[cfg(unix)]
use std::os::fd::{FromRawFd, RawFd};
use std::path::Path;

use memmap2::Mmap;

use crate::error::Result;

/// A read-only view of the compressed stream, tagged with how its backing memory is owned.
///
/// Replaces the `(mmap_fd, close_fd)` integer-flag pair of the reference design with a variant
/// per ownership mode: each variant's `Drop` glue (via `Mmap` and `File`'s own `Drop` impls)
/// releases exactly what that variant owns.
pub(crate) enum Source<'a> {
    /// Backed by a memory map this reader created from a path; both the mapping and the
    /// descriptor are released on drop.
    OwnedMap { map: Mmap, #[allow(dead_code)] file: File },
    /// Backed by a memory map this reader created from a caller-supplied descriptor; only the
    /// mapping is released on drop, the descriptor remains the caller's to close.
    OwnedMapBorrowedFd { map: Mmap },
    /// Backed by a caller-owned buffer; nothing is released on drop.
    Borrowed(&'a [u8]),
}

impl<'a> Source<'a> {
    /// Opens and memory-maps `path` read-only. The reader owns the resulting mapping and
    /// descriptor.
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Source<'static>> {
        let file = File::open(path)?;
        // SAFETY: the file is opened read-only for the lifetime of this reader; the caller is
        // responsible for not mutating the underlying file out from under the mapping.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Source::OwnedMap { map, file })
    }

    /// Memory-maps an already-open descriptor read-only. The reader owns the resulting mapping
    /// but leaves the descriptor's lifecycle to the caller.
    #[cfg(unix)]
    pub(crate) fn from_fd(fd: RawFd) -> Result<Source<'static>> {
        // SAFETY: `fd` is assumed valid and open for the duration of this call; it is never
        // closed by the `File` wrapper because we `forget` it immediately after mapping.
        let file = unsafe { File::from_raw_fd(fd) };
        let map = unsafe { Mmap::map(&file) };
        std::mem::forget(file);
        Ok(Source::OwnedMapBorrowedFd { map: map? })
    }

    /// Wraps a caller-owned buffer. Nothing is released when the reader is dropped.
    pub(crate) fn from_buffer(buf: &'a [u8]) -> Source<'a> {
        Source::Borrowed(buf)
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Source::OwnedMap { map, .. } => map,
            Source::OwnedMapBorrowedFd { map } => map,
            Source::Borrowed(buf) => buf,
        }
    }

    pub(crate) fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_source_exposes_the_caller_buffer() {
        let buf = b"hello world".to_vec();
        let src = Source::from_buffer(&buf);
        assert_eq!(src.as_slice(), buf.as_slice());
        assert_eq!(src.len(), buf.len() as u64);
    }

    #[test]
    fn owned_map_reflects_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"some bytes on disk").unwrap();
        let src = Source::from_path(file.path()).unwrap();
        assert_eq!(src.as_slice(), b"some bytes on disk");
    }
}

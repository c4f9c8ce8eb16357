//! Shared read-only view of the input file.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::Result;

/// Read-only random-access view of the input file, indexed by absolute
/// byte offset.
///
/// Backed by a memory map, so the parser's sequential scan and the sender's
/// positional payload reads share one set of pages without either copying
/// bytes or contending on a file cursor. Wrapped in an `Arc` by the
/// pipeline; the map is released when the last stage drops its handle.
///
/// NAL descriptors produced by the parser address ranges of this view, so
/// the view must outlive every descriptor derived from it.
#[derive(Debug)]
pub struct ByteSource {
    /// `None` for a zero-length input: empty files cannot be mapped.
    map: Option<Mmap>,
}

impl ByteSource {
    /// Open and map the file at `path`.
    ///
    /// The map is private and read-only; concurrent readers are safe.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let map = if file.metadata()?.len() == 0 {
            None
        } else {
            // SAFETY: the map is read-only and the file is opened read-only.
            // Truncation of the input while streaming is not supported.
            Some(unsafe { Mmap::map(&file)? })
        };
        tracing::debug!(
            path = %path.display(),
            len = map.as_deref().map_or(0, <[u8]>::len),
            "input mapped"
        );
        Ok(Self { map })
    }

    /// Total length of the input in bytes.
    pub fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    /// Whether the input is empty.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// The whole input as a byte slice (used by the sequential scanner).
    pub fn as_slice(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    /// Positional read of `[offset, offset + len)`.
    ///
    /// Offsets come from descriptors produced by scanning this same view,
    /// so an out-of-range request is a logic error and panics like any
    /// slice index.
    pub fn slice(&self, offset: u64, len: u64) -> &[u8] {
        &self.as_slice()[offset as usize..(offset + len) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source_with(bytes: &[u8]) -> (tempfile::TempDir, ByteSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.h264");
        let mut f = File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        (dir, ByteSource::open(&path).unwrap())
    }

    #[test]
    fn maps_file_contents() {
        let (_dir, src) = source_with(&[0, 0, 1, 0x67, 0x42]);
        assert_eq!(src.len(), 5);
        assert_eq!(src.as_slice(), &[0, 0, 1, 0x67, 0x42]);
    }

    #[test]
    fn positional_slice() {
        let (_dir, src) = source_with(b"abcdef");
        assert_eq!(src.slice(2, 3), b"cde");
        assert_eq!(src.slice(0, 0), b"");
    }

    #[test]
    fn empty_file() {
        let (_dir, src) = source_with(&[]);
        assert!(src.is_empty());
        assert_eq!(src.len(), 0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ByteSource::open(Path::new("/nonexistent/input.h264")).unwrap_err();
        match err {
            crate::StreamError::Io(_) => {}
            other => panic!("expected Io, got {:?}", other),
        }
    }
}

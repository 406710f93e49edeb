//! A random-access reader for Zstandard-compressed byte streams.
//!
//! The compressed image is a concatenation of independent Zstandard frames. [`Reader`] builds a
//! jump table mapping uncompressed offsets to frame boundaries — either by importing a
//! precomputed index from a trailing skippable frame in the [seekable format], or by linearly
//! scanning frame headers on demand — and uses it to serve `read`/`seek`/`tell` against a
//! seekable uncompressed view, re-using a single streaming decompression session across calls
//! wherever possible.
//!
//! Zstdseek uses bindings from the [zstd_safe] crate.
//!
//! # Getting started
//!
//! ```no_run
//! use std::io::{Read, Seek, SeekFrom};
//! use zstdseek::Reader;
//!
//! # fn main() -> zstdseek::Result<()> {
//! let mut reader = Reader::open_from_path("archive.zst", false)?;
//! reader.seek(SeekFrom::Start(1024))?;
//! let mut buf = [0u8; 256];
//! reader.read(&mut buf)?;
//! # Ok(())
//! # }
//! ```
//!
//! [seekable format]: https://github.com/facebook/zstd/blob/dev/contrib/seekable_format/zstd_seekable_compression_format.md
//! [zstd_safe]: https://docs.rs/zstd-safe/latest/zstd_safe/

mod codec;
mod error;
mod index;
mod jump_table;
mod reader;
mod source;

pub use error::{Error, Result};
pub use reader::Reader;

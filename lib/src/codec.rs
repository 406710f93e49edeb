//! Thin adapter over the Zstandard frame-probing primitives that have no safe wrapper in
//! `zstd-safe`: `ZSTD_findFrameCompressedSize` and `ZSTD_getFrameContentSize`. Everything else
//! (`DCtx`, `InBuffer`, `OutBuffer`, `ResetDirective`) is used through the safe layer as-is.

use std::ffi::c_void;

use zstd_safe::{DCtx, InBuffer, OutBuffer, zstd_sys};

use crate::error::{Error, Result};

/// Zstandard's `ZSTD_CONTENTSIZE_UNKNOWN` sentinel.
const CONTENTSIZE_UNKNOWN: u64 = u64::MAX - 1;
/// Zstandard's `ZSTD_CONTENTSIZE_ERROR` sentinel.
const CONTENTSIZE_ERROR: u64 = u64::MAX;

/// Outcome of probing the next frame header at the start of `buf` for its compressed size.
pub(crate) enum FrameSize {
    /// The compressed size of the frame starting at `buf`, in bytes.
    Size(u64),
    /// `buf` is empty, or points past the last frame.
    EndOfStream,
    /// The header is truncated or does not look like a Zstandard frame.
    Invalid,
}

/// Probes `buf` for the compressed size of the frame starting at its head.
pub(crate) fn probe_frame_compressed_size(buf: &[u8]) -> FrameSize {
    if buf.is_empty() {
        return FrameSize::EndOfStream;
    }

    // SAFETY: `buf` is a valid, non-empty slice for the duration of the call; the function only
    // reads `buf.len()` bytes starting at `buf.as_ptr()` and returns a plain size_t.
    let ret = unsafe { zstd_sys::ZSTD_findFrameCompressedSize(buf.as_ptr().cast::<c_void>(), buf.len()) };

    // SAFETY: `ZSTD_isError` is a pure function of its argument.
    if unsafe { zstd_sys::ZSTD_isError(ret) } != 0 {
        return FrameSize::Invalid;
    }

    if ret == 0 {
        FrameSize::EndOfStream
    } else {
        FrameSize::Size(ret as u64)
    }
}

/// Outcome of probing the next frame header at the start of `buf` for its uncompressed content
/// size.
pub(crate) enum FrameContentSize {
    /// The frame declares its uncompressed size.
    Known(u64),
    /// The frame does not declare its uncompressed size; it must be measured by decompressing.
    Unknown,
    /// The header is truncated or does not look like a Zstandard frame.
    Invalid,
}

/// Probes `buf` for the uncompressed content size of the frame starting at its head.
pub(crate) fn probe_frame_content_size(buf: &[u8]) -> FrameContentSize {
    // SAFETY: same as `probe_frame_compressed_size`.
    let ret = unsafe { zstd_sys::ZSTD_getFrameContentSize(buf.as_ptr().cast::<c_void>(), buf.len()) };

    match ret {
        CONTENTSIZE_ERROR => FrameContentSize::Invalid,
        CONTENTSIZE_UNKNOWN => FrameContentSize::Unknown,
        n => FrameContentSize::Known(n),
    }
}

/// Fully decompresses a single frame into a scratch buffer to measure its uncompressed size.
///
/// Used by the linear-scan index builder when a frame doesn't declare its content size up front.
pub(crate) fn measure_frame_content_size(frame: &[u8]) -> Result<u64> {
    let mut dctx = DCtx::create();
    let mut out_buf = vec![0u8; DCtx::out_size()];
    let mut consumed = 0usize;
    let mut total = 0u64;

    while consumed < frame.len() {
        let mut in_buffer = InBuffer::around(&frame[consumed..]);
        let mut out_buffer = OutBuffer::around(&mut out_buf);

        let hint = dctx
            .decompress_stream(&mut out_buffer, &mut in_buffer)
            .map_err(Error::corrupt_frame_code)?;

        consumed += in_buffer.pos();
        total += out_buffer.pos() as u64;

        if hint == 0 {
            break;
        }
    }

    if consumed < frame.len() {
        // The frame's declared compressed size wasn't fully consumed by the time decompression
        // reported the frame as finished.
        return Err(Error::corrupt_frame());
    }

    Ok(total)
}

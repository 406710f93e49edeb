//! Populates a [`JumpTable`] either by importing the Zstandard seekable-format trailer or by
//! linearly walking frame headers.

use crate::codec::{self, FrameContentSize, FrameSize};
use crate::error::Result;
use crate::jump_table::JumpTable;

/// Skippable-frame header: magic (4 bytes) + frame size (4 bytes).
const SKIPPABLE_HEADER_SIZE: u64 = 8;
/// Seek table footer: `numFrames` (4) + descriptor (1) + magic (4).
const SEEKABLE_FOOTER_SIZE: u64 = 9;
/// Magic number of the seekable-format footer.
const SEEKABLE_MAGIC: u32 = 0x8F92_EAB1;
/// The skippable-frame variant this seekable format trailer uses.
const SEEKABLE_SKIPPABLE_VARIANT: u32 = 0xE;

fn skippable_magic() -> u32 {
    zstd_safe::zstd_sys::ZSTD_MAGIC_SKIPPABLE_START | SEEKABLE_SKIPPABLE_VARIANT
}

/// Extends `jt` to cover at least `up_until`, or as far as the stream goes if that's sooner.
///
/// Tries the seekable-format trailer only while `jt` is still empty: a trailer, if present, maps
/// the whole stream in one shot, so there is nothing to gain (and duplicate records to lose) by
/// re-attempting it once the linear scan has already contributed a prefix.
pub(crate) fn initialize_up_to(src: &[u8], jt: &mut JumpTable, up_until: u64) -> Result<()> {
    if jt.is_empty() && try_import_seekable_trailer(src, jt) {
        return Ok(());
    }

    linear_scan(src, jt, up_until)
}

/// Strategy (A): import the seekable-format trailer in one pass. Returns `false` (leaving `jt`
/// untouched) on any mismatch, so the caller can fall back to the linear scan.
fn try_import_seekable_trailer(src: &[u8], jt: &mut JumpTable) -> bool {
    let total_len = src.len() as u64;
    if total_len < SEEKABLE_FOOTER_SIZE {
        return false;
    }

    let footer = &src[(total_len - SEEKABLE_FOOTER_SIZE) as usize..];
    let magic = u32::from_le_bytes(footer[5..9].try_into().unwrap());
    if magic != SEEKABLE_MAGIC {
        return false;
    }

    let descriptor = footer[4];
    if (descriptor >> 2) & 0x1f != 0 {
        log::warn!("seekable-format trailer has reserved descriptor bits set, ignoring it");
        return false;
    }
    let checksum_flag = descriptor & 0x80 != 0;

    let num_frames = u32::from_le_bytes(footer[0..4].try_into().unwrap());
    let size_per_entry: u64 = if checksum_flag { 12 } else { 8 };
    let table_bytes = size_per_entry * u64::from(num_frames);
    let frame_size = table_bytes + SEEKABLE_FOOTER_SIZE + SKIPPABLE_HEADER_SIZE;

    if frame_size > total_len {
        log::warn!("seekable-format trailer claims a size larger than the stream, ignoring it");
        return false;
    }

    let skippable_start = (total_len - frame_size) as usize;
    let header = &src[skippable_start..skippable_start + SKIPPABLE_HEADER_SIZE as usize];
    let header_magic = u32::from_le_bytes(header[0..4].try_into().unwrap());
    if header_magic != skippable_magic() {
        log::warn!("seekable-format trailer magic mismatch, ignoring it");
        return false;
    }
    let header_frame_size = u32::from_le_bytes(header[4..8].try_into().unwrap());
    if u64::from(header_frame_size) + SKIPPABLE_HEADER_SIZE != frame_size {
        log::warn!("seekable-format trailer size mismatch, ignoring it");
        return false;
    }

    let table_start = skippable_start + SKIPPABLE_HEADER_SIZE as usize;
    let mut c_offset = 0u64;
    let mut d_offset = 0u64;

    for i in 0..num_frames as usize {
        let entry = table_start + i * size_per_entry as usize;
        jt.append(c_offset, d_offset);
        let c_size = u32::from_le_bytes(src[entry..entry + 4].try_into().unwrap());
        let d_size = u32::from_le_bytes(src[entry + 4..entry + 8].try_into().unwrap());
        c_offset += u64::from(c_size);
        d_offset += u64::from(d_size);
    }
    jt.append(c_offset, d_offset);
    jt.set_fully_initialized(true);

    true
}

/// Strategy (B): walk frame headers starting from `jt`'s current tail, appending a record at the
/// start of every frame, until either end-of-stream or `up_until` is reached.
fn linear_scan(src: &[u8], jt: &mut JumpTable, up_until: u64) -> Result<()> {
    let (mut c_offset, mut d_offset) = jt
        .last()
        .map_or((0, 0), |r| (r.compressed_pos, r.uncompressed_pos));

    loop {
        let frame = &src[c_offset as usize..];
        let frame_compressed_size = match codec::probe_frame_compressed_size(frame) {
            FrameSize::EndOfStream | FrameSize::Invalid => break,
            FrameSize::Size(n) => n,
        };

        if jt.is_empty() || jt.last_known_uncompressed_size() < d_offset {
            jt.append(c_offset, d_offset);
        }

        let frame_content_size = match codec::probe_frame_content_size(frame) {
            FrameContentSize::Known(n) => n,
            FrameContentSize::Invalid => return Err(crate::error::Error::corrupt_frame()),
            FrameContentSize::Unknown => {
                let frame_bytes = &frame[..frame_compressed_size as usize];
                codec::measure_frame_content_size(frame_bytes)?
            }
        };

        c_offset += frame_compressed_size;
        d_offset += frame_content_size;

        if d_offset >= up_until {
            jt.set_fully_initialized(false);
            return finish(jt, c_offset, d_offset);
        }
    }

    jt.set_fully_initialized(true);
    finish(jt, c_offset, d_offset)
}

fn finish(jt: &mut JumpTable, c_offset: u64, d_offset: u64) -> Result<()> {
    if jt.is_empty() {
        return Err(crate::error::Error::format());
    }

    if jt.last_known_uncompressed_size() < d_offset {
        jt.append(c_offset, d_offset);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_scan_rejects_a_stream_with_no_frames() {
        let mut jt = JumpTable::new();
        let err = initialize_up_to(b"not a zstd frame at all", &mut jt, u64::MAX).unwrap_err();
        assert!(err.is_format());
    }
}

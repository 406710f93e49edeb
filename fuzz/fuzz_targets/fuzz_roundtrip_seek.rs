#![no_main]

use std::io::{Read, Seek, SeekFrom};

use libfuzzer_sys::fuzz_target;
use zstdseek::Reader;

fuzz_target!(|data: &[u8]| {
    let (offset0, data) = if let Some(x) = data.split_at_checked(4) {
        x
    } else {
        return;
    };
    let offset0 = u32::from_le_bytes(offset0.try_into().unwrap()) as usize;
    let (offset1, data) = if let Some(x) = data.split_at_checked(4) {
        x
    } else {
        return;
    };
    let offset1 = u32::from_le_bytes(offset1.try_into().unwrap()) as usize;
    if data.is_empty() {
        return;
    }

    let mut compressed = Vec::new();
    for chunk in data.chunks(97) {
        compressed.extend(zstd::stream::encode_all(chunk, 0).unwrap());
    }

    for offset in [offset0, offset1] {
        let offset = offset % data.len();
        let mut reader = Reader::open_from_buffer(&compressed, false).unwrap();
        reader.seek(SeekFrom::Start(offset as u64)).unwrap();
        let mut decompressed = Vec::new();
        reader.read_to_end(&mut decompressed).unwrap();

        assert_eq!(&data[offset..], &decompressed[..]);
    }
});

#![no_main]

use std::io::Read;

use libfuzzer_sys::fuzz_target;
use zstdseek::Reader;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut compressed = Vec::new();
    for chunk in data.chunks(97) {
        compressed.extend(zstd::stream::encode_all(chunk, 0).unwrap());
    }

    let mut reader = Reader::open_from_buffer(&compressed, false).unwrap();
    let mut decompressed = Vec::new();
    reader.read_to_end(&mut decompressed).unwrap();

    assert_eq!(data, &decompressed[..]);
});

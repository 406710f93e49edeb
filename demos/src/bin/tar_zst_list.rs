//! Prints the jump table of a `.tar.zst` archive, then lists the entries it contains.
//!
//! Usage: `tar-zst-list <FILE>.tar.zst`
//!
//! This is not a full tar parser: it only reads enough of each entry's header (the 100-byte name
//! field and the 12-byte octal size field) to walk from one entry to the next.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use zstdseek::Reader;

/// `name[100]` + 24 bytes of intervening fields + `size[12]`, mirroring the minimal header struct
/// the reference implementation reads — not the full 512-byte POSIX tar header.
const HEADER_LEN: usize = 136;
const BLOCK_SIZE: u64 = 512;

fn print_jump_table(reader: &mut Reader<'_>) -> Result<()> {
    println!("*** JUMP TABLE ***");
    println!("Frame\tCompressed\tUncompressed");
    for (i, (compressed_pos, uncompressed_pos)) in reader.jump_table()?.into_iter().enumerate() {
        println!("{i:5}\t{compressed_pos:10}\t{uncompressed_pos:12}");
    }
    println!("******************");
    Ok(())
}

fn list_entries(reader: &mut Reader<'_>) -> Result<()> {
    println!("*** List of the files in the .tar.zst archive ***");

    let mut offset = 0u64;
    let mut header = [0u8; HEADER_LEN];

    loop {
        reader
            .seek(SeekFrom::Start(offset))
            .context("failed to seek to tar entry")?;
        let n = reader.read(&mut header).context("failed to read tar header")?;
        if n < HEADER_LEN || header[0] == 0 {
            break;
        }

        let name_end = header[..100].iter().position(|&b| b == 0).unwrap_or(100);
        let name = String::from_utf8_lossy(&header[..name_end]);
        println!("{name} - tell: {}", reader.tell());

        let size_field = std::str::from_utf8(&header[124..136])
            .unwrap_or_default()
            .trim_matches(char::from(0))
            .trim();
        let data_size = u64::from_str_radix(size_field, 8).unwrap_or(0);

        let data_blocks = data_size.div_ceil(BLOCK_SIZE);
        offset += (data_blocks + 1) * BLOCK_SIZE;
    }

    Ok(())
}

fn run(input_path: &Path) -> Result<()> {
    let mut reader = Reader::open_from_path(input_path, false)
        .with_context(|| format!("failed to open {}", input_path.display()))?;

    print_jump_table(&mut reader)?;
    list_entries(&mut reader)?;

    Ok(())
}

fn main() -> ExitCode {
    let mut args = std::env::args_os().skip(1);
    let (Some(input), None) = (args.next(), args.next()) else {
        eprintln!("usage: tar-zst-list <FILE>.tar.zst");
        return ExitCode::from(1);
    };

    if let Err(err) = run(Path::new(&input)) {
        eprintln!("error: {err:#}");
        return ExitCode::from(2);
    }

    ExitCode::SUCCESS
}

//! Decompresses a single `.zst` file in one linear pass.
//!
//! Usage: `decompress <FILE>.zst`

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use zstdseek::Reader;

const BUF_SIZE: usize = 128 * 1024;

fn output_path(input: &Path) -> Result<PathBuf> {
    if input.extension().and_then(|e| e.to_str()) != Some("zst") {
        bail!("{} does not end in .zst", input.display());
    }
    Ok(input.with_extension(""))
}

fn run(input_path: &Path) -> Result<()> {
    let out_path = output_path(input_path)?;

    // A single linear pass never needs random access, so the jump table is built lazily.
    let mut reader = Reader::open_from_path(input_path, true)
        .with_context(|| format!("failed to open {}", input_path.display()))?;
    let mut out = File::create(&out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;

    let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr_with_hz(5)).with_style(
        ProgressStyle::with_template("{binary_bytes} decompressed").expect("static template always works"),
    );

    let mut buf = [0u8; BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).context("failed to decompress")?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        total += n as u64;
        bar.inc(n as u64);
    }
    bar.finish_and_clear();
    out.flush().context("failed to flush output")?;

    eprintln!(
        "{} : {}",
        input_path.display(),
        HumanBytes(total)
    );

    Ok(())
}

fn main() -> ExitCode {
    let mut args = std::env::args_os().skip(1);
    let (Some(input), None) = (args.next(), args.next()) else {
        eprintln!("usage: decompress <FILE>.zst");
        return ExitCode::from(1);
    };

    if let Err(err) = run(Path::new(&input)) {
        eprintln!("error: {err:#}");
        return ExitCode::from(2);
    }

    ExitCode::SUCCESS
}

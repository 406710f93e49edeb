use std::fs;
use std::io::Write as _;

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use tempfile::TempDir;

fn zstd_frame(data: &[u8]) -> Vec<u8> {
    zstd::stream::encode_all(data, 0).unwrap()
}

fn write_multi_frame_archive(path: &std::path::Path, chunks: &[&[u8]]) {
    let mut out = fs::File::create(path).unwrap();
    for chunk in chunks {
        out.write_all(&zstd_frame(chunk)).unwrap();
    }
}

#[test]
fn decompress_roundtrips_a_multi_frame_archive() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("greeting.txt.zst");
    write_multi_frame_archive(&archive, &[b"Hello, ", b"world!"]);

    cargo_bin_cmd!("decompress").arg(&archive).assert().success();

    let output = dir.path().join("greeting.txt");
    assert_eq!(fs::read(output).unwrap(), b"Hello, world!");
}

#[test]
fn decompress_requires_a_dot_zst_extension() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("greeting.txt");
    fs::write(&archive, b"not even compressed").unwrap();

    cargo_bin_cmd!("decompress").arg(&archive).assert().code(2);
}

#[test]
fn decompress_fails_with_the_wrong_argument_count() {
    cargo_bin_cmd!("decompress").assert().code(1);
    cargo_bin_cmd!("decompress")
        .arg("a.zst")
        .arg("b.zst")
        .assert()
        .code(1);
}

#[test]
fn decompress_fails_on_a_missing_input_file() {
    let dir = TempDir::new().unwrap();
    cargo_bin_cmd!("decompress")
        .arg(dir.path().join("missing.zst"))
        .assert()
        .code(2);
}

fn tar_header(name: &[u8], size: u64) -> Vec<u8> {
    let mut block = vec![0u8; 512];
    block[..name.len()].copy_from_slice(name);
    let size_field = format!("{size:011o}\0");
    block[124..124 + size_field.len()].copy_from_slice(size_field.as_bytes());
    block
}

fn write_tar_zst(path: &std::path::Path, entries: &[(&[u8], &[u8])]) {
    let mut tar = Vec::new();
    for (name, data) in entries {
        tar.extend(tar_header(name, data.len() as u64));
        tar.extend_from_slice(data);
        let padding = (512 - data.len() % 512) % 512;
        tar.extend(std::iter::repeat_n(0u8, padding));
    }
    tar.extend(std::iter::repeat_n(0u8, 1024));

    let mut out = fs::File::create(path).unwrap();
    // One frame per tar block keeps the jump table interesting without needing a fixture on disk.
    for chunk in tar.chunks(512) {
        out.write_all(&zstd_frame(chunk)).unwrap();
    }
}

#[test]
fn tar_zst_list_prints_the_jump_table_and_entry_names() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("archive.tar.zst");
    write_tar_zst(&archive, &[(b"hello.txt", b"hi"), (b"world.txt", b"there")]);

    let out = cargo_bin_cmd!("tar-zst-list")
        .arg(&archive)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("*** JUMP TABLE ***"));
    assert!(out.contains("hello.txt"));
    assert!(out.contains("world.txt"));
}

#[test]
fn tar_zst_list_fails_with_the_wrong_argument_count() {
    cargo_bin_cmd!("tar-zst-list").assert().code(1);
}

#[test]
fn tar_zst_list_fails_on_a_malformed_archive() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("not-zstd.tar.zst");
    fs::write(&archive, b"definitely not a zstd stream").unwrap();

    cargo_bin_cmd!("tar-zst-list").arg(&archive).assert().code(2);
}

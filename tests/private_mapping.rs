//! # Shared vs Private Mapping Tests
//!
//! Writes through a shared writable mapping must reach the file; writes
//! through a private mapping must never be observable by reading the file
//! independently after the region is destroyed.

#![cfg(any(unix, windows))]

use mmapio::{open, MapOptions, Mapping};
use tempfile::tempdir;

fn write_fixture(len: usize) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cow.bin");
    std::fs::write(&path, vec![0x11u8; len]).unwrap();
    (dir, path)
}

#[test]
fn shared_writes_reach_the_file() {
    let (_dir, path) = write_fixture(4096);

    let mut region = open(&path, "w", 100, 10).unwrap();
    region.as_mut_slice().unwrap()[..4].copy_from_slice(b"EDIT");
    region.sync().unwrap();
    region.destroy();

    let contents = std::fs::read(&path).unwrap();
    assert_eq!(&contents[10..14], b"EDIT");
    assert_eq!(contents[9], 0x11);
    assert_eq!(contents[14], 0x11);
}

#[test]
fn shared_writes_are_visible_without_explicit_sync() {
    let (_dir, path) = write_fixture(4096);

    let mut region = open(&path, "we", 0, 4000).unwrap();
    region.as_mut_slice().unwrap()[95] = 0xEE;
    region.destroy();

    assert_eq!(std::fs::read(&path).unwrap()[4095], 0xEE);
}

#[test]
fn private_writes_never_reach_the_file() {
    let (_dir, path) = write_fixture(4096);

    let mut region = open(&path, "wp", 100, 10).unwrap();
    {
        let bytes = region.as_mut_slice().unwrap();
        bytes.fill(0xFF);
        assert!(bytes.iter().all(|&b| b == 0xFF));
    }
    region.sync().unwrap();
    region.destroy();

    let contents = std::fs::read(&path).unwrap();
    assert!(contents.iter().all(|&b| b == 0x11));
}

#[test]
fn private_writes_are_invisible_to_other_regions() {
    let (_dir, path) = write_fixture(4096);

    let mut private = MapOptions::new().write().private().size(64).open(&path).unwrap();
    private.as_mut_slice().unwrap()[0] = 0x99;

    let shared = open(&path, "r", 64, 0).unwrap();

    assert_eq!(shared.as_slice()[0], 0x11);
    assert_eq!(private.as_slice()[0], 0x99);
}

#[test]
fn read_only_region_rejects_mutation() {
    let (_dir, path) = write_fixture(4096);

    let mut region = open(&path, "r", 64, 0).unwrap();

    assert!(region.as_mut_slice().is_err());
}

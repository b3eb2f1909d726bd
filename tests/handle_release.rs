//! # Handle Release Tests
//!
//! `destroy` must close every native handle behind a region. Descriptor
//! numbers are reused as soon as they are closed, so this check lives in its
//! own binary where no concurrent test can open a file in between.

#![cfg(any(unix, windows))]

use mmapio::{open, Mapping};
use tempfile::tempdir;

#[cfg(unix)]
#[test]
fn destroy_closes_every_descriptor() {
    use std::os::fd::AsRawFd;

    let dir = tempdir().unwrap();
    let path = dir.path().join("release.bin");
    std::fs::write(&path, vec![0x42u8; 4096]).unwrap();

    let regions: Vec<_> = (0..32)
        .map(|i| open(&path, "r", 64, i * 7).unwrap())
        .collect();
    let fds: Vec<_> = regions.iter().map(|r| r.as_raw_fd()).collect();

    for fd in &fds {
        assert!(unsafe { libc::fcntl(*fd, libc::F_GETFD) } >= 0);
    }

    for region in regions {
        region.destroy();
    }

    for fd in fds {
        let rc = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        let err = std::io::Error::last_os_error();
        assert_eq!(rc, -1, "fd {} still open after destroy", fd);
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }
}

#[cfg(windows)]
#[test]
fn destroy_allows_exclusive_reopen() {
    use std::os::windows::fs::OpenOptionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("release.bin");
    std::fs::write(&path, vec![0x42u8; 4096]).unwrap();

    let exclusive = || {
        std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .share_mode(0)
            .open(&path)
    };

    let region = open(&path, "w", 64, 0).unwrap();
    assert!(exclusive().is_err());

    region.destroy();
    exclusive().unwrap();
}

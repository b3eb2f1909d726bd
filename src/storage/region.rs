//! # Unified Handle Interface
//!
//! [`Mapping`] is the four-operation contract every backend implements, and
//! [`MappedRegion`] is the closed set of backends a caller can hold:
//!
//! ```text
//! pub enum MappedRegion {
//!     Unix(UnixMapping),         // cfg(unix)
//!     Windows(WindowsMapping),   // cfg(windows)
//!     Unavailable(Unavailable),  // uninhabited
//! }
//! ```
//!
//! ## Lifecycle
//!
//! A region is live from the moment an open returns it until `destroy`
//! consumes it. Because `destroy` takes `self` by value, calling it twice or
//! touching the region afterwards does not compile. Dropping a region without
//! calling `destroy` releases the same resources.
//!
//! `acquire` and `release` bracket a period of use. They do not change any
//! state today; `release` is an acknowledgment only.
//!
//! ## Borrowing
//!
//! The slice accessors borrow the region, so the borrow checker rejects any
//! attempt to destroy a region while a slice into it is still alive.
//!
//! ## Thread Safety
//!
//! `MappedRegion` is `Send` but not `Sync`. Calls on one region must come from
//! one thread at a time; distinct regions are independent.

use eyre::{ensure, Result};

use super::Backend;
use crate::mode::MapMode;

#[cfg(unix)]
use super::unix::UnixMapping;
#[cfg(windows)]
use super::windows::WindowsMapping;

/// Capability surface shared by every mapping backend.
pub trait Mapping: Sized {
    /// Returns the address of the first byte the caller asked for.
    fn acquire(&mut self) -> *mut u8;

    /// Ends a period of use started by `acquire`.
    fn release(&mut self, ptr: *mut u8);

    /// Number of bytes available from the pointer `acquire` returns.
    fn length(&self) -> usize;

    /// Unmaps the region and closes every handle behind it.
    fn destroy(self);
}

/// Backend that exists on targets without a mapping primitive. It has no
/// values, so a region of this variant can never be constructed.
#[derive(Debug)]
pub enum Unavailable {}

#[derive(Debug)]
pub enum MappedRegion {
    #[cfg(unix)]
    Unix(UnixMapping),
    #[cfg(windows)]
    Windows(WindowsMapping),
    Unavailable(Unavailable),
}

impl MappedRegion {
    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(_) => Backend::Unix,
            #[cfg(windows)]
            MappedRegion::Windows(_) => Backend::Windows,
            MappedRegion::Unavailable(never) => match *never {},
        }
    }

    /// Mode the region was opened with.
    pub fn mode(&self) -> MapMode {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(m) => m.mode(),
            #[cfg(windows)]
            MappedRegion::Windows(m) => m.mode(),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }

    fn start(&self) -> *mut u8 {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(m) => m.start(),
            #[cfg(windows)]
            MappedRegion::Windows(m) => m.start(),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: start()..start()+length() lies inside the live mapping, which
        // every backend maps readable. The borrow of `self` keeps the mapping
        // alive. Other processes may still change shared file contents.
        unsafe { std::slice::from_raw_parts(self.start(), self.length()) }
    }

    /// Mutable view of the region; fails for read-only mappings.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        ensure!(
            self.mode().is_writable(),
            "mapping opened with mode \"{}\" is read-only",
            self.mode()
        );
        // SAFETY: as for `as_slice`, and the mapping was created writable; the
        // exclusive borrow prevents aliasing through this region.
        Ok(unsafe { std::slice::from_raw_parts_mut(self.start(), self.length()) })
    }

    /// Bounds-checked sub-range of the region.
    pub fn range(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let total = self.length();
        ensure!(
            offset < total && len <= total - offset,
            "range {}+{} out of bounds (length={})",
            offset,
            len,
            total
        );
        Ok(&self.as_slice()[offset..offset + len])
    }

    /// Flushes writes of a shared writable mapping to the file.
    /// A no-op for read-only and private mappings.
    pub fn sync(&self) -> Result<()> {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(m) => m.sync(),
            #[cfg(windows)]
            MappedRegion::Windows(m) => m.sync(),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }

    /// Hints that the whole region will be read soon.
    pub fn prefetch(&self) {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(m) => m.prefetch(),
            #[cfg(windows)]
            MappedRegion::Windows(m) => m.prefetch(),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }
}

impl Mapping for MappedRegion {
    fn acquire(&mut self) -> *mut u8 {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(m) => m.acquire(),
            #[cfg(windows)]
            MappedRegion::Windows(m) => m.acquire(),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }

    fn release(&mut self, ptr: *mut u8) {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(m) => m.release(ptr),
            #[cfg(windows)]
            MappedRegion::Windows(m) => m.release(ptr),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }

    fn length(&self) -> usize {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(m) => m.length(),
            #[cfg(windows)]
            MappedRegion::Windows(m) => m.length(),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }

    fn destroy(self) {
        match self {
            #[cfg(unix)]
            MappedRegion::Unix(m) => m.destroy(),
            #[cfg(windows)]
            MappedRegion::Windows(m) => m.destroy(),
            MappedRegion::Unavailable(never) => match never {},
        }
    }
}

#[cfg(unix)]
impl std::os::fd::AsRawFd for MappedRegion {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        match self {
            MappedRegion::Unix(m) => m.as_raw_fd(),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }
}

#[cfg(windows)]
impl std::os::windows::io::AsRawHandle for MappedRegion {
    fn as_raw_handle(&self) -> std::os::windows::io::RawHandle {
        match self {
            MappedRegion::Windows(m) => m.as_raw_handle(),
            MappedRegion::Unavailable(never) => match *never {},
        }
    }
}

#[cfg(all(test, any(unix, windows)))]
mod tests {
    use super::*;
    use crate::open;
    use tempfile::tempdir;

    fn fixture(len: usize) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("region.bin");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, data).unwrap();
        (dir, path)
    }

    #[test]
    fn acquire_matches_as_slice() {
        let (_dir, path) = fixture(4096);

        let mut region = open(&path, "r", 100, 10).unwrap();
        let ptr = region.acquire();

        assert_eq!(ptr as *const u8, region.as_slice().as_ptr());
        region.release(ptr);
        region.destroy();
    }

    #[test]
    fn range_is_bounds_checked() {
        let (_dir, path) = fixture(4096);

        let region = open(&path, "r", 100, 10).unwrap();

        assert_eq!(region.range(0, 100).unwrap().len(), 100);
        assert_eq!(region.range(99, 1).unwrap(), &[109u8][..]);
        assert!(region.range(100, 0).is_err());
        assert!(region.range(50, 51).is_err());
        assert!(region.range(usize::MAX, 2).is_err());
    }

    #[test]
    fn read_only_region_refuses_mutable_slice() {
        let (_dir, path) = fixture(4096);

        let mut region = open(&path, "rp", 100, 0).unwrap();

        let err = region.as_mut_slice().unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn region_reports_mode_and_backend() {
        let (_dir, path) = fixture(4096);

        let region = open(&path, "rep", 0, 0).unwrap();

        assert_eq!(region.mode(), MapMode::parse("rep"));
        assert_eq!(region.backend(), crate::backend());
        assert!(!region.is_empty());
    }

    #[test]
    fn sync_and_prefetch_on_shared_writable_region() {
        let (_dir, path) = fixture(4096);

        let mut region = open(&path, "w", 16, 0).unwrap();
        region.prefetch();
        region.as_mut_slice().unwrap()[0] = 0xAA;
        region.sync().unwrap();
        region.destroy();

        assert_eq!(std::fs::read(&path).unwrap()[0], 0xAA);
    }
}

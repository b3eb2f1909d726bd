//! # Unix Mapping Backend
//!
//! Owns the `fd -> mmap` chain for one region:
//!
//! ```text
//! open(name, O_RDONLY|O_RDWR | O_CLOEXEC)      -> OwnedFd
//! fcntl(F_SETFD, FD_CLOEXEC set or cleared)    inheritance
//! fstat                                        bounds the request
//! sysconf(_SC_PAGESIZE)                        granularity
//! mmap(NULL, size + shift, prot, share, fd, offset - shift)
//! ```
//!
//! ## Inheritance
//!
//! The descriptor is created with `O_CLOEXEC`, so there is no window in which
//! a concurrent `fork`/`exec` can inherit a handle the caller did not ask to
//! share. When the mode asks for an inheritable handle the flag is cleared
//! right after `open`.
//!
//! ## Teardown
//!
//! Dropping a [`UnixMapping`] unmaps the region and then closes the
//! descriptor. Every failure path in [`UnixMapping::open`] releases what was
//! already acquired through the same ownership, so no descriptor leaks.

use std::ffi::CStr;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::ptr::NonNull;

use eyre::Result;
use libc::c_int;

use super::align::Alignment;
use super::flags;
use super::open::effective_size;
use super::region::Mapping;
use crate::config::UNKNOWN_GRANULARITY;
use crate::error::{ErrorKind, MapError};
use crate::mode::MapMode;

/// Page size reported by `sysconf`, or `UNKNOWN_GRANULARITY` if it refuses.
pub fn granularity() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        UNKNOWN_GRANULARITY
    }
}

#[derive(Debug)]
pub struct UnixMapping {
    ptr: NonNull<u8>,
    len: usize,
    shift: usize,
    mode: MapMode,
    fd: OwnedFd,
}

// SAFETY: the mapping is exclusively owned and the pointer is only
// dereferenced through &self / &mut self borrows of this value.
unsafe impl Send for UnixMapping {}

impl UnixMapping {
    pub fn open(name: &CStr, mode: MapMode, size: usize, offset: u64) -> Result<Self> {
        let (open_flags, prot) = flags::unix::open_flags(mode.access)
            .zip(flags::unix::protection(mode.access))
            .ok_or_else(|| MapError::new(ErrorKind::Open, "mode has no access token"))?;

        // SAFETY: `name` is a valid NUL-terminated string for the duration of the call.
        let raw = unsafe { libc::open(name.as_ptr(), open_flags | libc::O_CLOEXEC) };
        if raw == -1 {
            return Err(MapError::last_os(ErrorKind::Open, "open failed").into());
        }
        // SAFETY: `raw` is a freshly opened descriptor owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        configure_inheritance(fd.as_fd(), mode.inheritable)?;

        let size = effective_size(mode, size, offset, file_size(fd.as_fd())?)?;
        let alignment = Alignment::compute(offset, size, granularity())?;

        let ptr = map(fd.as_fd(), prot, flags::unix::sharing(mode.private), &alignment)?;

        log::debug!(
            "mmap fd {} offset {} shift {} len {} mode \"{}\"",
            fd.as_raw_fd(),
            alignment.offset,
            alignment.shift,
            alignment.size,
            mode
        );

        Ok(Self {
            ptr,
            len: alignment.size,
            shift: alignment.shift,
            mode,
            fd,
        })
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    /// Caller's first byte.
    pub fn start(&self) -> *mut u8 {
        // SAFETY: shift < len, so the result stays inside the mapping.
        unsafe { self.ptr.as_ptr().add(self.shift) }
    }

    /// Writes dirty pages of a shared writable mapping back to the file.
    pub fn sync(&self) -> Result<()> {
        if !self.mode.writes_through() {
            return Ok(());
        }
        // SAFETY: ptr/len describe exactly the live mapping; ptr is page-aligned.
        let rc = unsafe { libc::msync(self.ptr.as_ptr().cast(), self.len, libc::MS_SYNC) };
        if rc != 0 {
            return Err(MapError::last_os(ErrorKind::Mapping, "msync failed").into());
        }
        Ok(())
    }

    pub fn prefetch(&self) {
        // SAFETY: madvise is only a hint; ptr/len describe the live mapping.
        unsafe {
            libc::madvise(self.ptr.as_ptr().cast(), self.len, libc::MADV_WILLNEED);
        }
    }
}

fn configure_inheritance(fd: BorrowedFd<'_>, inheritable: bool) -> Result<()> {
    // SAFETY: fcntl on a valid descriptor with F_GETFD/F_SETFD has no memory effects.
    let current = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFD) };
    if current < 0 {
        return Err(MapError::last_os(ErrorKind::Inheritance, "F_GETFD failed").into());
    }

    let wanted = if inheritable {
        current & !libc::FD_CLOEXEC
    } else {
        current | libc::FD_CLOEXEC
    };

    if wanted != current {
        // SAFETY: see above.
        let rc = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, wanted) };
        if rc < 0 {
            return Err(MapError::last_os(ErrorKind::Inheritance, "F_SETFD failed").into());
        }
    }
    Ok(())
}

fn file_size(fd: BorrowedFd<'_>) -> Result<u64> {
    // SAFETY: an all-zero `stat` is a valid out-parameter for fstat.
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    // SAFETY: `stat` is a writable stat buffer and `fd` is open.
    let rc = unsafe { libc::fstat(fd.as_raw_fd(), &mut stat) };
    if rc != 0 {
        return Err(MapError::last_os(ErrorKind::Open, "fstat failed").into());
    }
    Ok(stat.st_size as u64)
}

fn map(
    fd: BorrowedFd<'_>,
    prot: c_int,
    share: c_int,
    alignment: &Alignment,
) -> Result<NonNull<u8>> {
    let offset = libc::off_t::try_from(alignment.offset).map_err(|_| {
        MapError::new(
            ErrorKind::Range,
            format!("offset {} does not fit in off_t", alignment.offset),
        )
    })?;

    // SAFETY: a null hint lets the kernel choose the address; the descriptor is
    // open with an access mode compatible with `prot`.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            alignment.size,
            prot,
            share,
            fd.as_raw_fd(),
            offset,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(MapError::last_os(ErrorKind::Mapping, "mmap failed").into());
    }

    NonNull::new(ptr.cast::<u8>())
        .ok_or_else(|| MapError::new(ErrorKind::Mapping, "mmap returned a null address").into())
}

impl Mapping for UnixMapping {
    fn acquire(&mut self) -> *mut u8 {
        self.start()
    }

    fn release(&mut self, _ptr: *mut u8) {}

    fn length(&self) -> usize {
        self.len - self.shift
    }

    fn destroy(self) {
        log::debug!("munmap fd {} len {}", self.fd.as_raw_fd(), self.len);
        drop(self);
    }
}

impl Drop for UnixMapping {
    fn drop(&mut self) {
        // SAFETY: ptr/len are exactly what mmap returned and nothing borrows the
        // region once the owner is being dropped.
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
        if rc != 0 {
            log::warn!(
                "munmap of {} bytes failed: {}",
                self.len,
                std::io::Error::last_os_error()
            );
        }
    }
}

impl AsFd for UnixMapping {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for UnixMapping {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

//! # Open Orchestrator
//!
//! Drives one open from caller input to a live [`MappedRegion`]. Each step is
//! a hard gate; a failure releases everything acquired so far (owned handles
//! close when they go out of scope) and no region is produced.
//!
//! ```text
//! 0. reject size == 0 unless extend-to-end          (Range)
//! 1. resolve the filename into native form           (NameResolution)
//! 2. translate access and open the file              (Open)
//! 3. set or clear inherit-on-spawn on the handle     (Inheritance)
//! 4. check offset + size against the file length     (Range if past EOF)
//!    extend-to-end: size = file length - offset
//! 5. align offset down, widen size by the shift      (Range on overflow)
//! 6. create the mapping / view                       (Mapping)
//! 7. package handles, base, length, shift
//! ```
//!
//! Steps 2 through 7 live in the backend (`unix.rs` / `windows.rs`); this
//! module owns the gates shared by every backend and the public entry points.
//! Every failed open also updates the process-wide last-error slot.

use std::path::Path;

use eyre::{Result, WrapErr};

use super::region::MappedRegion;
use crate::error::{self, ErrorKind, MapError};
use crate::mode::MapMode;
use crate::name::{MapName, WideChar};

/// Rejects requests that can never produce a mapping, before any I/O.
fn check_request(mode: MapMode, size: usize) -> Result<()> {
    if size == 0 && !mode.extend_to_end {
        return Err(MapError::new(
            ErrorKind::Range,
            "zero-size request without extend-to-end",
        )
        .into());
    }
    Ok(())
}

/// Size to map, checked against the length of the open file.
///
/// With extend-to-end the requested size is replaced by the bytes between
/// `offset` and the end of the file. Otherwise the requested range must lie
/// entirely inside the file: `mmap` happily maps pages past the end, and
/// touching them raises `SIGBUS`. An offset at or past the end leaves nothing
/// to map and fails in both cases, which also covers empty files.
pub(crate) fn effective_size(
    mode: MapMode,
    size: usize,
    offset: u64,
    file_len: u64,
) -> Result<usize> {
    if offset >= file_len {
        return Err(MapError::new(
            ErrorKind::Range,
            format!("offset {} is at or beyond file length {}", offset, file_len),
        )
        .into());
    }

    let remaining = file_len - offset;
    if !mode.extend_to_end {
        if size as u64 > remaining {
            return Err(MapError::new(
                ErrorKind::Range,
                format!(
                    "{} bytes at offset {} run past the end of a {}-byte file",
                    size, offset, file_len
                ),
            )
            .into());
        }
        return Ok(size);
    }

    usize::try_from(remaining).map_err(|_| {
        MapError::new(
            ErrorKind::Range,
            format!("{} bytes to end of file exceed the address space", remaining),
        )
        .into()
    })
}

/// Opens `name` with an already parsed mode.
pub fn open_name(
    name: MapName<'_>,
    mode: MapMode,
    size: usize,
    offset: u64,
) -> Result<MappedRegion> {
    let result = open_native(name, mode, size, offset).wrap_err_with(|| {
        format!(
            "failed to map {} file '{}' (mode \"{}\", size {}, offset {})",
            name.encoding(),
            name.display(),
            mode,
            size,
            offset
        )
    });

    match &result {
        Ok(region) => log::debug!(
            "mapped '{}' offset {} length {}",
            name.display(),
            offset,
            crate::Mapping::length(region)
        ),
        Err(report) => {
            error::record(report);
            log::debug!("{:#}", report);
        }
    }

    result
}

#[cfg(unix)]
fn open_native(name: MapName<'_>, mode: MapMode, size: usize, offset: u64) -> Result<MappedRegion> {
    check_request(mode, size)?;
    let native = crate::name::resolve(name)?;
    let mapping = super::unix::UnixMapping::open(native.as_c_str(), mode, size, offset)?;
    Ok(MappedRegion::Unix(mapping))
}

#[cfg(windows)]
fn open_native(name: MapName<'_>, mode: MapMode, size: usize, offset: u64) -> Result<MappedRegion> {
    check_request(mode, size)?;
    let native = crate::name::resolve(name)?;
    let mapping = super::windows::WindowsMapping::open(&native, mode, size, offset)?;
    Ok(MappedRegion::Windows(mapping))
}

#[cfg(not(any(unix, windows)))]
fn open_native(
    _name: MapName<'_>,
    mode: MapMode,
    size: usize,
    _offset: u64,
) -> Result<MappedRegion> {
    check_request(mode, size)?;
    Err(MapError::new(ErrorKind::Open, "no memory-mapping backend on this target").into())
}

/// Maps `size` bytes of the file at `path`, starting at `offset`.
///
/// `mode` follows the grammar in [`crate::mode`]. The path is passed to the
/// backend in its native form: raw bytes on Unix, UTF-16 on Windows.
pub fn open<P: AsRef<Path>>(path: P, mode: &str, size: usize, offset: u64) -> Result<MappedRegion> {
    open_path(path.as_ref(), MapMode::parse(mode), size, offset)
}

pub(crate) fn open_path(
    path: &Path,
    mode: MapMode,
    size: usize,
    offset: u64,
) -> Result<MappedRegion> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        open_name(MapName::Narrow(path.as_os_str().as_bytes()), mode, size, offset)
    }
    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        let wide: Vec<u16> = path.as_os_str().encode_wide().collect();
        open_name(MapName::Wide(&wide), mode, size, offset)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let lossy = path.to_string_lossy();
        open_name(MapName::Utf8(lossy.as_bytes()), mode, size, offset)
    }
}

/// Opens a file named in the platform's narrow encoding.
pub fn open_narrow(name: &[u8], mode: &str, size: usize, offset: u64) -> Result<MappedRegion> {
    open_name(MapName::Narrow(name), MapMode::parse(mode), size, offset)
}

/// Opens a file named in UTF-8.
pub fn open_utf8(name: &[u8], mode: &str, size: usize, offset: u64) -> Result<MappedRegion> {
    open_name(MapName::Utf8(name), MapMode::parse(mode), size, offset)
}

/// Opens a file named in wide characters. On Unix the name is converted with
/// the process locale; call `setlocale` first if it may contain non-ASCII.
pub fn open_wide(name: &[WideChar], mode: &str, size: usize, offset: u64) -> Result<MappedRegion> {
    open_name(MapName::Wide(name), MapMode::parse(mode), size, offset)
}

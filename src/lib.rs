//! # mmapio - Portable Memory-Mapped File Regions
//!
//! mmapio maps a byte range of an existing file into memory and hands it back
//! behind one small interface, whether the native API is `mmap` or
//! `CreateFileMapping`/`MapViewOfFile`. It gives programs zero-copy access to
//! file contents without their own read/write buffering.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mmapio::Mapping;
//!
//! // 100 bytes starting at byte 10, read-only
//! let region = mmapio::open("data.bin", "r", 100, 10)?;
//! assert_eq!(region.length(), 100);
//! let header = &region.as_slice()[..4];
//! region.destroy();
//!
//! // everything from byte 4000 to the end, private copy-on-write
//! let mut region = mmapio::open("data.bin", "wpe", 0, 4000)?;
//! region.as_mut_slice()?[0] = 0xFF; // never reaches the file
//! ```
//!
//! ## Mode Text
//!
//! | Token | Meaning                                      |
//! |-------|----------------------------------------------|
//! | `r`   | read-only                                    |
//! | `w`   | read-write                                   |
//! | `e`   | extend to end of file (size is ignored)      |
//! | `p`   | private, copy-on-write                       |
//! | `i`   | child processes may inherit the file handle  |
//!
//! ## Offsets and Alignment
//!
//! Offsets need not be aligned. The mapping starts at the nearest granularity
//! boundary below the offset and the extra leading bytes are hidden, so
//! `length()` always equals the requested size and `acquire()` points at the
//! requested first byte.
//!
//! ## Errors
//!
//! Opens return `eyre::Result`. [`error_kind`] recovers the failing stage
//! ([`ErrorKind`]) from a report, and [`last_error`] reads the process-wide
//! slot every failed open writes to.
//!
//! ## Module Overview
//!
//! - [`mode`]: mode text parser
//! - [`name`]: narrow / UTF-8 / wide filename bridge
//! - [`storage`]: backends, orchestrator, `MappedRegion`
//! - [`error`]: error taxonomy and last-error slot
//! - [`config`]: constants

pub mod config;
pub mod error;
pub mod mode;
pub mod name;
pub mod storage;

pub use error::{error_kind, last_error, set_last_error, ErrorKind, LastError, MapError};
pub use mode::{Access, MapMode};
pub use name::{MapName, WideChar};
pub use storage::{
    backend, granularity, inheritance_race, open, open_name, open_narrow, open_utf8, open_wide,
    Backend, MapOptions, MappedRegion, Mapping, RaceStatus,
};

//! # Storage Module
//!
//! Maps a region of a file into memory behind one small capability interface,
//! whatever the native mapping API looks like.
//!
//! ## Architecture Overview
//!
//! ```text
//! caller
//!   │  open / open_narrow / open_utf8 / open_wide / MapOptions::open
//!   ▼
//! Name Bridge (crate::name)      narrow | UTF-8 | wide -> native name
//!   ▼
//! Open Orchestrator (open)       shared gates, last-error bookkeeping
//!   ▼
//! Mapping Backend                unix: fd -> mmap
//!   (unix / windows)             windows: file -> mapping object -> view
//!   ▼
//! MappedRegion (region)          acquire / release / length / destroy
//! ```
//!
//! The backend is chosen at compile time. On targets with neither backend,
//! every open fails and [`backend`] reports [`Backend::None`].
//!
//! ## Module Organization
//!
//! - `flags`: pure mode-to-native flag translation, per backend
//! - `align`: offset/size correction to the mapping granularity
//! - `unix`, `windows`: the native backends
//! - `region`: the `Mapping` contract and the `MappedRegion` enum
//! - `open`: the open orchestrator and public entry points
//! - `builder`: `MapOptions`, a typed alternative to mode text
//!
//! ## Inheritance Race
//!
//! Between creating a file handle and configuring its inherit-on-spawn
//! attribute, a thread spawning a child process could leak the handle into
//! that child. [`inheritance_race`] tells callers whether the active backend
//! closes that window, so they can serialize their own process spawning
//! against opens when it does not. This is a platform property, not a defect.

mod align;
mod builder;
pub(crate) mod flags;
mod open;
mod region;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

pub use align::{round_up, Alignment};
pub use builder::MapOptions;
pub use open::{open, open_name, open_narrow, open_utf8, open_wide};
pub use region::{MappedRegion, Mapping, Unavailable};
#[cfg(unix)]
pub use unix::UnixMapping;
#[cfg(windows)]
pub use windows::WindowsMapping;

/// Mapping backend compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Backend {
    None = 0,
    Unix = 1,
    Windows = 2,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::None => "none",
            Backend::Unix => "unix",
            Backend::Windows => "windows",
        }
    }
}

pub const fn backend() -> Backend {
    if cfg!(unix) {
        Backend::Unix
    } else if cfg!(windows) {
        Backend::Windows
    } else {
        Backend::None
    }
}

/// Whether the active backend closes the inheritance race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaceStatus {
    /// A handle can never be inherited by a child it was not meant for.
    Closed,
    /// A concurrently spawned child may inherit the handle.
    Open,
    /// No backend, so nothing is known.
    Unknown,
}

pub const fn inheritance_race() -> RaceStatus {
    match backend() {
        Backend::Unix => RaceStatus::Closed,
        Backend::Windows => RaceStatus::Open,
        Backend::None => RaceStatus::Unknown,
    }
}

/// Minimum alignment for the start of a mapping on this platform, or
/// `UNKNOWN_GRANULARITY` when it cannot be determined.
pub fn granularity() -> usize {
    #[cfg(unix)]
    {
        unix::granularity()
    }
    #[cfg(windows)]
    {
        windows::granularity()
    }
    #[cfg(not(any(unix, windows)))]
    {
        crate::config::UNKNOWN_GRANULARITY
    }
}

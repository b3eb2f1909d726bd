//! # Flag Translator
//!
//! Pure functions from [`MapMode`](crate::MapMode) fields to native constants,
//! one submodule per backend.
//!
//! A missing access level translates to `None`, the "no privileges" sentinel.
//! The open orchestrator treats it as a fatal open failure and never falls back
//! to another access level. `None` is used instead of a zero constant because
//! `O_RDONLY` is itself zero on Unix.
//!
//! ```text
//!              open              protection             sharing / view access
//! Unix   r  -> O_RDONLY          PROT_READ              MAP_SHARED | MAP_PRIVATE
//!        w  -> O_RDWR            PROT_READ|PROT_WRITE
//! Win    r  -> GENERIC_READ      PAGE_READONLY          FILE_MAP_READ
//!        w  -> GENERIC_READ|     PAGE_READWRITE         FILE_MAP_WRITE
//!              GENERIC_WRITE                            (FILE_MAP_COPY if private)
//! ```

#[cfg(unix)]
pub mod unix {
    use libc::c_int;

    use crate::mode::Access;

    pub fn open_flags(access: Option<Access>) -> Option<c_int> {
        match access? {
            Access::Read => Some(libc::O_RDONLY),
            Access::Write => Some(libc::O_RDWR),
        }
    }

    pub fn protection(access: Option<Access>) -> Option<c_int> {
        match access? {
            Access::Read => Some(libc::PROT_READ),
            Access::Write => Some(libc::PROT_READ | libc::PROT_WRITE),
        }
    }

    pub fn sharing(private: bool) -> c_int {
        if private {
            libc::MAP_PRIVATE
        } else {
            libc::MAP_SHARED
        }
    }

}

#[cfg(windows)]
pub mod windows {
    use windows_sys::Win32::Foundation::{GENERIC_READ, GENERIC_WRITE};
    use windows_sys::Win32::System::Memory::{
        FILE_MAP_COPY, FILE_MAP_READ, FILE_MAP_WRITE, PAGE_PROTECTION_FLAGS, PAGE_READONLY,
        PAGE_READWRITE,
    };

    use crate::mode::Access;

    /// `dwDesiredAccess` for `CreateFile`.
    pub fn open_access(access: Option<Access>) -> Option<u32> {
        match access? {
            Access::Read => Some(GENERIC_READ),
            Access::Write => Some(GENERIC_READ | GENERIC_WRITE),
        }
    }

    /// `flProtect` for `CreateFileMapping`.
    pub fn protection(access: Option<Access>) -> Option<PAGE_PROTECTION_FLAGS> {
        match access? {
            Access::Read => Some(PAGE_READONLY),
            Access::Write => Some(PAGE_READWRITE),
        }
    }

    /// Private-copy bit merged into the view access.
    pub fn sharing(private: bool) -> u32 {
        if private {
            FILE_MAP_COPY
        } else {
            0
        }
    }

    /// `dwDesiredAccess` for `MapViewOfFile`: the protection's view access
    /// merged with the private-copy flag. A private writable view is a pure
    /// copy-on-write view; a private read-only view stays plain read.
    pub fn view_access(access: Option<Access>, private: bool) -> Option<u32> {
        match access? {
            Access::Read => Some(FILE_MAP_READ),
            Access::Write if private => Some(sharing(private)),
            Access::Write => Some(FILE_MAP_WRITE),
        }
    }

}

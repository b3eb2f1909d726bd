//! # Name Bridge
//!
//! Filenames reach the mapper in one of three encodings, and each backend's
//! open primitive wants exactly one form:
//!
//! | Input      | Unix (`open`)                    | Windows                           |
//! |------------|----------------------------------|-----------------------------------|
//! | `Narrow`   | bytes as-is                      | `CreateFileA` (ANSI code page)    |
//! | `Utf8`     | bytes as-is                      | decoded to UTF-16, `CreateFileW`  |
//! | `Wide`     | `wcsrtombs` to multibyte         | `CreateFileW` as-is               |
//!
//! Any conversion failure, including an interior NUL, is a
//! `NameResolution` error and happens before any OS resource exists.
//!
//! ## Submodules
//!
//! - [`utf8`]: explicit two-pass UTF-8 to UTF-16 decoder
//! - `wide`: locale-dependent wide to multibyte conversion (Unix only)

pub mod utf8;
#[cfg(unix)]
mod wide;

#[cfg(any(unix, windows))]
use eyre::Result;

#[cfg(any(unix, windows))]
use crate::error::{ErrorKind, MapError};

/// Element type of wide filenames: `wchar_t` on Unix, UTF-16 units on Windows.
#[cfg(unix)]
pub type WideChar = libc::wchar_t;
#[cfg(windows)]
pub type WideChar = u16;
#[cfg(not(any(unix, windows)))]
pub type WideChar = u32;

/// A filename as handed in by the caller, without terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapName<'a> {
    /// Platform-native narrow text.
    Narrow(&'a [u8]),
    Utf8(&'a [u8]),
    Wide(&'a [WideChar]),
}

impl MapName<'_> {
    /// Lossy rendering for logs and error messages.
    pub fn display(&self) -> String {
        match self {
            MapName::Narrow(bytes) | MapName::Utf8(bytes) => {
                String::from_utf8_lossy(bytes).into_owned()
            }
            MapName::Wide(units) => wide_lossy(units),
        }
    }

    pub fn encoding(&self) -> &'static str {
        match self {
            MapName::Narrow(_) => "narrow",
            MapName::Utf8(_) => "utf-8",
            MapName::Wide(_) => "wide",
        }
    }

    #[cfg(any(unix, windows))]
    fn has_interior_nul(&self) -> bool {
        match self {
            MapName::Narrow(bytes) | MapName::Utf8(bytes) => bytes.contains(&0),
            MapName::Wide(units) => units.iter().any(|&u| u == 0),
        }
    }
}

#[cfg(windows)]
fn wide_lossy(units: &[WideChar]) -> String {
    String::from_utf16_lossy(units)
}

#[cfg(not(windows))]
fn wide_lossy(units: &[WideChar]) -> String {
    units
        .iter()
        .map(|&u| char::from_u32(u as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Filename in the form the Unix `open` call takes.
#[cfg(unix)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeName(std::ffi::CString);

#[cfg(unix)]
impl NativeName {
    pub fn as_c_str(&self) -> &std::ffi::CStr {
        &self.0
    }
}

/// Filename in the form one of the Windows `CreateFile` variants takes.
#[cfg(windows)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeName {
    /// For `CreateFileA`.
    Ansi(std::ffi::CString),
    /// NUL-terminated, for `CreateFileW`.
    Wide(Vec<u16>),
}

#[cfg(any(unix, windows))]
fn nul_error(name: &MapName<'_>) -> MapError {
    MapError::new(
        ErrorKind::NameResolution,
        format!("{} filename contains an interior NUL", name.encoding()),
    )
}

/// Converts a caller-supplied name into the backend's native form.
#[cfg(unix)]
pub fn resolve(name: MapName<'_>) -> Result<NativeName> {
    use std::ffi::CString;

    if name.has_interior_nul() {
        return Err(nul_error(&name).into());
    }

    let native = match name {
        MapName::Narrow(bytes) | MapName::Utf8(bytes) => {
            CString::new(bytes).map_err(|_| nul_error(&name))?
        }
        MapName::Wide(units) => wide::to_multibyte(units).ok_or_else(|| {
            MapError::new(
                ErrorKind::NameResolution,
                "wide filename is not representable in the current locale",
            )
        })?,
    };

    Ok(NativeName(native))
}

/// Converts a caller-supplied name into the backend's native form.
#[cfg(windows)]
pub fn resolve(name: MapName<'_>) -> Result<NativeName> {
    use std::ffi::CString;

    if name.has_interior_nul() {
        return Err(nul_error(&name).into());
    }

    let native = match name {
        MapName::Narrow(bytes) => {
            NativeName::Ansi(CString::new(bytes).map_err(|_| nul_error(&name))?)
        }
        MapName::Utf8(bytes) => {
            let wide = utf8::encode_utf16(bytes).map_err(|err| {
                MapError::new(ErrorKind::NameResolution, format!("utf-8 filename: {}", err))
            })?;
            NativeName::Wide(wide)
        }
        MapName::Wide(units) => {
            let mut wide = Vec::with_capacity(units.len() + 1);
            wide.extend_from_slice(units);
            wide.push(0);
            NativeName::Wide(wide)
        }
    };

    Ok(native)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lossy_for_bad_bytes() {
        let name = MapName::Narrow(b"bad\xFFname");

        assert_eq!(name.display(), "bad\u{FFFD}name");
    }

    #[test]
    fn display_renders_wide_names() {
        let units: Vec<WideChar> = "wide.bin".encode_utf16().map(|u| u as WideChar).collect();

        assert_eq!(MapName::Wide(&units).display(), "wide.bin");
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn interior_nul_is_a_name_resolution_failure() {
        let report = resolve(MapName::Utf8(b"a\0b")).unwrap_err();

        assert_eq!(
            crate::error::error_kind(&report),
            Some(ErrorKind::NameResolution)
        );
    }

    #[cfg(unix)]
    #[test]
    fn unix_passes_narrow_and_utf8_bytes_through() {
        let narrow = resolve(MapName::Narrow(b"/tmp/region")).unwrap();
        let utf8 = resolve(MapName::Utf8("/tmp/r\u{e9}gion".as_bytes())).unwrap();

        assert_eq!(narrow.as_c_str().to_bytes(), b"/tmp/region");
        assert_eq!(utf8.as_c_str().to_bytes(), "/tmp/r\u{e9}gion".as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn unix_converts_ascii_wide_names() {
        let units: Vec<WideChar> = "/tmp/wide".chars().map(|c| c as u32 as WideChar).collect();
        let native = resolve(MapName::Wide(&units)).unwrap();

        assert_eq!(native.as_c_str().to_bytes(), b"/tmp/wide");
    }

    #[cfg(unix)]
    #[test]
    fn unix_rejects_unconvertible_wide_names() {
        let units = [0xFFFF_FFFFu32 as WideChar];
        let report = resolve(MapName::Wide(&units)).unwrap_err();

        assert_eq!(
            crate::error::error_kind(&report),
            Some(ErrorKind::NameResolution)
        );
    }

    #[cfg(windows)]
    #[test]
    fn windows_decodes_utf8_to_wide() {
        let native = resolve(MapName::Utf8("r\u{e9}gion".as_bytes())).unwrap();
        let expected: Vec<u16> = "r\u{e9}gion".encode_utf16().chain([0]).collect();

        assert_eq!(native, NativeName::Wide(expected));
    }

    #[cfg(windows)]
    #[test]
    fn windows_rejects_malformed_utf8() {
        let report = resolve(MapName::Utf8(&[0xC0, 0xAF])).unwrap_err();

        assert_eq!(
            crate::error::error_kind(&report),
            Some(ErrorKind::NameResolution)
        );
    }
}

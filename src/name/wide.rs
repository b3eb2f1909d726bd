//! Wide-character to multibyte conversion for Unix `open`.
//!
//! Uses the restartable `wcsrtombs`, so the result depends on the process
//! locale (`LC_CTYPE`). Programs that never call `setlocale` run in the "C"
//! locale, where only ASCII converts. Conversion is two-pass: the first call
//! measures, the second fills a buffer of exactly that size.

use std::ffi::CString;

use libc::{c_char, size_t, wchar_t};

/// Opaque conversion state. Sized and aligned for the largest `mbstate_t`
/// among supported libcs (128 bytes on Apple platforms).
#[repr(C, align(8))]
struct MbState([u8; 128]);

impl MbState {
    fn initial() -> Self {
        MbState([0; 128])
    }
}

extern "C" {
    fn wcsrtombs(
        dst: *mut c_char,
        src: *mut *const wchar_t,
        len: size_t,
        ps: *mut MbState,
    ) -> size_t;
}

const CONVERSION_FAILED: size_t = size_t::MAX;

/// Converts a wide name without terminator into a multibyte C string.
/// Returns `None` on any sequence the current locale cannot represent.
pub fn to_multibyte(name: &[wchar_t]) -> Option<CString> {
    let mut terminated = Vec::with_capacity(name.len() + 1);
    terminated.extend_from_slice(name);
    terminated.push(0);

    let mut src = terminated.as_ptr();
    let mut state = MbState::initial();
    // SAFETY: `src` points at a NUL-terminated wide string owned by `terminated`,
    // and a null destination asks only for the converted length.
    let len = unsafe { wcsrtombs(std::ptr::null_mut(), &mut src, 0, &mut state) };
    if len == CONVERSION_FAILED {
        return None;
    }

    let mut out = vec![0u8; len + 1];
    let mut src = terminated.as_ptr();
    let mut state = MbState::initial();
    // SAFETY: `out` holds `len + 1` bytes, enough for the measured conversion and
    // its terminator; `src` is still the NUL-terminated buffer measured above.
    let filled = unsafe {
        wcsrtombs(
            out.as_mut_ptr() as *mut c_char,
            &mut src,
            out.len(),
            &mut state,
        )
    };
    if filled != len {
        return None;
    }

    out.truncate(len);
    CString::new(out).ok()
}

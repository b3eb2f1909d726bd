//! # UTF-8 to UTF-16 Decoder
//!
//! Converts UTF-8 filenames into the UTF-16 form wide-character file APIs take,
//! without consulting any system code page.
//!
//! ## Two-Pass Sizing
//!
//! [`utf8_to_utf16`] runs in two modes. With no output buffer it only counts
//! the UTF-16 units the input needs; with a buffer it fills it. [`encode_utf16`]
//! runs the counting pass, allocates exactly once, then runs the filling pass:
//!
//! ```text
//! pass 1: utf8_to_utf16(src, None)          -> n units
//! alloc:  vec![0u16; n + 1]                 (trailing NUL)
//! pass 2: utf8_to_utf16(src, Some(&mut ..)) -> n units written
//! ```
//!
//! ## Accepted Input
//!
//! | Bytes | Code points            | Lead byte   |
//! |-------|------------------------|-------------|
//! | 1     | U+0000 ..= U+007F      | 00 ..= 7F   |
//! | 2     | U+0080 ..= U+07FF      | C2 ..= DF   |
//! | 3     | U+0800 ..= U+FFFF      | E0 ..= EF   |
//! | 4     | U+10000 ..= U+10FFFF   | F0 ..= F4   |
//!
//! Overlong encodings, stray or missing continuation bytes, UTF-8 encoded
//! surrogates, and code points above U+10FFFF are rejected. Code points above
//! U+FFFF become surrogate pairs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Malformed sequence starting at this byte offset.
    Invalid { position: usize },
    /// The output buffer ran out before the input did.
    BufferTooSmall { written: usize },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Invalid { position } => {
                write!(f, "invalid UTF-8 sequence at byte {}", position)
            }
            DecodeError::BufferTooSmall { written } => {
                write!(f, "output buffer too small after {} UTF-16 units", written)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

const MAX_CODE_POINT: u32 = 0x10FFFF;

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Decodes the code point starting at `src[0]`, returning it with its byte length.
/// `None` means the sequence is malformed.
fn decode_one(src: &[u8]) -> Option<(u32, usize)> {
    let lead = *src.first()?;

    let (len, initial, min) = match lead {
        0x00..=0x7F => return Some((lead as u32, 1)),
        0xC2..=0xDF => (2, (lead & 0x1F) as u32, 0x80),
        0xE0..=0xEF => (3, (lead & 0x0F) as u32, 0x800),
        0xF0..=0xF4 => (4, (lead & 0x07) as u32, 0x10000),
        _ => return None,
    };

    let tail = src.get(1..len)?;
    let mut cp = initial;
    for &byte in tail {
        if !is_continuation(byte) {
            return None;
        }
        cp = (cp << 6) | (byte & 0x3F) as u32;
    }

    if cp < min || cp > MAX_CODE_POINT || (0xD800..=0xDFFF).contains(&cp) {
        return None;
    }

    Some((cp, len))
}

/// Counts (`dst == None`) or writes (`dst == Some`) the UTF-16 form of `src`.
///
/// Returns the number of UTF-16 units produced. No terminator is written.
pub fn utf8_to_utf16(src: &[u8], mut dst: Option<&mut [u16]>) -> Result<usize, DecodeError> {
    let mut pos = 0;
    let mut written = 0;

    while pos < src.len() {
        let (cp, len) =
            decode_one(&src[pos..]).ok_or(DecodeError::Invalid { position: pos })?;

        let mut units = [0u16; 2];
        let count = if cp < 0x10000 {
            units[0] = cp as u16;
            1
        } else {
            let v = cp - 0x10000;
            units[0] = 0xD800 | (v >> 10) as u16;
            units[1] = 0xDC00 | (v & 0x3FF) as u16;
            2
        };

        if let Some(out) = dst.as_deref_mut() {
            let slot = out
                .get_mut(written..written + count)
                .ok_or(DecodeError::BufferTooSmall { written })?;
            slot.copy_from_slice(&units[..count]);
        }

        written += count;
        pos += len;
    }

    Ok(written)
}

/// Converts `src` into a NUL-terminated UTF-16 buffer, allocating exactly once.
pub fn encode_utf16(src: &[u8]) -> Result<Vec<u16>, DecodeError> {
    let count = utf8_to_utf16(src, None)?;

    let mut out = vec![0u16; count + 1];
    let filled = utf8_to_utf16(src, Some(&mut out[..count]))?;
    debug_assert_eq!(filled, count);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    #[test]
    fn ascii_maps_one_to_one() {
        assert_eq!(encode_utf16(b"data.bin").unwrap(), expected("data.bin"));
    }

    #[test]
    fn multibyte_sequences_decode() {
        let name = "caf\u{e9}-\u{4e2d}\u{6587}.txt";

        assert_eq!(encode_utf16(name.as_bytes()).unwrap(), expected(name));
    }

    #[test]
    fn supplementary_plane_emits_surrogate_pair() {
        let name = "\u{1F600}";
        let out = encode_utf16(name.as_bytes()).unwrap();

        assert_eq!(out, vec![0xD83D, 0xDE00, 0]);
    }

    #[test]
    fn highest_code_point_is_accepted() {
        let name = "\u{10FFFF}";

        assert_eq!(encode_utf16(name.as_bytes()).unwrap(), expected(name));
    }

    #[test]
    fn counting_pass_matches_filling_pass() {
        let name = "a\u{e9}\u{4e2d}\u{1F600}".as_bytes();

        let count = utf8_to_utf16(name, None).unwrap();
        let mut buf = vec![0u16; count];
        let filled = utf8_to_utf16(name, Some(&mut buf)).unwrap();

        assert_eq!(count, 5);
        assert_eq!(filled, count);
    }

    #[test]
    fn empty_input_yields_terminator_only() {
        assert_eq!(encode_utf16(b"").unwrap(), vec![0]);
    }

    #[test]
    fn overlong_encodings_are_rejected() {
        assert_eq!(
            encode_utf16(&[0xC0, 0xAF]),
            Err(DecodeError::Invalid { position: 0 })
        );
        assert!(encode_utf16(&[0xE0, 0x80, 0xAF]).is_err());
        assert!(encode_utf16(&[0xF0, 0x80, 0x80, 0xAF]).is_err());
    }

    #[test]
    fn code_points_above_unicode_range_are_rejected() {
        assert!(encode_utf16(&[0xF4, 0x90, 0x80, 0x80]).is_err());
        assert!(encode_utf16(&[0xF5, 0x80, 0x80, 0x80]).is_err());
    }

    #[test]
    fn encoded_surrogates_are_rejected() {
        assert!(encode_utf16(&[0xED, 0xA0, 0x80]).is_err());
    }

    #[test]
    fn bad_continuation_reports_sequence_start() {
        assert_eq!(
            encode_utf16(&[b'a', b'b', 0xC3, b'x']),
            Err(DecodeError::Invalid { position: 2 })
        );
    }

    #[test]
    fn truncated_sequence_is_rejected() {
        assert_eq!(
            encode_utf16(&[b'a', 0xE4, 0xB8]),
            Err(DecodeError::Invalid { position: 1 })
        );
    }

    #[test]
    fn stray_continuation_byte_is_rejected() {
        assert!(encode_utf16(&[0x80]).is_err());
    }

    #[test]
    fn short_output_buffer_is_reported() {
        let mut buf = [0u16; 2];

        assert_eq!(
            utf8_to_utf16(b"abc", Some(&mut buf)),
            Err(DecodeError::BufferTooSmall { written: 2 })
        );
    }
}

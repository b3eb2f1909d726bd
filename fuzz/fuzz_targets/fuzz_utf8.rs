//! Fuzz testing for the UTF-8 to UTF-16 decoder.
//!
//! The decoder must accept exactly what the standard library accepts as
//! UTF-8 and produce the same UTF-16 units.

#![no_main]

use libfuzzer_sys::fuzz_target;

use mmapio::name::utf8::{encode_utf16, utf8_to_utf16};

fuzz_target!(|data: &[u8]| {
    let decoded = encode_utf16(data);

    match std::str::from_utf8(data) {
        Ok(text) => {
            let mut expected: Vec<u16> = text.encode_utf16().collect();
            expected.push(0);
            assert_eq!(decoded.unwrap(), expected);
        }
        Err(_) => {
            assert!(decoded.is_err());
            assert!(utf8_to_utf16(data, None).is_err());
        }
    }
});

//! # Mode Parser
//!
//! Turns a short mode text such as `"r"`, `"we"` or `"rpi"` into a [`MapMode`].
//!
//! ## Grammar
//!
//! | Token | Meaning                                                  |
//! |-------|----------------------------------------------------------|
//! | `r`   | read-only access                                         |
//! | `w`   | read-write access                                        |
//! | `e`   | map from the offset to the current end of file           |
//! | `p`   | private (copy-on-write) mapping                          |
//! | `i`   | the file handle may be inherited by child processes      |
//!
//! Tokens are order-independent. Unknown characters are ignored and repeated
//! tokens are idempotent. When both `r` and `w` appear, the last one wins.
//!
//! Parsing never fails. A mode without an access token produces a `MapMode`
//! whose `access` is `None`; the failure surfaces when the open orchestrator
//! tries to translate it into native open flags.
//!
//! At most `MODE_SCAN_LIMIT` characters are inspected, and a NUL byte ends the
//! scan early so mode buffers copied from C strings behave the same way.

use crate::config::{
    MODE_END, MODE_INHERIT, MODE_PRIVATE, MODE_READ, MODE_SCAN_LIMIT, MODE_TERMINATOR, MODE_WRITE,
};

/// Access level requested for a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn is_writable(self) -> bool {
        matches!(self, Access::Write)
    }

    pub fn name(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }
}

/// Semantic flags extracted from a mode text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MapMode {
    /// `None` when the mode text carried no access token.
    pub access: Option<Access>,
    pub extend_to_end: bool,
    pub private: bool,
    pub inheritable: bool,
}

impl MapMode {
    /// Parses a mode text. See the module documentation for the grammar.
    pub fn parse(mode: &str) -> Self {
        Self::parse_bytes(mode.as_bytes())
    }

    /// Parses raw mode bytes, stopping at a NUL or after `MODE_SCAN_LIMIT` bytes.
    pub fn parse_bytes(mode: &[u8]) -> Self {
        let mut out = MapMode::default();

        for &token in mode.iter().take(MODE_SCAN_LIMIT) {
            match token {
                MODE_TERMINATOR => break,
                MODE_READ => out.access = Some(Access::Read),
                MODE_WRITE => out.access = Some(Access::Write),
                MODE_END => out.extend_to_end = true,
                MODE_PRIVATE => out.private = true,
                MODE_INHERIT => out.inheritable = true,
                _ => {}
            }
        }

        log::trace!("parsed mode {:?} -> {:?}", String::from_utf8_lossy(mode), out);
        out
    }

    pub fn is_writable(&self) -> bool {
        self.access.is_some_and(Access::is_writable)
    }

    /// True when writes through the mapping reach the backing file.
    pub fn writes_through(&self) -> bool {
        self.is_writable() && !self.private
    }
}

impl std::str::FromStr for MapMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MapMode::parse(s))
    }
}

impl std::fmt::Display for MapMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.access {
            Some(Access::Read) => write!(f, "{}", MODE_READ as char)?,
            Some(Access::Write) => write!(f, "{}", MODE_WRITE as char)?,
            None => {}
        }
        if self.extend_to_end {
            write!(f, "{}", MODE_END as char)?;
        }
        if self.private {
            write!(f, "{}", MODE_PRIVATE as char)?;
        }
        if self.inheritable {
            write!(f, "{}", MODE_INHERIT as char)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_mode() {
        let mode = MapMode::parse("r");

        assert_eq!(mode.access, Some(Access::Read));
        assert!(!mode.extend_to_end);
        assert!(!mode.private);
        assert!(!mode.inheritable);
    }

    #[test]
    fn all_tokens_compose() {
        let mode = MapMode::parse("wepi");

        assert_eq!(mode.access, Some(Access::Write));
        assert!(mode.extend_to_end);
        assert!(mode.private);
        assert!(mode.inheritable);
    }

    #[test]
    fn token_order_does_not_matter() {
        assert_eq!(MapMode::parse("pew"), MapMode::parse("wep"));
        assert_eq!(MapMode::parse("ir"), MapMode::parse("ri"));
    }

    #[test]
    fn unknown_characters_are_ignored() {
        let mode = MapMode::parse("r+bx");

        assert_eq!(mode, MapMode::parse("r"));
    }

    #[test]
    fn duplicate_tokens_are_idempotent() {
        assert_eq!(MapMode::parse("eerre"), MapMode::parse("re"));
    }

    #[test]
    fn missing_access_token_yields_none() {
        let mode = MapMode::parse("x");

        assert_eq!(mode.access, None);
        assert!(!mode.is_writable());
    }

    #[test]
    fn empty_mode_is_default() {
        assert_eq!(MapMode::parse(""), MapMode::default());
    }

    #[test]
    fn last_access_token_wins() {
        assert_eq!(MapMode::parse("rw").access, Some(Access::Write));
        assert_eq!(MapMode::parse("wr").access, Some(Access::Read));
    }

    #[test]
    fn scan_stops_at_nul() {
        let mode = MapMode::parse_bytes(b"r\0wep");

        assert_eq!(mode, MapMode::parse("r"));
    }

    #[test]
    fn scan_is_bounded() {
        let mode = MapMode::parse("xxxxxxxxw");

        assert_eq!(mode.access, None);

        let mode = MapMode::parse("xxxxxxxw");
        assert_eq!(mode.access, Some(Access::Write));
    }

    #[test]
    fn writes_through_only_for_shared_write() {
        assert!(MapMode::parse("w").writes_through());
        assert!(!MapMode::parse("wp").writes_through());
        assert!(!MapMode::parse("r").writes_through());
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(MapMode::parse("ipxew").to_string(), "wepi");
        assert_eq!(MapMode::parse("x").to_string(), "");
    }

    #[test]
    fn from_str_matches_parse() {
        let mode: MapMode = "re".parse().unwrap();

        assert_eq!(mode, MapMode::parse("re"));
    }
}

//! # mmapio Configuration Constants
//!
//! This module centralizes the constants that shape mode parsing and
//! mapping-range correction. Constants that depend on each other are
//! co-located and their relationships checked at compile time.
//!
//! ## Dependency Graph
//!
//! ```text
//! MODE_SCAN_LIMIT (8 characters)
//!       │
//!       └─> must be >= the number of distinct mode tokens (5), otherwise a
//!           fully spelled-out mode such as "wepi" could lose a token
//!
//! UNKNOWN_GRANULARITY (0)
//!       │
//!       └─> returned by the granularity query when the platform refuses to
//!           report one; alignment correction then uses a shift of zero
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use crate::config::{MODE_SCAN_LIMIT, MODE_READ};
//! ```

// ============================================================================
// MODE TEXT TOKENS
// Each token is a single ASCII character; unknown characters are ignored
// ============================================================================

/// Read-only access.
pub const MODE_READ: u8 = b'r';

/// Read-write access.
pub const MODE_WRITE: u8 = b'w';

/// Extend the mapping to the current end of file, overriding the size.
pub const MODE_END: u8 = b'e';

/// Copy-on-write mapping; writes never reach the backing file.
pub const MODE_PRIVATE: u8 = b'p';

/// Allow child processes to inherit the underlying file handle.
pub const MODE_INHERIT: u8 = b'i';

/// Number of distinct tokens understood by the mode parser.
pub const MODE_TOKEN_COUNT: usize = 5;

/// Maximum number of characters the mode parser inspects.
/// Anything past this bound is ignored, which also caps work on
/// unterminated or hostile input.
pub const MODE_SCAN_LIMIT: usize = 8;

/// Mode text terminator. Scanning stops here even before `MODE_SCAN_LIMIT`.
pub const MODE_TERMINATOR: u8 = 0;

const _: () = assert!(
    MODE_SCAN_LIMIT >= MODE_TOKEN_COUNT,
    "MODE_SCAN_LIMIT must cover every distinct mode token"
);

// ============================================================================
// ALIGNMENT
// ============================================================================

/// Granularity value meaning "the platform did not report one".
/// Alignment correction treats it as "no shift" and maps at the caller's
/// offset unchanged.
pub const UNKNOWN_GRANULARITY: usize = 0;

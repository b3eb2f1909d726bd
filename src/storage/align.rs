//! # Alignment Correction
//!
//! Mapping primitives only accept offsets on a granularity boundary (the page
//! size on Unix, the allocation granularity on Windows). Callers may ask for
//! any offset, so the request is widened downward and the difference, the
//! shift, is hidden again when the region is handed out:
//!
//! ```text
//!   aligned offset        requested offset
//!   |<------ shift ------>|<------------- size ------------->|
//!   |<----------------- mapped size (size + shift) --------->|
//! ```
//!
//! A granularity of zero means the platform would not report one; the shift
//! is then zero and the caller's offset is used unchanged.

use eyre::Result;

use crate::config::UNKNOWN_GRANULARITY;
use crate::error::{ErrorKind, MapError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    /// File offset handed to the mapping primitive.
    pub offset: u64,
    /// Bytes between `offset` and the caller's first byte.
    pub shift: usize,
    /// Bytes to map, including the shift.
    pub size: usize,
}

impl Alignment {
    pub fn compute(offset: u64, size: usize, granularity: usize) -> Result<Self> {
        if granularity == UNKNOWN_GRANULARITY {
            log::trace!("granularity unknown, mapping offset {} unshifted", offset);
            return Ok(Self {
                offset,
                shift: 0,
                size,
            });
        }

        let shift = (offset % granularity as u64) as usize;
        let mapped = size.checked_add(shift).ok_or_else(|| {
            MapError::new(
                ErrorKind::Range,
                format!(
                    "size {} plus alignment shift {} overflows the address space",
                    size, shift
                ),
            )
        })?;

        log::trace!(
            "aligned offset {} -> {} (shift {}, mapped size {})",
            offset,
            offset - shift as u64,
            shift,
            mapped
        );

        Ok(Self {
            offset: offset - shift as u64,
            shift,
            size: mapped,
        })
    }

    /// Bytes visible to the caller.
    pub fn visible(&self) -> usize {
        self.size - self.shift
    }
}

/// Rounds `value` up to a multiple of `granularity`. `None` on overflow.
pub fn round_up(value: u64, granularity: usize) -> Option<u64> {
    if granularity == UNKNOWN_GRANULARITY {
        return Some(value);
    }
    let g = granularity as u64;
    match value % g {
        0 => Some(value),
        rem => value.checked_add(g - rem),
    }
}

/// Maximum size of a Windows mapping object covering `alignment`.
///
/// Mapping objects are sized in whole granules even though views need not be,
/// and the result is clamped to the file size so mapping never grows the file.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn mapping_object_size(
    alignment: &Alignment,
    granularity: usize,
    file_size: u64,
) -> Option<u64> {
    let rounded = round_up(alignment.size as u64, granularity)?;
    let end = alignment.offset.checked_add(rounded)?;
    Some(end.min(file_size))
}

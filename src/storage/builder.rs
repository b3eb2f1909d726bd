//! # Map Options
//!
//! `MapOptions` is a typed alternative to mode text. It produces the same
//! [`MapMode`] the mode parser yields and goes through the same orchestrator.
//!
//! ## Configuration Options
//!
//! | Option          | Default | Mode token | Description                          |
//! |-----------------|---------|------------|--------------------------------------|
//! | read / write    | none    | `r` / `w`  | Access level; an open without one fails |
//! | extend_to_end   | false   | `e`        | Map from offset to end of file       |
//! | private         | false   | `p`        | Copy-on-write mapping                |
//! | inheritable     | false   | `i`        | Child processes may inherit the handle |
//! | size            | 0       |            | Bytes to map (ignored with extend)   |
//! | offset          | 0       |            | First file byte to map               |
//!
//! ## Usage
//!
//! ```ignore
//! let region = MapOptions::new()
//!     .write()
//!     .private()
//!     .offset(4000)
//!     .extend_to_end()
//!     .open("data.bin")?;
//! ```

use std::path::Path;

use eyre::Result;

use super::open::{open_name, open_path};
use super::region::MappedRegion;
use crate::mode::{Access, MapMode};
use crate::name::MapName;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapOptions {
    mode: MapMode,
    size: usize,
    offset: u64,
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a mode text, e.g. `MapOptions::from_mode("re")`.
    pub fn from_mode(mode: &str) -> Self {
        Self {
            mode: MapMode::parse(mode),
            ..Self::default()
        }
    }

    pub fn read(mut self) -> Self {
        self.mode.access = Some(Access::Read);
        self
    }

    pub fn write(mut self) -> Self {
        self.mode.access = Some(Access::Write);
        self
    }

    pub fn extend_to_end(mut self) -> Self {
        self.mode.extend_to_end = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.mode.private = true;
        self
    }

    pub fn inheritable(mut self) -> Self {
        self.mode.inheritable = true;
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<MappedRegion> {
        open_path(path.as_ref(), self.mode, self.size, self.offset)
    }

    pub fn open_name(&self, name: MapName<'_>) -> Result<MappedRegion> {
        open_name(name, self.mode, self.size, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_matches_mode_text() {
        let options = MapOptions::new().write().private().extend_to_end().inheritable();

        assert_eq!(options.mode(), MapMode::parse("wepi"));
    }

    #[test]
    fn from_mode_can_be_refined() {
        let options = MapOptions::from_mode("r").write().size(64).offset(10);

        assert_eq!(options.mode().access, Some(Access::Write));
        assert_eq!(options.size, 64);
        assert_eq!(options.offset, 10);
    }

    #[test]
    fn default_has_no_access() {
        assert_eq!(MapOptions::new().mode().access, None);
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn builder_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opts.bin");
        std::fs::write(&path, vec![7u8; 4096]).unwrap();

        let region = MapOptions::new().read().size(10).offset(3).open(&path).unwrap();

        assert_eq!(region.as_slice(), &[7u8; 10][..]);
    }
}

//! # Error Taxonomy and Last-Error Slot
//!
//! Every fallible call in this crate returns `eyre::Result`. The root cause
//! of a failed open is always a [`MapError`], which records which stage of
//! the open gave up:
//!
//! | Kind             | Raised when                                              |
//! |------------------|----------------------------------------------------------|
//! | `NameResolution` | a filename could not be converted to the native form     |
//! | `Open`           | the native open failed, or the mode had no access token  |
//! | `Inheritance`    | the inherit-on-spawn attribute could not be configured   |
//! | `Range`          | zero-size request, offset past EOF, or arithmetic overflow|
//! | `Mapping`        | the OS mapping primitive refused the request             |
//!
//! Use [`error_kind`] to recover the kind from a report, whatever context has
//! been layered on top of it.
//!
//! ## Last Error
//!
//! In addition to the returned report, every failed open stores a
//! [`LastError`] in a process-wide slot. The slot is overwritten by each
//! failing call and left untouched by successful ones. It is shared by all
//! threads, so a reader racing with another thread's failure may observe that
//! thread's error instead of its own.

use std::io;

use parking_lot::Mutex;

/// Stage of an open that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NameResolution,
    Open,
    Inheritance,
    Range,
    Mapping,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::NameResolution => "name resolution",
            ErrorKind::Open => "open",
            ErrorKind::Inheritance => "inheritance configuration",
            ErrorKind::Range => "range",
            ErrorKind::Mapping => "mapping",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct MapError {
    kind: ErrorKind,
    detail: String,
    source: Option<io::Error>,
}

impl MapError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            source: None,
        }
    }

    /// Builds an error from the calling thread's current OS error.
    pub fn last_os(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::os(kind, detail, io::Error::last_os_error())
    }

    pub fn os(kind: ErrorKind, detail: impl Into<String>, err: io::Error) -> Self {
        Self {
            kind,
            detail: detail.into(),
            source: Some(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn os_code(&self) -> Option<i32> {
        self.source.as_ref().and_then(io::Error::raw_os_error)
    }
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failure: {}", self.kind, self.detail)
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Finds the [`MapError`] behind a report, skipping any added context.
pub fn map_error(report: &eyre::Report) -> Option<&MapError> {
    report
        .chain()
        .find_map(|cause| cause.downcast_ref::<MapError>())
}

pub fn error_kind(report: &eyre::Report) -> Option<ErrorKind> {
    map_error(report).map(MapError::kind)
}

/// Snapshot of the most recent failed open in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastError {
    pub kind: ErrorKind,
    /// Native error code (`errno` or `GetLastError`) when the OS reported one.
    pub os_code: Option<i32>,
}

impl LastError {
    pub fn from_report(report: &eyre::Report) -> Option<Self> {
        map_error(report).map(|err| LastError {
            kind: err.kind(),
            os_code: err.os_code(),
        })
    }
}

impl std::fmt::Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.os_code {
            Some(code) => write!(f, "{} failure (os error {})", self.kind, code),
            None => write!(f, "{} failure", self.kind),
        }
    }
}

static LAST_ERROR: Mutex<Option<LastError>> = parking_lot::const_mutex(None);

pub fn last_error() -> Option<LastError> {
    *LAST_ERROR.lock()
}

pub fn set_last_error(err: Option<LastError>) {
    *LAST_ERROR.lock() = err;
}

/// Stores the failure described by `report` in the last-error slot.
pub(crate) fn record(report: &eyre::Report) {
    if let Some(err) = LastError::from_report(report) {
        set_last_error(Some(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    fn failing(kind: ErrorKind) -> eyre::Result<()> {
        Err(MapError::new(kind, "synthetic")).wrap_err("while opening 'data.bin'")
    }

    #[test]
    fn kind_survives_wrapped_context() {
        let report = failing(ErrorKind::Range).unwrap_err();

        assert_eq!(error_kind(&report), Some(ErrorKind::Range));
    }

    #[test]
    fn report_without_map_error_has_no_kind() {
        let report = eyre::eyre!("unrelated failure");

        assert_eq!(error_kind(&report), None);
        assert_eq!(LastError::from_report(&report), None);
    }

    #[test]
    fn os_code_is_taken_from_source() {
        let err = MapError::os(
            ErrorKind::Open,
            "open failed",
            io::Error::from_raw_os_error(2),
        );

        assert_eq!(err.os_code(), Some(2));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn synthetic_error_has_no_os_code() {
        let err = MapError::new(ErrorKind::Range, "offset past end of file");

        assert_eq!(err.os_code(), None);
        assert_eq!(err.to_string(), "range failure: offset past end of file");
    }

    #[test]
    fn last_error_snapshot_carries_code() {
        let report = eyre::Report::new(MapError::os(
            ErrorKind::Mapping,
            "mmap refused",
            io::Error::from_raw_os_error(12),
        ));

        let last = LastError::from_report(&report).unwrap();

        assert_eq!(last.kind, ErrorKind::Mapping);
        assert_eq!(last.os_code, Some(12));
        assert_eq!(last.to_string(), "mapping failure (os error 12)");
    }
}

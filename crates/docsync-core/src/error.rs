//! Error conditions that abort a scan

use std::fmt;

/// Failures raised by the core scanners.
///
/// Per-file and per-anchor problems never surface here; they are collected
/// into the scan results instead. These variants are wrapped in
/// [`eyre::Report`] by the scanners and can be recovered with
/// `report.downcast_ref::<Error>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required input (source root, document set) is absent or invalid
    Configuration(String),
    /// A source file does not parse cleanly
    Parse {
        file: String,
        line: usize,
        message: String,
    },
}

impl Error {
    /// Stable machine-readable name of the error class
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration_error",
            Error::Parse { .. } => "parse_error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(message) => write!(f, "{message}"),
            Error::Parse {
                file,
                line,
                message,
            } => write!(f, "{file}:{line}: {message}"),
        }
    }
}

impl std::error::Error for Error {}

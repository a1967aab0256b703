//! Error types for parsing and evaluating Kconfig descriptions.

use std::{fmt, io, path::PathBuf};

/// Result type for fallible engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A position in a Kconfig file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File name as written in the `source` statement (or the top file).
    pub filename: String,
    /// 1-based line number.
    pub linenr: usize,
}

impl Location {
    pub fn new(filename: impl Into<String>, linenr: usize) -> Self {
        Self {
            filename: filename.into(),
            linenr,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.linenr)
    }
}

/// Errors that abort loading or an I/O operation.
///
/// Value assignment problems are not errors: `set_value` reports them with a
/// `false` return and a warning, so interactive front ends keep running.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed Kconfig syntax.
    #[error("{location}: error: {message}")]
    Parse { location: Location, message: String },

    /// Macro expansion failed before tokenizing.
    #[error("{location}: error: {message}")]
    Preprocess { location: Location, message: String },

    /// A `source` statement includes a file that is already being parsed.
    #[error("{location}: recursive 'source' of '{file}' detected. Check that environment variables are set correctly.\nInclude path:\n{chain}")]
    RecursiveSource {
        location: Location,
        file: String,
        chain: String,
    },

    /// The dependency graph has a cycle. The message is the full report.
    #[error("{0}")]
    DependencyLoop(String),

    /// File system failure, tagged with the path involved.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn parse(location: Location, message: impl Into<String>) -> Self {
        Error::Parse {
            location,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors coming from the file system.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse(Location::new("Kconfig", 12), "unknown token 'foo'");
        assert_eq!(err.to_string(), "Kconfig:12: error: unknown token 'foo'");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = Error::io(
            "missing/Kconfig",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert!(err.is_io());
        assert!(err.to_string().starts_with("missing/Kconfig: "));
    }
}

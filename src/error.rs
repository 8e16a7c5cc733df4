use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors returned by the readers and loaders.
///
/// Messages name the source and line number but never the line itself, since
/// `.env` values are frequently secrets.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", display_source(.path))]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("{} in {}", .source, display_source(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: ParseError,
    },

    #[error("invalid UTF-8 at line {line} in {}", display_source(.path))]
    InvalidEncoding {
        path: Option<PathBuf>,
        line: u32,
        #[source]
        source: std::str::Utf8Error,
    },
}

impl Error {
    /// The file the error came from, if the input was a file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } | Self::InvalidEncoding { path, .. } => {
                path.as_deref()
            }
        }
    }

    pub(crate) fn with_path(self, new_path: &Path) -> Self {
        let new_path = Some(new_path.to_path_buf());
        match self {
            Self::Io { source, .. } => Self::Io {
                path: new_path,
                source,
            },
            Self::Parse { source, .. } => Self::Parse {
                path: new_path,
                source,
            },
            Self::InvalidEncoding { line, source, .. } => Self::InvalidEncoding {
                path: new_path,
                line,
                source,
            },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

impl From<ParseError> for Error {
    fn from(source: ParseError) -> Self {
        Self::Parse { path: None, source }
    }
}

fn display_source(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "<input>".to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}")]
pub struct ParseError {
    pub line: u32,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: u32, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Only reported by [`parse_pair`](crate::parse_pair); readers skip blank lines.
    Blank,
    /// Only reported by [`parse_pair`](crate::parse_pair); readers skip comments.
    Comment,
    InvalidSyntax,
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "empty line"),
            Self::Comment => write!(f, "comment line"),
            Self::InvalidSyntax => write!(f, "invalid line"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_message_names_source_and_line() {
        let err = Error::from(ParseError::new(3, ParseErrorKind::InvalidSyntax))
            .with_path(Path::new("conf/.env"));
        assert_eq!(err.to_string(), "invalid line at line 3 in conf/.env");
        assert_eq!(err.path(), Some(Path::new("conf/.env")));
    }

    #[test]
    fn reader_errors_have_no_path() {
        let err = Error::from(std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "failed to read <input>: boom");
        assert!(err.path().is_none());
    }

    #[test]
    fn io_source_is_preserved() {
        let err = Error::from(std::io::Error::from(std::io::ErrorKind::NotFound))
            .with_path(Path::new(".env"));
        match err {
            Error::Io { source, .. } => assert_eq!(source.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

//! Error types for the arenapool crate.
//!
//! Only *recoverable* failures are represented here. Per the allocator's
//! error taxonomy, out-of-memory, sentinel corruption, double-free, and
//! similar structural violations are unrecoverable and abort the process
//! instead (see [`crate::fatal`]).

use std::fmt;

/// Result type alias using the arenapool error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when opening or closing pool-managed resources.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A syscall-backed resource (descriptor, stream, directory, socket,
    /// pipe, fork) failed. The original `errno` is preserved.
    Io(std::io::Error),

    /// A compiled-regex resource failed to build. Regex errors aren't
    /// `errno`-shaped, so the underlying message is carried directly.
    InvalidPattern {
        /// Description of what was invalid about the pattern.
        message: String,
    },

    /// `palloc` was asked to allocate a non-positive size. Recoverable by
    /// spec: the caller gets a null-equivalent (`None`) result rather than
    /// the process aborting, but call sites that treat the result as
    /// infallible will surface this instead of crashing blind.
    NonPositiveSize {
        /// The size that was requested.
        requested: isize,
    },

    /// A handle referred to a pool, resource, or subprocess that is no
    /// longer tracked (already closed, already reaped, or its owning pool
    /// was already destroyed).
    InvalidHandle,

    /// Custom error with a message, for extensibility.
    Custom {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "resource operation failed: {err}"),
            Error::InvalidPattern { message } => {
                write!(f, "invalid regular expression: {message}")
            }
            Error::NonPositiveSize { requested } => {
                write!(f, "palloc called with non-positive size: {requested}")
            }
            Error::InvalidHandle => write!(f, "invalid or expired handle"),
            Error::Custom { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl Error {
    /// Creates an error from the current `errno`, matching the C API's
    /// "preserve errno, return sentinel" convention.
    #[inline]
    pub fn from_errno() -> Self {
        Error::Io(std::io::Error::last_os_error())
    }

    /// Creates a new custom error.
    #[inline]
    pub fn custom(message: impl Into<String>) -> Self {
        Error::Custom {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::NonPositiveSize { requested: -1 };
        assert!(err.to_string().contains("non-positive"));

        let err = Error::InvalidPattern {
            message: "unbalanced parenthesis".into(),
        };
        assert!(err.to_string().contains("unbalanced parenthesis"));

        let err = Error::InvalidHandle;
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn io_error_roundtrips_as_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err: Error = io.into();
        assert!(std::error::Error::source(&err).is_some());
    }
}

//! Engine error types.

use std::fmt;

/// Errors raised by conversion, lifecycle management and dispatch.
#[derive(Debug)]
pub enum Error {
    /// Dispatch attempted with no router configured.
    RouterNotSet,

    /// A stale process-bound request template was installed as base.
    StaleBaseRequest,

    /// A stale process-bound response template was installed as base.
    StaleBaseResponse,

    /// An upload descriptor could not be turned into a file handle.
    MalformedUpload(String),

    /// The harness URI could not be parsed.
    InvalidUri(http::uri::InvalidUri),

    /// HTTP type construction error.
    Http(http::Error),

    /// I/O error (e.g. reading an upload temp file).
    Io(std::io::Error),

    /// Failure reported by the router collaborator, propagated unchanged.
    Routing(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RouterNotSet => write!(f, "router not set"),
            Error::StaleBaseRequest => {
                write!(f, "unable to set base request: request is stale")
            }
            Error::StaleBaseResponse => {
                write!(f, "unable to set base response: response is stale")
            }
            Error::MalformedUpload(msg) => write!(f, "malformed upload descriptor: {}", msg),
            Error::InvalidUri(e) => write!(f, "invalid uri: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Routing(msg) => write!(f, "routing failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidUri(e) => Some(e),
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(e: http::uri::InvalidUri) -> Self {
        Error::InvalidUri(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

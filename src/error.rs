//! Error types for the cursor subsystem
//!
//! Errors fall into four classes: transport failures that take the whole
//! connection down, decode failures local to one cursor, errors reported by
//! the server for one query, and usage errors caused by the caller.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The connection (or a request on it) failed
    Transport,
    /// A response frame could not be understood
    Decode,
    /// The server reported a query failure
    Server,
    /// The caller misused the API
    Usage,
    /// A bug in this crate
    Internal,
}

/// Kind of failure reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorKind {
    /// The server believes the client sent something invalid
    Client,
    /// The query failed to compile
    Compile,
    /// The query failed while running
    Runtime,
}

impl std::fmt::Display for ServerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerErrorKind::Client => f.write_str("client error"),
            ServerErrorKind::Compile => f.write_str("compile error"),
            ServerErrorKind::Runtime => f.write_str("runtime error"),
        }
    }
}

/// Main error type for the cursor subsystem
#[derive(Error, Debug, Clone)]
#[allow(missing_docs)]
pub enum Error {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The connection was closed locally
    #[error("connection closed")]
    ConnectionClosed,

    /// The connection died underneath open cursors
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// Connection establishment timed out
    #[error("connection timeout after {0:?}")]
    ConnectionTimeout(Duration),

    /// No response arrived for an in-flight request in time.
    ///
    /// Fails only the cursor that was waiting; the connection and its other
    /// cursors carry on.
    #[error("no response from server after {0:?}")]
    FetchTimeout(Duration),

    /// Frame length above the configured maximum
    #[error("frame too large: {length} bytes exceeds maximum of {max}")]
    FrameTooLarge { length: usize, max: usize },

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    // =========================================================================
    // Decode Errors
    // =========================================================================
    /// Frame too short to contain a header
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    /// Buffer underflow - not enough data to read
    #[error("buffer underflow: need {needed} bytes but only {available} available")]
    BufferUnderflow { needed: usize, available: usize },

    /// Response body is not a valid response envelope
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Response type code not known to this client
    #[error("unknown response type: {0}")]
    UnknownResponseType(u64),

    // =========================================================================
    // Server Errors
    // =========================================================================
    /// The server reported a query failure
    #[error("{kind}: {message}")]
    Server {
        kind: ServerErrorKind,
        message: String,
        backtrace: Option<serde_json::Value>,
    },

    // =========================================================================
    // Usage Errors
    // =========================================================================
    /// Cursor is closed
    #[error("cursor is closed")]
    CursorClosed,

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Query could not be serialized
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (should not happen)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl Error {
    /// Create a new server-reported error
    pub fn server(kind: ServerErrorKind, message: impl Into<String>) -> Self {
        Error::Server {
            kind,
            message: message.into(),
            backtrace: None,
        }
    }

    /// Classify this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::ConnectionClosed
            | Error::ConnectionLost(_)
            | Error::ConnectionTimeout(_)
            | Error::FetchTimeout(_)
            | Error::FrameTooLarge { .. }
            | Error::Io(_) => ErrorClass::Transport,
            Error::FrameTooShort { .. }
            | Error::BufferUnderflow { .. }
            | Error::MalformedResponse(_)
            | Error::UnknownResponseType(_) => ErrorClass::Decode,
            Error::Server { .. } => ErrorClass::Server,
            Error::CursorClosed | Error::InvalidConfig(_) | Error::InvalidQuery(_) => {
                ErrorClass::Usage
            }
            Error::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Check if this is a transport-level error
    pub fn is_transport_error(&self) -> bool {
        self.class() == ErrorClass::Transport
    }

    /// Check if this is a decode error
    pub fn is_decode_error(&self) -> bool {
        self.class() == ErrorClass::Decode
    }

    /// Check if this error was reported by the server
    pub fn is_server_error(&self) -> bool {
        self.class() == ErrorClass::Server
    }

    /// Check if this error was caused by API misuse
    pub fn is_usage_error(&self) -> bool {
        self.class() == ErrorClass::Usage
    }

    /// The verbatim message of a server-reported error
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Server { message, .. } => Some(message),
            _ => None,
        }
    }
}

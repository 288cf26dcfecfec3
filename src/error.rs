//! Error types for the GoCD provider and CLI.
//!
//! Every failure is one of a small closed set of [`ErrorKind`]s. Callers
//! match on [`Error::kind`] rather than on message text.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned when a named entity is addressed with an empty name.
pub const EMPTY_NAME: &str = "`name` can not be empty";

/// Message returned when an update is attempted without a version token.
pub const EMPTY_VERSION: &str = "`version` can not be empty";

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input was rejected before any request was sent.
    Validation,
    /// The request never produced an HTTP response.
    Transport,
    /// The addressed entity does not exist on the server.
    NotFound,
    /// The supplied version token is stale.
    Conflict,
    /// The server answered with an unexpected status or body.
    Api,
}

impl ErrorKind {
    /// Lowercase name used in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Api => "api",
        }
    }
}

/// Errors produced by the client, the resource mappers and the CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field or flag is missing or malformed.
    ///
    /// The message is rendered verbatim.
    #[error("{0}")]
    Validation(String),

    /// Provider or CLI configuration is incomplete.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is not served.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Network, DNS, TLS or timeout failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered 404 where an entity was required.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The server rejected a version token (409 or 412).
    #[error("Version conflict (status {status}): {message}")]
    Conflict {
        /// HTTP status code.
        status: u16,
        /// Message returned by the server.
        message: String,
    },

    /// Any other non-2xx answer.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message returned by the server.
        message: String,
    },

    /// A JSON body or state bag could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An XML body could not be decoded.
    #[error("XML decode error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// A local file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The error returned for an empty entity name.
    pub fn empty_name() -> Self {
        Self::Validation(EMPTY_NAME.to_string())
    }

    /// Build an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Build a conflict error from a status code and message.
    pub fn conflict(status: u16, message: impl Into<String>) -> Self {
        Self::Conflict {
            status,
            message: message.into(),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Configuration(_) | Self::UnknownResource(_) | Self::Io(_) => {
                ErrorKind::Validation
            },
            Self::Transport(_) => ErrorKind::Transport,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Api { .. } | Self::Serialization(_) | Self::Xml(_) => ErrorKind::Api,
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Conflict { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this error means the entity does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns true if this error is a stale version token.
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

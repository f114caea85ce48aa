//! Error types for Deflux operations.
//!
//! Errors fall into two families:
//!
//! - **Contract violations**: caller misuse detected before any asynchronous
//!   work begins (bad payload type, unrecognized variant, streaming call before
//!   `open`). These are returned synchronously.
//! - **Runtime failures**: reported by the compression backend once work is
//!   under way (corrupt input, rejected parameters). These travel through the
//!   deferred value or the stream's `error` event.
//!
//! The error is `Clone` so a single failure can be delivered to both channels.

use crate::catalog::ResultCode;
use thiserror::Error;

/// The main error type for Deflux operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZlibError {
    /// A streaming method was called before `open` succeeded.
    #[error("stream not open yet")]
    StreamNotOpen,

    /// A streaming method was called after the stream reached a terminal state.
    #[error("stream is closed: {state}")]
    StreamClosed {
        /// Name of the terminal state ("ended" or "destroyed").
        state: &'static str,
    },

    /// `open` was called on a facade that already opened a stream.
    #[error("stream was already opened; a facade opens at most one stream")]
    AlreadyOpened,

    /// The variant name is not one of the seven recognized variants.
    #[error(
        "unrecognized variant '{name}': expected one of deflate, deflate_raw, gunzip, gzip, inflate, inflate_raw, unzip"
    )]
    UnrecognizedVariant {
        /// The rejected name.
        name: String,
    },

    /// The payload is neither text nor a byte sequence.
    #[error("invalid input: expected text or bytes, found {found}")]
    InvalidInput {
        /// Description of the rejected payload type.
        found: &'static str,
    },

    /// The text encoding label is unknown.
    #[error("unknown text encoding: {label}")]
    UnknownEncoding {
        /// The rejected label.
        label: String,
    },

    /// Text could not be represented in the requested encoding.
    #[error("Encoding error: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// A numeric setting is outside the bounds published by the catalog.
    #[error("{field} out of range: {value} not in {min}..={max}")]
    OutOfRange {
        /// Setting name.
        field: &'static str,
        /// Rejected value.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },

    /// A settings document could not be parsed.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Parser diagnostic.
        message: String,
    },

    /// `events()` was called a second time on the same stream.
    #[error("stream events already subscribed")]
    EventsAlreadySubscribed,

    /// The compression backend reported a failure.
    #[error("{message} ({code})")]
    Library {
        /// Status code from the catalog.
        code: ResultCode,
        /// Backend diagnostic.
        message: String,
    },

    /// The backend cannot honor a configured parameter.
    #[error("unsupported parameter: {parameter}")]
    Unsupported {
        /// Description of the parameter.
        parameter: String,
    },

    /// The stream was destroyed before the operation completed.
    #[error("stream destroyed: {reason}")]
    Destroyed {
        /// Reason supplied to `destroy`, or a default description.
        reason: String,
    },

    /// The piped downstream consumer failed.
    #[error("downstream write failed: {message}")]
    Sink {
        /// Description of the I/O failure.
        message: String,
    },
}

/// Result type alias for Deflux operations.
pub type Result<T> = std::result::Result<T, ZlibError>;

impl ZlibError {
    /// Create a stream closed error.
    pub fn stream_closed(state: &'static str) -> Self {
        Self::StreamClosed { state }
    }

    /// Create an unrecognized variant error.
    pub fn unrecognized_variant(name: impl Into<String>) -> Self {
        Self::UnrecognizedVariant { name: name.into() }
    }

    /// Create an invalid input error.
    pub fn invalid_input(found: &'static str) -> Self {
        Self::InvalidInput { found }
    }

    /// Create an unknown encoding error.
    pub fn unknown_encoding(label: impl Into<String>) -> Self {
        Self::UnknownEncoding {
            label: label.into(),
        }
    }

    /// Create an encoding error.
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Create an out of range error.
    pub fn out_of_range(field: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a backend failure.
    pub fn library(code: ResultCode, message: impl Into<String>) -> Self {
        Self::Library {
            code,
            message: message.into(),
        }
    }

    /// Create the failure reported when compressed input ends early.
    pub fn unexpected_eof() -> Self {
        Self::library(ResultCode::BufError, "unexpected end of file")
    }

    /// Create an unsupported parameter error.
    pub fn unsupported(parameter: impl Into<String>) -> Self {
        Self::Unsupported {
            parameter: parameter.into(),
        }
    }

    /// Create a destroyed error.
    pub fn destroyed(reason: impl Into<String>) -> Self {
        Self::Destroyed {
            reason: reason.into(),
        }
    }

    /// Create a downstream sink error.
    pub fn sink(err: &std::io::Error) -> Self {
        Self::Sink {
            message: err.to_string(),
        }
    }

    /// Whether this error is a caller programming error that is reported
    /// synchronously, as opposed to a failure discovered during compression.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::StreamNotOpen
                | Self::StreamClosed { .. }
                | Self::AlreadyOpened
                | Self::UnrecognizedVariant { .. }
                | Self::InvalidInput { .. }
                | Self::UnknownEncoding { .. }
                | Self::EncodingError { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidConfig { .. }
                | Self::EventsAlreadySubscribed
        )
    }

    /// The catalog status code closest to this error.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Library { code, .. } => *code,
            Self::Sink { .. } => ResultCode::Errno,
            _ => ResultCode::StreamError,
        }
    }
}

impl From<serde_json::Error> for ZlibError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

use crate::codec::{self, JsonErrorKind};
use crate::envelope::ErrorLike;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for JSend envelopes and the JSON codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A status outside `error`, `fail`, `success` was requested.
    #[error("status must be one of: error, fail, success (got {0:?})")]
    InvalidStatus(String),

    /// The JSON encoder rejected a value.
    #[error("{detail}")]
    Encoding { code: i32, detail: String },

    /// The JSON decoder rejected a document.
    #[error("{detail}")]
    Decoding { code: i32, detail: String },

    /// Strict key read on a key that was never set.
    #[error("nonexisting key requested: {0}")]
    MissingKey(String),

    /// Malformed configuration document.
    #[error("configuration error: {0}")]
    Config(String),
}

// Convenience constructors
impl Error {
    pub fn invalid_status(given: impl Into<String>) -> Self {
        Self::InvalidStatus(given.into())
    }

    pub fn encoding(kind: JsonErrorKind) -> Self {
        Self::encoding_code(kind.code())
    }

    pub fn decoding(kind: JsonErrorKind) -> Self {
        Self::decoding_code(kind.code())
    }

    /// Encoding error from a raw reason code; unknown codes keep their number in the detail.
    pub fn encoding_code(code: i32) -> Self {
        Self::Encoding {
            code,
            detail: detail_for(code),
        }
    }

    pub fn decoding_code(code: i32) -> Self {
        Self::Decoding {
            code,
            detail: detail_for(code),
        }
    }

    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey(key.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Numeric JSON reason for codec failures.
    pub fn json_code(&self) -> Option<i32> {
        match self {
            Error::Encoding { code, .. } | Error::Decoding { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn detail_for(code: i32) -> String {
    codec::reason(code)
        .map(|reason| reason.into_owned())
        .unwrap_or_default()
}

impl ErrorLike for Error {
    fn type_name(&self) -> &str {
        match self {
            Error::InvalidStatus(_) => "InvalidStatusError",
            Error::Encoding { .. } => "EncodingError",
            Error::Decoding { .. } => "DecodingError",
            Error::MissingKey(_) => "MissingKeyError",
            Error::Config(_) => "ConfigError",
        }
    }

    fn error_code(&self) -> Option<i64> {
        self.json_code().map(i64::from)
    }
}

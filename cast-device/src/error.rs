//! Error types for device records and descriptors.

use thiserror::Error;

/// Error type for building device descriptors from raw discovery metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device description document could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The raw record carries no usable identity (UDN)
    #[error("Device record has no identity")]
    MissingIdentity,

    /// A URL in the record could not be interpreted
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Convenience Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

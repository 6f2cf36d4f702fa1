//! Error types for the module worker
//!
//! Configuration, validation, and send failures are recovered locally and
//! answered with per-package replies. Transport failures are the single
//! fatal category: they stop the loop and the process, leaving restarts to
//! the host supervisor.

use thiserror::Error;

/// Errors from applying a module configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration carried no SMTP host
    #[error("SMTP host must not be empty")]
    MissingHost,

    /// The auth field must be a pair of username and password
    #[error("SMTP auth must be an array with a username and password")]
    BadAuth,

    /// The host carried a port suffix that is not a port number
    #[error("invalid port in SMTP host: {0}")]
    BadPort(String),
}

/// Errors from validating a mail request before dispatch
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The request carried no recipients
    #[error("at least one recipient (to) is required")]
    MissingRecipient,

    /// The request carried no mail object at all
    #[error("mail object is required")]
    MissingMailObject,

    /// The mail object carried no subject, or an empty one
    #[error("mail subject is required")]
    MissingSubject,
}

/// Errors reported by the SMTP collaborator
#[derive(Debug, Error)]
pub enum SendError {
    /// An address the SMTP client refused to parse
    #[error("invalid address {0}")]
    BadAddress(String),

    /// The message could not be assembled
    #[error("message assembly failed: {0}")]
    Message(String),

    /// The SMTP transport reported a delivery failure
    #[error("{0}")]
    Transport(String),
}

/// Errors on the framed host transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error on the package stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A package header whose check bit does not match its type
    #[error("corrupt package header: type {ty} with check bit {check}")]
    BadCheckBit { ty: u8, check: u8 },

    /// A package larger than the sanity cap
    #[error("package too large: {0} bytes")]
    Oversized(u32),

    /// A reply payload failed to serialize
    #[error("failed to encode reply: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

/// Result type for worker operations
pub type Result<T> = std::result::Result<T, TransportError>;

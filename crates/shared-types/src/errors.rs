//! # Error Types
//!
//! Structural-validation errors for channel messages and origins.
//!
//! These errors never reach the user: a frame that fails structural
//! validation is dropped and logged by the receiving side. Surfacing them
//! would hand an embedded peer an oracle over the host's validation logic.

use thiserror::Error;

/// Errors raised while parsing or validating a raw channel frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageError {
    /// Frame body is not a JSON object.
    #[error("Frame body is not an object")]
    NotAnObject,

    /// Required field is absent.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// Field is present but has the wrong shape.
    #[error("Malformed field {field}: {reason}")]
    MalformedField { field: &'static str, reason: String },

    /// Message version not supported.
    #[error("Unsupported version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },

    /// The `type` tag is not part of the protocol's closed set.
    #[error("Unrecognized message type: {tag}")]
    UnknownKind { tag: String },

    /// Payload does not match what the message kind requires.
    #[error("Payload mismatch for {kind}: {reason}")]
    PayloadMismatch { kind: &'static str, reason: String },

    /// Origin string could not be parsed into scheme+host+port.
    #[error("Invalid origin {origin}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    /// An origin allow-list must have at least one member.
    #[error("Origin allow-list is empty")]
    EmptyAllowList,
}

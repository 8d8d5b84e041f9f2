//! Error taxonomy for the embed host.
//!
//! Only launch and authentication failures are user-visible. Boundary
//! violations (wrong channel, foreign origin, stale nonce) and malformed
//! frames are swallowed at the guard layer and logged, never surfaced —
//! a visible reaction would let a hostile guest probe the validation
//! logic through the UI.

use shared_types::WebOrigin;
use thiserror::Error;

/// User-visible failures of an embedding session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbedHostError {
    /// Session start was rejected or unreachable. Terminal for this
    /// launch attempt; recovery is a fresh relaunch with a new nonce.
    #[error("Failed to launch {app_id}: {reason}")]
    LaunchFailed { app_id: String, reason: String },

    /// Ticket fetch was rejected. Recoverable: the session config stays
    /// alive and a later re-auth request may succeed.
    #[error("Authentication failed for {app_id}: {reason}")]
    AuthenticationFailed { app_id: String, reason: String },

    /// A second launch was requested for a session that already launched.
    /// A duplicate call would mint a second nonce for the same visual
    /// session and desynchronize the guest.
    #[error("Session already launched (state: {state})")]
    AlreadyLaunched { state: String },
}

/// Failures of the trust-server contract, as seen by its ports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrustError {
    /// The trust server answered with an error body.
    #[error("Trust server rejected the request: {message}")]
    Rejected { message: String },

    /// The trust server could not be reached.
    #[error("Trust server unreachable: {0}")]
    Transport(String),

    /// A 2xx response that does not match the contract shape.
    #[error("Malformed trust-server response: {0}")]
    MalformedResponse(String),
}

/// A trust-server grant that fails host-side validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GrantError {
    /// The grant names a different app than was requested.
    #[error("Grant names app {granted} but {requested} was requested")]
    AppIdMismatch { requested: String, granted: String },

    /// The allow-list must never be empty.
    #[error("Grant carries an empty origin allow-list")]
    EmptyAllowList,

    /// The guest origin must be a member of its own allow-list.
    #[error("Guest origin {origin} is not in its own allow-list")]
    OriginNotAllowed { origin: WebOrigin },
}

/// Failures of the embedded-context transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The embedded context no longer exists.
    #[error("Embedded context is detached")]
    Detached,

    /// The context exists but delivery failed.
    #[error("Delivery to embedded context failed: {0}")]
    DeliveryFailed(String),

    /// History navigation is not available for this embedding. Expected
    /// under strict cross-origin isolation; callers treat it as a no-op.
    #[error("History navigation unavailable for this embedding")]
    HistoryUnavailable,
}

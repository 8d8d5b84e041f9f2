//! Outbound events: user-visible notices the shell drains after each
//! turn of the event loop.
//!
//! Only launch and authentication failures (and the final close) ever
//! appear here. Boundary violations stay in the logs.

use serde::{Deserialize, Serialize};

/// A user-visible notice emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionNotice {
    /// The launch attempt failed; only a fresh relaunch recovers.
    LaunchFailed {
        /// App that failed to launch.
        app_id: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
    /// A ticket fetch failed; the guest may retry re-auth later.
    AuthenticationFailed {
        /// App whose ticket fetch failed.
        app_id: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
    /// The session finished tearing down.
    Closed,
}

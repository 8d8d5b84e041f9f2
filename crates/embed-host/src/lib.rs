//! # Embed Host
//!
//! Hosts third-party mini-apps inside the Atrium shell: mounts each one
//! in a sandboxed embedded context, grants it a delegated, time-boxed
//! identity of the signed-in user over a guarded message channel, and
//! tears it down on close. The host's own durable credentials never
//! cross the boundary.
//!
//! ## Trust Model
//!
//! The embedded peer is only partially trusted. Every inbound message
//! passes three checks before it is acted on:
//!
//! | Check | Defeats |
//! |-------|---------|
//! | Channel identity | A second embedded context impersonating the guest |
//! | Origin allow-list | Unrelated frames and extensions sharing the transport |
//! | Session nonce | Replayed or stale frames from prior sessions |
//!
//! Rejections are logged, never surfaced: a visible reaction would give
//! an embedded attacker an oracle over the validation logic.
//!
//! ## Module Structure
//!
//! ```text
//! embed-host/
//! ├── domain/       # SessionConfig, MessageGuard, lifecycle state machine
//! ├── events/       # Inbound frames/requests, outbound notices
//! ├── ports/        # EmbedSessionApi (inbound), TrustServer/GuestChannel/LinkOpener (outbound)
//! ├── application/  # EmbedSessionService orchestrating everything
//! ├── adapters/     # HTTP trust-server client (feature "http")
//! └── config.rs     # EmbedHostConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod events;
pub mod ports;

// Re-exports
pub use application::EmbedSessionService;
pub use config::EmbedHostConfig;
pub use domain::{
    ChannelError, ChannelId, EmbedHostError, ErrorCause, GrantError, GuardVerdict, LifecycleEvent,
    MessageGuard, SessionConfig, SessionGrant, SessionLifecycle, SessionState, TrustError,
};
pub use events::{GuestRequest, InboundFrame, SessionNotice};
pub use ports::{
    EmbedSessionApi, GuestChannel, LinkOpener, MockGuestChannel, MockLinkOpener, MockTrustServer,
    TrustServer,
};

#[cfg(feature = "http")]
pub use adapters::HttpTrustServer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

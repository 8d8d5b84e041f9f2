//! # Shared Types Crate
//!
//! Protocol vocabulary shared by every Atrium subsystem that talks across
//! the host/guest boundary: the `ChannelMessage` envelope, the closed
//! capability tag set, and the origin/nonce value objects.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every cross-boundary type is defined here.
//! - **Closed Tag Set**: The set of message kinds is a versioned enum, not
//!   ad hoc strings. Adding a capability is a protocol version bump.
//! - **Structure Before Trust**: `ChannelMessage::from_value` owns the
//!   structural checks; trust checks (channel, origin, nonce) belong to the
//!   embed-host guard and run only on well-formed messages.

pub mod envelope;
pub mod errors;
pub mod origin;

pub use envelope::{
    ChannelMessage, MessageKind, MessagePayload, OpenLinkPayload, SsoTicketPayload,
};
pub use errors::MessageError;
pub use origin::{OriginSet, WebOrigin};

use uuid::Uuid;

/// Current protocol version for channel messages.
pub const PROTOCOL_VERSION: u16 = 1;

/// Single-use random token scoping one embedding instance.
///
/// The nonce is minted by the trust server at session start, never reused
/// across launches, and never derivable from prior values. It is the
/// primary replay/confusion defense on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SessionNonce(Uuid);

impl SessionNonce {
    /// Mint a fresh random nonce.
    ///
    /// Only the trust-server side (or a test double standing in for it)
    /// should call this; the host always receives nonces, it never mints.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an externally minted nonce.
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SessionNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

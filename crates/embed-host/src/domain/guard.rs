//! Inbound message guard (security-critical).
//!
//! SECURITY-CRITICAL: the sole gatekeeper between the embedded peer and
//! the host's capability dispatch. Isolate for security audits.

use shared_types::{ChannelMessage, OriginSet, SessionNonce, WebOrigin};

use super::session::{ChannelId, SessionConfig};

/// Outcome of guarding one inbound message.
///
/// Everything except `Accepted` is dropped by the caller and logged at
/// debug level. Rejections are never surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Message passed every check and may be dispatched.
    Accepted,
    /// Transport-level source is not this session's embedded context.
    ForeignChannel {
        /// The context the frame actually arrived from.
        received: ChannelId,
    },
    /// Declared origin is not in the session's allow-list.
    OriginDenied {
        /// The origin the frame declared.
        origin: WebOrigin,
    },
    /// Message nonce does not match this session's nonce. Either a stale
    /// frame from a torn-down prior session or a forgery; both drop.
    NonceMismatch {
        /// The nonce the message carried.
        received: SessionNonce,
    },
}

impl GuardVerdict {
    /// True when the message may be acted on.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, GuardVerdict::Accepted)
    }
}

/// Decides, for every inbound message, whether it is trustworthy enough
/// to act on.
///
/// # Security
///
/// Three checks, all mandatory, in a fixed order:
///
/// 1. **Channel identity** — the frame must have physically arrived from
///    the one context this session mounted, not merely "some frame".
///    Defeats a second, attacker-controlled context impersonating the
///    guest.
/// 2. **Origin allow-list** — the declared origin must be a member of the
///    session's allow-list. Everything else is expected noise from
///    unrelated frames and extensions.
/// 3. **Nonce** — the message nonce must equal the session nonce.
///
/// Checks 1–2 are channel-level and cheap; check 3 is payload-level and
/// only meaningful once the channel itself is trusted enough to read a
/// payload from.
#[derive(Debug, Clone)]
pub struct MessageGuard {
    channel: ChannelId,
    allowed_origins: OriginSet,
    session_nonce: SessionNonce,
}

impl MessageGuard {
    /// Bind a guard to one session and its mounted context.
    #[must_use]
    pub fn for_session(config: &SessionConfig, channel: ChannelId) -> Self {
        Self {
            channel,
            allowed_origins: config.allowed_origins().clone(),
            session_nonce: config.session_nonce(),
        }
    }

    /// The context this guard trusts.
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Run the three checks against one structurally valid message.
    #[must_use]
    pub fn inspect(
        &self,
        frame_channel: ChannelId,
        frame_origin: &WebOrigin,
        message: &ChannelMessage,
    ) -> GuardVerdict {
        if frame_channel != self.channel {
            return GuardVerdict::ForeignChannel {
                received: frame_channel,
            };
        }

        if !self.allowed_origins.contains(frame_origin) {
            return GuardVerdict::OriginDenied {
                origin: frame_origin.clone(),
            };
        }

        if message.session_nonce != self.session_nonce {
            return GuardVerdict::NonceMismatch {
                received: message.session_nonce,
            };
        }

        GuardVerdict::Accepted
    }
}

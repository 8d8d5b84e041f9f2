//! Inbound events: raw frames off the transport and the typed requests
//! they become once guarded.

use serde_json::Value;
use shared_types::{ChannelMessage, MessageKind, MessagePayload};
use url::Url;

use crate::domain::ChannelId;
use shared_types::WebOrigin;

/// One raw frame as the transport delivered it, before any validation.
///
/// `channel` is stamped by the host-side transport from the context the
/// frame physically arrived on; the guest cannot influence it. `origin`
/// is the transport-level declared origin of the sender.
#[derive(Debug, Clone)]
pub struct InboundFrame {
    /// Context the frame arrived from.
    pub channel: ChannelId,
    /// Declared origin of the sender.
    pub origin: WebOrigin,
    /// Unparsed message body.
    pub body: Value,
}

impl InboundFrame {
    /// Bundle a raw frame.
    #[must_use]
    pub fn new(channel: ChannelId, origin: WebOrigin, body: Value) -> Self {
        Self {
            channel,
            origin,
            body,
        }
    }
}

/// A guest request that passed structural validation and the guard.
///
/// `SSO_TICKET` has no variant here: it is host-to-guest only, and a
/// guest echoing one back is dropped as noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestRequest {
    /// Guest is loaded and wants its first ticket.
    Ready,
    /// Guest wants a fresh ticket.
    Reauth,
    /// Guest asks for a URL in a new top-level context.
    OpenLink(Url),
    /// Guest asks for teardown.
    Close,
}

impl GuestRequest {
    /// Map a guarded message onto a request, if it is one a guest may
    /// legitimately send.
    #[must_use]
    pub fn from_message(message: &ChannelMessage) -> Option<Self> {
        match (&message.kind, &message.payload) {
            (MessageKind::EmbedReady, _) => Some(Self::Ready),
            (MessageKind::RequestReauth, _) => Some(Self::Reauth),
            (MessageKind::OpenLink, MessagePayload::OpenLink(p)) => {
                Some(Self::OpenLink(p.url.clone()))
            }
            (MessageKind::Close, _) => Some(Self::Close),
            // Host-to-guest kinds and payload mismatches are not
            // requests. Structural validation already rejects the
            // latter; this is the backstop.
            _ => None,
        }
    }
}

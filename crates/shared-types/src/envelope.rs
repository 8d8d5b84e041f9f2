//! # `ChannelMessage` Envelope
//!
//! The universal wrapper for every message crossing the host/guest
//! boundary, in either direction.
//!
//! ## Wire Shape
//!
//! ```json
//! {
//!   "version": 1,
//!   "type": "EMBED_READY",
//!   "sessionNonce": "6d2c0c6e-...",
//!   "correlationId": "0b9f3f7e-...",
//!   "payload": { }
//! }
//! ```
//!
//! ## Validation Layering
//!
//! [`ChannelMessage::from_value`] performs *structural* validation only:
//! object shape, version, tag membership, payload shape. A frame that
//! fails here is dropped before any trust check runs. Channel identity,
//! origin, and nonce checks are the embed-host guard's job and operate on
//! an already well-formed message.

use serde_json::{json, Map, Value};
use url::Url;
use uuid::Uuid;

use crate::errors::MessageError;
use crate::{SessionNonce, PROTOCOL_VERSION};

/// The closed set of message kinds for protocol version 1.
///
/// Extending this set is a protocol version bump, not a new string
/// literal: dispatch over kinds stays exhaustive and statically checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Guest announces it has loaded and is ready to authenticate.
    EmbedReady,
    /// Guest's ticket went stale; it asks for a fresh one.
    RequestReauth,
    /// Guest asks the host to open a URL in a new top-level context.
    OpenLink,
    /// Guest asks the host to tear the session down.
    Close,
    /// Host delivers a delegated-identity ticket to the guest.
    SsoTicket,
}

impl MessageKind {
    /// Wire tag for this kind.
    #[must_use]
    pub fn as_wire_tag(&self) -> &'static str {
        match self {
            Self::EmbedReady => "EMBED_READY",
            Self::RequestReauth => "REQUEST_REAUTH",
            Self::OpenLink => "OPEN_LINK",
            Self::Close => "CLOSE",
            Self::SsoTicket => "SSO_TICKET",
        }
    }

    /// Parse a wire tag. `None` for anything outside the closed set.
    #[must_use]
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag {
            "EMBED_READY" => Some(Self::EmbedReady),
            "REQUEST_REAUTH" => Some(Self::RequestReauth),
            "OPEN_LINK" => Some(Self::OpenLink),
            "CLOSE" => Some(Self::Close),
            "SSO_TICKET" => Some(Self::SsoTicket),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire_tag())
    }
}

/// Payload for `OPEN_LINK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenLinkPayload {
    /// Destination to open in a new top-level browsing context.
    pub url: Url,
}

/// Payload for `SSO_TICKET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoTicketPayload {
    /// Short-lived delegated-identity credential.
    pub ticket: String,
    /// Guest application the ticket is scoped to.
    pub app_id: String,
}

/// Kind-dependent payload of a channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    /// Kinds that carry no data (`EMBED_READY`, `REQUEST_REAUTH`, `CLOSE`).
    Empty,
    /// `OPEN_LINK` data.
    OpenLink(OpenLinkPayload),
    /// `SSO_TICKET` data.
    SsoTicket(SsoTicketPayload),
}

/// One validated message crossing the host/guest boundary.
///
/// Never persisted; lives for exactly one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Protocol version the sender speaks.
    pub version: u16,
    /// Which message this is.
    pub kind: MessageKind,
    /// Must match the owning session's nonce to be honored.
    pub session_nonce: SessionNonce,
    /// Log-correlation identifier. Carries no trust weight.
    pub correlation_id: Uuid,
    /// Kind-dependent data.
    pub payload: MessagePayload,
}

impl ChannelMessage {
    fn new(kind: MessageKind, session_nonce: SessionNonce, payload: MessagePayload) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            kind,
            session_nonce,
            correlation_id: Uuid::new_v4(),
            payload,
        }
    }

    /// Build an `EMBED_READY` announcement.
    #[must_use]
    pub fn embed_ready(session_nonce: SessionNonce) -> Self {
        Self::new(MessageKind::EmbedReady, session_nonce, MessagePayload::Empty)
    }

    /// Build a `REQUEST_REAUTH` request.
    #[must_use]
    pub fn request_reauth(session_nonce: SessionNonce) -> Self {
        Self::new(
            MessageKind::RequestReauth,
            session_nonce,
            MessagePayload::Empty,
        )
    }

    /// Build an `OPEN_LINK` request.
    #[must_use]
    pub fn open_link(session_nonce: SessionNonce, url: Url) -> Self {
        Self::new(
            MessageKind::OpenLink,
            session_nonce,
            MessagePayload::OpenLink(OpenLinkPayload { url }),
        )
    }

    /// Build a `CLOSE` request.
    #[must_use]
    pub fn close(session_nonce: SessionNonce) -> Self {
        Self::new(MessageKind::Close, session_nonce, MessagePayload::Empty)
    }

    /// Build an `SSO_TICKET` delivery.
    #[must_use]
    pub fn sso_ticket(session_nonce: SessionNonce, ticket: String, app_id: String) -> Self {
        Self::new(
            MessageKind::SsoTicket,
            session_nonce,
            MessagePayload::SsoTicket(SsoTicketPayload { ticket, app_id }),
        )
    }

    /// Structurally validate a raw frame body.
    ///
    /// Checks, in order: object shape, `type` tag membership, `version`
    /// support, `sessionNonce` shape, payload shape for the kind. The
    /// first failure wins; callers drop the frame and log, nothing more.
    pub fn from_value(value: &Value) -> Result<Self, MessageError> {
        let object = value.as_object().ok_or(MessageError::NotAnObject)?;

        let tag = require_str(object, "type")?;
        let kind = MessageKind::from_wire_tag(tag).ok_or_else(|| MessageError::UnknownKind {
            tag: tag.to_string(),
        })?;

        let version = require_u16(object, "version")?;
        if version != PROTOCOL_VERSION {
            return Err(MessageError::UnsupportedVersion {
                received: version,
                supported: PROTOCOL_VERSION,
            });
        }

        let session_nonce = SessionNonce::from_uuid(require_uuid(object, "sessionNonce")?);

        let correlation_id = match object.get("correlationId") {
            Some(_) => require_uuid(object, "correlationId")?,
            None => Uuid::new_v4(),
        };

        let payload = parse_payload(kind, object.get("payload"))?;

        Ok(Self {
            version,
            kind,
            session_nonce,
            correlation_id,
            payload,
        })
    }

    /// Serialize for transmission.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let payload = match &self.payload {
            MessagePayload::Empty => Value::Null,
            MessagePayload::OpenLink(p) => json!({ "url": p.url.as_str() }),
            MessagePayload::SsoTicket(p) => json!({ "ticket": p.ticket, "appId": p.app_id }),
        };

        let mut body = json!({
            "version": self.version,
            "type": self.kind.as_wire_tag(),
            "sessionNonce": self.session_nonce,
            "correlationId": self.correlation_id,
        });
        if !payload.is_null() {
            body["payload"] = payload;
        }
        body
    }
}

fn require_str<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, MessageError> {
    object
        .get(field)
        .ok_or(MessageError::MissingField { field })?
        .as_str()
        .ok_or_else(|| MessageError::MalformedField {
            field,
            reason: "expected a string".to_string(),
        })
}

fn require_u16(object: &Map<String, Value>, field: &'static str) -> Result<u16, MessageError> {
    let raw = object
        .get(field)
        .ok_or(MessageError::MissingField { field })?
        .as_u64()
        .ok_or_else(|| MessageError::MalformedField {
            field,
            reason: "expected an unsigned integer".to_string(),
        })?;
    u16::try_from(raw).map_err(|_| MessageError::MalformedField {
        field,
        reason: "out of range for u16".to_string(),
    })
}

fn require_uuid(object: &Map<String, Value>, field: &'static str) -> Result<Uuid, MessageError> {
    let raw = require_str(object, field)?;
    Uuid::parse_str(raw).map_err(|e| MessageError::MalformedField {
        field,
        reason: e.to_string(),
    })
}

fn parse_payload(kind: MessageKind, raw: Option<&Value>) -> Result<MessagePayload, MessageError> {
    match kind {
        // Data-free kinds tolerate an absent or null payload and ignore
        // any extra object a sloppy guest attaches.
        MessageKind::EmbedReady | MessageKind::RequestReauth | MessageKind::Close => {
            Ok(MessagePayload::Empty)
        }
        MessageKind::OpenLink => {
            let object = payload_object(kind, raw)?;
            let raw_url = require_str(object, "url")?;
            let url = Url::parse(raw_url).map_err(|e| MessageError::PayloadMismatch {
                kind: kind.as_wire_tag(),
                reason: format!("url: {e}"),
            })?;
            Ok(MessagePayload::OpenLink(OpenLinkPayload { url }))
        }
        MessageKind::SsoTicket => {
            let object = payload_object(kind, raw)?;
            let ticket = require_str(object, "ticket")?.to_string();
            let app_id = require_str(object, "appId")?.to_string();
            Ok(MessagePayload::SsoTicket(SsoTicketPayload { ticket, app_id }))
        }
    }
}

fn payload_object<'a>(
    kind: MessageKind,
    raw: Option<&'a Value>,
) -> Result<&'a Map<String, Value>, MessageError> {
    raw.and_then(Value::as_object)
        .ok_or_else(|| MessageError::PayloadMismatch {
            kind: kind.as_wire_tag(),
            reason: "expected a payload object".to_string(),
        })
}

//! # Web Origins
//!
//! Exact scheme+host+port identity for the guest side of an embedding.
//!
//! ## Security Properties
//!
//! - **Exact Match Only**: Two origins are equal iff scheme, host, and port
//!   all match. There is no wildcard value, no subdomain matching, and no
//!   path component.
//! - **Normalized at Construction**: Default ports are folded into the
//!   scheme (`https://a.example:443` == `https://a.example`), so equality
//!   is structural, not textual.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

use crate::errors::MessageError;

/// The exact scheme+host+port a browsing context runs at.
///
/// Constructed only through [`WebOrigin::parse`], which rejects anything
/// without a host (e.g. `data:` or `file:` URLs) so that every value of
/// this type names one addressable peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebOrigin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl WebOrigin {
    /// Parse and normalize an origin from a URL or origin string.
    ///
    /// Any path, query, or fragment on the input is ignored; only the
    /// origin triple is kept. Explicit default ports are normalized away.
    pub fn parse(input: &str) -> Result<Self, MessageError> {
        let url = Url::parse(input).map_err(|e| MessageError::InvalidOrigin {
            origin: input.to_string(),
            reason: e.to_string(),
        })?;

        let host = url
            .host_str()
            .ok_or_else(|| MessageError::InvalidOrigin {
                origin: input.to_string(),
                reason: "origin has no host".to_string(),
            })?
            .to_ascii_lowercase();

        // Url::port() already yields None for the scheme's default port.
        Ok(Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host,
            port: url.port(),
        })
    }

    /// The origin of a full URL (e.g. a guest's `start_url`).
    pub fn of_url(url: &Url) -> Result<Self, MessageError> {
        Self::parse(url.as_str())
    }

    /// Serialized `scheme://host[:port]` form.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WebOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(p) => write!(f, "{}://{}:{}", self.scheme, self.host, p),
            None => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

impl TryFrom<String> for WebOrigin {
    type Error = MessageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WebOrigin> for String {
    fn from(origin: WebOrigin) -> Self {
        origin.as_string()
    }
}

/// Non-empty set of origins the host accepts inbound messages from.
///
/// The session's own guest origin is always a member; additional members
/// cover guests that delegate messaging to a sibling domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginSet {
    members: BTreeSet<WebOrigin>,
}

impl OriginSet {
    /// Build an allow-list. Fails on an empty member list.
    pub fn new(members: impl IntoIterator<Item = WebOrigin>) -> Result<Self, MessageError> {
        let members: BTreeSet<WebOrigin> = members.into_iter().collect();
        if members.is_empty() {
            return Err(MessageError::EmptyAllowList);
        }
        Ok(Self { members })
    }

    /// Exact-match membership test.
    #[must_use]
    pub fn contains(&self, origin: &WebOrigin) -> bool {
        self.members.contains(origin)
    }

    /// Number of allowed origins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false: construction rejects empty sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over the allowed origins.
    pub fn iter(&self) -> impl Iterator<Item = &WebOrigin> {
        self.members.iter()
    }
}

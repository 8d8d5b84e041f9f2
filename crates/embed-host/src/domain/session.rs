//! Session identity: the immutable facts of one embedding.

use serde::{Deserialize, Serialize};
use shared_types::{OriginSet, SessionNonce, WebOrigin};
use url::Url;
use uuid::Uuid;

use super::errors::GrantError;

/// Opaque, unforgeable handle to one embedded browsing context.
///
/// Minted host-side when the context is created and never handed to the
/// guest. Every inbound frame carries the id of the context it physically
/// arrived from; a frame from any other context is rejected before its
/// origin or nonce is even read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    /// Mint a fresh channel identity.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What the trust server hands back from its session-start operation.
///
/// Raw external contract shape; validated into a [`SessionConfig`] before
/// anything acts on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    /// Application the grant was minted for.
    pub app_id: String,
    /// Single-use nonce identifying this exact session instance.
    pub session_nonce: SessionNonce,
    /// Exact origin the guest runs at.
    pub origin: WebOrigin,
    /// Fully-qualified guest entry URL, not yet carrying session params.
    pub start_url: Url,
    /// Origins the host will accept messages from for this session.
    pub allowed_post_message_origins: Vec<WebOrigin>,
}

/// Immutable facts describing one active embedding.
///
/// Created once per launch, owned exclusively by one session service,
/// discarded on close. Construction enforces the grant invariants, so a
/// value of this type is always internally consistent.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    app_id: String,
    session_nonce: SessionNonce,
    origin: WebOrigin,
    start_url: Url,
    allowed_post_message_origins: OriginSet,
}

impl SessionConfig {
    /// Validate a trust-server grant into a session config.
    ///
    /// Rejects a grant that names a different app than was requested, an
    /// empty allow-list, or a guest origin missing from its own
    /// allow-list. Any rejection is a launch failure for the caller.
    pub fn from_grant(requested_app_id: &str, grant: SessionGrant) -> Result<Self, GrantError> {
        if grant.app_id != requested_app_id {
            return Err(GrantError::AppIdMismatch {
                requested: requested_app_id.to_string(),
                granted: grant.app_id,
            });
        }

        let allowed = OriginSet::new(grant.allowed_post_message_origins)
            .map_err(|_| GrantError::EmptyAllowList)?;

        if !allowed.contains(&grant.origin) {
            return Err(GrantError::OriginNotAllowed {
                origin: grant.origin,
            });
        }

        Ok(Self {
            app_id: grant.app_id,
            session_nonce: grant.session_nonce,
            origin: grant.origin,
            start_url: grant.start_url,
            allowed_post_message_origins: allowed,
        })
    }

    /// Application this session embeds.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// This session's nonce.
    #[must_use]
    pub fn session_nonce(&self) -> SessionNonce {
        self.session_nonce
    }

    /// Exact origin the guest runs at.
    #[must_use]
    pub fn origin(&self) -> &WebOrigin {
        &self.origin
    }

    /// Guest entry URL as granted (no session params).
    #[must_use]
    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    /// Origins accepted on the inbound channel.
    #[must_use]
    pub fn allowed_origins(&self) -> &OriginSet {
        &self.allowed_post_message_origins
    }

    /// The guest-bound launch URL: `start_url` augmented with the session
    /// parameters the guest needs to construct its reply channel before
    /// any message is exchanged.
    #[must_use]
    pub fn launch_url(&self, parent_origin: &WebOrigin) -> Url {
        let mut url = self.start_url.clone();
        url.query_pairs_mut()
            .append_pair("nonce", &self.session_nonce.to_string())
            .append_pair("appId", &self.app_id)
            .append_pair("parentOrigin", &parent_origin.as_string());
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant() -> SessionGrant {
        let origin = WebOrigin::parse("https://guest.example").unwrap();
        SessionGrant {
            app_id: "a1".to_string(),
            session_nonce: SessionNonce::mint(),
            origin: origin.clone(),
            start_url: Url::parse("https://guest.example/app").unwrap(),
            allowed_post_message_origins: vec![origin],
        }
    }

    #[test]
    fn test_from_grant_accepts_valid() {
        let config = SessionConfig::from_grant("a1", grant()).unwrap();
        assert_eq!(config.app_id(), "a1");
        assert!(config.allowed_origins().contains(config.origin()));
    }

    #[test]
    fn test_from_grant_rejects_app_mismatch() {
        let result = SessionConfig::from_grant("other", grant());
        assert!(matches!(result, Err(GrantError::AppIdMismatch { .. })));
    }

    #[test]
    fn test_from_grant_rejects_empty_allow_list() {
        let mut g = grant();
        g.allowed_post_message_origins.clear();
        assert!(matches!(
            SessionConfig::from_grant("a1", g),
            Err(GrantError::EmptyAllowList)
        ));
    }

    #[test]
    fn test_from_grant_rejects_origin_outside_allow_list() {
        let mut g = grant();
        g.allowed_post_message_origins =
            vec![WebOrigin::parse("https://sibling.example").unwrap()];
        assert!(matches!(
            SessionConfig::from_grant("a1", g),
            Err(GrantError::OriginNotAllowed { .. })
        ));
    }

    #[test]
    fn test_allow_list_wider_than_origin_accepted() {
        let mut g = grant();
        g.allowed_post_message_origins
            .push(WebOrigin::parse("https://sibling.example").unwrap());
        let config = SessionConfig::from_grant("a1", g).unwrap();
        assert_eq!(config.allowed_origins().len(), 2);
    }

    #[test]
    fn test_launch_url_carries_session_params() {
        let config = SessionConfig::from_grant("a1", grant()).unwrap();
        let parent = WebOrigin::parse("https://atrium.example").unwrap();
        let url = config.launch_url(&parent);

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(pairs.contains(&("nonce".to_string(), config.session_nonce().to_string())));
        assert!(pairs.contains(&("appId".to_string(), "a1".to_string())));
        assert!(pairs.contains(&(
            "parentOrigin".to_string(),
            "https://atrium.example".to_string()
        )));
        // The grant's own URL is untouched.
        assert!(config.start_url().query().is_none());
    }

    #[test]
    fn test_launch_url_preserves_existing_query() {
        let mut g = grant();
        g.start_url = Url::parse("https://guest.example/app?theme=dark").unwrap();
        let config = SessionConfig::from_grant("a1", g).unwrap();
        let parent = WebOrigin::parse("https://atrium.example").unwrap();
        let url = config.launch_url(&parent);
        assert!(url.query().unwrap().contains("theme=dark"));
        assert!(url.query().unwrap().contains("appId=a1"));
    }

    #[test]
    fn test_channel_id_unique() {
        assert_ne!(ChannelId::mint(), ChannelId::mint());
    }
}

//! Shared fixtures for the suite: a wired session over mock ports.

use std::sync::Arc;

use embed_host::{
    EmbedHostConfig, EmbedSessionService, GuestChannel, InboundFrame, MockGuestChannel,
    MockLinkOpener, MockTrustServer, SessionGrant,
};
use shared_types::{ChannelMessage, SessionNonce, WebOrigin};
use url::Url;

pub type MockSession = EmbedSessionService<MockTrustServer, MockGuestChannel, MockLinkOpener>;

pub struct Harness {
    pub service: Arc<MockSession>,
    pub trust: Arc<MockTrustServer>,
    pub channel: Arc<MockGuestChannel>,
    pub links: Arc<MockLinkOpener>,
}

pub fn guest_origin() -> WebOrigin {
    WebOrigin::parse("https://guest.example").unwrap()
}

pub fn grant_for(app_id: &str) -> SessionGrant {
    SessionGrant {
        app_id: app_id.to_string(),
        session_nonce: SessionNonce::mint(),
        origin: guest_origin(),
        start_url: Url::parse("https://guest.example/app").unwrap(),
        allowed_post_message_origins: vec![guest_origin()],
    }
}

impl Harness {
    pub fn new(app_id: &str) -> Self {
        Self::with_grant(app_id, grant_for(app_id))
    }

    pub fn with_grant(app_id: &str, grant: SessionGrant) -> Self {
        let trust = Arc::new(MockTrustServer::new(grant));
        let channel = Arc::new(MockGuestChannel::new());
        let links = Arc::new(MockLinkOpener::new());
        let service = Arc::new(EmbedSessionService::new(
            app_id,
            EmbedHostConfig::for_testing(),
            Arc::clone(&trust),
            Arc::clone(&channel),
            Arc::clone(&links),
        ));
        Self {
            service,
            trust,
            channel,
            links,
        }
    }

    /// The session's granted nonce. Panics before a successful start.
    pub fn nonce(&self) -> SessionNonce {
        self.service.session_config().unwrap().session_nonce()
    }

    /// A frame as the legitimate guest would send it.
    pub fn guest_frame(&self, message: &ChannelMessage) -> InboundFrame {
        InboundFrame::new(self.channel.id(), guest_origin(), message.to_value())
    }
}

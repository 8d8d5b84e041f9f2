//! Outbound ports: traits for the trust server, the embedded context,
//! and top-level link opening, plus mock implementations for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use url::Url;

use shared_types::{ChannelMessage, SessionNonce, WebOrigin};

use crate::domain::{ChannelError, ChannelId, SessionGrant, TrustError};

/// The trust server, consumed as an opaque service.
///
/// Both operations are specified by contract only; how tickets are
/// minted and signed is the server's business.
#[async_trait]
pub trait TrustServer: Send + Sync {
    /// Start a session for an app. Called exactly once per launch
    /// attempt; a retry is a fresh launch with a fresh nonce.
    async fn start_session(&self, app_id: &str) -> Result<SessionGrant, TrustError>;

    /// Mint one ephemeral delegated-identity ticket scoped to
    /// `(app_id, session_nonce)`. Never cached by the caller.
    async fn issue_ticket(
        &self,
        app_id: &str,
        session_nonce: SessionNonce,
    ) -> Result<String, TrustError>;
}

/// The one embedded browsing context a session owns.
///
/// Exclusively owned by its session for the session's duration; all
/// guest-bound communication flows through here.
#[async_trait]
pub trait GuestChannel: Send + Sync {
    /// Unforgeable identity of this context. Inbound frames carry the id
    /// of the context they arrived from, stamped by the transport.
    fn id(&self) -> ChannelId;

    /// Navigate the context to the guest's launch URL.
    async fn mount(&self, launch_url: &Url) -> Result<(), ChannelError>;

    /// Deliver one message with transport-level delivery restricted to
    /// `target`. There is no wildcard `WebOrigin`, so a broader delivery
    /// is unrepresentable at this seam.
    async fn deliver(
        &self,
        target: &WebOrigin,
        message: &ChannelMessage,
    ) -> Result<(), ChannelError>;

    /// Dismantle the context. Best-effort; teardown must never fail the
    /// caller.
    async fn teardown(&self);

    /// Step the guest's own history by `delta` entries. Only works when
    /// the embedding allows it; the default honestly reports that it
    /// cannot, and callers treat that as a silent no-op.
    async fn history_step(&self, _delta: i32) -> Result<(), ChannelError> {
        Err(ChannelError::HistoryUnavailable)
    }
}

/// Opens URLs in a new top-level browsing context on the guest's behalf.
///
/// The only sanctioned path for a sandboxed guest to cause top-level
/// navigation; the embedding itself is never navigated.
#[async_trait]
pub trait LinkOpener: Send + Sync {
    /// Open `url` in a new top-level context. Best-effort.
    async fn open_external(&self, url: &Url);
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock trust server with call counting and switchable failures.
///
/// Tickets are minted as `ticket-1`, `ticket-2`, … so tests can assert
/// that every ticket request produced a fresh fetch.
pub struct MockTrustServer {
    grant: SessionGrant,
    /// Fail the next session start?
    pub fail_start: AtomicBool,
    /// Fail ticket fetches?
    pub fail_tickets: AtomicBool,
    start_calls: AtomicUsize,
    ticket_requests: Mutex<Vec<(String, SessionNonce)>>,
}

impl MockTrustServer {
    /// Serve the given grant.
    #[must_use]
    pub fn new(grant: SessionGrant) -> Self {
        Self {
            grant,
            fail_start: AtomicBool::new(false),
            fail_tickets: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            ticket_requests: Mutex::new(Vec::new()),
        }
    }

    /// How many session starts were requested.
    #[must_use]
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// How many tickets were requested.
    #[must_use]
    pub fn ticket_calls(&self) -> usize {
        self.ticket_requests.lock().len()
    }

    /// Every ticket request with the scope it asked for.
    #[must_use]
    pub fn ticket_requests(&self) -> Vec<(String, SessionNonce)> {
        self.ticket_requests.lock().clone()
    }
}

#[async_trait]
impl TrustServer for MockTrustServer {
    async fn start_session(&self, app_id: &str) -> Result<SessionGrant, TrustError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(TrustError::Rejected {
                message: format!("session start refused for {app_id}"),
            });
        }
        Ok(self.grant.clone())
    }

    async fn issue_ticket(
        &self,
        app_id: &str,
        session_nonce: SessionNonce,
    ) -> Result<String, TrustError> {
        let n = {
            let mut requests = self.ticket_requests.lock();
            requests.push((app_id.to_string(), session_nonce));
            requests.len()
        };
        if self.fail_tickets.load(Ordering::SeqCst) {
            return Err(TrustError::Rejected {
                message: "ticket refused".to_string(),
            });
        }
        Ok(format!("ticket-{n}"))
    }
}

/// Mock embedded context recording everything done to it.
pub struct MockGuestChannel {
    id: ChannelId,
    mounts: Mutex<Vec<Url>>,
    deliveries: Mutex<Vec<(WebOrigin, ChannelMessage)>>,
    history_steps: Mutex<Vec<i32>>,
    torn_down: AtomicBool,
    /// Fail deliveries?
    pub fail_deliver: AtomicBool,
    /// Support history stepping?
    pub supports_history: AtomicBool,
}

impl MockGuestChannel {
    /// Fresh mock context with its own identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ChannelId::mint(),
            mounts: Mutex::new(Vec::new()),
            deliveries: Mutex::new(Vec::new()),
            history_steps: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
            fail_deliver: AtomicBool::new(false),
            supports_history: AtomicBool::new(false),
        }
    }

    /// URLs this context was mounted at.
    #[must_use]
    pub fn mounts(&self) -> Vec<Url> {
        self.mounts.lock().clone()
    }

    /// Every delivery with its transport-level target.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(WebOrigin, ChannelMessage)> {
        self.deliveries.lock().clone()
    }

    /// History deltas requested.
    #[must_use]
    pub fn history_steps(&self) -> Vec<i32> {
        self.history_steps.lock().clone()
    }

    /// Was the context dismantled?
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

impl Default for MockGuestChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GuestChannel for MockGuestChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    async fn mount(&self, launch_url: &Url) -> Result<(), ChannelError> {
        self.mounts.lock().push(launch_url.clone());
        Ok(())
    }

    async fn deliver(
        &self,
        target: &WebOrigin,
        message: &ChannelMessage,
    ) -> Result<(), ChannelError> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(ChannelError::Detached);
        }
        if self.fail_deliver.load(Ordering::SeqCst) {
            return Err(ChannelError::DeliveryFailed("mock failure".to_string()));
        }
        self.deliveries.lock().push((target.clone(), message.clone()));
        Ok(())
    }

    async fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
    }

    async fn history_step(&self, delta: i32) -> Result<(), ChannelError> {
        if !self.supports_history.load(Ordering::SeqCst) {
            return Err(ChannelError::HistoryUnavailable);
        }
        self.history_steps.lock().push(delta);
        Ok(())
    }
}

/// Mock link opener recording opened URLs.
#[derive(Default)]
pub struct MockLinkOpener {
    opened: Mutex<Vec<Url>>,
}

impl MockLinkOpener {
    /// Fresh recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs opened in new top-level contexts.
    #[must_use]
    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl LinkOpener for MockLinkOpener {
    async fn open_external(&self, url: &Url) {
        self.opened.lock().push(url.clone());
    }
}

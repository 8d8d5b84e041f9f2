//! # Embed Session Service
//!
//! Orchestrates one embedding: launches it against the trust server,
//! mounts the guest, guards the inbound channel, relays tickets, and
//! tears everything down on close.
//!
//! ## Concurrency
//!
//! One instance per embedding, driven by a single-threaded event loop.
//! The only suspension points are the session-start call and the ticket
//! fetch; a user close may interleave at either. The lifecycle state is
//! therefore kept behind a mutex that is never held across an await, and
//! every async leg re-checks the state after it settles — a late ticket
//! must never reach a channel that no longer exists.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;

use shared_types::ChannelMessage;

use crate::config::EmbedHostConfig;
use crate::domain::{
    EmbedHostError, LifecycleEvent, MessageGuard, SessionConfig, SessionLifecycle, SessionState,
};
use crate::events::incoming::{GuestRequest, InboundFrame};
use crate::events::outgoing::SessionNotice;
use crate::ports::inbound::EmbedSessionApi;
use crate::ports::outbound::{GuestChannel, LinkOpener, TrustServer};

/// Mutable per-session state, shared between the frame path and the
/// user close path.
struct SessionInner {
    lifecycle: SessionLifecycle,
    session: Option<SessionConfig>,
    guard: Option<MessageGuard>,
    notices: Vec<SessionNotice>,
}

/// One mini-app session: the state machine plus its wired ports.
pub struct EmbedSessionService<T, C, L>
where
    T: TrustServer,
    C: GuestChannel,
    L: LinkOpener,
{
    app_id: String,
    host_config: EmbedHostConfig,
    trust: Arc<T>,
    channel: Arc<C>,
    links: Arc<L>,
    inner: Mutex<SessionInner>,
}

impl<T, C, L> EmbedSessionService<T, C, L>
where
    T: TrustServer + 'static,
    C: GuestChannel + 'static,
    L: LinkOpener + 'static,
{
    /// Wire a session for one app over its own embedded context.
    pub fn new(
        app_id: impl Into<String>,
        host_config: EmbedHostConfig,
        trust: Arc<T>,
        channel: Arc<C>,
        links: Arc<L>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            host_config,
            trust,
            channel,
            links,
            inner: Mutex::new(SessionInner {
                lifecycle: SessionLifecycle::new(),
                session: None,
                guard: None,
                notices: Vec::new(),
            }),
        }
    }

    /// The immutable session facts, once granted.
    #[must_use]
    pub fn session_config(&self) -> Option<SessionConfig> {
        self.inner.lock().session.clone()
    }

    fn fail_launch(&self, reason: String) -> Result<(), EmbedHostError> {
        {
            let mut inner = self.inner.lock();
            // If the user already closed, the failure is moot.
            if inner.lifecycle.apply(LifecycleEvent::StartFailed).is_ok() {
                inner.notices.push(SessionNotice::LaunchFailed {
                    app_id: self.app_id.clone(),
                    reason: reason.clone(),
                });
            }
        }
        tracing::error!(app_id = %self.app_id, %reason, "mini-app launch failed");
        Err(EmbedHostError::LaunchFailed {
            app_id: self.app_id.clone(),
            reason,
        })
    }

    fn fail_auth(&self, reason: String) {
        let mut inner = self.inner.lock();
        if inner.lifecycle.apply(LifecycleEvent::TicketFailed).is_ok() {
            inner.notices.push(SessionNotice::AuthenticationFailed {
                app_id: self.app_id.clone(),
                reason: reason.clone(),
            });
            tracing::error!(app_id = %self.app_id, %reason, "delegated authentication failed");
        } else {
            tracing::debug!(app_id = %self.app_id, %reason, "ticket failure after session settled");
        }
    }

    /// Fetch one fresh ticket and deliver it, delivery-targeted to the
    /// guest origin. Initial auth and re-auth are the same operation.
    async fn relay_ticket(&self) {
        let (nonce, origin) = {
            let mut inner = self.inner.lock();
            if let Err(err) = inner.lifecycle.apply(LifecycleEvent::TicketRequested) {
                tracing::debug!(%err, "dropped ticket request");
                return;
            }
            let Some(session) = inner.session.as_ref() else {
                // States that accept a ticket request all carry a session.
                tracing::error!("ticket requested without a session config");
                return;
            };
            (session.session_nonce(), session.origin().clone())
        };

        tracing::info!(app_id = %self.app_id, "fetching delegated-identity ticket");
        let fetched = self.trust.issue_ticket(&self.app_id, nonce).await;

        // A close that landed while the fetch was in flight wins.
        if self.inner.lock().lifecycle.state() != SessionState::AwaitingTicket {
            tracing::debug!(app_id = %self.app_id, "discarding ticket result for settled session");
            return;
        }

        let ticket = match fetched {
            Ok(ticket) => ticket,
            Err(err) => {
                self.fail_auth(err.to_string());
                return;
            }
        };

        let message = ChannelMessage::sso_ticket(nonce, ticket, self.app_id.clone());
        match self.channel.deliver(&origin, &message).await {
            Ok(()) => {
                let mut inner = self.inner.lock();
                if let Err(err) = inner.lifecycle.apply(LifecycleEvent::TicketDelivered) {
                    tracing::debug!(%err, "session settled during ticket delivery");
                } else {
                    tracing::info!(app_id = %self.app_id, "ticket delivered, session active");
                }
            }
            Err(err) => self.fail_auth(err.to_string()),
        }
    }

    async fn open_link(&self, url: Url) {
        {
            let inner = self.inner.lock();
            if !inner.lifecycle.state().accepts_capabilities() {
                tracing::debug!(
                    state = %inner.lifecycle.state(),
                    "dropped OPEN_LINK outside an active session"
                );
                return;
            }
        }
        tracing::info!(app_id = %self.app_id, %url, "opening guest link in new top-level context");
        self.links.open_external(&url).await;
    }

    async fn dispatch(&self, request: GuestRequest) {
        match request {
            GuestRequest::Ready | GuestRequest::Reauth => self.relay_ticket().await,
            GuestRequest::OpenLink(url) => self.open_link(url).await,
            GuestRequest::Close => self.close().await,
        }
    }
}

#[async_trait]
impl<T, C, L> EmbedSessionApi for EmbedSessionService<T, C, L>
where
    T: TrustServer + 'static,
    C: GuestChannel + 'static,
    L: LinkOpener + 'static,
{
    async fn start(&self) -> Result<(), EmbedHostError> {
        {
            let mut inner = self.inner.lock();
            if let Err(err) = inner.lifecycle.apply(LifecycleEvent::LaunchRequested) {
                return Err(EmbedHostError::AlreadyLaunched { state: err.state });
            }
        }

        tracing::info!(app_id = %self.app_id, "starting mini-app session");
        let grant = match self.trust.start_session(&self.app_id).await {
            Ok(grant) => grant,
            Err(err) => return self.fail_launch(err.to_string()),
        };

        let config = match SessionConfig::from_grant(&self.app_id, grant) {
            Ok(config) => config,
            Err(err) => return self.fail_launch(err.to_string()),
        };

        let launch_url = config.launch_url(&self.host_config.parent_origin);
        if let Err(err) = self.channel.mount(&launch_url).await {
            return self.fail_launch(err.to_string());
        }

        let closed_mid_launch = {
            let mut inner = self.inner.lock();
            if inner.lifecycle.state().is_shut() {
                true
            } else {
                inner.guard = Some(MessageGuard::for_session(&config, self.channel.id()));
                inner.session = Some(config);
                if let Err(err) = inner.lifecycle.apply(LifecycleEvent::ConfigAccepted) {
                    tracing::error!(%err, "lifecycle refused launch completion");
                }
                false
            }
        };
        if closed_mid_launch {
            // The user closed while the guest was mounting; the mount
            // arrived late and is dismantled again.
            self.channel.teardown().await;
            return Ok(());
        }

        tracing::info!(app_id = %self.app_id, "guest mounted, channel listening");
        Ok(())
    }

    async fn on_frame(&self, frame: InboundFrame) {
        // Structure before trust: nothing below reads a field the parser
        // has not vetted.
        let message = match ChannelMessage::from_value(&frame.body) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(origin = %frame.origin, %err, "dropped malformed frame");
                return;
            }
        };

        {
            let inner = self.inner.lock();
            let Some(guard) = inner.guard.as_ref() else {
                tracing::debug!(origin = %frame.origin, "dropped frame: no listening session");
                return;
            };
            let verdict = guard.inspect(frame.channel, &frame.origin, &message);
            if !verdict.is_accepted() {
                tracing::debug!(?verdict, kind = %message.kind, "dropped untrusted frame");
                return;
            }
        }

        let Some(request) = GuestRequest::from_message(&message) else {
            tracing::debug!(kind = %message.kind, "dropped non-request message");
            return;
        };

        self.dispatch(request).await;
    }

    async fn close(&self) {
        let was_closed = {
            let mut inner = self.inner.lock();
            if inner.lifecycle.state() == SessionState::Closed {
                true
            } else {
                // Never fails: every state has a close edge.
                let _ = inner.lifecycle.apply(LifecycleEvent::CloseRequested);
                false
            }
        };
        if was_closed {
            return;
        }

        self.channel.teardown().await;

        let mut inner = self.inner.lock();
        let finished = inner.lifecycle.state() == SessionState::Closing
            && inner.lifecycle.apply(LifecycleEvent::TeardownComplete).is_ok();
        if finished {
            inner.session = None;
            inner.guard = None;
            inner.notices.push(SessionNotice::Closed);
            tracing::info!(app_id = %self.app_id, "mini-app session closed");
        }
    }

    fn state(&self) -> SessionState {
        self.inner.lock().lifecycle.state()
    }

    fn take_notices(&self) -> Vec<SessionNotice> {
        std::mem::take(&mut self.inner.lock().notices)
    }

    async fn nudge_history(&self, delta: i32) {
        if !self.host_config.history_forwarding {
            return;
        }
        if let Err(err) = self.channel.history_step(delta).await {
            tracing::debug!(%err, "history nudge unavailable for this embedding");
        }
    }
}

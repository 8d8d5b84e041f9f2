//! Inbound port: what the shell may ask of one embedding session.

use async_trait::async_trait;

use crate::domain::{EmbedHostError, SessionState};
use crate::events::incoming::InboundFrame;
use crate::events::outgoing::SessionNotice;

/// The session API one embedding exposes to the shell.
///
/// One instance per active embedding; instances share nothing. The shell
/// drives this from a single-threaded event loop: transport frames go to
/// [`on_frame`](EmbedSessionApi::on_frame) in arrival order, the close
/// button goes to [`close`](EmbedSessionApi::close), and notices are
/// drained after each call.
#[async_trait]
pub trait EmbedSessionApi: Send + Sync {
    /// Launch the session: call the trust server once, mount the guest,
    /// start listening. A second call is rejected without side effects.
    async fn start(&self) -> Result<(), EmbedHostError>;

    /// Feed one raw transport frame through validation, the guard, and
    /// dispatch. Never errors outward: everything untrustworthy is
    /// dropped and logged.
    async fn on_frame(&self, frame: InboundFrame);

    /// Tear the session down. Honored from every state, including
    /// errored ones, and never fails; a ticket still in flight is
    /// discarded when it lands.
    async fn close(&self);

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Drain pending user-visible notices.
    fn take_notices(&self) -> Vec<SessionNotice>;

    /// Best-effort nudge of the guest's own history (back/forward).
    /// Silently does nothing under strict cross-origin isolation.
    async fn nudge_history(&self, delta: i32);
}

//! Session lifecycle state machine.
//!
//! Transitions are driven by exactly four event sources: the session
//! start call, the embedded context's mount, guarded inbound messages,
//! and the explicit user close. The machine is the single authority on
//! what may happen next — there is no "already started" flag anywhere
//! else; the `Starting` state itself rejects a reentrant launch.

use std::fmt;
use thiserror::Error;

/// Why a session ended up in [`SessionState::Errored`].
///
/// The cause decides what the error state still accepts: an
/// authentication failure keeps the session config alive and honors a
/// later re-auth request; a launch failure honors only close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCause {
    /// Session start rejected or unreachable. Terminal for this launch.
    Launch,
    /// Ticket fetch or delivery failed. Recoverable via re-auth.
    Authentication,
}

/// The states one embedding moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Before and during the session-start call; no channel exists yet.
    Starting {
        /// Whether the start call has been issued. A second launch
        /// request while this is set is rejected — it would mint a
        /// second nonce for the same visual session.
        request_in_flight: bool,
    },
    /// Config received, guest mounted, channel listening, nothing
    /// exchanged yet.
    Ready,
    /// Guest announced readiness or requested re-auth; ticket fetch in
    /// flight.
    AwaitingTicket,
    /// Ticket delivered; guest presumed self-authenticated. Capability
    /// requests are honored indefinitely.
    Active,
    /// Teardown requested; channel being dismantled.
    Closing,
    /// Torn down; session config discarded. Nothing but close (a no-op)
    /// is accepted here.
    Closed,
    /// Unrecoverable failure, surfaced to the user.
    Errored {
        /// What failed; decides whether re-auth is still honored.
        cause: ErrorCause,
    },
}

impl SessionState {
    /// Fresh machine: launch not yet issued.
    #[must_use]
    pub fn new() -> Self {
        SessionState::Starting {
            request_in_flight: false,
        }
    }

    /// True once the session can never again become active.
    #[must_use]
    pub fn is_shut(&self) -> bool {
        matches!(self, SessionState::Closing | SessionState::Closed)
    }

    /// True while capability requests (`OPEN_LINK`) are honored.
    #[must_use]
    pub fn accepts_capabilities(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    /// True when a ready/re-auth announcement may start a ticket fetch.
    #[must_use]
    pub fn accepts_ticket_request(&self) -> bool {
        matches!(
            self,
            SessionState::Ready
                | SessionState::Active
                | SessionState::Errored {
                    cause: ErrorCause::Authentication
                }
        )
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Starting { request_in_flight } => {
                if *request_in_flight {
                    write!(f, "Starting(launching)")
                } else {
                    write!(f, "Starting")
                }
            }
            SessionState::Ready => write!(f, "Ready"),
            SessionState::AwaitingTicket => write!(f, "AwaitingTicket"),
            SessionState::Active => write!(f, "Active"),
            SessionState::Closing => write!(f, "Closing"),
            SessionState::Closed => write!(f, "Closed"),
            SessionState::Errored { cause } => match cause {
                ErrorCause::Launch => write!(f, "Errored(launch)"),
                ErrorCause::Authentication => write!(f, "Errored(auth)"),
            },
        }
    }
}

/// Events that drive the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Shell asked to launch; the session-start call is about to go out.
    LaunchRequested,
    /// Session-start succeeded and the guest is mounted.
    ConfigAccepted,
    /// Session-start failed (network or rejection).
    StartFailed,
    /// A guarded ready/re-auth message arrived; ticket fetch begins.
    TicketRequested,
    /// Ticket fetched and delivered to the guest.
    TicketDelivered,
    /// Ticket fetch or delivery failed.
    TicketFailed,
    /// User or guest asked to tear the session down.
    CloseRequested,
    /// Channel teardown finished.
    TeardownComplete,
}

/// A transition the machine does not define.
///
/// Never user-visible: the service logs and drops. Reaching this from
/// host code (rather than from message timing) is a bug.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("No transition from {state} on {event:?}")]
pub struct InvalidTransition {
    /// State the machine was in.
    pub state: String,
    /// Event that had no edge.
    pub event: LifecycleEvent,
}

/// The state machine for one embedding.
#[derive(Debug, Clone, Default)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    /// Fresh machine in `Starting`, launch not yet issued.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Apply one event, returning the new state.
    ///
    /// Close is honored from every state and is idempotent; everything
    /// else only follows defined edges.
    pub fn apply(&mut self, event: LifecycleEvent) -> Result<SessionState, InvalidTransition> {
        use LifecycleEvent as E;
        use SessionState as S;

        let next = match (self.state, event) {
            (
                S::Starting {
                    request_in_flight: false,
                },
                E::LaunchRequested,
            ) => S::Starting {
                request_in_flight: true,
            },
            (
                S::Starting {
                    request_in_flight: true,
                },
                E::ConfigAccepted,
            ) => S::Ready,
            (
                S::Starting {
                    request_in_flight: true,
                },
                E::StartFailed,
            ) => S::Errored {
                cause: ErrorCause::Launch,
            },

            (state, E::TicketRequested) if state.accepts_ticket_request() => S::AwaitingTicket,
            (S::AwaitingTicket, E::TicketDelivered) => S::Active,
            (S::AwaitingTicket, E::TicketFailed) => S::Errored {
                cause: ErrorCause::Authentication,
            },

            // Close is honored from any state and always succeeds.
            (S::Closed, E::CloseRequested) => S::Closed,
            (_, E::CloseRequested) => S::Closing,
            (S::Closing, E::TeardownComplete) => S::Closed,
            (S::Closed, E::TeardownComplete) => S::Closed,

            (state, event) => {
                return Err(InvalidTransition {
                    state: state.to_string(),
                    event,
                })
            }
        };

        self.state = next;
        Ok(next)
    }
}

//! Core domain: session identity, the message guard, and the lifecycle
//! state machine. Pure logic, no I/O.

mod errors;
mod guard;
mod lifecycle;
mod session;

pub use errors::{ChannelError, EmbedHostError, GrantError, TrustError};
pub use guard::{GuardVerdict, MessageGuard};
pub use lifecycle::{ErrorCause, InvalidTransition, LifecycleEvent, SessionLifecycle, SessionState};
pub use session::{ChannelId, SessionConfig, SessionGrant};

//! Ports: the inbound API the shell drives, and the outbound traits the
//! session depends on (trust server, embedded context, link opening).

pub mod inbound;
pub mod outbound;

pub use inbound::EmbedSessionApi;
pub use outbound::{
    GuestChannel, LinkOpener, MockGuestChannel, MockLinkOpener, MockTrustServer, TrustServer,
};

//! Events crossing the embed-host boundary, split by direction.

pub mod incoming;
pub mod outgoing;

pub use incoming::{GuestRequest, InboundFrame};
pub use outgoing::SessionNotice;

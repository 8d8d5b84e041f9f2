//! Adapters binding the outbound ports to real infrastructure.
//!
//! Feature-gated so the core library stays dependency-light.

#[cfg(feature = "http")]
mod trust_http;

#[cfg(feature = "http")]
pub use trust_http::HttpTrustServer;

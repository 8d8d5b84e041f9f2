//! Embed-host configuration.

use serde::{Deserialize, Serialize};
use shared_types::WebOrigin;

/// Host-side settings shared by every session the shell launches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedHostConfig {
    /// The shell's own origin, handed to guests as `parentOrigin` so
    /// they can address their reply channel before the first exchange.
    pub parent_origin: WebOrigin,

    /// Forward back/forward/refresh into the guest's own history when
    /// the embedding permits it. Best-effort: under strict cross-origin
    /// isolation the nudge silently does nothing.
    pub history_forwarding: bool,
}

impl EmbedHostConfig {
    /// Config for a shell at `parent_origin`, history forwarding off.
    #[must_use]
    pub fn new(parent_origin: WebOrigin) -> Self {
        Self {
            parent_origin,
            history_forwarding: false,
        }
    }

    /// Minimal config for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        #[allow(clippy::unwrap_used)]
        let parent_origin = WebOrigin::parse("https://atrium.example").unwrap();
        Self {
            parent_origin,
            history_forwarding: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_testing_config() {
        let config = EmbedHostConfig::for_testing();
        assert_eq!(config.parent_origin.as_string(), "https://atrium.example");
        assert!(config.history_forwarding);
    }
}

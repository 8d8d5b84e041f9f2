//! HTTP adapter for the trust server.
//!
//! Speaks the session-start and ticket contracts over JSON:
//!
//! - `POST {base}/sessions`  body `{"appId": ...}` → session grant
//! - `POST {base}/tickets`   body `{"appId": ..., "sessionNonce": ...}`
//!   → `{"ticket": ...}`
//!
//! Error bodies are `{"error": "..."}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use shared_types::SessionNonce;

use crate::domain::{SessionGrant, TrustError};
use crate::ports::outbound::TrustServer;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionRequest<'a> {
    app_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueTicketRequest<'a> {
    app_id: &'a str,
    session_nonce: SessionNonce,
}

#[derive(Deserialize)]
struct IssueTicketResponse {
    ticket: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Trust server reached over HTTPS.
pub struct HttpTrustServer {
    base: Url,
    http: reqwest::Client,
}

impl HttpTrustServer {
    /// Client for the trust server at `base`.
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, TrustError> {
        self.base
            .join(path)
            .map_err(|e| TrustError::Transport(e.to_string()))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, TrustError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let endpoint = self.endpoint(path)?;
        let response = self
            .http
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| TrustError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Prefer the server's own error message when it sent one.
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => format!("HTTP {status}"),
            };
            return Err(TrustError::Rejected { message });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| TrustError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl TrustServer for HttpTrustServer {
    async fn start_session(&self, app_id: &str) -> Result<SessionGrant, TrustError> {
        self.post_json("sessions", &StartSessionRequest { app_id })
            .await
    }

    async fn issue_ticket(
        &self,
        app_id: &str,
        session_nonce: SessionNonce,
    ) -> Result<String, TrustError> {
        let response: IssueTicketResponse = self
            .post_json(
                "tickets",
                &IssueTicketRequest {
                    app_id,
                    session_nonce,
                },
            )
            .await?;
        Ok(response.ticket)
    }
}

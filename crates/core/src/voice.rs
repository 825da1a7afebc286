//! Outbound call placement against a Vonage-style voice API.
//!
//! The service never writes audio itself; replying to a caller means asking
//! the voice API to place an outbound call whose NCCO speaks the reply into
//! the shared conversation. Requests are authenticated with a short-lived
//! RS256 application JWT.

use crate::ncco::NccoAction;
use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use uuid::Uuid;

/// Default REST base URL for the voice API.
pub const DEFAULT_API_URL: &str = "https://api.nexmo.com";

/// Lifetime of a signed application JWT, in seconds.
const TOKEN_TTL_SECS: u64 = 300;

/// Call-control collaborator consumed by the response trigger.
#[async_trait]
pub trait VoiceApi: Send + Sync {
    /// Places an outbound call that executes `ncco`, dialing `number` from
    /// the same number, and asks the API to report call-lifecycle events to
    /// `event_url`.
    async fn place_talk_call(
        &self,
        ncco: &[NccoAction],
        number: &str,
        event_url: &str,
    ) -> Result<()>;
}

/// Application JWT claims accepted by the voice API.
#[derive(Debug, Serialize, Deserialize)]
struct AppClaims {
    application_id: String,
    iat: u64,
    exp: u64,
    jti: String,
}

impl AppClaims {
    fn new(application_id: &str) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            application_id: application_id.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// A phone endpoint in an outbound call request.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct PhoneEndpoint {
    #[serde(rename = "type")]
    kind: String,
    number: String,
}

impl PhoneEndpoint {
    fn new(number: &str) -> Self {
        Self {
            kind: "phone".to_string(),
            number: number.to_string(),
        }
    }
}

/// Request body for the outbound-call endpoint.
#[derive(Debug, Serialize)]
struct OutboundCallRequest<'a> {
    ncco: &'a [NccoAction],
    to: Vec<PhoneEndpoint>,
    from: PhoneEndpoint,
    event_url: Vec<String>,
}

/// Voice API client authenticated with an RS256 application JWT.
pub struct VonageVoiceClient {
    http: reqwest::Client,
    application_id: String,
    signing_key: EncodingKey,
    api_url: String,
}

impl VonageVoiceClient {
    /// Creates a client from the application id and its RSA private key (PEM bytes).
    pub fn new(application_id: String, private_key_pem: &[u8]) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(private_key_pem)
            .context("Voice API private key is not a valid RSA PEM")?;
        Ok(Self {
            http: reqwest::Client::new(),
            application_id,
            signing_key,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Overrides the API base URL (regional endpoints, tests).
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    fn bearer_token(&self) -> Result<String> {
        let claims = AppClaims::new(&self.application_id);
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .context("Failed to sign voice API JWT")
    }
}

#[async_trait]
impl VoiceApi for VonageVoiceClient {
    async fn place_talk_call(
        &self,
        ncco: &[NccoAction],
        number: &str,
        event_url: &str,
    ) -> Result<()> {
        let body = OutboundCallRequest {
            ncco,
            to: vec![PhoneEndpoint::new(number)],
            from: PhoneEndpoint::new(number),
            event_url: vec![event_url.to_string()],
        };

        let response = self
            .http
            .post(format!("{}/v1/calls", self.api_url))
            .bearer_auth(self.bearer_token()?)
            .json(&body)
            .send()
            .await
            .context("Outbound call request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Outbound call rejected: {status}: {detail}");
        }

        let placed: serde_json::Value = response
            .json()
            .await
            .context("Outbound call response was not JSON")?;
        info!(response = %placed, "Outbound call placed");
        Ok(())
    }
}

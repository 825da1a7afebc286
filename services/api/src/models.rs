//! Webhook payload models.
//!
//! These are the JSON bodies the voice API posts to our webhook endpoints,
//! plus the shared error body. The voice API sends more fields than we read;
//! everything unused is simply not modeled.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body of the inbound-call answer webhook.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct AnswerPayload {
    /// Originating identifier: a phone number, or a carrier-substituted
    /// token for calls the platform originates itself.
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub conversation_uuid: Option<String>,
}

/// Body of a call-lifecycle event webhook.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct CallEventPayload {
    #[serde(default)]
    #[schema(example = "completed")]
    pub status: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub conversation_uuid: Option<String>,
}

/// Query parameters carrying the call id our own URLs embed.
#[derive(Deserialize, IntoParams, Debug, Clone)]
pub struct CallQuery {
    /// Call id the guard was registered under.
    pub call: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

//! Axum Handlers for the webhook surface
//!
//! This module contains the logic for the endpoints the voice API calls
//! into: answering an inbound call and receiving call-lifecycle events.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use kaiwa_core::ncco::{Endpoint, NccoAction};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    classify::CallerKind,
    models::{AnswerPayload, CallEventPayload, CallQuery, ErrorResponse},
    state::AppState,
};

/// Content type the voice API streams call audio in.
const CALL_AUDIO_CONTENT_TYPE: &str = "audio/l16;rate=8000";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// The externally reachable host used in websocket and callback URLs:
/// configuration wins, otherwise the request's own `Host` header.
fn public_host(state: &AppState, headers: &HeaderMap) -> Option<String> {
    state.config.public_host.clone().or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

/// Answer an inbound call.
///
/// A human caller gets a greeting, has their call audio connected to the
/// relay websocket, and is placed into the shared conversation. One of our
/// own outbound response calls only joins the conversation, since routing it
/// into the relay would transcribe our own synthesized speech.
#[utoipa::path(
    post,
    path = "/answer",
    request_body = AnswerPayload,
    responses(
        (status = 200, description = "Call-control instruction list for this caller"),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn answer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AnswerPayload>,
) -> Result<Json<Vec<NccoAction>>, ApiError> {
    if state.classifier.classify(&payload.from) == CallerKind::AnswerBot {
        info!(from = %payload.from, "Routing response call into the conversation");
        return Ok(Json(vec![NccoAction::Conversation {
            name: state.conversation_name.clone(),
            end_on_exit: None,
        }]));
    }

    let host = public_host(&state, &headers)
        .ok_or_else(|| ApiError::BadRequest("Host header is required".to_string()))?;
    let call_id = payload
        .conversation_uuid
        .or(payload.uuid)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(from = %payload.from, %call_id, "Answering human caller");

    Ok(Json(vec![
        NccoAction::Talk {
            text: state.config.greeting_text.clone(),
            language: state.config.reply_language.clone(),
            style: None,
            premium: None,
        },
        NccoAction::Connect {
            endpoint: vec![Endpoint::Websocket {
                uri: format!("wss://{host}/ws?call={call_id}"),
                content_type: CALL_AUDIO_CONTENT_TYPE.to_string(),
            }],
        },
        NccoAction::Conversation {
            name: state.conversation_name.clone(),
            end_on_exit: Some(true),
        },
    ]))
}

/// Receive lifecycle events for an outbound response call.
///
/// Only the terminal `completed` status re-enables the relay; everything
/// else is acknowledged and ignored.
#[utoipa::path(
    post,
    path = "/answer-bot/event",
    request_body = CallEventPayload,
    params(CallQuery),
    responses((status = 200, description = "Event accepted"))
)]
pub async fn answer_bot_event(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallQuery>,
    Json(payload): Json<CallEventPayload>,
) -> StatusCode {
    if payload.status.as_deref() == Some("completed") {
        let guard = query
            .call
            .as_deref()
            .and_then(|call_id| state.guards.get(call_id));
        match guard {
            Some(guard) => {
                guard.enable();
                info!(call = ?query.call, "Response playback completed; relay re-enabled");
            }
            None => {
                warn!(call = ?query.call, "Completion event for unknown call");
            }
        }
    }
    StatusCode::OK
}

/// Receive generic call events; acknowledged and otherwise ignored.
#[utoipa::path(
    post,
    path = "/event",
    responses((status = 200, description = "Event accepted"))
)]
pub async fn call_event() -> StatusCode {
    StatusCode::OK
}

//! The relay coordinator: owns one call's audio websocket.
//!
//! Per call, two tasks run: this session loop owning the inbound call-audio
//! socket, and the recognizer task owning the outbound recognition stream.
//! Audio frames flow down over a bounded channel, transcripts flow back up
//! over another; both drop rather than block, so a stalled collaborator can
//! never back-pressure live call audio.

use super::recognizer::{self, RecognizerConfig, RecognizerHandle};
use crate::{guard::RelayGuard, models::CallQuery, respond, state::AppState};
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, header},
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, trace, warn};
use uuid::Uuid;

/// Bound of the transcript channel from the recognizer task.
const TRANSCRIPT_CHANNEL_CAPACITY: usize = 8;

/// Axum handler to upgrade an HTTP connection to the call-audio WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<CallQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    // The answer webhook embeds the call id in the websocket URI; a missing
    // one gets a fresh id so the session still works, it just cannot be
    // matched to a completion notification.
    let call_id = query.call.unwrap_or_else(|| Uuid::new_v4().to_string());
    let event_host = state.config.public_host.clone().or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });
    ws.on_upgrade(move |socket| handle_socket(socket, state, call_id, event_host))
}

/// The per-call session loop.
///
/// State machine: frames arriving before the recognizer reports open are
/// dropped (Connecting); while Relaying each frame is forwarded iff the
/// guard is enabled; socket close tears the recognizer down (Closed).
#[instrument(name = "call_session", skip_all, fields(call_id = %call_id))]
async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    call_id: String,
    event_host: Option<String>,
) {
    info!("Call audio connected");

    let guard = state.guards.register(&call_id);
    let (transcript_tx, mut transcript_rx) = mpsc::channel(TRANSCRIPT_CHANNEL_CAPACITY);
    let recognizer = recognizer::spawn(
        RecognizerConfig::from_config(&state.config),
        transcript_tx,
    );

    loop {
        tokio::select! {
            message = socket.recv() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        // Inbound transport framing is base64 text.
                        match BASE64.decode(text.as_bytes()) {
                            Ok(payload) => relay_frame(&recognizer, &guard, Bytes::from(payload)),
                            Err(e) => warn!(error = %e, "Dropping undecodable audio frame"),
                        }
                    }
                    Some(Ok(Message::Binary(payload))) => {
                        relay_frame(&recognizer, &guard, payload);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Call audio socket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Err(e)) => {
                        error!(error = %e, "Error receiving from call audio socket");
                        break;
                    }
                }
            }
            Some(text) = transcript_rx.recv() => {
                on_transcript(&state, &call_id, &guard, event_host.as_deref(), text);
            }
        }
    }

    recognizer.shutdown();
    state.guards.remove(&call_id);
    info!("Call session closed");
}

/// Forwards one decoded audio frame, subject to the loop guard. Suppressed
/// and not-yet-open frames are dropped, never buffered or reordered.
fn relay_frame(recognizer: &RecognizerHandle, guard: &RelayGuard, payload: Bytes) {
    if !guard.is_enabled() {
        trace!("Dropping audio frame: relay suppressed");
        return;
    }
    recognizer.send_audio(payload);
}

/// Reacts to one recognized utterance: suppresses the relay first, then
/// hands the response work to a detached task so audio handling never waits
/// on collaborator round-trips.
fn on_transcript(
    state: &Arc<AppState>,
    call_id: &str,
    guard: &Arc<RelayGuard>,
    event_host: Option<&str>,
    text: String,
) {
    info!(transcript = %text, "Recognized utterance");
    let token = guard.disable();
    info!("Relay suppressed until response playback completes");

    // A lost completion notification must not mute the call forever: after
    // the fallback window the suppression epoch is re-enabled, unless a
    // newer transcript opened a fresh one in the meantime.
    let resume_after = Duration::from_secs(state.config.relay_resume_secs);
    let fallback_guard = guard.clone();
    tokio::spawn(async move {
        tokio::time::sleep(resume_after).await;
        if fallback_guard.enable_if_current(token) {
            warn!("No completion notification; relay re-enabled by fallback timer");
        }
    });

    let Some(host) = event_host else {
        error!("No public host known; cannot place response call");
        return;
    };
    tokio::spawn(respond::respond(
        state.clone(),
        call_id.to_string(),
        host.to_string(),
        text,
    ));
}

//! The response trigger: turns a recognized utterance into a spoken reply.

use crate::state::AppState;
use anyhow::{Context, Result};
use kaiwa_core::ncco::NccoAction;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Generates a reply for `transcript` and asks the voice API to speak it
/// into the conversation.
///
/// Runs detached from the relay loop. Failures are logged and the cycle is
/// abandoned without retry; re-enabling the relay is solely the completion
/// webhook's (or the fallback timer's) job, which keeps "response attempted"
/// decoupled from "response audio fully played".
#[instrument(skip_all, fields(call_id = %call_id))]
pub async fn respond(state: Arc<AppState>, call_id: String, host: String, transcript: String) {
    if let Err(e) = run(&state, &call_id, &host, &transcript).await {
        error!(error = ?e, "Response cycle abandoned");
    }
}

async fn run(state: &AppState, call_id: &str, host: &str, transcript: &str) -> Result<()> {
    let reply = state
        .responder
        .generate_reply(transcript)
        .await
        .context("Reply generation failed")?;
    info!(reply = %reply, "Generated reply");

    let ncco = vec![NccoAction::Talk {
        text: reply,
        language: state.config.reply_language.clone(),
        style: Some(state.config.reply_style),
        premium: Some(state.config.reply_premium),
    }];
    let event_url = format!("https://{host}/answer-bot/event?call={call_id}");

    state
        .voice
        .place_talk_call(&ncco, &state.config.vonage_number, &event_url)
        .await
        .context("Failed to place response call")
}

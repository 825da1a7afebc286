//! Shared fixtures for in-crate tests.

use crate::classify::NumberMatchClassifier;
use crate::config::Config;
use crate::guard::GuardRegistry;
use crate::state::AppState;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use kaiwa_core::llm_client::ReplyGenerator;
use kaiwa_core::ncco::NccoAction;
use kaiwa_core::voice::VoiceApi;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

pub(crate) fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        public_host: None,
        openai_api_key: "test-openai-key".to_string(),
        chat_model: "gpt-4o-mini".to_string(),
        reply_system_prompt: "Answer briefly.".to_string(),
        greeting_text: "Thank you for calling.".to_string(),
        reply_language: "ja-JP".to_string(),
        reply_style: 3,
        reply_premium: true,
        recognizer_url: "wss://recognizer.invalid/".to_string(),
        recognizer_api_key: "test-recognizer-key".to_string(),
        recognizer_audio_format: "LSB8K".to_string(),
        recognizer_grammar: "-a-general".to_string(),
        recognizer_connect_timeout_secs: 1,
        relay_resume_secs: 45,
        vonage_application_id: "test-app-id".to_string(),
        vonage_private_key_path: "/dev/null".into(),
        vonage_number: "81312345678".to_string(),
        vonage_api_url: None,
        bot_number_prefix: "t".to_string(),
        log_level: Level::INFO,
    }
}

/// Reply generator returning a fixed reply, or failing when `None`.
pub(crate) struct StubResponder(pub Option<String>);

#[async_trait]
impl ReplyGenerator for StubResponder {
    async fn generate_reply(&self, _transcript: &str) -> Result<String> {
        self.0
            .clone()
            .ok_or_else(|| anyhow!("reply generation failed"))
    }
}

/// One recorded outbound call request.
#[derive(Debug)]
pub(crate) struct PlacedCall {
    pub ncco: Vec<NccoAction>,
    pub number: String,
    pub event_url: String,
}

/// Voice API double that records every outbound call request.
pub(crate) struct RecordingVoice {
    calls: mpsc::UnboundedSender<PlacedCall>,
}

impl RecordingVoice {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<PlacedCall>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Self { calls }, rx)
    }
}

#[async_trait]
impl VoiceApi for RecordingVoice {
    async fn place_talk_call(
        &self,
        ncco: &[NccoAction],
        number: &str,
        event_url: &str,
    ) -> Result<()> {
        let _ = self.calls.send(PlacedCall {
            ncco: ncco.to_vec(),
            number: number.to_string(),
            event_url: event_url.to_string(),
        });
        Ok(())
    }
}

pub(crate) fn test_state(
    responder: impl ReplyGenerator + 'static,
    voice: impl VoiceApi + 'static,
) -> Arc<AppState> {
    let config = test_config();
    let classifier = Arc::new(NumberMatchClassifier::from_config(&config));
    Arc::new(AppState {
        config: Arc::new(config),
        responder: Arc::new(responder),
        voice: Arc::new(voice),
        classifier,
        guards: GuardRegistry::new(),
        conversation_name: "kaiwa-test-conversation".to_string(),
    })
}

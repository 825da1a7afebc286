//! The recognizer session: one streaming connection to the speech backend.
//!
//! Each call session spawns one recognizer task. The task connects, sends
//! the authenticated start-of-stream command, then forwards audio frames
//! from a bounded channel and parses inbound events. The owning session
//! talks to it through a [`RecognizerHandle`], which drops frames whenever
//! the session is not open or the channel is full; audio is never queued
//! past the channel bound and never blocks the relay loop.

use super::protocol;
use crate::config::Config;
use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{debug, error, info, warn};

/// Bound of the audio-frame channel into the session task.
const AUDIO_CHANNEL_CAPACITY: usize = 64;

/// Connection parameters for one recognizer session.
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    pub url: String,
    pub api_key: String,
    pub audio_format: String,
    pub grammar: String,
    pub connect_timeout: Duration,
}

impl RecognizerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.recognizer_url.clone(),
            api_key: config.recognizer_api_key.clone(),
            audio_format: config.recognizer_audio_format.clone(),
            grammar: config.recognizer_grammar.clone(),
            connect_timeout: Duration::from_secs(config.recognizer_connect_timeout_secs),
        }
    }
}

/// Handle the relay coordinator holds for the lifetime of its call.
pub struct RecognizerHandle {
    opened: Arc<AtomicBool>,
    audio_tx: mpsc::Sender<Bytes>,
    task: JoinHandle<()>,
}

impl RecognizerHandle {
    /// True once the start-of-stream command has been sent, false again when
    /// the session ends for any reason.
    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    /// Forwards one audio frame. The frame is silently dropped when the
    /// session is not open or the channel is full; no error is surfaced.
    pub fn send_audio(&self, frame: Bytes) {
        if !self.is_open() {
            debug!("Dropping audio frame: recognizer session not open");
            return;
        }
        match self.audio_tx.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Dropping audio frame: recognizer channel full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Dropping audio frame: recognizer session ended");
            }
        }
    }

    /// Tears the session down. Idempotent; safe to call whether or not the
    /// session ever opened.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

/// Spawns the session task for one call. Recognized non-empty transcripts
/// are delivered on `transcript_tx`.
pub fn spawn(config: RecognizerConfig, transcript_tx: mpsc::Sender<String>) -> RecognizerHandle {
    let (audio_tx, audio_rx) = mpsc::channel(AUDIO_CHANNEL_CAPACITY);
    let opened = Arc::new(AtomicBool::new(false));

    let task_opened = opened.clone();
    let task = tokio::spawn(async move {
        // No retry and no reconnect: a failed session dies with its call.
        if let Err(e) = run(config, &task_opened, audio_rx, transcript_tx).await {
            error!(error = ?e, "Recognizer session failed");
        }
        task_opened.store(false, Ordering::SeqCst);
    });

    RecognizerHandle {
        opened,
        audio_tx,
        task,
    }
}

async fn run(
    config: RecognizerConfig,
    opened: &AtomicBool,
    mut audio_rx: mpsc::Receiver<Bytes>,
    transcript_tx: mpsc::Sender<String>,
) -> Result<()> {
    let (ws_stream, _) = timeout(config.connect_timeout, connect_async(config.url.as_str()))
        .await
        .context("Timed out connecting to recognition backend")?
        .context("Failed to connect to recognition backend")?;
    let (mut backend_tx, mut backend_rx) = ws_stream.split();

    // No audio may flow before this command has been sent.
    let start = protocol::start_command(&config.audio_format, &config.grammar, &config.api_key);
    backend_tx
        .send(WsMessage::Text(start.into()))
        .await
        .context("Failed to send start-of-stream command")?;
    opened.store(true, Ordering::SeqCst);
    info!("Connected to recognition backend");

    loop {
        tokio::select! {
            Some(frame) = audio_rx.recv() => {
                backend_tx
                    .send(WsMessage::Binary(protocol::audio_frame(&frame).into()))
                    .await
                    .context("Failed to forward audio frame to recognition backend")?;
            }
            message = backend_rx.next() => {
                match message {
                    Some(Ok(WsMessage::Text(line))) => {
                        handle_backend_line(&line, &transcript_tx);
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("Recognition backend closed the stream");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(e).context("Recognition backend stream error");
                    }
                }
            }
        }
    }
    Ok(())
}

/// Handles one inbound text line from the backend. Only well-formed
/// recognition results with non-empty text reach the relay loop; interim
/// results, other packet types, and malformed lines are dropped here.
fn handle_backend_line(line: &str, transcript_tx: &mpsc::Sender<String>) {
    let Some(result) = protocol::parse_result_line(line) else {
        debug!("Ignoring non-result backend packet");
        return;
    };
    if result.text.is_empty() {
        // Interim/no-result signal; nothing to trigger.
        debug!("Interim recognition result");
    } else if transcript_tx.try_send(result.text).is_err() {
        warn!("Dropping transcript: relay loop not keeping up");
    }
}

#[cfg(test)]
pub(crate) fn handle_for_test(
    opened: bool,
    capacity: usize,
) -> (RecognizerHandle, mpsc::Receiver<Bytes>) {
    let (audio_tx, audio_rx) = mpsc::channel(capacity);
    let handle = RecognizerHandle {
        opened: Arc::new(AtomicBool::new(opened)),
        audio_tx,
        task: tokio::spawn(async {}),
    };
    (handle, audio_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_before_open_are_dropped_not_queued() {
        let (handle, mut rx) = handle_for_test(false, 4);
        handle.send_audio(Bytes::from_static(b"a1"));
        handle.send_audio(Bytes::from_static(b"a2"));

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn frames_after_open_are_forwarded_in_order() {
        let (handle, mut rx) = handle_for_test(true, 4);
        handle.send_audio(Bytes::from_static(b"a1"));
        handle.send_audio(Bytes::from_static(b"a2"));

        assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"a1"));
        assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"a2"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn frames_past_channel_bound_are_dropped() {
        let (handle, mut rx) = handle_for_test(true, 2);
        handle.send_audio(Bytes::from_static(b"a1"));
        handle.send_audio(Bytes::from_static(b"a2"));
        handle.send_audio(Bytes::from_static(b"a3"));

        assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"a1"));
        assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"a2"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_after_session_end_is_silent() {
        let (handle, rx) = handle_for_test(true, 1);
        drop(rx);
        handle.send_audio(Bytes::from_static(b"a1"));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_safe_before_open() {
        let (handle, _rx) = handle_for_test(false, 1);
        handle.shutdown();
        handle.shutdown();
    }

    #[tokio::test]
    async fn backend_result_with_text_reaches_relay_loop() {
        let (tx, mut rx) = mpsc::channel(4);
        handle_backend_line(r#"A {"text":"こんにちは"}"#, &tx);

        assert_eq!(rx.try_recv().unwrap(), "こんにちは");
    }

    #[tokio::test]
    async fn empty_text_results_trigger_nothing() {
        let (tx, mut rx) = mpsc::channel(4);
        handle_backend_line(r#"A {"text":""}"#, &tx);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_lines_trigger_nothing_and_session_continues() {
        let (tx, mut rx) = mpsc::channel(4);
        handle_backend_line("A not-json", &tx);
        handle_backend_line(r#"U {"text":"interim"}"#, &tx);
        handle_backend_line("", &tx);

        assert!(rx.try_recv().is_err());

        // A well-formed line right after is still processed.
        handle_backend_line(r#"A {"text":"hello"}"#, &tx);
        assert_eq!(rx.try_recv().unwrap(), "hello");
    }

    #[tokio::test]
    async fn transcripts_past_channel_bound_are_dropped() {
        let (tx, mut rx) = mpsc::channel(1);
        handle_backend_line(r#"A {"text":"first"}"#, &tx);
        handle_backend_line(r#"A {"text":"second"}"#, &tx);

        assert_eq!(rx.try_recv().unwrap(), "first");
        assert!(rx.try_recv().is_err());
    }
}

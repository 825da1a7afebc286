//! Wire protocol for the streaming speech-recognition backend.
//!
//! Outbound traffic is a text start-of-stream command carrying the audio
//! format, grammar, and API key, followed by binary audio frames with a
//! one-byte packet-type prefix. Inbound traffic is text lines whose first
//! byte names the packet type; only recognition-result packets are parsed,
//! everything else is ignored.

use serde::Deserialize;
use tracing::warn;

/// Packet-type byte prefixed to every outbound audio frame.
pub const AUDIO_PACKET: u8 = b'p';

/// Packet-type byte of an inbound recognition-result line.
pub const RESULT_PACKET: u8 = b'A';

/// Builds the authenticated start-of-stream command.
pub fn start_command(audio_format: &str, grammar: &str, api_key: &str) -> String {
    format!("s {audio_format} {grammar} authorization={api_key}")
}

/// Frames one audio payload for the backend: `[packet-type][payload]`.
pub fn audio_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 1);
    frame.push(AUDIO_PACKET);
    frame.extend_from_slice(payload);
    frame
}

/// JSON body of a recognition-result packet. `text` is empty for interim
/// results.
#[derive(Deserialize, Debug, Default)]
pub struct RecognitionResult {
    #[serde(default)]
    pub text: String,
}

/// Parses one inbound text line.
///
/// Returns `None` for every non-result packet and for malformed result
/// packets. Malformed packets are logged and swallowed: one bad message must
/// never take the session down, and the next well-formed one still parses.
pub fn parse_result_line(line: &str) -> Option<RecognitionResult> {
    if line.as_bytes().first() != Some(&RESULT_PACKET) {
        return None;
    }
    // The JSON body starts after the fixed 2-byte "A " prefix.
    let Some(body) = line.get(2..) else {
        warn!(%line, "Recognition-result line shorter than its prefix");
        return None;
    };
    match serde_json::from_str(body) {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(error = %e, %line, "Failed to parse recognition-result line");
            None
        }
    }
}

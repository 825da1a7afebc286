//! Call-Audio Relay Pipeline
//!
//! This module contains the core logic for relaying live call audio to the
//! speech-recognition backend. It is structured into submodules for clarity:
//!
//! - `protocol`: the recognition backend's wire format (commands, audio
//!   framing, result parsing).
//! - `recognizer`: the task owning the outbound recognition stream.
//! - `session`: the relay coordinator owning one call's audio socket.

pub mod protocol;
pub mod recognizer;
pub mod session;

pub use session::ws_handler;

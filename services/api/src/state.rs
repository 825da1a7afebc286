//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources: configuration, collaborator clients, and the
//! per-call guard registry.

use crate::classify::CallClassifier;
use crate::config::Config;
use crate::guard::GuardRegistry;
use kaiwa_core::{llm_client::ReplyGenerator, voice::VoiceApi};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub responder: Arc<dyn ReplyGenerator>,
    pub voice: Arc<dyn VoiceApi>,
    pub classifier: Arc<dyn CallClassifier>,
    pub guards: GuardRegistry,
    /// Name of the shared conversation both call legs join; generated once
    /// per process.
    pub conversation_name: String,
}

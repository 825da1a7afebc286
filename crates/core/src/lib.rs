//! Kaiwa Core Library
//!
//! Collaborator clients and wire types shared by the Kaiwa services: the
//! response-generation client that turns a caller's transcript into reply
//! text, the voice-API client that speaks that reply back into the call,
//! and the call-control instruction (NCCO) payloads both sides exchange.

pub mod llm_client;
pub mod ncco;
pub mod voice;

//! Kaiwa API Library Crate
//!
//! This library contains all the core logic for the Kaiwa voice-answering
//! service: the application state, webhook handlers, the call-audio relay
//! pipeline, the loop guard, and routing. The `bin/api.rs` binary is a thin
//! wrapper around this library.

pub mod classify;
pub mod config;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod respond;
pub mod router;
pub mod state;
pub mod ws;

#[cfg(test)]
pub(crate) mod test_support;

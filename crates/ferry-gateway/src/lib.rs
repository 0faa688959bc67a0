//! Front door for the ferry dispatcher.
//!
//! Owns CORS, shared-secret auth and the SSE handshake, and relays JSON-RPC
//! POST bodies to the dispatcher. Never talks to the content backend, so the
//! handshake keeps working while the dispatcher restarts.

pub mod app_state;
pub mod cors;
pub mod handlers;
pub mod router;
pub mod upstream;

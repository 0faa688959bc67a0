mod health;
mod mcp;

pub use health::{health, not_found};
pub use mcp::{handshake, liveness, proxy, HELLO_EVENT};

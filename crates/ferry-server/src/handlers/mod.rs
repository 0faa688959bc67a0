mod health;
mod mcp;
mod probes;

pub use health::health;
pub use mcp::{mcp_liveness, mcp_request, mcp_sse};
pub use probes::{fetch_probe, search_probe};

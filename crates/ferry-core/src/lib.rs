pub mod auth;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod traits;
pub mod types;

pub use error::Error;
pub use traits::ContentBackend;
pub use types::{ContentBlock, FileContent, LineRange, SearchResults};

/// MCP protocol revision negotiated by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub mod dispatch;
pub mod jsonrpc;
pub mod tools;
#[cfg(feature = "axum")]
pub mod web;

pub use dispatch::{Dispatcher, ServerInfo};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use tools::{ToolDescriptor, ToolRegistry};

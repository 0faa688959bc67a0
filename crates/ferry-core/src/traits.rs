use async_trait::async_trait;

use crate::error::Error;
use crate::types::{FileContent, LineRange, SearchResults};

/// Client for the external content API.
///
/// Implementations never retry; a failed call is reported once.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Search the backend for files matching `query`, returning at most `max` records.
    async fn search(&self, query: &str, max: u32) -> Result<SearchResults, Error>;

    /// Fetch a single file by id, optionally restricted to a line range.
    async fn fetch(&self, id: &str, lines: Option<&LineRange>) -> Result<FileContent, Error>;
}

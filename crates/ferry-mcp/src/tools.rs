use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ferry_core::traits::ContentBackend;
use ferry_core::types::{ContentBlock, LineRange};
use ferry_core::Error;

/// Result count used when `search` is called without `max`.
pub const DEFAULT_SEARCH_MAX: u32 = 25;

/// Upper bound applied to caller-supplied `max`.
pub const SEARCH_MAX_LIMIT: u32 = 100;

/// Behavioural hints advertised with a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub read_only_hint: bool,
    pub open_world_hint: bool,
}

/// Definition of an MCP tool exposed to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

/// Handler behind one or more tool names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Search,
    Fetch,
}

const READ_ONLY: ToolAnnotations = ToolAnnotations {
    read_only_hint: true,
    open_world_hint: true,
};

fn search_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "q": {
                "type": "string",
                "description": "Search query; empty lists recent files"
            },
            "max": {
                "type": "number",
                "description": "Maximum number of results (default 25, at most 100)"
            }
        },
        "required": []
    })
}

fn fetch_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "description": "File id returned by search"
            },
            "lines": {
                "type": ["number", "string"],
                "description": "Optional line count or range such as \"10-20\""
            }
        },
        "required": ["id"]
    })
}

/// Fixed table of tools, built once at startup.
///
/// `search_files` and `fetch_file` are aliases kept for older clients; they
/// resolve to the same handlers as `search` and `fetch`.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    handlers: HashMap<String, ToolKind>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        let table = [
            (
                "search",
                ToolKind::Search,
                "Search the document store. Returns matching file records as JSON.",
            ),
            (
                "fetch",
                ToolKind::Fetch,
                "Fetch a file by id. Text files are returned inline; other files as JSON metadata.",
            ),
            ("search_files", ToolKind::Search, "Alias of `search`."),
            ("fetch_file", ToolKind::Fetch, "Alias of `fetch`."),
        ];

        let mut descriptors = Vec::with_capacity(table.len());
        let mut handlers = HashMap::with_capacity(table.len());
        for (name, kind, description) in table {
            let input_schema = match kind {
                ToolKind::Search => search_schema(),
                ToolKind::Fetch => fetch_schema(),
            };
            descriptors.push(ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
                annotations: READ_ONLY,
            });
            handlers.insert(name.to_string(), kind);
        }

        Self {
            descriptors,
            handlers,
        }
    }

    /// Tool definitions for `tools/list`, in registration order.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn resolve(&self, name: &str) -> Option<ToolKind> {
        self.handlers.get(name).copied()
    }

    /// Run a tool against the backend.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownTool`] for unregistered names, [`Error::InvalidArguments`]
    /// for malformed arguments, and any backend failure unchanged.
    pub async fn invoke(
        &self,
        backend: &dyn ContentBackend,
        name: &str,
        args: &Value,
    ) -> Result<Vec<ContentBlock>, Error> {
        let kind = self
            .resolve(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        match kind {
            ToolKind::Search => {
                let args = SearchArgs::from_value(args)?;
                let results = backend.search(&args.query, args.max).await?;
                tracing::debug!(tool = name, hits = results.len(), "search finished");
                Ok(vec![ContentBlock::json(Value::Array(results.0))])
            }
            ToolKind::Fetch => {
                let args = FetchArgs::from_value(args)?;
                let file = backend.fetch(&args.id, args.lines.as_ref()).await?;
                Ok(vec![match file.inline_text() {
                    Some(text) => ContentBlock::text(text),
                    None => ContentBlock::json(file.0),
                }])
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated `search` arguments.
#[derive(Debug, PartialEq)]
pub struct SearchArgs {
    pub query: String,
    pub max: u32,
}

impl SearchArgs {
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] if `q` is not a string or `max` is not numeric.
    pub fn from_value(args: &Value) -> Result<Self, Error> {
        let query = match args.get("q") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(q)) => q.clone(),
            Some(_) => return Err(Error::InvalidArguments("'q' must be a string".to_string())),
        };

        let max = match args.get("max") {
            None | Some(Value::Null) => DEFAULT_SEARCH_MAX,
            Some(value) => parse_max(value)
                .ok_or_else(|| Error::InvalidArguments("'max' must be a number".to_string()))?,
        };

        Ok(Self { query, max })
    }
}

fn parse_max(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamped = raw.clamp(1.0, f64::from(SEARCH_MAX_LIMIT)) as u32;
    Some(clamped)
}

/// Validated `fetch` arguments.
#[derive(Debug, PartialEq)]
pub struct FetchArgs {
    pub id: String,
    pub lines: Option<LineRange>,
}

impl FetchArgs {
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] if `id` is missing or `lines` is malformed.
    pub fn from_value(args: &Value) -> Result<Self, Error> {
        let id = match args.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(Error::InvalidArguments(
                    "'id' is required for fetch".to_string(),
                ))
            }
        };

        let lines = match args.get("lines") {
            None | Some(Value::Null) => None,
            Some(value) => Some(LineRange::from_value(value).ok_or_else(|| {
                Error::InvalidArguments("'lines' must be a number or string".to_string())
            })?),
        };

        Ok(Self { id, lines })
    }
}

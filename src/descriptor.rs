// Request descriptors and response envelopes

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

/// Name of the header carrying the bearer credential
pub const AUTHORIZATION: &str = "Authorization";

/// In-memory representation of one outgoing request plus its retry state
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Correlation id attached to log events for this request
    pub id: Uuid,

    /// Origin the request is sent to (scheme + host + port)
    pub origin: String,

    /// Path joined to the origin, must start with '/'
    pub path: String,

    pub method: Method,

    pub headers: HashMap<String, String>,

    /// Extra query pairs appended to the URL
    pub query: Vec<(String, String)>,

    /// JSON body, if any
    pub body: Option<Value>,

    /// Per-request timeout override
    pub timeout: Option<Duration>,

    /// One-shot replay flag
    ///
    /// Set when the request is replayed after a credential refresh. A
    /// descriptor with this flag set never enters the refresh protocol
    /// again.
    pub retried: bool,
}

impl RequestDescriptor {
    /// Create a descriptor for the given origin, method and path
    pub fn new(origin: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        Self {
            id: Uuid::new_v4(),
            origin: origin.into().trim_end_matches('/').to_string(),
            path,
            method,
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            retried: false,
        }
    }

    /// Merge the given headers into the descriptor
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Apply per-request options
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.query.extend(options.query);
        if options.timeout.is_some() {
            self.timeout = options.timeout;
        }
        self
    }

    /// Full request URL
    pub fn url(&self) -> String {
        format!("{}{}", self.origin, self.path)
    }
}

/// Optional per-request settings accepted by the verb helpers
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query pairs appended to the URL
    pub query: Vec<(String, String)>,

    /// Timeout override for this request only
    pub timeout: Option<Duration>,
}

/// Full response envelope
///
/// Returned by raw mode for callers that need response metadata instead of
/// just the classified payload.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub status: u16,

    pub headers: HashMap<String, String>,

    /// Parsed JSON payload; `Null` for an empty body, a JSON string for a
    /// non-JSON body
    pub body: Value,
}

impl Envelope {
    /// Whether the payload carries the embedded success code
    pub fn has_success_code(&self) -> bool {
        matches!(self.body.get("code").and_then(Value::as_str), Some("200"))
    }
}

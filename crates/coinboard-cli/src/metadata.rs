use std::fmt::{Display, Formatter};

use coinboard_core::{Category, UtcDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request identifier (UUID v4) attached to every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Envelope metadata describing how a result was produced.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub generated_at: UtcDateTime,
    pub category: Option<Category>,
    /// `fresh`, `degraded`, `fetching` or `error`.
    pub status: &'static str,
    pub cache_hit: bool,
    pub latency_ms: u64,
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(category: Option<Category>, status: &'static str) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            generated_at: UtcDateTime::now(),
            category,
            status,
            cache_hit: false,
            latency_ms: 0,
            warnings: Vec::new(),
        }
    }
}

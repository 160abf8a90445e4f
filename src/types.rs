use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw key-value selection payload as delivered by the transport layer
/// (query parameters or form fields).
pub type Payload = BTreeMap<String, String>;

/// One captured SQL statement.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct QueryRecord {
    pub id: String,
    pub request_id: String,
    pub query: String,
    /// Milliseconds.
    pub time_taken: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResponseRecord {
    pub id: String,
    pub request_id: String,
    pub status_code: Option<u16>,
}

/// One captured HTTP request with its queries and (optional) response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RequestRecord {
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub view_name: String,
    pub method: String,
    pub start_time: DateTime<Utc>,
    /// Milliseconds.
    pub time_taken: Option<f64>,
    #[serde(default)]
    pub queries: Vec<QueryRecord>,
    pub response: Option<ResponseRecord>,
}

impl RequestRecord {
    pub fn num_queries(&self) -> usize {
        self.queries.len()
    }

    /// Total time spent in SQL. `None` when no query carries a timing, matching
    /// SQL `SUM` over an all-null column.
    pub fn db_time(&self) -> Option<f64> {
        self.queries
            .iter()
            .filter_map(|q| q.time_taken)
            .fold(None, |acc, t| Some(acc.unwrap_or(0.0) + t))
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().and_then(|r| r.status_code)
    }
}

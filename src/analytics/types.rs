use chrono::{DateTime, Utc};
use serde::Serialize;

// ── Timeline ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineResolution {
    Hour,
    Day,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineBucket {
    pub t: DateTime<Utc>,
    pub count: u64,
}

// ── Status / Method ──

/// Response counts per HTTP status class. Always carries all four classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusDistribution {
    #[serde(rename = "2xx")]
    pub success: u64,
    #[serde(rename = "3xx")]
    pub redirect: u64,
    #[serde(rename = "4xx")]
    pub client_error: u64,
    #[serde(rename = "5xx")]
    pub server_error: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodCount {
    pub method: String,
    pub count: u64,
}

// ── Histogram ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: &'static str,
    /// Exclusive upper bound in milliseconds. `None` is unbounded.
    pub upper_bound: Option<f64>,
    pub count: u64,
}

// ── Top views ──

/// The request that best represents one view in a top-N report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewHighlight {
    pub view_name: String,
    pub request_id: String,
    pub path: String,
    pub method: String,
    pub start_time: DateTime<Utc>,
    /// The request's own value for the ranked metric.
    pub value: f64,
}

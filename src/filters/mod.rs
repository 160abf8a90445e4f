//! Typed, serializable request filters.
//!
//! A [`Predicate`] round-trips through a flat JSON object of the form
//! `{"typ": "<discriminator>", "value": ...}` so it can live in persisted
//! selection state. Decoding goes through an explicit registry; an unknown
//! discriminator is an error, never a no-op filter.

pub mod form;
pub mod presets;

use crate::error::{AppError, AppResult};
use crate::types::RequestRecord;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike, Utc};
use serde_json::{Map, Value};

/// Format used by date filters in persisted state and form payloads. Date
/// bounds carry minute precision; finer input is truncated on decode.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Started within the last N seconds.
    Seconds(u64),
    AfterDate(DateTime<Utc>),
    BeforeDate(DateTime<Utc>),
    ViewName(String),
    Path(String),
    Method(String),
    /// At least N queries.
    NumQueries(u64),
    /// At least this many milliseconds in SQL.
    TimeSpentOnQueries(f64),
    /// At least this many milliseconds overall.
    OverallTime(f64),
    StatusCode(u16),
}

type Decoder = fn(&Value) -> AppResult<Predicate>;

const REGISTRY: &[(&str, Decoder)] = &[
    ("SecondsFilter", decode_seconds),
    ("AfterDateFilter", decode_after_date),
    ("BeforeDateFilter", decode_before_date),
    ("ViewNameFilter", decode_view_name),
    ("PathFilter", decode_path),
    ("MethodFilter", decode_method),
    ("NumQueriesFilter", decode_num_queries),
    ("TimeSpentOnQueriesFilter", decode_time_spent_on_queries),
    ("OverallTimeFilter", decode_overall_time),
    ("StatusCodeFilter", decode_status_code),
];

/// Every discriminator [`Predicate::from_dict`] understands.
pub fn known_types() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(typ, _)| *typ)
}

impl Predicate {
    /// Window filter for a named preset such as `"1h"`.
    pub fn from_preset(key: &str) -> AppResult<Self> {
        presets::find_preset(key).map(|p| Predicate::Seconds(p.seconds))
    }

    pub fn typ(&self) -> &'static str {
        match self {
            Predicate::Seconds(_) => "SecondsFilter",
            Predicate::AfterDate(_) => "AfterDateFilter",
            Predicate::BeforeDate(_) => "BeforeDateFilter",
            Predicate::ViewName(_) => "ViewNameFilter",
            Predicate::Path(_) => "PathFilter",
            Predicate::Method(_) => "MethodFilter",
            Predicate::NumQueries(_) => "NumQueriesFilter",
            Predicate::TimeSpentOnQueries(_) => "TimeSpentOnQueriesFilter",
            Predicate::OverallTime(_) => "OverallTimeFilter",
            Predicate::StatusCode(_) => "StatusCodeFilter",
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Predicate::Seconds(n) | Predicate::NumQueries(n) => Value::from(*n),
            Predicate::AfterDate(dt) | Predicate::BeforeDate(dt) => {
                Value::from(dt.format(DATE_FORMAT).to_string())
            }
            Predicate::ViewName(s) | Predicate::Path(s) | Predicate::Method(s) => {
                Value::from(s.as_str())
            }
            Predicate::TimeSpentOnQueries(ms) | Predicate::OverallTime(ms) => Value::from(*ms),
            Predicate::StatusCode(code) => Value::from(*code),
        }
    }

    pub fn as_dict(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("typ".to_string(), Value::from(self.typ()));
        map.insert("value".to_string(), self.value());
        map
    }

    /// Rebuild a predicate from its dictionary form. Extra keys are ignored.
    pub fn from_dict(dict: &Value) -> AppResult<Self> {
        let obj = dict.as_object().ok_or_else(|| {
            AppError::MalformedInput(format!("filter entry is not an object: {dict}"))
        })?;
        let typ = obj
            .get("typ")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::MalformedInput("filter entry has no typ".to_string()))?;
        let value = obj.get("value").unwrap_or(&Value::Null);
        Self::decode(typ, value)
    }

    /// Build a predicate from a discriminator and a raw value.
    pub fn decode(typ: &str, value: &Value) -> AppResult<Self> {
        let (_, decoder) = REGISTRY
            .iter()
            .find(|(name, _)| *name == typ)
            .ok_or_else(|| AppError::UnknownFilterType(typ.to_string()))?;
        decoder(value)
    }

    pub fn matches(&self, r: &RequestRecord, now: DateTime<Utc>) -> bool {
        match self {
            Predicate::Seconds(secs) => {
                // A window reaching past the representable range keeps everything.
                let cutoff = i64::try_from(*secs)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|window| now.checked_sub_signed(window));
                cutoff.map_or(true, |cutoff| r.start_time > cutoff)
            }
            Predicate::AfterDate(dt) => r.start_time > *dt,
            Predicate::BeforeDate(dt) => r.start_time < *dt,
            Predicate::ViewName(v) => r.view_name == *v,
            Predicate::Path(p) => r.path == *p,
            Predicate::Method(m) => r.method == *m,
            Predicate::NumQueries(n) => r.num_queries() as u64 >= *n,
            Predicate::TimeSpentOnQueries(ms) => r.db_time().is_some_and(|t| t >= *ms),
            Predicate::OverallTime(ms) => r.time_taken.is_some_and(|t| t >= *ms),
            Predicate::StatusCode(code) => r.status_code() == Some(*code),
        }
    }

    /// Narrow `records` to those this predicate keeps, preserving order.
    pub fn apply(&self, mut records: Vec<RequestRecord>, now: DateTime<Utc>) -> Vec<RequestRecord> {
        records.retain(|r| self.matches(r, now));
        records
    }
}

/// Apply every predicate in turn. An empty list keeps everything.
pub fn apply_all<'p, I>(predicates: I, records: Vec<RequestRecord>, now: DateTime<Utc>) -> Vec<RequestRecord>
where
    I: IntoIterator<Item = &'p Predicate>,
{
    predicates
        .into_iter()
        .fold(records, |acc, p| p.apply(acc, now))
}

// ── Decoders ──

fn invalid(typ: &str, reason: impl Into<String>) -> AppError {
    AppError::InvalidFilterValue {
        typ: typ.to_string(),
        reason: reason.into(),
    }
}

/// Form payloads carry numbers as strings; persisted state carries them as
/// JSON numbers. Both are accepted. NaN and infinities have no JSON form, so
/// they are rejected.
fn value_as_f64(typ: &str, value: &Value) -> AppResult<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(typ, "number out of range"))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(typ, format!("not a number: {s:?}")))?,
        other => return Err(invalid(typ, format!("expected a number, got {other}"))),
    };
    if !n.is_finite() {
        return Err(invalid(typ, format!("not a finite number: {value}")));
    }
    Ok(n)
}

fn value_as_u64(typ: &str, value: &Value) -> AppResult<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| invalid(typ, format!("expected a non-negative integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid(typ, format!("not a non-negative integer: {s:?}"))),
        other => Err(invalid(typ, format!("expected an integer, got {other}"))),
    }
}

fn value_as_string(typ: &str, value: &Value) -> AppResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(invalid(typ, format!("expected a string, got {other}"))),
    }
}

fn value_as_datetime(typ: &str, value: &Value) -> AppResult<DateTime<Utc>> {
    let s = value_as_string(typ, value)?;
    let s = s.trim();
    let dt = match NaiveDateTime::parse_from_str(s, DATE_FORMAT) {
        Ok(naive) => naive.and_utc(),
        Err(_) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| invalid(typ, format!("expected {DATE_FORMAT:?} or RFC 3339, got {s:?}")))?,
    };
    dt.with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .ok_or_else(|| invalid(typ, format!("unrepresentable date: {s:?}")))
}

fn decode_seconds(v: &Value) -> AppResult<Predicate> {
    value_as_u64("SecondsFilter", v).map(Predicate::Seconds)
}

fn decode_after_date(v: &Value) -> AppResult<Predicate> {
    value_as_datetime("AfterDateFilter", v).map(Predicate::AfterDate)
}

fn decode_before_date(v: &Value) -> AppResult<Predicate> {
    value_as_datetime("BeforeDateFilter", v).map(Predicate::BeforeDate)
}

fn decode_view_name(v: &Value) -> AppResult<Predicate> {
    value_as_string("ViewNameFilter", v).map(Predicate::ViewName)
}

fn decode_path(v: &Value) -> AppResult<Predicate> {
    value_as_string("PathFilter", v).map(Predicate::Path)
}

fn decode_method(v: &Value) -> AppResult<Predicate> {
    value_as_string("MethodFilter", v).map(Predicate::Method)
}

fn decode_num_queries(v: &Value) -> AppResult<Predicate> {
    value_as_u64("NumQueriesFilter", v).map(Predicate::NumQueries)
}

fn decode_time_spent_on_queries(v: &Value) -> AppResult<Predicate> {
    value_as_f64("TimeSpentOnQueriesFilter", v).map(Predicate::TimeSpentOnQueries)
}

fn decode_overall_time(v: &Value) -> AppResult<Predicate> {
    value_as_f64("OverallTimeFilter", v).map(Predicate::OverallTime)
}

fn decode_status_code(v: &Value) -> AppResult<Predicate> {
    let code = value_as_u64("StatusCodeFilter", v)?;
    u16::try_from(code)
        .map(Predicate::StatusCode)
        .map_err(|_| invalid("StatusCodeFilter", format!("status code out of range: {code}")))
}

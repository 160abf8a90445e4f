use crate::types::RequestRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Only an exact `"DESC"` sorts descending; anything else is ascending.
    pub fn from_str_loose(s: &str) -> Self {
        if s == "DESC" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// One `{field, dir}` entry of a persisted sort list. The field is kept as a
/// raw string so stale entries survive until the pipeline skips them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortCriterion {
    pub field: String,
    pub dir: SortDirection,
}

impl SortCriterion {
    pub fn new(field: impl Into<String>, dir: SortDirection) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }
}

pub type SortSpec = Vec<SortCriterion>;

pub fn default_sort_spec() -> SortSpec {
    vec![SortCriterion::new(SortField::StartTime.key(), SortDirection::Desc)]
}

/// Parse a persisted or submitted sort list leniently: entries that are not
/// objects are skipped, a missing field defaults to `start_time` and a missing
/// direction to `DESC`. Returns `None` when the value is not a list at all.
pub fn sort_spec_from_value(value: &Value) -> Option<SortSpec> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_object)
            .map(|item| {
                let field = item
                    .get("field")
                    .and_then(Value::as_str)
                    .unwrap_or(SortField::StartTime.key());
                let dir = item.get("dir").and_then(Value::as_str).unwrap_or("DESC");
                SortCriterion::new(field, SortDirection::from_str_loose(dir))
            })
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    StartTime,
    Path,
    NumQueries,
    TimeTaken,
    DbTime,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::StartTime,
        SortField::Path,
        SortField::NumQueries,
        SortField::TimeTaken,
        SortField::DbTime,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SortField::StartTime => "start_time",
            SortField::Path => "path",
            SortField::NumQueries => "num_sql_queries",
            SortField::TimeTaken => "time_taken",
            SortField::DbTime => "db_time",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortField::StartTime => "Recent",
            SortField::Path => "Path",
            SortField::NumQueries => "Num. Queries",
            SortField::TimeTaken => "Time",
            SortField::DbTime => "DB Time",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Narrowing step a field needs before it can be ordered on. Time fields
    /// only order rows that have a non-negative value; DB time is the summed
    /// query time per request.
    fn prepare(&self, records: &mut Vec<RequestRecord>) {
        match self {
            SortField::TimeTaken => records.retain(|r| r.time_taken.is_some_and(|t| t >= 0.0)),
            SortField::DbTime => records.retain(|r| r.db_time().is_some_and(|t| t >= 0.0)),
            SortField::StartTime | SortField::Path | SortField::NumQueries => {}
        }
    }

    fn compare(&self, a: &RequestRecord, b: &RequestRecord) -> Ordering {
        match self {
            SortField::StartTime => a.start_time.cmp(&b.start_time),
            SortField::Path => a.path.cmp(&b.path),
            SortField::NumQueries => a.num_queries().cmp(&b.num_queries()),
            SortField::TimeTaken => cmp_opt(a.time_taken, b.time_taken),
            SortField::DbTime => cmp_opt(a.db_time(), b.db_time()),
        }
    }
}

fn cmp_opt(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub fn sort_options() -> Vec<SortOption> {
    SortField::ALL
        .iter()
        .map(|f| SortOption {
            value: f.key(),
            label: f.label(),
        })
        .collect()
}

/// Order `records` by every known field in `spec` as one compound key, left
/// entries taking priority. Unknown fields are skipped. An empty (or entirely
/// unknown) spec leaves the input order untouched.
pub fn apply_sort(mut records: Vec<RequestRecord>, spec: &[SortCriterion]) -> Vec<RequestRecord> {
    let mut keys: Vec<(SortField, SortDirection)> = Vec::with_capacity(spec.len());
    for criterion in spec {
        match SortField::from_key(&criterion.field) {
            Some(field) => {
                field.prepare(&mut records);
                keys.push((field, criterion.dir));
            }
            None => {
                tracing::debug!(field = %criterion.field, "skipping unknown sort field");
            }
        }
    }

    if !keys.is_empty() {
        records.sort_by(|a, b| {
            keys.iter().fold(Ordering::Equal, |ord, (field, dir)| {
                ord.then_with(|| dir.apply(field.compare(a, b)))
            })
        });
    }
    records
}

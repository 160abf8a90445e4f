use crate::analytics::distribution::{
    method_distribution, request_timeline, response_time_histogram, status_distribution,
};
use crate::analytics::percentile::PercentileTable;
use crate::analytics::top_views::{
    longest_requests_by_view, most_queries_by_view, most_time_in_db_by_view,
};
use crate::analytics::types::{
    HistogramBucket, MethodCount, StatusDistribution, TimelineBucket, ViewHighlight,
};
use crate::config::AnalyticsConfig;
use crate::error::AppResult;
use crate::filters::form::filters_from_payload;
use crate::filters::presets::{find_preset, preset_for_seconds, TimePreset, TIME_RANGE_PRESETS};
use crate::filters::{self, Predicate};
use crate::selection::{SelectionState, SessionContext};
use crate::types::{Payload, RequestRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// State key under which a one-click time preset is stored.
pub const TIME_PRESET_KEY: &str = "time_preset";

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub num_requests: usize,
    pub has_data: bool,
    pub avg_num_queries: Option<f64>,
    pub avg_time_spent_on_queries: Option<f64>,
    pub avg_overall_time: Option<f64>,
    pub longest_queries_by_view: Vec<ViewHighlight>,
    pub most_time_spent_in_db: Vec<ViewHighlight>,
    pub most_queries: Vec<ViewHighlight>,
    pub request_percentiles: PercentileTable,
    pub sql_percentiles: PercentileTable,
    pub timeline: Vec<TimelineBucket>,
    pub status: StatusDistribution,
    pub methods: Vec<MethodCount>,
    pub rt_hist: Vec<HistogramBucket>,
    pub filters: Map<String, Value>,
    pub active_preset: Option<TimePreset>,
    pub time_presets: &'static [TimePreset],
}

fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Build every summary view over `requests`, which must already be narrowed
/// to the active filters.
pub fn build_summary(
    requests: &[RequestRecord],
    state: &SelectionState,
    config: &AnalyticsConfig,
) -> SummaryReport {
    let request_times: Vec<f64> = requests.iter().filter_map(|r| r.time_taken).collect();
    let sql_times: Vec<f64> = requests
        .iter()
        .flat_map(|r| r.queries.iter())
        .filter_map(|q| q.time_taken)
        .collect();

    let active_preset = state
        .get(TIME_PRESET_KEY)
        .and_then(|d| d.get("value"))
        .and_then(Value::as_u64)
        .and_then(preset_for_seconds)
        .copied();

    SummaryReport {
        num_requests: requests.len(),
        has_data: !requests.is_empty(),
        avg_num_queries: mean(requests.iter().map(|r| r.num_queries() as f64)),
        avg_time_spent_on_queries: mean(requests.iter().filter_map(RequestRecord::db_time)),
        avg_overall_time: mean(request_times.iter().copied()),
        longest_queries_by_view: longest_requests_by_view(requests, config.top_views),
        most_time_spent_in_db: most_time_in_db_by_view(requests, config.top_views),
        most_queries: most_queries_by_view(requests, config.top_views),
        request_percentiles: PercentileTable::from_unsorted(request_times),
        sql_percentiles: PercentileTable::from_unsorted(sql_times),
        timeline: request_timeline(requests),
        status: status_distribution(requests),
        methods: method_distribution(requests),
        rt_hist: response_time_histogram(requests),
        filters: state.as_map().clone(),
        active_preset,
        time_presets: &TIME_RANGE_PRESETS,
    }
}

/// Load the session's summary filters, apply them and build the report.
/// A persisted filter that no longer decodes fails the whole call.
pub fn summarize(
    ctx: &SessionContext<'_>,
    requests: Vec<RequestRecord>,
    now: DateTime<Utc>,
    config: &AnalyticsConfig,
) -> AppResult<SummaryReport> {
    let state = ctx.load()?;
    let predicates = state.predicates()?;
    let filtered = filters::apply_all(predicates.iter().map(|(_, p)| p), requests, now);
    Ok(build_summary(&filtered, &state, config))
}

/// Apply a summary form submission. A known `time_preset` replaces all state
/// with that one window; `clear_filters` empties it; anything else replaces
/// the state with the submitted filters.
pub fn apply_form(ctx: &SessionContext<'_>, payload: &Payload) -> AppResult<SelectionState> {
    if let Some(key) = payload.get(TIME_PRESET_KEY).filter(|k| !k.is_empty()) {
        match find_preset(key) {
            Ok(preset) => {
                let mut state = Map::new();
                state.insert(
                    TIME_PRESET_KEY.to_string(),
                    Value::Object(Predicate::Seconds(preset.seconds).as_dict()),
                );
                return ctx.replace_all(state);
            }
            Err(e) => {
                tracing::warn!(session = %ctx.key(), error = %e, "ignoring time preset");
            }
        }
    }

    if payload.contains_key("clear_filters") {
        return ctx.replace_all(Map::new());
    }

    let state = filters_from_payload(payload)?
        .into_iter()
        .map(|(ident, p)| (ident, Value::Object(p.as_dict())))
        .collect();
    ctx.replace_all(state)
}

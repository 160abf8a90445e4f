use crate::config::DisplayConfig;
use crate::error::AppResult;
use crate::filters::form::{filters_from_payload, is_filter_submit};
use crate::filters::presets::{TimePreset, TIME_RANGE_PRESETS};
use crate::filters::{self, Predicate};
use crate::listing::pagination::{paginate, Page, PageSize};
use crate::listing::sort::{
    apply_sort, default_sort_spec, sort_options, sort_spec_from_value, SortCriterion,
    SortDirection, SortField, SortOption, SortSpec,
};
use crate::selection::{
    SelectionState, SessionContext, ORDER_BY, ORDER_DIR, SHOW, SORT_CRITERIA, VIEW_STYLE,
};
use crate::types::{Payload, RequestRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Display keys a toolbar submission may change.
const TOOLBAR_KEYS: [&str; 4] = [SHOW, ORDER_BY, ORDER_DIR, VIEW_STYLE];

/// Legacy alias for `show` in shared links.
const PER_PAGE_ALIAS: &str = "per_page";

/// Parse a submitted `sort_criteria` JSON list. Malformed input is logged and
/// ignored.
fn submitted_sort_list(payload: &Payload) -> Option<SortSpec> {
    let raw = payload.get(SORT_CRITERIA).filter(|s| !s.trim().is_empty())?;
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => {
            let spec = sort_spec_from_value(&value);
            if spec.is_none() {
                tracing::warn!(sort_criteria = %raw, "ignoring sort_criteria that is not a list");
            }
            spec
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed sort_criteria");
            None
        }
    }
}

/// Normalize one toolbar value for persistence. `show` must be one of the
/// configured options (or `all`); anything else is dropped.
fn toolbar_value(key: &str, raw: &str, display: &DisplayConfig) -> Option<Value> {
    if key != SHOW {
        return Some(Value::from(raw));
    }
    match PageSize::parse(raw) {
        PageSize::Limit(n) if display.is_allowed_per_page(n.get()) => PageSize::Limit(n).to_value(),
        PageSize::Unlimited => PageSize::Unlimited.to_value(),
        _ => {
            tracing::debug!(show = %raw, "ignoring page size outside the allowed options");
            None
        }
    }
}

fn toolbar_updates(payload: &Payload, display: &DisplayConfig) -> Map<String, Value> {
    let mut updates = Map::new();
    for key in TOOLBAR_KEYS {
        if let Some(v) = payload.get(key).and_then(|raw| toolbar_value(key, raw, display)) {
            updates.insert(key.to_string(), v);
        }
    }
    if !payload.contains_key(SHOW) {
        if let Some(v) = payload
            .get(PER_PAGE_ALIAS)
            .and_then(|raw| toolbar_value(SHOW, raw, display))
        {
            updates.insert(SHOW.to_string(), v);
        }
    }
    updates
}

/// Apply query-string parameters from a listing link.
///
/// `sort_criteria` wins over the legacy `order_by`/`order_dir` pair for the
/// sort list; an empty submitted list is ignored here. Display keys are
/// merged over the persisted state.
pub fn apply_query_params(
    ctx: &SessionContext<'_>,
    params: &Payload,
    display: &DisplayConfig,
) -> AppResult<SelectionState> {
    let mut state = ctx.load()?;
    if params.is_empty() {
        return Ok(state);
    }

    if params.get(SORT_CRITERIA).is_some_and(|s| !s.trim().is_empty()) {
        if let Some(spec) = submitted_sort_list(params).filter(|s| !s.is_empty()) {
            state.set_sort_list(&spec);
        }
    } else {
        let order_by = params.get(ORDER_BY).filter(|s| !s.is_empty());
        let order_dir = params.get(ORDER_DIR).filter(|s| !s.is_empty());
        if order_by.is_some() || order_dir.is_some() {
            let field = order_by.map_or(SortField::StartTime.key(), String::as_str);
            let dir = order_dir.map_or(SortDirection::Desc, |d| SortDirection::from_str_loose(d));
            state.set_sort_list(&[SortCriterion::new(field, dir)]);
        }
    }

    state.merge_update(toolbar_updates(params, display));
    ctx.save(&state)?;
    Ok(state)
}

/// Apply a listing form submission: the filter form, the toolbar, or a
/// clear-filters button.
pub fn apply_form(
    ctx: &SessionContext<'_>,
    form: &Payload,
    display: &DisplayConfig,
) -> AppResult<SelectionState> {
    let mut state = ctx.load()?;

    if let Some(spec) = submitted_sort_list(form) {
        if spec.is_empty() {
            state.set_sort_list(&default_sort_spec());
        } else {
            state.set_sort_list(&spec);
        }
    }

    if form.contains_key("clear_filters") {
        // The sort list belongs to the toolbar and outlives a clear.
        let sort = state.remove(SORT_CRITERIA);
        state.clear_filters();
        if let Some(sort) = sort {
            state.insert(SORT_CRITERIA, sort);
        }
    } else if is_filter_submit(form) {
        state.replace_filters(filters_from_payload(form)?);
    } else {
        state.merge_update(toolbar_updates(form, display));
    }

    ctx.save(&state)?;
    Ok(state)
}

/// Effective ordering: the persisted list, else the legacy pair, else the
/// default.
pub fn effective_sort_list(state: &SelectionState) -> SortSpec {
    if let Some(spec) = state.sort_list().filter(|s| !s.is_empty()) {
        return spec;
    }
    match (state.order_by(), state.order_dir()) {
        (None, None) => default_sort_spec(),
        (by, dir) => vec![SortCriterion::new(
            by.unwrap_or(SortField::StartTime.key()),
            dir.map_or(SortDirection::Desc, SortDirection::from_str_loose),
        )],
    }
}

/// One row of the listing.
#[derive(Debug, Clone, Serialize)]
pub struct RequestRow {
    pub id: String,
    pub path: String,
    pub view_name: String,
    pub method: String,
    pub start_time: DateTime<Utc>,
    pub time_taken: Option<f64>,
    pub num_queries: usize,
    pub db_time: Option<f64>,
    pub status_code: Option<u16>,
}

impl From<RequestRecord> for RequestRow {
    fn from(r: RequestRecord) -> Self {
        Self {
            num_queries: r.num_queries(),
            db_time: r.db_time(),
            status_code: r.status_code(),
            id: r.id,
            path: r.path,
            view_name: r.view_name,
            method: r.method,
            start_time: r.start_time,
            time_taken: r.time_taken,
        }
    }
}

/// Distinct values offered by the filter form, each sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub options_paths: Vec<String>,
    pub options_status_codes: Vec<u16>,
    pub options_methods: Vec<String>,
    /// Requests without a resolved view are left out.
    pub view_names: Vec<String>,
}

/// Collect filter choices from the whole batch, before any filter applies.
pub fn filter_options(requests: &[RequestRecord]) -> FilterOptions {
    let mut paths = BTreeSet::new();
    let mut status_codes = BTreeSet::new();
    let mut methods = BTreeSet::new();
    let mut view_names = BTreeSet::new();
    for r in requests {
        paths.insert(r.path.as_str());
        methods.insert(r.method.as_str());
        if !r.view_name.is_empty() {
            view_names.insert(r.view_name.as_str());
        }
        if let Some(code) = r.status_code() {
            status_codes.insert(code);
        }
    }
    FilterOptions {
        options_paths: paths.into_iter().map(str::to_string).collect(),
        options_status_codes: status_codes.into_iter().collect(),
        options_methods: methods.into_iter().map(str::to_string).collect(),
        view_names: view_names.into_iter().map(str::to_string).collect(),
    }
}

#[derive(Debug, Default, Clone)]
pub struct ListingQuery {
    pub page_number: i64,
    /// Ad-hoc path restriction from a link; not persisted.
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestsPage {
    pub page: Page<RequestRow>,
    pub per_page: usize,
    /// The persisted page size, `null` when unlimited, absent when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<Value>,
    pub order_by: String,
    pub order_dir: String,
    pub view_style: String,
    pub sort_list: SortSpec,
    pub filters: Map<String, Value>,
    pub path: Option<String>,
    pub per_page_options: Vec<usize>,
    pub sort_options: Vec<SortOption>,
    pub time_presets: &'static [TimePreset],
    #[serde(flatten)]
    pub filter_options: FilterOptions,
}

/// Rebuild the session's predicates, then filter, sort and paginate
/// `requests`. A persisted predicate that no longer decodes fails the call.
pub fn list_requests(
    ctx: &SessionContext<'_>,
    requests: Vec<RequestRecord>,
    query: &ListingQuery,
    now: DateTime<Utc>,
    display: &DisplayConfig,
) -> AppResult<RequestsPage> {
    let state = ctx.load()?;
    let predicates = state.predicates()?;
    let sort_list = effective_sort_list(&state);
    let filter_options = filter_options(&requests);

    let path_filter = query.path.clone().map(Predicate::Path);
    let filtered = filters::apply_all(
        predicates.iter().map(|(_, p)| p).chain(path_filter.as_ref()),
        requests,
        now,
    );
    let sorted = apply_sort(filtered, &sort_list);

    let per_page = state
        .page_size()
        .per_page(display.default_page_size(), sorted.len());
    let page = paginate(sorted, query.page_number, per_page).map(RequestRow::from);

    let filters = state
        .filter_entries()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(RequestsPage {
        per_page: per_page.get(),
        show: state.page_size().to_value(),
        order_by: state.order_by().unwrap_or(SortField::StartTime.key()).to_string(),
        order_dir: state.order_dir().unwrap_or(SortDirection::Desc.as_str()).to_string(),
        view_style: state
            .view_style()
            .unwrap_or(display.default_view_style.as_str())
            .to_string(),
        sort_list,
        filters,
        path: query.path.clone(),
        per_page_options: display.per_page_options.clone(),
        sort_options: sort_options(),
        time_presets: &TIME_RANGE_PRESETS,
        filter_options,
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::selection::{MemorySelectionStore, REQUEST_FILTERS};
    use crate::types::ResponseRecord;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn request(id: &str, path: &str, minutes_ago: i64, time: f64) -> RequestRecord {
        RequestRecord {
            id: id.to_string(),
            path: path.to_string(),
            view_name: String::new(),
            method: (if id.starts_with('p') { "POST" } else { "GET" }).to_string(),
            start_time: now() - TimeDelta::minutes(minutes_ago),
            time_taken: Some(time),
            queries: vec![],
            response: None,
        }
    }

    fn records(n: usize) -> Vec<RequestRecord> {
        (0..n)
            .map(|i| request(&format!("r{i}"), "/a", i as i64, i as f64))
            .collect()
    }

    fn payload(pairs: &[(&str, &str)]) -> Payload {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn ids(page: &RequestsPage) -> Vec<&str> {
        page.page.items.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_defaults() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();
        let page = list_requests(&ctx, records(30), &ListingQuery::default(), now(), &display).unwrap();

        assert_eq!(page.per_page, 25);
        assert_eq!(page.page.total_pages, 2);
        assert_eq!(page.page.page_number, 1);
        assert_eq!(page.view_style, "row");
        assert_eq!(page.order_by, "start_time");
        assert_eq!(page.order_dir, "DESC");
        assert!(page.show.is_none());
        // Newest first.
        assert_eq!(page.page.items[0].id, "r0");
        assert_eq!(page.sort_list, default_sort_spec());
    }

    #[test]
    fn test_query_params_sort_criteria_and_show() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        let state = apply_query_params(
            &ctx,
            &payload(&[
                ("sort_criteria", r#"[{"field":"time_taken","dir":"ASC"}]"#),
                ("show", "10"),
                ("view_style", "card"),
            ]),
            &display,
        )
        .unwrap();
        assert_eq!(state.get("show"), Some(&json!(10)));
        assert_eq!(state.view_style(), Some("card"));

        let page = list_requests(&ctx, records(30), &ListingQuery { page_number: 2, path: None }, now(), &display).unwrap();
        assert_eq!(page.per_page, 10);
        assert_eq!(page.page.items[0].id, "r10");
        assert_eq!(page.page.total_pages, 3);
    }

    #[test]
    fn test_query_params_legacy_order() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        let state = apply_query_params(&ctx, &payload(&[("order_by", "path"), ("order_dir", "ASC")]), &display).unwrap();
        assert_eq!(state.sort_list().unwrap(), vec![SortCriterion::new("path", SortDirection::Asc)]);
        assert_eq!(state.order_by(), Some("path"));

        // Only a direction: the field defaults.
        let state = apply_query_params(&ctx, &payload(&[("order_dir", "ASC")]), &display).unwrap();
        assert_eq!(state.sort_list().unwrap(), vec![SortCriterion::new("start_time", SortDirection::Asc)]);
    }

    #[test]
    fn test_query_params_malformed_sort_keeps_previous() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        apply_query_params(&ctx, &payload(&[("sort_criteria", r#"[{"field":"path","dir":"ASC"}]"#)]), &display).unwrap();
        let state = apply_query_params(&ctx, &payload(&[("sort_criteria", "{not json")]), &display).unwrap();
        assert_eq!(state.sort_list().unwrap(), vec![SortCriterion::new("path", SortDirection::Asc)]);

        let state = apply_query_params(&ctx, &payload(&[("sort_criteria", "[]")]), &display).unwrap();
        assert_eq!(state.sort_list().unwrap().len(), 1);
    }

    #[test]
    fn test_per_page_alias_and_disallowed_show() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        let state = apply_query_params(&ctx, &payload(&[("per_page", "50")]), &display).unwrap();
        assert_eq!(state.get("show"), Some(&json!(50)));

        let state = apply_query_params(&ctx, &payload(&[("show", "33"), ("per_page", "10")]), &display).unwrap();
        assert_eq!(state.get("show"), Some(&json!(50)));

        let state = apply_query_params(&ctx, &payload(&[("show", "all")]), &display).unwrap();
        assert_eq!(state.page_size(), PageSize::Unlimited);
        let page = list_requests(&ctx, records(120), &ListingQuery::default(), now(), &display).unwrap();
        assert_eq!(page.per_page, 120);
        assert_eq!(page.page.total_pages, 1);
        assert_eq!(page.show, Some(Value::Null));
    }

    #[test]
    fn test_form_filter_submit_keeps_display_keys() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        apply_query_params(&ctx, &payload(&[("show", "10"), ("order_by", "path")]), &display).unwrap();
        let state = apply_form(
            &ctx,
            &payload(&[("filter-m-typ", "MethodFilter"), ("filter-m-value", "POST")]),
            &display,
        )
        .unwrap();
        assert_eq!(state.get("show"), Some(&json!(10)));
        assert_eq!(state.order_by(), Some("path"));
        assert_eq!(state.predicates().unwrap(), vec![("m".to_string(), Predicate::Method("POST".into()))]);

        let mut recs = records(3);
        recs.push(request("p1", "/b", 1, 5.0));
        let page = list_requests(&ctx, recs, &ListingQuery::default(), now(), &display).unwrap();
        assert_eq!(ids(&page), vec!["p1"]);
        assert_eq!(page.filters.len(), 1);
    }

    #[test]
    fn test_form_filter_submit_replaces_previous_filters() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        apply_form(&ctx, &payload(&[("filter-a-typ", "PathFilter"), ("filter-a-value", "/a")]), &display).unwrap();
        let state = apply_form(&ctx, &payload(&[("filter-b-typ", "MethodFilter"), ("filter-b-value", "GET")]), &display).unwrap();
        let idents: Vec<String> = state.predicates().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(idents, vec!["b".to_string()]);
    }

    #[test]
    fn test_form_clear_keeps_show_view_style_and_sort() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        apply_query_params(
            &ctx,
            &payload(&[
                ("show", "50"),
                ("view_style", "card"),
                ("order_dir", "ASC"),
                ("sort_criteria", r#"[{"field":"path","dir":"ASC"}]"#),
            ]),
            &display,
        )
        .unwrap();
        apply_form(&ctx, &payload(&[("filter-a-typ", "PathFilter"), ("filter-a-value", "/a")]), &display).unwrap();

        let state = apply_form(&ctx, &payload(&[("clear_filters", "1")]), &display).unwrap();
        assert_eq!(state.get("show"), Some(&json!(50)));
        assert_eq!(state.view_style(), Some("card"));
        assert!(state.order_dir().is_none());
        assert!(state.predicates().unwrap().is_empty());
        assert_eq!(state.sort_list().unwrap(), vec![SortCriterion::new("path", SortDirection::Asc)]);
    }

    #[test]
    fn test_form_empty_sort_resets_default() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        apply_form(&ctx, &payload(&[("sort_criteria", r#"[{"field":"path","dir":"ASC"}]"#)]), &display).unwrap();
        let state = apply_form(&ctx, &payload(&[("sort_criteria", "[]")]), &display).unwrap();
        assert_eq!(state.sort_list().unwrap(), default_sort_spec());
    }

    #[test]
    fn test_form_toolbar_merges() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();

        apply_form(&ctx, &payload(&[("filter-a-typ", "PathFilter"), ("filter-a-value", "/a")]), &display).unwrap();
        let state = apply_form(&ctx, &payload(&[("show", "100"), ("view_style", "card")]), &display).unwrap();
        assert_eq!(state.get("show"), Some(&json!(100)));
        assert_eq!(state.predicates().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_filter_type_in_form_surfaces() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let err = apply_form(
            &ctx,
            &payload(&[("filter-x-typ", "GoneFilter"), ("filter-x-value", "1")]),
            &DisplayConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::UnknownFilterType(_)));
        assert!(ctx.load().unwrap().is_empty());
    }

    #[test]
    fn test_stale_sort_field_is_skipped() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();
        apply_query_params(
            &ctx,
            &payload(&[("sort_criteria", r#"[{"field":"profile_time","dir":"ASC"},{"field":"time_taken","dir":"DESC"}]"#)]),
            &display,
        )
        .unwrap();
        let page = list_requests(&ctx, records(3), &ListingQuery::default(), now(), &display).unwrap();
        assert_eq!(ids(&page), vec!["r2", "r1", "r0"]);
    }

    #[test]
    fn test_path_restriction_and_page_clamp() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let mut recs = records(3);
        recs.push(request("x", "/b", 10, 1.0));
        let page = list_requests(
            &ctx,
            recs,
            &ListingQuery { page_number: 99, path: Some("/b".to_string()) },
            now(),
            &DisplayConfig::default(),
        )
        .unwrap();
        assert_eq!(ids(&page), vec!["x"]);
        assert_eq!(page.page.page_number, 1);
    }

    #[test]
    fn test_stray_state_key_does_not_fail_listing() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let mut state = SelectionState::new();
        state.insert("show", json!(25));
        state.insert("page", json!(2));
        ctx.save(&state).unwrap();

        let page = list_requests(&ctx, records(3), &ListingQuery::default(), now(), &DisplayConfig::default())
            .unwrap();
        assert_eq!(page.page.total_count, 3);
        assert_eq!(page.per_page, 25);
    }

    #[test]
    fn test_non_finite_form_value_is_rejected() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();
        let err = apply_form(
            &ctx,
            &payload(&[("filter-a-typ", "OverallTimeFilter"), ("filter-a-value", "NaN")]),
            &display,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidFilterValue { .. }));
        assert!(ctx.load().unwrap().is_empty());
        assert!(list_requests(&ctx, records(2), &ListingQuery::default(), now(), &display).is_ok());
    }

    #[test]
    fn test_filter_options_are_distinct_and_sorted() {
        let mut a = request("a", "/z", 1, 1.0);
        a.view_name = "shop.views.cart".to_string();
        a.response = Some(ResponseRecord {
            id: "a-resp".to_string(),
            request_id: "a".to_string(),
            status_code: Some(404),
        });
        let mut b = request("p1", "/a", 2, 1.0);
        b.view_name = "shop.views.buy".to_string();
        b.response = Some(ResponseRecord {
            id: "b-resp".to_string(),
            request_id: "p1".to_string(),
            status_code: Some(200),
        });
        let mut c = request("c", "/z", 3, 1.0);
        c.view_name = "shop.views.cart".to_string();
        let d = request("d", "/m", 4, 1.0);

        let opts = filter_options(&[a, b, c, d]);
        assert_eq!(opts.options_paths, vec!["/a", "/m", "/z"]);
        assert_eq!(opts.options_status_codes, vec![200, 404]);
        assert_eq!(opts.options_methods, vec!["GET", "POST"]);
        assert_eq!(opts.view_names, vec!["shop.views.buy", "shop.views.cart"]);
    }

    #[test]
    fn test_filter_options_ignore_active_filters() {
        let store = MemorySelectionStore::new();
        let ctx = SessionContext::new(&store, REQUEST_FILTERS, "s");
        let display = DisplayConfig::default();
        let mut recs = records(2);
        recs.push(request("x", "/b", 10, 1.0));
        apply_form(
            &ctx,
            &payload(&[("filter-p-typ", "PathFilter"), ("filter-p-value", "/b")]),
            &display,
        )
        .unwrap();

        let page = list_requests(&ctx, recs, &ListingQuery::default(), now(), &display).unwrap();
        assert_eq!(ids(&page), vec!["x"]);
        assert_eq!(page.filter_options.options_paths, vec!["/a", "/b"]);

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["options_paths"], json!(["/a", "/b"]));
        assert_eq!(value["page"]["page_number"], json!(1));
    }
}

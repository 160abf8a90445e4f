//! Top-N-by-view reports: slowest request, most DB time and most queries.
//!
//! Each report groups requests by `view_name`, aggregates a per-request metric
//! within each group, keeps the highest-ranked groups, then picks one
//! representative request per surviving group. Ties are broken explicitly so
//! the output is deterministic: groups by view name, representatives by
//! lowest request id.

use crate::analytics::types::ViewHighlight;
use crate::types::RequestRecord;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const DEFAULT_TOP_VIEWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAggregate {
    Max,
    Sum,
}

/// Rank views by `aggregate(metric)` and return one representative request
/// for each of the top `limit` views, highest metric first.
///
/// Views where no request has a value for the metric are excluded before
/// ranking.
pub fn top_by_view<F>(
    requests: &[RequestRecord],
    limit: usize,
    aggregate: GroupAggregate,
    metric: F,
) -> Vec<ViewHighlight>
where
    F: Fn(&RequestRecord) -> Option<f64>,
{
    let mut groups: BTreeMap<&str, Vec<(&RequestRecord, f64)>> = BTreeMap::new();
    for r in requests {
        if let Some(v) = metric(r) {
            groups.entry(r.view_name.as_str()).or_default().push((r, v));
        }
    }

    let mut ranked: Vec<(f64, &Vec<(&RequestRecord, f64)>)> = groups
        .values()
        .map(|members| {
            let values = members.iter().map(|(_, v)| *v);
            let agg = match aggregate {
                GroupAggregate::Max => values.fold(f64::NEG_INFINITY, f64::max),
                GroupAggregate::Sum => values.sum::<f64>(),
            };
            (agg, members)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.truncate(limit);

    let mut highlights: Vec<ViewHighlight> = ranked
        .into_iter()
        .filter_map(|(_, members)| representative(members))
        .map(|(r, value)| ViewHighlight {
            view_name: r.view_name.clone(),
            request_id: r.id.clone(),
            path: r.path.clone(),
            method: r.method.clone(),
            start_time: r.start_time,
            value,
        })
        .collect();
    highlights.sort_by(|a, b| b.value.total_cmp(&a.value));
    highlights
}

/// Highest own value wins; equal values go to the lowest request id.
fn representative<'a>(members: &[(&'a RequestRecord, f64)]) -> Option<(&'a RequestRecord, f64)> {
    members
        .iter()
        .copied()
        .max_by(|(ra, va), (rb, vb)| match va.total_cmp(vb) {
            Ordering::Equal => rb.id.cmp(&ra.id),
            other => other,
        })
}

/// Slowest request per view, ranked by the view's maximum `time_taken`.
pub fn longest_requests_by_view(requests: &[RequestRecord], limit: usize) -> Vec<ViewHighlight> {
    top_by_view(requests, limit, GroupAggregate::Max, |r| r.time_taken)
}

/// Views spending the most total time in SQL, each represented by its
/// request with the most DB time.
pub fn most_time_in_db_by_view(requests: &[RequestRecord], limit: usize) -> Vec<ViewHighlight> {
    top_by_view(requests, limit, GroupAggregate::Sum, |r| {
        r.db_time().filter(|t| *t >= 0.0)
    })
}

/// Views issuing the most queries in total, each represented by its request
/// with the most queries.
pub fn most_queries_by_view(requests: &[RequestRecord], limit: usize) -> Vec<ViewHighlight> {
    top_by_view(requests, limit, GroupAggregate::Sum, |r| {
        Some(r.num_queries() as f64)
    })
}

//! Distribution views over a filtered request set: activity timeline, status
//! classes, methods and the response-time histogram.

use crate::analytics::types::{
    HistogramBucket, MethodCount, StatusDistribution, TimelineBucket, TimelineResolution,
};
use crate::types::RequestRecord;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};

/// Spans up to this many hours are bucketed hourly, longer spans daily.
pub const HOURLY_SPAN_LIMIT_HOURS: i64 = 72;

const HISTOGRAM_BOUNDS: [(&str, Option<f64>); 6] = [
    ("<50ms", Some(50.0)),
    ("50-100ms", Some(100.0)),
    ("100-200ms", Some(200.0)),
    ("200-500ms", Some(500.0)),
    ("500ms-1s", Some(1000.0)),
    (">1s", None),
];

/// Pick the bucket width for requests spanning `min..=max`.
pub fn timeline_resolution(min: DateTime<Utc>, max: DateTime<Utc>) -> TimelineResolution {
    if max - min > TimeDelta::hours(HOURLY_SPAN_LIMIT_HOURS) {
        TimelineResolution::Day
    } else {
        TimelineResolution::Hour
    }
}

/// Request counts per hour (or per day for wide spans), ordered by bucket.
pub fn request_timeline(requests: &[RequestRecord]) -> Vec<TimelineBucket> {
    let Some(min) = requests.iter().map(|r| r.start_time).min() else {
        return Vec::new();
    };
    let max = requests.iter().map(|r| r.start_time).max().unwrap_or(min);

    let width = match timeline_resolution(min, max) {
        TimelineResolution::Hour => TimeDelta::hours(1),
        TimelineResolution::Day => TimeDelta::days(1),
    };

    let mut buckets: BTreeMap<DateTime<Utc>, u64> = BTreeMap::new();
    for r in requests {
        let t = r.start_time.duration_trunc(width).unwrap_or(r.start_time);
        *buckets.entry(t).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(t, count)| TimelineBucket { t, count })
        .collect()
}

/// Count responses by status class. Null statuses and codes below 200 are
/// skipped.
pub fn status_distribution(requests: &[RequestRecord]) -> StatusDistribution {
    let mut dist = StatusDistribution::default();
    for code in requests.iter().filter_map(RequestRecord::status_code) {
        match code {
            200..=299 => dist.success += 1,
            300..=399 => dist.redirect += 1,
            400..=499 => dist.client_error += 1,
            500..=u16::MAX => dist.server_error += 1,
            _ => {}
        }
    }
    dist
}

/// Request counts per method, most frequent first. Equal counts are ordered
/// by method name.
pub fn method_distribution(requests: &[RequestRecord]) -> Vec<MethodCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for r in requests {
        *counts.entry(r.method.as_str()).or_insert(0) += 1;
    }
    let mut out: Vec<MethodCount> = counts
        .into_iter()
        .map(|(method, count)| MethodCount {
            method: method.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.method.cmp(&b.method)));
    out
}

/// Bucket non-negative samples into the fixed latency ranges. Each sample
/// lands in the first bucket whose bound it is strictly below.
pub fn histogram<I>(samples: I) -> Vec<HistogramBucket>
where
    I: IntoIterator<Item = f64>,
{
    let mut buckets: Vec<HistogramBucket> = HISTOGRAM_BOUNDS
        .iter()
        .map(|&(label, upper_bound)| HistogramBucket {
            label,
            upper_bound,
            count: 0,
        })
        .collect();

    for t in samples.into_iter().filter(|t| *t >= 0.0) {
        if let Some(b) = buckets
            .iter_mut()
            .find(|b| b.upper_bound.map_or(true, |bound| t < bound))
        {
            b.count += 1;
        }
    }
    buckets
}

/// Histogram of request `time_taken`.
pub fn response_time_histogram(requests: &[RequestRecord]) -> Vec<HistogramBucket> {
    histogram(requests.iter().filter_map(|r| r.time_taken))
}

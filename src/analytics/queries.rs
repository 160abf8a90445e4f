use crate::analytics::n_plus_one::{detect_n_plus_one, NPlusOneResult};
use crate::analytics::percentile::PercentileTable;
use crate::fingerprint::{fingerprint_key, fingerprint_query};
use crate::types::{QueryRecord, RequestRecord};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AnalyzedQuery<'a> {
    #[serde(flatten)]
    pub query: &'a QueryRecord,
    pub fingerprint: String,
    pub key: String,
    pub flagged: bool,
}

/// The SQL captured for one request, with N+1 groups marked.
#[derive(Debug, Serialize)]
pub struct QueryAnalysis<'a> {
    pub request_id: &'a str,
    pub path: &'a str,
    pub num_queries: usize,
    pub db_time: Option<f64>,
    pub percentiles: PercentileTable,
    pub queries: Vec<AnalyzedQuery<'a>>,
    pub n_plus_one: NPlusOneResult<'a>,
}

pub fn analyze_request(request: &RequestRecord, threshold: usize) -> QueryAnalysis<'_> {
    let n_plus_one = detect_n_plus_one(&request.queries, threshold);

    let queries = request
        .queries
        .iter()
        .map(|q| {
            let fingerprint = fingerprint_query(&q.query);
            AnalyzedQuery {
                key: fingerprint_key(&fingerprint),
                fingerprint,
                flagged: n_plus_one.is_flagged(&q.id),
                query: q,
            }
        })
        .collect();

    QueryAnalysis {
        request_id: &request.id,
        path: &request.path,
        num_queries: request.num_queries(),
        db_time: request.db_time(),
        percentiles: PercentileTable::from_unsorted(
            request.queries.iter().filter_map(|q| q.time_taken).collect(),
        ),
        queries,
        n_plus_one,
    }
}

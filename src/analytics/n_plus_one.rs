use crate::fingerprint::{fingerprint_key, fingerprint_query};
use crate::types::QueryRecord;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_THRESHOLD: usize = 3;

/// Queries sharing one fingerprint, in first-seen order.
#[derive(Debug, Serialize)]
pub struct NPlusOneGroup<'a> {
    pub fingerprint: String,
    pub key: String,
    pub count: usize,
    pub representative: &'a QueryRecord,
    pub queries: Vec<&'a QueryRecord>,
}

#[derive(Debug, Serialize)]
pub struct NPlusOneResult<'a> {
    /// Flagged groups, largest first.
    pub groups: Vec<NPlusOneGroup<'a>>,
    pub flagged_query_ids: BTreeSet<String>,
    pub has_n_plus_one: bool,
}

impl NPlusOneResult<'_> {
    pub fn is_flagged(&self, query_id: &str) -> bool {
        self.flagged_query_ids.contains(query_id)
    }
}

/// Group queries by fingerprint and keep the groups with at least `threshold`
/// members. Groups are ordered by count descending; ties keep the order in
/// which their fingerprint was first encountered.
pub fn detect_n_plus_one<'a, I>(queries: I, threshold: usize) -> NPlusOneResult<'a>
where
    I: IntoIterator<Item = &'a QueryRecord>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<&'a QueryRecord>)> = Vec::new();

    for q in queries {
        let fp = fingerprint_query(&q.query);
        match index.get(&fp) {
            Some(&i) => buckets[i].1.push(q),
            None => {
                index.insert(fp.clone(), buckets.len());
                buckets.push((fp, vec![q]));
            }
        }
    }

    let mut groups: Vec<NPlusOneGroup<'a>> = buckets
        .into_iter()
        .filter(|(_, qs)| qs.len() >= threshold)
        .map(|(fingerprint, queries)| NPlusOneGroup {
            key: fingerprint_key(&fingerprint),
            count: queries.len(),
            representative: queries[0],
            fingerprint,
            queries,
        })
        .collect();
    // sort_by is stable, which gives the encounter-order tie-break
    groups.sort_by(|a, b| b.count.cmp(&a.count));

    let flagged_query_ids = groups
        .iter()
        .flat_map(|g| g.queries.iter().map(|q| q.id.clone()))
        .collect();

    NPlusOneResult {
        has_n_plus_one: !groups.is_empty(),
        groups,
        flagged_query_ids,
    }
}

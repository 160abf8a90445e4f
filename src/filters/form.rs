use crate::error::AppResult;
use crate::filters::Predicate;
use crate::types::Payload;
use serde_json::Value;
use std::collections::BTreeMap;

const FIELD_PREFIX: &str = "filter-";

/// True when the payload carries any `filter-*` field, i.e. it came from the
/// filter form rather than the toolbar.
pub fn is_filter_submit(payload: &Payload) -> bool {
    payload.keys().any(|k| k.starts_with(FIELD_PREFIX))
}

/// Decode `filter-<ident>-typ` / `filter-<ident>-value` pairs into predicates
/// keyed by identifier.
///
/// Entries with a blank value are skipped (an untouched form row). Entries
/// missing their `typ` are malformed and skipped with a warning. An unknown
/// `typ` or an undecodable value fails the whole decode.
pub fn filters_from_payload(payload: &Payload) -> AppResult<BTreeMap<String, Predicate>> {
    let mut raw: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();
    for (key, value) in payload {
        let Some(rest) = key.strip_prefix(FIELD_PREFIX) else {
            continue;
        };
        let Some((ident, field)) = rest.rsplit_once('-') else {
            tracing::warn!(key = %key, "ignoring filter field without identifier");
            continue;
        };
        raw.entry(ident).or_default().insert(field, value.as_str());
    }

    let mut filters = BTreeMap::new();
    for (ident, fields) in raw {
        let value = fields.get("value").copied().unwrap_or("");
        if value.trim().is_empty() {
            continue;
        }
        let Some(typ) = fields.get("typ").copied() else {
            tracing::warn!(ident = %ident, "ignoring filter without typ");
            continue;
        };
        let predicate = Predicate::decode(typ, &Value::from(value))?;
        filters.insert(ident.to_string(), predicate);
    }
    Ok(filters)
}

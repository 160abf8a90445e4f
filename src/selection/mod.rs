//! Persisted per-session selection state.
//!
//! A [`SelectionState`] is a flat JSON object: filter identifiers map to
//! predicate dictionaries, and a handful of reserved keys carry display
//! options. Stores persist it opaquely; predicates are only decoded when a
//! caller asks for them. Entries that are not filter dictionaries at all are
//! skipped; filters that no longer decode surface as errors at that point.

pub mod memory;
pub mod sqlite;

use crate::error::{AppError, AppResult};
use crate::filters::Predicate;
use crate::listing::pagination::PageSize;
use crate::listing::sort::{sort_spec_from_value, SortCriterion, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use memory::MemorySelectionStore;
pub use sqlite::SqliteSelectionStore;

pub const SHOW: &str = "show";
pub const ORDER_BY: &str = "order_by";
pub const ORDER_DIR: &str = "order_dir";
pub const VIEW_STYLE: &str = "view_style";
pub const SORT_CRITERIA: &str = "sort_criteria";

/// Reserved keys that hold display options rather than predicates.
pub const DISPLAY_KEYS: [&str; 5] = [SHOW, ORDER_BY, ORDER_DIR, VIEW_STYLE, SORT_CRITERIA];

/// Keys that survive a clear-filters.
const RETAINED_ON_CLEAR: [&str; 2] = [SHOW, VIEW_STYLE];

/// Store namespace for the request-listing screen.
pub const REQUEST_FILTERS: &str = "request_filters";
/// Store namespace for the summary screen.
pub const SUMMARY_FILTERS: &str = "summary_filters";

pub fn is_display_key(key: &str) -> bool {
    DISPLAY_KEYS.contains(&key)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState(Map<String, Value>);

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn page_size(&self) -> PageSize {
        PageSize::from_value(self.0.get(SHOW))
    }

    pub fn order_by(&self) -> Option<&str> {
        self.0.get(ORDER_BY).and_then(Value::as_str)
    }

    pub fn order_dir(&self) -> Option<&str> {
        self.0.get(ORDER_DIR).and_then(Value::as_str)
    }

    pub fn view_style(&self) -> Option<&str> {
        self.0.get(VIEW_STYLE).and_then(Value::as_str)
    }

    /// Persisted sort list, or `None` when absent or not a list.
    pub fn sort_list(&self) -> Option<SortSpec> {
        self.0.get(SORT_CRITERIA).and_then(sort_spec_from_value)
    }

    pub fn set_sort_list(&mut self, spec: &[SortCriterion]) {
        let items = spec
            .iter()
            .filter_map(|c| serde_json::to_value(c).ok())
            .collect();
        self.0.insert(SORT_CRITERIA.to_string(), Value::Array(items));
    }

    /// Entries that are not display options, in key order.
    pub fn filter_entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(k, _)| !is_display_key(k))
    }

    /// Decode every filter entry. Stray keys that are not filter
    /// dictionaries are logged and skipped. The first filter that fails to
    /// rebuild fails the whole call.
    pub fn predicates(&self) -> AppResult<Vec<(String, Predicate)>> {
        let mut out = Vec::new();
        for (ident, dict) in self.filter_entries() {
            match Predicate::from_dict(dict) {
                Ok(p) => out.push((ident.clone(), p)),
                Err(AppError::MalformedInput(reason)) => {
                    tracing::warn!(key = %ident, %reason, "skipping malformed selection entry");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Drop everything, then set `updates`.
    pub fn replace_all(&mut self, updates: Map<String, Value>) {
        self.0 = updates;
    }

    /// Overlay `updates`, leaving untouched keys in place.
    pub fn merge_update(&mut self, updates: Map<String, Value>) {
        self.0.extend(updates);
    }

    /// Keep only the page size and view style.
    pub fn clear_filters(&mut self) {
        self.0.retain(|k, _| RETAINED_ON_CLEAR.contains(&k.as_str()));
    }

    /// Keep display options, replace every filter entry with `filters`.
    pub fn replace_filters<I>(&mut self, filters: I)
    where
        I: IntoIterator<Item = (String, Predicate)>,
    {
        self.0.retain(|k, _| is_display_key(k));
        for (ident, predicate) in filters {
            self.0.insert(ident, Value::Object(predicate.as_dict()));
        }
    }
}

/// Key-value persistence for selection state. `get` never fails for a
/// missing key; it returns an empty state. `save` is a full replace, last
/// writer wins.
pub trait SelectionStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<SelectionState>;
    fn save(&self, key: &str, state: &SelectionState) -> AppResult<()>;
}

/// One session's view of a store under one namespace. Every entry point that
/// reads or mutates selection state takes one of these.
pub struct SessionContext<'s> {
    store: &'s dyn SelectionStore,
    key: String,
}

impl<'s> SessionContext<'s> {
    pub fn new(store: &'s dyn SelectionStore, namespace: &str, session: &str) -> Self {
        Self {
            store,
            key: format!("{namespace}:{session}"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&self) -> AppResult<SelectionState> {
        self.store.get(&self.key)
    }

    pub fn save(&self, state: &SelectionState) -> AppResult<()> {
        self.store.save(&self.key, state)
    }

    pub fn replace_all(&self, updates: Map<String, Value>) -> AppResult<SelectionState> {
        let state = SelectionState::from_map(updates);
        self.save(&state)?;
        Ok(state)
    }

    pub fn merge_update(&self, updates: Map<String, Value>) -> AppResult<SelectionState> {
        self.modify(|state| state.merge_update(updates))
    }

    pub fn clear_filters(&self) -> AppResult<SelectionState> {
        self.modify(SelectionState::clear_filters)
    }

    pub fn replace_filters<I>(&self, filters: I) -> AppResult<SelectionState>
    where
        I: IntoIterator<Item = (String, Predicate)>,
    {
        self.modify(|state| state.replace_filters(filters))
    }

    fn modify<F>(&self, f: F) -> AppResult<SelectionState>
    where
        F: FnOnce(&mut SelectionState),
    {
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)?;
        Ok(state)
    }
}

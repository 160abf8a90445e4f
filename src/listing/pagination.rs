use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroUsize;

/// Page size as selected by the caller.
///
/// `UseDefault` means nothing was chosen, `Limit` an explicit size and
/// `Unlimited` an explicit request for everything on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    UseDefault,
    Limit(NonZeroUsize),
    Unlimited,
}

impl PageSize {
    /// Read a persisted `show` entry. Absent or unusable values fall back to
    /// the default; `null` and `"all"` mean unlimited.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None => PageSize::UseDefault,
            Some(Value::Null) => PageSize::Unlimited,
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .and_then(NonZeroUsize::new)
                .map_or(PageSize::UseDefault, PageSize::Limit),
            Some(Value::String(s)) => Self::parse(s),
            Some(_) => PageSize::UseDefault,
        }
    }

    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return PageSize::Unlimited;
        }
        s.parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(PageSize::UseDefault, PageSize::Limit)
    }

    /// The value to persist under `show`, or `None` to leave it unset.
    pub fn to_value(self) -> Option<Value> {
        match self {
            PageSize::UseDefault => None,
            PageSize::Limit(n) => Some(Value::from(n.get())),
            PageSize::Unlimited => Some(Value::Null),
        }
    }

    /// Effective page size for a collection of `total` items.
    pub fn per_page(self, default: NonZeroUsize, total: usize) -> NonZeroUsize {
        match self {
            PageSize::UseDefault => default,
            PageSize::Limit(n) => n,
            PageSize::Unlimited => NonZeroUsize::new(total).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            total_pages: self.total_pages,
            total_count: self.total_count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next.then_some(self.page_number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_prev.then_some(self.page_number - 1)
    }

    /// 1-based index of the first item on this page, 0 when empty.
    pub fn start_index(&self) -> usize {
        if self.total_count == 0 {
            0
        } else {
            (self.page_number - 1) * self.per_page + 1
        }
    }
}

/// Slice `items` into the requested page. Out-of-range page numbers clamp to
/// the first or last page. An empty collection still has one (empty) page.
pub fn paginate<T>(items: Vec<T>, page_number: i64, per_page: NonZeroUsize) -> Page<T> {
    let total_count = items.len();
    let per_page = per_page.get();
    let total_pages = total_count.div_ceil(per_page).max(1);

    let page_number = usize::try_from(page_number)
        .unwrap_or(1)
        .clamp(1, total_pages);

    let items: Vec<T> = items
        .into_iter()
        .skip((page_number - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page_number,
        total_pages,
        total_count,
        per_page,
        has_next: page_number < total_pages,
        has_prev: page_number > 1,
    }
}

/// Parse a page number from a query string, defaulting to the first page.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}

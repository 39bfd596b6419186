//! Derived projections of the collection: filtering, sorting, paging.
//!
//! Everything here is a pure function over borrowed records; stored state is
//! never reordered or mutated.

use std::cmp::Ordering;

use shared::domain::{FieldKey, FieldValue, SensorRecord};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: FieldKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: impl Into<FieldKey>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Header-click semantics: the same key flips direction, a new key starts ascending.
    pub fn toggle(current: Option<&SortSpec>, key: FieldKey) -> Self {
        match current {
            Some(spec) if spec.key == key => Self {
                key,
                direction: spec.direction.flipped(),
            },
            _ => Self {
                key,
                direction: SortDirection::Ascending,
            },
        }
    }
}

/// Parameters of the visible page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub sort: Option<SortSpec>,
    pub page_size: usize,
    pub page: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: None,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub items: Vec<&'a SensorRecord>,
    /// 1-based page actually shown, after clamping.
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    /// Rows matching the search, across all pages.
    pub total: usize,
}

/// Orders freshly listed records by numeric id. Ids that are not numbers go
/// last and keep the order the store returned them in.
pub fn order_by_identifier(mut records: Vec<SensorRecord>) -> Vec<SensorRecord> {
    records.sort_by(|a, b| match (a.id.numeric(), b.id.numeric()) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    records
}

/// Case-insensitive substring match over every value of the row.
pub fn matches_search(record: &SensorRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    record
        .values()
        .filter(|value| !value.is_null())
        .any(|value| value.to_string().to_lowercase().contains(&needle))
}

pub fn filter_records<'a>(records: &'a [SensorRecord], search: &str) -> Vec<&'a SensorRecord> {
    records
        .iter()
        .filter(|record| matches_search(record, search))
        .collect()
}

fn type_rank(value: &FieldValue<'_>) -> u8 {
    match value {
        FieldValue::Bool(_) => 0,
        FieldValue::Number(_) => 1,
        FieldValue::Text(_) => 2,
        FieldValue::Null => 3,
    }
}

/// Natural ordering of two values. Nulls are placed last regardless of `direction`.
pub fn compare_values(
    left: &FieldValue<'_>,
    right: &FieldValue<'_>,
    direction: SortDirection,
) -> Ordering {
    let natural = match (left, right) {
        (FieldValue::Null, FieldValue::Null) => return Ordering::Equal,
        (FieldValue::Null, _) => return Ordering::Greater,
        (_, FieldValue::Null) => return Ordering::Less,
        (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
        (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
        (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
        (a, b) => type_rank(a).cmp(&type_rank(b)),
    };
    match direction {
        SortDirection::Ascending => natural,
        SortDirection::Descending => natural.reverse(),
    }
}

/// Stable sort: rows with equal keys keep their relative order.
pub fn sort_records(records: &mut [&SensorRecord], spec: &SortSpec) {
    records.sort_by(|a, b| {
        compare_values(&a.value(&spec.key), &b.value(&spec.key), spec.direction)
    });
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Slices out one page. Out-of-range page numbers are clamped into `[1, page_count]`.
pub fn paginate<'a>(records: Vec<&'a SensorRecord>, page_size: usize, page: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let total = records.len();
    let page_count = page_count(total, page_size);
    let page = page.clamp(1, page_count.max(1));
    let items = records
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    Page {
        items,
        page,
        page_count,
        page_size,
        total,
    }
}

/// Filter, then sort, then paginate.
pub fn project<'a>(records: &'a [SensorRecord], query: &ViewQuery) -> Page<'a> {
    let mut visible = filter_records(records, &query.search);
    if let Some(spec) = &query.sort {
        sort_records(&mut visible, spec);
    }
    paginate(visible, query.page_size, query.page)
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;

use std::cmp::Reverse;

use serde::Serialize;

use super::domain::{ApplyId, ApplyRecord, ApplyStatus, UnknownStatus};
use super::repository::ApplyView;

pub const ROWS_PER_PAGE_OPTIONS: [usize; 3] = [5, 10, 25];
pub const DEFAULT_ROWS_PER_PAGE: usize = 5;

/// Status selector for the agent dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplyStatus),
}

impl StatusFilter {
    /// `None`, empty, and `all` select everything.
    pub fn parse(raw: Option<&str>) -> Result<Self, UnknownStatus> {
        match raw.map(str::trim) {
            None | Some("") => Ok(StatusFilter::All),
            Some(value) if value.eq_ignore_ascii_case("all") => Ok(StatusFilter::All),
            Some(value) => value.parse().map(StatusFilter::Only),
        }
    }

    pub fn matches(self, status: ApplyStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => expected == status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Result<Self, PageSizeError> {
        if !ROWS_PER_PAGE_OPTIONS.contains(&per_page) {
            return Err(PageSizeError(per_page));
        }
        Ok(Self { page, per_page })
    }

    fn offset(self) -> usize {
        self.page.saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rows per page must be one of 5, 10 or 25 (got {0})")]
pub struct PageSizeError(pub usize);

/// One page of dashboard rows plus the filtered total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyPage {
    pub items: Vec<ApplyView>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

/// Filter, order (most recently updated first), and slice a company's applies.
pub fn paginate<F>(
    mut records: Vec<ApplyRecord>,
    filter: StatusFilter,
    request: PageRequest,
    in_flight: F,
) -> ApplyPage
where
    F: Fn(ApplyId) -> bool,
{
    records.retain(|record| filter.matches(record.apply.status));
    records.sort_by_key(|record| (Reverse(record.apply.updated_at), record.apply.id));

    let total = records.len();
    let items = records
        .iter()
        .skip(request.offset())
        .take(request.per_page)
        .map(|record| record.view(in_flight(record.apply.id)))
        .collect();

    ApplyPage {
        items,
        total,
        page: request.page,
        per_page: request.per_page,
    }
}

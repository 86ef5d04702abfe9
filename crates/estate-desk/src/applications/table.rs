use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::JobApplicationRow;

pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Position,
    Status,
    #[default]
    AppliedAt,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Some(Self::Name),
            "position" => Some(Self::Position),
            "status" => Some(Self::Status),
            "applied_at" | "applied" | "date" => Some(Self::AppliedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Search, filter, sort, and pagination over the rows currently loaded in the
/// admin table. Nothing here is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn first_page() -> usize {
    1
}

fn default_page_size() -> usize {
    10
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            sort: SortKey::default(),
            direction: SortDirection::default(),
            page: first_page(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePage {
    pub rows: Vec<JobApplicationRow>,
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("page numbers start at 1")]
    InvalidPage,
    #[error("page size must be between 1 and 100, got {0}")]
    InvalidPageSize(usize),
}

impl TableQuery {
    /// Rows matching search and status filter, sorted. Sorting is stable, so
    /// ties keep the backend's order.
    pub fn matching(&self, rows: &[JobApplicationRow]) -> Vec<JobApplicationRow> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty() && !status.eq_ignore_ascii_case("all"));

        let mut matched: Vec<JobApplicationRow> = rows
            .iter()
            .filter(|row| match &needle {
                Some(needle) => [&row.name, &row.email, &row.position]
                    .iter()
                    .any(|field| field.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .filter(|row| match status {
                Some(status) => row.status.trim().eq_ignore_ascii_case(status),
                None => true,
            })
            .cloned()
            .collect();

        matched.sort_by(|left, right| {
            let ordering = compare_rows(self.sort, left, right);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        matched
    }

    pub fn apply(&self, rows: &[JobApplicationRow]) -> Result<TablePage, TableError> {
        if self.page == 0 {
            return Err(TableError::InvalidPage);
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(TableError::InvalidPageSize(self.page_size));
        }

        let matched = self.matching(rows);
        let total = matched.len();
        let page_count = total.div_ceil(self.page_size).max(1);
        let page = self.page.min(page_count);

        let rows = matched
            .into_iter()
            .skip((page - 1) * self.page_size)
            .take(self.page_size)
            .collect();

        Ok(TablePage {
            rows,
            total,
            page,
            page_count,
            page_size: self.page_size,
        })
    }
}

fn compare_rows(key: SortKey, left: &JobApplicationRow, right: &JobApplicationRow) -> Ordering {
    match key {
        SortKey::Name => compare_text(&left.name, &right.name),
        SortKey::Position => compare_text(&left.position, &right.position),
        SortKey::Status => compare_text(&left.status, &right.status),
        SortKey::AppliedAt => left.applied_at.cmp(&right.applied_at),
    }
}

fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase().cmp(&right.to_lowercase())
}

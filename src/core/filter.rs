use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{Category, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Created,
    Deadline,
    Priority,
    Title,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::Created,
            direction: SortDirection::Desc,
        }
    }
}

/// Window over task creation times. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if at > end {
                return false;
            }
        }
        true
    }
}

/// The active filter specification. The default keeps every task visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub categories: Vec<Category>,
    pub priorities: Vec<Priority>,
    pub search_query: String,
    pub sort: SortSpec,
    pub show_completed: bool,
    pub date_range: Option<DateRange>,
    pub tags: Vec<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            priorities: Priority::ALL.to_vec(),
            search_query: String::new(),
            sort: SortSpec::default(),
            show_completed: true,
            date_range: None,
            tags: Vec::new(),
        }
    }
}

impl FilterState {
    /// True when any clause could drop a task.
    pub fn has_active_filters(&self) -> bool {
        !self.search_query.is_empty()
            || !self.show_completed
            || self.date_range.is_some()
            || !self.tags.is_empty()
            || self.categories.len() < Category::ALL.len()
            || self.priorities.len() < Priority::ALL.len()
    }
}

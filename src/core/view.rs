use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::filter::{FilterState, SortDirection, SortField};
use super::reality::RealityMode;
use super::task::{Category, Priority, Task};
use crate::effects;

/// Aggregates over the full (unfiltered) task set, as seen from one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    /// Incomplete tasks whose current-mode deadline has passed.
    pub overdue: usize,
    /// Incomplete tasks due within the next 24 hours.
    pub due_soon: usize,
    /// Rounded percentage, 0 when there are no tasks.
    pub completion_rate: u32,
    pub by_category: HashMap<Category, usize>,
    pub by_priority: HashMap<Priority, usize>,
    /// Sum of current-mode adjusted points over completed tasks.
    pub total_points: i64,
}

/// Filtered, ordered projection of the store plus aggregates.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub tasks: Vec<Task>,
    pub stats: TaskStats,
}

pub fn build_view(
    tasks: &[Task],
    filter: &FilterState,
    mode: RealityMode,
    now: DateTime<Utc>,
) -> TaskView {
    TaskView {
        tasks: filter_and_sort(tasks, filter, mode),
        stats: compute_stats(tasks, mode, now),
    }
}

/// Apply every active filter clause, then the selected sort. The sort is
/// stable, so ties keep the collection order.
pub fn filter_and_sort(tasks: &[Task], filter: &FilterState, mode: RealityMode) -> Vec<Task> {
    let mut kept: Vec<&Task> = tasks
        .iter()
        .filter(|task| matches_filter(task, filter, mode))
        .collect();

    let profile = &mode.config().effects;
    kept.sort_by(|a, b| {
        let ordering = match filter.sort.field {
            SortField::Created => a.created_at.cmp(&b.created_at),
            SortField::Deadline => {
                // Deadlines compare as timestamps, never as strings.
                a.variant(mode).deadline.cmp(&b.variant(mode).deadline)
            }
            SortField::Priority => a.priority.weight().cmp(&b.priority.weight()),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Points => effects::adjusted_points(profile, a.variant(mode).points)
                .cmp(&effects::adjusted_points(profile, b.variant(mode).points)),
        };
        match filter.sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    kept.into_iter().cloned().collect()
}

fn matches_filter(task: &Task, filter: &FilterState, mode: RealityMode) -> bool {
    if !filter.show_completed && task.completed {
        return false;
    }
    if !filter.categories.contains(&task.category) {
        return false;
    }
    if !filter.priorities.contains(&task.priority) {
        return false;
    }
    if !filter.search_query.is_empty() {
        let query = filter.search_query.to_lowercase();
        let haystack = format!(
            "{} {} {} {}",
            task.title,
            task.variant(mode).description,
            task.category.as_str(),
            task.tags.join(" "),
        )
        .to_lowercase();
        if !haystack.contains(&query) {
            return false;
        }
    }
    if !filter.tags.is_empty() && !filter.tags.iter().any(|tag| task.has_tag(tag)) {
        return false;
    }
    if let Some(range) = &filter.date_range {
        if !range.contains(task.created_at) {
            return false;
        }
    }
    true
}

pub fn compute_stats(tasks: &[Task], mode: RealityMode, now: DateTime<Utc>) -> TaskStats {
    let profile = &mode.config().effects;
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.completed).count();

    let overdue = tasks
        .iter()
        .filter(|t| !t.completed && t.variant(mode).deadline < now)
        .count();

    let due_soon = tasks
        .iter()
        .filter(|t| {
            if t.completed {
                return false;
            }
            let seconds_until = (t.variant(mode).deadline - now).num_seconds();
            seconds_until > 0 && seconds_until <= 24 * 3600
        })
        .count();

    let mut by_category: HashMap<Category, usize> = HashMap::new();
    for category in Category::ALL {
        by_category.insert(category, tasks.iter().filter(|t| t.category == category).count());
    }

    let mut by_priority: HashMap<Priority, usize> = HashMap::new();
    for priority in Priority::ALL {
        by_priority.insert(priority, tasks.iter().filter(|t| t.priority == priority).count());
    }

    let total_points = tasks
        .iter()
        .filter(|t| t.completed)
        .map(|t| effects::adjusted_points(profile, t.variant(mode).points))
        .sum();

    let completion_rate = if total > 0 {
        (completed as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };

    TaskStats {
        total,
        completed,
        incomplete: total - completed,
        overdue,
        due_soon,
        completion_rate,
        by_category,
        by_priority,
        total_points,
    }
}

use chrono::{Duration, NaiveDate};

use super::reality::RealityMode;
use super::task::Task;
use super::view::TaskStats;

pub const POINTS_PER_LEVEL: i64 = 50;

/// One unlockable achievement and its predicate.
pub struct Achievement {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    condition: fn(&TaskStats, &[Task], NaiveDate) -> bool,
}

impl Achievement {
    pub fn unlocked_by(&self, stats: &TaskStats, tasks: &[Task], today: NaiveDate) -> bool {
        (self.condition)(stats, tasks, today)
    }
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        key: "first-task",
        name: "First Steps",
        description: "Complete your first task",
        condition: |stats, _, _| stats.completed >= 1,
    },
    Achievement {
        key: "task-master",
        name: "Task Master",
        description: "Complete 10 tasks",
        condition: |stats, _, _| stats.completed >= 10,
    },
    Achievement {
        key: "reality-explorer",
        name: "Reality Explorer",
        description: "Complete tasks in all three realities",
        condition: |_, tasks, _| {
            let mut seen = [false; 3];
            for task in tasks.iter().filter(|t| t.completed) {
                // Tasks completed before mode tracking count as realistic.
                let mode = task.completed_in_reality.unwrap_or(RealityMode::Realistic);
                match mode {
                    RealityMode::Optimistic => seen[0] = true,
                    RealityMode::Realistic => seen[1] = true,
                    RealityMode::Disaster => seen[2] = true,
                }
            }
            seen.iter().all(|s| *s)
        },
    },
    Achievement {
        key: "point-collector",
        name: "Point Collector",
        description: "Earn 100 points",
        condition: |stats, _, _| stats.total_points >= 100,
    },
    Achievement {
        key: "speed-demon",
        name: "Speed Demon",
        description: "Complete 5 tasks in one day",
        condition: |_, tasks, today| completed_on(tasks, today) >= 5,
    },
    Achievement {
        key: "disaster-survivor",
        name: "Disaster Survivor",
        description: "Complete 5 tasks in Disaster mode",
        condition: |_, tasks, _| completed_in(tasks, RealityMode::Disaster) >= 5,
    },
    Achievement {
        key: "optimistic-achiever",
        name: "Optimistic Achiever",
        description: "Complete 5 tasks in Optimistic mode",
        condition: |_, tasks, _| completed_in(tasks, RealityMode::Optimistic) >= 5,
    },
    Achievement {
        key: "perfect-day",
        name: "Perfect Day",
        description: "Complete all active tasks",
        condition: |stats, _, _| stats.incomplete == 0 && stats.completed > 0,
    },
];

pub fn unlocked(stats: &TaskStats, tasks: &[Task], today: NaiveDate) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| a.unlocked_by(stats, tasks, today))
        .collect()
}

fn completed_on(tasks: &[Task], date: NaiveDate) -> usize {
    tasks
        .iter()
        .filter(|t| {
            t.completed
                && t.completed_at
                    .is_some_and(|at| at.date_naive() == date)
        })
        .count()
}

fn completed_in(tasks: &[Task], mode: RealityMode) -> usize {
    tasks
        .iter()
        .filter(|t| t.completed && t.completed_in_reality == Some(mode))
        .count()
}

/// Level derived from lifetime points: one level per 50 points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: i64,
    pub points_to_next: i64,
    pub progress_percent: u32,
}

pub fn level_info(total_points: i64) -> LevelInfo {
    let points = total_points.max(0);
    let level = points / POINTS_PER_LEVEL + 1;
    LevelInfo {
        level,
        points_to_next: level * POINTS_PER_LEVEL - points,
        progress_percent: ((points % POINTS_PER_LEVEL) * 100 / POINTS_PER_LEVEL) as u32,
    }
}

/// Consecutive days ending today (or yesterday, if today has no completion
/// yet) with at least one completed task. Looks back at most 30 days.
pub fn completion_streak(tasks: &[Task], today: NaiveDate) -> u32 {
    let mut streak = 0;
    for back in 0..30 {
        let date = today - Duration::days(back);
        if completed_on(tasks, date) > 0 {
            streak += 1;
        } else if back > 0 {
            break;
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::FilterState;
    use crate::core::task::TaskDraft;
    use crate::core::view::compute_stats;
    use chrono::{DateTime, TimeZone, Utc};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn completed_task(mode: RealityMode, at: DateTime<Utc>) -> Task {
        let mut task = TaskDraft::new("Done", at).into_task(at);
        task.completed = true;
        task.completed_at = Some(at);
        task.completed_in_reality = Some(mode);
        task
    }

    #[test]
    fn first_task_unlocks_on_one_completion() {
        let now = fixed_now();
        let tasks = vec![completed_task(RealityMode::Realistic, now)];
        let stats = compute_stats(&tasks, RealityMode::Realistic, now);
        let unlocked = unlocked(&stats, &tasks, now.date_naive());
        assert!(unlocked.iter().any(|a| a.key == "first-task"));
        assert!(!unlocked.iter().any(|a| a.key == "task-master"));
    }

    #[test]
    fn reality_explorer_needs_all_three_modes() {
        let now = fixed_now();
        let mut tasks = vec![
            completed_task(RealityMode::Realistic, now),
            completed_task(RealityMode::Optimistic, now),
        ];
        let stats = compute_stats(&tasks, RealityMode::Realistic, now);
        assert!(!unlocked(&stats, &tasks, now.date_naive())
            .iter()
            .any(|a| a.key == "reality-explorer"));

        tasks.push(completed_task(RealityMode::Disaster, now));
        let stats = compute_stats(&tasks, RealityMode::Realistic, now);
        assert!(unlocked(&stats, &tasks, now.date_naive())
            .iter()
            .any(|a| a.key == "reality-explorer"));
    }

    #[test]
    fn level_advances_every_fifty_points() {
        assert_eq!(level_info(0).level, 1);
        assert_eq!(level_info(49).level, 1);
        assert_eq!(level_info(50).level, 2);
        assert_eq!(level_info(49).points_to_next, 1);
        assert_eq!(level_info(25).progress_percent, 50);
    }

    #[test]
    fn streak_allows_an_incomplete_today() {
        let now = fixed_now();
        let yesterday = now - Duration::days(1);
        let two_back = now - Duration::days(2);
        let tasks = vec![
            completed_task(RealityMode::Realistic, yesterday),
            completed_task(RealityMode::Realistic, two_back),
        ];
        assert_eq!(completion_streak(&tasks, now.date_naive()), 2);
    }

    #[test]
    fn streak_breaks_on_a_gap() {
        let now = fixed_now();
        let tasks = vec![
            completed_task(RealityMode::Realistic, now),
            completed_task(RealityMode::Realistic, now - Duration::days(3)),
        ];
        assert_eq!(completion_streak(&tasks, now.date_naive()), 1);
    }

    #[test]
    fn stats_plumbing_matches_the_view_defaults() {
        let now = fixed_now();
        let tasks = vec![completed_task(RealityMode::Realistic, now)];
        let stats = compute_stats(&tasks, RealityMode::Realistic, now);
        assert!(!FilterState::default().has_active_filters());
        assert_eq!(stats.completed, 1);
    }
}

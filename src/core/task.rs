use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reality::RealityMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Health,
    Learning,
    Finance,
    Creative,
    Social,
    Emergency,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Self::Work,
        Self::Personal,
        Self::Health,
        Self::Learning,
        Self::Finance,
        Self::Creative,
        Self::Social,
        Self::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Health => "health",
            Self::Learning => "learning",
            Self::Finance => "finance",
            Self::Creative => "creative",
            Self::Social => "social",
            Self::Emergency => "emergency",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "work" => Some(Self::Work),
            "personal" => Some(Self::Personal),
            "health" => Some(Self::Health),
            "learning" => Some(Self::Learning),
            "finance" => Some(Self::Finance),
            "creative" => Some(Self::Creative),
            "social" => Some(Self::Social),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Health => "Health",
            Self::Learning => "Learning",
            Self::Finance => "Finance",
            Self::Creative => "Creative",
            Self::Social => "Social",
            Self::Emergency => "Emergency",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Numeric weight used for sorting (1 through 4).
    pub fn weight(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Per-mode description, deadline, difficulty and point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealityVariant {
    #[serde(default)]
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub difficulty: u8,
    pub points: u32,
}

impl RealityVariant {
    pub fn new(deadline: DateTime<Utc>, difficulty: u8, points: u32) -> Self {
        Self {
            description: String::new(),
            deadline,
            difficulty,
            points,
        }
    }
}

/// Independently toggleable child item. Contributes no points of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub difficulty: u8,
}

impl Subtask {
    pub fn new(title: impl Into<String>, difficulty: u8, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            created_at: now,
            completed_at: None,
            difficulty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// The mode that was active when the task completed.
    #[serde(default)]
    pub completed_in_reality: Option<RealityMode>,
    /// Tasks that must be completed before this one may complete.
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    pub optimistic: RealityVariant,
    pub realistic: RealityVariant,
    pub disaster: RealityVariant,
}

impl Task {
    pub fn variant(&self, mode: RealityMode) -> &RealityVariant {
        match mode {
            RealityMode::Optimistic => &self.optimistic,
            RealityMode::Realistic => &self.realistic,
            RealityMode::Disaster => &self.disaster,
        }
    }

    pub fn variant_mut(&mut self, mode: RealityMode) -> &mut RealityVariant {
        match mode {
            RealityMode::Optimistic => &mut self.optimistic,
            RealityMode::Realistic => &mut self.realistic,
            RealityMode::Disaster => &mut self.disaster,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Creation payload for a new task. The store assigns the id and the
/// creation timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub category: Category,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub dependencies: Vec<Uuid>,
    pub subtasks: Vec<Subtask>,
    pub optimistic: RealityVariant,
    pub realistic: RealityVariant,
    pub disaster: RealityVariant,
}

impl TaskDraft {
    /// Draft with the stock per-mode defaults, all three deadlines set to
    /// `deadline`.
    pub fn new(title: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            category: Category::Personal,
            priority: Priority::Medium,
            tags: Vec::new(),
            dependencies: Vec::new(),
            subtasks: Vec::new(),
            optimistic: RealityVariant::new(deadline, 1, 10),
            realistic: RealityVariant::new(deadline, 5, 5),
            disaster: RealityVariant::new(deadline, 8, 2),
        }
    }

    pub(crate) fn into_task(self, now: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: self.title,
            category: self.category,
            priority: self.priority,
            tags: normalize_tags(&self.tags),
            completed: false,
            created_at: now,
            completed_at: None,
            completed_in_reality: None,
            dependencies: dedup_ids(self.dependencies),
            subtasks: self.subtasks,
            optimistic: self.optimistic,
            realistic: self.realistic,
            disaster: self.disaster,
        }
    }
}

/// Lowercase, trim and dedup tags, keeping insertion order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

pub(crate) fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_weights_are_ordered() {
        assert_eq!(Priority::Low.weight(), 1);
        assert_eq!(Priority::Urgent.weight(), 4);
        assert!(Priority::High.weight() > Priority::Medium.weight());
    }

    #[test]
    fn category_string_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
    }

    #[test]
    fn draft_defaults_match_the_stock_form() {
        let deadline = Utc::now();
        let draft = TaskDraft::new("Write report", deadline);
        assert_eq!(draft.optimistic.difficulty, 1);
        assert_eq!(draft.optimistic.points, 10);
        assert_eq!(draft.realistic.difficulty, 5);
        assert_eq!(draft.realistic.points, 5);
        assert_eq!(draft.disaster.difficulty, 8);
        assert_eq!(draft.disaster.points, 2);
    }

    #[test]
    fn normalize_tags_lowercases_and_dedups() {
        let tags = vec![
            "Urgent".to_string(),
            " urgent ".to_string(),
            "Home".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["urgent", "home"]);
    }

    #[test]
    fn task_serializes_with_camel_case_keys() {
        let draft = TaskDraft::new("Ship it", Utc::now());
        let task = draft.into_task(Utc::now());
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"completedInReality\""));
        assert!(json.contains("\"category\":\"personal\""));
    }
}

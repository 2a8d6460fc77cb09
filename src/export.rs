use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::reality::RealityMode;
use crate::core::task::Task;
use crate::effects;
use crate::error::{Error, Result};

pub const EXPORT_VERSION: &str = "1.0";

const CSV_HEADER: &str = "Title,Category,Priority,Status,Created At,Optimistic Points,\
Realistic Points,Disaster Points,Current Reality,Adjusted Points";

/// Full-fidelity export: every reality variant of every task plus summary
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub current_reality: RealityMode,
    pub tasks: Vec<Task>,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub categories: Vec<String>,
    pub priorities: Vec<String>,
}

pub fn export_envelope(tasks: &[Task], mode: RealityMode, now: DateTime<Utc>) -> ExportEnvelope {
    let mut categories: Vec<String> = Vec::new();
    let mut priorities: Vec<String> = Vec::new();
    for task in tasks {
        let category = task.category.as_str().to_string();
        if !categories.contains(&category) {
            categories.push(category);
        }
        let priority = task.priority.as_str().to_string();
        if !priorities.contains(&priority) {
            priorities.push(priority);
        }
    }
    ExportEnvelope {
        version: EXPORT_VERSION.to_string(),
        exported_at: now,
        current_reality: mode,
        tasks: tasks.to_vec(),
        metadata: ExportMetadata {
            total_tasks: tasks.len(),
            completed_tasks: tasks.iter().filter(|t| t.completed).count(),
            categories,
            priorities,
        },
    }
}

pub fn export_json(tasks: &[Task], mode: RealityMode, now: DateTime<Utc>) -> String {
    match serde_json::to_string_pretty(&export_envelope(tasks, mode, now)) {
        Ok(json) => json,
        Err(e) => {
            log::error!("failed to serialize export: {}", e);
            String::new()
        }
    }
}

/// Flat export of the current reality's view, one row per task.
pub fn export_csv(tasks: &[Task], mode: RealityMode) -> String {
    let profile = &mode.config().effects;
    let mut lines = Vec::with_capacity(tasks.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for task in tasks {
        let variant = task.variant(mode);
        let row = [
            csv_quote(&task.title),
            task.category.as_str().to_string(),
            task.priority.as_str().to_string(),
            if task.completed { "Completed" } else { "Active" }.to_string(),
            task.created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string(),
            task.optimistic.points.to_string(),
            task.realistic.points.to_string(),
            task.disaster.points.to_string(),
            mode.as_str().to_string(),
            effects::adjusted_points(profile, variant.points).to_string(),
        ];
        lines.push(row.join(","));
    }
    lines.join("\n")
}

fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Parse an import payload. The payload must be a JSON object whose
/// `tasks` field is a list; anything else is rejected without touching
/// the current collection.
pub fn import_tasks(payload: &str) -> Result<Vec<Task>> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| Error::InvalidFormat(e.to_string()))?;
    let Some(tasks) = value.get("tasks") else {
        return Err(Error::InvalidFormat("missing `tasks` field".to_string()));
    };
    if !tasks.is_array() {
        return Err(Error::InvalidFormat("`tasks` must be a list".to_string()));
    }
    serde_json::from_value(tasks.clone()).map_err(|e| Error::InvalidFormat(e.to_string()))
}

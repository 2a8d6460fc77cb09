use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::filter::FilterState;
use crate::core::task::Task;

/// Where the engine keeps its best-effort local state.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    dir: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("trifold");
        Self { dir }
    }
}

impl StoragePaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join("tasks.json")
    }

    pub fn filters_path(&self) -> PathBuf {
        self.dir.join("filters.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }
}

/// Missing or corrupt files degrade to an empty collection.
pub fn load_tasks(path: &Path) -> Vec<Task> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

pub fn save_tasks(path: &Path, tasks: &[Task]) {
    match serde_json::to_string_pretty(tasks) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) {
                log::error!("failed to save tasks: {}", e);
            }
        }
        Err(e) => log::error!("failed to serialize tasks: {}", e),
    }
}

/// Missing or corrupt files degrade to the default filter specification.
pub fn load_filters(path: &Path) -> FilterState {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => FilterState::default(),
    }
}

pub fn save_filters(path: &Path, filter: &FilterState) {
    match serde_json::to_string_pretty(filter) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) {
                log::error!("failed to save filters: {}", e);
            }
        }
        Err(e) => log::error!("failed to serialize filters: {}", e),
    }
}

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::reality::RealityMode;
use crate::core::task::{
    Category, Priority, RealityVariant, Subtask, Task, TaskDraft, dedup_ids, normalize_tags,
};
use crate::error::{Error, Result};

/// Partial update for a task. Fields left `None` are untouched.
///
/// Completion metadata (`completed_at`, `completed_in_reality`) is managed
/// by the store on `completed` transitions; explicit values are still
/// honored so undo records can restore prior state exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub completed_in_reality: Option<Option<RealityMode>>,
    pub dependencies: Option<Vec<Uuid>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub optimistic: Option<RealityVariant>,
    pub realistic: Option<RealityVariant>,
    pub disaster: Option<RealityVariant>,
}

impl TaskPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Self::default()
        }
    }

    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn dependencies(ids: Vec<Uuid>) -> Self {
        Self {
            dependencies: Some(ids),
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `task`. Returns `(before, after)` patches holding exactly
    /// the fields that changed, with their prior and new values.
    fn apply(&self, task: &mut Task) -> (TaskPatch, TaskPatch) {
        let mut before = TaskPatch::default();
        let mut after = TaskPatch::default();

        macro_rules! merge {
            ($field:ident) => {
                if let Some(value) = &self.$field {
                    if *value != task.$field {
                        before.$field = Some(task.$field.clone());
                        after.$field = Some(value.clone());
                        task.$field = value.clone();
                    }
                }
            };
        }

        merge!(title);
        merge!(category);
        merge!(priority);
        merge!(tags);
        merge!(completed);
        merge!(dependencies);
        merge!(subtasks);
        merge!(optimistic);
        merge!(realistic);
        merge!(disaster);

        if let Some(value) = self.completed_at {
            if value != task.completed_at {
                before.completed_at = Some(task.completed_at);
                after.completed_at = Some(value);
                task.completed_at = value;
            }
        }
        if let Some(value) = self.completed_in_reality {
            if value != task.completed_in_reality {
                before.completed_in_reality = Some(task.completed_in_reality);
                after.completed_in_reality = Some(value);
                task.completed_in_reality = value;
            }
        }

        (before, after)
    }
}

/// Reversible description of one mutation, sufficient to restore the prior
/// state exactly and to re-apply the mutation on redo.
#[derive(Debug, Clone)]
pub enum UndoRecord {
    Added {
        task: Task,
    },
    Deleted {
        task: Task,
        index: usize,
        /// Which other tasks referenced the deleted id, and at what position
        /// in their dependency list, so the cascade cleanup inverts exactly.
        dependents: Vec<(Uuid, usize)>,
    },
    Updated {
        id: Uuid,
        before: TaskPatch,
        after: TaskPatch,
    },
    Reordered {
        before: Vec<Uuid>,
        after: Vec<Uuid>,
    },
    Duplicated {
        task: Task,
    },
    AutoCompleted {
        id: Uuid,
        before: TaskPatch,
        after: TaskPatch,
    },
}

/// Owns the canonical task collection and the undo/redo command log.
///
/// Every mutating operation validates before it touches state, so callers
/// never observe a partially applied mutation. The revision counter is
/// bumped on each applied mutation; observers poll it to detect change.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
    revision: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn order(&self) -> Vec<Uuid> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn incomplete_ids(&self) -> Vec<Uuid> {
        self.tasks
            .iter()
            .filter(|t| !t.completed)
            .map(|t| t.id)
            .collect()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Append a new task built from `draft`. Fails on an empty title or a
    /// dependency that does not resolve to an existing task.
    pub fn add_task(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Result<Task> {
        if draft.title.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "task title must not be empty".to_string(),
            ));
        }
        for dep in &draft.dependencies {
            if self.get(*dep).is_none() {
                return Err(Error::TaskNotFound(*dep));
            }
        }
        let task = draft.into_task(now);
        self.tasks.push(task.clone());
        self.push_undo(UndoRecord::Added { task: task.clone() });
        self.touch();
        Ok(task)
    }

    /// Merge `patch` into the task. A false-to-true `completed` transition
    /// stamps `completed_at` and records the active mode; the reverse
    /// transition clears both.
    pub fn update_task(
        &mut self,
        id: Uuid,
        patch: TaskPatch,
        mode: RealityMode,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let index = self.index_of(id).ok_or(Error::TaskNotFound(id))?;
        let mut patch = patch;

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(Error::InvalidArgument(
                    "task title must not be empty".to_string(),
                ));
            }
        }
        if let Some(tags) = &patch.tags {
            patch.tags = Some(normalize_tags(tags));
        }
        if let Some(deps) = patch.dependencies.take() {
            let deps = dedup_ids(deps);
            self.validate_dependencies(id, &deps)?;
            patch.dependencies = Some(deps);
        }

        let was_completed = self.tasks[index].completed;
        match patch.completed {
            Some(true) if !was_completed => {
                self.ensure_dependencies_complete(id)?;
                if patch.completed_at.is_none() {
                    patch.completed_at = Some(Some(now));
                }
                if patch.completed_in_reality.is_none() {
                    patch.completed_in_reality = Some(Some(mode));
                }
            }
            Some(false) if was_completed => {
                if patch.completed_at.is_none() {
                    patch.completed_at = Some(None);
                }
                if patch.completed_in_reality.is_none() {
                    patch.completed_in_reality = Some(None);
                }
            }
            _ => {}
        }

        let (before, after) = patch.apply(&mut self.tasks[index]);
        if before.is_empty() {
            return Ok(());
        }
        self.push_undo(UndoRecord::Updated { id, before, after });
        self.touch();
        Ok(())
    }

    /// Remove the task and scrub its id from every other task's dependency
    /// list, so no dangling edges remain.
    pub fn delete_task(&mut self, id: Uuid) -> Result<Task> {
        let index = self.index_of(id).ok_or(Error::TaskNotFound(id))?;
        let task = self.tasks.remove(index);
        let mut dependents = Vec::new();
        for other in &mut self.tasks {
            if let Some(pos) = other.dependencies.iter().position(|d| *d == id) {
                other.dependencies.remove(pos);
                dependents.push((other.id, pos));
            }
        }
        self.push_undo(UndoRecord::Deleted {
            task: task.clone(),
            index,
            dependents,
        });
        self.touch();
        Ok(task)
    }

    /// Replace the collection order. `new_order` must be a permutation of
    /// the current task ids.
    pub fn reorder_tasks(&mut self, new_order: Vec<Uuid>) -> Result<()> {
        let before = self.order();
        if new_order.len() != before.len() {
            return Err(Error::InvalidArgument(
                "reorder must be a permutation of the current task ids".to_string(),
            ));
        }
        let current: HashSet<Uuid> = before.iter().copied().collect();
        let mut seen = HashSet::new();
        for id in &new_order {
            if !current.contains(id) || !seen.insert(*id) {
                return Err(Error::InvalidArgument(
                    "reorder must be a permutation of the current task ids".to_string(),
                ));
            }
        }
        self.apply_order(&new_order);
        self.push_undo(UndoRecord::Reordered {
            before,
            after: new_order,
        });
        self.touch();
        Ok(())
    }

    /// Clone a task under a fresh id. The copy is always incomplete, keeps
    /// no completion metadata, and is stamped with a new creation time.
    pub fn duplicate_task(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<Task> {
        let source = self.get(id).ok_or(Error::TaskNotFound(id))?;
        let mut copy = source.clone();
        copy.id = Uuid::new_v4();
        copy.title = format!("{} (Duplicate)", source.title);
        copy.completed = false;
        copy.completed_at = None;
        copy.completed_in_reality = None;
        copy.created_at = now;
        self.tasks.push(copy.clone());
        self.push_undo(UndoRecord::Duplicated { task: copy.clone() });
        self.touch();
        Ok(copy)
    }

    /// Complete a task on behalf of the effects engine. Absent or already
    /// completed tasks are a quiet no-op; `Ok(true)` means it applied.
    pub fn auto_complete_task(
        &mut self,
        id: Uuid,
        mode: RealityMode,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };
        if self.tasks[index].completed {
            return Ok(false);
        }
        self.ensure_dependencies_complete(id)?;
        let patch = TaskPatch {
            completed: Some(true),
            completed_at: Some(Some(now)),
            completed_in_reality: Some(Some(mode)),
            ..TaskPatch::default()
        };
        let (before, after) = patch.apply(&mut self.tasks[index]);
        self.push_undo(UndoRecord::AutoCompleted { id, before, after });
        self.touch();
        Ok(true)
    }

    /// Revert the most recent mutation. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };
        self.apply_inverse(&record);
        self.redo_stack.push(record);
        self.touch();
        true
    }

    /// Re-apply the most recently undone mutation.
    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };
        self.apply_forward(&record);
        self.undo_stack.push(record);
        self.touch();
        true
    }

    /// Replace the whole collection. A fresh load is not itself undoable,
    /// so both stacks are cleared.
    pub fn load_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.touch();
    }

    fn index_of(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn push_undo(&mut self, record: UndoRecord) {
        self.undo_stack.push(record);
        self.redo_stack.clear();
    }

    /// Reject edges that reference the task itself, a missing task, or
    /// would make the dependency graph cyclic.
    fn validate_dependencies(&self, id: Uuid, deps: &[Uuid]) -> Result<()> {
        for dep in deps {
            if *dep == id {
                return Err(Error::CycleDetected(id));
            }
            if self.get(*dep).is_none() {
                return Err(Error::TaskNotFound(*dep));
            }
        }
        for dep in deps {
            if self.depends_transitively(*dep, id) {
                return Err(Error::CycleDetected(id));
            }
        }
        Ok(())
    }

    fn depends_transitively(&self, start: Uuid, target: Uuid) -> bool {
        let mut stack = vec![start];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(task) = self.get(current) {
                stack.extend(task.dependencies.iter().copied());
            }
        }
        false
    }

    fn ensure_dependencies_complete(&self, id: Uuid) -> Result<()> {
        let Some(task) = self.get(id) else {
            return Ok(());
        };
        let missing = task
            .dependencies
            .iter()
            .filter(|dep| self.get(**dep).is_some_and(|t| !t.completed))
            .count();
        if missing > 0 {
            return Err(Error::DependenciesIncomplete { id, missing });
        }
        Ok(())
    }

    fn apply_inverse(&mut self, record: &UndoRecord) {
        match record {
            UndoRecord::Added { task } | UndoRecord::Duplicated { task } => {
                self.remove_by_id(task.id);
            }
            UndoRecord::Deleted {
                task,
                index,
                dependents,
            } => {
                let at = (*index).min(self.tasks.len());
                self.tasks.insert(at, task.clone());
                for (dependent, pos) in dependents {
                    if let Some(other) = self.tasks.iter_mut().find(|t| t.id == *dependent) {
                        let at = (*pos).min(other.dependencies.len());
                        other.dependencies.insert(at, task.id);
                    }
                }
            }
            UndoRecord::Updated { id, before, .. }
            | UndoRecord::AutoCompleted { id, before, .. } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == *id) {
                    before.apply(task);
                }
            }
            UndoRecord::Reordered { before, .. } => self.apply_order(before),
        }
    }

    fn apply_forward(&mut self, record: &UndoRecord) {
        match record {
            UndoRecord::Added { task } | UndoRecord::Duplicated { task } => {
                self.tasks.push(task.clone());
            }
            UndoRecord::Deleted { task, .. } => {
                self.remove_by_id(task.id);
                for other in &mut self.tasks {
                    other.dependencies.retain(|d| *d != task.id);
                }
            }
            UndoRecord::Updated { id, after, .. }
            | UndoRecord::AutoCompleted { id, after, .. } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == *id) {
                    after.apply(task);
                }
            }
            UndoRecord::Reordered { after, .. } => self.apply_order(after),
        }
    }

    fn apply_order(&mut self, order: &[Uuid]) {
        let positions: HashMap<Uuid, usize> = order
            .iter()
            .enumerate()
            .map(|(pos, id)| (*id, pos))
            .collect();
        self.tasks
            .sort_by_key(|t| positions.get(&t.id).copied().unwrap_or(usize::MAX));
    }

    fn remove_by_id(&mut self, id: Uuid) {
        if let Some(index) = self.index_of(id) {
            self.tasks.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn store_with(titles: &[&str]) -> (TaskStore, Vec<Uuid>) {
        let now = fixed_now();
        let mut store = TaskStore::new();
        let mut ids = Vec::new();
        for title in titles {
            let task = store.add_task(TaskDraft::new(*title, now), now).unwrap();
            ids.push(task.id);
        }
        (store, ids)
    }

    #[test]
    fn add_assigns_id_and_creation_time() {
        let now = fixed_now();
        let mut store = TaskStore::new();
        let task = store.add_task(TaskDraft::new("Pay rent", now), now).unwrap();
        assert_eq!(task.created_at, now);
        assert!(!task.completed);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_rejects_empty_titles() {
        let now = fixed_now();
        let mut store = TaskStore::new();
        let err = store.add_task(TaskDraft::new("  ", now), now).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn completing_stamps_time_and_mode() {
        let (mut store, ids) = store_with(&["A"]);
        store
            .update_task(ids[0], TaskPatch::completed(true), RealityMode::Disaster, fixed_now())
            .unwrap();
        let task = store.get(ids[0]).unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(fixed_now()));
        assert_eq!(task.completed_in_reality, Some(RealityMode::Disaster));
        assert!(task.completed_at.unwrap() >= task.created_at);
    }

    #[test]
    fn reverting_completion_clears_metadata() {
        let (mut store, ids) = store_with(&["A"]);
        let now = fixed_now();
        store
            .update_task(ids[0], TaskPatch::completed(true), RealityMode::Realistic, now)
            .unwrap();
        store
            .update_task(ids[0], TaskPatch::completed(false), RealityMode::Realistic, now)
            .unwrap();
        let task = store.get(ids[0]).unwrap();
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.completed_in_reality, None);
    }

    #[test]
    fn update_missing_task_is_not_found() {
        let mut store = TaskStore::new();
        let err = store
            .update_task(
                Uuid::new_v4(),
                TaskPatch::completed(true),
                RealityMode::Realistic,
                fixed_now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[test]
    fn undo_redo_round_trips_an_update() {
        let (mut store, ids) = store_with(&["A"]);
        let now = fixed_now();
        store
            .update_task(ids[0], TaskPatch::title("Renamed"), RealityMode::Realistic, now)
            .unwrap();
        let after_update = store.tasks().to_vec();

        assert!(store.undo());
        assert_eq!(store.get(ids[0]).unwrap().title, "A");
        assert!(store.redo());
        assert_eq!(store.tasks(), &after_update[..]);
    }

    #[test]
    fn undo_redo_round_trips_a_mixed_sequence() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A", "B"]);
        store
            .update_task(ids[0], TaskPatch::completed(true), RealityMode::Optimistic, now)
            .unwrap();
        store.duplicate_task(ids[1], now).unwrap();
        store.delete_task(ids[0]).unwrap();
        let reference = store.tasks().to_vec();

        assert!(store.undo());
        assert!(store.redo());
        assert_eq!(store.tasks(), &reference[..]);

        // Unwind everything and the store is empty again.
        while store.undo() {}
        assert!(store.is_empty());
    }

    #[test]
    fn undo_restores_a_deleted_task_at_its_index() {
        let (mut store, ids) = store_with(&["A", "B", "C"]);
        store.delete_task(ids[1]).unwrap();
        assert_eq!(store.order(), vec![ids[0], ids[2]]);
        assert!(store.undo());
        assert_eq!(store.order(), vec![ids[0], ids[1], ids[2]]);
    }

    #[test]
    fn delete_cascades_dependencies_and_undo_restores_them() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A", "B"]);
        store
            .update_task(
                ids[1],
                TaskPatch::dependencies(vec![ids[0]]),
                RealityMode::Realistic,
                now,
            )
            .unwrap();
        store.delete_task(ids[0]).unwrap();
        assert!(store.get(ids[1]).unwrap().dependencies.is_empty());

        assert!(store.undo());
        assert_eq!(store.get(ids[1]).unwrap().dependencies, vec![ids[0]]);

        assert!(store.redo());
        assert!(store.get(ids[1]).unwrap().dependencies.is_empty());
    }

    #[test]
    fn mutations_clear_the_redo_stack() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A"]);
        store
            .update_task(ids[0], TaskPatch::title("Renamed"), RealityMode::Realistic, now)
            .unwrap();
        assert!(store.undo());
        assert!(store.can_redo());
        store.add_task(TaskDraft::new("New", now), now).unwrap();
        assert!(!store.can_redo());
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let (mut store, ids) = store_with(&["A", "B"]);
        let err = store.reorder_tasks(vec![ids[0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = store.reorder_tasks(vec![ids[0], ids[0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = store.reorder_tasks(vec![ids[0], Uuid::new_v4()]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn reorder_applies_and_undoes() {
        let (mut store, ids) = store_with(&["A", "B", "C"]);
        store
            .reorder_tasks(vec![ids[2], ids[0], ids[1]])
            .unwrap();
        assert_eq!(store.order(), vec![ids[2], ids[0], ids[1]]);
        assert!(store.undo());
        assert_eq!(store.order(), vec![ids[0], ids[1], ids[2]]);
    }

    #[test]
    fn duplicate_resets_completion_and_tags_the_title() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A"]);
        store
            .update_task(ids[0], TaskPatch::completed(true), RealityMode::Realistic, now)
            .unwrap();
        let copy = store.duplicate_task(ids[0], now).unwrap();
        assert_ne!(copy.id, ids[0]);
        assert!(!copy.completed);
        assert_eq!(copy.completed_at, None);
        assert_eq!(copy.completed_in_reality, None);
        assert!(copy.title.ends_with(" (Duplicate)"));
    }

    #[test]
    fn auto_complete_skips_absent_and_completed_tasks() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A"]);
        assert!(
            store
                .auto_complete_task(ids[0], RealityMode::Optimistic, now)
                .unwrap()
        );
        assert!(
            !store
                .auto_complete_task(ids[0], RealityMode::Optimistic, now)
                .unwrap()
        );
        assert!(
            !store
                .auto_complete_task(Uuid::new_v4(), RealityMode::Optimistic, now)
                .unwrap()
        );
        let task = store.get(ids[0]).unwrap();
        assert_eq!(task.completed_in_reality, Some(RealityMode::Optimistic));
    }

    #[test]
    fn undo_reverts_an_auto_completion() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A"]);
        store
            .auto_complete_task(ids[0], RealityMode::Optimistic, now)
            .unwrap();
        assert!(store.undo());
        let task = store.get(ids[0]).unwrap();
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn dependency_cycles_are_rejected() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A", "B"]);
        store
            .update_task(
                ids[1],
                TaskPatch::dependencies(vec![ids[0]]),
                RealityMode::Realistic,
                now,
            )
            .unwrap();
        let err = store
            .update_task(
                ids[0],
                TaskPatch::dependencies(vec![ids[1]]),
                RealityMode::Realistic,
                now,
            )
            .unwrap_err();
        assert!(matches!(err, Error::CycleDetected(_)));
        // The rejected edge left no trace.
        assert!(store.get(ids[0]).unwrap().dependencies.is_empty());
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A"]);
        let err = store
            .update_task(
                ids[0],
                TaskPatch::dependencies(vec![ids[0]]),
                RealityMode::Realistic,
                now,
            )
            .unwrap_err();
        assert!(matches!(err, Error::CycleDetected(_)));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A"]);
        let err = store
            .update_task(
                ids[0],
                TaskPatch::dependencies(vec![Uuid::new_v4()]),
                RealityMode::Realistic,
                now,
            )
            .unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[test]
    fn completion_waits_for_dependencies() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A", "B"]);
        store
            .update_task(
                ids[1],
                TaskPatch::dependencies(vec![ids[0]]),
                RealityMode::Realistic,
                now,
            )
            .unwrap();
        let err = store
            .update_task(ids[1], TaskPatch::completed(true), RealityMode::Realistic, now)
            .unwrap_err();
        assert!(matches!(err, Error::DependenciesIncomplete { .. }));

        store
            .update_task(ids[0], TaskPatch::completed(true), RealityMode::Realistic, now)
            .unwrap();
        store
            .update_task(ids[1], TaskPatch::completed(true), RealityMode::Realistic, now)
            .unwrap();
        assert!(store.get(ids[1]).unwrap().completed);
    }

    #[test]
    fn load_replaces_and_clears_both_stacks() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A", "B"]);
        store
            .update_task(ids[0], TaskPatch::title("Renamed"), RealityMode::Realistic, now)
            .unwrap();
        store.undo();
        assert!(store.can_redo());

        store.load_tasks(Vec::new());
        assert!(store.is_empty());
        assert!(!store.can_undo());
        assert!(!store.can_redo());
    }

    #[test]
    fn no_op_update_records_nothing() {
        let now = fixed_now();
        let (mut store, ids) = store_with(&["A"]);
        let revision = store.revision();
        store
            .update_task(ids[0], TaskPatch::title("A"), RealityMode::Realistic, now)
            .unwrap();
        assert_eq!(store.revision(), revision);
        assert!(!store.can_redo());
    }
}

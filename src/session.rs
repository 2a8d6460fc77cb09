use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

use crate::controller::{ModeChange, RealityController, Snapshot, TransitionToken};
use crate::core::filter::FilterState;
use crate::core::reality::RealityMode;
use crate::core::task::{Task, TaskDraft};
use crate::core::view::{self, TaskStats, TaskView};
use crate::effects::{self, TickOutcome};
use crate::error::Result;
use crate::export;
use crate::storage::{self, StoragePaths};
use crate::store::{TaskPatch, TaskStore};
use crate::time::SharedClock;

/// One session's engine state: the task store, the reality controller, the
/// active filter and the seeded random source, constructed once and passed
/// by reference to every consumer.
///
/// All mutations funnel through this type, which keeps them serialized and
/// lets the controller snapshot the collection after each one.
pub struct Session {
    store: TaskStore,
    controller: RealityController,
    filter: FilterState,
    rng: StdRng,
    clock: SharedClock,
}

impl Session {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            store: TaskStore::new(),
            controller: RealityController::new(),
            filter: FilterState::default(),
            rng: StdRng::from_os_rng(),
            clock,
        }
    }

    /// Deterministic session for tests and replay.
    pub fn with_seed(clock: SharedClock, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(clock)
        }
    }

    // ---- task commands -------------------------------------------------

    pub fn add_task(&mut self, draft: TaskDraft) -> Result<Task> {
        let now = self.clock.now();
        let before = self.store.revision();
        let result = self.store.add_task(draft, now);
        self.snapshot_if_changed(before, now);
        result
    }

    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch) -> Result<()> {
        let now = self.clock.now();
        let mode = self.controller.current_mode();
        let before = self.store.revision();
        let result = self.store.update_task(id, patch, mode, now);
        self.snapshot_if_changed(before, now);
        result
    }

    pub fn delete_task(&mut self, id: Uuid) -> Result<Task> {
        let now = self.clock.now();
        let before = self.store.revision();
        let result = self.store.delete_task(id);
        self.snapshot_if_changed(before, now);
        result
    }

    pub fn reorder_tasks(&mut self, new_order: Vec<Uuid>) -> Result<()> {
        let now = self.clock.now();
        let before = self.store.revision();
        let result = self.store.reorder_tasks(new_order);
        self.snapshot_if_changed(before, now);
        result
    }

    pub fn duplicate_task(&mut self, id: Uuid) -> Result<Task> {
        let now = self.clock.now();
        let before = self.store.revision();
        let result = self.store.duplicate_task(id, now);
        self.snapshot_if_changed(before, now);
        result
    }

    pub fn undo(&mut self) -> bool {
        let now = self.clock.now();
        let before = self.store.revision();
        let applied = self.store.undo();
        self.snapshot_if_changed(before, now);
        applied
    }

    pub fn redo(&mut self) -> bool {
        let now = self.clock.now();
        let before = self.store.revision();
        let applied = self.store.redo();
        self.snapshot_if_changed(before, now);
        applied
    }

    pub fn load_tasks(&mut self, tasks: Vec<Task>) {
        let now = self.clock.now();
        self.store.load_tasks(tasks);
        self.controller.observe_tasks_changed(self.store.tasks(), now);
    }

    // ---- reality commands ----------------------------------------------

    pub fn change_mode(&mut self, target: RealityMode) -> Option<TransitionToken> {
        self.controller.change_mode(target, self.clock.now())
    }

    pub fn random_change(&mut self) -> Option<TransitionToken> {
        let now = self.clock.now();
        self.controller.random_change(&mut self.rng, now)
    }

    pub fn toggle_auto_change(&mut self) -> bool {
        self.controller.toggle_auto_change()
    }

    /// One auto-change scheduler tick.
    pub fn auto_change_tick(&mut self) -> Option<TransitionToken> {
        let now = self.clock.now();
        self.controller.auto_change_tick(&mut self.rng, now)
    }

    pub fn complete_transition(&mut self, token: TransitionToken) {
        self.controller.complete_transition(token);
    }

    pub fn restore_snapshot(&mut self, id: u64) -> Result<TransitionToken> {
        let now = self.clock.now();
        let token = self.controller.restore_snapshot(id, &mut self.store)?;
        // The restored collection is itself a change worth snapshotting.
        self.controller.observe_tasks_changed(self.store.tasks(), now);
        Ok(token)
    }

    pub fn clear_history(&mut self) {
        self.controller.clear_history();
    }

    // ---- effect ticks --------------------------------------------------

    pub fn general_effects_tick(&mut self) -> TickOutcome {
        let now = self.clock.now();
        let mode = self.controller.current_mode();
        let before = self.store.revision();
        let outcome = effects::general_effects_tick(&mut self.store, mode, &mut self.rng, now);
        self.snapshot_if_changed(before, now);
        outcome
    }

    pub fn disaster_duplication_tick(&mut self) -> TickOutcome {
        // A tick that outlives its mode must not fire.
        if self.controller.current_mode() != RealityMode::Disaster {
            return TickOutcome::default();
        }
        let now = self.clock.now();
        let before = self.store.revision();
        let outcome = effects::disaster_duplication_tick(&mut self.store, &mut self.rng, now);
        self.snapshot_if_changed(before, now);
        outcome
    }

    pub fn optimistic_boost_tick(&mut self) -> TickOutcome {
        if self.controller.current_mode() != RealityMode::Optimistic {
            return TickOutcome::default();
        }
        let now = self.clock.now();
        let before = self.store.revision();
        let outcome = effects::optimistic_boost_tick(&mut self.store, &mut self.rng, now);
        self.snapshot_if_changed(before, now);
        outcome
    }

    // ---- projections ---------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn mode(&self) -> RealityMode {
        self.controller.current_mode()
    }

    pub fn is_transitioning(&self) -> bool {
        self.controller.is_transitioning()
    }

    pub fn auto_change_enabled(&self) -> bool {
        self.controller.auto_change_enabled()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        self.controller.snapshots()
    }

    pub fn mode_history(&self) -> &[ModeChange] {
        self.controller.mode_history()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    pub fn reset_filters(&mut self) {
        self.filter = FilterState::default();
    }

    /// The filtered, sorted projection plus aggregates for the active mode.
    pub fn view(&self) -> TaskView {
        view::build_view(
            self.store.tasks(),
            &self.filter,
            self.controller.current_mode(),
            self.clock.now(),
        )
    }

    pub fn stats(&self) -> TaskStats {
        view::compute_stats(
            self.store.tasks(),
            self.controller.current_mode(),
            self.clock.now(),
        )
    }

    // ---- export / import / persistence ---------------------------------

    pub fn export_json(&self) -> String {
        export::export_json(self.store.tasks(), self.mode(), self.clock.now())
    }

    pub fn export_csv(&self) -> String {
        export::export_csv(self.store.tasks(), self.mode())
    }

    /// Replace the collection with an imported payload and reset the filter
    /// specification. A failed import leaves everything untouched.
    pub fn import_json(&mut self, payload: &str) -> Result<usize> {
        let tasks = export::import_tasks(payload)?;
        let count = tasks.len();
        self.load_tasks(tasks);
        self.reset_filters();
        log::info!("imported {count} tasks");
        Ok(count)
    }

    /// Best-effort load of persisted state. Missing or corrupt files leave
    /// the defaults in place.
    pub fn load_from(&mut self, paths: &StoragePaths) {
        let tasks = storage::load_tasks(&paths.tasks_path());
        if !tasks.is_empty() {
            self.load_tasks(tasks);
        }
        self.filter = storage::load_filters(&paths.filters_path());
    }

    /// Best-effort save of the collection and the filter specification.
    pub fn save_to(&self, paths: &StoragePaths) {
        if let Err(e) = paths.ensure_dir() {
            log::error!("failed to create data directory: {e}");
            return;
        }
        storage::save_tasks(&paths.tasks_path(), self.store.tasks());
        storage::save_filters(&paths.filters_path(), &self.filter);
    }

    fn snapshot_if_changed(&mut self, revision_before: u64, now: DateTime<Utc>) {
        if self.store.revision() != revision_before {
            self.controller.observe_tasks_changed(self.store.tasks(), now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn manual_clock() -> (ManualClock, SharedClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap());
        let shared: SharedClock = Arc::new(clock.clone());
        (clock, shared)
    }

    fn session() -> (Session, ManualClock) {
        let (clock, shared) = manual_clock();
        (Session::with_seed(shared, 42), clock)
    }

    #[test]
    fn every_mutation_snapshots_the_collection() {
        let (mut session, _clock) = session();
        let deadline = Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap();
        let task = session.add_task(TaskDraft::new("A", deadline)).unwrap();
        session
            .update_task(task.id, TaskPatch::completed(true))
            .unwrap();
        session.delete_task(task.id).unwrap();
        assert_eq!(session.snapshots().len(), 3);
        // The last snapshot captured the empty collection.
        assert!(session.snapshots().last().unwrap().tasks.is_empty());
    }

    #[test]
    fn failed_commands_snapshot_nothing() {
        let (mut session, _clock) = session();
        assert!(session.delete_task(Uuid::new_v4()).is_err());
        assert!(session.snapshots().is_empty());
    }

    #[test]
    fn completion_reads_the_active_mode() {
        let (mut session, _clock) = session();
        let deadline = Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap();
        let task = session.add_task(TaskDraft::new("A", deadline)).unwrap();
        session.change_mode(RealityMode::Disaster);
        session
            .update_task(task.id, TaskPatch::completed(true))
            .unwrap();
        assert_eq!(
            session.tasks()[0].completed_in_reality,
            Some(RealityMode::Disaster)
        );
    }

    #[test]
    fn clock_drives_creation_timestamps() {
        let (mut session, clock) = session();
        let deadline = Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap();
        let first = session.add_task(TaskDraft::new("A", deadline)).unwrap();
        clock.advance(Duration::hours(2));
        let second = session.add_task(TaskDraft::new("B", deadline)).unwrap();
        assert_eq!(second.created_at - first.created_at, Duration::hours(2));
    }

    #[test]
    fn restore_snapshot_round_trips_through_the_session() {
        let (mut session, _clock) = session();
        let deadline = Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap();
        let task = session.add_task(TaskDraft::new("Keep", deadline)).unwrap();
        let snapshot_id = session.snapshots()[0].id;

        session.delete_task(task.id).unwrap();
        assert!(session.tasks().is_empty());

        session.restore_snapshot(snapshot_id).unwrap();
        assert_eq!(session.tasks().len(), 1);
        assert!(session.is_transitioning());
        // The restore itself was snapshotted.
        assert_eq!(session.snapshots().last().unwrap().tasks.len(), 1);
    }

    #[test]
    fn import_resets_the_filter_specification() {
        let (mut session, _clock) = session();
        session.set_filter(FilterState {
            search_query: "x".to_string(),
            ..FilterState::default()
        });
        let payload = r#"{"tasks": []}"#;
        assert_eq!(session.import_json(payload).unwrap(), 0);
        assert!(!session.filter().has_active_filters());
    }

    #[test]
    fn failed_import_leaves_state_untouched() {
        let (mut session, _clock) = session();
        let deadline = Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap();
        session.add_task(TaskDraft::new("Keep", deadline)).unwrap();
        let err = session.import_json(r#"{"notTasks": true}"#).unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidFormat(_)));
        assert_eq!(session.tasks().len(), 1);
    }

    #[test]
    fn stale_mode_ticks_do_not_fire() {
        let (mut session, _clock) = session();
        let deadline = Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap();
        session.add_task(TaskDraft::new("A", deadline)).unwrap();
        // Realistic is active, so a leftover disaster tick must be inert.
        let outcome = session.disaster_duplication_tick();
        assert!(outcome.is_quiet());
        assert_eq!(session.tasks().len(), 1);
    }

    #[test]
    fn total_points_follow_the_active_mode() {
        let (mut session, _clock) = session();
        let deadline = Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap();
        let task = session.add_task(TaskDraft::new("A", deadline)).unwrap();
        session
            .update_task(task.id, TaskPatch::completed(true))
            .unwrap();

        session.change_mode(RealityMode::Optimistic);
        let optimistic_points = session.stats().total_points;
        session.change_mode(RealityMode::Disaster);
        let disaster_points = session.stats().total_points;
        assert_ne!(optimistic_points, disaster_points);
        // Stored values were never rewritten.
        assert_eq!(session.tasks()[0].optimistic.points, 10);
        assert_eq!(session.tasks()[0].disaster.points, 2);
    }
}

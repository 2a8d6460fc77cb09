use chrono::{DateTime, Utc};
use rand::Rng;

use crate::core::reality::{RealityConfig, RealityMode};
use crate::core::task::Task;
use crate::error::{Error, Result};
use crate::store::TaskStore;

/// How many snapshots are retained before the oldest are dropped.
const SNAPSHOT_CAP: usize = 200;

/// Chance of hopping to another mode on each auto-change tick.
const AUTO_CHANGE_CHANCE: f64 = 0.1;

/// Identifies one pending mode transition. A completion callback carrying
/// a superseded token is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub mode: RealityMode,
    pub at: DateTime<Utc>,
}

/// Point-in-time copy of the task collection, tagged with the mode that
/// was active when it was taken.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: u64,
    pub mode: RealityMode,
    pub taken_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
}

/// Owns the active reality mode, the transition state machine, the mode
/// history and the snapshot log.
pub struct RealityController {
    current_mode: RealityMode,
    previous_mode: Option<RealityMode>,
    mode_history: Vec<ModeChange>,
    pending_transition: Option<u64>,
    next_transition_id: u64,
    next_snapshot_id: u64,
    auto_change_enabled: bool,
    snapshots: Vec<Snapshot>,
}

impl Default for RealityController {
    fn default() -> Self {
        Self::new()
    }
}

impl RealityController {
    pub fn new() -> Self {
        Self {
            current_mode: RealityMode::Realistic,
            previous_mode: None,
            mode_history: Vec::new(),
            pending_transition: None,
            next_transition_id: 0,
            next_snapshot_id: 0,
            auto_change_enabled: true,
            snapshots: Vec::new(),
        }
    }

    pub fn current_mode(&self) -> RealityMode {
        self.current_mode
    }

    pub fn previous_mode(&self) -> Option<RealityMode> {
        self.previous_mode
    }

    pub fn config(&self) -> &'static RealityConfig {
        self.current_mode.config()
    }

    pub fn is_transitioning(&self) -> bool {
        self.pending_transition.is_some()
    }

    pub fn auto_change_enabled(&self) -> bool {
        self.auto_change_enabled
    }

    pub fn mode_history(&self) -> &[ModeChange] {
        &self.mode_history
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Switch to `target`. Switching to the mode already active is a no-op
    /// and records nothing. Otherwise the outgoing mode is appended to the
    /// history and a transition begins; the returned token must be handed
    /// back via [`complete_transition`](Self::complete_transition) after
    /// the transition delay.
    pub fn change_mode(&mut self, target: RealityMode, now: DateTime<Utc>) -> Option<TransitionToken> {
        if target == self.current_mode {
            return None;
        }
        self.mode_history.push(ModeChange {
            mode: self.current_mode,
            at: now,
        });
        self.previous_mode = Some(self.current_mode);
        self.current_mode = target;
        Some(self.begin_transition())
    }

    /// Hop to one of the two other modes, chosen uniformly.
    pub fn random_change<R: Rng>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<TransitionToken> {
        let others = self.current_mode.others();
        let target = others[rng.random_range(0..others.len())];
        self.change_mode(target, now)
    }

    /// One auto-change scheduler tick: with a small chance, hop modes.
    pub fn auto_change_tick<R: Rng>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<TransitionToken> {
        if !self.auto_change_enabled {
            return None;
        }
        if rng.random_bool(AUTO_CHANGE_CHANCE) {
            self.random_change(rng, now)
        } else {
            None
        }
    }

    pub fn toggle_auto_change(&mut self) -> bool {
        self.auto_change_enabled = !self.auto_change_enabled;
        self.auto_change_enabled
    }

    /// Finish a transition. Stale tokens from superseded mode changes are
    /// ignored.
    pub fn complete_transition(&mut self, token: TransitionToken) {
        if self.pending_transition == Some(token.0) {
            self.pending_transition = None;
        }
    }

    /// Record a snapshot of the collection under the active mode. Called on
    /// every observed store mutation; the log keeps the most recent
    /// `SNAPSHOT_CAP` entries.
    pub fn observe_tasks_changed(&mut self, tasks: &[Task], now: DateTime<Utc>) {
        self.next_snapshot_id += 1;
        self.snapshots.push(Snapshot {
            id: self.next_snapshot_id,
            mode: self.current_mode,
            taken_at: now,
            tasks: tasks.to_vec(),
        });
        if self.snapshots.len() > SNAPSHOT_CAP {
            let excess = self.snapshots.len() - SNAPSHOT_CAP;
            self.snapshots.drain(..excess);
        }
    }

    /// Restore both halves of a snapshot: the captured mode becomes active
    /// and the store's collection is replaced with the captured tasks.
    pub fn restore_snapshot(&mut self, id: u64, store: &mut TaskStore) -> Result<TransitionToken> {
        let snapshot = self
            .snapshots
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(Error::SnapshotNotFound(id))?;
        log::info!(
            "restoring snapshot {} ({} tasks, {} mode)",
            snapshot.id,
            snapshot.tasks.len(),
            snapshot.mode.as_str()
        );
        if snapshot.mode != self.current_mode {
            self.previous_mode = Some(self.current_mode);
            self.current_mode = snapshot.mode;
        }
        store.load_tasks(snapshot.tasks);
        Ok(self.begin_transition())
    }

    /// Empty the snapshot log and the mode history. The active mode and the
    /// live tasks are untouched.
    pub fn clear_history(&mut self) {
        self.snapshots.clear();
        self.mode_history.clear();
    }

    fn begin_transition(&mut self) -> TransitionToken {
        self.next_transition_id += 1;
        self.pending_transition = Some(self.next_transition_id);
        TransitionToken(self.next_transition_id)
    }
}

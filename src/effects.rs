use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::core::reality::{EffectProfile, RealityMode};
use crate::store::TaskStore;

/// Per-task duplication chance while disaster mode is active.
const DISASTER_DUPLICATION_CHANCE: f64 = 0.1;

/// Per-task duplication chance when a profile enables task duplication.
const GENERAL_DUPLICATION_CHANCE: f64 = 0.05;

/// Scale the time remaining until `base` by the profile's deadline
/// multiplier. A deadline already in the past moves closer still.
pub fn adjusted_deadline(
    effects: &EffectProfile,
    base: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let remaining_ms = (base - now).num_milliseconds() as f64;
    now + Duration::milliseconds((remaining_ms * effects.deadline_multiplier).round() as i64)
}

/// Scale difficulty, clamped to the 1 through 10 range.
pub fn adjusted_difficulty(effects: &EffectProfile, base: u8) -> f64 {
    (f64::from(base) * effects.difficulty_reduction).clamp(1.0, 10.0)
}

/// Scale points, rounded to the nearest whole value.
pub fn adjusted_points(effects: &EffectProfile, base: u32) -> i64 {
    (f64::from(base) * effects.point_multiplier).round() as i64
}

/// What one tick changed, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub completed: usize,
    pub duplicated: usize,
}

impl TickOutcome {
    pub fn is_quiet(&self) -> bool {
        self.completed == 0 && self.duplicated == 0
    }
}

/// One general effects tick, active in every mode: each incomplete task may
/// auto-complete with the profile's chance, and may duplicate when the
/// profile enables duplication.
pub fn general_effects_tick<R: Rng>(
    store: &mut TaskStore,
    mode: RealityMode,
    rng: &mut R,
    now: DateTime<Utc>,
) -> TickOutcome {
    let profile = &mode.config().effects;
    let mut outcome = TickOutcome::default();
    for id in store.incomplete_ids() {
        if rng.random_bool(profile.auto_complete_chance) {
            try_auto_complete(store, id, mode, now, &mut outcome);
        }
        if profile.task_duplication && rng.random_bool(GENERAL_DUPLICATION_CHANCE) {
            try_duplicate(store, id, now, &mut outcome);
        }
    }
    if !outcome.is_quiet() {
        log::debug!(
            "general effects tick ({}): {} completed, {} duplicated",
            mode.as_str(),
            outcome.completed,
            outcome.duplicated
        );
    }
    outcome
}

/// One disaster duplication tick: every incomplete task may spawn a copy.
pub fn disaster_duplication_tick<R: Rng>(
    store: &mut TaskStore,
    rng: &mut R,
    now: DateTime<Utc>,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    for id in store.incomplete_ids() {
        if rng.random_bool(DISASTER_DUPLICATION_CHANCE) {
            try_duplicate(store, id, now, &mut outcome);
        }
    }
    outcome
}

/// One optimistic boost tick: with the profile's chance, one incomplete
/// task chosen uniformly gets completed.
pub fn optimistic_boost_tick<R: Rng>(
    store: &mut TaskStore,
    rng: &mut R,
    now: DateTime<Utc>,
) -> TickOutcome {
    let profile = &RealityMode::Optimistic.config().effects;
    let mut outcome = TickOutcome::default();
    let ids = store.incomplete_ids();
    if ids.is_empty() {
        return outcome;
    }
    if rng.random_bool(profile.auto_complete_chance) {
        let id = ids[rng.random_range(0..ids.len())];
        try_auto_complete(store, id, RealityMode::Optimistic, now, &mut outcome);
    }
    outcome
}

fn try_auto_complete(
    store: &mut TaskStore,
    id: Uuid,
    mode: RealityMode,
    now: DateTime<Utc>,
    outcome: &mut TickOutcome,
) {
    match store.auto_complete_task(id, mode, now) {
        Ok(true) => outcome.completed += 1,
        Ok(false) => {}
        // A blocked or vanished task never halts the tick.
        Err(e) => log::debug!("skipping auto-complete of {id}: {e}"),
    }
}

fn try_duplicate(store: &mut TaskStore, id: Uuid, now: DateTime<Utc>, outcome: &mut TickOutcome) {
    match store.duplicate_task(id, now) {
        Ok(_) => outcome.duplicated += 1,
        Err(e) => log::debug!("skipping duplication of {id}: {e}"),
    }
}

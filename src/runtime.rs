use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::controller::TransitionToken;
use crate::core::reality::RealityMode;
use crate::error::Result;
use crate::session::Session;

pub const GENERAL_EFFECTS_INTERVAL: Duration = Duration::from_secs(10);
pub const DISASTER_DUPLICATION_INTERVAL: Duration = Duration::from_secs(15);
pub const OPTIMISTIC_BOOST_INTERVAL: Duration = Duration::from_secs(8);
pub const AUTO_CHANGE_INTERVAL: Duration = Duration::from_secs(30);
pub const TRANSITION_DELAY: Duration = Duration::from_millis(500);

pub type SharedSession = Arc<Mutex<Session>>;

fn lock(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drives a session's periodic processes on tokio timers.
///
/// Every process is a cancellable task handle. The three effect processes
/// are stopped and respawned whenever the active mode changes, so a tick
/// scheduled for a stale mode never fires, and the auto-change scheduler is
/// stopped and restarted on toggle rather than double-scheduled.
pub struct EngineRuntime {
    session: SharedSession,
    mode_tx: watch::Sender<RealityMode>,
    supervisor: JoinHandle<()>,
    auto_change: Mutex<Option<JoinHandle<()>>>,
    effect_procs: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl EngineRuntime {
    pub fn start(session: SharedSession) -> Self {
        let (initial_mode, auto_change_enabled) = {
            let s = lock(&session);
            (s.mode(), s.auto_change_enabled())
        };
        let (mode_tx, mode_rx) = watch::channel(initial_mode);
        let effect_procs = Arc::new(Mutex::new(Vec::new()));
        let supervisor = tokio::spawn(supervise_effects(
            session.clone(),
            mode_rx,
            effect_procs.clone(),
        ));
        let runtime = Self {
            session,
            mode_tx,
            supervisor,
            auto_change: Mutex::new(None),
            effect_procs,
        };
        if auto_change_enabled {
            runtime.spawn_auto_change();
        }
        runtime
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn change_mode(&self, target: RealityMode) {
        let token = lock(&self.session).change_mode(target);
        self.after_mode_change(token);
    }

    pub fn random_change(&self) {
        let token = lock(&self.session).random_change();
        self.after_mode_change(token);
    }

    pub fn restore_snapshot(&self, id: u64) -> Result<()> {
        let token = lock(&self.session).restore_snapshot(id)?;
        self.after_mode_change(Some(token));
        Ok(())
    }

    /// Flip the auto-change scheduler. The previous handle is always
    /// cancelled first, so toggling can never double-schedule.
    pub fn toggle_auto_change(&self) -> bool {
        let enabled = lock(&self.session).toggle_auto_change();
        let mut slot = self
            .auto_change
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        drop(slot);
        if enabled {
            self.spawn_auto_change();
        }
        enabled
    }

    pub fn auto_change_scheduled(&self) -> bool {
        self.auto_change
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Cancel every periodic process. Pending transition completers expire
    /// on their own within the transition delay.
    pub fn shutdown(&self) {
        self.supervisor.abort();
        let mut slot = self
            .auto_change
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        drop(slot);
        let mut procs = self
            .effect_procs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handle in procs.drain(..) {
            handle.abort();
        }
    }

    fn after_mode_change(&self, token: Option<TransitionToken>) {
        let Some(token) = token else {
            return;
        };
        let mode = lock(&self.session).mode();
        let _ = self.mode_tx.send(mode);
        spawn_transition_completer(self.session.clone(), token);
    }

    fn spawn_auto_change(&self) {
        let handle = tokio::spawn(auto_change_loop(
            self.session.clone(),
            self.mode_tx.clone(),
        ));
        let mut slot = self
            .auto_change
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(handle);
    }
}

impl Drop for EngineRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_transition_completer(session: SharedSession, token: TransitionToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        time::sleep(TRANSITION_DELAY).await;
        // The controller ignores tokens from superseded transitions.
        lock(&session).complete_transition(token);
    })
}

async fn auto_change_loop(session: SharedSession, mode_tx: watch::Sender<RealityMode>) {
    let mut ticks = time::interval(AUTO_CHANGE_INTERVAL);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks.tick().await; // the first tick completes immediately
    loop {
        ticks.tick().await;
        let (token, mode) = {
            let mut s = lock(&session);
            let token = s.auto_change_tick();
            (token, s.mode())
        };
        if let Some(token) = token {
            log::info!("auto-change hopped to {} mode", mode.as_str());
            let _ = mode_tx.send(mode);
            spawn_transition_completer(session.clone(), token);
        }
    }
}

/// Respawn the effect processes every time the mode signal changes.
async fn supervise_effects(
    session: SharedSession,
    mut mode_rx: watch::Receiver<RealityMode>,
    procs: Arc<Mutex<Vec<JoinHandle<()>>>>,
) {
    let mode = *mode_rx.borrow_and_update();
    replace_procs(&procs, spawn_mode_processes(&session, mode));
    while mode_rx.changed().await.is_ok() {
        let mode = *mode_rx.borrow_and_update();
        replace_procs(&procs, spawn_mode_processes(&session, mode));
    }
}

fn replace_procs(procs: &Arc<Mutex<Vec<JoinHandle<()>>>>, next: Vec<JoinHandle<()>>) {
    let mut slot = procs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for handle in slot.drain(..) {
        handle.abort();
    }
    *slot = next;
}

fn spawn_mode_processes(session: &SharedSession, mode: RealityMode) -> Vec<JoinHandle<()>> {
    let mut handles = vec![tokio::spawn(general_effects_loop(session.clone()))];
    match mode {
        RealityMode::Disaster => {
            handles.push(tokio::spawn(disaster_duplication_loop(session.clone())));
        }
        RealityMode::Optimistic => {
            handles.push(tokio::spawn(optimistic_boost_loop(session.clone())));
        }
        RealityMode::Realistic => {}
    }
    handles
}

async fn general_effects_loop(session: SharedSession) {
    let mut ticks = time::interval(GENERAL_EFFECTS_INTERVAL);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks.tick().await;
    loop {
        ticks.tick().await;
        lock(&session).general_effects_tick();
    }
}

async fn disaster_duplication_loop(session: SharedSession) {
    let mut ticks = time::interval(DISASTER_DUPLICATION_INTERVAL);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks.tick().await;
    loop {
        ticks.tick().await;
        lock(&session).disaster_duplication_tick();
    }
}

async fn optimistic_boost_loop(session: SharedSession) {
    let mut ticks = time::interval(OPTIMISTIC_BOOST_INTERVAL);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks.tick().await;
    loop {
        ticks.tick().await;
        lock(&session).optimistic_boost_tick();
    }
}

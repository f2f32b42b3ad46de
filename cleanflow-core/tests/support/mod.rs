#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cleanflow_contracts::{
    Alert, AlertSink, GatewayError, GatewayResult, RemoteStore,
};
use cleanflow_core::{
    DashboardConfig, DashboardRefresher, RunCoordinator, RunWriter,
    SessionStore,
};
use cleanflow_model::{
    ChecklistItem, ChecklistItemID, CleaningProtocol, CleaningRun,
    CleaningStep, DashboardStats, ProtocolID, RunStatus, StepID, User,
};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

#[derive(Debug, Default)]
struct StoreState {
    saved: Vec<CleaningRun>,
    stats: DashboardStats,
    runs_today: Vec<CleaningRun>,
    protocols: Vec<CleaningProtocol>,
    fail_saves: bool,
    fail_stats: bool,
    fail_runs: bool,
    fail_protocols: bool,
    stats_from_saves: bool,
    stats_fetches: usize,
    runs_fetches: usize,
    protocol_fetches: usize,
}

/// In-memory remote store recording every call.
#[derive(Debug, Clone, Default)]
pub struct TestRemoteStore {
    inner: Arc<Mutex<StoreState>>,
    save_gate: Arc<RwLock<()>>,
    fetch_gate: Arc<RwLock<()>>,
}

impl TestRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protocols(protocols: Vec<CleaningProtocol>) -> Self {
        let store = Self::new();
        store.inner.lock().expect("lock poisoned").protocols = protocols;
        store
    }

    pub fn set_stats(&self, stats: DashboardStats) {
        self.inner.lock().expect("lock poisoned").stats = stats;
    }

    pub fn set_runs_today(&self, runs: Vec<CleaningRun>) {
        self.inner.lock().expect("lock poisoned").runs_today = runs;
    }

    /// Compute `completed_today` from the saved runs, like the backend
    /// aggregate does.
    pub fn stats_from_saves(&self, enabled: bool) {
        self.inner.lock().expect("lock poisoned").stats_from_saves = enabled;
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.lock().expect("lock poisoned").fail_saves = fail;
    }

    pub fn fail_stats(&self, fail: bool) {
        self.inner.lock().expect("lock poisoned").fail_stats = fail;
    }

    pub fn fail_lists(&self, fail: bool) {
        let mut guard = self.inner.lock().expect("lock poisoned");
        guard.fail_runs = fail;
        guard.fail_protocols = fail;
    }

    pub fn saved_runs(&self) -> Vec<CleaningRun> {
        self.inner.lock().expect("lock poisoned").saved.clone()
    }

    pub fn last_saved(&self) -> Option<CleaningRun> {
        self.saved_runs().pop()
    }

    /// (stats, runs, protocols) fetch counts
    pub fn fetch_counts(&self) -> (usize, usize, usize) {
        let guard = self.inner.lock().expect("lock poisoned");
        (guard.stats_fetches, guard.runs_fetches, guard.protocol_fetches)
    }

    /// Block every save until the returned guard is dropped.
    pub async fn hold_saves(&self) -> OwnedRwLockWriteGuard<()> {
        self.save_gate.clone().write_owned().await
    }

    /// Block every fetch until the returned guard is dropped.
    pub async fn hold_fetches(&self) -> OwnedRwLockWriteGuard<()> {
        self.fetch_gate.clone().write_owned().await
    }
}

fn simulated() -> GatewayError {
    GatewayError::Network("simulated outage".into())
}

// Fetches read the store when they are issued and only then wait on the
// gate, so a held fetch returns data from before any later save.
#[async_trait]
impl RemoteStore for TestRemoteStore {
    async fn fetch_dashboard_stats(&self) -> GatewayResult<DashboardStats> {
        let result = {
            let mut guard = self.inner.lock().expect("lock poisoned");
            guard.stats_fetches += 1;
            if guard.fail_stats {
                Err(simulated())
            } else if guard.stats_from_saves {
                let completed = guard
                    .saved
                    .iter()
                    .filter(|run| run.status == RunStatus::Completed)
                    .map(|run| run.id)
                    .collect::<HashSet<_>>()
                    .len() as u32;
                Ok(DashboardStats {
                    completed_today: completed,
                    ..guard.stats.clone()
                })
            } else {
                Ok(guard.stats.clone())
            }
        };
        let _gate = self.fetch_gate.read().await;
        result
    }

    async fn fetch_cleaning_runs_today(&self) -> GatewayResult<Vec<CleaningRun>> {
        let result = {
            let mut guard = self.inner.lock().expect("lock poisoned");
            guard.runs_fetches += 1;
            if guard.fail_runs {
                Err(simulated())
            } else {
                Ok(guard.runs_today.clone())
            }
        };
        let _gate = self.fetch_gate.read().await;
        result
    }

    async fn fetch_protocols(&self) -> GatewayResult<Vec<CleaningProtocol>> {
        let result = {
            let mut guard = self.inner.lock().expect("lock poisoned");
            guard.protocol_fetches += 1;
            if guard.fail_protocols {
                Err(simulated())
            } else {
                Ok(guard.protocols.clone())
            }
        };
        let _gate = self.fetch_gate.read().await;
        result
    }

    async fn save_cleaning_run(&self, run: CleaningRun) -> GatewayResult<()> {
        let _gate = self.save_gate.read().await;
        let mut guard = self.inner.lock().expect("lock poisoned");
        if guard.fail_saves {
            return Err(GatewayError::Rejected("simulated rejection".into()));
        }
        guard.saved.push(run);
        Ok(())
    }
}

/// Alert sink that keeps everything it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingAlerts {
    raised: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingAlerts {
    pub fn alerts(&self) -> Vec<Alert> {
        self.raised.lock().expect("lock poisoned").clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.alerts().into_iter().map(|alert| alert.title).collect()
    }
}

impl AlertSink for RecordingAlerts {
    fn raise(&self, alert: Alert) {
        self.raised.lock().expect("lock poisoned").push(alert);
    }
}

pub fn cleaner() -> User {
    User::new("cleaner-1", "Dana Reyes")
}

/// Protocol with `steps` steps of `items` checklist entries each.
pub fn protocol(id: &str, steps: usize, items: usize) -> CleaningProtocol {
    CleaningProtocol {
        id: ProtocolID::from(id),
        name: format!("Protocol {id}"),
        description: None,
        steps: (0..steps)
            .map(|s| CleaningStep {
                id: StepID::from(format!("{id}-step-{s}")),
                name: format!("Step {s}"),
                description: format!("Do step {s}"),
                duration: Duration::from_secs(120),
                checklist: (0..items)
                    .map(|i| ChecklistItem {
                        id: ChecklistItemID::from(format!("{id}-{s}-{i}")),
                        text: format!("Item {i}"),
                        required: true,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn stats(runs_today: u32) -> DashboardStats {
    DashboardStats {
        runs_today,
        completed_today: runs_today,
        average_compliance: 100.0,
        generated_at: Some(Utc::now()),
        ..Default::default()
    }
}

/// Coordinator wired to recording collaborators. Build inside a runtime.
pub struct Harness {
    pub store: TestRemoteStore,
    pub alerts: RecordingAlerts,
    pub session: SessionStore,
    pub dashboard: Arc<DashboardRefresher>,
    pub coordinator: RunCoordinator,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(TestRemoteStore::new(), SessionStore::signed_in(cleaner()))
    }

    pub fn signed_out() -> Self {
        Self::build(TestRemoteStore::new(), SessionStore::new())
    }

    pub fn with_store(store: TestRemoteStore) -> Self {
        Self::build(store, SessionStore::signed_in(cleaner()))
    }

    fn build(store: TestRemoteStore, session: SessionStore) -> Self {
        let alerts = RecordingAlerts::default();
        let remote: Arc<dyn RemoteStore> = Arc::new(store.clone());
        let sink: Arc<dyn AlertSink> = Arc::new(alerts.clone());
        let dashboard = Arc::new(DashboardRefresher::new(
            Arc::clone(&remote),
            session.clone(),
            Arc::clone(&sink),
            DashboardConfig::default(),
        ));
        let writer = RunWriter::spawn(remote, Arc::clone(&sink));
        let coordinator = RunCoordinator::new(
            session.clone(),
            writer,
            Arc::clone(&dashboard),
            sink,
        );

        Self {
            store,
            alerts,
            session,
            dashboard,
            coordinator,
        }
    }
}

//! Dashboard data refresh.
//!
//! Pulls aggregate stats, today's runs and the protocol catalog from the
//! remote store, concurrently, and republishes them as one
//! [`DashboardSnapshot`]. Refreshes are single-flight: a trigger that
//! arrives while one is running is coalesced into it, and the running
//! refresh fetches once more when it finishes so the trigger still sees
//! data issued after it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use cleanflow_contracts::{Alert, AlertSink, RemoteStore};
use cleanflow_model::{CleaningProtocol, CleaningRun, DashboardStats, ProtocolID};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::alerts::titles;
use crate::config::DashboardConfig;
use crate::session::SessionStore;

/// Everything the dashboard renders
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub stats: Option<DashboardStats>,
    pub todays_runs: Vec<CleaningRun>,
    pub protocols: Vec<CleaningProtocol>,
    pub is_loading: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    pub fn protocol(&self, id: &ProtocolID) -> Option<&CleaningProtocol> {
        self.protocols.iter().find(|protocol| &protocol.id == id)
    }
}

/// Which of the three fetches succeeded during a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub stats: bool,
    pub runs: bool,
    pub protocols: bool,
}

impl RefreshReport {
    pub fn all_ok(&self) -> bool {
        self.stats && self.runs && self.protocols
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nobody is signed in, nothing was fetched
    SignedOut,
    /// Another refresh was already running and will fetch again for this
    /// trigger
    Coalesced,
    Refreshed(RefreshReport),
}

pub struct DashboardRefresher {
    store: Arc<dyn RemoteStore>,
    session: SessionStore,
    alerts: Arc<dyn AlertSink>,
    config: DashboardConfig,
    snapshot: watch::Sender<DashboardSnapshot>,
    in_flight: AtomicBool,
    rerun: AtomicBool,
}

impl std::fmt::Debug for DashboardRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardRefresher")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .field("rerun", &self.rerun.load(Ordering::Relaxed))
            .finish()
    }
}

/// Clears the single-flight flag and the loading indicator on every exit
/// path, including cancellation of the refresh future.
struct InFlightGuard<'a> {
    refresher: &'a DashboardRefresher,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.refresher
            .snapshot
            .send_modify(|snapshot| snapshot.is_loading = false);
        self.refresher.in_flight.store(false, Ordering::Release);
    }
}

impl DashboardRefresher {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        session: SessionStore,
        alerts: Arc<dyn AlertSink>,
        config: DashboardConfig,
    ) -> Self {
        let (snapshot, _) = watch::channel(DashboardSnapshot::default());
        Self {
            store,
            session,
            alerts,
            config,
            snapshot,
            in_flight: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Look a protocol up in the last fetched catalog
    pub fn find_protocol(&self, id: &ProtocolID) -> Option<CleaningProtocol> {
        self.snapshot.borrow().protocol(id).cloned()
    }

    /// On-demand refresh.
    pub async fn refresh(&self) -> RefreshOutcome {
        if !self.session.is_signed_in() {
            debug!("dashboard refresh skipped, no signed-in user");
            return RefreshOutcome::SignedOut;
        }

        if !self.claim() {
            self.rerun.store(true, Ordering::Release);
            // the running refresh may have released the flag in between
            if !self.claim() {
                debug!("dashboard refresh already running, coalescing");
                return RefreshOutcome::Coalesced;
            }
        }

        loop {
            let report = {
                let _guard = InFlightGuard { refresher: self };
                self.rerun.store(false, Ordering::Release);
                self.fetch_all().await
            };

            // The flag is released before checking for coalesced triggers,
            // so a trigger arriving now either set `rerun` or claims itself.
            if !self.rerun.load(Ordering::Acquire)
                || !self.session.is_signed_in()
                || !self.claim()
            {
                return RefreshOutcome::Refreshed(report);
            }
            debug!("dashboard refresh requested while fetching, fetching again");
        }
    }

    fn claim(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    async fn fetch_all(&self) -> RefreshReport {
        self.snapshot
            .send_modify(|snapshot| snapshot.is_loading = true);

        let (stats, runs, protocols) = tokio::join!(
            self.store.fetch_dashboard_stats(),
            self.store.fetch_cleaning_runs_today(),
            self.store.fetch_protocols(),
        );

        let report = RefreshReport {
            stats: stats.is_ok(),
            runs: runs.is_ok(),
            protocols: protocols.is_ok(),
        };

        match stats {
            Ok(stats) => self
                .snapshot
                .send_modify(|snapshot| snapshot.stats = Some(stats)),
            Err(err) => {
                warn!(error = %err, "failed to fetch dashboard stats");
                self.alerts.raise(Alert::new(
                    titles::DASHBOARD_UNAVAILABLE,
                    format!("Could not load dashboard statistics: {err}"),
                ));
            }
        }

        match runs {
            Ok(runs) => self
                .snapshot
                .send_modify(|snapshot| snapshot.todays_runs = runs),
            Err(err) => {
                warn!(error = %err, "failed to fetch today's runs");
                if self.config.alert_on_list_failures {
                    self.alerts.raise(Alert::new(
                        titles::DASHBOARD_UNAVAILABLE,
                        format!("Could not load today's cleaning runs: {err}"),
                    ));
                }
            }
        }

        match protocols {
            Ok(protocols) => self
                .snapshot
                .send_modify(|snapshot| snapshot.protocols = protocols),
            Err(err) => {
                warn!(error = %err, "failed to fetch protocols");
                if self.config.alert_on_list_failures {
                    self.alerts.raise(Alert::new(
                        titles::DASHBOARD_UNAVAILABLE,
                        format!("Could not load cleaning protocols: {err}"),
                    ));
                }
            }
        }

        self.snapshot
            .send_modify(|snapshot| snapshot.last_refreshed = Some(Utc::now()));
        debug!(?report, "dashboard refreshed");
        report
    }

    /// Start the periodic refresh loop. The first refresh happens
    /// immediately. The loop stops when the handle is shut down or dropped.
    pub fn spawn_periodic(self: &Arc<Self>) -> RefreshHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let refresher = Arc::clone(self);
        let period = self.config.refresh_interval();

        let task = tokio::spawn(async move {
            info!(?period, "dashboard refresh loop started");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        refresher.refresh().await;
                    }
                }
            }
            info!("dashboard refresh loop stopped");
        });

        RefreshHandle {
            token,
            task: Some(task),
        }
    }
}

/// Owner of the periodic refresh task
#[derive(Debug)]
pub struct RefreshHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Stop the loop and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

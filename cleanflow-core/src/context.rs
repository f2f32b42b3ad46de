use std::sync::Arc;

use cleanflow_contracts::{AlertSink, RemoteStore};
use tracing::info;

use crate::config::CleanFlowConfig;
use crate::coordinator::RunCoordinator;
use crate::dashboard::{DashboardRefresher, RefreshHandle};
use crate::session::SessionStore;
use crate::writer::RunWriter;

/// Explicit session context handed to every layer that needs the core.
///
/// Building it spawns the run writer and starts the periodic dashboard
/// refresh; [`CleanFlowContext::shutdown`] stops both cleanly.
#[derive(Debug)]
pub struct CleanFlowContext {
    session: SessionStore,
    dashboard: Arc<DashboardRefresher>,
    coordinator: Arc<RunCoordinator>,
    refresh: RefreshHandle,
}

impl CleanFlowContext {
    /// Must be called from within a tokio runtime.
    pub fn start(
        store: Arc<dyn RemoteStore>,
        alerts: Arc<dyn AlertSink>,
        session: SessionStore,
        config: &CleanFlowConfig,
    ) -> Self {
        let dashboard = Arc::new(DashboardRefresher::new(
            Arc::clone(&store),
            session.clone(),
            Arc::clone(&alerts),
            config.dashboard.clone(),
        ));
        let writer = RunWriter::spawn(store, Arc::clone(&alerts));
        let coordinator = Arc::new(RunCoordinator::new(
            session.clone(),
            writer,
            Arc::clone(&dashboard),
            alerts,
        ));
        let refresh = dashboard.spawn_periodic();
        info!("clean-flow context started");

        Self {
            session,
            dashboard,
            coordinator,
            refresh,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn dashboard(&self) -> &Arc<DashboardRefresher> {
        &self.dashboard
    }

    pub fn coordinator(&self) -> &Arc<RunCoordinator> {
        &self.coordinator
    }

    /// Stop the refresh loop and wait for queued run writes to land.
    pub async fn shutdown(self) {
        self.refresh.shutdown().await;
        self.coordinator.flush().await;
        info!("clean-flow context stopped");
    }
}

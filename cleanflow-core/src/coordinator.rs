//! Cleaning-run lifecycle.
//!
//! The coordinator owns the single active run of a session and is the only
//! place that mutates it. Every operation takes the slot lock, so rapid
//! repeated triggers are applied one after another and can never skip or
//! double-complete a step.
//!
//! Local state is authoritative: transitions are applied before the remote
//! store has confirmed anything, and a failed write only produces an alert.
//!
//! ```text
//! none --start--> in_progress --last step--> completed --> none
//!                      |
//!                      +--------cancel-----> failed ----> none
//! ```

use std::sync::Arc;

use chrono::Utc;
use cleanflow_contracts::{Alert, AlertSink};
use cleanflow_model::{
    AreaID, CleaningProtocol, CleaningRun, CompletedStep, RunStatus,
    ScanRecord, ScanSource,
};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::alerts::titles;
use crate::dashboard::DashboardRefresher;
use crate::navigation::Tab;
use crate::session::SessionStore;
use crate::writer::{RunWriter, WriteIntent};

/// Note stored on runs ended through [`RunCoordinator::cancel`]
pub const CANCELLATION_NOTE: &str = "Cancelled by user";

/// The run being worked on together with the index of the next step
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRun {
    pub run: CleaningRun,
    pub cursor: usize,
}

impl ActiveRun {
    pub fn current_step(&self) -> Option<&CompletedStep> {
        self.run.step(self.cursor)
    }
}

/// Why an operation left state untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    SignedOut,
    NoActiveRun,
    CursorOutOfRange,
    /// NFC records name an asset, not a protocol
    NoProtocolOnTag,
    UnknownProtocol,
}

/// Result of a lifecycle operation
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Ignored(IgnoredReason),
    Started(CleaningRun),
    /// `step` was completed and the cursor moved to `cursor`
    Advanced { step: usize, cursor: usize },
    /// The last step was completed. `persisted` reports whether the final
    /// write reached the store.
    Completed { run: CleaningRun, persisted: bool },
    Cancelled(CleaningRun),
    Annotated { step: usize },
}

impl Transition {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Transition::Ignored(_))
    }
}

#[derive(Debug, Default)]
struct RunSlot {
    active: Option<CleaningRun>,
    cursor: usize,
}

impl RunSlot {
    fn view(&self) -> Option<ActiveRun> {
        self.active.as_ref().map(|run| ActiveRun {
            run: run.clone(),
            cursor: self.cursor,
        })
    }

    fn clear(&mut self) {
        self.active = None;
        self.cursor = 0;
    }
}

pub struct RunCoordinator {
    session: SessionStore,
    writer: RunWriter,
    dashboard: Arc<DashboardRefresher>,
    alerts: Arc<dyn AlertSink>,
    slot: Mutex<RunSlot>,
    published: watch::Sender<Option<ActiveRun>>,
    tab: watch::Sender<Tab>,
}

impl std::fmt::Debug for RunCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCoordinator")
            .field("session", &self.session)
            .field("writer", &self.writer)
            .field("active", &self.published.borrow().as_ref().map(|a| a.run.id))
            .field("tab", &*self.tab.borrow())
            .finish_non_exhaustive()
    }
}

impl RunCoordinator {
    pub fn new(
        session: SessionStore,
        writer: RunWriter,
        dashboard: Arc<DashboardRefresher>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let (published, _) = watch::channel(None);
        let (tab, _) = watch::channel(Tab::default());
        Self {
            session,
            writer,
            dashboard,
            alerts,
            slot: Mutex::new(RunSlot::default()),
            published,
            tab,
        }
    }

    // ===== Observation =====

    pub fn active_run(&self) -> Option<ActiveRun> {
        self.published.borrow().clone()
    }

    pub fn cursor(&self) -> usize {
        self.published
            .borrow()
            .as_ref()
            .map(|active| active.cursor)
            .unwrap_or(0)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveRun>> {
        self.published.subscribe()
    }

    pub fn selected_tab(&self) -> Tab {
        *self.tab.borrow()
    }

    pub fn select_tab(&self, tab: Tab) {
        self.tab.send_replace(tab);
    }

    pub fn subscribe_tab(&self) -> watch::Receiver<Tab> {
        self.tab.subscribe()
    }

    /// Wait until every write queued so far has reached the store.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    // ===== Lifecycle =====

    /// Start a manually verified run of `protocol` in the given area.
    pub async fn start(
        &self,
        protocol: &CleaningProtocol,
        area_id: impl Into<AreaID>,
        area_name: impl Into<String>,
    ) -> Transition {
        self.begin(protocol, area_id.into(), area_name.into(), None)
            .await
    }

    /// Start a run of `protocol` in the area named by a decoded tag.
    pub async fn start_scanned(
        &self,
        protocol: &CleaningProtocol,
        record: &ScanRecord,
        area_name: impl Into<String>,
    ) -> Transition {
        self.begin(
            protocol,
            record.area_id.clone(),
            area_name.into(),
            Some(record.source),
        )
        .await
    }

    /// Start the run a QR code asks for, resolving its protocol id against
    /// the last fetched catalog.
    pub async fn start_from_scan(
        &self,
        record: &ScanRecord,
        area_name: impl Into<String>,
    ) -> Transition {
        if !self.session.is_signed_in() {
            debug!("start ignored, no signed-in user");
            return Transition::Ignored(IgnoredReason::SignedOut);
        }

        let Some(protocol_id) = record.protocol_id() else {
            debug!(area_id = %record.area_id, "tag carries no protocol");
            self.alerts.raise(Alert::new(
                titles::UNKNOWN_PROTOCOL,
                format!(
                    "The tag for area {} does not name a cleaning protocol, pick one from the list",
                    record.area_id
                ),
            ));
            return Transition::Ignored(IgnoredReason::NoProtocolOnTag);
        };

        let Some(protocol) = self.dashboard.find_protocol(protocol_id) else {
            warn!(%protocol_id, "scanned protocol is not in the catalog");
            self.alerts.raise(Alert::new(
                titles::UNKNOWN_PROTOCOL,
                format!("No cleaning protocol matches code {protocol_id}"),
            ));
            return Transition::Ignored(IgnoredReason::UnknownProtocol);
        };

        self.start_scanned(&protocol, record, area_name).await
    }

    async fn begin(
        &self,
        protocol: &CleaningProtocol,
        area_id: AreaID,
        area_name: String,
        scan_source: Option<ScanSource>,
    ) -> Transition {
        let Some(cleaner) = self.session.current_user() else {
            debug!("start ignored, no signed-in user");
            return Transition::Ignored(IgnoredReason::SignedOut);
        };

        let run = CleaningRun::begin(
            protocol,
            area_id,
            area_name,
            &cleaner,
            scan_source,
            Utc::now(),
        );

        let mut slot = self.slot.lock().await;
        if let Some(abandoned) = slot
            .active
            .replace(run.clone())
            .filter(|abandoned| !abandoned.is_terminal())
        {
            warn!(
                run_id = %abandoned.id,
                "replacing an unfinished run, it stays in progress remotely"
            );
        }
        slot.cursor = 0;
        self.published.send_replace(slot.view());
        self.tab.send_replace(Tab::Protocols);

        info!(
            run_id = %run.id,
            area_id = %run.area_id,
            protocol = %run.protocol_id,
            steps = run.total_steps(),
            "cleaning run started"
        );
        self.writer.submit(run.clone(), WriteIntent::Start);
        Transition::Started(run)
    }

    /// Complete the step under the cursor together with its whole
    /// checklist, then advance. Completing the last step completes the run.
    pub async fn complete_current_step(&self) -> Transition {
        let mut slot = self.slot.lock().await;
        let RunSlot { active, cursor } = &mut *slot;

        let Some(run) = active.as_mut().filter(|run| !run.is_terminal()) else {
            debug!("complete step ignored, no active run");
            return Transition::Ignored(IgnoredReason::NoActiveRun);
        };
        let index = *cursor;
        if index >= run.steps.len() {
            debug!(
                run_id = %run.id,
                cursor = index,
                "complete step ignored, cursor out of range"
            );
            return Transition::Ignored(IgnoredReason::CursorOutOfRange);
        }

        let completer =
            self.session.current_user().map(|user| user.display_name);
        let step = &mut run.steps[index];
        step.complete(Utc::now(), completer);
        info!(run_id = %run.id, step = index, name = %step.name, "step completed");
        self.writer.submit(run.clone(), WriteIntent::StepUpdate);

        if index + 1 < run.steps.len() {
            *cursor += 1;
            let next = *cursor;
            self.published.send_replace(slot.view());
            return Transition::Advanced {
                step: index,
                cursor: next,
            };
        }

        run.end_time = Some(Utc::now());
        run.status = RunStatus::Completed;
        let score = run.compute_compliance_score();
        run.compliance_score = Some(score);
        let finished = run.clone();
        self.published.send_replace(slot.view());
        // The terminal run stays visible until its write resolves, but
        // other operations treat it as gone and may proceed meanwhile.
        drop(slot);

        let persisted = self
            .writer
            .save_and_wait(finished.clone(), WriteIntent::Completion)
            .await
            .is_ok();

        let mut slot = self.slot.lock().await;
        if slot.active.as_ref().is_some_and(|run| run.id == finished.id) {
            slot.clear();
            self.published.send_replace(None);
        }
        drop(slot);

        info!(run_id = %finished.id, score, persisted, "cleaning run completed");
        if persisted {
            self.alerts.raise(Alert::new(
                titles::RUN_COMPLETED,
                format!(
                    "{} in {} is complete with {:.0}% compliance",
                    finished.protocol_name, finished.area_name, score
                ),
            ));
            self.dashboard.refresh().await;
        }

        Transition::Completed {
            run: finished,
            persisted,
        }
    }

    /// Attach notes to the step under the cursor.
    pub async fn annotate_current_step(&self, notes: impl Into<String>) -> Transition {
        let mut slot = self.slot.lock().await;
        let RunSlot { active, cursor } = &mut *slot;

        let Some(run) = active.as_mut().filter(|run| !run.is_terminal()) else {
            return Transition::Ignored(IgnoredReason::NoActiveRun);
        };
        let index = *cursor;
        if index >= run.steps.len() {
            return Transition::Ignored(IgnoredReason::CursorOutOfRange);
        }

        run.steps[index].notes = Some(notes.into());
        self.writer.submit(run.clone(), WriteIntent::Annotation);
        self.published.send_replace(slot.view());
        Transition::Annotated { step: index }
    }

    /// Abandon the active run. The slot is cleared before the write is
    /// queued, and no compliance score is computed.
    pub async fn cancel(&self) -> Transition {
        let mut slot = self.slot.lock().await;
        let Some(mut run) = slot.active.take_if(|run| !run.is_terminal()) else {
            debug!("cancel ignored, no active run");
            return Transition::Ignored(IgnoredReason::NoActiveRun);
        };
        slot.clear();
        self.published.send_replace(None);
        drop(slot);

        run.end_time = Some(Utc::now());
        run.status = RunStatus::Failed;
        run.notes = Some(CANCELLATION_NOTE.to_string());

        info!(
            run_id = %run.id,
            completed_steps = run.completed_step_count(),
            total_steps = run.total_steps(),
            "cleaning run cancelled"
        );
        self.writer.submit(run.clone(), WriteIntent::Cancellation);
        Transition::Cancelled(run)
    }
}

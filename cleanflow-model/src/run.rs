use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{
    AreaID, ChecklistItemID, CompletedItemID, CompletedStepID, ProtocolID,
    RunID, StepID, UserID,
};
use crate::protocol::{CleaningProtocol, CleaningStep};
use crate::scan::ScanSource;
use crate::user::User;

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RunStatus {
    InProgress,
    Completed,
    Failed,
}

impl RunStatus {
    /// Terminal runs are immutable history
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// How the cleaner proved presence in the area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VerificationMethod {
    #[default]
    Manual,
    QrCode,
    Nfc,
}

impl From<ScanSource> for VerificationMethod {
    fn from(source: ScanSource) -> Self {
        match source {
            ScanSource::Qr => VerificationMethod::QrCode,
            ScanSource::Nfc => VerificationMethod::Nfc,
        }
    }
}

/// One execution of a protocol against an area.
///
/// The `steps` vector mirrors the source protocol 1:1 and is never resized
/// after [`CleaningRun::begin`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CleaningRun {
    pub id: RunID,
    pub protocol_id: ProtocolID,
    pub protocol_name: String,
    pub cleaner_id: UserID,
    pub cleaner_name: String,
    pub area_id: AreaID,
    pub area_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub verification_method: VerificationMethod,
    pub scan_source: Option<ScanSource>,
    pub steps: Vec<CompletedStep>,
    pub notes: Option<String>,
    pub auditor_id: Option<UserID>,
    /// Percentage in 0..=100, only present on completed runs
    pub compliance_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl CleaningRun {
    /// Materialize a fresh in-progress run from a protocol template.
    pub fn begin(
        protocol: &CleaningProtocol,
        area_id: AreaID,
        area_name: impl Into<String>,
        cleaner: &User,
        scan_source: Option<ScanSource>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RunID::new(),
            protocol_id: protocol.id.clone(),
            protocol_name: protocol.name.clone(),
            cleaner_id: cleaner.id.clone(),
            cleaner_name: cleaner.display_name.clone(),
            area_id,
            area_name: area_name.into(),
            start_time: now,
            end_time: None,
            status: RunStatus::InProgress,
            verification_method: scan_source
                .map(VerificationMethod::from)
                .unwrap_or_default(),
            scan_source,
            steps: protocol.steps.iter().map(CompletedStep::pending).collect(),
            notes: None,
            auditor_id: None,
            compliance_score: None,
            created_at: now,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn completed_step_count(&self) -> usize {
        self.steps.iter().filter(|step| step.completed).count()
    }

    pub fn step(&self, index: usize) -> Option<&CompletedStep> {
        self.steps.get(index)
    }

    /// Fraction of completed steps in 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 1.0;
        }
        self.completed_step_count() as f64 / self.total_steps() as f64
    }

    /// Completed steps over total steps, as a percentage. An empty protocol
    /// scores 100.
    pub fn compute_compliance_score(&self) -> f64 {
        self.progress() * 100.0
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Runtime instance of a protocol step
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompletedStep {
    pub id: CompletedStepID,
    pub step_id: StepID,
    pub name: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub notes: Option<String>,
    pub checklist_items: Vec<CompletedChecklistItem>,
}

impl CompletedStep {
    fn pending(step: &CleaningStep) -> Self {
        Self {
            id: CompletedStepID::new(),
            step_id: step.id.clone(),
            name: step.name.clone(),
            completed: false,
            completed_at: None,
            completed_by: None,
            notes: None,
            checklist_items: step
                .checklist
                .iter()
                .map(|item| CompletedChecklistItem::pending(item.id.clone()))
                .collect(),
        }
    }

    /// Mark the step and every checklist item in it as done at `at`.
    pub fn complete(&mut self, at: DateTime<Utc>, by: Option<String>) {
        self.completed = true;
        self.completed_at = Some(at);
        self.completed_by = by;
        for item in &mut self.checklist_items {
            item.completed = true;
            item.completed_at = Some(at);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompletedChecklistItem {
    pub id: CompletedItemID,
    pub checklist_item_id: ChecklistItemID,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CompletedChecklistItem {
    fn pending(checklist_item_id: ChecklistItemID) -> Self {
        Self {
            id: CompletedItemID::new(),
            checklist_item_id,
            completed: false,
            completed_at: None,
        }
    }
}

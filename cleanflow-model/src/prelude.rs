//! Snapshot of the types surface for coordinator and UI layers.

pub use super::dashboard::DashboardStats;
pub use super::ids::{AreaID, ProtocolID, RunID, StepID, UserID};
pub use super::protocol::{ChecklistItem, CleaningProtocol, CleaningStep};
pub use super::run::{
    CleaningRun, CompletedChecklistItem, CompletedStep, RunStatus,
    VerificationMethod,
};
pub use super::scan::{ScanRecord, ScanSource, TagPayload};
pub use super::user::User;

//! Core data model definitions shared across Clean-Flow crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod dashboard;
pub mod ids;
pub mod prelude;
pub mod protocol;
pub mod run;
pub mod scan;
pub mod user;

pub use dashboard::DashboardStats;
pub use ids::{
    AreaID, ChecklistItemID, CompletedItemID, CompletedStepID, ProtocolID,
    RunID, StepID, UserID,
};
pub use protocol::{ChecklistItem, CleaningProtocol, CleaningStep};
pub use run::{
    CleaningRun, CompletedChecklistItem, CompletedStep, RunStatus,
    VerificationMethod,
};
pub use scan::{ScanRecord, ScanSource, TagPayload};
pub use user::User;

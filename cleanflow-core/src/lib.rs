//! # Clean-Flow Core
//!
//! Client-side core of the Clean-Flow cleaning compliance app: staff scan
//! a QR code or NFC tag to identify an area, work through a cleaning
//! protocol step by step, and every transition is recorded in the hosted
//! document store for audit and dashboard reporting.
//!
//! ## Architecture
//!
//! - [`decoder`]: turns raw QR/NFC payloads into [`cleanflow_model::ScanRecord`]s
//! - [`coordinator`]: owns the active run and its lifecycle
//! - [`writer`]: ordered, non-blocking persistence of runs
//! - [`dashboard`]: concurrent dashboard fetches, on demand and periodic
//! - [`session`]: signed-in user state
//! - [`context`]: wires the above together for one app session
//!
//! The backend, camera and NFC hardware are reached only through the traits
//! in `cleanflow-contracts`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cleanflow_contracts::RemoteStore;
//! use cleanflow_core::{
//!     alerts::alert_channel, config::CleanFlowConfig, context::CleanFlowContext,
//!     decoder::decode_qr, session::SessionStore,
//! };
//! use cleanflow_model::User;
//!
//! async fn scan_and_start(store: Arc<dyn RemoteStore>) -> anyhow::Result<()> {
//!     let (config, _) = CleanFlowConfig::load_from_env()?;
//!     let (alerts, _receiver) = alert_channel();
//!     let session = SessionStore::signed_in(User::new("u-1", "Dana"));
//!     let ctx = CleanFlowContext::start(store, Arc::new(alerts), session, &config);
//!
//!     ctx.dashboard().refresh().await;
//!     if let Ok(record) = decode_qr("CF-AREA-ICU04-PROTOCOL-terminal").into_record() {
//!         ctx.coordinator().start_from_scan(&record, "ICU bay 4").await;
//!     }
//!     ctx.shutdown().await;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]

pub mod alerts;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod dashboard;
pub mod decoder;
pub mod navigation;
pub mod session;
pub mod telemetry;
pub mod writer;

pub use config::{CleanFlowConfig, ConfigSource, DashboardConfig};
pub use context::CleanFlowContext;
pub use coordinator::{
    ActiveRun, CANCELLATION_NOTE, IgnoredReason, RunCoordinator, Transition,
};
pub use dashboard::{
    DashboardRefresher, DashboardSnapshot, RefreshHandle, RefreshOutcome,
    RefreshReport,
};
pub use decoder::{InvalidTag, TagDecode};
pub use navigation::Tab;
pub use session::{SessionState, SessionStore};
pub use writer::{RunWriter, WriteIntent};

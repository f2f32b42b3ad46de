//! Trait surfaces that describe the collaborators the Clean-Flow core talks
//! to: the hosted document store, the QR/NFC hardware, and the user-facing
//! alert channel.

pub mod alert;
pub mod scan;
pub mod store;

pub use alert::{Alert, AlertSink};
pub use scan::{ScanError, ScanProvider};
pub use store::{GatewayError, GatewayResult, RemoteStore};

/// Frequently used trait combinators for coordinator and UI crates.
pub mod prelude {
    pub use super::alert::{Alert, AlertSink};
    pub use super::scan::{ScanError, ScanProvider};
    pub use super::store::{GatewayError, GatewayResult, RemoteStore};
}

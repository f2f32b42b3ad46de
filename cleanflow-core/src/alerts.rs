use cleanflow_contracts::{Alert, AlertSink};
use tokio::sync::mpsc;
use tracing::warn;

pub type AlertReceiver = mpsc::UnboundedReceiver<Alert>;

/// Titles used for alerts raised by the core
pub mod titles {
    pub const SAVE_FAILED: &str = "Save Failed";
    pub const RUN_COMPLETION_FAILED: &str = "Completion Not Saved";
    pub const DASHBOARD_UNAVAILABLE: &str = "Dashboard Unavailable";
    pub const UNKNOWN_PROTOCOL: &str = "Unknown Protocol";
    pub const RUN_COMPLETED: &str = "Run Completed";
}

/// Forwards alerts to whatever presents them (UI toast, CLI printer, ...)
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    sender: mpsc::UnboundedSender<Alert>,
}

pub fn alert_channel() -> (ChannelAlertSink, AlertReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelAlertSink { sender }, receiver)
}

impl AlertSink for ChannelAlertSink {
    fn raise(&self, alert: Alert) {
        if let Err(err) = self.sender.send(alert) {
            warn!(alert = %err.0, "alert dropped, no presenter attached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn alerts_arrive_in_order() {
        let (sink, mut rx) = alert_channel();
        sink.raise(Alert::new("A", "first"));
        sink.raise(Alert::new("B", "second"));

        assert_eq!(rx.recv().await.map(|a| a.title), Some("A".into()));
        assert_eq!(rx.recv().await.map(|a| a.message), Some("second".into()));
    }

    #[test]
    fn raising_without_presenter_is_harmless() {
        let (sink, rx) = alert_channel();
        drop(rx);
        sink.raise(Alert::new("Lost", "nobody listens"));
    }
}

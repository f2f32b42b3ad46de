use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aggregate compliance figures computed by the backend for the dashboard
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DashboardStats {
    pub runs_today: u32,
    pub completed_today: u32,
    pub failed_today: u32,
    pub in_progress: u32,
    /// Mean compliance score of today's completed runs, 0..=100
    pub average_compliance: f64,
    pub areas_cleaned: u32,
    pub generated_at: Option<DateTime<Utc>>,
}

impl DashboardStats {
    /// Share of finished runs that completed rather than failed, 0..=100
    pub fn completion_rate(&self) -> f64 {
        let finished = self.completed_today + self.failed_today;
        if finished == 0 {
            return 0.0;
        }
        f64::from(self.completed_today) / f64::from(finished) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_rate_ignores_open_runs() {
        let stats = DashboardStats {
            runs_today: 5,
            completed_today: 3,
            failed_today: 1,
            in_progress: 1,
            ..Default::default()
        };
        assert_eq!(stats.completion_rate(), 75.0);
        assert_eq!(DashboardStats::default().completion_rate(), 0.0);
    }
}

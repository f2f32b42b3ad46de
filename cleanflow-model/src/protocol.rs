use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{ChecklistItemID, ProtocolID, StepID};

/// Ordered cleaning template authored by administrators.
///
/// Protocols are read-only for the client: they are fetched from the
/// remote store and used as the blueprint when a run is started.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CleaningProtocol {
    pub id: ProtocolID,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    pub steps: Vec<CleaningStep>,
}

impl CleaningProtocol {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Sum of the estimated durations of every step
    pub fn estimated_duration(&self) -> Duration {
        self.steps.iter().map(|step| step.duration).sum()
    }
}

/// One step of a protocol template
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CleaningStep {
    pub id: StepID,
    pub name: String,
    pub description: String,
    /// Estimated time the step takes
    pub duration: Duration,
    #[cfg_attr(feature = "serde", serde(default))]
    pub checklist: Vec<ChecklistItem>,
}

impl CleaningStep {
    pub fn checklist_texts(&self) -> impl Iterator<Item = &str> {
        self.checklist.iter().map(|item| item.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChecklistItem {
    pub id: ChecklistItemID,
    pub text: String,
    #[cfg_attr(feature = "serde", serde(default = "required_by_default"))]
    pub required: bool,
}

#[cfg(feature = "serde")]
fn required_by_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str, secs: u64) -> CleaningStep {
        CleaningStep {
            id: StepID::from(id),
            name: id.to_uppercase(),
            description: String::new(),
            duration: Duration::from_secs(secs),
            checklist: vec![ChecklistItem {
                id: ChecklistItemID::from(format!("{id}-a")),
                text: format!("{id} surfaces"),
                required: true,
            }],
        }
    }

    #[test]
    fn estimated_duration_sums_steps() {
        let protocol = CleaningProtocol {
            id: ProtocolID::from("terminal-clean"),
            name: "Terminal clean".into(),
            description: None,
            steps: vec![step("dust", 120), step("wipe", 300)],
        };

        assert_eq!(protocol.step_count(), 2);
        assert_eq!(protocol.estimated_duration(), Duration::from_secs(420));
        assert_eq!(
            protocol.steps[1].checklist_texts().collect::<Vec<_>>(),
            vec!["wipe surfaces"]
        );
    }
}

//! Renderer-facing view of a sequencer's state.

use crate::step::{Step, StepStatus};
use serde::{Deserialize, Serialize};

/// What caused a snapshot to be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// The state a sequencer was created in; never passed to observers.
    Initial,
    /// Automatic advancement was switched on.
    Started,
    /// Automatic advancement was switched off, by `stop()` or a toggling `start()`.
    Paused,
    /// A tick moved to the next step.
    Advanced,
    /// A tick on the last step rewound to the first step and stopped.
    Wrapped,
    /// `reset()` rewound to the first step.
    Reset,
    /// `go_to()` jumped to a step.
    Jumped,
}

/// Everything a renderer needs to draw the current state.
///
/// Owned and cheap to clone, so it can be handed to observers, pushed
/// through a `watch` channel, or serialised as a JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerSnapshot {
    /// 0-based index of the active step.
    pub current_index: usize,
    /// Number of steps in the catalog (≥ 1).
    pub step_count: usize,
    /// Whether automatic advancement is active.
    pub running: bool,
    /// The active step.
    pub step: Step,
    /// `(current_index + 1) / step_count`, in `(0, 1]`.
    pub progress: f64,
    /// The operation that produced this snapshot.
    pub transition: Transition,
}

impl SequencerSnapshot {
    /// Progress as a whole percentage, rounded to nearest.
    pub fn progress_percent(&self) -> u32 {
        (self.progress * 100.0).round() as u32
    }

    /// Status of step `index` relative to the active one.
    pub fn status_of(&self, index: usize) -> StepStatus {
        StepStatus::of(index, self.current_index)
    }

    /// True on the last step of the catalog.
    pub fn is_last_step(&self) -> bool {
        self.current_index + 1 == self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(current_index: usize, step_count: usize) -> SequencerSnapshot {
        SequencerSnapshot {
            current_index,
            step_count,
            running: false,
            step: Step {
                index: current_index,
                title: format!("S{current_index}"),
                description: String::new(),
                details: String::new(),
            },
            progress: (current_index + 1) as f64 / step_count as f64,
            transition: Transition::Initial,
        }
    }

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(snapshot(0, 6).progress_percent(), 17);
        assert_eq!(snapshot(1, 6).progress_percent(), 33);
        assert_eq!(snapshot(2, 6).progress_percent(), 50);
        assert_eq!(snapshot(5, 6).progress_percent(), 100);
    }

    #[test]
    fn last_step_detection() {
        assert!(!snapshot(4, 6).is_last_step());
        assert!(snapshot(5, 6).is_last_step());
        assert!(snapshot(0, 1).is_last_step());
    }

    #[test]
    fn serialises_transition_as_snake_case() {
        let mut s = snapshot(3, 6);
        s.transition = Transition::Jumped;
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["transition"], "jumped");
        assert_eq!(json["current_index"], 3);
        assert_eq!(json["step"]["title"], "S3");
    }
}

//! Step records and their display status.

use serde::{Deserialize, Serialize};

/// One immutable named stage of a workflow.
///
/// `index` is the step's identity: its position in the catalog it belongs
/// to. Steps are created by [`crate::catalog::StepCatalog`] and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 0-based position in the catalog.
    pub index: usize,
    /// Short name shown on the step card, e.g. "OCR Processing".
    pub title: String,
    /// One-line summary shown under the title.
    pub description: String,
    /// Longer explanation shown in the detail panel for the active step.
    pub details: String,
}

impl Step {
    /// 1-based step number, as presented to users ("Step 3: …").
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Where a step stands relative to the sequencer's current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Before the current step; rendered with a completion marker.
    Completed,
    /// The current step; rendered highlighted with its details.
    Active,
    /// After the current step.
    Pending,
}

impl StepStatus {
    /// Classify `index` against the current position.
    pub fn of(index: usize, current_index: usize) -> Self {
        use std::cmp::Ordering;
        match index.cmp(&current_index) {
            Ordering::Less => StepStatus::Completed,
            Ordering::Equal => StepStatus::Active,
            Ordering::Greater => StepStatus::Pending,
        }
    }

    /// Single-character marker used by the terminal player.
    pub fn marker(self) -> char {
        match self {
            StepStatus::Completed => '✓',
            StepStatus::Active => '▶',
            StepStatus::Pending => '·',
        }
    }
}

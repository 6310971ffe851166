//! Error type for the workflow-player library.
//!
//! Playback itself has exactly one failure mode: a jump to a step that does
//! not exist ([`SequencerError::InvalidIndex`]). It is a caller contract
//! violation, reported synchronously and never clamped, so a renderer that
//! hands out a bad index finds out in its own tests.
//!
//! Every other variant belongs to construction time: loading and validating
//! a step catalog, building a [`crate::config::SequencerConfig`], or creating
//! a [`crate::sequencer::Sequencer`] outside a Tokio runtime. Once a
//! sequencer exists, `start`, `stop`, `reset` and the accessors cannot fail.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the workflow-player library.
#[derive(Debug, Error)]
pub enum SequencerError {
    // ── Playback errors ───────────────────────────────────────────────────
    /// A jump target outside `0..step_count`.
    #[error("Step index {index} is out of range (workflow has {step_count} steps)")]
    InvalidIndex { index: usize, step_count: usize },

    // ── Catalog errors ────────────────────────────────────────────────────
    /// A step catalog must contain at least one step.
    #[error("Step catalog is empty; a workflow needs at least one step")]
    EmptyCatalog,

    /// A step in the catalog failed validation.
    #[error("Invalid step catalog: {0}")]
    InvalidCatalog(String),

    /// The catalog file could not be read.
    #[error("Failed to read step catalog '{path}': {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not a JSON array of steps.
    #[error("Failed to parse step catalog: {source}\nExpected a JSON array of {{\"title\", \"description\", \"details\"}} objects.")]
    CatalogParse {
        #[source]
        source: serde_json::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No Tokio runtime was available to host the tick task.
    #[error("No Tokio runtime available: create the sequencer inside a runtime or pass a handle to the config builder")]
    NoRuntime,
}

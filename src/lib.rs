//! # workflow-player
//!
//! Guided step playback for animated workflow diagrams.
//!
//! A workflow diagram shows a fixed sequence of stages as cards: the active
//! card is highlighted, the ones before it carry a completion mark, a detail
//! panel describes the active stage, and a progress bar fills as playback
//! moves on. This crate is the logic behind that diagram with the drawing
//! taken out: a [`Sequencer`] that advances through a [`StepCatalog`] every
//! two seconds, can be paused, reset or sent to any step, and reports each
//! change to whatever renders it.
//!
//! ## Playback
//!
//! ```text
//!  start ─▶ S0 ──2s──▶ S1 ──2s──▶ … ──2s──▶ Sn-1 ──2s──▶ S0 (stopped)
//!           ▲                                              │
//!           └──────── wrap-and-stop: no endless loop ──────┘
//! ```
//!
//! `start()` toggles: pressing play while playing pauses. `reset()` and
//! `go_to(i)` always leave the sequencer stopped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use workflow_player::{Sequencer, SequencerConfig, StepCatalog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let seq = Sequencer::new(
//!         StepCatalog::pdf_translation_workflow(),
//!         &SequencerConfig::default(),
//!     )?;
//!     seq.start();
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!     println!(
//!         "Step {}: {} ({:.0}%)",
//!         seq.current_index() + 1,
//!         seq.current_step().title,
//!         seq.progress_fraction() * 100.0
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Renderers
//!
//! Two ways to follow the state, pick whichever fits the host:
//!
//! | API | Style |
//! |-----|-------|
//! | [`SequencerObserver`] via [`SequencerConfigBuilder::observer`] | push, one call per change |
//! | [`snapshot_stream`] / [`Sequencer::subscribe`] | pull, latest state wins |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `workflow-player` terminal binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod error;
pub mod observer;
pub mod sequencer;
pub mod snapshot;
pub mod step;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{StepCatalog, StepEntry};
pub use config::{SequencerConfig, SequencerConfigBuilder, DEFAULT_TICK_PERIOD};
pub use error::SequencerError;
pub use observer::{NoopObserver, SequencerObserver, SharedObserver};
pub use sequencer::Sequencer;
pub use snapshot::{SequencerSnapshot, Transition};
pub use step::{Step, StepStatus};
pub use stream::{change_stream, snapshot_stream, SnapshotStream};

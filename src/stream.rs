//! Streaming API: receive snapshots as the sequencer changes.
//!
//! The observer trait ([`crate::observer::SequencerObserver`]) is pushed
//! every change synchronously. A stream is the pull-based alternative for
//! renderers that already live in an async loop: they `select!` over user
//! input and [`snapshot_stream`] side by side.
//!
//! The stream is backed by a `watch` channel, so a slow consumer sees the
//! *latest* state rather than every intermediate one. That is what a
//! renderer wants: it only ever draws the current position.

use crate::sequencer::Sequencer;
use crate::snapshot::SequencerSnapshot;
use futures::StreamExt;
use std::pin::Pin;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::Stream;

/// A boxed stream of sequencer snapshots.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = SequencerSnapshot> + Send>>;

/// Stream the sequencer's state, starting with the current snapshot.
///
/// The stream ends when the sequencer is dropped.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use workflow_player::{snapshot_stream, Sequencer, SequencerConfig, StepCatalog};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), workflow_player::SequencerError> {
/// let seq = Sequencer::new(StepCatalog::pdf_translation_workflow(), &SequencerConfig::default())?;
/// let mut updates = snapshot_stream(&seq);
/// seq.start();
/// while let Some(s) = updates.next().await {
///     println!("{}% {}", s.progress_percent(), s.step.title);
///     if !s.running && s.current_index == 0 {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn snapshot_stream(sequencer: &Sequencer) -> SnapshotStream {
    WatchStream::new(sequencer.subscribe()).boxed()
}

/// Like [`snapshot_stream`], but skips the snapshot current at subscription
/// time and yields only subsequent changes.
pub fn change_stream(sequencer: &Sequencer) -> SnapshotStream {
    WatchStream::from_changes(sequencer.subscribe()).boxed()
}

//! Observer trait for sequencer state changes.
//!
//! Inject an [`Arc<dyn SequencerObserver>`] via
//! [`crate::config::SequencerConfigBuilder::observer`] to be told about every
//! state change: user-driven ones (`start`, `stop`, `reset`, `go_to`) and the
//! automatic ticks alike. This is the renderer boundary: the sequencer knows
//! nothing about how its state is drawn.
//!
//! # Example
//!
//! ```rust
//! use workflow_player::{SequencerConfig, SequencerObserver, SequencerSnapshot};
//! use std::sync::Arc;
//!
//! struct PrintingObserver;
//!
//! impl SequencerObserver for PrintingObserver {
//!     fn on_state_change(&self, snapshot: &SequencerSnapshot) {
//!         eprintln!(
//!             "Step {}/{}: {} ({}%)",
//!             snapshot.current_index + 1,
//!             snapshot.step_count,
//!             snapshot.step.title,
//!             snapshot.progress_percent()
//!         );
//!     }
//! }
//!
//! let config = SequencerConfig::builder()
//!     .observer(Arc::new(PrintingObserver))
//!     .build()
//!     .unwrap();
//! ```

use crate::snapshot::SequencerSnapshot;
use std::sync::Arc;

/// Receives a snapshot after every sequencer state change.
///
/// Ticks arrive from the sequencer's tick task, which may run on a
/// different thread than the one calling `start`/`go_to`, hence
/// `Send + Sync`.
///
/// # Ordering and re-entrancy
///
/// Observers are called while the sequencer holds its internal lock, so
/// snapshots arrive in exactly the order the state changed and the last one
/// delivered always matches [`crate::Sequencer::snapshot`]. The flip side:
/// an observer must not call back into the sequencer that notified it, or
/// it will deadlock. Everything a renderer needs is in the snapshot; hand
/// follow-up actions to another task if you need them.
///
/// Keep the callback short. A slow observer delays ticks and blocks user
/// operations for as long as it runs.
pub trait SequencerObserver: Send + Sync {
    /// Called once per state change. `snapshot.transition` says which.
    fn on_state_change(&self, snapshot: &SequencerSnapshot) {
        let _ = snapshot;
    }
}

/// Observer that ignores everything.
///
/// For APIs that require an observer when nothing should be drawn. A
/// sequencer built without one skips notification altogether.
pub struct NoopObserver;

impl SequencerObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::SequencerConfig`].
pub type SharedObserver = Arc<dyn SequencerObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Transition;
    use crate::step::Step;
    use std::sync::Mutex;

    struct RecordingObserver {
        seen: Mutex<Vec<Transition>>,
    }

    impl SequencerObserver for RecordingObserver {
        fn on_state_change(&self, snapshot: &SequencerSnapshot) {
            self.seen.lock().unwrap().push(snapshot.transition);
        }
    }

    fn snapshot(transition: Transition) -> SequencerSnapshot {
        SequencerSnapshot {
            current_index: 0,
            step_count: 1,
            running: false,
            step: Step {
                index: 0,
                title: "Only".into(),
                description: String::new(),
                details: String::new(),
            },
            progress: 1.0,
            transition,
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        NoopObserver.on_state_change(&snapshot(Transition::Started));
    }

    #[test]
    fn arc_dyn_observer_records() {
        let recorder = Arc::new(RecordingObserver {
            seen: Mutex::new(Vec::new()),
        });
        let observer: SharedObserver = recorder.clone();
        observer.on_state_change(&snapshot(Transition::Started));
        observer.on_state_change(&snapshot(Transition::Wrapped));
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![Transition::Started, Transition::Wrapped]
        );
    }
}

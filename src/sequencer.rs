//! The step sequencer: timed, interruptible playback through a catalog.
//!
//! ## State machine
//!
//! ```text
//!            start                       tick (not last)
//!   ┌─────────┐ ──────────▶ ┌─────────┐ ◀──────┐
//!   │ Stopped │             │ Running │ ───────┘
//!   └─────────┘ ◀────────── └─────────┘
//!     ▲  ▲       start / stop /    │
//!     │  │       reset / go_to     │ tick (last step): index := 0
//!     │  └─────────────────────────┘
//!     └── reset / go_to (index := 0 / i)
//! ```
//!
//! ## Tick task
//!
//! While running, one Tokio task owned by the sequencer waits on
//! `interval_at(now + period, period)` and advances the position on each
//! tick. `running` is not stored separately: it is `timer.is_some()`, so a
//! running sequencer always has exactly one pending tick and a stopped one
//! has none.
//!
//! Every operation that changes the position or the running flag first
//! cancels the tick task. Aborting a task only takes effect at its next
//! `.await`, so a tick that has already woken may still be waiting for the
//! state lock. Each timer therefore carries an epoch; a tick whose epoch no
//! longer matches the live timer does nothing.
//!
//! Observers and `watch` subscribers are updated before the lock is
//! released, so they see changes in the order they were applied.

use crate::catalog::StepCatalog;
use crate::config::SequencerConfig;
use crate::error::SequencerError;
use crate::observer::SharedObserver;
use crate::snapshot::{SequencerSnapshot, Transition};
use crate::step::{Step, StepStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Drives automatic playback through a fixed [`StepCatalog`].
///
/// All operations are synchronous and return immediately. Dropping the
/// sequencer cancels any pending tick.
///
/// # Example
/// ```rust
/// use workflow_player::{Sequencer, SequencerConfig, StepCatalog};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), workflow_player::SequencerError> {
/// let seq = Sequencer::new(
///     StepCatalog::pdf_translation_workflow(),
///     &SequencerConfig::default(),
/// )?;
/// seq.go_to(2)?;
/// assert_eq!(seq.current_step().title, "OCR Processing");
/// assert!(!seq.is_running());
/// # Ok(())
/// # }
/// ```
pub struct Sequencer {
    shared: Arc<Shared>,
}

struct Shared {
    catalog: StepCatalog,
    tick_period: Duration,
    runtime: Handle,
    observer: Option<SharedObserver>,
    state: Mutex<State>,
    updates: watch::Sender<SequencerSnapshot>,
}

struct State {
    current_index: usize,
    timer: Option<TickTimer>,
    next_epoch: u64,
    last_transition: Transition,
}

struct TickTimer {
    epoch: u64,
    handle: JoinHandle<()>,
}

enum TickOutcome {
    Continue,
    Finished,
    Stale,
}

impl Sequencer {
    /// Create a stopped sequencer positioned on the first step.
    ///
    /// # Errors
    /// [`SequencerError::NoRuntime`] if `config.runtime` is unset and this is
    /// not called from within a Tokio runtime.
    pub fn new(catalog: StepCatalog, config: &SequencerConfig) -> Result<Self, SequencerError> {
        let runtime = match config.runtime {
            Some(ref handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| SequencerError::NoRuntime)?,
        };

        let state = State {
            current_index: 0,
            timer: None,
            next_epoch: 0,
            last_transition: Transition::Initial,
        };
        let initial = build_snapshot(&catalog, &state);
        let (updates, _) = watch::channel(initial);

        debug!(
            steps = catalog.len(),
            period = ?config.tick_period,
            "Sequencer created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                catalog,
                tick_period: config.tick_period,
                runtime,
                observer: config.observer.clone(),
                state: Mutex::new(state),
                updates,
            }),
        })
    }

    /// Toggle automatic advancement.
    ///
    /// When stopped, starts ticking every `tick_period`. When already
    /// running, stops, exactly like [`Sequencer::stop`].
    pub fn start(&self) {
        let mut state = self.shared.lock();
        if state.timer.is_some() {
            state.cancel_timer();
            info!(step = state.current_index + 1, "Playback paused");
            self.shared.publish(&mut state, Transition::Paused);
        } else {
            self.shared.schedule(&mut state);
            info!(
                step = state.current_index + 1,
                period = ?self.shared.tick_period,
                "Playback started"
            );
            self.shared.publish(&mut state, Transition::Started);
        }
    }

    /// Cancel automatic advancement. A no-op when already stopped.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        if state.timer.is_none() {
            debug!("stop() on a stopped sequencer");
            return;
        }
        state.cancel_timer();
        info!(step = state.current_index + 1, "Playback paused");
        self.shared.publish(&mut state, Transition::Paused);
    }

    /// Stop and rewind to the first step.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        state.cancel_timer();
        state.current_index = 0;
        info!("Playback reset");
        self.shared.publish(&mut state, Transition::Reset);
    }

    /// Stop and jump to step `index`.
    ///
    /// # Errors
    /// [`SequencerError::InvalidIndex`] if `index >= step_count()`. The
    /// sequencer is left untouched, including a pending tick.
    pub fn go_to(&self, index: usize) -> Result<(), SequencerError> {
        let step_count = self.shared.catalog.len();
        if index >= step_count {
            warn!(index, step_count, "Rejected jump to nonexistent step");
            return Err(SequencerError::InvalidIndex { index, step_count });
        }

        let mut state = self.shared.lock();
        state.cancel_timer();
        state.current_index = index;
        info!(step = index + 1, "Jumped to step");
        self.shared.publish(&mut state, Transition::Jumped);
        Ok(())
    }

    /// The active step.
    pub fn current_step(&self) -> &Step {
        let index = self.current_index();
        &self.shared.catalog.steps()[index]
    }

    /// `(current_index + 1) / step_count`, always in `(0, 1]`.
    pub fn progress_fraction(&self) -> f64 {
        progress(self.current_index(), self.shared.catalog.len())
    }

    pub fn current_index(&self) -> usize {
        self.shared.lock().current_index
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    pub fn step_count(&self) -> usize {
        self.shared.catalog.len()
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.shared.catalog
    }

    pub fn tick_period(&self) -> Duration {
        self.shared.tick_period
    }

    /// Status of step `index` relative to the active one.
    pub fn step_status(&self, index: usize) -> Result<StepStatus, SequencerError> {
        let step_count = self.shared.catalog.len();
        if index >= step_count {
            return Err(SequencerError::InvalidIndex { index, step_count });
        }
        Ok(StepStatus::of(index, self.current_index()))
    }

    /// The current state, tagged with the transition that produced it.
    pub fn snapshot(&self) -> SequencerSnapshot {
        let state = self.shared.lock();
        build_snapshot(&self.shared.catalog, &state)
    }

    /// Receiver that always holds the latest snapshot.
    ///
    /// See [`crate::stream::snapshot_stream`] for a `Stream` adapter.
    pub fn subscribe(&self) -> watch::Receiver<SequencerSnapshot> {
        self.shared.updates.subscribe()
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        if state.timer.is_some() {
            state.cancel_timer();
            debug!("Sequencer dropped while running; tick cancelled");
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Poisoning means an observer panicked. It runs after the state was
        // updated, so the state itself is still valid.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the tick task. Caller must hold the lock and have no live timer.
    fn schedule(self: &Arc<Self>, state: &mut State) {
        let epoch = state.next_epoch;
        state.next_epoch += 1;

        let first_tick = Instant::now() + self.tick_period;
        let handle = self.runtime.spawn(run_ticks(
            Arc::downgrade(self),
            epoch,
            first_tick,
            self.tick_period,
        ));
        state.timer = Some(TickTimer { epoch, handle });
    }

    /// Handle one tick from the timer with the given epoch.
    fn advance(&self, epoch: u64) -> TickOutcome {
        let mut state = self.lock();
        if state.timer.as_ref().map(|t| t.epoch) != Some(epoch) {
            debug!(epoch, "Ignoring tick from a cancelled timer");
            return TickOutcome::Stale;
        }

        if state.current_index + 1 >= self.catalog.len() {
            // The tick task is the caller; dropping the handle detaches
            // it and the task ends when this returns.
            state.timer = None;
            state.current_index = 0;
            info!(steps = self.catalog.len(), "Reached last step; rewound and stopped");
            self.publish(&mut state, Transition::Wrapped);
            TickOutcome::Finished
        } else {
            state.current_index += 1;
            debug!(step = state.current_index + 1, "Advanced");
            self.publish(&mut state, Transition::Advanced);
            TickOutcome::Continue
        }
    }

    /// Record `transition` and hand the resulting snapshot to the observer
    /// and subscribers.
    ///
    /// Runs with the state lock held so observers see changes in the order
    /// they were applied, even when a tick on a worker thread races a user
    /// operation.
    fn publish(&self, state: &mut State, transition: Transition) {
        state.last_transition = transition;
        let snapshot = build_snapshot(&self.catalog, state);
        if let Some(ref observer) = self.observer {
            observer.on_state_change(&snapshot);
        }
        self.updates.send_replace(snapshot);
    }
}

impl State {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }
}

async fn run_ticks(shared: Weak<Shared>, epoch: u64, first_tick: Instant, period: Duration) {
    let mut interval = tokio::time::interval_at(first_tick, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        match shared.advance(epoch) {
            TickOutcome::Continue => {}
            TickOutcome::Finished | TickOutcome::Stale => break,
        }
    }
}

fn build_snapshot(catalog: &StepCatalog, state: &State) -> SequencerSnapshot {
    let step_count = catalog.len();
    SequencerSnapshot {
        current_index: state.current_index,
        step_count,
        running: state.timer.is_some(),
        step: catalog.steps()[state.current_index].clone(),
        progress: progress(state.current_index, step_count),
        transition: state.last_transition,
    }
}

fn progress(current_index: usize, step_count: usize) -> f64 {
    (current_index + 1) as f64 / step_count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StepEntry;
    use crate::observer::SequencerObserver;
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_millis(2000);
    const EPSILON: Duration = Duration::from_millis(1);

    fn catalog(n: usize) -> StepCatalog {
        StepCatalog::new(
            (0..n)
                .map(|i| StepEntry::new(format!("S{i}"), format!("step {i}"), ""))
                .collect(),
        )
        .unwrap()
    }

    fn sequencer(n: usize) -> Sequencer {
        Sequencer::new(catalog(n), &SequencerConfig::default()).unwrap()
    }

    struct Recorder(Mutex<Vec<SequencerSnapshot>>);

    impl SequencerObserver for Recorder {
        fn on_state_change(&self, snapshot: &SequencerSnapshot) {
            self.0.lock().unwrap().push(snapshot.clone());
        }
    }

    #[test]
    fn new_outside_runtime_fails() {
        let err = Sequencer::new(catalog(3), &SequencerConfig::default())
            .err()
            .expect("no runtime should be an error");
        assert!(matches!(err, SequencerError::NoRuntime));
    }

    #[test]
    fn explicit_runtime_handle_is_used() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let config = SequencerConfig::builder()
            .runtime(rt.handle().clone())
            .build()
            .unwrap();
        let seq = Sequencer::new(catalog(3), &config).unwrap();
        seq.start();
        assert!(seq.is_running());
        seq.stop();
        assert!(!seq.is_running());
    }

    #[tokio::test]
    async fn starts_stopped_on_first_step() {
        let seq = sequencer(6);
        assert_eq!(seq.current_index(), 0);
        assert!(!seq.is_running());
        assert_eq!(seq.current_step().title, "S0");
        assert_eq!(seq.snapshot().transition, Transition::Initial);
    }

    #[tokio::test]
    async fn start_is_a_toggle() {
        let seq = sequencer(6);
        seq.start();
        assert!(seq.is_running());
        seq.start();
        assert!(!seq.is_running());
        assert_eq!(seq.snapshot().transition, Transition::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn one_tick_advances_one_step() {
        let seq = sequencer(6);
        seq.go_to(2).unwrap();
        seq.start();
        sleep(PERIOD + EPSILON).await;
        assert_eq!(seq.current_index(), 3);
        assert!(seq.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_period_elapses() {
        let seq = sequencer(6);
        seq.start();
        sleep(PERIOD - EPSILON).await;
        assert_eq!(seq.current_index(), 0);
        assert!(seq.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn tick_on_last_step_wraps_and_stops() {
        let seq = sequencer(6);
        seq.go_to(5).unwrap();
        seq.start();
        sleep(PERIOD + EPSILON).await;
        assert_eq!(seq.current_index(), 0);
        assert!(!seq.is_running());
        assert_eq!(seq.snapshot().transition, Transition::Wrapped);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_epoch_is_ignored() {
        let seq = sequencer(6);
        seq.start();
        seq.start();
        seq.start();
        // Epoch 0 belonged to the first, cancelled timer.
        assert!(matches!(seq.shared.advance(0), TickOutcome::Stale));
        assert_eq!(seq.current_index(), 0);
        assert!(matches!(seq.shared.advance(1), TickOutcome::Continue));
        assert_eq!(seq.current_index(), 1);
    }

    #[tokio::test]
    async fn invalid_jump_keeps_timer() {
        let seq = sequencer(6);
        seq.start();
        let err = seq.go_to(6).unwrap_err();
        assert!(matches!(
            err,
            SequencerError::InvalidIndex {
                index: 6,
                step_count: 6
            }
        ));
        assert!(seq.is_running());
    }

    #[tokio::test]
    async fn stop_when_stopped_emits_nothing() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let config = SequencerConfig::builder()
            .observer(recorder.clone())
            .build()
            .unwrap();
        let seq = Sequencer::new(catalog(3), &config).unwrap();
        seq.stop();
        seq.stop();
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn step_status_tracks_position() {
        let seq = sequencer(4);
        seq.go_to(2).unwrap();
        assert_eq!(seq.step_status(0).unwrap(), StepStatus::Completed);
        assert_eq!(seq.step_status(2).unwrap(), StepStatus::Active);
        assert_eq!(seq.step_status(3).unwrap(), StepStatus::Pending);
        assert!(seq.step_status(4).is_err());
    }

    #[tokio::test]
    async fn subscribe_sees_latest_snapshot() {
        let seq = sequencer(4);
        let rx = seq.subscribe();
        seq.go_to(3).unwrap();
        let latest = rx.borrow().clone();
        assert_eq!(latest.current_index, 3);
        assert_eq!(latest.transition, Transition::Jumped);
        assert!((latest.progress - 1.0).abs() < f64::EPSILON);
    }
}

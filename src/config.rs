//! Configuration for a [`crate::sequencer::Sequencer`].
//!
//! Every knob is fixed when the sequencer is constructed. In particular the
//! tick period cannot change while a sequencer is alive: a renderer that
//! wants a different pace builds a new sequencer.

use crate::error::SequencerError;
use crate::observer::SharedObserver;
use std::fmt;
use std::time::Duration;
use tokio::runtime::Handle;

/// Interval between automatic advancements: 2 seconds per step.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(2000);

/// Configuration for a step sequencer.
///
/// Built via [`SequencerConfig::builder()`] or using
/// [`SequencerConfig::default()`].
///
/// # Example
/// ```rust
/// use workflow_player::SequencerConfig;
/// use std::time::Duration;
///
/// let config = SequencerConfig::builder()
///     .tick_period(Duration::from_millis(500))
///     .build()
///     .unwrap();
/// assert_eq!(config.tick_period, Duration::from_millis(500));
/// ```
#[derive(Clone)]
pub struct SequencerConfig {
    /// Time between automatic advancements while running. Default: 2000 ms.
    pub tick_period: Duration,

    /// Notified after every state change. Default: none.
    pub observer: Option<SharedObserver>,

    /// Runtime that hosts the tick task.
    ///
    /// If `None`, the sequencer captures the runtime it is constructed in.
    pub runtime: Option<Handle>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            observer: None,
            runtime: None,
        }
    }
}

impl fmt::Debug for SequencerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencerConfig")
            .field("tick_period", &self.tick_period)
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<dyn SequencerObserver>"),
            )
            .field("runtime", &self.runtime.as_ref().map(|_| "<Handle>"))
            .finish()
    }
}

impl SequencerConfig {
    /// Create a new builder for `SequencerConfig`.
    pub fn builder() -> SequencerConfigBuilder {
        SequencerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SequencerConfig`].
#[derive(Debug)]
pub struct SequencerConfigBuilder {
    config: SequencerConfig,
}

impl SequencerConfigBuilder {
    pub fn tick_period(mut self, period: Duration) -> Self {
        self.config.tick_period = period;
        self
    }

    pub fn tick_period_ms(self, ms: u64) -> Self {
        self.tick_period(Duration::from_millis(ms))
    }

    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.config.observer = Some(observer);
        self
    }

    pub fn runtime(mut self, handle: Handle) -> Self {
        self.config.runtime = Some(handle);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SequencerConfig, SequencerError> {
        // `interval_at` panics on a zero period.
        if self.config.tick_period < Duration::from_millis(1) {
            return Err(SequencerError::InvalidConfig(format!(
                "tick period must be at least 1ms, got {:?}",
                self.config.tick_period
            )));
        }
        Ok(self.config)
    }
}

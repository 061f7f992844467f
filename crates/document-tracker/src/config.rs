//! Configuration for the document tracker.

use std::time::Duration;

use crate::error::TrackerError;

/// Default interval between listing polls (5 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default capacity of the channels between the listeners and the reconciler.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Configuration for a [`DocumentTracker`](crate::DocumentTracker).
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Interval between full re-enumerations of the user's files.
    pub poll_interval: Duration,

    /// Buffered deliveries per listener before the listener waits for the
    /// reconciler to catch up.
    pub channel_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl TrackerConfig {
    /// Create a config with a custom poll interval.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Default::default()
        }
    }

    /// Builder method to set the channel capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Check that the values can drive a tracker.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.poll_interval.is_zero() {
            return Err(TrackerError::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(TrackerError::InvalidConfig(
                "channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

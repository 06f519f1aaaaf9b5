use std::time::Duration;

/// Configuration for a monitoring session.
///
/// The windowing interval belongs to the caller, not the core: metrics
/// only react to ticks, they never start timers on their own. This struct
/// carries the interval to whatever drives the ticks, e.g.
/// [`spawn_window_driver`](crate::metrics::spawn_window_driver).
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Interval between period-window resets.
    pub window_interval: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_interval: Duration::from_secs(1),
        }
    }
}

impl AnalyzerConfig {
    /// Sets the period-window interval.
    pub fn with_window_interval(mut self, interval: Duration) -> Self {
        self.window_interval = interval;
        self
    }
}

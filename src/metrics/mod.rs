//! # Per-PID Stream Quality Metrics
//!
//! This module tracks quality metrics for every PID observed in a
//! transport stream:
//!
//! - Continuity-counter validation with discontinuity notifications
//! - Transport-error-indicator counting
//! - PCR delta and wall-clock drift tracking
//! - Windowed (per-period) counters alongside lifetime totals
//!
//! ## Example
//!
//! ```rust
//! use tsmon::metrics::TsMetrics;
//! use tsmon::ts::framer::decode_packets;
//!
//! # fn main() -> tsmon::Result<()> {
//! let mut unit = [0xFFu8; 188];
//! unit[0] = 0x47; // sync
//! unit[1] = 0x00;
//! unit[2] = 0x64; // PID 0x64
//! unit[3] = 0x10; // payload present, continuity counter 0
//!
//! let metrics = TsMetrics::new();
//! for packet in decode_packets(&unit)? {
//!     metrics.add_packet(&packet)?;
//! }
//! metrics.tick();
//!
//! let snapshot = metrics.metric(0x64).unwrap().snapshot();
//! assert_eq!(snapshot.period_packet_count, 1);
//! # Ok(())
//! # }
//! ```

/// Single-PID metric state and windowing.
pub mod pid;

pub use pid::{DiscontinuityHandler, PidEvent, PidMetric, PidMetricSnapshot};

use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::ts::types::TsPacket;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Size of the PID space: 13-bit identifiers.
const PID_SLOTS: usize = 0x2000;

/// Per-PID metric collection for one analysis session.
///
/// Metrics are created lazily on the first packet seen for a PID and live
/// for the rest of the session. The slot table is array-backed over the
/// full 13-bit PID space, so steady-state dispatch takes a shared read
/// lock and an index, never a hash lookup; the table write lock is taken
/// only when a new PID appears.
pub struct TsMetrics {
    slots: RwLock<Vec<Option<Arc<PidMetric>>>>,
    on_discontinuity: Option<DiscontinuityHandler>,
}

impl TsMetrics {
    /// Creates an empty collection with no discontinuity subscriber.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(vec![None; PID_SLOTS]),
            on_discontinuity: None,
        }
    }

    /// Creates a collection whose metrics notify `handler` on each
    /// detected discontinuity.
    ///
    /// The handler runs synchronously on the packet-processing path and
    /// must be fast and non-blocking.
    pub fn with_discontinuity_handler<F>(handler: F) -> Self
    where
        F: Fn(PidEvent) + Send + Sync + 'static,
    {
        Self {
            slots: RwLock::new(vec![None; PID_SLOTS]),
            on_discontinuity: Some(Arc::new(handler)),
        }
    }

    /// Creates a collection that forwards discontinuity events into an
    /// unbounded channel, for async consumers.
    pub fn with_discontinuity_channel(sender: UnboundedSender<PidEvent>) -> Self {
        Self::with_discontinuity_handler(move |event| {
            // a dropped receiver only means nobody is listening anymore
            let _ = sender.send(event);
        })
    }

    /// Routes one decoded packet to the metric for its PID, creating the
    /// metric on first sight.
    ///
    /// # Errors
    ///
    /// Propagates [`TsMonError::InvalidUsage`](crate::TsMonError) from the
    /// underlying metric; with routing by packet PID this does not occur.
    pub fn add_packet(&self, packet: &TsPacket) -> Result<()> {
        self.metric_for(packet.pid).add_packet(packet)
    }

    /// Returns the metric for `pid`, if one has been created.
    pub fn metric(&self, pid: u16) -> Option<Arc<PidMetric>> {
        self.slots.read().get(pid as usize)?.clone()
    }

    /// Publishes and resets the current window on every metric.
    pub fn tick(&self) {
        for metric in self.slots.read().iter().flatten() {
            metric.tick();
        }
    }

    /// Snapshots every observed PID, in PID order.
    pub fn snapshots(&self) -> Vec<PidMetricSnapshot> {
        self.slots
            .read()
            .iter()
            .flatten()
            .map(|metric| metric.snapshot())
            .collect()
    }

    /// PIDs observed so far, in ascending order.
    pub fn observed_pids(&self) -> Vec<u16> {
        self.slots
            .read()
            .iter()
            .flatten()
            .map(|metric| metric.pid())
            .collect()
    }

    fn metric_for(&self, pid: u16) -> Arc<PidMetric> {
        let slot = (pid as usize) & (PID_SLOTS - 1);

        if let Some(metric) = &self.slots.read()[slot] {
            return metric.clone();
        }

        let mut slots = self.slots.write();
        slots[slot]
            .get_or_insert_with(|| {
                Arc::new(match &self.on_discontinuity {
                    Some(handler) => PidMetric::with_discontinuity_handler(pid, handler.clone()),
                    None => PidMetric::new(pid),
                })
            })
            .clone()
    }
}

impl Default for TsMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns a task firing the period-window reset at the configured
/// interval.
///
/// The returned handle never completes on its own; abort it to stop
/// windowing. Ticks only snapshot-and-reset counters, so a stopped driver
/// leaves the metrics usable with the window no longer advancing.
pub fn spawn_window_driver(metrics: Arc<TsMetrics>, config: &AnalyzerConfig) -> JoinHandle<()> {
    let interval = config.window_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately and is not a window edge
        ticker.tick().await;
        loop {
            ticker.tick().await;
            metrics.tick();
        }
    })
}

use crate::error::{Result, TsMonError};
use crate::ts::types::{TsPacket, NULL_PID, PCR_HZ, PCR_TICKS_PER_MS};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;

/// Wall-clock tick rate used for drift tracking: one tick per 100 ns.
pub(crate) const WALL_TICK_HZ: u64 = 10_000_000;

/// Scale factor from wall-clock ticks to 27 MHz PCR ticks.
pub(crate) const WALL_TICKS_TO_PCR: f64 = PCR_HZ as f64 / WALL_TICK_HZ as f64;

/// Notification payload for a continuity discontinuity, carrying the PID
/// it was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidEvent {
    /// PID the discontinuity was detected on.
    pub pid: u16,
}

/// Callback invoked synchronously when a discontinuity is detected.
///
/// Handlers run on the packet-processing path and must be fast and
/// non-blocking.
pub type DiscontinuityHandler = Arc<dyn Fn(PidEvent) + Send + Sync>;

/// Quality metrics for a single PID.
///
/// One long-lived instance per observed PID. Mutated through
/// [`add_packet`](Self::add_packet) on the packet path and
/// [`tick`](Self::tick) on the windowing path; a per-instance lock
/// serializes the two, so packets for different PIDs never contend.
pub struct PidMetric {
    pid: u16,
    state: Mutex<MetricState>,
    on_discontinuity: Option<DiscontinuityHandler>,
}

#[derive(Debug, Default)]
struct MetricState {
    packet_count: u64,
    tei_count: u64,
    cc_error_count: u64,
    has_pcr: bool,
    last_cc: Option<u8>,
    last_pcr: Option<u64>,
    reference_pcr: u64,
    reference_ticks: u64,
    period: PeriodCounters,
    published: PublishedWindow,
}

/// Windowed counters accumulating between ticks.
#[derive(Debug, Default)]
struct PeriodCounters {
    packet_count: u64,
    tei_count: u64,
    cc_error_count: u64,
    /// Largest inter-PCR gap seen this window, in 27 MHz ticks.
    largest_pcr_delta: u64,
    largest_pcr_drift_ms: i64,
}

/// Last published window, exposed through [`PidMetricSnapshot`].
#[derive(Debug, Default, Clone)]
struct PublishedWindow {
    packet_count: u64,
    tei_count: u64,
    cc_error_count: u64,
    largest_pcr_delta_ms: u64,
    largest_pcr_drift_ms: i64,
}

/// Read-only view of a [`PidMetric`]: lifetime totals plus the most
/// recently published window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidMetricSnapshot {
    /// PID this metric tracks.
    pub pid: u16,
    /// Lifetime packet count.
    pub packet_count: u64,
    /// Lifetime transport-error-indicator count.
    pub tei_count: u64,
    /// Lifetime continuity-counter error count.
    pub cc_error_count: u64,
    /// Whether a PCR has ever been observed on this PID.
    pub has_pcr: bool,
    /// Packets seen in the last published window.
    pub period_packet_count: u64,
    /// TEI packets seen in the last published window.
    pub period_tei_count: u64,
    /// CC errors seen in the last published window.
    pub period_cc_error_count: u64,
    /// Largest inter-PCR gap in the last published window, in
    /// milliseconds.
    pub period_largest_pcr_delta_ms: u64,
    /// Largest PCR-vs-wall-clock drift in the last published window, in
    /// milliseconds.
    pub period_largest_pcr_drift_ms: i64,
}

impl PidMetric {
    /// Creates a metric for `pid` with no discontinuity subscriber.
    pub fn new(pid: u16) -> Self {
        Self {
            pid,
            state: Mutex::new(MetricState::default()),
            on_discontinuity: None,
        }
    }

    /// Creates a metric for `pid` that notifies `handler` on each
    /// detected discontinuity.
    pub fn with_discontinuity_handler(pid: u16, handler: DiscontinuityHandler) -> Self {
        Self {
            pid,
            state: Mutex::new(MetricState::default()),
            on_discontinuity: Some(handler),
        }
    }

    /// The PID this metric tracks.
    pub fn pid(&self) -> u16 {
        self.pid
    }

    /// Feeds one decoded packet into the metric.
    ///
    /// Transport-error packets only bump the TEI counters; their
    /// continuity counter cannot be trusted and leaves the CC state
    /// untouched. All other packets run continuity validation and PCR
    /// tracking.
    ///
    /// # Errors
    ///
    /// Returns [`TsMonError::InvalidUsage`] when the packet's PID differs
    /// from this metric's PID.
    pub fn add_packet(&self, packet: &TsPacket) -> Result<()> {
        self.add_packet_at(packet, wall_clock_ticks())
    }

    fn add_packet_at(&self, packet: &TsPacket, now_ticks: u64) -> Result<()> {
        if packet.pid != self.pid {
            return Err(TsMonError::InvalidUsage(format!(
                "packet for PID {} fed to metric for PID {}",
                packet.pid, self.pid
            )));
        }

        let mut state = self.state.lock();

        if packet.transport_error {
            state.tei_count += 1;
            state.period.tei_count += 1;
        } else {
            self.check_continuity(&mut state, packet, now_ticks);
            self.check_pcr(&mut state, packet, now_ticks);
            state.last_cc = Some(packet.continuity_counter);
        }

        state.packet_count += 1;
        state.period.packet_count += 1;
        Ok(())
    }

    /// Publishes the current window and zeroes the accumulators.
    ///
    /// Driven by an external periodic trigger. The largest PCR delta is
    /// converted from 27 MHz ticks to milliseconds here, at reporting
    /// time, not on every packet.
    pub fn tick(&self) {
        let mut state = self.state.lock();
        let period = std::mem::take(&mut state.period);
        state.published = PublishedWindow {
            packet_count: period.packet_count,
            tei_count: period.tei_count,
            cc_error_count: period.cc_error_count,
            largest_pcr_delta_ms: period.largest_pcr_delta / PCR_TICKS_PER_MS,
            largest_pcr_drift_ms: period.largest_pcr_drift_ms,
        };
    }

    /// Returns the lifetime totals and the last published window.
    pub fn snapshot(&self) -> PidMetricSnapshot {
        let state = self.state.lock();
        PidMetricSnapshot {
            pid: self.pid,
            packet_count: state.packet_count,
            tei_count: state.tei_count,
            cc_error_count: state.cc_error_count,
            has_pcr: state.has_pcr,
            period_packet_count: state.published.packet_count,
            period_tei_count: state.published.tei_count,
            period_cc_error_count: state.published.cc_error_count,
            period_largest_pcr_delta_ms: state.published.largest_pcr_delta_ms,
            period_largest_pcr_drift_ms: state.published.largest_pcr_drift_ms,
        }
    }

    fn check_continuity(&self, state: &mut MetricState, packet: &TsPacket, now_ticks: u64) {
        if packet.pid == NULL_PID {
            return;
        }

        let Some(last) = state.last_cc else {
            // first trusted packet on this PID, nothing to compare against
            return;
        };

        if last == packet.continuity_counter {
            // a repeat without payload is a tolerated no-data packet
            if packet.contains_payload {
                state.cc_error_count += 1;
                state.period.cc_error_count += 1;
            }
            return;
        }

        let in_sequence = if last == 15 {
            packet.continuity_counter == 0
        } else {
            last + 1 == packet.continuity_counter
        };

        if !in_sequence {
            state.cc_error_count += 1;
            state.period.cc_error_count += 1;
            self.raise_discontinuity(state, packet, now_ticks);
        }
    }

    fn raise_discontinuity(&self, state: &mut MetricState, packet: &TsPacket, now_ticks: u64) {
        // The PCR reference pair predates the discontinuity and must not
        // feed further drift computation; rebase onto this packet.
        state.reference_pcr = packet
            .adaptation_field
            .as_ref()
            .and_then(|field| field.pcr)
            .unwrap_or(0);
        state.reference_ticks = scale_wall_ticks(now_ticks);

        if let Some(handler) = &self.on_discontinuity {
            handler(PidEvent { pid: packet.pid });
        }
    }

    fn check_pcr(&self, state: &mut MetricState, packet: &TsPacket, now_ticks: u64) {
        let Some(field) = &packet.adaptation_field else {
            return;
        };
        let Some(pcr) = field.pcr else {
            return;
        };

        if field.discontinuity {
            log::debug!(
                "PID {}: adaptation field discontinuity indicator set, PCR not tracked",
                packet.pid
            );
            return;
        }

        match state.last_pcr {
            Some(last_pcr) => {
                let delta = pcr.wrapping_sub(last_pcr);
                if delta > state.period.largest_pcr_delta {
                    state.period.largest_pcr_delta = delta;
                }

                let elapsed_pcr = pcr.wrapping_sub(state.reference_pcr) as i64;
                let elapsed_clock =
                    (now_ticks as f64 * WALL_TICKS_TO_PCR - state.reference_ticks as f64) as i64;
                let drift_ms = (elapsed_clock - elapsed_pcr) / PCR_TICKS_PER_MS as i64;
                if drift_ms.abs() > state.period.largest_pcr_drift_ms.abs() {
                    state.period.largest_pcr_drift_ms = drift_ms;
                }
            }
            None => {
                state.reference_pcr = pcr;
                state.reference_ticks = scale_wall_ticks(now_ticks);
                state.has_pcr = true;
            }
        }

        state.last_pcr = Some(pcr);
    }
}

impl std::fmt::Debug for PidMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidMetric")
            .field("pid", &self.pid)
            .field("state", &*self.state.lock())
            .finish()
    }
}

fn scale_wall_ticks(ticks: u64) -> u64 {
    (ticks as f64 * WALL_TICKS_TO_PCR) as u64
}

/// Current wall clock in 100 ns ticks since the Unix epoch.
fn wall_clock_ticks() -> u64 {
    (Utc::now().timestamp_nanos_opt().unwrap_or(0) / 100) as u64
}

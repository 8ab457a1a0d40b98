//! Rolling 2-minute hit window with surge alert detection.
//!
//! Each call to [`Window::consume`] counts one hit, evicts slots that fell
//! out of the trailing 120 seconds relative to *that hit's* timestamp, and
//! compares the average rate against the threshold:
//!
//! - **Normal → Alerting** when `hits / 120 > threshold`, reported as
//!   [`AlertEvent::Start`] at the consumed timestamp.
//! - **Alerting → Normal** when `hits / 120 < threshold`, reported as
//!   [`AlertEvent::End`] at the recovery time found during eviction.
//!
//! A rate exactly equal to the threshold never transitions.

use crate::config::AlertConfig;
use crate::error::EngineError;
use crate::ledger::SlotLedger;
use crate::types::{AlertEvent, AlertState, TimeSlot};

/// Rolling window width in seconds.
pub const WINDOW_SECS: i64 = 120;

// ─── Window ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Window {
    ledger: SlotLedger,
    state: AlertState,
    threshold: f64,
    last_timestamp: Option<i64>,
}

impl Window {
    /// Create an empty window in the `Normal` state.
    pub fn new(threshold: f64) -> Result<Self, EngineError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(EngineError::InvalidThreshold(threshold));
        }
        Ok(Self {
            ledger: SlotLedger::new(),
            state: AlertState::Normal,
            threshold,
            last_timestamp: None,
        })
    }

    pub fn from_config(config: &AlertConfig) -> Result<Self, EngineError> {
        Self::new(config.threshold)
    }

    /// Count one hit at `timestamp` and report a threshold crossing, if any.
    ///
    /// Fails only when the window boundary `timestamp - 120` is not
    /// representable; in that case no state is modified.
    pub fn consume(&mut self, timestamp: i64) -> Result<Option<AlertEvent>, EngineError> {
        let cutoff =
            timestamp
                .checked_sub(WINDOW_SECS)
                .ok_or_else(|| EngineError::InvalidTimestamp {
                    value: timestamp.to_string(),
                    detail: format!("window start {timestamp} - {WINDOW_SECS} overflows"),
                })?;

        // 1. Count the hit before evicting.
        self.ledger.record(timestamp);
        self.last_timestamp = Some(timestamp);

        // 2. Evict from the front of the arrival queue.
        let recovery_time = self.evict_before(cutoff);

        // 3. Compare the average against the threshold.
        let event = self.transition(timestamp, recovery_time);

        debug_assert!(self.ledger.is_consistent(), "slot ledger out of sync");
        Ok(event)
    }

    /// Parse `raw` as integer seconds and [`consume`](Self::consume) it.
    pub fn consume_str(&mut self, raw: &str) -> Result<Option<AlertEvent>, EngineError> {
        let timestamp =
            raw.trim()
                .parse::<i64>()
                .map_err(|e| EngineError::InvalidTimestamp {
                    value: raw.to_string(),
                    detail: e.to_string(),
                })?;
        self.consume(timestamp)
    }

    /// Evict arrival-order slots older than `cutoff`. Returns the first
    /// recovery time at which the remaining hits, not counting the hit being
    /// consumed, average below the threshold.
    fn evict_before(&mut self, cutoff: i64) -> Option<i64> {
        let mut recovery_time = None;
        let mut evicted_slots = 0usize;

        while self
            .ledger
            .oldest()
            .is_some_and(|oldest| oldest.timestamp < cutoff)
        {
            let Some(evicted) = self.ledger.evict_oldest() else {
                break;
            };
            evicted_slots += 1;

            let previous_hits = self.ledger.total_hits().saturating_sub(1);
            if recovery_time.is_none() && rate_of(previous_hits) < self.threshold {
                recovery_time = Some(evicted.timestamp + WINDOW_SECS);
            }
        }

        if evicted_slots > 0 {
            tracing::debug!(
                evicted_slots,
                cutoff,
                total_hits = self.ledger.total_hits(),
                "evicted expired slots"
            );
        }
        recovery_time
    }

    fn transition(&mut self, timestamp: i64, recovery_time: Option<i64>) -> Option<AlertEvent> {
        let hits = self.ledger.total_hits();
        let rate = rate_of(hits);

        match self.state {
            AlertState::Normal if rate > self.threshold => {
                self.state = AlertState::Alerting;
                tracing::info!(hits, rate, time = timestamp, "hit rate above threshold");
                Some(AlertEvent::Start {
                    hits,
                    time: timestamp,
                })
            }
            AlertState::Alerting if rate < self.threshold => {
                self.state = AlertState::Normal;
                let time = resolve_recovery_time(recovery_time, timestamp);
                tracing::info!(hits, rate, time, "hit rate recovered");
                Some(AlertEvent::End { hits, time })
            }
            _ => None,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn is_alerting(&self) -> bool {
        self.state == AlertState::Alerting
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Hits currently held across all slots.
    pub fn total_hits(&self) -> u64 {
        self.ledger.total_hits()
    }

    /// Current average hits per second over the window.
    pub fn rate(&self) -> f64 {
        rate_of(self.ledger.total_hits())
    }

    /// Number of distinct timestamps held.
    pub fn slot_count(&self) -> usize {
        self.ledger.len()
    }

    /// Timestamp of the most recently consumed hit.
    pub fn last_timestamp(&self) -> Option<i64> {
        self.last_timestamp
    }

    /// Held slots in arrival order.
    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.ledger.iter()
    }

    pub fn ledger(&self) -> &SlotLedger {
        &self.ledger
    }
}

fn rate_of(hits: u64) -> f64 {
    hits as f64 / WINDOW_SECS as f64
}

/// Recovery time for an `End` event.
///
/// The rate only falls through eviction, and the last eviction of a call
/// that ends below the threshold always satisfies the recovery check, so a
/// missing value is unreachable through `consume`. Should it happen anyway
/// the consumed timestamp is used.
fn resolve_recovery_time(recorded: Option<i64>, timestamp: i64) -> i64 {
    match recorded {
        Some(time) => time,
        None => {
            tracing::warn!(
                timestamp,
                "alert ended without an eviction, using consumed timestamp"
            );
            timestamp
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_549_573_860;

    fn window() -> Window {
        Window::new(10.0).expect("valid threshold")
    }

    fn consume_n(w: &mut Window, timestamp: i64, n: usize) -> Option<AlertEvent> {
        let mut last = None;
        for _ in 0..n {
            last = w.consume(timestamp).expect("valid timestamp");
        }
        last
    }

    // ── 1. start_fires_on_strictly_greater ──────────────────────────

    #[test]
    fn start_fires_on_strictly_greater() {
        let mut w = window();
        // 1200 / 120 == 10.0 is not above the threshold
        assert_eq!(consume_n(&mut w, T, 1200), None);
        assert!(!w.is_alerting());

        let event = w.consume(T).expect("valid");
        assert_eq!(event, Some(AlertEvent::Start { hits: 1201, time: T }));
        assert!(w.is_alerting());
    }

    // ── 2. end_reports_recovery_time ────────────────────────────────

    #[test]
    fn end_reports_recovery_time() {
        let mut w = window();
        consume_n(&mut w, T, 1201);
        assert!(w.is_alerting());

        let event = w.consume(T + 130).expect("valid");
        assert_eq!(event, Some(AlertEvent::End { hits: 1, time: T + 120 }));
        assert_eq!(w.state(), AlertState::Normal);
        assert_eq!(w.total_hits(), 1);
        assert_eq!(w.slot_count(), 1);
    }

    // ── 3. no_alert_below_threshold ─────────────────────────────────

    #[test]
    fn no_alert_below_threshold() {
        let mut w = window();
        assert_eq!(consume_n(&mut w, T, 201), None);
        assert_eq!(w.total_hits(), 201);
        assert!(!w.is_alerting());
    }

    // ── 4. alerting_stays_silent_while_above ────────────────────────

    #[test]
    fn alerting_stays_silent_while_above() {
        let mut w = window();
        consume_n(&mut w, T, 1201);
        assert_eq!(consume_n(&mut w, T + 1, 50), None);
        assert!(w.is_alerting());
    }

    // ── 5. boundary_tie_is_retained ─────────────────────────────────

    #[test]
    fn boundary_tie_is_retained() {
        let mut w = window();
        w.consume(T).expect("valid");
        w.consume(T + WINDOW_SECS).expect("valid");
        // T == (T + 120) - 120 stays in the window
        assert_eq!(w.total_hits(), 2);

        w.consume(T + WINDOW_SECS + 1).expect("valid");
        assert_eq!(w.total_hits(), 2);
        assert_eq!(w.slot_count(), 2);
    }

    // ── 6. recovery_time_is_first_slot_that_drops_rate ──────────────

    #[test]
    fn recovery_time_is_first_slot_that_drops_rate() {
        let mut w = window();
        // Two heavy seconds, then enough at a third to cross.
        consume_n(&mut w, T, 600);
        consume_n(&mut w, T + 1, 600);
        let start = w.consume(T + 2).expect("valid");
        assert_eq!(start, Some(AlertEvent::Start { hits: 1201, time: T + 2 }));

        // T + 122 evicts T and T + 1. Dropping T alone already brings the
        // rate under the threshold, so recovery is anchored to T.
        let end = w.consume(T + 122).expect("valid");
        assert_eq!(end, Some(AlertEvent::End { hits: 2, time: T + 120 }));
    }

    // ── 7. recovery_skips_slots_that_keep_rate_high ─────────────────

    #[test]
    fn recovery_skips_slots_that_keep_rate_high() {
        let mut w = Window::new(5.0).expect("valid");
        consume_n(&mut w, T, 100);
        consume_n(&mut w, T + 1, 100);
        consume_n(&mut w, T + 2, 500);
        assert!(w.is_alerting());

        // Evicting T leaves 600 (+1) → still 5.0/s, not below; evicting
        // T + 1 leaves 500 (+1) → below. Recovery is anchored to T + 1.
        let end = w.consume(T + 123).expect("valid");
        assert_eq!(end, Some(AlertEvent::End { hits: 1, time: T + 121 }));
    }

    // ── 8. out_of_order_front_blocks_eviction ───────────────────────

    #[test]
    fn out_of_order_front_blocks_eviction() {
        let mut w = window();
        w.consume(T + 10).expect("valid");
        w.consume(T).expect("valid");

        // Cutoff is T + 5: front slot T + 10 is young enough, so the older
        // T slot queued behind it is kept.
        w.consume(T + 125).expect("valid");
        assert_eq!(w.total_hits(), 3);

        // Once T + 10 expires, the loop reaches T as well.
        w.consume(T + 131).expect("valid");
        assert_eq!(w.total_hits(), 2);
        let held: Vec<i64> = w.slots().map(|s| s.timestamp).collect();
        assert_eq!(held, vec![T + 125, T + 131]);
    }

    // ── 9. eviction_anchored_to_incoming_hit ────────────────────────

    #[test]
    fn eviction_anchored_to_incoming_hit() {
        let mut w = window();
        w.consume(T + 200).expect("valid");
        // A late hit far in the past does not evict anything: its own cutoff
        // is below every held slot.
        w.consume(T).expect("valid");
        assert_eq!(w.total_hits(), 2);
        assert_eq!(w.last_timestamp(), Some(T));
    }

    // ── 10. consume_str_rejects_malformed ───────────────────────────

    #[test]
    fn consume_str_rejects_malformed() {
        let mut w = window();
        let err = w.consume_str("15495738x0").expect_err("malformed");
        assert!(matches!(err, EngineError::InvalidTimestamp { .. }));
        assert_eq!(w.total_hits(), 0);
        assert_eq!(w.last_timestamp(), None);

        assert_eq!(w.consume_str(" 1549573860 ").expect("valid"), None);
        assert_eq!(w.total_hits(), 1);
    }

    // ── 11. overflowing_timestamp_rejected_without_mutation ─────────

    #[test]
    fn overflowing_timestamp_rejected_without_mutation() {
        let mut w = window();
        w.consume(T).expect("valid");
        let err = w.consume(i64::MIN + 5).expect_err("overflow");
        assert!(matches!(err, EngineError::InvalidTimestamp { .. }));
        assert_eq!(w.total_hits(), 1);
        assert_eq!(w.slot_count(), 1);
    }

    // ── 12. invalid_threshold ───────────────────────────────────────

    #[test]
    fn invalid_threshold() {
        assert_eq!(
            Window::new(-1.0).unwrap_err(),
            EngineError::InvalidThreshold(-1.0)
        );
        assert!(Window::new(f64::NAN).is_err());
        assert!(Window::new(f64::INFINITY).is_err());
        assert!(Window::new(0.0).is_ok());
    }

    // ── 13. zero_threshold_alerts_on_first_hit ──────────────────────

    #[test]
    fn zero_threshold_alerts_on_first_hit() {
        let mut w = Window::new(0.0).expect("valid");
        assert_eq!(
            w.consume(T).expect("valid"),
            Some(AlertEvent::Start { hits: 1, time: T })
        );
        // The rate never drops below zero, so the alert never ends.
        assert_eq!(w.consume(T + 500).expect("valid"), None);
        assert!(w.is_alerting());
    }

    // ── 14. realert_after_recovery ──────────────────────────────────

    #[test]
    fn realert_after_recovery() {
        let mut w = window();
        consume_n(&mut w, T, 1201);
        assert!(w.consume(T + 130).expect("valid").is_some());
        assert_eq!(consume_n(&mut w, T + 130, 1199), None);
        assert_eq!(
            w.consume(T + 131).expect("valid"),
            Some(AlertEvent::Start {
                hits: 1201,
                time: T + 131
            })
        );
    }

    // ── 15. recovery_fallback_uses_consumed_timestamp ───────────────

    #[test]
    fn recovery_fallback_uses_consumed_timestamp() {
        assert_eq!(resolve_recovery_time(Some(T + 120), T + 130), T + 120);
        assert_eq!(resolve_recovery_time(None, T + 130), T + 130);
    }

    // ── 16. recovery_anchored_to_removed_slot ───────────────────────

    #[test]
    fn recovery_anchored_to_removed_slot() {
        let mut w = Window::new(1.0).expect("valid");
        consume_n(&mut w, T, 200);
        assert!(w.is_alerting());

        // The whole 200-hit slot at T leaves in one eviction and the alert
        // ends at that slot's expiry, not the incoming hit's.
        let end = w.consume(T + 121).expect("valid");
        assert_eq!(end, Some(AlertEvent::End { hits: 1, time: T + 120 }));
        assert_eq!(w.ledger().get(T), None);
        assert_eq!(w.slot_count(), 1);
    }
}

// ─── Property tests ─────────────────────────────────────────────────

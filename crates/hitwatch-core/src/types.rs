//! Value types shared between the engine and its consumers.

use serde::{Deserialize, Serialize};

use crate::window::WINDOW_SECS;

// ─── TimeSlot ───────────────────────────────────────────────────────

/// All hits observed at one exact timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub timestamp: i64,
    /// Always >= 1 while the slot is held.
    pub count: u64,
}

impl TimeSlot {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            count: 1,
        }
    }
}

// ─── AlertState ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    #[default]
    Normal,
    Alerting,
}

// ─── AlertEvent ─────────────────────────────────────────────────────

/// Threshold crossing reported by [`crate::Window::consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertEvent {
    /// Rolling rate rose above the threshold. `time` is the timestamp of the
    /// hit that pushed it over.
    Start { hits: u64, time: i64 },
    /// Rolling rate fell back under the threshold. `time` is the recovery
    /// time computed while evicting expired slots.
    End { hits: u64, time: i64 },
}

impl AlertEvent {
    /// Hits held in the window when the event fired.
    pub fn hits(&self) -> u64 {
        match self {
            AlertEvent::Start { hits, .. } | AlertEvent::End { hits, .. } => *hits,
        }
    }

    pub fn time(&self) -> i64 {
        match self {
            AlertEvent::Start { time, .. } | AlertEvent::End { time, .. } => *time,
        }
    }

    /// Average hits per second over the window at the time of the event.
    pub fn rate(&self) -> f64 {
        self.hits() as f64 / WINDOW_SECS as f64
    }

    pub fn is_start(&self) -> bool {
        matches!(self, AlertEvent::Start { .. })
    }
}

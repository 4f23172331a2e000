// src/domain/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single OHLC bar as supplied by the strategy engine.
///
/// Missing values are carried as `NaN`, which is how the engine fills gaps
/// in its bar table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(open_time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
        }
    }

    /// First OHLC field that is missing, in open/high/low/close order.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }
}

/// Outcome of a blocking check: a decision plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardDecision {
    pub accepted: bool,
    pub reason: String,
}

impl GuardDecision {
    pub fn accept(reason: impl Into<String>) -> Self {
        Self {
            accepted: true,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

impl fmt::Display for GuardDecision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let verdict = if self.accepted { "ACCEPT" } else { "REJECT" };
        write!(f, "{}: {}", verdict, self.reason)
    }
}

/// Outcome of the anti-FOMO cooldown check.
///
/// The check is advisory: it can flag a warning but never blocks an entry,
/// so there is no rejected state to represent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownCheck {
    /// Bars elapsed since the last recorded signal, `None` when nothing was recorded
    /// or the check is disabled.
    pub bars_since_signal: Option<usize>,
    pub triggered: bool,
    pub reason: String,
}

impl CooldownCheck {
    pub fn allowed(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionCategory {
    BarState,
    ValidationError,
    TickNoise,
    AntiFomoWarning,
}

impl RejectionCategory {
    pub const ALL: [RejectionCategory; 4] = [
        RejectionCategory::BarState,
        RejectionCategory::ValidationError,
        RejectionCategory::TickNoise,
        RejectionCategory::AntiFomoWarning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCategory::BarState => "bar-state",
            RejectionCategory::ValidationError => "validation-error",
            RejectionCategory::TickNoise => "tick-noise",
            RejectionCategory::AntiFomoWarning => "anti-fomo-warning",
        }
    }

    /// Whether entries of this category ever block an entry.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, RejectionCategory::AntiFomoWarning)
    }
}

impl fmt::Display for RejectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RejectionCategory,
    pub reason: String,
}

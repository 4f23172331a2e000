// src/trading/history.rs
use crate::domain::errors::{GuardError, GuardResult};
use crate::domain::models::{RejectionCategory, RejectionLogEntry};
use chrono::Utc;
use std::collections::BTreeMap;

/// Bar index of the most recent entry signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalHistory {
    last_signal_bar: Option<usize>,
}

impl SignalHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_signal_bar(&self) -> Option<usize> {
        self.last_signal_bar
    }

    /// Record a signal at `bar_index`.
    ///
    /// Moving backwards is refused and leaves the history untouched; recording
    /// the same bar twice is a no-op.
    pub fn record(&mut self, bar_index: usize) -> GuardResult<()> {
        match self.last_signal_bar {
            Some(last) if bar_index < last => Err(GuardError::NonMonotonicSignal {
                requested: bar_index,
                last,
            }),
            _ => {
                self.last_signal_bar = Some(bar_index);
                Ok(())
            }
        }
    }

    /// Bars elapsed between the last signal and `current_bar`, saturating at zero.
    pub fn bars_since(&self, current_bar: usize) -> Option<usize> {
        self.last_signal_bar
            .map(|last| current_bar.saturating_sub(last))
    }

    pub fn clear(&mut self) {
        self.last_signal_bar = None;
    }
}

/// Append-only audit log of rejections and advisory warnings.
#[derive(Debug, Clone, Default)]
pub struct RejectionLog {
    entries: Vec<RejectionLogEntry>,
}

impl RejectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: RejectionCategory, reason: impl Into<String>) {
        self.entries.push(RejectionLogEntry {
            timestamp: Utc::now(),
            category,
            reason: reason.into(),
        });
    }

    pub fn entries(&self) -> &[RejectionLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry counts for every category, zero included.
    pub fn counts(&self) -> BTreeMap<RejectionCategory, usize> {
        let mut counts: BTreeMap<RejectionCategory, usize> = RejectionCategory::ALL
            .iter()
            .map(|category| (*category, 0))
            .collect();

        for entry in &self.entries {
            *counts.entry(entry.category).or_insert(0) += 1;
        }

        counts
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

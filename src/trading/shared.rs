// src/trading/shared.rs
use crate::config::GuardConfig;
use crate::domain::errors::GuardResult;
use crate::domain::models::{Bar, CooldownCheck, GuardDecision, RejectionCategory, RejectionLogEntry};
use crate::trading::guard::{EntryGuard, GuardStatus};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to one [`EntryGuard`], for when a monitoring task reads
/// status while the strategy engine validates.
///
/// Every call holds the lock for its whole duration.
#[derive(Debug, Clone)]
pub struct SharedEntryGuard {
    inner: Arc<Mutex<EntryGuard>>,
}

impl SharedEntryGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self::from_guard(EntryGuard::new(config))
    }

    pub fn from_guard(guard: EntryGuard) -> Self {
        Self {
            inner: Arc::new(Mutex::new(guard)),
        }
    }

    // A panic while holding the lock cannot leave the guard half-updated, so
    // a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, EntryGuard> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn validate_bar_state(&self, bars: &[Bar], index: isize) -> GuardDecision {
        self.lock().validate_bar_state(bars, index)
    }

    pub fn is_bar_closed(
        &self,
        current_time: DateTime<Utc>,
        bar_open_time: DateTime<Utc>,
        timeframe_minutes: i64,
    ) -> GuardDecision {
        self.lock()
            .is_bar_closed(current_time, bar_open_time, timeframe_minutes)
    }

    pub fn filter_tick_noise(&self, price_movement_pips: f64) -> GuardDecision {
        self.lock().filter_tick_noise(price_movement_pips)
    }

    pub fn check_anti_fomo_cooldown(&self, current_bar_index: usize) -> CooldownCheck {
        self.lock().check_anti_fomo_cooldown(current_bar_index)
    }

    pub fn validate_entry(
        &self,
        bars: &[Bar],
        index: isize,
        price_movement_pips: Option<f64>,
    ) -> GuardDecision {
        self.lock().validate_entry(bars, index, price_movement_pips)
    }

    pub fn record_signal(&self, bar_index: usize) -> GuardResult<()> {
        self.lock().record_signal(bar_index)
    }

    pub fn get_guard_status(&self) -> GuardStatus {
        self.lock().get_guard_status()
    }

    pub fn get_rejections_summary(&self) -> BTreeMap<RejectionCategory, usize> {
        self.lock().get_rejections_summary()
    }

    pub fn rejections(&self) -> Vec<RejectionLogEntry> {
        self.lock().rejections().to_vec()
    }

    pub fn reset_rejections_log(&self) {
        self.lock().reset_rejections_log()
    }
}

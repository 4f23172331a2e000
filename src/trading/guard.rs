// src/trading/guard.rs
use crate::config::GuardConfig;
use crate::domain::errors::{AppResult, GuardError, GuardResult};
use crate::domain::models::{Bar, CooldownCheck, GuardDecision, RejectionCategory, RejectionLogEntry};
use crate::trading::history::{RejectionLog, SignalHistory};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Index of the last fully closed bar; the final bar is still forming.
pub const LAST_CLOSED_BAR: isize = -2;

const MIN_BARS: usize = 2;

/// Snapshot of a guard's configuration and audit counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardStatus {
    pub config: GuardConfig,
    pub last_signal_bar: Option<usize>,
    pub total_rejections: usize,
    pub rejections_by_category: BTreeMap<RejectionCategory, usize>,
}

impl GuardStatus {
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Gate run by the strategy engine before an entry signal is acted on.
///
/// Bar-state validation always runs. The tick-noise filter and anti-FOMO
/// cooldown are opt-in through [`GuardConfig`], and anti-FOMO only ever warns.
#[derive(Debug)]
pub struct EntryGuard {
    config: GuardConfig,
    history: SignalHistory,
    rejections: RejectionLog,
}

impl Default for EntryGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

impl EntryGuard {
    pub fn new(config: GuardConfig) -> Self {
        log::debug!(
            "EntryGuard created: noise_filter={} (min {} pips), anti_fomo={} ({} bars)",
            config.enable_noise_filter,
            config.min_pips_movement,
            config.enable_anti_fomo,
            config.anti_fomo_bars
        );

        Self {
            config,
            history: SignalHistory::new(),
            rejections: RejectionLog::new(),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Validate the OHLC integrity of the bar at `index`.
    ///
    /// Negative indices count from the end, so [`LAST_CLOSED_BAR`] selects the
    /// last closed bar.
    pub fn validate_bar_state(&mut self, bars: &[Bar], index: isize) -> GuardDecision {
        match self.check_bar_state(bars, index) {
            Ok(_) => GuardDecision::accept("Bar state valid"),
            Err(reason) => GuardDecision::reject(reason),
        }
    }

    /// Whether a bar opened at `bar_open_time` has closed by `current_time`.
    pub fn is_bar_closed(
        &self,
        current_time: DateTime<Utc>,
        bar_open_time: DateTime<Utc>,
        timeframe_minutes: i64,
    ) -> GuardDecision {
        if timeframe_minutes <= 0 {
            return GuardDecision::reject(format!(
                "Invalid timeframe: {} minutes",
                timeframe_minutes
            ));
        }

        let elapsed = (current_time - bar_open_time).num_seconds() as f64 / 60.0;
        if elapsed >= timeframe_minutes as f64 {
            GuardDecision::accept(format!(
                "Bar closed: {:.1} min elapsed >= {} min required",
                elapsed, timeframe_minutes
            ))
        } else {
            GuardDecision::reject(format!(
                "Bar still forming: {:.1} min elapsed < {} min required",
                elapsed, timeframe_minutes
            ))
        }
    }

    /// Reject movements smaller than the configured pip threshold.
    ///
    /// When the filter is disabled the movement is not looked at.
    pub fn filter_tick_noise(&mut self, price_movement_pips: f64) -> GuardDecision {
        if !self.config.enable_noise_filter {
            return GuardDecision::accept("DISABLED - PASS");
        }

        let movement = price_movement_pips.abs();
        let threshold = self.config.min_pips_movement;
        if movement >= threshold {
            log::debug!("Tick noise check passed: {:.2} pips", movement);
            GuardDecision::accept(format!(
                "Movement {:.2} pips >= threshold ({:.1})",
                movement, threshold
            ))
        } else {
            let reason = format!("Movement {:.2} pips < threshold ({:.1})", movement, threshold);
            log::info!("Tick noise rejection: {}", reason);
            self.rejections.push(RejectionCategory::TickNoise, reason.clone());
            GuardDecision::reject(reason)
        }
    }

    /// Advisory cooldown since the last recorded signal. Never blocks.
    pub fn check_anti_fomo_cooldown(&mut self, current_bar_index: usize) -> CooldownCheck {
        if !self.config.enable_anti_fomo {
            return CooldownCheck {
                bars_since_signal: None,
                triggered: false,
                reason: "DISABLED - no check".to_string(),
            };
        }

        let Some(bars_since) = self.history.bars_since(current_bar_index) else {
            return CooldownCheck {
                bars_since_signal: None,
                triggered: false,
                reason: "No previous signal recorded".to_string(),
            };
        };

        if bars_since < self.config.anti_fomo_bars {
            let reason = format!(
                "WARNING: only {} bar(s) since last signal (cooldown {} bars)",
                bars_since, self.config.anti_fomo_bars
            );
            self.rejections
                .push(RejectionCategory::AntiFomoWarning, reason.clone());
            CooldownCheck {
                bars_since_signal: Some(bars_since),
                triggered: true,
                reason,
            }
        } else {
            CooldownCheck {
                bars_since_signal: Some(bars_since),
                triggered: false,
                reason: format!("Cooldown satisfied: {} bars since last signal", bars_since),
            }
        }
    }

    /// Run every applicable check in order: bar state, anti-FOMO, tick noise.
    ///
    /// The anti-FOMO check uses the resolved position of the bar at `index`
    /// as the current bar index.
    pub fn validate_entry(
        &mut self,
        bars: &[Bar],
        index: isize,
        price_movement_pips: Option<f64>,
    ) -> GuardDecision {
        let position = match self.check_bar_state(bars, index) {
            Ok(position) => position,
            Err(reason) => {
                return GuardDecision::reject(format!("Bar state invalid: {}", reason));
            }
        };

        let cooldown = self.check_anti_fomo_cooldown(position);
        if cooldown.triggered {
            log::warn!("Anti-FOMO: {}", cooldown.reason);
        }

        if let Some(pips) = price_movement_pips {
            let noise = self.filter_tick_noise(pips);
            if !noise.accepted {
                return GuardDecision::reject(format!("Tick noise filtered: {}", noise.reason));
            }
        }

        log::debug!("Entry validated at bar {}", position);
        GuardDecision::accept("Entry validated")
    }

    /// Record that an entry was taken at `bar_index`.
    pub fn record_signal(&mut self, bar_index: usize) -> GuardResult<()> {
        self.history.record(bar_index).map_err(|e| {
            log::warn!("Signal not recorded: {}", e);
            e
        })
    }

    pub fn last_signal_bar(&self) -> Option<usize> {
        self.history.last_signal_bar()
    }

    pub fn get_guard_status(&self) -> GuardStatus {
        GuardStatus {
            config: self.config.clone(),
            last_signal_bar: self.history.last_signal_bar(),
            total_rejections: self.rejections.len(),
            rejections_by_category: self.rejections.counts(),
        }
    }

    pub fn get_rejections_summary(&self) -> BTreeMap<RejectionCategory, usize> {
        self.rejections.counts()
    }

    pub fn rejections(&self) -> &[RejectionLogEntry] {
        self.rejections.entries()
    }

    pub fn reset_rejections_log(&mut self) {
        log::info!("Clearing {} rejection log entries", self.rejections.len());
        self.rejections.clear();
    }

    /// Bar-state checks shared by `validate_bar_state` and `validate_entry`.
    /// Logs the failure and returns the resolved bar position on success.
    fn check_bar_state(&mut self, bars: &[Bar], index: isize) -> Result<usize, String> {
        if bars.len() < MIN_BARS {
            return Err(self.reject_bar_state(format!(
                "Insufficient bars: need at least {}, got {}",
                MIN_BARS,
                bars.len()
            )));
        }

        let position = match resolve_position(bars.len(), index) {
            Ok(position) => position,
            Err(e) => {
                let reason = format!("Validation error: {}", e);
                log::info!("Bar state rejection: {}", reason);
                self.rejections
                    .push(RejectionCategory::ValidationError, reason.clone());
                return Err(reason);
            }
        };

        let bar = &bars[position];
        if let Some(field) = bar.missing_field() {
            return Err(self.reject_bar_state(format!(
                "Missing OHLC data: {} is NaN at bar {}",
                field, position
            )));
        }

        if bar.high < bar.open {
            return Err(self.reject_bar_state(format!(
                "Invalid OHLC: high ({}) < open ({})",
                bar.high, bar.open
            )));
        }
        if bar.high < bar.close {
            return Err(self.reject_bar_state(format!(
                "Invalid OHLC: high ({}) < close ({})",
                bar.high, bar.close
            )));
        }
        if bar.low > bar.open {
            return Err(self.reject_bar_state(format!(
                "Invalid OHLC: low ({}) > open ({})",
                bar.low, bar.open
            )));
        }
        if bar.low > bar.close {
            return Err(self.reject_bar_state(format!(
                "Invalid OHLC: low ({}) > close ({})",
                bar.low, bar.close
            )));
        }

        Ok(position)
    }

    fn reject_bar_state(&mut self, reason: String) -> String {
        log::info!("Bar state rejection: {}", reason);
        self.rejections.push(RejectionCategory::BarState, reason.clone());
        reason
    }
}

fn resolve_position(len: usize, index: isize) -> GuardResult<usize> {
    let position = if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index as usize)
    };

    position
        .filter(|position| *position < len)
        .ok_or(GuardError::IndexOutOfRange { index, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap()
    }

    fn bar(i: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(start() + Duration::minutes(15 * i), open, high, low, close)
    }

    fn valid_bars(n: usize) -> Vec<Bar> {
        (0..n as i64)
            .map(|i| {
                let base = 1.1000 + i as f64 * 0.0010;
                bar(i, base, base + 0.0020, base - 0.0015, base + 0.0005)
            })
            .collect()
    }

    #[test]
    fn resolves_negative_indices_from_the_end() {
        assert_eq!(resolve_position(3, -2), Ok(1));
        assert_eq!(resolve_position(3, -1), Ok(2));
        assert_eq!(resolve_position(3, 0), Ok(0));
        assert_eq!(
            resolve_position(3, -4),
            Err(GuardError::IndexOutOfRange { index: -4, len: 3 })
        );
        assert_eq!(
            resolve_position(3, 3),
            Err(GuardError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn valid_closed_bar_passes() {
        let mut guard = EntryGuard::default();
        let decision = guard.validate_bar_state(&valid_bars(3), LAST_CLOSED_BAR);
        assert!(decision.accepted, "{}", decision.reason);
        assert!(guard.rejections().is_empty());
    }

    #[test]
    fn single_bar_is_insufficient() {
        let mut guard = EntryGuard::default();
        let decision = guard.validate_bar_state(&valid_bars(1), LAST_CLOSED_BAR);
        assert!(!decision.accepted);
        assert!(decision.reason.contains("Insufficient bars"));
        assert_eq!(guard.get_rejections_summary()[&RejectionCategory::BarState], 1);
    }

    #[test]
    fn missing_field_is_named() {
        let mut guard = EntryGuard::default();
        let mut bars = valid_bars(3);
        bars[1].low = f64::NAN;
        let decision = guard.validate_bar_state(&bars, LAST_CLOSED_BAR);
        assert!(!decision.accepted);
        assert!(decision.reason.contains("low"), "{}", decision.reason);
    }

    #[test]
    fn out_of_range_index_becomes_validation_error() {
        let mut guard = EntryGuard::default();
        let decision = guard.validate_bar_state(&valid_bars(3), 7);
        assert!(!decision.accepted);
        assert!(decision.reason.starts_with("Validation error"));
        let summary = guard.get_rejections_summary();
        assert_eq!(summary[&RejectionCategory::ValidationError], 1);
        assert_eq!(summary[&RejectionCategory::BarState], 0);
    }

    #[test]
    fn each_ohlc_relation_is_cited() {
        let cases = [
            (bar(1, 1.2, 1.1, 1.0, 1.05), "high (1.1) < open (1.2)"),
            (bar(1, 1.05, 1.1, 1.0, 1.2), "high (1.1) < close (1.2)"),
            (bar(1, 1.0, 1.2, 1.05, 1.1), "low (1.05) > open (1)"),
            (bar(1, 1.1, 1.2, 1.05, 1.0), "low (1.05) > close (1)"),
        ];

        for (broken, expected) in cases {
            let mut guard = EntryGuard::default();
            let bars = vec![bar(0, 1.0, 1.3, 0.9, 1.1), broken, bar(2, 1.0, 1.3, 0.9, 1.1)];
            let decision = guard.validate_bar_state(&bars, LAST_CLOSED_BAR);
            assert!(!decision.accepted);
            assert!(decision.reason.contains(expected), "{}", decision.reason);
        }
    }

    #[test]
    fn bar_closes_once_timeframe_elapsed() {
        let guard = EntryGuard::default();
        let open = start();

        let forming = guard.is_bar_closed(open + Duration::minutes(10), open, 15);
        assert!(!forming.accepted);
        assert!(forming.reason.contains("10.0 min elapsed < 15 min"));

        let closed = guard.is_bar_closed(open + Duration::minutes(15), open, 15);
        assert!(closed.accepted);

        let invalid = guard.is_bar_closed(open, open, 0);
        assert!(!invalid.accepted);
    }

    #[test]
    fn disabled_noise_filter_ignores_movement() {
        let mut guard = EntryGuard::default();
        for pips in [0.0, 0.01, -3.0, f64::NAN, 1e12] {
            let decision = guard.filter_tick_noise(pips);
            assert_eq!(decision, GuardDecision::accept("DISABLED - PASS"));
        }
        assert!(guard.rejections().is_empty());
    }

    #[test]
    fn enabled_noise_filter_uses_absolute_movement() {
        let mut guard = EntryGuard::new(GuardConfig {
            enable_noise_filter: true,
            min_pips_movement: 5.0,
            ..GuardConfig::default()
        });

        assert!(guard.filter_tick_noise(-6.5).accepted);
        assert!(guard.filter_tick_noise(5.0).accepted);

        let rejected = guard.filter_tick_noise(2.0);
        assert!(!rejected.accepted);
        assert_eq!(rejected.reason, "Movement 2.00 pips < threshold (5.0)");
        assert_eq!(guard.get_rejections_summary()[&RejectionCategory::TickNoise], 1);
    }

    #[test]
    fn anti_fomo_warns_strictly_below_threshold() {
        let mut guard = EntryGuard::new(GuardConfig {
            enable_anti_fomo: true,
            anti_fomo_bars: 2,
            ..GuardConfig::default()
        });

        let first = guard.check_anti_fomo_cooldown(5);
        assert!(!first.triggered);
        assert!(first.allowed());

        guard.record_signal(10).unwrap();
        let close = guard.check_anti_fomo_cooldown(11);
        assert!(close.allowed());
        assert!(close.triggered);
        assert_eq!(close.bars_since_signal, Some(1));

        let spaced = guard.check_anti_fomo_cooldown(12);
        assert!(spaced.allowed());
        assert!(!spaced.triggered);

        assert_eq!(
            guard.get_rejections_summary()[&RejectionCategory::AntiFomoWarning],
            1
        );
    }

    #[test]
    fn disabled_anti_fomo_has_no_side_effect() {
        let mut guard = EntryGuard::default();
        guard.record_signal(10).unwrap();
        let check = guard.check_anti_fomo_cooldown(10);
        assert!(check.allowed());
        assert_eq!(check.reason, "DISABLED - no check");
        assert!(guard.rejections().is_empty());
    }

    #[test]
    fn bar_state_failure_short_circuits_entry() {
        let mut guard = EntryGuard::new(GuardConfig {
            enable_noise_filter: true,
            min_pips_movement: 5.0,
            enable_anti_fomo: true,
            anti_fomo_bars: 10,
        });
        guard.record_signal(0).unwrap();

        let decision = guard.validate_entry(&valid_bars(1), LAST_CLOSED_BAR, Some(0.5));
        assert!(!decision.accepted);
        assert!(decision.reason.starts_with("Bar state invalid: Insufficient bars"));
        assert_eq!(guard.rejections().len(), 1);
    }

    #[test]
    fn record_signal_refuses_earlier_bar() {
        let mut guard = EntryGuard::default();
        guard.record_signal(20).unwrap();
        assert!(guard.record_signal(19).is_err());
        assert_eq!(guard.last_signal_bar(), Some(20));
    }

    #[test]
    fn reset_clears_log_but_keeps_config_and_history() {
        let config = GuardConfig {
            enable_noise_filter: true,
            min_pips_movement: 3.0,
            ..GuardConfig::default()
        };
        let mut guard = EntryGuard::new(config.clone());
        guard.record_signal(4).unwrap();
        guard.filter_tick_noise(1.0);
        assert_eq!(guard.get_guard_status().total_rejections, 1);

        guard.reset_rejections_log();
        let status = guard.get_guard_status();
        assert_eq!(status.config, config);
        assert_eq!(status.last_signal_bar, Some(4));
        assert_eq!(status.total_rejections, 0);
        assert!(status.rejections_by_category.values().all(|count| *count == 0));
    }

    #[test]
    fn status_serializes_with_category_names() {
        let mut guard = EntryGuard::default();
        guard.validate_bar_state(&[], LAST_CLOSED_BAR);
        let json = guard.get_guard_status().to_json().unwrap();
        assert!(json.contains("\"bar-state\": 1"));
        assert!(json.contains("\"enable_noise_filter\": false"));
    }
}

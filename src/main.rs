// src/main.rs
use chrono::{Duration as ChronoDuration, Utc};
use entry_guard::analysis::price_movement_pips;
use entry_guard::config::{Config, GuardConfig};
use entry_guard::domain::errors::AppResult;
use entry_guard::domain::models::Bar;
use entry_guard::trading::{SharedEntryGuard, LAST_CLOSED_BAR};
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting entry_guard v{}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Market {} on {}m bars, pip size {}",
        config.market.symbol,
        config.market.timeframe_minutes,
        config.market.pip_size
    );

    let bars = demo_bars(&config, 13);

    // Scenario A: default guard, valid bars
    let guard = SharedEntryGuard::new(GuardConfig::default());
    let decision = guard.validate_entry(&bars[..3], LAST_CLOSED_BAR, None);
    log::info!("[A] default guard, valid bars -> {}", decision);

    // Scenario B: closed bar with high below close
    let mut broken = bars[..3].to_vec();
    broken[1].high = broken[1].close - 0.0005;
    let decision = guard.validate_entry(&broken, LAST_CLOSED_BAR, None);
    log::info!("[B] high < close -> {}", decision);

    // Scenario C: noise filter enabled, 2 pip move
    let noise_guard = SharedEntryGuard::new(GuardConfig {
        enable_noise_filter: true,
        min_pips_movement: 5.0,
        ..GuardConfig::default()
    });
    let movement = price_movement_pips(bars[1].open, bars[1].open + 0.0002, config.market.pip_size)?;
    let decision = noise_guard.validate_entry(&bars[..3], LAST_CLOSED_BAR, Some(movement));
    log::info!("[C] {:.2} pip move -> {}", movement, decision);

    // Scenario D: anti-FOMO warns but never blocks, with a concurrent status reader
    let fomo_guard = SharedEntryGuard::new(GuardConfig {
        enable_anti_fomo: true,
        anti_fomo_bars: 2,
        ..GuardConfig::default()
    });

    let reporter_guard = fomo_guard.clone();
    let reporter = tokio::spawn(async move {
        for _ in 0..3 {
            let summary = reporter_guard.get_rejections_summary();
            log::info!("Status reader: {:?}", summary);
            sleep(Duration::from_millis(20)).await;
        }
    });

    fomo_guard.record_signal(10)?;
    let decision = fomo_guard.validate_entry(&bars, 11, None);
    log::info!("[D] 1 bar after signal -> {}", decision);

    if reporter.await.is_err() {
        log::error!("Status reader task failed");
    }

    // Configured guard on live-style data
    let live_guard = SharedEntryGuard::new(config.guard.clone());
    let now = Utc::now();
    let closed = live_guard.is_bar_closed(
        now,
        bars[bars.len() - 1].open_time,
        config.market.timeframe_minutes,
    );
    log::info!("Forming bar check -> {}", closed);
    let decision = live_guard.validate_entry(&bars, LAST_CLOSED_BAR, None);
    log::info!("Configured guard -> {}", decision);

    for (name, shared) in [
        ("default", &guard),
        ("noise", &noise_guard),
        ("anti-fomo", &fomo_guard),
        ("configured", &live_guard),
    ] {
        log::info!("{} guard status:\n{}", name, shared.get_guard_status().to_json()?);
    }

    log::info!("Done.");
    Ok(())
}

/// Rising bars ending with one that opened half a timeframe ago.
fn demo_bars(config: &Config, count: usize) -> Vec<Bar> {
    let timeframe = config.market.timeframe_minutes.max(1);
    let first_open = Utc::now()
        - ChronoDuration::minutes(timeframe * (count as i64 - 1))
        - ChronoDuration::minutes(timeframe / 2);

    (0..count)
        .map(|i| {
            let open = 1.1000 + i as f64 * 0.0008;
            Bar::new(
                first_open + ChronoDuration::minutes(timeframe * i as i64),
                open,
                open + 0.0012,
                open - 0.0006,
                open + 0.0008,
            )
        })
        .collect()
}

// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use dotenv::dotenv;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Entry guard application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entry guard checks
    pub guard: GuardConfig,

    /// Market the guard is evaluating
    pub market: MarketConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Guard configuration, fixed when the guard is constructed.
///
/// Bar-state validation is not listed here because it cannot be turned off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Reject entries whose price movement is below `min_pips_movement`
    pub enable_noise_filter: bool,

    /// Minimum absolute movement in pips
    pub min_pips_movement: f64,

    /// Warn when entries come within `anti_fomo_bars` of the last signal
    pub enable_anti_fomo: bool,

    /// Cooldown length in bars
    pub anti_fomo_bars: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enable_noise_filter: false,
            min_pips_movement: 2.0,
            enable_anti_fomo: false,
            anti_fomo_bars: 3,
        }
    }
}

impl GuardConfig {
    pub fn validate(&self) -> AppResult<()> {
        if !self.min_pips_movement.is_finite() || self.min_pips_movement < 0.0 {
            return Err(AppError::Config(format!(
                "min_pips_movement must be a non-negative number, got {}",
                self.min_pips_movement
            )));
        }
        Ok(())
    }
}

/// Market configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Symbol (e.g., "EURUSD")
    pub symbol: String,

    /// Bar timeframe in minutes
    pub timeframe_minutes: i64,

    /// Price value of one pip
    pub pip_size: Decimal,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            timeframe_minutes: 15,
            pip_size: dec!(0.0001),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            to_file: false,
            file_path: None,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let guard_defaults = GuardConfig::default();
        let guard_config = GuardConfig {
            enable_noise_filter: env_or(
                "GUARD_ENABLE_NOISE_FILTER",
                guard_defaults.enable_noise_filter,
            ),
            min_pips_movement: env_or("GUARD_MIN_PIPS_MOVEMENT", guard_defaults.min_pips_movement),
            enable_anti_fomo: env_or("GUARD_ENABLE_ANTI_FOMO", guard_defaults.enable_anti_fomo),
            anti_fomo_bars: env_or("GUARD_ANTI_FOMO_BARS", guard_defaults.anti_fomo_bars),
        };
        guard_config.validate()?;

        let market_defaults = MarketConfig::default();
        let market_config = MarketConfig {
            symbol: env::var("MARKET_SYMBOL").unwrap_or(market_defaults.symbol),
            timeframe_minutes: env_or(
                "MARKET_TIMEFRAME_MINUTES",
                market_defaults.timeframe_minutes,
            ),
            pip_size: env_or("MARKET_PIP_SIZE", market_defaults.pip_size),
        };

        let logging_config = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            to_file: env_or("LOG_TO_FILE", false),
            file_path: env::var("LOG_FILE_PATH").ok(),
        };

        Ok(Config {
            guard: guard_config,
            market: market_config,
            logging: logging_config,
        })
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path)
            .map_err(|e| AppError::Config(format!("Failed to open config file: {}", e)))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;

        config.guard.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);

        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path).map_err(|e| {
                    AppError::Config(format!("Failed to create log file: {}", e))
                })?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        builder
            .try_init()
            .map_err(|e| AppError::Config(format!("Failed to initialize logger: {}", e)))?;

        Ok(())
    }
}

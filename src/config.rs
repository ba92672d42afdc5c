// Application configuration
//
// Layered: built-in defaults, then an optional trendbot.toml, then
// TRENDBOT_* environment variables (sections separated by "__", e.g.
// TRENDBOT_BROKER__PASSWORD). Built once at startup and never mutated.

use anyhow::Context;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Error;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub trading: TradingConfig,
    pub strategy: StrategyConfig,
    pub data: DataConfig,
    pub scheduler: SchedulerConfig,
}

/// Broker gateway credentials and endpoint
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub login: u64,
    pub password: String,
    pub server: String,
    /// Base URL of the terminal's REST bridge
    pub bridge_url: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            login: 0,
            password: String::new(),
            server: "MetaQuotes-Demo".to_string(),
            bridge_url: "http://127.0.0.1:8228".to_string(),
        }
    }
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .field("bridge_url", &self.bridge_url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub symbol: String,
    pub lot_size: f64,
    /// Maximum slippage in points
    pub max_slippage: u32,
    pub magic: u64,
    /// Skip a signal whose side matches the last filled order
    pub suppress_repeat_orders: bool,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            lot_size: 0.1,
            max_slippage: 5,
            magic: 123456,
            suppress_repeat_orders: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    /// Enter the bar after a new all-time high, exit at an ATR profit target
    Breakout,
    /// Buy below the lower band, sell above the upper band
    MeanReversion,
    /// Short/long SMA trend filter
    SmaCrossover,
}

impl std::fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyMode::Breakout => write!(f, "breakout"),
            StrategyMode::MeanReversion => write!(f, "mean_reversion"),
            StrategyMode::SmaCrossover => write!(f, "sma_crossover"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub mode: StrategyMode,
    pub band_window: usize,
    /// Band half-width in standard deviations
    pub band_width: f64,
    pub atr_period: usize,
    /// Profit target distance in ATRs above the entry fill
    pub atr_multiple: f64,
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            mode: StrategyMode::Breakout,
            band_window: 20,
            band_width: 2.0,
            atr_period: 42,
            atr_multiple: 10.0,
            short_window: 10,
            long_window: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub base_url: String,
    /// History span requested per cycle, e.g. "1mo" or "5y"
    pub range: String,
    /// Bar interval, e.g. "1h" or "1d"
    pub interval: String,
    /// Compare against a fresh quote instead of the last close
    pub use_live_quote: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            range: "5y".to_string(),
            interval: "1d".to_string(),
            use_live_quote: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            request_timeout_secs: 30,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Load from ./trendbot.toml (optional), `extra_file` (required if given) and the environment
    pub fn load(extra_file: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = Config::builder().add_source(File::with_name("trendbot").required(false));
        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path));
        }
        Self::finish(builder, None)
    }

    fn finish(
        builder: ConfigBuilder<config::builder::DefaultState>,
        env: Option<HashMap<String, String>>,
    ) -> anyhow::Result<Self> {
        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix("TRENDBOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document (plus optional env overrides), mainly for tests
    pub fn from_toml(toml: &str, env: Option<HashMap<String, String>>) -> anyhow::Result<Self> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder, env)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let s = &self.strategy;
        if self.trading.symbol.is_empty() {
            return Err(Error::Config("trading.symbol must not be empty".into()));
        }
        if self.trading.lot_size <= 0.0 {
            return Err(Error::Config(format!(
                "trading.lot_size must be positive, got {}",
                self.trading.lot_size
            )));
        }
        if s.band_window == 0 || s.atr_period == 0 || s.short_window == 0 || s.long_window == 0 {
            return Err(Error::Config("indicator windows must be at least 1".into()));
        }
        if s.band_window < 2 {
            return Err(Error::Config(format!(
                "strategy.band_window must be at least 2 for a sample deviation, got {}",
                s.band_window
            )));
        }
        for (name, value) in [("band_width", s.band_width), ("atr_multiple", s.atr_multiple)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "strategy.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if s.short_window >= s.long_window {
            return Err(Error::Config(format!(
                "strategy.short_window ({}) must be below strategy.long_window ({})",
                s.short_window, s.long_window
            )));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(Error::Config("scheduler.interval_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml("", Some(HashMap::new())).unwrap();

        assert_eq!(config.trading.symbol, "AAPL");
        assert_eq!(config.trading.lot_size, 0.1);
        assert_eq!(config.strategy.mode, StrategyMode::Breakout);
        assert_eq!(config.strategy.atr_period, 42);
        assert_eq!(config.scheduler.interval(), Duration::from_secs(300));
        assert!(!config.trading.suppress_repeat_orders);
    }

    #[test]
    fn test_toml_sections() {
        let toml = r#"
            [trading]
            symbol = "EURUSD"

            [strategy]
            mode = "mean_reversion"
            band_window = 126
        "#;
        let config = AppConfig::from_toml(toml, Some(HashMap::new())).unwrap();

        assert_eq!(config.trading.symbol, "EURUSD");
        assert_eq!(config.strategy.mode, StrategyMode::MeanReversion);
        assert_eq!(config.strategy.band_window, 126);
        // Untouched fields keep their defaults
        assert_eq!(config.strategy.band_width, 2.0);
    }

    #[test]
    fn test_env_overrides_file() {
        let env = HashMap::from([
            ("TRENDBOT_TRADING__SYMBOL".to_string(), "MSFT".to_string()),
            ("TRENDBOT_SCHEDULER__INTERVAL_SECS".to_string(), "60".to_string()),
        ]);
        let config = AppConfig::from_toml("[trading]\nsymbol = \"EURUSD\"", Some(env)).unwrap();

        assert_eq!(config.trading.symbol, "MSFT");
        assert_eq!(config.scheduler.interval_secs, 60);
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let toml = "[strategy]\nshort_window = 50\nlong_window = 30";
        let result = AppConfig::from_toml(toml, Some(HashMap::new()));

        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("short_window"));
    }

    #[test]
    fn test_band_window_below_two_rejected() {
        let result = AppConfig::from_toml("[strategy]\nband_window = 1", Some(HashMap::new()));

        assert!(format!("{:#}", result.unwrap_err()).contains("band_window"));
    }

    #[test]
    fn test_negative_multipliers_rejected() {
        for (key, value) in [("band_width", "-1.0"), ("atr_multiple", "-2.0")] {
            let toml = format!("[strategy]\n{} = {}", key, value);
            let result = AppConfig::from_toml(&toml, Some(HashMap::new()));

            assert!(format!("{:#}", result.unwrap_err()).contains(key));
        }

        let zero_width = "[strategy]\nband_width = 0.0";
        assert!(AppConfig::from_toml(zero_width, Some(HashMap::new())).is_ok());
    }

    #[test]
    fn test_password_is_redacted() {
        let broker = BrokerConfig {
            password: "hunter2".to_string(),
            ..BrokerConfig::default()
        };
        let debug = format!("{:?}", broker);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}

use crate::error::DataError;
use crate::models::{Bar, PriceSeries};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+0.2% per bar average)
    Uptrend,
    /// Steady downtrend with noise (-0.2% per bar average)
    Downtrend,
    /// Sideways/choppy market (±1% around mean)
    Sideways,
    /// High volatility (±5% large swings)
    Volatile,
    /// Long consolidation followed by a breakout to new highs
    Breakout,
    /// Price never moves
    Constant,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 6] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
        MarketScenario::Breakout,
        MarketScenario::Constant,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MarketScenario::Uptrend => "📈 Uptrend",
            MarketScenario::Downtrend => "📉 Downtrend",
            MarketScenario::Sideways => "↔️  Sideways (mean-reverting)",
            MarketScenario::Volatile => "⚡ Volatile (±5% swings)",
            MarketScenario::Breakout => "🚀 Consolidation then breakout",
            MarketScenario::Constant => "➖ Constant price",
        }
    }
}

/// Generates synthetic OHLC bars for backtesting
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 150.0,
        }
    }

    /// Generate bars for a specific market scenario
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_bars` - Number of bars to generate
    /// * `interval_minutes` - Minutes between bars (1440 for daily)
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_bars: usize,
        interval_minutes: i64,
    ) -> Vec<Bar> {
        let start_time = Utc::now() - Duration::minutes(num_bars as i64 * interval_minutes);
        let mut bars = Vec::with_capacity(num_bars);
        let mut current_price = self.base_price;
        let mean_price = self.base_price;

        for i in 0..num_bars {
            let timestamp = start_time + Duration::minutes(i as i64 * interval_minutes);

            if scenario == MarketScenario::Constant {
                bars.push(Bar {
                    timestamp,
                    open: current_price,
                    high: current_price,
                    low: current_price,
                    close: current_price,
                });
                continue;
            }

            let change = match scenario {
                MarketScenario::Uptrend => {
                    current_price * (0.002 + self.rng.gen_range(-0.001..0.001))
                }
                MarketScenario::Downtrend => {
                    current_price * (-0.002 + self.rng.gen_range(-0.001..0.001))
                }
                MarketScenario::Sideways => {
                    // 10% pull to mean plus ±1% noise
                    (mean_price - current_price) * 0.1
                        + current_price * self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::Volatile => current_price * self.rng.gen_range(-0.05..0.05),
                MarketScenario::Breakout => {
                    if i < num_bars / 2 {
                        (mean_price - current_price) * 0.2
                            + current_price * self.rng.gen_range(-0.005..0.005)
                    } else {
                        current_price * (0.01 + self.rng.gen_range(-0.004..0.004))
                    }
                }
                MarketScenario::Constant => 0.0,
            };
            current_price += change;

            // Prevent price from going too low
            if current_price < self.base_price * 0.5 {
                current_price = self.base_price * 0.5;
            }

            let bar = self.create_bar(current_price, timestamp);
            bars.push(bar);
        }

        bars
    }

    /// Generate a validated series
    pub fn generate_series(
        &mut self,
        symbol: &str,
        scenario: MarketScenario,
        num_bars: usize,
        interval_minutes: i64,
    ) -> Result<PriceSeries, DataError> {
        let bars = self.generate(scenario, num_bars, interval_minutes);
        PriceSeries::new(symbol, bars)
    }

    /// Helper to create a bar from price and timestamp
    fn create_bar(&mut self, price: f64, timestamp: DateTime<Utc>) -> Bar {
        // Create realistic OHLC from close price
        let noise_pct = 0.002; // ±0.2% intrabar movement

        let high = price * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = price * (1.0 - self.rng.gen_range(0.0..noise_pct));

        // Generate open and clamp it between low and high
        let open_raw = price * (1.0 + self.rng.gen_range(-noise_pct..noise_pct));
        let open = open_raw.clamp(low, high);

        Bar {
            timestamp,
            open,
            high,
            low,
            close: price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Uptrend, 500, 60);

        assert_eq!(bars.len(), 500);

        let first_price = bars.first().unwrap().close;
        let last_price = bars.last().unwrap().close;

        assert!(
            last_price > first_price,
            "Uptrend should end higher: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Downtrend, 500, 60);

        let first_price = bars.first().unwrap().close;
        let last_price = bars.last().unwrap().close;

        assert!(
            last_price < first_price,
            "Downtrend should end lower: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_sideways() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Sideways, 500, 60);

        // Should stay roughly around base price (±10%)
        let base = gen.base_price;
        for bar in &bars {
            assert!(
                bar.close > base * 0.9 && bar.close < base * 1.1,
                "Sideways should stay near base: {} vs {}",
                bar.close,
                base
            );
        }
    }

    #[test]
    fn test_constant_scenario() {
        let mut gen = SyntheticDataGenerator::new(7);
        let bars = gen.generate(MarketScenario::Constant, 50, 1440);
        assert!(bars.iter().all(|b| b.close == 150.0 && b.high == 150.0 && b.low == 150.0));
    }

    #[test]
    fn test_series_is_valid() {
        let mut gen = SyntheticDataGenerator::new(42);
        let series = gen
            .generate_series("SYNTH", MarketScenario::Volatile, 100, 60)
            .unwrap();

        assert_eq!(series.len(), 100);
        assert_eq!(series.symbol(), "SYNTH");
    }

    #[test]
    fn test_ohlc_consistency() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Volatile, 100, 60);

        for bar in &bars {
            assert!(bar.high >= bar.close, "High should be >= close");
            assert!(bar.high >= bar.open, "High should be >= open");
            assert!(bar.low <= bar.close, "Low should be <= close");
            assert!(bar.low <= bar.open, "Low should be <= open");
        }
    }
}

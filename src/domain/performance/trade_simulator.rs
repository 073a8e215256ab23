//! Single-pass trade simulation over buy/sell point signals.
//!
//! The simulator alternates between waiting for a buy signal and waiting for a
//! sell signal. A buy closes the short leg (profit against the last sell
//! price), a sell closes the long leg (profit against the last buy price).
//! Rows carrying only the signal that is not awaited are ignored.

use crate::domain::errors::DataAlignmentError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Waiting for a buy signal; entered after a sell
    WaitSellClose,
    /// Waiting for a sell signal; entered after a buy
    WaitBuyClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeEvent {
    pub row: usize,
    pub mode: Mode,
    pub price: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradePerformance {
    pub performance_long: f64,
    pub performance_short: f64,
    pub long_count: usize,
    pub short_count: usize,
    pub long_profitable: usize,
    pub short_profitable: usize,
    pub longs: Vec<TradeEvent>,
    pub shorts: Vec<TradeEvent>,
}

impl TradePerformance {
    pub fn total(&self) -> f64 {
        self.performance_long + self.performance_short
    }

    pub fn long_profitable_pct(&self) -> f64 {
        pct(self.long_profitable, self.long_count)
    }

    pub fn short_profitable_pct(&self) -> f64 {
        pct(self.short_profitable, self.short_count)
    }

    /// Mean profit over all closed trades of both directions.
    pub fn profit_per_trade(&self) -> f64 {
        let trades = self.long_count + self.short_count;
        if trades == 0 {
            0.0
        } else {
            self.total() / trades as f64
        }
    }
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

#[derive(Debug, Clone)]
pub struct TradeSimulator {
    mode: Mode,
    performance: TradePerformance,
}

impl Default for TradeSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeSimulator {
    pub fn new() -> Self {
        Self {
            mode: Mode::WaitSellClose,
            performance: TradePerformance {
                performance_long: 0.0,
                performance_short: 0.0,
                long_count: 0,
                short_count: 0,
                long_profitable: 0,
                short_profitable: 0,
                longs: Vec::new(),
                shorts: Vec::new(),
            },
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Feeds one row. Rows must arrive in time order.
    pub fn step(&mut self, row: usize, sell_signal: bool, buy_signal: bool, price: f64) {
        let perf = &mut self.performance;
        match self.mode {
            Mode::WaitSellClose if buy_signal => {
                let profit = perf.longs.last().map_or(0.0, |last| last.price - price);
                perf.performance_short += profit;
                perf.short_count += 1;
                if profit > 0.0 {
                    perf.short_profitable += 1;
                }
                perf.shorts.push(TradeEvent {
                    row,
                    mode: self.mode,
                    price,
                    profit,
                });
                self.mode = Mode::WaitBuyClose;
            }
            Mode::WaitBuyClose if sell_signal => {
                let profit = perf.shorts.last().map_or(0.0, |last| price - last.price);
                perf.performance_long += profit;
                perf.long_count += 1;
                if profit > 0.0 {
                    perf.long_profitable += 1;
                }
                perf.longs.push(TradeEvent {
                    row,
                    mode: self.mode,
                    price,
                    profit,
                });
                self.mode = Mode::WaitSellClose;
            }
            _ => {}
        }
    }

    pub fn finish(self) -> TradePerformance {
        self.performance
    }

    /// Runs the simulation over aligned signal and price sequences.
    pub fn run(
        sell_signal: &[bool],
        buy_signal: &[bool],
        price: &[f64],
    ) -> Result<TradePerformance, DataAlignmentError> {
        for (column, len) in [("buy_signal", buy_signal.len()), ("price", price.len())] {
            if len != sell_signal.len() {
                return Err(DataAlignmentError::ColumnLength {
                    column: column.to_string(),
                    expected: sell_signal.len(),
                    actual: len,
                });
            }
        }

        let mut simulator = Self::new();
        for (row, ((&sell, &buy), &p)) in sell_signal.iter().zip(buy_signal).zip(price).enumerate() {
            simulator.step(row, sell, buy, p);
        }
        Ok(simulator.finish())
    }
}

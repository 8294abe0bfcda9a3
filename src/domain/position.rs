//! Position state and closed trades.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Flat,
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Flat => 0.0,
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Flat => "flat",
            Direction::Long => "long",
            Direction::Short => "short",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    StopLoss,
    /// Forced close once equity is exhausted.
    Liquidation,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => f.write_str("signal"),
            ExitReason::StopLoss => f.write_str("stop_loss"),
            ExitReason::Liquidation => f.write_str("liquidation"),
        }
    }
}

/// The single open position. `Direction::Flat` means no position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Position {
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub entry_index: usize,
    pub entry_commission: f64,
    pub stop_price: Option<f64>,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.direction == Direction::Flat
    }

    /// Notional at entry.
    pub fn entry_notional(&self) -> f64 {
        self.size * self.entry_price
    }

    /// Mark-to-market value of the position at `price`.
    ///
    /// A short is worth its escrowed entry notional plus the open profit,
    /// i.e. `size * (2 * entry - price)`.
    pub fn market_value(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Flat => 0.0,
            Direction::Long => self.size * price,
            Direction::Short => self.size * (2.0 * self.entry_price - price),
        }
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.direction.sign() * self.size * (price - self.entry_price)
    }

    /// Whether the stop lies inside the bar's traded range.
    pub fn stop_triggered(&self, low: f64, high: f64) -> bool {
        match (self.direction, self.stop_price) {
            (Direction::Long, Some(stop)) => low <= stop,
            (Direction::Short, Some(stop)) => high >= stop,
            _ => false,
        }
    }
}

/// A closed round trip. Immutable once appended to the trade log.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub commission: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }

    /// Bars held, counting from the fill bar.
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position() -> Position {
        Position {
            direction: Direction::Long,
            size: 100.0,
            entry_price: 50.0,
            entry_index: 3,
            entry_commission: 5.0,
            stop_price: Some(45.0),
        }
    }

    fn short_position() -> Position {
        Position {
            direction: Direction::Short,
            size: 100.0,
            entry_price: 100.0,
            entry_index: 3,
            entry_commission: 10.0,
            stop_price: Some(110.0),
        }
    }

    #[test]
    fn flat_position_defaults() {
        let pos = Position::flat();
        assert!(pos.is_flat());
        assert_eq!(pos.market_value(123.0), 0.0);
        assert_eq!(pos.unrealized_pnl(123.0), 0.0);
        assert!(!pos.stop_triggered(0.0, 1e9));
    }

    #[test]
    fn market_value_long() {
        assert!((long_position().market_value(55.0) - 5500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn market_value_short_includes_open_profit() {
        let pos = short_position();
        // escrow 10_000 + profit 500
        assert!((pos.market_value(95.0) - 10_500.0).abs() < f64::EPSILON);
        assert!((pos.market_value(110.0) - 9_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_by_direction() {
        assert!((long_position().unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((short_position().unrealized_pnl(90.0) - 1000.0).abs() < f64::EPSILON);
        assert!((short_position().unrealized_pnl(110.0) + 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn long_stop_uses_bar_low() {
        let pos = long_position();
        assert!(pos.stop_triggered(44.0, 60.0));
        assert!(pos.stop_triggered(45.0, 60.0));
        assert!(!pos.stop_triggered(45.5, 60.0));
    }

    #[test]
    fn short_stop_uses_bar_high() {
        let pos = short_position();
        assert!(pos.stop_triggered(90.0, 110.0));
        assert!(!pos.stop_triggered(90.0, 109.0));
    }

    #[test]
    fn no_stop_never_triggers() {
        let mut pos = long_position();
        pos.stop_price = None;
        assert!(!pos.stop_triggered(0.0, 0.0));
    }

    #[test]
    fn direction_helpers() {
        assert_eq!(Direction::Short.sign(), -1.0);
        assert_eq!(Direction::Long.to_string(), "long");
    }
}

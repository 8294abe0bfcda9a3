//! Account state and equity tracking.

use chrono::NaiveDateTime;

use super::position::{Direction, Position};

/// One mark-to-market snapshot, taken at a bar's close.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub cash: f64,
    pub position_value: f64,
    pub equity: f64,
    pub direction: Direction,
}

/// Cash plus the single exclusive position.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub cash: f64,
    pub position: Position,
}

impl Account {
    pub fn new(initial_cash: f64) -> Self {
        Account {
            cash: initial_cash,
            position: Position::flat(),
        }
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    /// Snapshot the account marked at `price`.
    pub fn mark(&self, index: usize, timestamp: NaiveDateTime, price: f64) -> EquityPoint {
        let position_value = self.position.market_value(price);
        EquityPoint {
            index,
            timestamp,
            cash: self.cash,
            position_value,
            equity: self.cash + position_value,
            direction: self.position.direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn new_account_is_flat() {
        let account = Account::new(10_000.0);
        assert!(account.position.is_flat());
        assert!((account.equity(123.0) - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mark_reconciles_equity() {
        let mut account = Account::new(10_000.0);
        account.cash = 4_000.0;
        account.position = Position {
            direction: Direction::Long,
            size: 60.0,
            entry_price: 100.0,
            entry_index: 0,
            entry_commission: 0.0,
            stop_price: None,
        };

        let point = account.mark(5, ts(), 110.0);
        assert_eq!(point.index, 5);
        assert_eq!(point.direction, Direction::Long);
        assert!((point.position_value - 6_600.0).abs() < f64::EPSILON);
        assert!((point.equity - (point.cash + point.position_value)).abs() < 1e-9);
        assert!((point.equity - 10_600.0).abs() < f64::EPSILON);
    }
}

//! Order management: fills, sizing, commissions and stop-loss triggers.
//!
//! The account holds at most one position (exclusive orders). Every fill is
//! charged `commission_rate * notional`; entries that would need more cash
//! than the account holds are skipped and reported, never executed.

use tracing::{debug, warn};

use super::backtest::{BacktestConfig, EngineEvent, PositionSizing, SkipReason};
use super::ohlcv::Bar;
use super::portfolio::Account;
use super::position::{Direction, ExitReason, Position, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn direction(self) -> Direction {
        match self {
            Side::Buy => Direction::Long,
            Side::Sell => Direction::Short,
        }
    }
}

/// A market order waiting for the next bar's open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRequest {
    pub side: Side,
    pub stop_price: Option<f64>,
    pub signal_index: usize,
}

/// Outcome of [`apply`]: the new account state, the trade closed by a
/// reversal (if any), and recoverable events raised along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub account: Account,
    pub trade: Option<Trade>,
    pub events: Vec<EngineEvent>,
}

/// commission = notional * commission_rate
pub fn calculate_commission(notional: f64, config: &BacktestConfig) -> f64 {
    notional * config.commission_rate
}

/// Units to buy or sell for a new position.
///
/// Fractional sizing buys whole units only, leaving room for the entry
/// commission: `floor(equity * fraction / (price * (1 + rate)))`.
pub fn order_size(sizing: PositionSizing, equity: f64, price: f64, commission_rate: f64) -> f64 {
    match sizing {
        PositionSizing::FractionOfEquity(fraction) => {
            (equity * fraction / (price * (1.0 + commission_rate))).floor()
        }
        PositionSizing::FixedUnits(units) => units,
    }
}

/// Fill `order` at `fill_price` on bar `index`.
///
/// An order in the direction already held is ignored. An order against the
/// open position closes it first (one trade, `ExitReason::Signal`) and then
/// opens the new position at the same price. If the new entry is rejected the
/// close still stands and a `SkippedOrder` event is returned.
pub fn apply(
    order: &OrderRequest,
    index: usize,
    fill_price: f64,
    account: &Account,
    config: &BacktestConfig,
) -> Applied {
    let mut next = account.clone();
    let mut events = Vec::new();
    let target = order.side.direction();

    if next.position.direction == target {
        return Applied {
            account: next,
            trade: None,
            events,
        };
    }

    let trade = close_position(&mut next, index, fill_price, ExitReason::Signal, config);

    if let Err(reason) = open_position(&mut next, order, index, fill_price, config) {
        warn!(
            index,
            signal_index = order.signal_index,
            side = ?order.side,
            ?reason,
            "order skipped"
        );
        events.push(EngineEvent::SkippedOrder {
            index,
            side: order.side,
            reason,
        });
    }

    Applied {
        account: next,
        trade,
        events,
    }
}

fn open_position(
    account: &mut Account,
    order: &OrderRequest,
    index: usize,
    price: f64,
    config: &BacktestConfig,
) -> Result<(), SkipReason> {
    let direction = order.side.direction();

    if let Some(stop) = order.stop_price {
        let wrong_side = match direction {
            Direction::Long => stop >= price,
            Direction::Short => stop <= price,
            Direction::Flat => false,
        };
        if wrong_side {
            return Err(SkipReason::StopBeyondFill { stop, fill: price });
        }
    }

    let equity = account.equity(price);
    let size = order_size(
        config.position_sizing,
        equity,
        price,
        config.commission_rate,
    );

    if size <= 0.0 {
        return Err(SkipReason::InsufficientCash {
            required: price + calculate_commission(price, config),
            available: account.cash,
        });
    }

    let notional = size * price;
    let commission = calculate_commission(notional, config);
    let required = notional + commission;

    if required > account.cash {
        return Err(SkipReason::InsufficientCash {
            required,
            available: account.cash,
        });
    }

    account.cash -= required;
    account.position = Position {
        direction,
        size,
        entry_price: price,
        entry_index: index,
        entry_commission: commission,
        stop_price: order.stop_price,
    };

    debug!(
        index,
        signal_index = order.signal_index,
        %direction,
        size,
        price,
        commission,
        "position opened"
    );
    Ok(())
}

/// Close the open position at `price`, returning the finished trade.
///
/// Long exits receive the sale proceeds; short exits get back the escrowed
/// entry notional plus the price difference. Both pay exit commission. PnL
/// includes the round-trip commission.
pub fn close_position(
    account: &mut Account,
    index: usize,
    price: f64,
    exit_reason: ExitReason,
    config: &BacktestConfig,
) -> Option<Trade> {
    if account.position.is_flat() {
        return None;
    }
    let position = std::mem::take(&mut account.position);

    let exit_value = position.size * price;
    let exit_commission = calculate_commission(exit_value, config);

    account.cash += position.market_value(price) - exit_commission;

    let pnl = position.unrealized_pnl(price) - position.entry_commission - exit_commission;
    let entry_notional = position.entry_notional();
    let pnl_pct = if entry_notional > 0.0 {
        pnl / entry_notional * 100.0
    } else {
        0.0
    };

    debug!(index, direction = %position.direction, price, pnl, %exit_reason, "position closed");

    Some(Trade {
        entry_index: position.entry_index,
        exit_index: index,
        direction: position.direction,
        entry_price: position.entry_price,
        exit_price: price,
        size: position.size,
        pnl,
        pnl_pct,
        commission: position.entry_commission + exit_commission,
        exit_reason,
    })
}

/// Check the pending stop against the bar's [low, high] range.
///
/// A triggered stop fills at the stop price itself.
pub fn check_stop(
    account: &mut Account,
    index: usize,
    bar: &Bar,
    config: &BacktestConfig,
) -> Option<Trade> {
    if !account.position.stop_triggered(bar.low, bar.high) {
        return None;
    }
    let stop = account.position.stop_price?;
    close_position(account, index, stop, ExitReason::StopLoss, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_config(commission_rate: f64, sizing: PositionSizing) -> BacktestConfig {
        BacktestConfig {
            initial_cash: 10_000.0,
            commission_rate,
            exclusive_orders: true,
            position_sizing: sizing,
        }
    }

    fn buy(stop_price: Option<f64>) -> OrderRequest {
        OrderRequest {
            side: Side::Buy,
            stop_price,
            signal_index: 0,
        }
    }

    fn sell() -> OrderRequest {
        OrderRequest {
            side: Side::Sell,
            stop_price: None,
            signal_index: 0,
        }
    }

    fn bar(low: f64, high: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: (low + high) / 2.0,
            high,
            low,
            close: (low + high) / 2.0,
            volume: 1000.0,
        }
    }

    #[test]
    fn commission_is_fraction_of_notional() {
        let config = make_config(0.002, PositionSizing::default());
        assert_relative_eq!(calculate_commission(10_000.0, &config), 20.0);
    }

    #[test]
    fn full_equity_sizing_leaves_room_for_commission() {
        let size = order_size(PositionSizing::FractionOfEquity(1.0), 10_000.0, 99.0, 0.01);
        // 10_000 / (99 * 1.01) = 100.01 → 100 units
        assert_eq!(size, 100.0);
        assert!(size * 99.0 * 1.01 <= 10_000.0);
    }

    #[test]
    fn fixed_units_sizing() {
        assert_eq!(
            order_size(PositionSizing::FixedUnits(7.0), 10_000.0, 50.0, 0.0),
            7.0
        );
    }

    #[test]
    fn buy_from_flat_opens_long() {
        let config = make_config(0.001, PositionSizing::FractionOfEquity(1.0));
        let account = Account::new(10_000.0);

        let applied = apply(&buy(None), 4, 100.0, &account, &config);

        assert!(applied.trade.is_none());
        assert!(applied.events.is_empty());
        let pos = &applied.account.position;
        assert_eq!(pos.direction, Direction::Long);
        assert_eq!(pos.size, 99.0);
        assert_eq!(pos.entry_index, 4);
        assert_relative_eq!(pos.entry_commission, 9.9, epsilon = 1e-9);
        assert_relative_eq!(applied.account.cash, 10_000.0 - 9_900.0 - 9.9, epsilon = 1e-9);
        // state transition does not mutate the input
        assert!(account.position.is_flat());
    }

    #[test]
    fn sell_from_flat_opens_short_with_escrow() {
        let config = make_config(0.0, PositionSizing::FixedUnits(10.0));
        let account = Account::new(10_000.0);

        let applied = apply(&sell(), 2, 100.0, &account, &config);

        assert_eq!(applied.account.position.direction, Direction::Short);
        assert_relative_eq!(applied.account.cash, 9_000.0);
        assert_relative_eq!(applied.account.equity(100.0), 10_000.0);
        assert_relative_eq!(applied.account.equity(90.0), 10_100.0);
    }

    #[test]
    fn same_direction_order_is_ignored() {
        let config = make_config(0.0, PositionSizing::FixedUnits(10.0));
        let opened = apply(&buy(None), 1, 100.0, &Account::new(10_000.0), &config);
        let again = apply(&buy(None), 2, 120.0, &opened.account, &config);

        assert!(again.trade.is_none());
        assert!(again.events.is_empty());
        assert_eq!(again.account, opened.account);
    }

    #[test]
    fn reversal_closes_then_opens() {
        let config = make_config(0.0, PositionSizing::FixedUnits(10.0));
        let long = apply(&buy(None), 1, 100.0, &Account::new(10_000.0), &config);
        let reversed = apply(&sell(), 5, 110.0, &long.account, &config);

        let trade = reversed.trade.expect("reversal should close the long");
        assert_eq!(trade.direction, Direction::Long);
        assert_eq!(trade.entry_index, 1);
        assert_eq!(trade.exit_index, 5);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert_relative_eq!(trade.pnl, 100.0);
        assert_relative_eq!(trade.pnl_pct, 10.0);

        assert_eq!(reversed.account.position.direction, Direction::Short);
        assert_eq!(reversed.account.position.entry_index, 5);
        assert_relative_eq!(reversed.account.equity(110.0), 10_100.0);
    }

    #[test]
    fn insufficient_cash_skips_order() {
        // cash 100, commission 10%, notional 150 → required 165
        let config = BacktestConfig {
            initial_cash: 100.0,
            commission_rate: 0.1,
            exclusive_orders: true,
            position_sizing: PositionSizing::FixedUnits(1.5),
        };
        let account = Account::new(100.0);

        let applied = apply(&buy(None), 3, 100.0, &account, &config);

        assert!(applied.trade.is_none());
        assert_eq!(applied.account, account);
        assert_eq!(applied.events.len(), 1);
        match &applied.events[0] {
            EngineEvent::SkippedOrder {
                index,
                side,
                reason: SkipReason::InsufficientCash { required, available },
            } => {
                assert_eq!(*index, 3);
                assert_eq!(*side, Side::Buy);
                assert_relative_eq!(*required, 165.0, epsilon = 1e-9);
                assert_relative_eq!(*available, 100.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn price_above_equity_skips_under_fractional_sizing() {
        let config = make_config(0.0, PositionSizing::FractionOfEquity(1.0));
        let account = Account::new(50.0);

        let applied = apply(&buy(None), 0, 100.0, &account, &config);

        assert!(applied.account.position.is_flat());
        assert!(matches!(
            applied.events[0],
            EngineEvent::SkippedOrder {
                reason: SkipReason::InsufficientCash { .. },
                ..
            }
        ));
    }

    #[test]
    fn stop_above_fill_is_rejected() {
        let config = make_config(0.0, PositionSizing::FixedUnits(1.0));
        let applied = apply(&buy(Some(105.0)), 0, 100.0, &Account::new(1_000.0), &config);

        assert!(applied.account.position.is_flat());
        assert!(matches!(
            applied.events[0],
            EngineEvent::SkippedOrder {
                reason: SkipReason::StopBeyondFill { .. },
                ..
            }
        ));
    }

    #[test]
    fn stop_fills_at_stop_price() {
        let config = make_config(0.0, PositionSizing::FixedUnits(10.0));
        let mut account = apply(&buy(Some(95.0)), 1, 100.0, &Account::new(10_000.0), &config).account;

        assert!(check_stop(&mut account, 2, &bar(96.0, 104.0), &config).is_none());

        let trade = check_stop(&mut account, 3, &bar(90.0, 99.0), &config).unwrap();
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_relative_eq!(trade.exit_price, 95.0);
        assert_relative_eq!(trade.pnl, -50.0);
        assert!(account.position.is_flat());
        assert_relative_eq!(account.cash, 9_950.0);
    }

    #[test]
    fn round_trip_pnl_includes_both_commissions() {
        let config = make_config(0.01, PositionSizing::FixedUnits(10.0));
        let mut account = apply(&buy(None), 0, 100.0, &Account::new(10_000.0), &config).account;
        let trade = close_position(&mut account, 1, 110.0, ExitReason::Signal, &config).unwrap();

        // 100 gross - 10 entry - 11 exit
        assert_relative_eq!(trade.pnl, 79.0, epsilon = 1e-9);
        assert_relative_eq!(trade.commission, 21.0, epsilon = 1e-9);
        assert_relative_eq!(account.cash, 10_079.0, epsilon = 1e-9);
    }

    #[test]
    fn close_flat_returns_none() {
        let config = make_config(0.0, PositionSizing::default());
        let mut account = Account::new(1_000.0);
        assert!(close_position(&mut account, 0, 10.0, ExitReason::Signal, &config).is_none());
        assert_relative_eq!(account.cash, 1_000.0);
    }
}

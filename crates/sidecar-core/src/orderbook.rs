//! Orderbook domain records
//!
//! Raw order and tick state as returned by the orderbook contract, plus the
//! formatted limit-order view assembled for clients. Contract numerics arrive
//! as strings and are parsed at formatting time so that a malformed order
//! surfaces as a per-order error instead of poisoning an entire batch.

use cosmwasm_std::{Decimal, Uint128};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the domain-level orderbook records themselves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderbookDomainError {
    #[error("failed to parse tick values field {field}: {value}")]
    ParsingTickValues { field: &'static str, value: String },

    #[error("cannot map percent filled {percent_filled} to an order status")]
    MappingOrderStatus { percent_filled: String },
}

/// Side of the book an order sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Bid,
    Ask,
}

/// Lifecycle status of a limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "partiallyFilled")]
    PartiallyFilled,
    #[serde(rename = "filled")]
    Filled,
    #[serde(rename = "fullyClaimed")]
    FullyClaimed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

/// A raw limit order as returned by the orderbook contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub tick_id: i64,
    pub order_id: i64,
    pub order_direction: OrderDirection,
    pub owner: String,
    pub quantity: String,
    pub placed_quantity: String,
    /// Effective total amount swapped at placement time.
    pub etas: String,
    pub claim_bounty: String,
    /// Placement time in unix nanoseconds, as a string.
    #[serde(rename = "placed_at")]
    pub placed_at: String,
}

impl Order {
    /// Maps the computed percent filled to an order status.
    pub fn status(&self, percent_filled: f64) -> Result<OrderStatus, OrderbookDomainError> {
        if !(0.0..=1.0).contains(&percent_filled) {
            return Err(OrderbookDomainError::MappingOrderStatus {
                percent_filled: percent_filled.to_string(),
            });
        }

        if percent_filled == 0.0 {
            return Ok(OrderStatus::Open);
        }
        if percent_filled < 1.0 {
            return Ok(OrderStatus::PartiallyFilled);
        }
        Ok(OrderStatus::Filled)
    }
}

/// A collection of raw orders with direction helpers.
pub type Orders = Vec<Order>;

/// Returns the subset of orders on the given side of the book.
pub fn orders_by_direction(orders: &[Order], direction: OrderDirection) -> Orders {
    orders
        .iter()
        .filter(|order| order.order_direction == direction)
        .cloned()
        .collect()
}

/// Aggregate swap state for one side of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickValues {
    pub total_amount_of_liquidity: String,
    pub cumulative_total_value: String,
    pub effective_total_amount_swapped: String,
}

impl TickValues {
    /// A tick side is fully filled when everything placed on it has been
    /// swapped through.
    pub fn is_tick_fully_filled(&self) -> Result<bool, OrderbookDomainError> {
        let cumulative: Decimal = self.cumulative_total_value.parse().map_err(|_| {
            OrderbookDomainError::ParsingTickValues {
                field: "cumulative_total_value",
                value: self.cumulative_total_value.clone(),
            }
        })?;
        let swapped: Decimal = self.effective_total_amount_swapped.parse().map_err(|_| {
            OrderbookDomainError::ParsingTickValues {
                field: "effective_total_amount_swapped",
                value: self.effective_total_amount_swapped.clone(),
            }
        })?;

        Ok(cumulative == swapped)
    }
}

/// Bid and ask aggregates for a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickState {
    pub ask_values: TickValues,
    pub bid_values: TickValues,
}

/// Cancelled-but-unrealized amounts per direction. `None` means the contract
/// has not reported the side yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrealizedCancels {
    pub ask_unrealized_cancels: Option<Uint128>,
    pub bid_unrealized_cancels: Option<Uint128>,
}

/// Fully hydrated tick: contract state plus unrealized cancels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookTick {
    pub tick_id: i64,
    pub tick_state: TickState,
    pub unrealized_cancels: UnrealizedCancels,
}

/// Token metadata attached to a formatted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookAsset {
    pub symbol: String,
    pub decimals: u32,
}

/// A limit order formatted for clients: parsed quantities, fill progress,
/// normalized price and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub tick_id: i64,
    pub order_id: i64,
    pub order_direction: OrderDirection,
    pub owner: String,
    pub quantity: Decimal,
    pub etas: String,
    pub claim_bounty: String,
    pub placed_quantity: Decimal,
    pub percent_claimed: Decimal,
    pub total_filled: Decimal,
    pub percent_filled: Decimal,
    pub orderbook_address: String,
    pub price: Decimal,
    pub status: OrderStatus,
    pub output: Decimal,
    pub quote_asset: OrderbookAsset,
    pub base_asset: OrderbookAsset,
    /// Placement time in unix seconds.
    pub placed_at: i64,
}

impl LimitOrder {
    /// An order is claimable once its fill fraction reaches the threshold.
    pub fn is_claimable(&self, fill_threshold: Decimal) -> bool {
        self.percent_filled >= fill_threshold
    }
}

/// Per-orderbook result emitted by the active-orders fan-out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderbookResult {
    pub pool_id: u64,
    pub limit_orders: Vec<LimitOrder>,
    pub is_best_effort: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A raw order annotated with a per-order classification error, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimableOrder {
    pub order: Order,
    pub error: Option<String>,
}

/// All claimable orders found on a single tick, with a tick-level error when
/// the tick could not be classified at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimableOrderbook {
    pub tick: OrderbookTick,
    pub orders: Vec<ClaimableOrder>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(direction: OrderDirection) -> Order {
        Order {
            tick_id: 1,
            order_id: 1,
            order_direction: direction,
            owner: "osmo1owner".to_string(),
            quantity: "100".to_string(),
            placed_quantity: "100".to_string(),
            etas: "0".to_string(),
            claim_bounty: "0.001".to_string(),
            placed_at: "1700000000000000000".to_string(),
        }
    }

    #[test]
    fn test_order_status_mapping() {
        let order = order(OrderDirection::Bid);
        assert_eq!(order.status(0.0).unwrap(), OrderStatus::Open);
        assert_eq!(order.status(0.5).unwrap(), OrderStatus::PartiallyFilled);
        assert_eq!(order.status(1.0).unwrap(), OrderStatus::Filled);
        assert!(order.status(1.5).is_err());
        assert!(order.status(-0.1).is_err());
    }

    #[test]
    fn test_orders_by_direction() {
        let orders = vec![
            order(OrderDirection::Bid),
            order(OrderDirection::Ask),
            order(OrderDirection::Bid),
        ];
        assert_eq!(orders_by_direction(&orders, OrderDirection::Bid).len(), 2);
        assert_eq!(orders_by_direction(&orders, OrderDirection::Ask).len(), 1);
    }

    #[test]
    fn test_is_tick_fully_filled() {
        let filled = TickValues {
            total_amount_of_liquidity: "0".to_string(),
            cumulative_total_value: "250".to_string(),
            effective_total_amount_swapped: "250".to_string(),
        };
        assert!(filled.is_tick_fully_filled().unwrap());

        let partial = TickValues {
            total_amount_of_liquidity: "100".to_string(),
            cumulative_total_value: "250".to_string(),
            effective_total_amount_swapped: "150".to_string(),
        };
        assert!(!partial.is_tick_fully_filled().unwrap());

        let malformed = TickValues {
            total_amount_of_liquidity: "0".to_string(),
            cumulative_total_value: "not-a-number".to_string(),
            effective_total_amount_swapped: "250".to_string(),
        };
        assert!(malformed.is_tick_fully_filled().is_err());
    }

    #[test]
    fn test_limit_order_is_claimable() {
        let mut limit_order = LimitOrder {
            tick_id: 1,
            order_id: 1,
            order_direction: OrderDirection::Bid,
            owner: "osmo1owner".to_string(),
            quantity: Decimal::percent(50),
            etas: "0".to_string(),
            claim_bounty: "0".to_string(),
            placed_quantity: Decimal::one(),
            percent_claimed: Decimal::zero(),
            total_filled: Decimal::percent(98),
            percent_filled: Decimal::percent(98),
            orderbook_address: "osmo1contract".to_string(),
            price: Decimal::one(),
            status: OrderStatus::PartiallyFilled,
            output: Decimal::one(),
            quote_asset: OrderbookAsset {
                symbol: "uosmo".to_string(),
                decimals: 6,
            },
            base_asset: OrderbookAsset {
                symbol: "uatom".to_string(),
                decimals: 6,
            },
            placed_at: 1_700_000_000,
        };

        let threshold = Decimal::percent(98);
        assert!(limit_order.is_claimable(threshold));

        limit_order.percent_filled = Decimal::percent(97);
        assert!(!limit_order.is_claimable(threshold));
    }
}

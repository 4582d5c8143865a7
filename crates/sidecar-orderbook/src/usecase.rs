//! Orderbook usecase

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cosmwasm_std::{Decimal, Decimal256};
use tokio::sync::mpsc;
use tracing::error;

use sidecar_chain::OrderbookContractClient;
use sidecar_core::orderbook::{
    orders_by_direction, ClaimableOrder, ClaimableOrderbook, LimitOrder, Order, OrderDirection,
    OrderbookAsset, OrderbookResult, OrderbookTick, TickValues,
};
use sidecar_core::types::CanonicalOrderbookResult;
use sidecar_pools::model::Pool;
use sidecar_pools::registry::PoolRegistry;
use sidecar_pools::tick_math;
use sidecar_pools::tokens::TokenMetadataProvider;

use crate::errors::OrderbookError;
use crate::repository::OrderbookRepository;
use crate::telemetry;

/// Max number of ticks to query at a time.
const MAX_QUERY_TICKS: usize = 500;
/// Max number of tick cancels to query at a time.
const MAX_QUERY_TICKS_CANCELS: usize = 100;

/// Interval between periodic active-order pushes on the stream. Arbitrary,
/// chosen to avoid spamming the client.
const FETCH_ACTIVE_ORDERS_INTERVAL: Duration = Duration::from_secs(10);

/// Stream channel capacity. Arbitrary, chosen to avoid blocking producers.
const ACTIVE_ORDERS_STREAM_CHANNEL_CAPACITY: usize = 50;

/// Orderbook tick ingest and order formatting.
pub struct OrderbookUsecase {
    repository: Arc<OrderbookRepository>,
    orderbook_client: Arc<dyn OrderbookContractClient>,
    registry: Arc<PoolRegistry>,
    token_metadata: Arc<dyn TokenMetadataProvider>,
}

impl OrderbookUsecase {
    pub fn new(
        repository: Arc<OrderbookRepository>,
        orderbook_client: Arc<dyn OrderbookContractClient>,
        registry: Arc<PoolRegistry>,
        token_metadata: Arc<dyn TokenMetadataProvider>,
    ) -> Self {
        Self {
            repository,
            orderbook_client,
            registry,
            token_metadata,
        }
    }

    /// All ingested ticks of a pool.
    pub fn all_ticks(&self, pool_id: u64) -> Option<HashMap<i64, OrderbookTick>> {
        self.repository.all_ticks(pool_id)
    }

    /// Ingests the tick state of an orderbook pool: fetches tick states and
    /// unrealized cancels from the contract, validates that tick ids line up
    /// pairwise, and stores the hydrated ticks.
    pub async fn process_pool(&self, pool: &Pool) -> Result<(), OrderbookError> {
        let pool_id = pool.id();

        let model = pool
            .sqs_model
            .cosmwasm_pool_model
            .as_ref()
            .ok_or(OrderbookError::CosmWasmPoolModelNil)?;

        if !model.is_orderbook() {
            return Err(OrderbookError::NotAnOrderbookPool { pool_id });
        }

        let orderbook = model
            .data
            .orderbook
            .as_ref()
            .ok_or(OrderbookError::NoOrderbookData { pool_id })?;

        if orderbook.ticks.is_empty() {
            return Ok(()); // nothing to do
        }

        let contract_address = pool
            .contract_address()
            .ok_or(OrderbookError::FailedToCastPoolModel { pool_id })?
            .to_string();

        let tick_ids: Vec<i64> = orderbook.ticks.iter().map(|tick| tick.tick_id).collect();

        let tick_states = self
            .orderbook_client
            .fetch_ticks(MAX_QUERY_TICKS, &contract_address, &tick_ids)
            .await
            .map_err(|source| OrderbookError::FetchTicks {
                contract_address: contract_address.clone(),
                source,
            })?;

        let unrealized_cancels = self
            .orderbook_client
            .fetch_tick_unrealized_cancels(
                MAX_QUERY_TICKS_CANCELS,
                &contract_address,
                &tick_ids,
            )
            .await
            .map_err(|source| OrderbookError::FetchUnrealizedCancels {
                contract_address: contract_address.clone(),
                source,
            })?;

        let mut tick_map = HashMap::with_capacity(tick_ids.len());
        for ((tick_id, state), cancels) in tick_ids
            .iter()
            .zip(tick_states)
            .zip(unrealized_cancels)
        {
            if state.tick_id != *tick_id {
                return Err(OrderbookError::TickIdMismatch {
                    expected: *tick_id,
                    actual: state.tick_id,
                });
            }
            if cancels.tick_id != *tick_id {
                return Err(OrderbookError::TickIdMismatch {
                    expected: *tick_id,
                    actual: cancels.tick_id,
                });
            }

            tick_map.insert(
                *tick_id,
                OrderbookTick {
                    tick_id: *tick_id,
                    tick_state: state.tick_state,
                    unrealized_cancels: cancels.unrealized_cancels,
                },
            );
        }

        self.repository.store_ticks(pool_id, tick_map);

        Ok(())
    }

    /// Formatted active orders of an address across all canonical
    /// orderbooks. The aggregate is best-effort whenever any orderbook's
    /// result was.
    pub async fn get_active_orders(
        self: &Arc<Self>,
        address: &str,
    ) -> Result<(Vec<LimitOrder>, bool), OrderbookError> {
        let orderbooks = self.registry.all_canonical_orderbooks()?;

        let (tx, mut rx) = mpsc::channel::<OrderbookResult>(orderbooks.len().max(1));

        for orderbook in orderbooks.iter().cloned() {
            let usecase = Arc::clone(self);
            let address = address.to_string();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = usecase.process_orderbook_active_orders(&orderbook, &address).await;
                let result = match result {
                    Ok((limit_orders, is_best_effort)) => OrderbookResult {
                        pool_id: orderbook.pool_id,
                        limit_orders,
                        is_best_effort,
                        error: None,
                    },
                    Err(err) => OrderbookResult {
                        pool_id: orderbook.pool_id,
                        error: Some(err.to_string()),
                        ..Default::default()
                    },
                };
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut final_results = Vec::new();
        let mut is_best_effort = false;

        for _ in 0..orderbooks.len() {
            let Some(result) = rx.recv().await else {
                break;
            };

            if let Some(err) = &result.error {
                telemetry::inc(&telemetry::PROCESSING_ORDERBOOK_ACTIVE_ORDERS_ERRORS);
                error!(pool_id = result.pool_id, %err, "failed to process orderbook active orders");
            }

            is_best_effort = is_best_effort || result.is_best_effort;
            final_results.extend(result.limit_orders);
        }

        Ok((final_results, is_best_effort))
    }

    /// Streaming variant of [`Self::get_active_orders`]: a producer fetches
    /// immediately and then on a fixed interval, emitting one result per
    /// orderbook per pass. Empty results without errors are suppressed. The
    /// stream is never closed by the producer; dropping the receiver stops
    /// it.
    pub fn get_active_orders_stream(
        self: &Arc<Self>,
        address: String,
    ) -> mpsc::Receiver<OrderbookResult> {
        let (tx, rx) = mpsc::channel::<OrderbookResult>(ACTIVE_ORDERS_STREAM_CHANNEL_CAPACITY);

        let usecase = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FETCH_ACTIVE_ORDERS_INTERVAL);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    return;
                }
                usecase.fetch_active_orders_into(&tx, &address);
            }
        });

        rx
    }

    /// Fans out one task per canonical orderbook, each emitting at most one
    /// result into the stream channel.
    fn fetch_active_orders_into(
        self: &Arc<Self>,
        tx: &mpsc::Sender<OrderbookResult>,
        address: &str,
    ) {
        let orderbooks = match self.registry.all_canonical_orderbooks() {
            Ok(orderbooks) => orderbooks,
            Err(err) => {
                let _ = tx.try_send(OrderbookResult {
                    error: Some(
                        OrderbookError::FailedGetAllCanonicalOrderbookPoolIds(err).to_string(),
                    ),
                    ..Default::default()
                });
                return;
            }
        };

        for orderbook in orderbooks {
            let usecase = Arc::clone(self);
            let address = address.to_string();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = usecase.process_orderbook_active_orders(&orderbook, &address).await;
                let result = match result {
                    Ok((limit_orders, _)) if limit_orders.is_empty() => return, // skip empty orders
                    Ok((limit_orders, is_best_effort)) => OrderbookResult {
                        pool_id: orderbook.pool_id,
                        limit_orders,
                        is_best_effort,
                        error: None,
                    },
                    Err(err) => {
                        telemetry::inc(&telemetry::PROCESSING_ORDERBOOK_ACTIVE_ORDERS_ERRORS);
                        error!(pool_id = orderbook.pool_id, err = %err, "failed to process orderbook active orders");
                        OrderbookResult {
                            pool_id: orderbook.pool_id,
                            error: Some(err.to_string()),
                            ..Default::default()
                        }
                    }
                };

                // A closed channel means the consumer went away; exit.
                let _ = tx.send(result).await;
            });
        }
    }

    /// Fetches and formats the active orders of one orderbook. Per-order
    /// formatting failures flip the best-effort flag instead of failing the
    /// batch.
    async fn process_orderbook_active_orders(
        &self,
        orderbook: &CanonicalOrderbookResult,
        owner: &str,
    ) -> Result<(Vec<LimitOrder>, bool), OrderbookError> {
        orderbook.validate()?;

        let (orders, count) = self
            .orderbook_client
            .get_active_orders(&orderbook.contract_address, owner)
            .await
            .map_err(|source| OrderbookError::FailedToGetActiveOrders {
                contract_address: orderbook.contract_address.clone(),
                owner: owner.to_string(),
                source,
            })?;

        if count == 0 {
            return Ok((Vec::new(), false));
        }

        let mut results = Vec::with_capacity(orders.len());
        let mut is_best_effort = false;

        for order in &orders {
            match self.create_formatted_limit_order(orderbook, order) {
                Ok(limit_order) => results.push(limit_order),
                Err(err) => {
                    telemetry::inc(&telemetry::CREATE_LIMIT_ORDER_ERRORS);
                    error!(order_id = order.order_id, %err, "failed to create limit order");
                    is_best_effort = true;
                }
            }
        }

        Ok((results, is_best_effort))
    }

    /// Formats a raw contract order into the client-facing limit order:
    /// parses quantities, computes fill progress from tick aggregates, and
    /// normalizes the tick price.
    pub fn create_formatted_limit_order(
        &self,
        orderbook: &CanonicalOrderbookResult,
        order: &Order,
    ) -> Result<LimitOrder, OrderbookError> {
        let quote_token = self
            .token_metadata
            .metadata_by_chain_denom(&orderbook.quote)
            .map_err(|source| OrderbookError::FailedToGetMetadata {
                denom: orderbook.quote.clone(),
                source,
            })?;
        let quote_asset = OrderbookAsset {
            symbol: quote_token.chain_denom,
            decimals: quote_token.precision,
        };

        let base_token = self
            .token_metadata
            .metadata_by_chain_denom(&orderbook.base)
            .map_err(|source| OrderbookError::FailedToGetMetadata {
                denom: orderbook.base.clone(),
                source,
            })?;
        let base_asset = OrderbookAsset {
            symbol: base_token.chain_denom,
            decimals: base_token.precision,
        };

        let tick = self
            .repository
            .tick_by_id(orderbook.pool_id, order.tick_id)
            .ok_or_else(|| {
                telemetry::inc(&telemetry::TICK_BY_ID_NOT_FOUND);
                OrderbookError::TickForOrderbookNotFound {
                    orderbook_address: orderbook.contract_address.clone(),
                    tick_id: order.tick_id,
                }
            })?;

        let quantity: Decimal =
            order
                .quantity
                .parse()
                .map_err(|_| OrderbookError::ParsingQuantity {
                    quantity: order.quantity.clone(),
                })?;
        let placed_quantity: Decimal =
            order
                .placed_quantity
                .parse()
                .map_err(|_| OrderbookError::ParsingPlacedQuantity {
                    placed_quantity: order.placed_quantity.clone(),
                })?;

        if placed_quantity.is_zero() || quantity > placed_quantity {
            return Err(OrderbookError::InvalidPlacedQuantity {
                placed_quantity: order.placed_quantity.clone(),
            });
        }

        let claimed = placed_quantity - quantity;
        let percent_claimed = claimed / placed_quantity;

        let normalization_factor = self
            .token_metadata
            .spot_price_scaling_factor(&base_asset.symbol, &quote_asset.symbol)
            .map_err(|source| OrderbookError::GettingSpotPriceScalingFactor {
                base: base_asset.symbol.clone(),
                quote: quote_asset.symbol.clone(),
                source,
            })?;

        let (tick_etas_raw, unrealized_cancels) = match order.order_direction {
            OrderDirection::Bid => (
                &tick.tick_state.bid_values.effective_total_amount_swapped,
                tick.unrealized_cancels.bid_unrealized_cancels.ok_or(
                    OrderbookError::ParsingUnrealizedCancels {
                        field: "bid_unrealized_cancels",
                    },
                )?,
            ),
            OrderDirection::Ask => (
                &tick.tick_state.ask_values.effective_total_amount_swapped,
                tick.unrealized_cancels.ask_unrealized_cancels.ok_or(
                    OrderbookError::ParsingUnrealizedCancels {
                        field: "ask_unrealized_cancels",
                    },
                )?,
            ),
        };

        let tick_etas: Decimal =
            tick_etas_raw
                .parse()
                .map_err(|_| OrderbookError::ParsingTickValues {
                    field: "effective_total_amount_swapped",
                })?;
        let tick_unrealized_cancelled = Decimal::from_ratio(unrealized_cancels, 1u128);

        let etas: Decimal = order
            .etas
            .parse()
            .map_err(|_| OrderbookError::ParsingEtas {
                etas: order.etas.clone(),
            })?;

        let tick_total_etas = tick_etas + tick_unrealized_cancelled;

        // total_filled = max(tick_total_etas - (etas - claimed), 0),
        // rearranged to stay in unsigned arithmetic.
        let filled_bound = tick_total_etas + claimed;
        let total_filled = if filled_bound > etas {
            filled_bound - etas
        } else {
            Decimal::zero()
        };

        let percent_filled = (total_filled / placed_quantity).min(Decimal::one());

        let percent_filled_f64: f64 = percent_filled
            .to_string()
            .parse()
            .map_err(|_| OrderbookError::MappingOrderStatus {
                reason: percent_filled.to_string(),
            })?;
        let status =
            order
                .status(percent_filled_f64)
                .map_err(|err| OrderbookError::MappingOrderStatus {
                    reason: err.to_string(),
                })?;

        let price = tick_math::tick_to_price(order.tick_id).map_err(|source| {
            OrderbookError::ConvertingTickToPrice {
                tick_id: order.tick_id,
                source,
            }
        })?;

        let price_conversion_error = || OrderbookError::ConvertingTickToPrice {
            tick_id: order.tick_id,
            source: tick_math::TickMathError::Overflow,
        };

        let placed_quantity_256 = Decimal256::from(placed_quantity);
        let output = match order.order_direction {
            OrderDirection::Bid => placed_quantity_256
                .checked_div(price)
                .map_err(|_| price_conversion_error())?,
            OrderDirection::Ask => placed_quantity_256
                .checked_mul(price)
                .map_err(|_| price_conversion_error())?,
        };
        let output = Decimal::try_from(output).map_err(|_| price_conversion_error())?;

        let normalized_price = price
            .checked_mul(Decimal256::from(normalization_factor))
            .map_err(|_| price_conversion_error())?;
        let normalized_price =
            Decimal::try_from(normalized_price).map_err(|_| price_conversion_error())?;

        let placed_at_nanos: i64 =
            order
                .placed_at
                .parse()
                .map_err(|_| OrderbookError::ParsingPlacedAt {
                    placed_at: order.placed_at.clone(),
                })?;
        let placed_at = placed_at_nanos / 1_000_000_000;

        Ok(LimitOrder {
            tick_id: order.tick_id,
            order_id: order.order_id,
            order_direction: order.order_direction,
            owner: order.owner.clone(),
            quantity,
            etas: order.etas.clone(),
            claim_bounty: order.claim_bounty.clone(),
            placed_quantity,
            percent_claimed,
            total_filled,
            percent_filled,
            orderbook_address: orderbook.contract_address.clone(),
            price: normalized_price,
            status,
            output,
            quote_asset,
            base_asset,
            placed_at,
        })
    }

    /// Claimable orders of the orderbook, tick by tick. Tick- and
    /// order-level failures are attached to the returned records rather than
    /// aborting the scan.
    pub async fn get_claimable_orders_for_orderbook(
        &self,
        fill_threshold: Decimal,
        orderbook: &CanonicalOrderbookResult,
    ) -> Result<Vec<ClaimableOrderbook>, OrderbookError> {
        let ticks =
            self.repository
                .all_ticks(orderbook.pool_id)
                .ok_or(OrderbookError::NoTicks {
                    contract_address: orderbook.contract_address.clone(),
                    pool_id: orderbook.pool_id,
                })?;

        let mut claimable = Vec::with_capacity(ticks.len());
        for tick in ticks.into_values() {
            let orders = self
                .get_claimable_orders_for_tick(fill_threshold, orderbook, &tick)
                .await;
            let (orders, error) = match orders {
                Ok(orders) => (orders, None),
                Err(err) => (Vec::new(), Some(err.to_string())),
            };
            claimable.push(ClaimableOrderbook {
                tick,
                orders,
                error,
            });
        }

        Ok(claimable)
    }

    async fn get_claimable_orders_for_tick(
        &self,
        fill_threshold: Decimal,
        orderbook: &CanonicalOrderbookResult,
        tick: &OrderbookTick,
    ) -> Result<Vec<ClaimableOrder>, OrderbookError> {
        let orders = self
            .orderbook_client
            .get_orders_by_tick(&orderbook.contract_address, tick.tick_id)
            .await
            .map_err(|source| OrderbookError::FetchTickOrders {
                tick_id: tick.tick_id,
                source,
            })?;

        if orders.is_empty() {
            return Ok(Vec::new()); // nothing to process
        }

        let mut claimable = self.classify_claimable_orders(
            orderbook,
            orders_by_direction(&orders, OrderDirection::Ask),
            &tick.tick_state.ask_values,
            fill_threshold,
        )?;
        claimable.extend(self.classify_claimable_orders(
            orderbook,
            orders_by_direction(&orders, OrderDirection::Bid),
            &tick.tick_state.bid_values,
            fill_threshold,
        )?);

        Ok(claimable)
    }

    /// Classifies one direction of a tick: a fully filled tick makes every
    /// order claimable; otherwise each order is checked against the fill
    /// threshold, with per-order errors recorded on the result.
    fn classify_claimable_orders(
        &self,
        orderbook: &CanonicalOrderbookResult,
        orders: Vec<Order>,
        tick_values: &TickValues,
        fill_threshold: Decimal,
    ) -> Result<Vec<ClaimableOrder>, OrderbookError> {
        let is_filled =
            tick_values
                .is_tick_fully_filled()
                .map_err(|_| OrderbookError::ParsingTickValues {
                    field: "tick_values",
                })?;

        let mut result = Vec::new();
        for order in orders {
            if is_filled {
                result.push(ClaimableOrder { order, error: None });
                continue;
            }

            match self.create_formatted_limit_order(orderbook, &order) {
                Ok(limit_order) => {
                    if limit_order.is_claimable(fill_threshold) {
                        result.push(ClaimableOrder { order, error: None });
                    }
                }
                Err(err) => result.push(ClaimableOrder {
                    order,
                    error: Some(err.to_string()),
                }),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use cosmwasm_std::Uint128;

    use sidecar_chain::{ChainError, TickIdAndState, TickUnrealizedCancels};
    use sidecar_core::orderbook::{OrderStatus, Orders, TickState, UnrealizedCancels};
    use sidecar_core::types::Token;
    use sidecar_pools::tokens::TokenRegistry;

    use super::*;

    struct MockOrderbookClient {
        active_orders: Orders,
        orders_by_tick: HashMap<i64, Orders>,
        tick_states: Vec<TickIdAndState>,
        unrealized: Vec<TickUnrealizedCancels>,
        fail_active_orders: bool,
    }

    impl Default for MockOrderbookClient {
        fn default() -> Self {
            Self {
                active_orders: Vec::new(),
                orders_by_tick: HashMap::new(),
                tick_states: Vec::new(),
                unrealized: Vec::new(),
                fail_active_orders: false,
            }
        }
    }

    #[async_trait]
    impl OrderbookContractClient for MockOrderbookClient {
        async fn fetch_ticks(
            &self,
            _max_per_query: usize,
            _contract_address: &str,
            _tick_ids: &[i64],
        ) -> Result<Vec<TickIdAndState>, ChainError> {
            Ok(self.tick_states.clone())
        }

        async fn fetch_tick_unrealized_cancels(
            &self,
            _max_per_query: usize,
            _contract_address: &str,
            _tick_ids: &[i64],
        ) -> Result<Vec<TickUnrealizedCancels>, ChainError> {
            Ok(self.unrealized.clone())
        }

        async fn get_active_orders(
            &self,
            _contract_address: &str,
            _owner: &str,
        ) -> Result<(Orders, u64), ChainError> {
            if self.fail_active_orders {
                return Err(ChainError::Query("unavailable".to_string()));
            }
            Ok((self.active_orders.clone(), self.active_orders.len() as u64))
        }

        async fn get_orders_by_tick(
            &self,
            _contract_address: &str,
            tick_id: i64,
        ) -> Result<Orders, ChainError> {
            Ok(self.orders_by_tick.get(&tick_id).cloned().unwrap_or_default())
        }
    }

    fn token_registry() -> Arc<TokenRegistry> {
        let registry = TokenRegistry::new();
        registry.store_all([
            Token {
                chain_denom: "uatom".to_string(),
                human_denom: "atom".to_string(),
                name: "Cosmos Hub".to_string(),
                precision: 6,
                total_liquidity_cap: Uint128::zero(),
            },
            Token {
                chain_denom: "uosmo".to_string(),
                human_denom: "osmo".to_string(),
                name: "Osmosis".to_string(),
                precision: 6,
                total_liquidity_cap: Uint128::zero(),
            },
        ]);
        Arc::new(registry)
    }

    fn canonical_orderbook() -> CanonicalOrderbookResult {
        CanonicalOrderbookResult {
            base: "uatom".to_string(),
            quote: "uosmo".to_string(),
            pool_id: 5,
            contract_address: "osmo1contract5".to_string(),
        }
    }

    fn usecase_with_client(client: MockOrderbookClient) -> Arc<OrderbookUsecase> {
        let tokens = token_registry();
        Arc::new(OrderbookUsecase::new(
            Arc::new(OrderbookRepository::new()),
            Arc::new(client),
            Arc::new(PoolRegistry::new(tokens.clone())),
            tokens,
        ))
    }

    fn stored_tick(tick_id: i64, etas_bid: &str, cumulative_bid: &str) -> OrderbookTick {
        OrderbookTick {
            tick_id,
            tick_state: TickState {
                bid_values: TickValues {
                    total_amount_of_liquidity: "0".to_string(),
                    cumulative_total_value: cumulative_bid.to_string(),
                    effective_total_amount_swapped: etas_bid.to_string(),
                },
                ask_values: TickValues {
                    total_amount_of_liquidity: "0".to_string(),
                    cumulative_total_value: "0".to_string(),
                    effective_total_amount_swapped: "0".to_string(),
                },
            },
            unrealized_cancels: UnrealizedCancels {
                bid_unrealized_cancels: Some(Uint128::zero()),
                ask_unrealized_cancels: Some(Uint128::zero()),
            },
        }
    }

    fn bid_order(tick_id: i64, order_id: i64, quantity: &str, placed: &str, etas: &str) -> Order {
        Order {
            tick_id,
            order_id,
            order_direction: OrderDirection::Bid,
            owner: "osmo1owner".to_string(),
            quantity: quantity.to_string(),
            placed_quantity: placed.to_string(),
            etas: etas.to_string(),
            claim_bounty: "0.001".to_string(),
            placed_at: "1700000000123456789".to_string(),
        }
    }

    #[test]
    fn test_create_formatted_limit_order_happy_path() {
        let usecase = usecase_with_client(MockOrderbookClient::default());
        usecase
            .repository
            .store_ticks(5, HashMap::from([(0i64, stored_tick(0, "50", "100"))]));

        // placed 100, quantity 50: half claimed; tick etas 50 at order etas 0
        // means everything remaining is filled.
        let order = bid_order(0, 1, "50", "100", "0");
        let formatted = usecase
            .create_formatted_limit_order(&canonical_orderbook(), &order)
            .unwrap();

        assert_eq!(formatted.percent_claimed, Decimal::percent(50));
        assert_eq!(formatted.percent_filled, Decimal::one());
        assert_eq!(formatted.status, OrderStatus::Filled);
        // Tick 0 prices at one; same-precision pair keeps it there.
        assert_eq!(formatted.price, Decimal::one());
        assert_eq!(formatted.output, Decimal::from_ratio(100u128, 1u128));
        assert_eq!(formatted.placed_at, 1_700_000_000);
    }

    #[test]
    fn test_create_formatted_limit_order_partial_fill() {
        let usecase = usecase_with_client(MockOrderbookClient::default());
        usecase
            .repository
            .store_ticks(5, HashMap::from([(0i64, stored_tick(0, "25", "100"))]));

        // Nothing claimed yet; tick swapped 25 of the 100 placed.
        let order = bid_order(0, 1, "100", "100", "0");
        let formatted = usecase
            .create_formatted_limit_order(&canonical_orderbook(), &order)
            .unwrap();

        assert_eq!(formatted.percent_claimed, Decimal::zero());
        assert_eq!(formatted.percent_filled, Decimal::percent(25));
        assert_eq!(formatted.status, OrderStatus::PartiallyFilled);
    }

    #[test]
    fn test_create_formatted_limit_order_errors() {
        let usecase = usecase_with_client(MockOrderbookClient::default());
        usecase
            .repository
            .store_ticks(5, HashMap::from([(0i64, stored_tick(0, "0", "100"))]));
        let orderbook = canonical_orderbook();

        // Unknown tick.
        let err = usecase
            .create_formatted_limit_order(&orderbook, &bid_order(9, 1, "50", "100", "0"))
            .unwrap_err();
        assert!(matches!(err, OrderbookError::TickForOrderbookNotFound { .. }));

        // Unparseable quantity.
        let err = usecase
            .create_formatted_limit_order(&orderbook, &bid_order(0, 1, "abc", "100", "0"))
            .unwrap_err();
        assert!(matches!(err, OrderbookError::ParsingQuantity { .. }));

        // Zero placed quantity.
        let err = usecase
            .create_formatted_limit_order(&orderbook, &bid_order(0, 1, "0", "0", "0"))
            .unwrap_err();
        assert!(matches!(err, OrderbookError::InvalidPlacedQuantity { .. }));
    }

    #[test]
    fn test_create_formatted_limit_order_nil_cancels() {
        let usecase = usecase_with_client(MockOrderbookClient::default());
        let mut tick = stored_tick(0, "0", "100");
        tick.unrealized_cancels.bid_unrealized_cancels = None;
        usecase
            .repository
            .store_ticks(5, HashMap::from([(0i64, tick)]));

        let err = usecase
            .create_formatted_limit_order(&canonical_orderbook(), &bid_order(0, 1, "50", "100", "0"))
            .unwrap_err();
        assert!(matches!(
            err,
            OrderbookError::ParsingUnrealizedCancels { .. }
        ));
    }

    #[tokio::test]
    async fn test_process_pool_tick_id_mismatch() {
        use sidecar_pools::model::{
            ChainPoolModel, ContractInfo, CosmWasmChainPool, CosmWasmPoolData, CosmWasmPoolModel,
            OrderbookData, OrderbookPoolTick, SqsModel, ORDERBOOK_CONTRACT_NAME,
        };

        let client = MockOrderbookClient {
            tick_states: vec![TickIdAndState {
                tick_id: 99, // mismatching id
                tick_state: TickState::default(),
            }],
            unrealized: vec![TickUnrealizedCancels {
                tick_id: 0,
                unrealized_cancels: UnrealizedCancels::default(),
            }],
            ..Default::default()
        };
        let usecase = usecase_with_client(client);

        let pool = Pool {
            id: 5,
            chain_model: ChainPoolModel::CosmWasm(CosmWasmChainPool {
                contract_address: "osmo1contract5".to_string(),
                code_id: 100,
            }),
            sqs_model: SqsModel {
                balances: Vec::new(),
                pool_denoms: vec!["uatom".to_string(), "uosmo".to_string()],
                spread_factor: Decimal::zero(),
                liquidity_cap: Uint128::new(1),
                liquidity_cap_error: String::new(),
                cosmwasm_pool_model: Some(CosmWasmPoolModel {
                    contract_info: ContractInfo {
                        contract: ORDERBOOK_CONTRACT_NAME.to_string(),
                        version: "0.1.0".to_string(),
                    },
                    data: CosmWasmPoolData {
                        orderbook: Some(OrderbookData {
                            base_denom: "uatom".to_string(),
                            quote_denom: "uosmo".to_string(),
                            next_bid_tick_index: None,
                            next_ask_tick_index: None,
                            ticks: vec![OrderbookPoolTick {
                                tick_id: 0,
                                bid_liquidity: Decimal256::zero(),
                                ask_liquidity: Decimal256::zero(),
                            }],
                        }),
                        alloy_transmuter: None,
                    },
                }),
            },
            tick_model: None,
            apr_data: None,
            fees_data: None,
        };

        let err = usecase.process_pool(&pool).await.unwrap_err();
        assert!(matches!(
            err,
            OrderbookError::TickIdMismatch {
                expected: 0,
                actual: 99
            }
        ));
    }

    #[tokio::test]
    async fn test_claimable_orders_fully_filled_tick() {
        let mut tick = stored_tick(0, "100", "100");
        tick.tick_state.ask_values = tick.tick_state.bid_values.clone();

        let client = MockOrderbookClient {
            orders_by_tick: HashMap::from([(
                0i64,
                vec![
                    bid_order(0, 1, "100", "100", "0"),
                    bid_order(0, 2, "50", "50", "0"),
                ],
            )]),
            ..Default::default()
        };
        let usecase = usecase_with_client(client);
        usecase.repository.store_ticks(5, HashMap::from([(0i64, tick)]));

        let claimable = usecase
            .get_claimable_orders_for_orderbook(Decimal::percent(98), &canonical_orderbook())
            .await
            .unwrap();

        assert_eq!(claimable.len(), 1);
        assert!(claimable[0].error.is_none());
        // Both orders claimable because the tick side is fully filled.
        assert_eq!(claimable[0].orders.len(), 2);
        assert!(claimable[0].orders.iter().all(|order| order.error.is_none()));
    }

    #[tokio::test]
    async fn test_claimable_orders_threshold_filter() {
        // Bid side swapped 99 of 100: per-order percent filled is 0.99.
        let client = MockOrderbookClient {
            orders_by_tick: HashMap::from([(
                0i64,
                vec![bid_order(0, 1, "100", "100", "0")],
            )]),
            ..Default::default()
        };
        let usecase = usecase_with_client(client);
        usecase
            .repository
            .store_ticks(5, HashMap::from([(0i64, stored_tick(0, "99", "100"))]));

        let claimable = usecase
            .get_claimable_orders_for_orderbook(Decimal::percent(98), &canonical_orderbook())
            .await
            .unwrap();
        assert_eq!(claimable[0].orders.len(), 1);

        // A tighter threshold excludes it.
        let claimable = usecase
            .get_claimable_orders_for_orderbook(Decimal::one(), &canonical_orderbook())
            .await
            .unwrap();
        assert!(claimable[0].orders.is_empty());
    }

    #[tokio::test]
    async fn test_get_active_orders_aggregates_best_effort() {
        use sidecar_pools::model::{
            ChainPoolModel, ContractInfo, CosmWasmChainPool, CosmWasmPoolData, CosmWasmPoolModel,
            OrderbookData, SqsModel, ORDERBOOK_CONTRACT_NAME,
        };

        // One active order with an unknown tick: formatting fails, the
        // aggregate is flagged best-effort but still succeeds.
        let client = MockOrderbookClient {
            active_orders: vec![bid_order(42, 1, "50", "100", "0")],
            ..Default::default()
        };

        let tokens = token_registry();
        let registry = Arc::new(PoolRegistry::new(tokens.clone()));
        registry.store_pools(vec![Pool {
            id: 5,
            chain_model: ChainPoolModel::CosmWasm(CosmWasmChainPool {
                contract_address: "osmo1contract5".to_string(),
                code_id: 100,
            }),
            sqs_model: SqsModel {
                balances: Vec::new(),
                pool_denoms: vec!["uatom".to_string(), "uosmo".to_string()],
                spread_factor: Decimal::zero(),
                liquidity_cap: Uint128::new(10),
                liquidity_cap_error: String::new(),
                cosmwasm_pool_model: Some(CosmWasmPoolModel {
                    contract_info: ContractInfo {
                        contract: ORDERBOOK_CONTRACT_NAME.to_string(),
                        version: "0.1.0".to_string(),
                    },
                    data: CosmWasmPoolData {
                        orderbook: Some(OrderbookData {
                            base_denom: "uatom".to_string(),
                            quote_denom: "uosmo".to_string(),
                            next_bid_tick_index: None,
                            next_ask_tick_index: None,
                            ticks: Vec::new(),
                        }),
                        alloy_transmuter: None,
                    },
                }),
            },
            tick_model: None,
            apr_data: None,
            fees_data: None,
        }]);

        let usecase = Arc::new(OrderbookUsecase::new(
            Arc::new(OrderbookRepository::new()),
            Arc::new(client),
            registry,
            tokens,
        ));

        let (orders, is_best_effort) = usecase.get_active_orders("osmo1owner").await.unwrap();
        assert!(orders.is_empty());
        assert!(is_best_effort);
    }

    #[tokio::test]
    async fn test_active_orders_stream_emits_and_stops_on_drop() {
        use sidecar_pools::model::{
            ChainPoolModel, ContractInfo, CosmWasmChainPool, CosmWasmPoolData, CosmWasmPoolModel,
            OrderbookData, SqsModel, ORDERBOOK_CONTRACT_NAME,
        };

        let client = MockOrderbookClient {
            active_orders: vec![bid_order(0, 1, "50", "100", "0")],
            ..Default::default()
        };

        let tokens = token_registry();
        let registry = Arc::new(PoolRegistry::new(tokens.clone()));
        registry.store_pools(vec![Pool {
            id: 5,
            chain_model: ChainPoolModel::CosmWasm(CosmWasmChainPool {
                contract_address: "osmo1contract5".to_string(),
                code_id: 100,
            }),
            sqs_model: SqsModel {
                balances: Vec::new(),
                pool_denoms: vec!["uatom".to_string(), "uosmo".to_string()],
                spread_factor: Decimal::zero(),
                liquidity_cap: Uint128::new(10),
                liquidity_cap_error: String::new(),
                cosmwasm_pool_model: Some(CosmWasmPoolModel {
                    contract_info: ContractInfo {
                        contract: ORDERBOOK_CONTRACT_NAME.to_string(),
                        version: "0.1.0".to_string(),
                    },
                    data: CosmWasmPoolData {
                        orderbook: Some(OrderbookData {
                            base_denom: "uatom".to_string(),
                            quote_denom: "uosmo".to_string(),
                            next_bid_tick_index: None,
                            next_ask_tick_index: None,
                            ticks: Vec::new(),
                        }),
                        alloy_transmuter: None,
                    },
                }),
            },
            tick_model: None,
            apr_data: None,
            fees_data: None,
        }]);

        let usecase = Arc::new(OrderbookUsecase::new(
            Arc::new(OrderbookRepository::new()),
            Arc::new(client),
            registry,
            tokens,
        ));
        usecase
            .repository
            .store_ticks(5, HashMap::from([(0i64, stored_tick(0, "100", "100"))]));

        let mut stream = usecase.get_active_orders_stream("osmo1owner".to_string());

        // The immediate pass emits one per-orderbook result.
        let result = tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .expect("stream produced no result");
        let result = result.expect("channel closed unexpectedly");
        assert_eq!(result.pool_id, 5);
        assert_eq!(result.limit_orders.len(), 1);

        // Dropping the receiver stops the producer without panicking.
        drop(stream);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

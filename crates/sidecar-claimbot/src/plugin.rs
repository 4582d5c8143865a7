//! End-of-block claim plugin

use std::sync::atomic::{AtomicBool, Ordering};

use cosmwasm_std::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use sidecar_chain::{Account, ChainError};
use sidecar_core::orderbook::Order;
use sidecar_core::types::{BlockPoolMetadata, CanonicalOrderbookResult};
use sidecar_pools::model::PoolError;

use crate::config::Config;
use crate::orderbooks::process_orderbooks_and_get_claimable_orders;
use crate::tx::send_batch_claim_tx;

/// Maximum number of claimable orders sent in a single batch claim.
const MAX_BATCH_OF_CLAIMABLE_ORDERS: usize = 100;

#[derive(Debug, Error)]
pub enum ClaimbotError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Claims eligible orderbook orders at the end of each block. Eligibility is
/// driven by the order's filled percentage against the fill threshold.
pub struct Claimbot {
    config: Config,
    in_progress: AtomicBool,
}

/// An order is claimable once 98% filled.
fn fill_threshold() -> Decimal {
    Decimal::permille(980)
}

impl Claimbot {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            in_progress: AtomicBool::new(false),
        }
    }

    /// Processes the block's orderbooks and claims eligible orders. Only one
    /// block is processed at a time; a reentrant call returns immediately.
    pub async fn process_end_block(
        &self,
        block_height: u64,
        metadata: &BlockPoolMetadata,
    ) -> Result<(), ClaimbotError> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!(block_height, "already in progress");
            return Ok(());
        }

        let result = self.process_end_block_inner(block_height, metadata).await;
        self.in_progress.store(false, Ordering::SeqCst);
        info!(block_height, "processed end block");
        result
    }

    async fn process_end_block_inner(
        &self,
        block_height: u64,
        metadata: &BlockPoolMetadata,
    ) -> Result<(), ClaimbotError> {
        let orderbooks: Vec<CanonicalOrderbookResult> = match self
            .config
            .registry
            .all_canonical_orderbooks()
        {
            Ok(orderbooks) => orderbooks
                .into_iter()
                .filter(|orderbook| metadata.pool_ids.contains(&orderbook.pool_id))
                .collect(),
            Err(err) => {
                warn!(block_height, %err, "failed to get canonical orderbook pools for block");
                return Err(err.into());
            }
        };

        let mut account = self
            .config
            .account_query_client
            .get_account(&self.config.keyring.address())
            .await?;

        let processed = process_orderbooks_and_get_claimable_orders(
            &self.config.orderbook_usecase,
            fill_threshold(),
            orderbooks,
        )
        .await;

        for item in processed {
            if let Some(err) = &item.error {
                warn!(
                    contract_address = %item.orderbook.contract_address,
                    %err,
                    "failed to retrieve claimable orders"
                );
                continue;
            }

            let mut claimable: Vec<Order> = Vec::new();
            for tick_result in item.orders {
                if let Some(err) = &tick_result.error {
                    warn!(
                        orderbook = %item.orderbook.contract_address,
                        tick = tick_result.tick.tick_id,
                        %err,
                        "error processing orderbook tick"
                    );
                    continue;
                }

                for claimable_order in tick_result.orders {
                    if let Some(err) = &claimable_order.error {
                        warn!(
                            orderbook = %item.orderbook.contract_address,
                            tick = tick_result.tick.tick_id,
                            %err,
                            "unable to create orderbook limit order; marking as not claimable"
                        );
                        continue;
                    }
                    claimable.push(claimable_order.order);
                }
            }

            if let Err(err) = self
                .process_orderbook_orders(&mut account, &item.orderbook, &claimable)
                .await
            {
                warn!(
                    contract_address = %item.orderbook.contract_address,
                    %err,
                    "failed to process orderbook orders"
                );
            }
        }

        Ok(())
    }

    /// Sends the orderbook's claimable orders in batches. A failed batch
    /// refetches the account (the sequence may have advanced or rolled back)
    /// and moves on; a successful one bumps the sequence locally, as the
    /// block lock guarantees no competing broadcaster.
    async fn process_orderbook_orders(
        &self,
        account: &mut Account,
        orderbook: &CanonicalOrderbookResult,
        orders: &[Order],
    ) -> Result<(), ClaimbotError> {
        if orders.is_empty() {
            return Ok(());
        }

        for chunk in orders.chunks(MAX_BATCH_OF_CLAIMABLE_ORDERS) {
            let result = send_batch_claim_tx(
                self.config.keyring.as_ref(),
                self.config.msg_simulator.as_ref(),
                self.config.tx_service_client.as_ref(),
                &self.config.chain_id,
                account,
                &orderbook.contract_address,
                chunk,
            )
            .await;

            let failed = match &result {
                Err(_) => true,
                Ok(response) => response.code != 0,
            };

            if failed {
                info!(
                    contract_address = %orderbook.contract_address,
                    tx_result = ?result,
                    "failed sending tx"
                );

                *account = self
                    .config
                    .account_query_client
                    .get_account(&self.config.keyring.address())
                    .await?;

                continue; // continue processing the next batch
            }

            account.increment_sequence();
        }

        Ok(())
    }
}

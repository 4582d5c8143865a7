//! Message simulator
//!
//! Builds, signs, simulates and prices transactions. Pricing failures are
//! reported inside [`TxFeeInfo`] rather than raised so callers can decide
//! how to degrade.

use std::sync::Arc;

use async_trait::async_trait;
use cosmwasm_std::Coin;
use osmosis_std::shim::Any;

use sidecar_core::types::{BaseFeeSource, TxFeeInfo};

use crate::clients::{Account, ChainError, GasCalculator, Keyring, SimulateResponse};
use crate::tx::{
    build_signature, build_signer_data, calculate_fee_amount, TxBuilder, TxFactory,
};

/// Multiplier applied to simulated gas before it is used as a gas limit.
pub const GAS_ADJUSTMENT: f64 = 1.15;

/// Transaction building, simulation and pricing.
#[async_trait]
pub trait MsgSimulator: Send + Sync {
    /// Builds and signs a transaction carrying the given messages. The gas
    /// limit and fee are derived from a pricing simulation.
    async fn build_tx(
        &self,
        keyring: &dyn Keyring,
        account: &Account,
        chain_id: &str,
        msgs: Vec<Any>,
    ) -> Result<TxBuilder, ChainError>;

    /// Simulates the execution of the messages and returns the simulation
    /// response together with the adjusted gas used.
    async fn simulate_msgs(
        &self,
        account: &Account,
        chain_id: &str,
        msgs: &[Any],
    ) -> Result<(SimulateResponse, u64), ChainError>;

    /// Simulates the messages and prices the resulting gas against the
    /// current base fee.
    async fn price_msgs(&self, account: &Account, chain_id: &str, msgs: &[Any]) -> TxFeeInfo;
}

/// Simulator backed by chain-side gas calculation and the in-memory base fee.
pub struct TxGasCalculator {
    gas_calculator: Arc<dyn GasCalculator>,
    base_fee_source: Arc<dyn BaseFeeSource>,
}

impl TxGasCalculator {
    pub fn new(
        gas_calculator: Arc<dyn GasCalculator>,
        base_fee_source: Arc<dyn BaseFeeSource>,
    ) -> Self {
        Self {
            gas_calculator,
            base_fee_source,
        }
    }
}

#[async_trait]
impl MsgSimulator for TxGasCalculator {
    async fn build_tx(
        &self,
        keyring: &dyn Keyring,
        account: &Account,
        chain_id: &str,
        msgs: Vec<Any>,
    ) -> Result<TxBuilder, ChainError> {
        let mut builder = TxBuilder::new();
        builder.set_msgs(msgs);

        let price_info = self
            .price_msgs(account, chain_id, builder.msgs())
            .await;
        if !price_info.err.is_empty() {
            return Err(ChainError::Pricing(price_info.err));
        }

        builder.set_gas_limit(price_info.adjusted_gas_used);
        builder.set_fee_amount(price_info.fee_coin.into_iter().collect::<Vec<Coin>>());

        // Placeholder signature carrying only the sequence so the
        // transaction is byte-addressable for signing.
        builder.set_signatures(vec![build_signature(
            keyring.pub_key_bytes(),
            None,
            account.sequence,
        )]);

        let signer_data = build_signer_data(chain_id, account.account_number, account.sequence);
        builder.sign_with_keyring(keyring, &signer_data)?;

        Ok(builder)
    }

    async fn simulate_msgs(
        &self,
        account: &Account,
        chain_id: &str,
        msgs: &[Any],
    ) -> Result<(SimulateResponse, u64), ChainError> {
        let factory = TxFactory {
            chain_id: chain_id.to_string(),
            account_number: account.account_number,
            sequence: account.sequence,
            gas_adjustment: GAS_ADJUSTMENT,
        };

        self.gas_calculator.calculate_gas(&factory, msgs).await
    }

    async fn price_msgs(&self, account: &Account, chain_id: &str, msgs: &[Any]) -> TxFeeInfo {
        let base_fee = self.base_fee_source.base_fee();

        let Some(current_fee) = base_fee.current_fee.filter(|fee| !fee.is_zero()) else {
            return TxFeeInfo::from_error("base fee is zero or nil");
        };
        if base_fee.denom.is_empty() {
            return TxFeeInfo::from_error("base fee denom is empty");
        }

        let gas_adjusted = match self.simulate_msgs(account, chain_id, msgs).await {
            Ok((_, gas_adjusted)) => gas_adjusted,
            Err(err) => {
                return TxFeeInfo {
                    base_fee: Some(current_fee),
                    err: err.to_string(),
                    ..Default::default()
                }
            }
        };

        let fee_amount = calculate_fee_amount(current_fee, gas_adjusted);

        TxFeeInfo {
            adjusted_gas_used: gas_adjusted,
            fee_coin: Some(Coin {
                denom: base_fee.denom,
                amount: fee_amount,
            }),
            base_fee: Some(current_fee),
            err: String::new(),
        }
    }
}

//! Quote simulator
//!
//! Converts a single-route quote into a swap message and prices it through
//! the message simulator.

use std::sync::Arc;

use cosmwasm_std::Decimal;
use osmosis_std::types::cosmos::base::v1beta1::Coin as ProtoCoin;
use osmosis_std::types::osmosis::poolmanager::v1beta1::{MsgSwapExactAmountIn, SwapAmountInRoute};

use sidecar_chain::{AccountQueryClient, MsgSimulator};
use sidecar_core::types::TxFeeInfo;

use crate::route::Quote;

/// Simulates a quote as an on-chain swap to price its gas and fee.
pub struct QuoteSimulator {
    msg_simulator: Arc<dyn MsgSimulator>,
    account_client: Arc<dyn AccountQueryClient>,
    chain_id: String,
}

impl QuoteSimulator {
    pub fn new(
        msg_simulator: Arc<dyn MsgSimulator>,
        account_client: Arc<dyn AccountQueryClient>,
        chain_id: String,
    ) -> Self {
        Self {
            msg_simulator,
            account_client,
            chain_id,
        }
    }

    /// Prices the quote's swap message for `simulator_address`. Only
    /// single-route quotes can be simulated; the slippage multiplier bounds
    /// the minimum out amount.
    pub async fn simulate_quote(
        &self,
        quote: &Quote,
        slippage_tolerance_multiplier: Decimal,
        simulator_address: &str,
    ) -> TxFeeInfo {
        if quote.routes.len() != 1 {
            return TxFeeInfo::from_error(format!(
                "route length must be 1, got {}",
                quote.routes.len()
            ));
        }

        let pools = &quote.routes[0].route.pools;
        let pool_manager_route: Vec<SwapAmountInRoute> = pools
            .iter()
            .map(|pool| SwapAmountInRoute {
                pool_id: pool.id(),
                token_out_denom: pool.token_out_denom().to_string(),
            })
            .collect();

        // Truncated product of the out amount and the tolerance multiplier.
        let slippage_bound = quote.amount_out.mul_floor(slippage_tolerance_multiplier);

        let swap_msg = MsgSwapExactAmountIn {
            sender: simulator_address.to_string(),
            routes: pool_manager_route,
            token_in: Some(ProtoCoin {
                denom: quote.amount_in.denom.clone(),
                amount: quote.amount_in.amount.to_string(),
            }),
            token_out_min_amount: slippage_bound.to_string(),
        };

        let account = match self.account_client.get_account(simulator_address).await {
            Ok(account) => account,
            Err(err) => return TxFeeInfo::from_error(err.to_string()),
        };

        self.msg_simulator
            .price_msgs(&account, &self.chain_id, &[swap_msg.to_any()])
            .await
    }
}

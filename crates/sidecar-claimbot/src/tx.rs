//! Batch claim transaction construction

use osmosis_std::types::cosmwasm::wasm::v1::MsgExecuteContract;
use serde::Serialize;
use thiserror::Error;

use sidecar_chain::{
    Account, BroadcastMode, ChainError, Keyring, MsgSimulator, TxResponse, TxServiceClient,
};
use sidecar_core::orderbook::Order;

#[derive(Debug, Error)]
pub enum ClaimTxError {
    #[error("failed to marshal batch claim message: {0}")]
    Marshal(#[from] serde_json::Error),

    #[error("failed to build transaction: {0}")]
    Build(ChainError),

    #[error("failed to broadcast transaction: {0}")]
    Broadcast(ChainError),
}

/// Batch claim message accepted by the orderbook contract.
#[derive(Serialize)]
struct BatchClaim {
    batch_claim: BatchClaimOrders,
}

/// Each order is addressed by its `[tick_id, order_id]` pair.
#[derive(Serialize)]
struct BatchClaimOrders {
    orders: Vec<[i64; 2]>,
}

/// Encodes the claims into the contract's `batch_claim` JSON message,
/// preserving input order.
pub fn prepare_batch_claim_msg(claims: &[Order]) -> Result<Vec<u8>, serde_json::Error> {
    let orders = claims
        .iter()
        .map(|claim| [claim.tick_id, claim.order_id])
        .collect();

    serde_json::to_vec(&BatchClaim {
        batch_claim: BatchClaimOrders { orders },
    })
}

/// Builds the contract execution carrying the claim message. No funds are
/// attached.
fn build_execute_contract_msg(
    sender: &str,
    contract_address: &str,
    msg_bytes: Vec<u8>,
) -> MsgExecuteContract {
    MsgExecuteContract {
        sender: sender.to_string(),
        contract: contract_address.to_string(),
        msg: msg_bytes,
        funds: Vec::new(),
    }
}

/// Prepares, signs and broadcasts a batch claim transaction.
pub(crate) async fn send_batch_claim_tx(
    keyring: &dyn Keyring,
    msg_simulator: &dyn MsgSimulator,
    tx_service_client: &dyn TxServiceClient,
    chain_id: &str,
    account: &Account,
    contract_address: &str,
    claims: &[Order],
) -> Result<TxResponse, ClaimTxError> {
    let msg_bytes = prepare_batch_claim_msg(claims)?;
    let msg = build_execute_contract_msg(&keyring.address(), contract_address, msg_bytes);

    let tx = msg_simulator
        .build_tx(keyring, account, chain_id, vec![msg.to_any()])
        .await
        .map_err(ClaimTxError::Build)?;

    tx_service_client
        .broadcast_tx(tx.encode(), BroadcastMode::Sync)
        .await
        .map_err(ClaimTxError::Broadcast)
}

#[cfg(test)]
mod tests {
    use sidecar_core::orderbook::OrderDirection;

    use super::*;

    fn order(tick_id: i64, order_id: i64) -> Order {
        Order {
            tick_id,
            order_id,
            order_direction: OrderDirection::Bid,
            owner: "osmo1owner".to_string(),
            quantity: "1".to_string(),
            placed_quantity: "1".to_string(),
            etas: "0".to_string(),
            claim_bounty: "0".to_string(),
            placed_at: "0".to_string(),
        }
    }

    #[test]
    fn test_prepare_batch_claim_msg_is_byte_exact() {
        let msg = prepare_batch_claim_msg(&[order(1, 100), order(2, 200)]).unwrap();
        assert_eq!(
            String::from_utf8(msg).unwrap(),
            r#"{"batch_claim":{"orders":[[1,100],[2,200]]}}"#
        );
    }

    #[test]
    fn test_prepare_batch_claim_msg_preserves_order() {
        let msg = prepare_batch_claim_msg(&[order(5, 2), order(-3, 1)]).unwrap();
        assert_eq!(
            String::from_utf8(msg).unwrap(),
            r#"{"batch_claim":{"orders":[[5,2],[-3,1]]}}"#
        );
    }

    #[test]
    fn test_prepare_batch_claim_msg_round_trips() {
        let msg = prepare_batch_claim_msg(&[order(1, 100)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&msg).unwrap();
        assert_eq!(value["batch_claim"]["orders"][0][0], 1);
        assert_eq!(value["batch_claim"]["orders"][0][1], 100);
    }

    #[test]
    fn test_execute_contract_msg_has_no_funds() {
        let msg = build_execute_contract_msg("osmo1sender", "osmo1contract", vec![1, 2]);
        assert!(msg.funds.is_empty());
        assert_eq!(msg.sender, "osmo1sender");
        assert_eq!(msg.contract, "osmo1contract");
    }
}

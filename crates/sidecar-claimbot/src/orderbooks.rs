//! Concurrent claimable-order collection

use std::sync::Arc;

use cosmwasm_std::Decimal;
use tokio::sync::mpsc;

use sidecar_core::orderbook::ClaimableOrderbook;
use sidecar_core::types::CanonicalOrderbookResult;
use sidecar_orderbook::OrderbookUsecase;

/// An orderbook together with its claimable orders, or the error that
/// prevented collecting them.
pub(crate) struct ProcessedOrderbook {
    pub orderbook: CanonicalOrderbookResult,
    pub orders: Vec<ClaimableOrderbook>,
    pub error: Option<String>,
}

/// Collects claimable orders for each orderbook, one task per orderbook.
pub(crate) async fn process_orderbooks_and_get_claimable_orders(
    orderbook_usecase: &Arc<OrderbookUsecase>,
    fill_threshold: Decimal,
    orderbooks: Vec<CanonicalOrderbookResult>,
) -> Vec<ProcessedOrderbook> {
    let (tx, mut rx) = mpsc::channel(orderbooks.len().max(1));

    let expected = orderbooks.len();
    for orderbook in orderbooks {
        let usecase = Arc::clone(orderbook_usecase);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = usecase
                .get_claimable_orders_for_orderbook(fill_threshold, &orderbook)
                .await;
            let processed = match result {
                Ok(orders) => ProcessedOrderbook {
                    orderbook,
                    orders,
                    error: None,
                },
                Err(err) => ProcessedOrderbook {
                    orderbook,
                    orders: Vec::new(),
                    error: Some(err.to_string()),
                },
            };
            let _ = tx.send(processed).await;
        });
    }
    drop(tx);

    let mut results = Vec::with_capacity(expected);
    while let Some(processed) = rx.recv().await {
        results.push(processed);
    }
    results
}

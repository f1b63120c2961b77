use ethers::types::{TransactionRequest, TxHash, U64};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ActionError;
use crate::presale;
use crate::refresher;
use crate::state::AppState;
use crate::types::PresaleSnapshot;

/// Bounds check against a snapshot. Pure so the rules can be tested on their own.
pub fn validate_contribution(snapshot: &PresaleSnapshot, amount: Decimal, symbol: &str) -> Result<(), ActionError> {
    if amount <= Decimal::ZERO {
        return Err(ActionError::InvalidAmount);
    }
    if !snapshot.is_active {
        return Err(ActionError::PresaleInactive);
    }
    if amount < snapshot.min_contribution {
        return Err(ActionError::BelowMinimum {
            min: snapshot.min_contribution.normalize(),
            symbol: symbol.to_string(),
        });
    }
    if amount > snapshot.max_contribution {
        return Err(ActionError::AboveMaximum {
            max: snapshot.max_contribution.normalize(),
            symbol: symbol.to_string(),
        });
    }
    Ok(())
}

fn reject<T>(app: &AppState, err: ActionError) -> Result<T, ActionError> {
    tracing::info!(error = %err, "action refused");
    app.notices.error(&err.to_string());
    Err(err)
}

/// Submit, wait for the receipt, report, and schedule a refresh on success.
async fn submit(
    app: &Arc<AppState>,
    action: &'static str,
    tx: TransactionRequest,
    confirmed_msg: &str,
) -> Result<TxHash, ActionError> {
    let Some((provider, session)) = app.connector.active() else {
        return reject(app, ActionError::NotConnected);
    };

    let hash = match provider.send_transaction(tx).await {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!(error = %e, action, "transaction submit failed");
            return reject(app, ActionError::from_wallet(action, e));
        }
    };
    tracing::info!(tx = %format!("{hash:#x}"), from = %format!("{:#x}", session.address), action, "transaction sent");
    app.notices.success(&format!("{action} sent! TX: {hash:#x}"));

    match provider.wait_for_receipt(hash).await {
        Ok(Some(receipt)) if receipt.status == Some(U64::one()) => {
            tracing::info!(tx = %format!("{hash:#x}"), action, "transaction confirmed");
            app.notices.success(confirmed_msg);
            refresher::schedule_refresh(app.clone(), Duration::from_millis(app.config.refresh_delay_ms));
            Ok(hash)
        }
        Ok(_) => {
            tracing::warn!(tx = %format!("{hash:#x}"), action, "transaction failed or dropped");
            reject(app, ActionError::TransactionFailed)
        }
        Err(e) => {
            tracing::warn!(error = %e, tx = %format!("{hash:#x}"), action, "waiting for receipt failed");
            reject(app, ActionError::from_wallet(action, e))
        }
    }
}

pub async fn contribute(app: &Arc<AppState>, amount: Decimal) -> Result<TxHash, ActionError> {
    if !app.connector.is_connected() {
        return reject(app, ActionError::NotConnected);
    }

    let network = &app.config.network;
    let snapshot = app.snapshot_or_default();
    if let Err(e) = validate_contribution(&snapshot, amount, network.symbol()) {
        return reject(app, e);
    }

    let value = match presale::to_wei(amount, network.currency.decimals) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, %amount, "amount conversion failed");
            return reject(app, ActionError::InvalidAmount);
        }
    };

    let tx = TransactionRequest::new()
        .to(app.reader.contract())
        .value(value)
        .data(presale::contribute_calldata());
    submit(app, "Contribution", tx, "Contribution confirmed!").await
}

pub async fn claim_tokens(app: &Arc<AppState>) -> Result<TxHash, ActionError> {
    if !app.connector.is_connected() {
        return reject(app, ActionError::NotConnected);
    }
    let tx = TransactionRequest::new()
        .to(app.reader.contract())
        .data(presale::claim_calldata());
    submit(app, "Claim", tx, "Tokens claimed successfully!").await
}

/// Tokens `amount` buys at the display price.
pub fn estimate_tokens(app: &AppState, amount: Decimal) -> Decimal {
    let snapshot = app.snapshot_or_default();
    let price = app.config.network.estimate_price(&snapshot);
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    amount.checked_div(price).unwrap_or(Decimal::ZERO)
}

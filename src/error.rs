use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::ConnectionKind;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-3326: the requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no {0} wallet is configured")]
    ProviderMissing(ConnectionKind),
    #[error("request rejected in wallet")]
    UserRejected,
    #[error("chain {0} is not registered in the wallet")]
    UnrecognizedChain(u64),
    #[error("wallet returned no accounts")]
    NoAccounts,
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("wallet rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("{0}")]
    Other(String),
}

impl WalletError {
    /// Map a JSON-RPC error object returned by a wallet.
    pub fn from_rpc(code: i64, message: &str, chain_id: u64) -> Self {
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain(chain_id),
            _ => Self::classify(message).unwrap_or_else(|| Self::Rpc {
                code,
                message: message.to_string(),
            }),
        }
    }

    /// Best-effort classification of free-form node / signer error text.
    pub fn classify(message: &str) -> Option<Self> {
        let lower = message.to_lowercase();
        if lower.contains("user rejected") || lower.contains("user denied") || lower.contains("rejected by user") {
            Some(Self::UserRejected)
        } else if lower.contains("insufficient funds") {
            Some(Self::InsufficientFunds(message.to_string()))
        } else if lower.contains("revert") {
            Some(Self::Reverted(message.to_string()))
        } else {
            None
        }
    }

    pub fn from_message(message: &str) -> Self {
        Self::classify(message).unwrap_or_else(|| Self::Other(message.to_string()))
    }
}

/// Why a contribute / claim did not go through. The `Display` text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Please connect your wallet first")]
    NotConnected,
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Presale is not active")]
    PresaleInactive,
    #[error("Minimum contribution is {min} {symbol}")]
    BelowMinimum { min: Decimal, symbol: String },
    #[error("Maximum contribution is {max} {symbol}")]
    AboveMaximum { max: Decimal, symbol: String },
    #[error("Transaction rejected in wallet")]
    Rejected,
    #[error("Insufficient funds for amount plus gas")]
    InsufficientFunds,
    #[error("Transaction failed")]
    TransactionFailed,
    #[error("{action} failed: {reason}")]
    Failed { action: &'static str, reason: String },
}

impl ActionError {
    pub fn from_wallet(action: &'static str, err: WalletError) -> Self {
        match err {
            WalletError::UserRejected => Self::Rejected,
            WalletError::InsufficientFunds(_) => Self::InsufficientFunds,
            WalletError::ProviderMissing(_) | WalletError::NoAccounts => Self::NotConnected,
            WalletError::Reverted(reason) | WalletError::Other(reason) => Self::Failed { action, reason },
            other => Self::Failed { action, reason: other.to_string() },
        }
    }

    /// Rejected before anything was sent to the chain.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::InvalidAmount
                | Self::PresaleInactive
                | Self::BelowMinimum { .. }
                | Self::AboveMaximum { .. }
        )
    }
}

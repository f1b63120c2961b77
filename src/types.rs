use chrono::{DateTime, Utc};
use ethers::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// One read of the presale contract. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresaleSnapshot {
    pub amount_raised: Decimal,
    pub cap: Decimal,
    pub contributor_count: u64,
    pub token_price: Decimal,
    pub min_contribution: Decimal,
    pub max_contribution: Decimal,
    /// unix seconds
    pub start_time: i64,
    /// unix seconds
    pub end_time: i64,
    pub is_active: bool,
    pub whitelist_enabled: bool,
    /// `tokensSold()` when the contract reports it directly.
    pub reported_tokens_sold: Option<Decimal>,
}

impl PresaleSnapshot {
    /// raised / cap as a percentage, clamped to [0, 100]. Zero cap reads as 0%.
    pub fn progress(&self) -> Decimal {
        self.progress_toward(self.cap)
    }

    /// raised / target as a percentage, clamped to [0, 100].
    pub fn progress_toward(&self, target: Decimal) -> Decimal {
        if target <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        // target > 0, so a failed step can only be an overflow
        self.amount_raised
            .checked_div(target)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ONE_HUNDRED)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }

    /// Whole days until `end_time`, rounded up, never negative.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let left = self.end_time - now.timestamp();
        if left <= 0 {
            0
        } else {
            (left + SECS_PER_DAY - 1) / SECS_PER_DAY
        }
    }

    pub fn tokens_sold(&self) -> Decimal {
        if let Some(sold) = self.reported_tokens_sold {
            return sold;
        }
        self.amount_raised.checked_div(self.token_price).unwrap_or(Decimal::ZERO)
    }

    pub fn remaining_to_cap(&self) -> Decimal {
        (self.cap - self.amount_raised).max(Decimal::ZERO)
    }

    pub fn average_contribution(&self) -> Decimal {
        if self.contributor_count == 0 {
            return Decimal::ZERO;
        }
        self.amount_raised
            .checked_div(Decimal::from(self.contributor_count))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.start_time
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.end_time
    }
}

/// How the wallet session was established.
///
/// `Injected` is a signer held by this process (the key configured at startup),
/// `Bridge` is a remote signer reached over JSON-RPC whose session survives restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Injected,
    Bridge,
}

impl ConnectionKind {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionKind::Injected => "Injected Wallet",
            ConnectionKind::Bridge => "Wallet Bridge",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "injected" | "metamask" | "key" => Some(Self::Injected),
            "bridge" | "walletconnect" | "remote" => Some(Self::Bridge),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionKind::Injected => write!(f, "injected"),
            ConnectionKind::Bridge => write!(f, "bridge"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    pub address: Address,
    pub chain_id: u64,
    pub kind: ConnectionKind,
    pub is_connected: bool,
}

impl WalletSession {
    pub fn connected(address: Address, chain_id: u64, kind: ConnectionKind) -> Self {
        Self { address, chain_id, kind, is_connected: true }
    }

    /// `0x1234...abcd`
    pub fn short_address(&self) -> String {
        let full = format!("{:#x}", self.address);
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

/// Per-user values read while a session is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UserStats {
    pub contribution: Decimal,
    pub balance: Decimal,
}

/// Events a wallet provider emits after the session is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnect,
}

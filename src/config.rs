use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::path::PathBuf;

use crate::types::PresaleSnapshot;

const DEFAULT_NETWORK: &str = "bsc-testnet";
const GENETAI_CONTRACT: &str = "0x783Ab31e81A0FA50F3D6a85bF9F2A7f8DDDdC75E";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Values shown when the contract cannot be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDefaults {
    pub cap: Decimal,
    pub token_price: Decimal,
    pub min_contribution: Decimal,
    pub max_contribution: Decimal,
    pub duration_days: i64,
}

/// Which set of view functions the deployed contract exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractAbi {
    /// `hardCap`, `tokenPrice`, `presaleActive`, start / end times and
    /// `userContributions(address)`. Tokens sold is derived from raised / price.
    Full,
    /// `totalRaised`, `totalContributors`, `tokensSold`, `presaleEndTime`, the
    /// contribution bounds and `contributions(address)`. Nothing else.
    Dashboard,
}

impl ContractAbi {
    pub fn user_contribution_fn(self) -> &'static str {
        match self {
            ContractAbi::Full => "userContributions(address)",
            ContractAbi::Dashboard => "contributions(address)",
        }
    }

    pub fn tokens_sold_fn(self) -> Option<&'static str> {
        match self {
            ContractAbi::Full => None,
            ContractAbi::Dashboard => Some("tokensSold()"),
        }
    }
}

/// A named deployment: chain parameters, contract, units and display policy.
#[derive(Debug, Clone)]
pub struct NetworkProfile {
    pub name: String,
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub contract_address: String,
    pub abi: ContractAbi,
    pub currency: NativeCurrency,
    pub defaults: SnapshotDefaults,
    /// USD per native unit. When set, raised amounts are also shown in dollars.
    pub usd_price: Option<Decimal>,
    /// Dollar goal used for progress instead of the on-chain cap.
    pub goal_usd: Option<Decimal>,
    /// Fixed price used for token estimates instead of the on-chain price.
    pub display_token_price: Option<Decimal>,
    pub snapshot_interval_secs: u64,
}

/// `wallet_addEthereumChain` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl NetworkProfile {
    pub fn names() -> &'static [&'static str] {
        &["bsc-testnet", "bsc-testnet-usd", "ethereum-sepolia"]
    }

    pub fn named(name: &str) -> Option<Self> {
        match name {
            "bsc-testnet" => Some(Self::bsc_testnet()),
            "bsc-testnet-usd" => Some(Self::bsc_testnet_usd()),
            "ethereum-sepolia" => Some(Self::ethereum_sepolia()),
            _ => None,
        }
    }

    fn bsc_testnet() -> Self {
        Self {
            name: "bsc-testnet".into(),
            chain_id: 97,
            chain_name: "Binance Smart Chain Testnet".into(),
            rpc_url: "https://data-seed-prebsc-1-s1.binance.org:8545/".into(),
            explorer_url: "https://testnet.bscscan.com".into(),
            contract_address: GENETAI_CONTRACT.into(),
            abi: ContractAbi::Full,
            currency: NativeCurrency { name: "BNB".into(), symbol: "BNB".into(), decimals: 18 },
            defaults: SnapshotDefaults {
                cap: dec!(100),
                token_price: dec!(0.0004),
                min_contribution: dec!(0.01),
                max_contribution: dec!(10),
                duration_days: 30,
            },
            usd_price: None,
            goal_usd: None,
            display_token_price: None,
            snapshot_interval_secs: 30,
        }
    }

    fn bsc_testnet_usd() -> Self {
        Self {
            name: "bsc-testnet-usd".into(),
            abi: ContractAbi::Dashboard,
            usd_price: Some(dec!(300)),
            goal_usd: Some(dec!(1000000)),
            display_token_price: Some(dec!(0.15)),
            snapshot_interval_secs: 10,
            ..Self::bsc_testnet()
        }
    }

    fn ethereum_sepolia() -> Self {
        Self {
            name: "ethereum-sepolia".into(),
            chain_id: 11_155_111,
            chain_name: "Sepolia".into(),
            rpc_url: "https://rpc.sepolia.org".into(),
            explorer_url: "https://sepolia.etherscan.io".into(),
            currency: NativeCurrency { name: "Sepolia Ether".into(), symbol: "ETH".into(), decimals: 18 },
            ..Self::bsc_testnet()
        }
    }

    pub fn symbol(&self) -> &str {
        &self.currency.symbol
    }

    /// 97 -> "0x61"
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn chain_params(&self) -> ChainParams {
        let explorer = if self.explorer_url.ends_with('/') {
            self.explorer_url.clone()
        } else {
            format!("{}/", self.explorer_url)
        };
        ChainParams {
            chain_id: self.chain_id_hex(),
            chain_name: self.chain_name.clone(),
            native_currency: self.currency.clone(),
            rpc_urls: vec![self.rpc_url.clone()],
            block_explorer_urls: vec![explorer],
        }
    }

    /// Progress target in native units: the dollar goal converted at `usd_price`
    /// when both are set, otherwise the on-chain cap.
    pub fn target_amount(&self, snapshot: &PresaleSnapshot) -> Decimal {
        match (self.goal_usd, self.usd_price) {
            (Some(goal), Some(price)) if price > Decimal::ZERO => {
                goal.checked_div(price).unwrap_or(snapshot.cap)
            }
            _ => snapshot.cap,
        }
    }

    pub fn estimate_price(&self, snapshot: &PresaleSnapshot) -> Decimal {
        self.display_token_price.unwrap_or(snapshot.token_price)
    }

    pub fn default_snapshot(&self, now: DateTime<Utc>) -> PresaleSnapshot {
        PresaleSnapshot {
            amount_raised: Decimal::ZERO,
            cap: self.defaults.cap,
            contributor_count: 0,
            token_price: self.defaults.token_price,
            min_contribution: self.defaults.min_contribution,
            max_contribution: self.defaults.max_contribution,
            start_time: now.timestamp(),
            end_time: (now + Duration::days(self.defaults.duration_days)).timestamp(),
            is_active: true,
            whitelist_enabled: false,
            reported_tokens_sold: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub static_dir: PathBuf,
    pub network: NetworkProfile,

    pub user_interval_secs: u64,
    pub refresh_delay_ms: u64,
    pub startup_delay_ms: u64,
    pub notice_ttl_secs: u64,
    pub wallet_watch_secs: u64,

    pub wallet_private_key: String,
    pub wallet_bridge_url: String,
    pub session_file: PathBuf,

    pub log_level: String,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let network_name = env_or("PRESALE_NETWORK", DEFAULT_NETWORK);
        let mut network = NetworkProfile::named(&network_name).with_context(|| {
            format!(
                "unknown PRESALE_NETWORK {network_name}, expected one of {}",
                NetworkProfile::names().join(", ")
            )
        })?;
        if let Ok(rpc) = std::env::var("PRESALE_RPC_URL") {
            network.rpc_url = rpc;
        }
        if let Ok(contract) = std::env::var("PRESALE_CONTRACT") {
            network.contract_address = contract;
        }
        if let Ok(secs) = std::env::var("SNAPSHOT_INTERVAL_SECS") {
            network.snapshot_interval_secs = secs
                .parse()
                .with_context(|| format!("invalid SNAPSHOT_INTERVAL_SECS: {secs}"))?;
        }

        let config = Self {
            http_port: env_or("PORT", "3000").parse().context("invalid PORT")?,
            static_dir: PathBuf::from(env_or("STATIC_DIR", ".")),
            network,

            user_interval_secs: env_or("USER_INTERVAL_SECS", "5").parse()?,
            refresh_delay_ms: env_or("REFRESH_DELAY_MS", "3000").parse()?,
            startup_delay_ms: env_or("STARTUP_DELAY_MS", "2000").parse()?,
            notice_ttl_secs: env_or("NOTICE_TTL_SECS", "5").parse()?,
            wallet_watch_secs: env_or("WALLET_WATCH_SECS", "5").parse()?,

            wallet_private_key: env_or("WALLET_PRIVATE_KEY", ""),
            wallet_bridge_url: env_or("WALLET_BRIDGE_URL", ""),
            session_file: PathBuf::from(env_or("SESSION_FILE", "session.json")),

            log_level: env_or("LOG_LEVEL", "info"),
            log_format: env_or("LOG_FORMAT", "text"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.network.rpc_url)
            .with_context(|| format!("invalid rpc url: {}", self.network.rpc_url))?;
        url::Url::parse(&self.network.explorer_url)
            .with_context(|| format!("invalid explorer url: {}", self.network.explorer_url))?;
        if self.has_bridge() {
            url::Url::parse(&self.wallet_bridge_url)
                .with_context(|| format!("invalid WALLET_BRIDGE_URL: {}", self.wallet_bridge_url))?;
        }
        self.network
            .contract_address
            .parse::<ethers::types::Address>()
            .with_context(|| format!("invalid contract address: {}", self.network.contract_address))?;
        if self.network.snapshot_interval_secs == 0 || self.user_interval_secs == 0 {
            bail!("refresh intervals must be > 0");
        }
        Ok(())
    }

    pub fn has_key_wallet(&self) -> bool {
        !self.wallet_private_key.is_empty()
            && self.wallet_private_key != "0x0000000000000000000000000000000000000000000000000000000000000001"
    }

    pub fn has_bridge(&self) -> bool {
        !self.wallet_bridge_url.is_empty()
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

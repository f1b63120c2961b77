/// Fixtures shared by the async tests: a scripted chain, a scripted wallet and
/// an `AppState` wired to both.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, TxHash, U256, U64};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::{ChainParams, Config, NetworkProfile};
use crate::error::WalletError;
use crate::presale::{self, ChainReader};
use crate::state::AppState;
use crate::types::ConnectionKind;
use crate::wallet::WalletProvider;

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn wei(amount: Decimal) -> U256 {
    presale::to_wei(amount, 18).unwrap()
}

// ── MockChain ─────────────────────────────────────────────────────────────────

/// Answers `eth_call` by selector. Unknown selectors error, like a node calling
/// a function the contract does not have.
#[derive(Default)]
pub struct MockChain {
    responses: Mutex<HashMap<[u8; 4], Bytes>>,
    balances: Mutex<HashMap<Address, U256>>,
    pub fail: AtomicBool,
    pub balance_delay: Mutex<Option<Duration>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// raised 50, cap 100, 4 contributors, price 0.5, min 0.01, max 10, active,
    /// ending far in the future. No whitelist function.
    pub fn standard() -> Self {
        let chain = Self::new();
        chain.set_amount("totalRaised()", dec!(50));
        chain.set_amount("hardCap()", dec!(100));
        chain.set_uint("totalContributors()", U256::from(4));
        chain.set_amount("tokenPrice()", dec!(0.5));
        chain.set_amount("minContribution()", dec!(0.01));
        chain.set_amount("maxContribution()", dec!(10));
        chain.set_uint("presaleStartTime()", U256::from(1_700_000_000u64));
        chain.set_uint("presaleEndTime()", U256::from(4_000_000_000u64));
        chain.set_bool("presaleActive()", true);
        chain
    }

    /// Only the views the dashboard-variant contract has: no cap, price,
    /// activity flag or start time, and `contributions(address)` per user.
    pub fn dashboard() -> Self {
        let chain = Self::new();
        chain.set_amount("totalRaised()", dec!(30));
        chain.set_uint("totalContributors()", U256::from(6));
        chain.set_uint("tokensSold()", U256::from(200u64));
        chain.set_uint("presaleEndTime()", U256::from(4_000_000_000u64));
        chain.set_amount("minContribution()", dec!(0.1));
        chain.set_amount("maxContribution()", dec!(5));
        chain
    }

    pub fn set_uint(&self, signature: &str, value: U256) {
        let data = Bytes::from(abi::encode(&[Token::Uint(value)]));
        self.responses.lock().unwrap().insert(presale::selector(signature), data);
    }

    pub fn set_amount(&self, signature: &str, amount: Decimal) {
        self.set_uint(signature, wei(amount));
    }

    pub fn set_bool(&self, signature: &str, value: bool) {
        let data = Bytes::from(abi::encode(&[Token::Bool(value)]));
        self.responses.lock().unwrap().insert(presale::selector(signature), data);
    }

    pub fn remove(&self, signature: &str) {
        self.responses.lock().unwrap().remove(&presale::selector(signature));
    }

    pub fn set_balance(&self, owner: Address, amount: Decimal) {
        self.balances.lock().unwrap().insert(owner, wei(amount));
    }
}

impl ChainReader for MockChain {
    fn call(&self, _to: Address, data: Bytes) -> BoxFuture<'_, Result<Bytes>> {
        async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("connection refused"));
            }
            let key: [u8; 4] = data
                .get(..4)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| anyhow!("short calldata"))?;
            self.responses
                .lock()
                .unwrap()
                .get(&key)
                .cloned()
                .ok_or_else(|| anyhow!("execution reverted"))
        }
        .boxed()
    }

    fn native_balance(&self, owner: Address) -> BoxFuture<'_, Result<U256>> {
        async move {
            let delay = *self.balance_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("connection refused"));
            }
            Ok(self.balances.lock().unwrap().get(&owner).copied().unwrap_or_default())
        }
        .boxed()
    }
}

// ── MockWallet ────────────────────────────────────────────────────────────────

/// Scripted wallet. `chain` follows successful switch / add calls the way a
/// browser wallet does.
pub struct MockWallet {
    kind: ConnectionKind,
    pub accounts: Mutex<Vec<Address>>,
    pub chain: Mutex<u64>,
    pub switch_error: Mutex<Option<WalletError>>,
    pub add_error: Mutex<Option<WalletError>>,
    pub send_result: Mutex<Result<TxHash, WalletError>>,
    /// `None` means the transaction was dropped.
    pub receipt_status: Mutex<Option<u64>>,
    pub sent: Mutex<Vec<TransactionRequest>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl MockWallet {
    pub fn new(kind: ConnectionKind, account: Address) -> Self {
        Self {
            kind,
            accounts: Mutex::new(vec![account]),
            chain: Mutex::new(1),
            switch_error: Mutex::new(None),
            add_error: Mutex::new(None),
            send_result: Mutex::new(Ok(TxHash::repeat_byte(0xab))),
            receipt_status: Mutex::new(Some(1)),
            sent: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl WalletProvider for MockWallet {
    fn kind(&self) -> ConnectionKind {
        self.kind
    }

    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, WalletError>> {
        async move {
            self.record("request_accounts");
            Ok(self.accounts.lock().unwrap().clone())
        }
        .boxed()
    }

    fn accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, WalletError>> {
        async move {
            self.record("accounts");
            Ok(self.accounts.lock().unwrap().clone())
        }
        .boxed()
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64, WalletError>> {
        async move { Ok(*self.chain.lock().unwrap()) }.boxed()
    }

    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            self.record("switch");
            if let Some(err) = self.switch_error.lock().unwrap().clone() {
                return Err(err);
            }
            *self.chain.lock().unwrap() = chain_id;
            Ok(())
        }
        .boxed()
    }

    fn add_chain(&self, params: ChainParams) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            self.record("add");
            if let Some(err) = self.add_error.lock().unwrap().clone() {
                return Err(err);
            }
            let id = u64::from_str_radix(params.chain_id.trim_start_matches("0x"), 16)
                .map_err(|e| WalletError::Other(e.to_string()))?;
            *self.chain.lock().unwrap() = id;
            Ok(())
        }
        .boxed()
    }

    fn send_transaction(&self, tx: TransactionRequest) -> BoxFuture<'_, Result<TxHash, WalletError>> {
        async move {
            self.record("send");
            self.sent.lock().unwrap().push(tx);
            self.send_result.lock().unwrap().clone()
        }
        .boxed()
    }

    fn wait_for_receipt(&self, hash: TxHash) -> BoxFuture<'_, Result<Option<TransactionReceipt>, WalletError>> {
        async move {
            let status = *self.receipt_status.lock().unwrap();
            Ok(status.map(|s| TransactionReceipt {
                transaction_hash: hash,
                status: Some(U64::from(s)),
                ..Default::default()
            }))
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            self.record("disconnect");
            Ok(())
        }
        .boxed()
    }
}

// ── AppState ──────────────────────────────────────────────────────────────────

static SESSION_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn temp_session_file() -> PathBuf {
    let n = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("genetai-session-{}-{n}.json", std::process::id()))
}

pub fn test_config(network: &str) -> Config {
    Config {
        http_port: 0,
        static_dir: std::env::temp_dir().join("genetai-static-missing"),
        network: NetworkProfile::named(network).unwrap(),
        user_interval_secs: 5,
        refresh_delay_ms: 3000,
        startup_delay_ms: 0,
        notice_ttl_secs: 60,
        wallet_watch_secs: 5,
        wallet_private_key: String::new(),
        wallet_bridge_url: String::new(),
        session_file: temp_session_file(),
        log_level: "info".into(),
        log_format: "text".into(),
    }
}

/// A throwaway site root with pages, one stylesheet and the private files
/// that sit next to them in a real deployment.
pub fn temp_static_dir() -> PathBuf {
    let n = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("genetai-static-{}-{n}", std::process::id()));
    std::fs::create_dir_all(dir.join("styles")).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>GenetAi home</h1>").unwrap();
    std::fs::write(dir.join("docs.html"), "<h1>GenetAi docs</h1>").unwrap();
    std::fs::write(dir.join("styles").join("site.css"), "body { color: teal; }").unwrap();
    std::fs::write(dir.join(".env"), "WALLET_PRIVATE_KEY=0xdeadbeef").unwrap();
    std::fs::write(dir.join("session.json"), r#"{"kind":"bridge"}"#).unwrap();
    dir
}

pub fn test_app_serving(static_dir: PathBuf) -> Arc<AppState> {
    let mut config = test_config("bsc-testnet");
    config.static_dir = static_dir;
    AppState::new(config, Arc::new(MockChain::standard()), vec![]).unwrap()
}

pub fn test_app(chain: Arc<MockChain>, wallets: Vec<Arc<MockWallet>>) -> Arc<AppState> {
    test_app_on("bsc-testnet", chain, wallets)
}

pub fn test_app_on(network: &str, chain: Arc<MockChain>, wallets: Vec<Arc<MockWallet>>) -> Arc<AppState> {
    let wallets: Vec<Arc<dyn WalletProvider>> = wallets
        .into_iter()
        .map(|w| w as Arc<dyn WalletProvider>)
        .collect();
    AppState::new(test_config(network), chain, wallets).unwrap()
}

pub fn notice_messages(app: &AppState) -> Vec<String> {
    app.notices
        .active(chrono::Utc::now())
        .into_iter()
        .map(|n| n.message)
        .collect()
}

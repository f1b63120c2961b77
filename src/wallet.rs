use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, MiddlewareError, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, TransactionRequest, TxHash};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::sync::{Arc, RwLock};

use crate::config::{ChainParams, Config};
use crate::error::WalletError;
use crate::types::ConnectionKind;

/// The subset of an EIP-1193 wallet the dashboard needs.
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ConnectionKind;
    /// Prompting account request (`eth_requestAccounts`).
    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, WalletError>>;
    /// Already-authorized accounts (`eth_accounts`), never prompts.
    fn accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, WalletError>>;
    fn chain_id(&self) -> BoxFuture<'_, Result<u64, WalletError>>;
    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>>;
    fn add_chain(&self, params: ChainParams) -> BoxFuture<'_, Result<(), WalletError>>;
    fn send_transaction(&self, tx: TransactionRequest) -> BoxFuture<'_, Result<TxHash, WalletError>>;
    /// Resolves once the transaction is mined; `None` if it was dropped.
    fn wait_for_receipt(&self, hash: TxHash) -> BoxFuture<'_, Result<Option<TransactionReceipt>, WalletError>>;
    fn disconnect(&self) -> BoxFuture<'_, Result<(), WalletError>>;
}

fn wallet_error<E: MiddlewareError>(err: E, chain_id: u64) -> WalletError {
    match err.as_error_response() {
        Some(resp) => WalletError::from_rpc(resp.code, &resp.message, chain_id),
        None => WalletError::from_message(&err.to_string()),
    }
}

fn parse_chain_hex(raw: &str) -> Option<u64> {
    u64::from_str_radix(raw.strip_prefix("0x").unwrap_or(raw), 16).ok()
}

type SignedClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Signer whose key lives in this process.
///
/// "Switching" verifies the bound RPC serves the requested chain; "adding" a
/// chain rebinds the signer to the RPC URL from the chain parameters.
pub struct KeyWallet {
    wallet: LocalWallet,
    client: RwLock<Arc<SignedClient>>,
}

impl KeyWallet {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let wallet: LocalWallet = config
            .wallet_private_key
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid WALLET_PRIVATE_KEY: {e}"))?;
        let wallet = wallet.with_chain_id(config.network.chain_id);
        let provider = Provider::<Http>::try_from(config.network.rpc_url.as_str())?;
        let client = Arc::new(SignerMiddleware::new(provider, wallet.clone()));
        tracing::info!(address = %format!("{:#x}", wallet.address()), "key wallet loaded");
        Ok(Self { wallet, client: RwLock::new(client) })
    }

    fn client(&self) -> Arc<SignedClient> {
        self.client.read().unwrap().clone()
    }

    fn rebind(&self, provider: Provider<Http>, chain_id: u64) {
        let wallet = self.wallet.clone().with_chain_id(chain_id);
        *self.client.write().unwrap() = Arc::new(SignerMiddleware::new(provider, wallet));
    }

    async fn rpc_chain_id(provider: &Provider<Http>) -> Result<u64, WalletError> {
        let id = provider.get_chainid().await.map_err(|e| wallet_error(e, 0))?;
        Ok(id.as_u64())
    }
}

impl WalletProvider for KeyWallet {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Injected
    }

    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, WalletError>> {
        async move { Ok(vec![self.wallet.address()]) }.boxed()
    }

    fn accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, WalletError>> {
        async move { Ok(vec![self.wallet.address()]) }.boxed()
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64, WalletError>> {
        async move {
            let client = self.client();
            Self::rpc_chain_id(client.provider()).await
        }
        .boxed()
    }

    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            let client = self.client();
            let served = Self::rpc_chain_id(client.provider()).await?;
            if served != chain_id {
                return Err(WalletError::UnrecognizedChain(chain_id));
            }
            self.rebind(client.provider().clone(), chain_id);
            Ok(())
        }
        .boxed()
    }

    fn add_chain(&self, params: ChainParams) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            let wanted = parse_chain_hex(&params.chain_id)
                .ok_or_else(|| WalletError::Other(format!("bad chain id {}", params.chain_id)))?;
            let rpc = params
                .rpc_urls
                .first()
                .ok_or_else(|| WalletError::Other("no rpc url in chain params".into()))?;
            let provider = Provider::<Http>::try_from(rpc.as_str())
                .map_err(|e| WalletError::Other(format!("invalid rpc url {rpc}: {e}")))?;
            let served = Self::rpc_chain_id(&provider).await?;
            if served != wanted {
                return Err(WalletError::Other(format!(
                    "{rpc} serves chain {served}, expected {wanted}"
                )));
            }
            tracing::info!(chain_id = wanted, rpc = %rpc, "key wallet bound to new network");
            self.rebind(provider, wanted);
            Ok(())
        }
        .boxed()
    }

    fn send_transaction(&self, tx: TransactionRequest) -> BoxFuture<'_, Result<TxHash, WalletError>> {
        async move {
            let client = self.client();
            let chain_id = client.signer().chain_id();
            let pending = client
                .send_transaction(tx, None)
                .await
                .map_err(|e| wallet_error(e, chain_id))?;
            Ok(pending.tx_hash())
        }
        .boxed()
    }

    fn wait_for_receipt(&self, hash: TxHash) -> BoxFuture<'_, Result<Option<TransactionReceipt>, WalletError>> {
        async move {
            let client = self.client();
            PendingTransaction::new(hash, client.provider())
                .await
                .map_err(|e| wallet_error(e, 0))
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), WalletError>> {
        async move { Ok(()) }.boxed()
    }
}

/// Remote signer reached over JSON-RPC (a wallet bridge endpoint that holds the
/// user's accounts and answers the EIP-1193 wallet methods).
pub struct BridgeWallet {
    provider: Provider<Http>,
    account: RwLock<Option<Address>>,
}

impl BridgeWallet {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(config.wallet_bridge_url.as_str())?;
        Ok(Self { provider, account: RwLock::new(None) })
    }

    fn remember(&self, accounts: &[Address]) {
        *self.account.write().unwrap() = accounts.first().copied();
    }
}

impl WalletProvider for BridgeWallet {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Bridge
    }

    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, WalletError>> {
        async move {
            let accounts: Vec<Address> = self
                .provider
                .request("eth_requestAccounts", ())
                .await
                .map_err(|e| wallet_error(e, 0))?;
            self.remember(&accounts);
            Ok(accounts)
        }
        .boxed()
    }

    fn accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, WalletError>> {
        async move {
            let accounts = self.provider.get_accounts().await.map_err(|e| wallet_error(e, 0))?;
            self.remember(&accounts);
            Ok(accounts)
        }
        .boxed()
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64, WalletError>> {
        async move {
            let id = self.provider.get_chainid().await.map_err(|e| wallet_error(e, 0))?;
            Ok(id.as_u64())
        }
        .boxed()
    }

    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            let params = [serde_json::json!({ "chainId": format!("{chain_id:#x}") })];
            self.provider
                .request::<_, serde_json::Value>("wallet_switchEthereumChain", params)
                .await
                .map_err(|e| wallet_error(e, chain_id))?;
            Ok(())
        }
        .boxed()
    }

    fn add_chain(&self, params: ChainParams) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            let chain_id = parse_chain_hex(&params.chain_id).unwrap_or_default();
            self.provider
                .request::<_, serde_json::Value>("wallet_addEthereumChain", [params])
                .await
                .map_err(|e| wallet_error(e, chain_id))?;
            Ok(())
        }
        .boxed()
    }

    fn send_transaction(&self, tx: TransactionRequest) -> BoxFuture<'_, Result<TxHash, WalletError>> {
        async move {
            let from = (*self.account.read().unwrap()).ok_or(WalletError::NoAccounts)?;
            let pending = self
                .provider
                .send_transaction(tx.from(from), None)
                .await
                .map_err(|e| wallet_error(e, 0))?;
            Ok(pending.tx_hash())
        }
        .boxed()
    }

    fn wait_for_receipt(&self, hash: TxHash) -> BoxFuture<'_, Result<Option<TransactionReceipt>, WalletError>> {
        async move {
            PendingTransaction::new(hash, &self.provider)
                .await
                .map_err(|e| wallet_error(e, 0))
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            *self.account.write().unwrap() = None;
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_hex_parsing() {
        assert_eq!(parse_chain_hex("0x61"), Some(97));
        assert_eq!(parse_chain_hex("aa36a7"), Some(11_155_111));
        assert_eq!(parse_chain_hex("0xzz"), None);
    }
}

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use ethers::abi::{self, ParamType, Token};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use ethers::utils::keccak256;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{ContractAbi, NetworkProfile};
use crate::types::PresaleSnapshot;

const TOTAL_RAISED: &str = "totalRaised()";
const HARD_CAP: &str = "hardCap()";
const TOTAL_CONTRIBUTORS: &str = "totalContributors()";
const TOKEN_PRICE: &str = "tokenPrice()";
const MAX_CONTRIBUTION: &str = "maxContribution()";
const MIN_CONTRIBUTION: &str = "minContribution()";
const PRESALE_END_TIME: &str = "presaleEndTime()";
const PRESALE_START_TIME: &str = "presaleStartTime()";
const PRESALE_ACTIVE: &str = "presaleActive()";
const WHITELIST_ENABLED: &str = "whitelistEnabled()";
const CONTRIBUTE: &str = "contribute()";
const CLAIM_TOKENS: &str = "claimTokens()";

/// Read-only access to the chain. Implemented over JSON-RPC in production and
/// by fixtures in tests.
pub trait ChainReader: Send + Sync {
    /// `eth_call` against `to` with raw calldata.
    fn call(&self, to: Address, data: Bytes) -> BoxFuture<'_, Result<Bytes>>;
    /// Native balance of `owner` in wei.
    fn native_balance(&self, owner: Address) -> BoxFuture<'_, Result<U256>>;
}

pub struct RpcReader {
    provider: Provider<Http>,
}

impl RpcReader {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| format!("invalid rpc url: {rpc_url}"))?;
        Ok(Self { provider })
    }
}

impl ChainReader for RpcReader {
    fn call(&self, to: Address, data: Bytes) -> BoxFuture<'_, Result<Bytes>> {
        async move {
            let tx = TransactionRequest::new().to(to).data(data);
            let out = self.provider.call(&tx.into(), None).await?;
            Ok(out)
        }
        .boxed()
    }

    fn native_balance(&self, owner: Address) -> BoxFuture<'_, Result<U256>> {
        async move { Ok(self.provider.get_balance(owner, None).await?) }.boxed()
    }
}

pub(crate) fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub(crate) fn calldata(signature: &str, args: &[Token]) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&abi::encode(args));
    Bytes::from(data)
}

pub fn contribute_calldata() -> Bytes {
    calldata(CONTRIBUTE, &[])
}

pub fn claim_calldata() -> Bytes {
    calldata(CLAIM_TOKENS, &[])
}

/// wei -> native units, trailing zeros stripped. Values past `Decimal::MAX`
/// (e.g. a `type(uint256).max` "no limit" sentinel) saturate.
pub fn from_wei(value: U256, decimals: u8) -> Result<Decimal> {
    let whole = value / U256::exp10(usize::from(decimals));
    if whole >= U256::from(Decimal::MAX.mantissa().unsigned_abs()) {
        return Ok(Decimal::MAX);
    }
    let formatted = ethers::utils::format_units(value, u32::from(decimals))
        .map_err(|e| anyhow!("format_units: {e}"))?;
    let parsed = Decimal::from_str(&formatted)
        .with_context(|| format!("amount out of range: {formatted}"))?;
    Ok(parsed.normalize())
}

/// native units -> wei. Negative amounts are rejected.
pub fn to_wei(amount: Decimal, decimals: u8) -> Result<U256> {
    if amount.is_sign_negative() {
        return Err(anyhow!("negative amount: {amount}"));
    }
    let parsed = ethers::utils::parse_units(amount.normalize().to_string(), u32::from(decimals))
        .map_err(|e| anyhow!("parse_units: {e}"))?;
    Ok(parsed.into())
}

fn saturating_u64(value: U256) -> u64 {
    value.min(U256::from(u64::MAX)).as_u64()
}

fn saturating_i64(value: U256) -> i64 {
    value.min(U256::from(i64::MAX as u64)).as_u64() as i64
}

/// Reads the presale contract. Reads never surface errors to the caller:
/// failures degrade to the profile defaults (snapshot) or zero (per-address values).
pub struct PresaleReader {
    chain: Arc<dyn ChainReader>,
    contract: Address,
    network: NetworkProfile,
}

impl PresaleReader {
    pub fn new(chain: Arc<dyn ChainReader>, network: NetworkProfile) -> Result<Self> {
        let contract: Address = network
            .contract_address
            .parse()
            .with_context(|| format!("invalid contract address: {}", network.contract_address))?;
        Ok(Self { chain, contract, network })
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn network(&self) -> &NetworkProfile {
        &self.network
    }

    async fn read(&self, signature: &str, args: &[Token], kind: ParamType) -> Result<Token> {
        let out = self.chain.call(self.contract, calldata(signature, args)).await?;
        let mut decoded = abi::decode(&[kind], &out)
            .with_context(|| format!("decode {signature} ({} bytes)", out.len()))?;
        decoded.pop().ok_or_else(|| anyhow!("{signature} returned nothing"))
    }

    async fn read_uint(&self, signature: &str) -> Result<U256> {
        match self.read(signature, &[], ParamType::Uint(256)).await? {
            Token::Uint(v) => Ok(v),
            other => Err(anyhow!("{signature}: expected uint, got {other:?}")),
        }
    }

    async fn read_amount(&self, signature: &str) -> Result<Decimal> {
        from_wei(self.read_uint(signature).await?, self.network.currency.decimals)
    }

    async fn read_bool(&self, signature: &str) -> Result<bool> {
        match self.read(signature, &[], ParamType::Bool).await? {
            Token::Bool(v) => Ok(v),
            other => Err(anyhow!("{signature}: expected bool, got {other:?}")),
        }
    }

    /// All view calls in parallel; the first failure aborts the whole read.
    pub async fn try_fetch_snapshot(&self) -> Result<PresaleSnapshot> {
        match self.network.abi {
            ContractAbi::Full => self.fetch_full().await,
            ContractAbi::Dashboard => self.fetch_dashboard().await,
        }
    }

    async fn fetch_full(&self) -> Result<PresaleSnapshot> {
        let required = async {
            tokio::try_join!(
                self.read_amount(TOTAL_RAISED),
                self.read_amount(HARD_CAP),
                self.read_uint(TOTAL_CONTRIBUTORS),
                self.read_amount(TOKEN_PRICE),
                self.read_amount(MAX_CONTRIBUTION),
                self.read_amount(MIN_CONTRIBUTION),
                self.read_uint(PRESALE_END_TIME),
                self.read_uint(PRESALE_START_TIME),
                self.read_bool(PRESALE_ACTIVE),
            )
        };
        // older deployments don't expose a whitelist flag
        let whitelist = async { self.read_bool(WHITELIST_ENABLED).await.unwrap_or(false) };

        let (required, whitelist_enabled) = tokio::join!(required, whitelist);
        let (raised, cap, contributors, price, max, min, end, start, active) = required?;

        Ok(PresaleSnapshot {
            amount_raised: raised,
            cap,
            contributor_count: saturating_u64(contributors),
            token_price: price,
            min_contribution: min,
            max_contribution: max,
            start_time: saturating_i64(start),
            end_time: saturating_i64(end),
            is_active: active,
            whitelist_enabled,
            reported_tokens_sold: None,
        })
    }

    /// Contracts without cap, price, activity or start time: those come from the
    /// profile defaults and tokens sold is read directly.
    async fn fetch_dashboard(&self) -> Result<PresaleSnapshot> {
        let tokens_sold_fn = self.network.abi.tokens_sold_fn().unwrap_or("tokensSold()");
        let (raised, contributors, sold, end, min, max) = tokio::try_join!(
            self.read_amount(TOTAL_RAISED),
            self.read_uint(TOTAL_CONTRIBUTORS),
            self.read_uint(tokens_sold_fn),
            self.read_uint(PRESALE_END_TIME),
            self.read_amount(MIN_CONTRIBUTION),
            self.read_amount(MAX_CONTRIBUTION),
        )?;

        let defaults = self.network.default_snapshot(Utc::now());
        Ok(PresaleSnapshot {
            amount_raised: raised,
            contributor_count: saturating_u64(contributors),
            min_contribution: min,
            max_contribution: max,
            end_time: saturating_i64(end),
            reported_tokens_sold: Some(from_wei(sold, 0)?),
            ..defaults
        })
    }

    pub async fn fetch_snapshot(&self) -> PresaleSnapshot {
        match self.try_fetch_snapshot().await {
            Ok(snapshot) => {
                tracing::debug!(
                    raised = %snapshot.amount_raised,
                    cap = %snapshot.cap,
                    contributors = snapshot.contributor_count,
                    "presale snapshot fetched"
                );
                snapshot
            }
            Err(e) => {
                tracing::warn!(error = %e, contract = %format!("{:#x}", self.contract), "presale read failed, using defaults");
                self.network.default_snapshot(Utc::now())
            }
        }
    }

    pub async fn fetch_user_contribution(&self, user: Address) -> Decimal {
        let read = async {
            let signature = self.network.abi.user_contribution_fn();
            match self.read(signature, &[Token::Address(user)], ParamType::Uint(256)).await? {
                Token::Uint(v) => from_wei(v, self.network.currency.decimals),
                other => Err(anyhow!("expected uint, got {other:?}")),
            }
        };
        read.await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, user = %format!("{user:#x}"), "user contribution read failed");
            Decimal::ZERO
        })
    }

    pub async fn fetch_balance(&self, user: Address) -> Decimal {
        let read = async {
            let wei = self.chain.native_balance(user).await?;
            from_wei(wei, self.network.currency.decimals)
        };
        read.await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, user = %format!("{user:#x}"), "balance read failed");
            Decimal::ZERO
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn selector_matches_known_values() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(contribute_calldata().len(), 4);
        assert_ne!(contribute_calldata(), claim_calldata());
    }

    #[test]
    fn wei_conversions() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(from_wei(one_and_half, 18).unwrap(), dec!(1.5));
        assert_eq!(to_wei(dec!(1.5), 18).unwrap(), one_and_half);
        assert_eq!(to_wei(dec!(0.01), 18).unwrap(), U256::from(10_000_000_000_000_000u64));
        assert!(to_wei(dec!(-1), 18).is_err());
    }

    #[test]
    fn unbounded_sentinel_saturates() {
        assert_eq!(from_wei(U256::MAX, 18).unwrap(), Decimal::MAX);
        assert_eq!(from_wei(U256::MAX, 0).unwrap(), Decimal::MAX);
        assert_eq!(from_wei(U256::from(42u64), 0).unwrap(), dec!(42));
    }

    #[test]
    fn user_contribution_calldata_encodes_address() {
        let user: Address = "0x1111111111111111111111111111111111111111".parse().unwrap();
        let signature = ContractAbi::Full.user_contribution_fn();
        let data = calldata(signature, &[Token::Address(user)]);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], &selector(signature));
        assert_eq!(&data[16..36], user.as_bytes());
    }
}

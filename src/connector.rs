use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::board::{DisplayBoard, Notifier};
use crate::config::NetworkProfile;
use crate::display;
use crate::error::WalletError;
use crate::types::{ConnectionKind, ConnectionState, WalletEvent, WalletSession};
use crate::wallet::WalletProvider;

/// Bridge session kept across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub kind: ConnectionKind,
    pub address: Address,
    pub chain_id: u64,
}

impl SavedSession {
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("failed to parse {}: {e}", path.display());
                    None
                }
            },
            Err(e) => {
                tracing::warn!("failed to read {}: {e}", path.display());
                None
            }
        }
    }

    pub fn save(&self, path: &Path) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!("failed to write {}: {e}", path.display());
                }
            }
            Err(e) => tracing::warn!("failed to serialize session: {e}"),
        }
    }

    pub fn remove(path: &Path) {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("failed to remove {}: {e}", path.display());
            }
        }
    }
}

/// What the caller must do after a provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Handled,
    RefreshUser,
    Reload,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletOption {
    pub kind: ConnectionKind,
    pub label: &'static str,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletOptions {
    pub title: String,
    pub network_info: String,
    pub options: Vec<WalletOption>,
}

/// Owns the wallet session: Disconnected -> Connecting -> Connected -> Disconnected.
pub struct WalletConnector {
    network: NetworkProfile,
    providers: HashMap<ConnectionKind, Arc<dyn WalletProvider>>,
    active: RwLock<Option<Arc<dyn WalletProvider>>>,
    session: RwLock<Option<WalletSession>>,
    state: RwLock<ConnectionState>,
    generation: AtomicU64,
    session_file: PathBuf,
    board: Arc<DisplayBoard>,
    notices: Arc<Notifier>,
}

impl WalletConnector {
    pub fn new(
        network: NetworkProfile,
        providers: Vec<Arc<dyn WalletProvider>>,
        session_file: PathBuf,
        board: Arc<DisplayBoard>,
        notices: Arc<Notifier>,
    ) -> Self {
        let providers = providers.into_iter().map(|p| (p.kind(), p)).collect();
        board.apply(display::wallet_slots(None));
        Self {
            network,
            providers,
            active: RwLock::new(None),
            session: RwLock::new(None),
            state: RwLock::new(ConnectionState::Disconnected),
            generation: AtomicU64::new(0),
            session_file,
            board,
            notices,
        }
    }

    pub fn session(&self) -> Option<WalletSession> {
        self.session.read().unwrap().clone()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Bumped on every session change so in-flight reads can detect they are stale.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The connected provider together with its session.
    pub fn active(&self) -> Option<(Arc<dyn WalletProvider>, WalletSession)> {
        let provider = self.active.read().unwrap().clone()?;
        let session = self.session()?;
        Some((provider, session))
    }

    pub fn is_available(&self, kind: ConnectionKind) -> bool {
        self.providers.contains_key(&kind)
    }

    pub fn options(&self) -> WalletOptions {
        let options = [ConnectionKind::Injected, ConnectionKind::Bridge]
            .into_iter()
            .map(|kind| WalletOption { kind, label: kind.label(), available: self.is_available(kind) })
            .collect();
        WalletOptions {
            title: format!("Connect to {}", self.network.chain_name),
            network_info: format!(
                "Connecting to {} (Chain ID: {})",
                self.network.chain_name, self.network.chain_id
            ),
            options,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write().unwrap() = state;
    }

    fn install(&self, provider: Arc<dyn WalletProvider>, session: WalletSession) {
        *self.active.write().unwrap() = Some(provider);
        *self.session.write().unwrap() = Some(session.clone());
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.set_state(ConnectionState::Connected);
        self.board.apply(display::wallet_slots(Some(&session)));
        if session.kind == ConnectionKind::Bridge {
            SavedSession { kind: session.kind, address: session.address, chain_id: session.chain_id }
                .save(&self.session_file);
        }
    }

    /// Drop the in-memory session and reset the wallet slots. The persisted bridge
    /// session is left alone.
    fn clear(&self) {
        *self.active.write().unwrap() = None;
        *self.session.write().unwrap() = None;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.set_state(ConnectionState::Disconnected);
        self.board.apply(display::wallet_slots(None));
    }

    fn provider(&self, kind: ConnectionKind) -> Result<Arc<dyn WalletProvider>, WalletError> {
        self.providers.get(&kind).cloned().ok_or(WalletError::ProviderMissing(kind))
    }

    /// Switch the wallet to the profile chain, registering it first if the wallet
    /// does not know it. User refusal and failed registration abort; any other
    /// switch error is reported and the connection proceeds.
    pub async fn ensure_network(&self, provider: &dyn WalletProvider) -> Result<(), WalletError> {
        let target = self.network.chain_id;
        match provider.switch_chain(target).await {
            Ok(()) => Ok(()),
            Err(WalletError::UnrecognizedChain(_)) => {
                tracing::info!(chain_id = target, "chain unknown to wallet, registering it");
                match provider.add_chain(self.network.chain_params()).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        tracing::warn!(error = %e, chain_id = target, "add chain failed");
                        self.notices.error(&format!(
                            "Please add {} to your wallet manually",
                            self.network.chain_name
                        ));
                        Err(e)
                    }
                }
            }
            Err(WalletError::UserRejected) => {
                self.notices.error(&format!("Network switch to {} was rejected", self.network.chain_name));
                Err(WalletError::UserRejected)
            }
            Err(e) => {
                tracing::warn!(error = %e, chain_id = target, "switch chain failed, continuing");
                self.notices.error(&format!("Could not switch to {}: {e}", self.network.chain_name));
                Ok(())
            }
        }
    }

    pub async fn connect(&self, kind: ConnectionKind) -> Result<WalletSession, WalletError> {
        let provider = match self.provider(kind) {
            Ok(p) => p,
            Err(e) => {
                self.notices.error(&format!(
                    "No {} available. Configure {} to connect.",
                    kind.label(),
                    match kind {
                        ConnectionKind::Injected => "WALLET_PRIVATE_KEY",
                        ConnectionKind::Bridge => "WALLET_BRIDGE_URL",
                    }
                ));
                return Err(e);
            }
        };

        self.set_state(ConnectionState::Connecting);
        let network = self.ensure_network(provider.as_ref()).await;
        let result = match network {
            // ensure_network reports its own failures
            Err(e) => Err(e),
            Ok(()) => self.open_session(provider, true).await.inspect_err(|e| {
                self.notices.error(&format!("Failed to connect: {e}"));
            }),
        };
        match result {
            Ok(session) => {
                tracing::info!(
                    address = %format!("{:#x}", session.address),
                    chain_id = session.chain_id,
                    kind = %kind,
                    "wallet connected"
                );
                self.notices.success(&format!("Connected to {}!", self.network.chain_name));
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = %kind, "wallet connect failed");
                self.set_state(if self.session().is_some() {
                    ConnectionState::Connected
                } else {
                    ConnectionState::Disconnected
                });
                Err(e)
            }
        }
    }

    async fn open_session(&self, provider: Arc<dyn WalletProvider>, prompt: bool) -> Result<WalletSession, WalletError> {
        let accounts = if prompt {
            provider.request_accounts().await?
        } else {
            provider.accounts().await?
        };
        let address = *accounts.first().ok_or(WalletError::NoAccounts)?;
        let chain_id = provider.chain_id().await.unwrap_or(self.network.chain_id);
        let session = WalletSession::connected(address, chain_id, provider.kind());
        self.install(provider, session.clone());
        Ok(session)
    }

    async fn establish(&self, provider: Arc<dyn WalletProvider>, prompt: bool) -> Result<WalletSession, WalletError> {
        self.ensure_network(provider.as_ref()).await?;
        self.open_session(provider, prompt).await
    }

    /// Resume a persisted bridge session without prompting. Silent on failure.
    pub async fn try_reconnect(&self) -> Option<WalletSession> {
        let saved = SavedSession::load(&self.session_file)?;
        let provider = self.providers.get(&saved.kind).cloned()?;
        match self.establish(provider, false).await {
            Ok(session) => {
                tracing::info!(address = %format!("{:#x}", session.address), "wallet session resumed");
                Some(session)
            }
            Err(e) => {
                tracing::info!(error = %e, "could not resume wallet session");
                None
            }
        }
    }

    pub async fn disconnect(&self) {
        let provider = self.active.read().unwrap().clone();
        if let Some(provider) = provider {
            if let Err(e) = provider.disconnect().await {
                tracing::warn!(error = %e, "wallet disconnect failed");
            }
        }
        self.clear();
        SavedSession::remove(&self.session_file);
        tracing::info!("wallet disconnected");
        self.notices.info("Wallet disconnected");
    }

    /// Reload after a chain change: forget the session, then resume it against
    /// the same provider without prompting.
    pub async fn reload(&self) -> Option<WalletSession> {
        let provider = self.active.read().unwrap().clone()?;
        self.clear();
        match self.establish(provider, false).await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "wallet reload failed");
                self.notices.error(&format!("Wallet disconnected after network change: {e}"));
                None
            }
        }
    }

    pub async fn handle_event(&self, event: WalletEvent) -> EventOutcome {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    self.disconnect().await;
                    EventOutcome::Handled
                }
                Some(&address) => {
                    let Some(mut session) = self.session() else {
                        return EventOutcome::Handled;
                    };
                    if session.address == address {
                        return EventOutcome::Handled;
                    }
                    session.address = address;
                    let provider = self.active.read().unwrap().clone();
                    if let Some(provider) = provider {
                        self.install(provider, session);
                    }
                    self.board.apply(display::cleared_user_slots());
                    self.notices.info("Account changed");
                    EventOutcome::RefreshUser
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                tracing::info!(chain_id, "wallet chain changed, reloading");
                EventOutcome::Reload
            }
            WalletEvent::Disconnect => {
                self.disconnect().await;
                EventOutcome::Handled
            }
        }
    }

    /// Compare the active provider against the session and report what changed.
    pub async fn poll_events(&self) -> Vec<WalletEvent> {
        let Some((provider, session)) = self.active() else {
            return Vec::new();
        };
        let mut events = Vec::new();
        match provider.accounts().await {
            Ok(accounts) => {
                if accounts.first() != Some(&session.address) {
                    events.push(WalletEvent::AccountsChanged(accounts));
                }
            }
            Err(e) => tracing::debug!(error = %e, "wallet account poll failed"),
        }
        match provider.chain_id().await {
            Ok(chain_id) if chain_id != session.chain_id => events.push(WalletEvent::ChainChanged(chain_id)),
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "wallet chain poll failed"),
        }
        events
    }
}

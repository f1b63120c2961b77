use anyhow::Result;
use chrono::Utc;
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::board::{DisplayBoard, Notifier};
use crate::config::Config;
use crate::connector::WalletConnector;
use crate::presale::{ChainReader, PresaleReader};
use crate::types::PresaleSnapshot;
use crate::wallet::WalletProvider;

/// Everything the handlers and refresh loops share. Built once at startup.
pub struct AppState {
    pub config: Config,
    pub reader: PresaleReader,
    pub connector: WalletConnector,
    pub board: Arc<DisplayBoard>,
    pub notices: Arc<Notifier>,
    pub cancel: CancellationToken,
    latest: RwLock<Option<PresaleSnapshot>>,
}

impl AppState {
    pub fn new(
        config: Config,
        chain: Arc<dyn ChainReader>,
        wallets: Vec<Arc<dyn WalletProvider>>,
    ) -> Result<Arc<Self>> {
        let board = Arc::new(DisplayBoard::new());
        let notices = Arc::new(Notifier::new(config.notice_ttl_secs));
        let reader = PresaleReader::new(chain, config.network.clone())?;
        let connector = WalletConnector::new(
            config.network.clone(),
            wallets,
            config.session_file.clone(),
            board.clone(),
            notices.clone(),
        );
        Ok(Arc::new(Self {
            config,
            reader,
            connector,
            board,
            notices,
            cancel: CancellationToken::new(),
            latest: RwLock::new(None),
        }))
    }

    pub fn latest_snapshot(&self) -> Option<PresaleSnapshot> {
        self.latest.read().unwrap().clone()
    }

    pub fn set_latest(&self, snapshot: PresaleSnapshot) {
        *self.latest.write().unwrap() = Some(snapshot);
    }

    /// Latest polled snapshot, or the profile defaults before the first poll.
    pub fn snapshot_or_default(&self) -> PresaleSnapshot {
        self.latest_snapshot()
            .unwrap_or_else(|| self.config.network.default_snapshot(Utc::now()))
    }
}

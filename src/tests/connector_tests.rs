/// Tests for the wallet session lifecycle: connect, network switching, events,
/// persistence and disconnect.
use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use super::support::{addr, notice_messages, test_app, MockChain, MockWallet};
use crate::connector::{EventOutcome, SavedSession};
use crate::display::slot;
use crate::error::WalletError;
use crate::refresher;
use crate::types::{ConnectionKind, ConnectionState, WalletEvent};
use crate::wallet::WalletProvider;

fn injected() -> Arc<MockWallet> {
    Arc::new(MockWallet::new(ConnectionKind::Injected, addr(0x11)))
}

fn bridge() -> Arc<MockWallet> {
    Arc::new(MockWallet::new(ConnectionKind::Bridge, addr(0x22)))
}

// ── connect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn starts_disconnected() {
    let app = test_app(Arc::new(MockChain::standard()), vec![]);
    assert_eq!(app.connector.state(), ConnectionState::Disconnected);
    assert_eq!(app.board.text(slot::CONNECT_WALLET).as_deref(), Some("Connect Wallet"));
}

#[tokio::test]
async fn missing_provider_gives_instructions() {
    let app = test_app(Arc::new(MockChain::standard()), vec![]);
    let err = app.connector.connect(ConnectionKind::Injected).await.unwrap_err();
    assert_eq!(err, WalletError::ProviderMissing(ConnectionKind::Injected));
    assert!(!app.connector.is_connected());
    assert!(notice_messages(&app)
        .iter()
        .any(|m| m.starts_with("No Injected Wallet available")));
}

#[tokio::test]
async fn connect_switches_network_and_installs_session() {
    let wallet = injected();
    let app = test_app(Arc::new(MockChain::standard()), vec![wallet.clone()]);

    let session = app.connector.connect(ConnectionKind::Injected).await.unwrap();
    assert_eq!(session.address, addr(0x11));
    assert_eq!(session.chain_id, 97);
    assert_eq!(app.connector.state(), ConnectionState::Connected);
    assert_eq!(wallet.calls(), vec!["switch", "request_accounts"]);

    assert_eq!(app.board.text(slot::WALLET_STATUS).as_deref(), Some("Connected"));
    assert_eq!(app.board.text(slot::WALLET_TYPE).as_deref(), Some("Injected Wallet"));
    assert!(notice_messages(&app).contains(&"Connected to Binance Smart Chain Testnet!".to_string()));
}

#[tokio::test]
async fn unknown_chain_is_added_then_connected() {
    let wallet = injected();
    *wallet.switch_error.lock().unwrap() = Some(WalletError::UnrecognizedChain(97));
    let app = test_app(Arc::new(MockChain::standard()), vec![wallet.clone()]);

    app.connector.connect(ConnectionKind::Injected).await.unwrap();
    assert_eq!(wallet.calls(), vec!["switch", "add", "request_accounts"]);
    assert_eq!(*wallet.chain.lock().unwrap(), 97);
    assert!(app.connector.is_connected());
}

#[tokio::test]
async fn failed_add_aborts_with_manual_instruction() {
    let wallet = injected();
    *wallet.switch_error.lock().unwrap() = Some(WalletError::UnrecognizedChain(97));
    *wallet.add_error.lock().unwrap() = Some(WalletError::UserRejected);
    let app = test_app(Arc::new(MockChain::standard()), vec![wallet.clone()]);

    assert!(app.connector.connect(ConnectionKind::Injected).await.is_err());
    assert_eq!(app.connector.state(), ConnectionState::Disconnected);
    assert!(!wallet.calls().contains(&"request_accounts"));
    assert!(notice_messages(&app)
        .contains(&"Please add Binance Smart Chain Testnet to your wallet manually".to_string()));
}

#[tokio::test]
async fn rejected_switch_aborts() {
    let wallet = injected();
    *wallet.switch_error.lock().unwrap() = Some(WalletError::UserRejected);
    let app = test_app(Arc::new(MockChain::standard()), vec![wallet.clone()]);

    let err = app.connector.connect(ConnectionKind::Injected).await.unwrap_err();
    assert_eq!(err, WalletError::UserRejected);
    assert!(app.connector.session().is_none());
    assert_eq!(app.board.text(slot::WALLET_STATUS).as_deref(), Some("Not Connected"));
}

#[tokio::test]
async fn other_switch_errors_still_connect() {
    let wallet = injected();
    *wallet.switch_error.lock().unwrap() = Some(WalletError::Rpc { code: -32603, message: "busy".into() });
    let app = test_app(Arc::new(MockChain::standard()), vec![wallet.clone()]);

    let session = app.connector.connect(ConnectionKind::Injected).await.unwrap();
    // the wallet never left its original chain
    assert_eq!(session.chain_id, 1);
    assert!(app.connector.is_connected());
}

#[tokio::test]
async fn empty_account_list_fails_connect() {
    let wallet = injected();
    wallet.accounts.lock().unwrap().clear();
    let app = test_app(Arc::new(MockChain::standard()), vec![wallet]);

    let err = app.connector.connect(ConnectionKind::Injected).await.unwrap_err();
    assert_eq!(err, WalletError::NoAccounts);
    assert!(!app.connector.is_connected());
    assert!(notice_messages(&app).iter().any(|m| m.starts_with("Failed to connect")));
}

#[tokio::test]
async fn options_list_both_kinds() {
    let app = test_app(Arc::new(MockChain::standard()), vec![bridge()]);
    let options = app.connector.options();
    assert_eq!(options.title, "Connect to Binance Smart Chain Testnet");
    assert_eq!(options.network_info, "Connecting to Binance Smart Chain Testnet (Chain ID: 97)");
    assert_eq!(options.options.len(), 2);
    assert!(!options.options[0].available);
    assert!(options.options[1].available);
}

// ── disconnect / persistence ─────────────────────────────────────────────────

#[tokio::test]
async fn disconnect_clears_wallet_and_user_slots() {
    let chain = Arc::new(MockChain::standard());
    chain.set_balance(addr(0x11), dec!(2));
    chain.set_amount("userContributions(address)", dec!(1));
    let wallet = injected();
    let app = test_app(chain, vec![wallet.clone()]);

    app.connector.connect(ConnectionKind::Injected).await.unwrap();
    refresher::refresh_user(&app).await;
    assert_eq!(app.board.text(slot::WALLET_BALANCE).as_deref(), Some("2.0000 BNB"));
    assert!(app.board.get(slot::CLAIM_SECTION).unwrap().visible);

    app.connector.disconnect().await;
    assert_eq!(app.connector.state(), ConnectionState::Disconnected);
    assert!(app.connector.session().is_none());
    assert!(wallet.calls().contains(&"disconnect"));
    for key in [slot::WALLET_ADDRESS, slot::WALLET_BALANCE, slot::USER_CONTRIBUTION, slot::CLAIM_SECTION] {
        assert!(!app.board.get(key).unwrap().visible, "{key} should be hidden");
    }
    assert_eq!(app.board.text(slot::CONNECT_WALLET).as_deref(), Some("Connect Wallet"));
    assert!(notice_messages(&app).contains(&"Wallet disconnected".to_string()));
}

#[tokio::test]
async fn bridge_session_is_saved_and_resumed_without_prompt() {
    let chain = Arc::new(MockChain::standard());
    let wallet = bridge();
    let first = test_app(chain.clone(), vec![wallet.clone()]);
    first.connector.connect(ConnectionKind::Bridge).await.unwrap();

    let path = first.config.session_file.clone();
    let saved = SavedSession::load(&path).unwrap();
    assert_eq!(saved.address, addr(0x22));
    assert_eq!(saved.kind, ConnectionKind::Bridge);

    // a fresh process pointed at the same session file
    let mut config = super::support::test_config("bsc-testnet");
    config.session_file = path.clone();
    let resumed_wallet = bridge();
    let wallets: Vec<Arc<dyn WalletProvider>> = vec![resumed_wallet.clone()];
    let second = crate::state::AppState::new(config, chain, wallets).unwrap();
    let session = second.connector.try_reconnect().await.unwrap();
    assert_eq!(session.address, addr(0x22));
    assert!(resumed_wallet.calls().contains(&"accounts"));
    assert!(!resumed_wallet.calls().contains(&"request_accounts"));

    second.connector.disconnect().await;
    assert!(!path.exists());
}

#[tokio::test]
async fn injected_session_is_not_persisted() {
    let app = test_app(Arc::new(MockChain::standard()), vec![injected()]);
    app.connector.connect(ConnectionKind::Injected).await.unwrap();
    assert!(SavedSession::load(&app.config.session_file).is_none());
    assert!(app.connector.try_reconnect().await.is_none());
}

// ── provider events ──────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_accounts_event_disconnects() {
    let app = test_app(Arc::new(MockChain::standard()), vec![injected()]);
    app.connector.connect(ConnectionKind::Injected).await.unwrap();

    let outcome = app.connector.handle_event(WalletEvent::AccountsChanged(vec![])).await;
    assert_eq!(outcome, EventOutcome::Handled);
    assert!(!app.connector.is_connected());
}

#[tokio::test]
async fn account_switch_updates_session() {
    let app = test_app(Arc::new(MockChain::standard()), vec![injected()]);
    app.connector.connect(ConnectionKind::Injected).await.unwrap();
    let before = app.connector.generation();

    let outcome = app
        .connector
        .handle_event(WalletEvent::AccountsChanged(vec![addr(0x33)]))
        .await;
    assert_eq!(outcome, EventOutcome::RefreshUser);
    assert_eq!(app.connector.session().unwrap().address, addr(0x33));
    assert!(app.connector.generation() > before);
    assert!(notice_messages(&app).contains(&"Account changed".to_string()));
}

#[tokio::test]
async fn same_account_event_is_ignored() {
    let app = test_app(Arc::new(MockChain::standard()), vec![injected()]);
    app.connector.connect(ConnectionKind::Injected).await.unwrap();
    let outcome = app
        .connector
        .handle_event(WalletEvent::AccountsChanged(vec![addr(0x11)]))
        .await;
    assert_eq!(outcome, EventOutcome::Handled);
}

#[tokio::test]
async fn chain_change_is_detected_and_reloads() {
    let wallet = injected();
    let app = test_app(Arc::new(MockChain::standard()), vec![wallet.clone()]);
    app.connector.connect(ConnectionKind::Injected).await.unwrap();

    *wallet.chain.lock().unwrap() = 56;
    let events = app.connector.poll_events().await;
    assert_eq!(events, vec![WalletEvent::ChainChanged(56)]);

    refresher::handle_wallet_event(&app, WalletEvent::ChainChanged(56)).await;
    let session = app.connector.session().unwrap();
    assert_eq!(session.chain_id, 97);
    assert!(app.connector.is_connected());
    assert!(app.latest_snapshot().is_some());
}

#[tokio::test]
async fn stale_user_refresh_is_dropped_after_disconnect() {
    let chain = Arc::new(MockChain::standard());
    chain.set_balance(addr(0x11), dec!(2));
    *chain.balance_delay.lock().unwrap() = Some(Duration::from_millis(50));
    let app = test_app(chain, vec![injected()]);
    app.connector.connect(ConnectionKind::Injected).await.unwrap();

    let pending = {
        let app = app.clone();
        tokio::spawn(async move { refresher::refresh_user(&app).await })
    };
    tokio::task::yield_now().await;
    app.connector.disconnect().await;
    pending.await.unwrap();

    assert!(!app.board.get(slot::WALLET_BALANCE).unwrap().visible);
}

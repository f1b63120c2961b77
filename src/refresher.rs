use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connector::EventOutcome;
use crate::display;
use crate::state::AppState;
use crate::types::{PresaleSnapshot, UserStats, WalletEvent};

/// One full poll: snapshot slots, then user slots when a wallet is connected.
pub async fn refresh_snapshot(app: &AppState) -> PresaleSnapshot {
    let snapshot = app.reader.fetch_snapshot().await;
    let now = Utc::now();
    app.set_latest(snapshot.clone());
    app.board.apply(display::snapshot_slots(&snapshot, &app.config.network, now));
    app.board.apply(vec![display::last_updated(now)]);

    if app.connector.is_connected() {
        refresh_user(app).await;
    }
    snapshot
}

/// Contribution and balance for the connected address. Results that come back
/// after the session changed are discarded.
pub async fn refresh_user(app: &AppState) {
    let Some(session) = app.connector.session() else {
        return;
    };
    let generation = app.connector.generation();

    let (contribution, balance) = tokio::join!(
        app.reader.fetch_user_contribution(session.address),
        app.reader.fetch_balance(session.address),
    );

    if app.connector.generation() != generation {
        tracing::debug!("session changed during user refresh, dropping result");
        return;
    }

    let snapshot = app.snapshot_or_default();
    let price = app.config.network.estimate_price(&snapshot);
    let stats = UserStats { contribution, balance };
    app.board.apply(display::user_slots(&stats, &app.config.network, price));
}

/// Fire-and-forget refresh after `delay`, used once a write has confirmed.
pub fn schedule_refresh(app: Arc<AppState>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                refresh_snapshot(&app).await;
            }
            _ = app.cancel.cancelled() => {}
        }
    })
}

pub async fn handle_wallet_event(app: &AppState, event: WalletEvent) {
    match app.connector.handle_event(event).await {
        EventOutcome::Handled => {}
        EventOutcome::RefreshUser => refresh_user(app).await,
        EventOutcome::Reload => {
            app.connector.reload().await;
            refresh_snapshot(app).await;
        }
    }
}

async fn startup_delay(app: &AppState, cancel: &CancellationToken) -> bool {
    let delay = Duration::from_millis(app.config.startup_delay_ms);
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}

pub async fn run_snapshot_loop(app: Arc<AppState>, cancel: CancellationToken) {
    if !startup_delay(&app, &cancel).await {
        return;
    }
    let period = Duration::from_secs(app.config.network.snapshot_interval_secs);
    let mut interval = tokio::time::interval(period);
    tracing::info!(period_secs = period.as_secs(), "presale refresh loop started");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                refresh_snapshot(&app).await;
            }
            _ = cancel.cancelled() => {
                tracing::debug!("presale refresh loop stopped");
                break;
            }
        }
    }
}

pub async fn run_user_loop(app: Arc<AppState>, cancel: CancellationToken) {
    let period = Duration::from_secs(app.config.user_interval_secs);
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if app.connector.is_connected() {
                    refresh_user(&app).await;
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!("user refresh loop stopped");
                break;
            }
        }
    }
}

pub async fn run_wallet_watch(app: Arc<AppState>, cancel: CancellationToken) {
    let period = Duration::from_secs(app.config.wallet_watch_secs);
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                for event in app.connector.poll_events().await {
                    tracing::debug!(?event, "wallet event");
                    handle_wallet_event(&app, event).await;
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!("wallet watch stopped");
                break;
            }
        }
    }
}

pub fn spawn_all(app: &Arc<AppState>) -> Vec<JoinHandle<()>> {
    let cancel = app.cancel.clone();
    vec![
        tokio::spawn(run_snapshot_loop(app.clone(), cancel.clone())),
        tokio::spawn(run_user_loop(app.clone(), cancel.clone())),
        tokio::spawn(run_wallet_watch(app.clone(), cancel)),
    ]
}

mod actions;
mod board;
mod config;
mod connector;
mod display;
mod error;
mod presale;
mod refresher;
mod server;
mod state;
mod types;
mod wallet;
mod web;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Result;

use crate::presale::{ChainReader, RpcReader};
use crate::wallet::{BridgeWallet, KeyWallet, WalletProvider};

fn init_tracing(config: &config::Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.parse().unwrap_or_default());

    if config.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }
}

fn build_wallets(config: &config::Config) -> Vec<Arc<dyn WalletProvider>> {
    let mut wallets: Vec<Arc<dyn WalletProvider>> = Vec::new();
    if config.has_key_wallet() {
        match KeyWallet::new(config) {
            Ok(w) => wallets.push(Arc::new(w)),
            Err(e) => tracing::warn!(error = %e, "key wallet unavailable"),
        }
    }
    if config.has_bridge() {
        match BridgeWallet::new(config) {
            Ok(w) => wallets.push(Arc::new(w)),
            Err(e) => tracing::warn!(error = %e, "wallet bridge unavailable"),
        }
    }
    wallets
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;
    init_tracing(&config);

    let port = config.http_port;
    tracing::info!(
        network = %config.network.name,
        chain_id = config.network.chain_id,
        contract = %config.network.contract_address,
        static_dir = %config.static_dir.display(),
        port,
        "genetai-presale starting"
    );

    let chain: Arc<dyn ChainReader> = Arc::new(RpcReader::new(&config.network.rpc_url)?);
    let wallets = build_wallets(&config);
    if wallets.is_empty() {
        tracing::info!("no wallet configured, dashboard is read-only");
    }

    let app_state = state::AppState::new(config, chain, wallets)?;

    if let Some(session) = app_state.connector.try_reconnect().await {
        tracing::info!(kind = %session.kind, "restored previous wallet session");
    }

    let tasks = refresher::spawn_all(&app_state);
    let router = server::build_router(app_state.clone());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("HTTP server listening on 0.0.0.0:{port}");
    tracing::info!("dashboard: http://localhost:{port}/dashboard");
    tracing::info!("documentation: http://localhost:{port}/docs");

    let cancel = app_state.cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutdown requested");
            cancel.cancel();
        })
        .await?;

    for task in tasks {
        let _ = task.await;
    }
    tracing::info!("stopped");
    Ok(())
}

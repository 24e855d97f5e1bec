//! Process wiring for the two HTTP services.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use ethers::signers::{LocalWallet, Signer};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api;
use crate::application::{CropService, RecordService};
use crate::chain::{LedgerClient, RpcLedger, checksummed, parse_address};

pub async fn serve_records(database: &str, listen: SocketAddr) -> Result<()> {
    let service = RecordService::init(database)
        .await
        .with_context(|| format!("Failed to open database: {}", database))?;
    info!(database, "Record store ready");

    serve(api::records::router(service), listen, "records").await
}

pub async fn serve_ledger(
    listen: SocketAddr,
    rpc_url: &str,
    contract_address: &str,
    private_key: Option<&str>,
) -> Result<()> {
    let contract = parse_address(contract_address)
        .with_context(|| format!("Invalid contract address: {}", contract_address))?;
    let ledger = RpcLedger::connect(rpc_url, contract)?;

    let chain_id = ledger
        .chain_id()
        .await
        .with_context(|| format!("Failed to reach ledger node at {}", rpc_url))?;

    let signer = match private_key {
        Some(key) => {
            let wallet: LocalWallet = key
                .trim_start_matches("0x")
                .parse()
                .context("Invalid private key")?;
            Some(wallet.with_chain_id(chain_id))
        }
        None => {
            warn!("No private key configured, write endpoints are disabled");
            None
        }
    };

    let service = CropService::new(ledger, signer);
    info!(
        rpc_url,
        chain_id,
        contract = %checksummed(&service.ledger().contract_address()),
        account = ?service.default_address().map(|a| checksummed(&a)),
        "Ledger gateway ready"
    );

    serve(api::crops::router(Arc::new(service)), listen, "ledger").await
}

async fn serve(router: Router, listen: SocketAddr, name: &'static str) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!(service = name, address = %listen, "Listening");

    axum::serve(listener, router.layer(TraceLayer::new_for_http()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!(service = name, "Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}

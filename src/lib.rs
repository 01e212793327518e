//! KAS CRM backend: leads, quotations, projects, AMC contracts, staff
//! accounts and website submissions over a REST API, with quotation PDFs
//! and automatic project creation when a lead's order closes.

pub mod api;
pub mod config;
pub mod db;
mod migrations;
pub mod pdf;
pub mod permissions;
pub mod pricing;
pub mod services;
pub mod state;
pub mod types;
pub mod util;
pub mod workflow;

use std::sync::Arc;

use clap::Parser;
use thiserror::Error;

use config::Args;
use db::DbError;
use pdf::TemplateSet;
use services::ServiceError;
use state::AppState;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to open database: {0}")]
    Database(#[from] DbError),

    #[error("Failed to seed default users: {0}")]
    Seed(#[from] ServiceError),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the store, seed it, and build the shared state for `args`.
pub fn prepare(args: &Args) -> Result<Arc<AppState>, StartupError> {
    let db = args.open_db()?;
    if args.skip_seed {
        log::info!("Skipping default user seed");
    } else {
        services::seed::seed_default_users(&db)?;
    }
    let templates = TemplateSet::discover(args.templates_dir.as_deref());
    Ok(Arc::new(AppState::new(db, templates)))
}

/// Serve the API until Ctrl-C.
pub async fn serve(args: Args) -> Result<(), StartupError> {
    let addr = args.socket_addr()?;
    let state = prepare(&args)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Server running on {}", addr);
    log::info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

/// Binary entry point: logging, arguments, runtime.
pub fn run() -> Result<(), StartupError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(args))
}

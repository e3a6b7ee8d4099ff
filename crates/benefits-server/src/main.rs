mod config;
mod error;
mod http;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use benefits_core::catalog::Catalog;
use benefits_core::sheets::SheetClient;
use config::{Config, Transport};
use error::AppError;
use server::BenefitsServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries MCP JSON-RPC in stdio mode
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting benefits server");

    let config = Config::from_env()?;
    info!(
        transport = ?config.transport,
        sheet_url = %config.sheets.sheet_url,
        timeout_ms = config.sheets.timeout.as_millis(),
        max_retries = config.sheets.max_retries,
        "configuration loaded"
    );

    let sheets = SheetClient::new(config.sheets.clone()).map_err(AppError::from)?;
    let catalog = Arc::new(Catalog::new(sheets));

    match config.transport {
        Transport::Http => {
            http::serve(catalog, config.bind_addr).await?;
            info!("http server shut down");
        }
        Transport::Stdio => {
            info!("MCP server ready, serving on stdio");
            let service = BenefitsServer::new(catalog)
                .serve(stdio())
                .await
                .inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
            service.waiting().await?;
            info!("MCP server shut down");
        }
    }

    Ok(())
}

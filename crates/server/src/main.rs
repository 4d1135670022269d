use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use dataset::build_table;
use query_api::DashboardContext;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::build_router;
use app_state::AppState;
use config::{load_settings, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let app = build_app(&settings).await?;

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, url = %format!("http://{addr}/"), "dashboard listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Loads and joins the dataset, then wires it into the router.
async fn build_app(settings: &Settings) -> anyhow::Result<Router> {
    let loader = settings.loader_config()?;
    let table = build_table(&loader, settings.refresh)
        .await
        .map_err(|error| {
            error!(
                cache = %loader.cache_path.display(),
                mapping = %loader.mapping_path.display(),
                %error,
                "failed to load mobility data; check the CSV files are in the data directory or enable refresh"
            );
            error
        })?;

    let dashboard = DashboardContext::new(table, settings.country_name.clone());
    Ok(build_router(Arc::new(AppState { dashboard })))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

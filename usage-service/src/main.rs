use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use usage_service::{
    api::{self, AppState},
    catalog::Catalog,
    config::AppConfig,
    devices::DeviceService,
    estimation::EstimationClient,
    metrics_server, observability,
    resolve::Resolver,
    store::{PgDeviceStore, SessionIdentityResolver},
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    // Schema is expected to be applied out-of-band via `sql/schema/*.sql`.
    let catalog = Arc::new(Catalog::builtin());
    let estimator = Arc::new(EstimationClient::new(&cfg.estimation)?);
    let resolver = Arc::new(Resolver::new(catalog.clone(), estimator));

    let store = Arc::new(PgDeviceStore::new(pool.clone()));
    let devices = Arc::new(DeviceService::new(store, cfg.tariff.rate_lps_per_kwh));
    let identity = Arc::new(SessionIdentityResolver::new(pool));

    let state = AppState {
        devices,
        resolver,
        identity,
    };

    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr).await?;
    tracing::info!(addr = %cfg.http.bind_addr, catalog_entries = catalog.len(), "powerflow API listening");

    axum::serve(listener, api::router(state).into_make_service()).await?;

    Ok(())
}

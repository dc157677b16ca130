//! Service entry point: config, tracing, database pool, HTTP server.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use talabahub_payments::adapters::http::{payment_routes, PaymentAppState};
use talabahub_payments::adapters::order::StubOrderService;
use talabahub_payments::adapters::store::PostgresTransactionStore;
use talabahub_payments::application::{ClickGateway, PaymeGateway};
use talabahub_payments::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    // RUST_LOG wins over the configured filter when set.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    info!(
        environment = ?config.server.environment,
        "starting talabahub-payments"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let store = Arc::new(PostgresTransactionStore::new(pool));
    // TODO: replace with the orchestrator-backed OrderService once the
    // orders API is wired up.
    let orders = Arc::new(StubOrderService::new());

    let state = PaymentAppState {
        click: Arc::new(ClickGateway::new(orders.clone(), config.click.clone())),
        payme: Arc::new(PaymeGateway::new(store, orders, config.payme.clone())),
    };

    let app = payment_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.bind_addr();
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

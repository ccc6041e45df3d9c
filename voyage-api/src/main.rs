use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voyage_api::{app, AppState, Services};
use voyage_store::{
    AmadeusClient, Config, DbClient, OpenAiClient, StoreBookingRepository, StoreEmailRepository, StoreTripRepository,
    UnsplashClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voyage_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Voyage API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let model = OpenAiClient::from_config(&config.llm).context("Failed to build language model client")?;
    let flights = AmadeusClient::from_config(&config.amadeus).context("Failed to build flight search client")?;

    let state = AppState::new(Services {
        trips: Arc::new(StoreTripRepository::new(db.pool.clone())),
        bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
        emails: Arc::new(StoreEmailRepository::new(db.pool.clone())),
        model: Arc::new(model),
        flights: Arc::new(flights),
        photos: Arc::new(UnsplashClient::from_config(&config.unsplash)),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

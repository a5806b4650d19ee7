use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::matching::{
    embedder::HttpEmbedder, repository::PgCandidateRepository, MatchingService, VectorCodec,
};

mod app_state;
mod auth;
mod config;
mod domain;
mod router;
mod routes;

pub(crate) use app_state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_filename("./match-api/.env.local").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "match_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::read_config()?;
    config.matching.validate()?;

    let connection_pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_with(config.database.with_db())
        .await?;
    sqlx::migrate!("./migrations").run(&connection_pool).await?;

    let embedder = HttpEmbedder::new(
        &config.embeddings.url,
        config.embeddings.model.clone(),
        config.embeddings.dimensions,
        config.embeddings.timeout(),
    )?;
    let repository = PgCandidateRepository::new(
        connection_pool,
        VectorCodec::new(config.embeddings.dimensions),
    );
    let service = MatchingService::new(
        Arc::new(embedder),
        Arc::new(repository),
        config.matching.clone(),
    );

    let app_state = AppState::new(service, config.application.debug);
    let app = router::create(app_state, &config.application);

    let addr = format!("{}:{}", config.application.host, config.application.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        embeddings = %config.embeddings.url,
        dimensions = config.embeddings.dimensions,
        "listening on {}",
        addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}

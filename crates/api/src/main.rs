use ticketdesk_api::app::{AppServices, AppSettings, build_app};
use ticketdesk_infra::{AppConfig, ContinuationTokenStore, InMemoryTokenStore, PostgresTokenStore};

use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ticketdesk_observability::init();

    let env = std::env::var("TICKETDESK_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env)?;

    let jwt_secret = config.jwt_secret.clone().unwrap_or_else(|| {
        tracing::warn!("jwt_secret not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let tokens: Arc<dyn ContinuationTokenStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresTokenStore::connect_lazy(url)?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("database_url not set; continuation tokens are kept in memory");
            Arc::new(InMemoryTokenStore::new())
        }
    };

    let services = AppServices::new(tokens, config.reaper_config());
    let reaper = services.reaper.spawn();

    let app = build_app(
        AppSettings {
            jwt_secret,
            environment: config.environment,
        },
        services,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(environment = ?config.environment, "listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

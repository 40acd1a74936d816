use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, StoreBackend};
use db::{DocumentStore, MemoryStore, RedisStore};
use routes::*;

mod config;
mod data_types;
mod db;
mod error;
mod general_helpers;
mod routes;
mod services;
mod session;
mod traits;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kanban=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Box<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Redis => {
            let redis = RedisStore::open(&config.redis_url)?;
            redis.ping().await?;
            tracing::info!("connected to redis");
            Box::new(redis)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store, nothing survives a restart");
            Box::new(MemoryStore::new())
        }
    };

    let bind_addr = config.bind_addr;
    let router = make_routes(_AppState { store, config });

    tracing::info!("SERVER RUNNING AT {bind_addr}");
    axum::Server::bind(&bind_addr)
        .serve(router.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .await?;

    Ok(())
}

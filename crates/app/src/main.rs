use std::{sync::Arc, time::Duration};

use migration::{Migrator, MigratorTrait};
use server::{ServerState, SettingsEnricher, TokenIssuer};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no [server] section configured, nothing to run");
        return Ok(());
    };
    let Some(auth) = settings.auth else {
        return Err("[auth] secret is required to run the server".into());
    };

    let db = parse_database(&server.database).await?;

    let (bus, worker) = engine::log_pipeline(db.clone(), settings.worker.queue_capacity);
    tasks.spawn(async move {
        tracing::info!("Starting account log worker...");
        worker.run().await;
    });

    let engine = Arc::new(
        engine::Engine::builder()
            .database(db)
            .message_bus(bus)
            .build()
            .await?,
    );
    let tokens = TokenIssuer::new(&auth.secret, Duration::from_secs(auth.ttl_seconds))
        .with_enricher(SettingsEnricher::new(engine.clone()));

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tasks.spawn(async move {
        if let Err(err) = server::run_with_listener(ServerState::new(engine, tokens), listener).await
        {
            tracing::error!("server failed: {err}");
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

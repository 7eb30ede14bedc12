use engine::{Engine, TransactionService};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "commerce={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    tracing::info!("Found server settings...");
    let db = parse_database(&settings.server.database).await?;

    let mut builder = Engine::builder().database(db);
    if let Some(deadline) = settings.engine.deadline() {
        tracing::info!("Workflow deadline set to {deadline:?}");
        builder = builder.deadline(deadline);
    }
    let engine = builder.build().await?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(TransactionService::new(engine), listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

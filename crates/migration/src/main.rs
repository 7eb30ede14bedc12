use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./commerce.db?mode=rwc";

/// Connection string for the migration run.
///
/// `DATABASE_URL` wins; otherwise the sqlite path the server is configured
/// with (`COMMERCE__SERVER__DATABASE__SQLITE`) is used, so both binaries
/// migrate the same file.
fn database_url(database_url: Option<String>, server_sqlite: Option<String>) -> String {
    match (database_url, server_sqlite) {
        (Some(url), _) => url,
        (None, Some(path)) => format!("sqlite:{path}?mode=rwc"),
        (None, None) => DEFAULT_DATABASE_URL.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "up".to_string());

    let db_url = database_url(
        std::env::var("DATABASE_URL").ok(),
        std::env::var("COMMERCE__SERVER__DATABASE__SQLITE").ok(),
    );
    let db = Database::connect(&db_url).await?;

    match cmd.as_str() {
        "up" => migration::Migrator::up(&db, None).await?,
        "down" => migration::Migrator::down(&db, None).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => {
            migration::Migrator::status(&db).await?;
        }
        _ => {
            eprintln!("Usage: cargo run -p migration -- [up|down|fresh|status]");
            std::process::exit(2);
        }
    }

    Ok(())
}

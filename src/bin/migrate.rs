//! audit-migrate: apply versioned SQL migrations.

use clap::Parser;
use sqlx::Connection;
use sqlx::PgConnection;

use audit_svc::config::MigrateSettings;
use audit_svc::persistence::migrations;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = MigrateSettings::parse();
    settings.log.init();

    let available = migrations::load_migrations(&settings.migrations_dir).await?;
    tracing::info!(
        dir = %settings.migrations_dir.display(),
        found = available.len(),
        "loaded migrations"
    );

    let mut conn = PgConnection::connect(&settings.dsn).await?;
    let applied = migrations::run(&mut conn, &available).await?;
    conn.close().await?;

    tracing::info!(applied, "migrations complete");
    Ok(())
}

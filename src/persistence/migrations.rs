//! Versioned SQL migrations.
//!
//! Migration files are named `v<version>__<name>.sql` and applied in
//! ascending version order. All pending migrations and the version bump run
//! in one transaction, so a failure leaves the schema untouched.

use std::path::Path;

use sqlx::PgConnection;

use crate::error::AuditError;

/// One migration file, split into statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Ordinal from the file name prefix.
    pub version: i64,
    /// Descriptive part of the file name.
    pub name: String,
    /// Non-empty statements in file order.
    pub statements: Vec<String>,
}

/// Parses `v<digits>__<[A-Za-z0-9_]+>.sql` into `(version, name)`.
#[must_use]
pub fn parse_file_name(file_name: &str) -> Option<(i64, String)> {
    let stem = file_name.strip_prefix('v')?.strip_suffix(".sql")?;
    let (version, name) = stem.split_once("__")?;

    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }

    Some((version.parse().ok()?, name.to_string()))
}

/// Splits a script on `;`, dropping blank statements.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads every migration file in `dir`, sorted by version. Files that do
/// not match the naming pattern are skipped.
///
/// # Errors
///
/// Returns [`AuditError::Config`] if the directory or a file cannot be read.
pub async fn load_migrations(dir: &Path) -> Result<Vec<Migration>, AuditError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AuditError::Config(format!("{}: {e}", dir.display())))?;

    let mut migrations = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AuditError::Config(e.to_string()))?
    {
        let file_name = entry.file_name();
        let Some((version, name)) = file_name.to_str().and_then(parse_file_name) else {
            continue;
        };
        let sql = tokio::fs::read_to_string(entry.path())
            .await
            .map_err(|e| AuditError::Config(format!("{}: {e}", entry.path().display())))?;
        migrations.push(Migration {
            version,
            name,
            statements: split_statements(&sql),
        });
    }

    migrations.sort_by_key(|m| m.version);
    Ok(migrations)
}

/// Returns the migrations newer than `current`; all of them when the
/// database has never been migrated.
#[must_use]
pub fn pending(migrations: &[Migration], current: Option<i64>) -> &[Migration] {
    match current {
        None => migrations,
        Some(current) => {
            let start = migrations.partition_point(|m| m.version <= current);
            migrations.get(start..).unwrap_or_default()
        }
    }
}

/// Applies pending migrations on `conn` inside a single transaction.
///
/// Returns the number of migrations applied.
///
/// # Errors
///
/// Returns a database error if any statement fails; nothing is committed.
pub async fn run(conn: &mut PgConnection, migrations: &[Migration]) -> Result<usize, AuditError> {
    let mut tx = sqlx::Connection::begin(&mut *conn).await?;

    sqlx::query("CREATE TABLE IF NOT EXISTS migration_version (version int8)")
        .execute(&mut *tx)
        .await?;
    let current: Option<i64> = sqlx::query_scalar(
        "SELECT version FROM migration_version ORDER BY version DESC LIMIT 1",
    )
    .fetch_optional(&mut *tx)
    .await?;

    let to_apply = pending(migrations, current);
    tracing::info!(count = to_apply.len(), ?current, "applying migrations");

    for migration in to_apply {
        tracing::info!(version = migration.version, name = %migration.name, "applying migration");
        for statement in &migration.statements {
            tracing::debug!(%statement, "executing statement");
            sqlx::raw_sql(statement).execute(&mut *tx).await?;
        }
    }

    if let Some(last) = to_apply.last() {
        sqlx::query("INSERT INTO migration_version (version) VALUES ($1)")
            .bind(last.version)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(to_apply.len())
}

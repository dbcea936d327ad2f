//! Embedded schema migrations
//!
//! Applied in order and recorded in `_migrations_applied` so reopening a
//! database is a no-op.

use crate::error::{EvalError, Result};
use chrono::Utc;
use libsql::{params, Connection};
use tracing::{debug, info};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial_schema.sql",
        include_str!("../../migrations/libsql/001_initial_schema.sql"),
    ),
    (
        "002_add_indexes.sql",
        include_str!("../../migrations/libsql/002_add_indexes.sql"),
    ),
];

/// Split a migration file into statements on top-level `;`
///
/// Comment-only lines are dropped; `BEGIN ... END` blocks (triggers) are kept
/// whole.
pub(crate) fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut block_depth: u32 = 0;

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        let upper = trimmed.to_uppercase();
        if upper.ends_with("BEGIN") {
            block_depth += 1;
        }
        if upper.starts_with("END") {
            block_depth = block_depth.saturating_sub(1);
        }

        if block_depth == 0 && trimmed.ends_with(';') {
            statements.push(std::mem::take(&mut current));
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }
    statements
}

/// Apply every migration not yet recorded
pub(crate) async fn run(conn: &Connection) -> Result<()> {
    info!("Running database migrations...");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations_applied (
            migration_name TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        (),
    )
    .await
    .map_err(|e| EvalError::Migration(format!("Failed to create migrations table: {}", e)))?;

    for (name, sql) in MIGRATIONS {
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM _migrations_applied WHERE migration_name = ?",
                params![*name],
            )
            .await?;
        let applied = match rows.next().await? {
            Some(row) => row.get::<i64>(0)? > 0,
            None => false,
        };
        if applied {
            debug!("Skipping already applied migration: {}", name);
            continue;
        }

        let statements = split_statements(sql);
        debug!("Parsed {} statements from {}", statements.len(), name);

        let tx = conn.transaction().await?;
        for (i, statement) in statements.iter().enumerate() {
            tx.execute(statement, ()).await.map_err(|e| {
                EvalError::Migration(format!(
                    "statement #{} in {} failed: {}\nStatement: {}",
                    i + 1,
                    name,
                    e,
                    crate::utils::string::preview(statement, 200)
                ))
            })?;
        }
        tx.execute(
            "INSERT INTO _migrations_applied (migration_name, applied_at) VALUES (?, ?)",
            params![*name, Utc::now().timestamp()],
        )
        .await?;
        tx.commit().await?;

        info!("Executed migration: {}", name);
    }

    info!("Database migrations completed");
    Ok(())
}

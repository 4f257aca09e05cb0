use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::model::{EntityKind, OpAction, PendingOp};

/// SQLite-backed log of pending operations, so a queue survives process
/// restarts. Rollback snapshots are deliberately not journaled: UI state is
/// rebuilt from the server after a restart, so there is nothing to revert to.
#[derive(Clone)]
pub struct Journal {
    pool: SqlitePool,
}

impl Journal {
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);
        let pool = SqlitePool::connect_with(options)
            .await
            .context("failed to open journal database")?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn insert(&self, op: &PendingOp) -> Result<()> {
        sqlx::query(
            "INSERT INTO pending_ops (id, entity_kind, action, target_id, payload, attempt, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(op.id.to_string())
        .bind(op.kind.as_str())
        .bind(op.action.as_str())
        .bind(&op.target_id)
        .bind(op.payload.to_string())
        .bind(op.attempt as i64)
        .bind(op.created_at)
        .execute(&self.pool)
        .await
        .context("failed to journal pending operation")?;
        Ok(())
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM pending_ops WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn bump_attempt(&self, id: Uuid, attempt: u32) -> Result<()> {
        sqlx::query("UPDATE pending_ops SET attempt = ? WHERE id = ?")
            .bind(attempt as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM pending_ops")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All journaled operations in enqueue order.
    pub async fn load_pending(&self) -> Result<Vec<PendingOp>> {
        let rows = sqlx::query(
            "SELECT id, entity_kind, action, target_id, payload, attempt, created_at \
             FROM pending_ops ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let kind: String = row.get("entity_kind");
                let action: String = row.get("action");
                let payload: String = row.get("payload");
                Ok(PendingOp {
                    id: Uuid::parse_str(&id).context("invalid journaled op id")?,
                    kind: EntityKind::parse(&kind)
                        .ok_or_else(|| anyhow!("unknown entity kind '{}'", kind))?,
                    action: OpAction::parse(&action)
                        .ok_or_else(|| anyhow!("unknown action '{}'", action))?,
                    target_id: row.get("target_id"),
                    payload: serde_json::from_str(&payload)
                        .context("invalid journaled payload")?,
                    attempt: row.get::<i64, _>("attempt") as u32,
                    created_at: row.get::<DateTime<Utc>, _>("created_at"),
                })
            })
            .collect()
    }
}

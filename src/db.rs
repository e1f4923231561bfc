//! Durable storage for task records and team progress.
//!
//! Task models are stored as their flat codec record (JSON text), so rows
//! written by older versions migrate transparently when decoded. Progress is
//! one row per (team, task) with upsert semantics.

use chrono::DateTime;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::task::codec::{self, TaskRecord};
use crate::task::model::TaskModel;
use crate::task::progress::ProgressState;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::migrate(&pool).await?;

        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS task_records (
                task_id TEXT PRIMARY KEY,
                record_json TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS team_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                team_id TEXT NOT NULL,
                task_id TEXT NOT NULL,
                progress INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                UNIQUE(team_id, task_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    // ===== Task records =====

    /// Persist a task's model as its current-version flat record.
    pub async fn save_task(&self, task_id: &str, model: &TaskModel) -> Result<(), sqlx::Error> {
        let record = codec::encode(model);
        let json = serde_json::Value::Object(record).to_string();

        sqlx::query(
            r#"
            INSERT INTO task_records (task_id, record_json)
            VALUES (?, ?)
            ON CONFLICT(task_id) DO UPDATE SET
                record_json = excluded.record_json,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(task_id)
        .bind(json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load one task model, migrating older record formats on the way in.
    pub async fn load_task(&self, task_id: &str) -> Result<Option<TaskModel>, sqlx::Error> {
        let row = sqlx::query("SELECT record_json FROM task_records WHERE task_id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| decode_record_json(&row.get::<String, _>("record_json"))))
    }

    /// Load every stored task.
    pub async fn load_all_tasks(&self) -> Result<Vec<(String, TaskModel)>, sqlx::Error> {
        let rows = sqlx::query("SELECT task_id, record_json FROM task_records")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.get::<String, _>("task_id"),
                    decode_record_json(&row.get::<String, _>("record_json")),
                )
            })
            .collect())
    }

    /// Delete a task and every team's progress on it — progress is owned by
    /// the task and dies with it.
    pub async fn delete_task(&self, task_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_records WHERE task_id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM team_progress WHERE task_id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ===== Team progress =====

    pub async fn save_progress(
        &self,
        team_id: &str,
        task_id: &str,
        state: &ProgressState,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO team_progress (team_id, task_id, progress, completed, completed_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(team_id, task_id) DO UPDATE SET
                progress = excluded.progress,
                completed = excluded.completed,
                completed_at = excluded.completed_at
            "#,
        )
        .bind(team_id)
        .bind(task_id)
        .bind(state.current)
        .bind(state.completed)
        .bind(state.completed_at.map(|at| at.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn load_progress(
        &self,
        team_id: &str,
        task_id: &str,
    ) -> Result<Option<ProgressState>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT progress, completed, completed_at FROM team_progress
             WHERE team_id = ? AND task_id = ?",
        )
        .bind(team_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| progress_from_row(&row)))
    }

    /// All progress rows for one team.
    pub async fn load_team_progress(
        &self,
        team_id: &str,
    ) -> Result<Vec<(String, ProgressState)>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT task_id, progress, completed, completed_at FROM team_progress
             WHERE team_id = ?",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("task_id"), progress_from_row(&row)))
            .collect())
    }
}

/// Decode a stored record, falling back to per-field defaults when the row
/// is unparseable — a corrupt row must never take the host down.
fn decode_record_json(json: &str) -> TaskModel {
    let record: TaskRecord = serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|value| match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();
    codec::decode(&record)
}

fn progress_from_row(row: &sqlx::sqlite::SqliteRow) -> ProgressState {
    let completed_at = row
        .get::<Option<String>, _>("completed_at")
        .and_then(|at| DateTime::parse_from_rfc3339(&at).ok())
        .map(|at| at.to_utc());

    ProgressState {
        current: row.get::<i64, _>("progress"),
        completed: row.get::<bool, _>("completed"),
        completed_at,
    }
}

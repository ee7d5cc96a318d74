// ==========================================
// 服装流水线平衡系统 - 标准时间常量仓储
// ==========================================
// 职责: 管理 standard_time_entry 表 (按 label)
// 说明: unit 以 'sec' / 'min' 存储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::standard_time::StandardTimeEntry;
use crate::domain::types::TimeUnit;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct StandardTimeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StandardTimeRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS standard_time_entry (
              label TEXT PRIMARY KEY,
              value REAL NOT NULL,
              unit TEXT NOT NULL DEFAULT 'sec',
              updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    /// 创建或更新常量（Upsert 操作）
    pub fn upsert(&self, entry: &StandardTimeEntry) -> RepositoryResult<()> {
        if entry.label.trim().is_empty() {
            return Err(RepositoryError::field("label", "标准时间名称不能为空"));
        }
        if !entry.value.is_finite() || entry.value < 0.0 {
            return Err(RepositoryError::field("value", format!("标准时间数值非法: {}", entry.value)));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO standard_time_entry (label, value, unit, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(label) DO UPDATE SET
                value = excluded.value,
                unit = excluded.unit,
                updated_at = excluded.updated_at
            "#,
            params![entry.label, entry.value, entry.unit.as_str()],
        )?;
        Ok(())
    }

    /// 列出全部常量（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<StandardTimeEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT label, value, unit FROM standard_time_entry ORDER BY label ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let unit: String = row.get(2)?;
                Ok(StandardTimeEntry {
                    label: row.get(0)?,
                    value: row.get(1)?,
                    unit: TimeUnit::from_str(&unit),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    pub fn delete(&self, label: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM standard_time_entry WHERE label = ?1",
            params![label],
        )?;
        Ok(affected)
    }
}

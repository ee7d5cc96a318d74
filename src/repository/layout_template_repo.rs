// ==========================================
// 服装流水线平衡系统 - 布局模板仓储
// ==========================================
// 职责: 管理 layout_template 表 (按名称唯一)
// 存储: 工位与连线以 camelCase JSON 列存储，与布局协作方格式一致
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::layout::LayoutTemplate;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 模板摘要（列表用，不含工位明细）
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTemplateSummary {
    pub id: String,
    pub name: String,
    pub updated_at: NaiveDateTime,
}

pub struct LayoutTemplateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LayoutTemplateRepository {
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
            CREATE TABLE IF NOT EXISTS layout_template (
              template_id TEXT PRIMARY KEY,
              name TEXT NOT NULL UNIQUE,
              stations_json TEXT NOT NULL,
              links_json TEXT NOT NULL,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_layout_template_updated_at
              ON layout_template(updated_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 保存模板（同名覆盖，保留原ID与创建时间）
    pub fn save(&self, template: &LayoutTemplate) -> RepositoryResult<LayoutTemplate> {
        let name = template.name.trim();
        if name.is_empty() {
            return Err(RepositoryError::field("name", "模板名称不能为空"));
        }

        let stations_json = serde_json::to_string(&template.stations)?;
        let links_json = serde_json::to_string(&template.links)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO layout_template (
                template_id, name, stations_json, links_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(name) DO UPDATE SET
                stations_json = excluded.stations_json,
                links_json = excluded.links_json,
                updated_at = excluded.updated_at
            "#,
            params![
                template.id,
                name,
                stations_json,
                links_json,
                template.created_at,
                template.updated_at,
            ],
        )?;

        debug!(name = %name, stations = template.stations.len(), links = template.links.len(), "布局模板已保存");

        let saved = conn.query_row(
            r#"
            SELECT template_id, name, stations_json, links_json, created_at, updated_at
            FROM layout_template
            WHERE name = ?1
            "#,
            params![name],
            read_row,
        )?;
        decode(saved)
    }

    /// 按名称读取模板
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<LayoutTemplate>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT template_id, name, stations_json, links_json, created_at, updated_at
            FROM layout_template
            WHERE name = ?1
            "#,
            params![name.trim()],
            read_row,
        );

        match result {
            Ok(raw) => Ok(Some(decode(raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出模板摘要（最近更新在前）
    pub fn list(&self) -> RepositoryResult<Vec<LayoutTemplateSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT template_id, name, updated_at
            FROM layout_template
            ORDER BY updated_at DESC, name ASC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(LayoutTemplateSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// 按名称删除
    pub fn delete_by_name(&self, name: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM layout_template WHERE name = ?1",
            params![name.trim()],
        )?;
        Ok(affected)
    }
}

/// 行原始数据（JSON 列尚未解析）
struct RawTemplate {
    id: String,
    name: String,
    stations_json: String,
    links_json: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

fn read_row(row: &Row<'_>) -> SqliteResult<RawTemplate> {
    Ok(RawTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        stations_json: row.get(2)?,
        links_json: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn decode(raw: RawTemplate) -> RepositoryResult<LayoutTemplate> {
    Ok(LayoutTemplate {
        id: raw.id,
        name: raw.name,
        stations: serde_json::from_str(&raw.stations_json)?,
        links: serde_json::from_str(&raw.links_json)?,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

// ==========================================
// 服装流水线平衡系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "LINE_BALANCING_DB_PATH";

/// 默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录/garment-line-balancing/line_balancing.db > 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./line_balancing.db");
    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("garment-line-balancing");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            path = app_dir.join("line_balancing.db");
        }
    }
    path.to_string_lossy().to_string()
}

/// 初始化全部表（幂等）
///
/// 各仓储在构造时也会确保自身表存在；这里用于一次性建库
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
          scope_id TEXT NOT NULL,
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now')),
          PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS machine_catalog (
          machine_id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          class TEXT,
          speed REAL,
          speed_factor REAL,
          cofs REAL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS standard_time_entry (
          label TEXT PRIMARY KEY,
          value REAL NOT NULL,
          unit TEXT NOT NULL DEFAULT 'sec',
          updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

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
    )
}

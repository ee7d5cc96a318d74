// ==========================================
// 服装流水线平衡系统 - 机器目录仓储
// ==========================================
// 职责: 管理 machine_catalog 表 (按 machine_id)
// 说明: 目录为工时计算的机器参数来源；缺失参数在计算时取默认值
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::machine::Machine;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct MachineCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachineCatalogRepository {
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

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS machine_catalog (
              machine_id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              class TEXT,
              speed REAL,
              speed_factor REAL,
              cofs REAL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_machine_catalog_name
              ON machine_catalog(name);
            "#,
        )?;
        Ok(())
    }

    /// 创建或更新机器（Upsert 操作）
    pub fn upsert(&self, machine: &Machine) -> RepositoryResult<()> {
        validate_machine(machine)?;
        let conn = self.get_conn()?;
        upsert_row(&conn, machine)?;
        Ok(())
    }

    /// 批量写入（单事务）
    pub fn upsert_batch(&self, machines: &[Machine]) -> RepositoryResult<usize> {
        for machine in machines {
            validate_machine(machine)?;
        }
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut count = 0;
        for machine in machines {
            count += upsert_row(&tx, machine)?;
        }
        tx.commit()?;
        Ok(count)
    }

    /// 按机器ID查找
    pub fn find_by_id(&self, machine_id: &str) -> RepositoryResult<Option<Machine>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT machine_id, name, class, speed, speed_factor, cofs
            FROM machine_catalog
            WHERE machine_id = ?1
            "#,
            params![machine_id],
            map_row,
        );

        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出全部机器（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT machine_id, name, class, speed, speed_factor, cofs
            FROM machine_catalog
            ORDER BY name ASC, machine_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// 按机器ID删除
    pub fn delete(&self, machine_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM machine_catalog WHERE machine_id = ?1",
            params![machine_id],
        )?;
        Ok(affected)
    }
}

fn upsert_row(conn: &Connection, machine: &Machine) -> SqliteResult<usize> {
    conn.execute(
        r#"
        INSERT INTO machine_catalog (
            machine_id, name, class, speed, speed_factor, cofs, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
        ON CONFLICT(machine_id) DO UPDATE SET
            name = excluded.name,
            class = excluded.class,
            speed = excluded.speed,
            speed_factor = excluded.speed_factor,
            cofs = excluded.cofs,
            updated_at = excluded.updated_at
        "#,
        params![
            machine.id,
            machine.name,
            machine.class,
            machine.speed,
            machine.speed_factor,
            machine.cofs,
        ],
    )
}

fn map_row(row: &Row<'_>) -> SqliteResult<Machine> {
    Ok(Machine {
        id: row.get(0)?,
        name: row.get(1)?,
        class: row.get(2)?,
        speed: row.get(3)?,
        speed_factor: row.get(4)?,
        cofs: row.get(5)?,
    })
}

fn validate_machine(machine: &Machine) -> RepositoryResult<()> {
    if machine.id.trim().is_empty() {
        return Err(RepositoryError::field("machine_id", "机器ID不能为空"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_repo() -> MachineCatalogRepository {
        MachineCatalogRepository::new(":memory:").expect("Failed to create test repository")
    }

    #[test]
    fn test_upsert_and_find() {
        let repo = setup_test_repo();
        let machine = Machine::new("M1", "Piqueuse").with_speed(4000.0).with_cofs(1.12);

        repo.upsert(&machine).expect("Failed to upsert");
        let found = repo.find_by_id("M1").expect("Failed to find").expect("Machine not found");
        assert_eq!(found, machine);

        // 再次写入覆盖
        let updated = machine.clone().with_speed(3500.0);
        repo.upsert(&updated).expect("Failed to upsert");
        let found = repo.find_by_id("M1").unwrap().unwrap();
        assert_eq!(found.speed, Some(3500.0));
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_find_missing_returns_none() {
        let repo = setup_test_repo();
        assert!(repo.find_by_id("NOPE").unwrap().is_none());
    }

    #[test]
    fn test_upsert_batch_and_delete() {
        let repo = setup_test_repo();
        let machines = vec![
            Machine::new("M2", "Surjeteuse"),
            Machine::new("M1", "Boutonniere").with_class("COUNTER"),
        ];

        assert_eq!(repo.upsert_batch(&machines).unwrap(), 2);
        let names: Vec<String> = repo.list_all().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Boutonniere".to_string(), "Surjeteuse".to_string()]);

        assert_eq!(repo.delete("M2").unwrap(), 1);
        assert_eq!(repo.delete("M2").unwrap(), 0);
    }

    #[test]
    fn test_blank_id_rejected() {
        let repo = setup_test_repo();
        let err = repo.upsert(&Machine::new("  ", "Piqueuse")).unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));
    }
}

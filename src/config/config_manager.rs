// ==========================================
// 服装流水线平衡系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 规则: 缺失或无法解析的值回落到内置默认值（记录 warn）
// ==========================================

use crate::config::engine_params::{BalancingConfig, TimeDefaults};
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::fabric::{FabricPenaltyValues, FabricSettings};
use crate::domain::line::LineSettings;
use crate::domain::types::FabricLevel;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// 导向系数可选值（默认）
pub const DEFAULT_GUIDE_FACTOR_OPTIONS: [f64; 5] = [1.0, 1.1, 1.2, 1.3, 1.5];

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
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
            CREATE TABLE IF NOT EXISTS config_kv (
              scope_id TEXT NOT NULL,
              key TEXT NOT NULL,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 原始读写
    // ==========================================

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        debug!(config_key = key, value = value, "配置已写入");
        Ok(())
    }

    /// 读取并解析数值配置，缺失或格式错误时取默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Display + Copy,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 读取有限浮点配置（非有限值视为格式错误）
    fn get_f64_or_default(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        let value = self.get_parsed_or_default(key, default)?;
        if value.is_finite() {
            Ok(value)
        } else {
            warn!(config_key = key, default = default, "配置值非有限，使用默认值");
            Ok(default)
        }
    }

    // ==========================================
    // 标准工时默认值
    // ==========================================

    pub fn load_time_defaults(&self) -> RepositoryResult<TimeDefaults> {
        let d = TimeDefaults::default();
        Ok(TimeDefaults {
            machine_speed_rpm: self.get_f64_or_default(config_keys::MACHINE_SPEED_RPM, d.machine_speed_rpm)?,
            machine_speed_factor: self
                .get_f64_or_default(config_keys::MACHINE_SPEED_FACTOR, d.machine_speed_factor)?,
            machine_cofs: self.get_f64_or_default(config_keys::MACHINE_COFS, d.machine_cofs)?,
            continuous_guide_factor: self
                .get_f64_or_default(config_keys::CONTINUOUS_GUIDE_FACTOR, d.continuous_guide_factor)?,
            end_precision_min: self.get_f64_or_default(config_keys::END_PRECISION_MIN, d.end_precision_min)?,
            start_stop_min: self.get_f64_or_default(config_keys::START_STOP_MIN, d.start_stop_min)?,
            default_stitch_density: self
                .get_f64_or_default(config_keys::DEFAULT_STITCH_DENSITY, d.default_stitch_density)?,
            counter_guide_factor: self
                .get_f64_or_default(config_keys::COUNTER_GUIDE_FACTOR, d.counter_guide_factor)?,
            button_unit_time_min: self
                .get_f64_or_default(config_keys::BUTTON_UNIT_TIME_MIN, d.button_unit_time_min)?,
            counter_unit_time_min: self
                .get_f64_or_default(config_keys::COUNTER_UNIT_TIME_MIN, d.counter_unit_time_min)?,
            counter_manual_time_min: self
                .get_f64_or_default(config_keys::COUNTER_MANUAL_TIME_MIN, d.counter_manual_time_min)?,
            continuous_manual_floor_min: self
                .get_f64_or_default(config_keys::CONTINUOUS_MANUAL_FLOOR_MIN, d.continuous_manual_floor_min)?,
            manual_time_per_length_min: self
                .get_f64_or_default(config_keys::MANUAL_TIME_PER_LENGTH_MIN, d.manual_time_per_length_min)?,
            handling_allowance_min: self
                .get_f64_or_default(config_keys::HANDLING_ALLOWANCE_MIN, d.handling_allowance_min)?,
        })
    }

    // ==========================================
    // 平衡参数
    // ==========================================

    pub fn load_balancing_config(&self) -> RepositoryResult<BalancingConfig> {
        let d = BalancingConfig::default();
        Ok(BalancingConfig {
            station_tolerance: self.get_f64_or_default(config_keys::STATION_TOLERANCE, d.station_tolerance)?,
            operator_rounding_threshold: self
                .get_f64_or_default(config_keys::OPERATOR_ROUNDING_THRESHOLD, d.operator_rounding_threshold)?,
            end_of_line_allowance: self
                .get_f64_or_default(config_keys::END_OF_LINE_ALLOWANCE, d.end_of_line_allowance)?,
        })
    }

    pub fn save_balancing_config(&self, config: &BalancingConfig) -> RepositoryResult<()> {
        self.set_global_config_value(config_keys::STATION_TOLERANCE, &config.station_tolerance.to_string())?;
        self.set_global_config_value(
            config_keys::OPERATOR_ROUNDING_THRESHOLD,
            &config.operator_rounding_threshold.to_string(),
        )?;
        self.set_global_config_value(config_keys::END_OF_LINE_ALLOWANCE, &config.end_of_line_allowance.to_string())
    }

    // ==========================================
    // 产线参数
    // ==========================================

    pub fn load_line_settings(&self) -> RepositoryResult<LineSettings> {
        let d = LineSettings::default();
        Ok(LineSettings {
            cycle_time_min: self.get_f64_or_default(config_keys::CYCLE_TIME_MIN, d.cycle_time_min)?,
            headcount: self.get_parsed_or_default(config_keys::HEADCOUNT, d.headcount)?,
            presence_time_min: self.get_f64_or_default(config_keys::PRESENCE_TIME_MIN, d.presence_time_min)?,
            efficiency_pct: self.get_f64_or_default(config_keys::EFFICIENCY_PCT, d.efficiency_pct)?,
        })
    }

    pub fn save_line_settings(&self, settings: &LineSettings) -> RepositoryResult<()> {
        self.set_global_config_value(config_keys::CYCLE_TIME_MIN, &settings.cycle_time_min.to_string())?;
        self.set_global_config_value(config_keys::HEADCOUNT, &settings.headcount.to_string())?;
        self.set_global_config_value(config_keys::PRESENCE_TIME_MIN, &settings.presence_time_min.to_string())?;
        self.set_global_config_value(config_keys::EFFICIENCY_PCT, &settings.efficiency_pct.to_string())
    }

    // ==========================================
    // 面料难度
    // ==========================================

    pub fn load_fabric_settings(&self) -> RepositoryResult<FabricSettings> {
        let d = FabricPenaltyValues::default();
        let level = match self.get_global_config_value(config_keys::FABRIC_LEVEL)? {
            Some(raw) => FabricLevel::from_str(&raw),
            None => FabricLevel::default(),
        };
        Ok(FabricSettings {
            enabled: self.get_parsed_or_default(config_keys::FABRIC_ENABLED, false)?,
            selected_level: level,
            values: FabricPenaltyValues {
                easy: self.get_f64_or_default(config_keys::FABRIC_EASY_SEC, d.easy)?,
                medium: self.get_f64_or_default(config_keys::FABRIC_MEDIUM_SEC, d.medium)?,
                hard: self.get_f64_or_default(config_keys::FABRIC_HARD_SEC, d.hard)?,
            },
        })
    }

    pub fn save_fabric_settings(&self, fabric: &FabricSettings) -> RepositoryResult<()> {
        self.set_global_config_value(config_keys::FABRIC_ENABLED, &fabric.enabled.to_string())?;
        self.set_global_config_value(config_keys::FABRIC_LEVEL, fabric.selected_level.as_str())?;
        self.set_global_config_value(config_keys::FABRIC_EASY_SEC, &fabric.values.easy.to_string())?;
        self.set_global_config_value(config_keys::FABRIC_MEDIUM_SEC, &fabric.values.medium.to_string())?;
        self.set_global_config_value(config_keys::FABRIC_HARD_SEC, &fabric.values.hard.to_string())
    }

    // ==========================================
    // 导向系数选项
    // ==========================================

    /// 导向系数可选值
    ///
    /// 配置格式为逗号分隔: "1.0,1.1,1.2"
    /// 配置不存在或无有效值时返回默认列表
    pub fn get_guide_factor_options(&self) -> RepositoryResult<Vec<f64>> {
        let Some(raw) = self.get_global_config_value(config_keys::GUIDE_FACTOR_OPTIONS)? else {
            return Ok(DEFAULT_GUIDE_FACTOR_OPTIONS.to_vec());
        };

        let options: Vec<f64> = raw
            .split(',')
            .filter_map(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect();

        if options.is_empty() {
            warn!(
                config_key = config_keys::GUIDE_FACTOR_OPTIONS,
                raw_value = %raw,
                "导向系数选项格式错误，使用默认值"
            );
            Ok(DEFAULT_GUIDE_FACTOR_OPTIONS.to_vec())
        } else {
            Ok(options)
        }
    }

    // ==========================================
    // 快照
    // ==========================================

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 导出/备份产线配置
    /// - 与布局模板一起迁移到其他工作站
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖现有的 global 配置
    /// - `__meta_` 开头的键不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 机器目录缺省
    pub const MACHINE_SPEED_RPM: &str = "time.machine_speed_rpm";
    pub const MACHINE_SPEED_FACTOR: &str = "time.machine_speed_factor";
    pub const MACHINE_COFS: &str = "time.machine_cofs";

    // 连续缝
    pub const CONTINUOUS_GUIDE_FACTOR: &str = "time.continuous_guide_factor";
    pub const END_PRECISION_MIN: &str = "time.end_precision_min";
    pub const START_STOP_MIN: &str = "time.start_stop_min";
    pub const DEFAULT_STITCH_DENSITY: &str = "time.default_stitch_density";

    // 计件
    pub const COUNTER_GUIDE_FACTOR: &str = "time.counter_guide_factor";
    pub const BUTTON_UNIT_TIME_MIN: &str = "time.button_unit_time_min";
    pub const COUNTER_UNIT_TIME_MIN: &str = "time.counter_unit_time_min";

    // 手工时间
    pub const COUNTER_MANUAL_TIME_MIN: &str = "time.counter_manual_time_min";
    pub const CONTINUOUS_MANUAL_FLOOR_MIN: &str = "time.continuous_manual_floor_min";
    pub const MANUAL_TIME_PER_LENGTH_MIN: &str = "time.manual_time_per_length_min";
    pub const HANDLING_ALLOWANCE_MIN: &str = "time.handling_allowance_min";

    // 平衡
    pub const STATION_TOLERANCE: &str = "balancing.station_tolerance";
    pub const OPERATOR_ROUNDING_THRESHOLD: &str = "balancing.operator_rounding_threshold";
    pub const END_OF_LINE_ALLOWANCE: &str = "balancing.end_of_line_allowance";

    // 产线
    pub const CYCLE_TIME_MIN: &str = "line.cycle_time_min";
    pub const HEADCOUNT: &str = "line.headcount";
    pub const PRESENCE_TIME_MIN: &str = "line.presence_time_min";
    pub const EFFICIENCY_PCT: &str = "line.efficiency_pct";

    // 面料难度
    pub const FABRIC_ENABLED: &str = "fabric.enabled";
    pub const FABRIC_LEVEL: &str = "fabric.level";
    pub const FABRIC_EASY_SEC: &str = "fabric.easy_sec";
    pub const FABRIC_MEDIUM_SEC: &str = "fabric.medium_sec";
    pub const FABRIC_HARD_SEC: &str = "fabric.hard_sec";

    // 导向系数选项 (逗号分隔)
    pub const GUIDE_FACTOR_OPTIONS: &str = "guide_factor_options";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> ConfigManager {
        ConfigManager::new(":memory:").expect("Failed to create config manager")
    }

    #[test]
    fn test_defaults_when_empty() {
        let manager = setup_manager();

        assert_eq!(manager.load_time_defaults().unwrap(), TimeDefaults::default());
        assert_eq!(manager.load_balancing_config().unwrap(), BalancingConfig::default());
        assert_eq!(manager.load_line_settings().unwrap(), LineSettings::default());
        assert_eq!(manager.load_fabric_settings().unwrap(), FabricSettings::default());
        assert_eq!(
            manager.get_guide_factor_options().unwrap(),
            DEFAULT_GUIDE_FACTOR_OPTIONS.to_vec()
        );
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let manager = setup_manager();
        manager.set_global_config_value(config_keys::MACHINE_SPEED_RPM, "3000").unwrap();
        manager.set_global_config_value(config_keys::MACHINE_COFS, "abc").unwrap();
        manager.set_global_config_value(config_keys::STATION_TOLERANCE, "NaN").unwrap();

        let defaults = manager.load_time_defaults().unwrap();
        assert_eq!(defaults.machine_speed_rpm, 3000.0);
        assert_eq!(defaults.machine_cofs, 1.12);
        assert_eq!(manager.load_balancing_config().unwrap().station_tolerance, 1.15);
    }

    #[test]
    fn test_line_and_fabric_round_trip() {
        let manager = setup_manager();
        let settings = LineSettings {
            cycle_time_min: 0.75,
            headcount: 24,
            presence_time_min: 450.0,
            efficiency_pct: 85.0,
        };
        let fabric = FabricSettings {
            enabled: true,
            selected_level: FabricLevel::Hard,
            values: FabricPenaltyValues {
                easy: 0.0,
                medium: 3.0,
                hard: 6.0,
            },
        };

        manager.save_line_settings(&settings).unwrap();
        manager.save_fabric_settings(&fabric).unwrap();

        assert_eq!(manager.load_line_settings().unwrap(), settings);
        assert_eq!(manager.load_fabric_settings().unwrap(), fabric);
    }

    #[test]
    fn test_guide_factor_options_parsing() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::GUIDE_FACTOR_OPTIONS, "1.0, 1.25,x,-2")
            .unwrap();
        assert_eq!(manager.get_guide_factor_options().unwrap(), vec![1.0, 1.25]);

        manager.set_global_config_value(config_keys::GUIDE_FACTOR_OPTIONS, "").unwrap();
        assert_eq!(
            manager.get_guide_factor_options().unwrap(),
            DEFAULT_GUIDE_FACTOR_OPTIONS.to_vec()
        );
    }

    #[test]
    fn test_snapshot_and_restore() {
        let source = setup_manager();
        source.set_global_config_value(config_keys::CYCLE_TIME_MIN, "0.9").unwrap();
        source.set_global_config_value(config_keys::HEADCOUNT, "18").unwrap();
        let snapshot = source.get_config_snapshot().unwrap();

        let target = setup_manager();
        let restored = target.restore_config_from_snapshot(&snapshot).unwrap();
        assert_eq!(restored, 2);

        let settings = target.load_line_settings().unwrap();
        assert_eq!(settings.cycle_time_min, 0.9);
        assert_eq!(settings.headcount, 18);
    }
}

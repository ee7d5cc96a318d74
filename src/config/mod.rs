// ==========================================
// 服装流水线平衡系统 - 配置层
// ==========================================
// 职责: 引擎参数定义 + 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_params;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager, DEFAULT_GUIDE_FACTOR_OPTIONS};
pub use engine_params::{BalancingConfig, TimeDefaults};

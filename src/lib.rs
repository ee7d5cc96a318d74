// ==========================================
// 服装流水线平衡系统 - 核心库
// ==========================================
// 职责: 标准工时计算 + 工序平衡 + 饱和度/人数 + 工位拆分
// 技术栈: Rust + SQLite
// 系统定位: 工艺员决策支持（手工模式下人工最终控制）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 计算与重算流水线
pub mod engine;

// 配置层 - 引擎参数与 config_kv
pub mod config;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 工序表 / 机器目录
pub mod importer;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 对外门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BalancingMode, CounterFamily, FabricLevel, MachineKind, TimeUnit};

// 领域实体
pub use domain::{
    Assignment, FabricSettings, LayoutTemplate, LineSettings, Machine, ManualLink, Operation,
    StandardTimeEntry, Workstation,
};

// 引擎
pub use engine::{
    LineEvent, LineInputs, LineMetrics, LinePipeline, LineSnapshot, SaturationAnalyzer,
    SequenceBalancer, StationSplitter, TimeStandardCalculator,
};

// 配置
pub use config::{BalancingConfig, ConfigManager, TimeDefaults};

// API
pub use api::{ApiError, ApiResult, LineApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "服装流水线平衡系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

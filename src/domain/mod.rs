// ==========================================
// 服装流水线平衡系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod fabric;
pub mod layout;
pub mod line;
pub mod machine;
pub mod operation;
pub mod standard_time;
pub mod types;
pub mod workstation;

// 重导出核心类型
pub use assignment::Assignment;
pub use fabric::{FabricPenaltyValues, FabricSettings};
pub use layout::{LayoutTemplate, ManualLink};
pub use line::LineSettings;
pub use machine::{Machine, MANUAL_MACHINE_NAME};
pub use operation::{reindex_operations, Operation};
pub use standard_time::StandardTimeEntry;
pub use types::{BalancingMode, CounterFamily, FabricLevel, MachineKind, TimeUnit};
pub use workstation::{Position, Workstation};

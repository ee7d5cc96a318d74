// ==========================================
// 服装流水线平衡系统 - 仓储层
// ==========================================
// 职责: SQLite 持久化（机器目录 / 标准时间常量 / 布局模板）
// 红线: Repository 不含业务逻辑，只做读写与字段校验
// ==========================================

pub mod error;
pub mod layout_template_repo;
pub mod machine_catalog_repo;
pub mod standard_time_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use layout_template_repo::{LayoutTemplateRepository, LayoutTemplateSummary};
pub use machine_catalog_repo::MachineCatalogRepository;
pub use standard_time_repo::StandardTimeRepository;

// ==========================================
// 服装流水线平衡系统 - API 层
// ==========================================
// 职责: 对外门面，错误统一转换为 ApiError
// ==========================================

pub mod error;
pub mod line_api;

pub use error::{ApiError, ApiResult};
pub use line_api::{ImportMachinesResponse, ImportOperationsResponse, LineApi};

// ==========================================
// 服装流水线平衡系统 - API层错误类型
// ==========================================
// 职责: 汇总引擎/仓储/导入错误，转换为面向工艺员的可读消息
// ==========================================

use crate::engine::error::PipelineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 调用方错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("需要手工模式: {0}")]
    ManualModeRequired(String),

    #[error("名称冲突: {0}")]
    Conflict(String),

    // ===== 文件导入 =====
    #[error("文件导入失败: {0}")]
    ImportFailed(String),

    // ===== 数据访问 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ===== 通用 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => {
                ApiError::InternalError(format!("布局数据损坏: {}", msg))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件{}不存在", path)),
            ImportError::UnsupportedFormat(_) => ApiError::InvalidInput(err.to_string()),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportFailed(other.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::ManualModeRequired { .. } => ApiError::ManualModeRequired(err.to_string()),
            PipelineError::InvalidInput { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::BalancingMode;

    #[test]
    fn test_pipeline_error_conversion() {
        let err: ApiError = PipelineError::ManualModeRequired {
            event: "UNIT_PLACED".to_string(),
            mode: BalancingMode::Automatic,
        }
        .into();
        assert!(matches!(err, ApiError::ManualModeRequired(msg) if msg.contains("UNIT_PLACED")));
    }

    #[test]
    fn test_repository_error_conversion() {
        let err: ApiError = RepositoryError::field("name", "模板名称不能为空").into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = RepositoryError::UniqueConstraintViolation("layout_template.name".to_string()).into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_import_error_conversion() {
        let err: ApiError = ImportError::FileNotFound("gamme.csv".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = ImportError::UnsupportedFormat("txt".to_string()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = ImportError::NoOperations.into();
        assert!(matches!(err, ApiError::ImportFailed(_)));
    }
}

// ==========================================
// 服装流水线平衡系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 约束冲突按 SQLite 错误码识别（布局模板名称唯一）
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("记录未找到: {entity}(id={id})")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库操作失败: {0}")]
    DatabaseQueryError(String),

    #[error("约束冲突: {0}")]
    UniqueConstraintViolation(String),

    // ===== 字段校验 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error("JSON 列编解码失败: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 字段校验错误的便捷构造
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        RepositoryError::FieldValueError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                RepositoryError::UniqueConstraintViolation(msg.unwrap_or_else(|| e.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "record".to_string(),
                id: "-".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

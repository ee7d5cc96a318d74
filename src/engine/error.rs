// ==========================================
// 服装流水线平衡系统 - 引擎层错误类型
// ==========================================
// 说明: 数值核心为全定义函数；仅流水线事件在模式不符或标量非法时被拒绝
// ==========================================

use crate::domain::types::BalancingMode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("当前模式不允许该操作: event={event}, mode={mode}（需要手工模式）")]
    ManualModeRequired { event: String, mode: BalancingMode },

    #[error("无效输入 (field={field}): {message}")]
    InvalidInput { field: String, message: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

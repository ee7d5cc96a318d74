// ==========================================
// 服装流水线平衡系统 - 工位 (Poste) 领域模型
// ==========================================
// 生命周期: 自动模式由工序平衡器创建；手工模式可由用户插入/删除
// 说明: 位置/形状仅供布局协作方使用，核心计算忽略
// ==========================================

use serde::{Deserialize, Serialize};

/// 拆分子工位ID中的分隔标记
pub const SPLIT_ID_MARKER: &str = "__split__";

/// 平面坐标（布局用）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// ==========================================
// Workstation - 工位
// ==========================================
// 序列化格式: camelCase（与布局模板格式一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workstation {
    pub id: String,                     // 工位ID (P1, P2, ...)
    pub name: String,                   // 显示名称
    pub index: u32,                     // 序号
    #[serde(default)]
    pub machine_label: String,          // 机器标签
    #[serde(default)]
    pub operator_name: Option<String>,  // 操作工
    #[serde(default)]
    pub time_override: Option<f64>,     // 负荷覆写 (min)，存在时替代计算负荷
    #[serde(default)]
    pub original_id: Option<String>,    // 拆分子工位的父工位ID
    #[serde(default)]
    pub placed: bool,                   // 是否已在布局中落位
    #[serde(default)]
    pub position: Option<Position>,     // 布局位置
    #[serde(default)]
    pub shape: Option<String>,          // 布局形状
}

impl Workstation {
    /// 以序号创建工位（ID = P{index}）
    pub fn numbered(index: u32, machine_label: impl Into<String>) -> Self {
        Self {
            id: format!("P{}", index),
            name: index.to_string(),
            index,
            machine_label: machine_label.into(),
            operator_name: None,
            time_override: None,
            original_id: None,
            placed: false,
            position: None,
            shape: None,
        }
    }

    /// 是否为拆分子工位
    pub fn is_split_child(&self) -> bool {
        self.original_id.is_some()
    }

    /// 有效的负荷覆写（非有限值或负值视为未设置）
    pub fn effective_time_override(&self) -> Option<f64> {
        self.time_override.filter(|t| t.is_finite() && *t >= 0.0)
    }
}

/// 拆分子工位ID: {parent_id}__split__{i}
pub fn split_unit_id(parent_id: &str, i: u32) -> String {
    format!("{}{}{}", parent_id, SPLIT_ID_MARKER, i)
}

/// 拆分子工位名称: {parent_name}.{i}
pub fn split_unit_name(parent_name: &str, i: u32) -> String {
    format!("{}.{}", parent_name, i)
}

/// 从子工位名称还原父工位名称（去掉末尾的 .{i}）
pub fn parent_name_of(unit_name: &str) -> String {
    match unit_name.rsplit_once('.') {
        Some((parent, suffix)) if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) => {
            parent.to_string()
        }
        _ => unit_name.to_string(),
    }
}

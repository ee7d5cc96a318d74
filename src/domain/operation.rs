// ==========================================
// 服装流水线平衡系统 - 工序领域模型
// ==========================================
// 红线: order 是唯一全序，结构变更后必须连续且唯一
// 红线: computed_time 仅由标准工时计算器写入
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Operation - 工序
// ==========================================
// 数值参数均为可选：缺失/为零/非法时由计算器按机器或领域默认值补齐
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    // ===== 标识与顺序 =====
    pub id: String,          // 稳定ID
    pub order: u32,          // 工序顺序 (1..n)
    #[serde(default)]
    pub description: String, // 工序描述

    // ===== 机器引用 =====
    #[serde(default)]
    pub machine_id: Option<String>,   // 机器ID（优先匹配）
    #[serde(default)]
    pub machine_name: Option<String>, // 机器显示名称

    // ===== 工艺参数 =====
    #[serde(default)]
    pub length: f64,                              // 缝长 (cm) 或件数
    #[serde(default)]
    pub stitch_length_mm: Option<f64>,            // 针距 (mm)，密度 = 10 / 针距
    #[serde(default)]
    pub rpm: Option<f64>,                         // 转速
    #[serde(default)]
    pub speed_factor: Option<f64>,                // 速度系数
    #[serde(default)]
    pub guide_factor: Option<f64>,                // 导向/复杂度系数
    #[serde(default)]
    pub end_precision_constant: Option<f64>,      // 收尾精度常数 (min)
    #[serde(default)]
    pub start_stop_constant: Option<f64>,         // 起停常数 (min)
    #[serde(default)]
    pub majoration: Option<f64>,                  // 宽放系数

    // ===== 人工覆写 =====
    #[serde(default)]
    pub manual_time_override: Option<f64>, // 手工时间覆写 (min)，非零时生效
    #[serde(default)]
    pub forced_time: Option<f64>,          // 强制工时 (min)，存在时即为标准工时

    // ===== 分组 =====
    #[serde(default)]
    pub group_id: Option<String>, // 需要一起移动/分配的工序组

    // ===== 派生 =====
    #[serde(default)]
    pub computed_time: f64, // 标准工时 (min)
}

impl Operation {
    /// 创建新的工序（其余参数全部取默认）
    pub fn new(id: impl Into<String>, order: u32, machine_name: impl Into<String>, length: f64) -> Self {
        Self {
            id: id.into(),
            order,
            description: String::new(),
            machine_id: None,
            machine_name: Some(machine_name.into()),
            length,
            stitch_length_mm: None,
            rpm: None,
            speed_factor: None,
            guide_factor: None,
            end_precision_constant: None,
            start_stop_constant: None,
            majoration: None,
            manual_time_override: None,
            forced_time: None,
            group_id: None,
            computed_time: 0.0,
        }
    }

    /// 机器标签（名称优先，其次ID，均缺失时为空）
    pub fn machine_label(&self) -> &str {
        self.machine_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.machine_id.as_deref())
            .unwrap_or("")
    }
}

/// 按 order 稳定排序后重新编号为 1..n
///
/// 所有结构性变更（插入/删除/移动）之后都必须调用
pub fn reindex_operations(operations: &mut [Operation]) {
    operations.sort_by_key(|op| op.order);
    for (idx, op) in operations.iter_mut().enumerate() {
        op.order = idx as u32 + 1;
    }
}

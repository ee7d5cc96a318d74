// ==========================================
// 服装流水线平衡系统 - 产线全局参数
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// LineSettings - 产线全局标量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSettings {
    pub cycle_time_min: f64,    // 目标节拍 bf (min)，<= 0 时关闭人数/饱和度计算
    pub headcount: u32,         // 操作工人数
    pub presence_time_min: f64, // 每日出勤时间 (min)
    pub efficiency_pct: f64,    // 申报效率 (%)
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            cycle_time_min: 1.0,
            headcount: 10,
            presence_time_min: 480.0,
            efficiency_pct: 100.0,
        }
    }
}

// ==========================================
// 服装流水线平衡系统 - 引擎参数
// ==========================================
// 职责: 标准工时默认值表 + 平衡/人数取整阈值
// 说明: 两个 1.15 阈值分开配置，不要求始终相等
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// TimeDefaults - 标准工时默认值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeDefaults {
    // ===== 机器目录缺省 =====
    pub machine_speed_rpm: f64,        // 额定转速: 2500
    pub machine_speed_factor: f64,     // 速度系数: 1.01
    pub machine_cofs: f64,             // 宽放系数: 1.12

    // ===== 连续缝 =====
    pub continuous_guide_factor: f64,  // 导向系数: 1.1
    pub end_precision_min: f64,        // 收尾精度: 0.01 min
    pub start_stop_min: f64,           // 起停: 0.01 min
    pub default_stitch_density: f64,   // 针距缺失时的线迹密度 (针/cm): 4

    // ===== 计件 =====
    pub counter_guide_factor: f64,     // 导向系数: 1.0
    pub button_unit_time_min: f64,     // 钉扣/打枣族单件时间: 4/60 min
    pub counter_unit_time_min: f64,    // 其他计件单件时间: 0.15 min

    // ===== 手工时间 =====
    pub counter_manual_time_min: f64,  // 计件工序手工时间: 0.18 min
    pub continuous_manual_floor_min: f64, // 连续缝手工时间下限: 0.15 min
    pub manual_time_per_length_min: f64,  // 连续缝每单位长度手工时间: 0.005 min
    pub handling_allowance_min: f64,      // 无机器时间时的最低搬运宽放: 0.18 min
}

impl Default for TimeDefaults {
    fn default() -> Self {
        Self {
            machine_speed_rpm: 2500.0,
            machine_speed_factor: 1.01,
            machine_cofs: 1.12,
            continuous_guide_factor: 1.1,
            end_precision_min: 0.01,
            start_stop_min: 0.01,
            default_stitch_density: 4.0,
            counter_guide_factor: 1.0,
            button_unit_time_min: 4.0 / 60.0,
            counter_unit_time_min: 0.15,
            counter_manual_time_min: 0.18,
            continuous_manual_floor_min: 0.15,
            manual_time_per_length_min: 0.005,
            handling_allowance_min: 0.18,
        }
    }
}

// ==========================================
// BalancingConfig - 平衡与人数配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancingConfig {
    pub station_tolerance: f64,           // 工位累计时间上限 = bf × 1.15
    pub operator_rounding_threshold: f64, // 理论人数 > 1.15 才向上取整
    pub end_of_line_allowance: f64,       // 成衣总工时宽放: 1.20
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            station_tolerance: 1.15,
            operator_rounding_threshold: 1.15,
            end_of_line_allowance: 1.20,
        }
    }
}

impl BalancingConfig {
    /// 工位累计时间上限（bf <= 0 时不设上限）
    pub fn station_ceiling(&self, cycle_time_min: f64) -> f64 {
        if cycle_time_min > 0.0 && cycle_time_min.is_finite() {
            cycle_time_min * self.station_tolerance
        } else {
            f64::INFINITY
        }
    }
}

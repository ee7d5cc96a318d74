// ==========================================
// 服装流水线平衡系统 - 面料难度设置
// ==========================================
// 启用时对每道机器工序追加按难度等级的固定罚时（秒）
// ==========================================

use crate::domain::types::FabricLevel;
use serde::{Deserialize, Serialize};

/// 各难度等级的罚时（秒）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FabricPenaltyValues {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl Default for FabricPenaltyValues {
    fn default() -> Self {
        Self {
            easy: 0.0,
            medium: 2.0,
            hard: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FabricSettings {
    pub enabled: bool,
    pub selected_level: FabricLevel,
    #[serde(default)]
    pub values: FabricPenaltyValues,
}

impl FabricSettings {
    /// 当前设置下的罚时（分钟），未启用时为 0
    pub fn penalty_minutes(&self) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        let seconds = match self.selected_level {
            FabricLevel::Easy => self.values.easy,
            FabricLevel::Medium => self.values.medium,
            FabricLevel::Hard => self.values.hard,
        };
        if seconds.is_finite() {
            seconds / 60.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_disabled_is_zero() {
        let settings = FabricSettings {
            enabled: false,
            selected_level: FabricLevel::Hard,
            values: FabricPenaltyValues::default(),
        };
        assert_eq!(settings.penalty_minutes(), 0.0);
    }

    #[test]
    fn test_penalty_converts_seconds() {
        let settings = FabricSettings {
            enabled: true,
            selected_level: FabricLevel::Medium,
            values: FabricPenaltyValues {
                easy: 0.0,
                medium: 6.0,
                hard: 12.0,
            },
        };
        assert!((settings.penalty_minutes() - 0.1).abs() < 1e-12);
    }
}

// ==========================================
// 服装流水线平衡系统 - 标准时间常量表
// ==========================================
// 用途: 计件类工序（锁眼/钉扣/打枣/鸡眼/装配）按件计时
// ==========================================

use crate::domain::types::TimeUnit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardTimeEntry {
    pub label: String, // 名称（与机器名按关键字匹配）
    pub value: f64,    // 数值
    #[serde(default)]
    pub unit: TimeUnit, // 单位 sec | min
}

impl StandardTimeEntry {
    pub fn new(label: impl Into<String>, value: f64, unit: TimeUnit) -> Self {
        Self {
            label: label.into(),
            value,
            unit,
        }
    }

    /// 归一化为分钟
    pub fn minutes(&self) -> f64 {
        match self.unit {
            TimeUnit::Sec => self.value / 60.0,
            TimeUnit::Min => self.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_normalization() {
        assert!((StandardTimeEntry::new("Bouton", 4.0, TimeUnit::Sec).minutes() - 4.0 / 60.0).abs() < 1e-12);
        assert_eq!(StandardTimeEntry::new("Bride", 0.2, TimeUnit::Min).minutes(), 0.2);
    }
}

// ==========================================
// 服装流水线平衡系统 - 领域类型定义
// ==========================================
// 职责: 机器分类、面料难度、时间单位、平衡模式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计件机器族 (Counter Family)
// ==========================================
// 按件计时的设备（钉扣/打枣/锁眼/鸡眼/装配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterFamily {
    Button,  // 钉扣 / 扣眼 (button, bouton, boutonnière)
    Bartack, // 打枣 (bartack, tack, bride)
    Hole,    // 开孔
    Eyelet,  // 鸡眼 (eyelet, oeillet)
    Pose,    // 装配 (pose)
}

impl CounterFamily {
    /// 是否属于钉扣/打枣族（默认单件时间 4 秒）
    pub fn is_button_or_bartack(&self) -> bool {
        matches!(self, CounterFamily::Button | CounterFamily::Bartack)
    }
}

impl fmt::Display for CounterFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterFamily::Button => write!(f, "BUTTON"),
            CounterFamily::Bartack => write!(f, "BARTACK"),
            CounterFamily::Hole => write!(f, "HOLE"),
            CounterFamily::Eyelet => write!(f, "EYELET"),
            CounterFamily::Pose => write!(f, "POSE"),
        }
    }
}

// ==========================================
// 机器分类 (Machine Kind)
// ==========================================
// 红线: 手工分类优先于计件关键字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineKind {
    Manual,                 // 手工（无机器时间）
    Counter(CounterFamily), // 计件（按数量计时）
    ContinuousSeam,         // 连续缝（按线迹长度计时）
}

impl MachineKind {
    pub fn is_manual(&self) -> bool {
        matches!(self, MachineKind::Manual)
    }

    pub fn is_counter(&self) -> bool {
        matches!(self, MachineKind::Counter(_))
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineKind::Manual => write!(f, "MANUAL"),
            MachineKind::Counter(family) => write!(f, "COUNTER_{}", family),
            MachineKind::ContinuousSeam => write!(f, "CONTINUOUS_SEAM"),
        }
    }
}

// ==========================================
// 面料难度 (Fabric Level)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FabricLevel {
    #[default]
    Easy,   // 容易
    Medium, // 中等
    Hard,   // 困难
}

impl FabricLevel {
    /// 从字符串解析（未知值回落到 Easy）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "medium" | "moyen" => FabricLevel::Medium,
            "hard" | "difficile" => FabricLevel::Hard,
            _ => FabricLevel::Easy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FabricLevel::Easy => "easy",
            FabricLevel::Medium => "medium",
            FabricLevel::Hard => "hard",
        }
    }
}

impl fmt::Display for FabricLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 时间单位 (Time Unit)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Sec,
    Min,
}

impl TimeUnit {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "min" | "minute" | "minutes" => TimeUnit::Min,
            _ => TimeUnit::Sec,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Sec => "sec",
            TimeUnit::Min => "min",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 平衡模式 (Balancing Mode)
// ==========================================
// Automatic: 每次输入变更都重新执行工序平衡
// Manual: 分配归用户所有，只重算工时与饱和度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalancingMode {
    #[default]
    Automatic,
    Manual,
}

impl fmt::Display for BalancingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalancingMode::Automatic => write!(f, "AUTOMATIC"),
            BalancingMode::Manual => write!(f, "MANUAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fabric_level_parse() {
        assert_eq!(FabricLevel::from_str("HARD"), FabricLevel::Hard);
        assert_eq!(FabricLevel::from_str(" moyen "), FabricLevel::Medium);
        assert_eq!(FabricLevel::from_str("???"), FabricLevel::Easy);
    }

    #[test]
    fn test_machine_kind_display() {
        assert_eq!(
            MachineKind::Counter(CounterFamily::Bartack).to_string(),
            "COUNTER_BARTACK"
        );
        assert_eq!(MachineKind::Manual.to_string(), "MANUAL");
    }
}

// ==========================================
// 服装流水线平衡系统 - 机器目录领域模型
// ==========================================
// 用途: 工序按 ID → 名称/类别 → 合成手工机器 的顺序解析
// 红线: 参考数据只读，引擎不校验目录内容
// ==========================================

use serde::{Deserialize, Serialize};

/// 合成手工机器的名称
pub const MANUAL_MACHINE_NAME: &str = "MAN";

// ==========================================
// Machine - 机器目录条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,                 // 机器ID
    pub name: String,               // 显示名称
    #[serde(default)]
    pub class: Option<String>,      // 机器类别
    #[serde(default)]
    pub speed: Option<f64>,         // 额定转速 (rpm)
    #[serde(default)]
    pub speed_factor: Option<f64>,  // 速度系数
    #[serde(default)]
    pub cofs: Option<f64>,          // 宽放系数
}

impl Machine {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class: None,
            speed: None,
            speed_factor: None,
            cofs: None,
        }
    }

    /// 合成手工机器（无法解析机器引用时使用）
    pub fn synthetic_manual() -> Self {
        Self {
            id: MANUAL_MACHINE_NAME.to_string(),
            name: MANUAL_MACHINE_NAME.to_string(),
            class: None,
            speed: Some(0.0),
            speed_factor: None,
            cofs: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_speed_factor(mut self, speed_factor: f64) -> Self {
        self.speed_factor = Some(speed_factor);
        self
    }

    pub fn with_cofs(mut self, cofs: f64) -> Self {
        self.cofs = Some(cofs);
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

// ==========================================
// 服装流水线平衡系统 - 布局模板
// ==========================================
// 用途: 由布局协作方读写的持久化格式（工位列表 + 人工连线）
// 序列化格式: camelCase
// ==========================================

use crate::domain::workstation::Workstation;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 人工连线（有向）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualLink {
    pub id: String,
    pub from_station_id: String,
    pub to_station_id: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl ManualLink {
    /// 连线是否引用了指定工位
    pub fn touches(&self, station_id: &str) -> bool {
        self.from_station_id == station_id || self.to_station_id == station_id
    }
}

/// 命名布局模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTemplate {
    pub id: String,
    pub name: String,
    pub stations: Vec<Workstation>,
    #[serde(default)]
    pub links: Vec<ManualLink>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LayoutTemplate {
    /// 创建新的模板（自动生成 UUID 和时间戳）
    pub fn new(name: impl Into<String>, stations: Vec<Workstation>, links: Vec<ManualLink>) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            stations,
            links,
            created_at: now,
            updated_at: now,
        }
    }
}

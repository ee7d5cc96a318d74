// ==========================================
// 服装流水线平衡系统 - 工序分配
// ==========================================
// 映射: 工序ID → 共享该工序的工位ID列表（有序、去重）
// 自动模式为 1:1；手工模式允许 1:多，工时按共享数均摊
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment {
    entries: BTreeMap<String, Vec<String>>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖工序的工位列表（去重；空列表视为取消分配）
    pub fn assign(&mut self, operation_id: &str, station_ids: Vec<String>) {
        let mut deduped: Vec<String> = Vec::with_capacity(station_ids.len());
        for id in station_ids {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        if deduped.is_empty() {
            self.entries.remove(operation_id);
        } else {
            self.entries.insert(operation_id.to_string(), deduped);
        }
    }

    /// 追加一个工位（已存在则忽略）
    pub fn add(&mut self, operation_id: &str, station_id: &str) {
        let stations = self.entries.entry(operation_id.to_string()).or_default();
        if !stations.iter().any(|s| s == station_id) {
            stations.push(station_id.to_string());
        }
    }

    pub fn unassign(&mut self, operation_id: &str) {
        self.entries.remove(operation_id);
    }

    pub fn stations_of(&self, operation_id: &str) -> &[String] {
        self.entries
            .get(operation_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_assigned(&self, operation_id: &str) -> bool {
        !self.stations_of(operation_id).is_empty()
    }

    /// 分配到指定工位的工序ID（按工序ID字典序）
    pub fn operations_of(&self, station_id: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, stations)| stations.iter().any(|s| s == station_id))
            .map(|(op_id, _)| op_id.as_str())
            .collect()
    }

    /// 从所有分配中移除工位，返回因此变为未分配的工序ID
    pub fn remove_station(&mut self, station_id: &str) -> Vec<String> {
        let mut orphaned = Vec::new();
        for (op_id, stations) in self.entries.iter_mut() {
            stations.retain(|s| s != station_id);
            if stations.is_empty() {
                orphaned.push(op_id.clone());
            }
        }
        for op_id in &orphaned {
            self.entries.remove(op_id);
        }
        orphaned
    }

    /// 仅保留满足条件的工序
    pub fn retain_operations<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.entries.retain(|op_id, _| keep(op_id));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_dedup_and_empty() {
        let mut a = Assignment::new();
        a.assign("op1", vec!["P1".into(), "P2".into(), "P1".into()]);
        assert_eq!(a.stations_of("op1"), &["P1".to_string(), "P2".to_string()]);
        a.assign("op1", vec![]);
        assert!(!a.is_assigned("op1"));
    }

    #[test]
    fn test_remove_station_orphans() {
        let mut a = Assignment::new();
        a.add("op1", "P1");
        a.add("op2", "P1");
        a.add("op2", "P2");
        let orphaned = a.remove_station("P1");
        assert_eq!(orphaned, vec!["op1".to_string()]);
        assert_eq!(a.stations_of("op2"), &["P2".to_string()]);
    }

    #[test]
    fn test_operations_of() {
        let mut a = Assignment::new();
        a.add("op2", "P1");
        a.add("op1", "P1");
        a.add("op3", "P2");
        assert_eq!(a.operations_of("P1"), vec!["op1", "op2"]);
    }
}

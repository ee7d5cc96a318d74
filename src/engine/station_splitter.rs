// ==========================================
// 服装流水线平衡系统 - 工位拆分引擎
// ==========================================
// 职责: 进入手工布局时，将多人工位拆分为可独立摆放的单人子工位；
//       返回自动模式时，将子工位合并回父工位
// ==========================================
// 规则:
// - 所需人数 > 1 且非子工位: 拆分为 N 个子工位
//   ID = {父ID}__split__{i}，名称 = {父名称}.{i}，负荷 = 父负荷 / N
// - 其余工位原样通过，但统一标记为未落位
// - 合并: 按 original_id 分组，恢复父工位与合计负荷，并删除引用子工位的连线
// 红线: 引用不存在的工位/统计时忽略，不报错
// ==========================================

use crate::domain::layout::ManualLink;
use crate::domain::workstation::{parent_name_of, split_unit_id, split_unit_name, Workstation};
use crate::engine::saturation::SaturationReport;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

// ==========================================
// PlaceableUnit - 可摆放单元
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceableUnit {
    pub station: Workstation,
    pub load_min: f64,         // 单元负荷 (min)
    pub saturation_pct: f64,   // 单元饱和度（单人口径）
    pub parent_operators: u32, // 父工位所需人数
}

impl PlaceableUnit {
    pub fn id(&self) -> &str {
        &self.station.id
    }

    pub fn is_split(&self) -> bool {
        self.station.is_split_child()
    }
}

// ==========================================
// CollapseResult - 合并结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollapseResult {
    pub stations: Vec<Workstation>,
    pub loads: Vec<f64>,               // 与 stations 对齐
    pub removed_unit_ids: Vec<String>, // 被移除的子工位ID
}

impl CollapseResult {
    pub fn load_of(&self, station_id: &str) -> Option<f64> {
        self.stations
            .iter()
            .position(|s| s.id == station_id)
            .map(|idx| self.loads[idx])
    }
}

// ==========================================
// StationSplitter - 工位拆分引擎
// ==========================================
pub struct StationSplitter {
    // 无状态引擎
}

impl StationSplitter {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 拆分
    #[instrument(skip_all, fields(stations = stations.len()))]
    pub fn expand(&self, stations: &[Workstation], report: &SaturationReport) -> Vec<PlaceableUnit> {
        let mut units = Vec::with_capacity(stations.len());

        for station in stations {
            let stats = report.get(&station.id);
            let load = stats.map(|s| s.load_min).unwrap_or(0.0);
            let required = stats.map(|s| s.required_operators).unwrap_or(0);
            let saturation = stats.map(|s| s.operator_saturation_pct).unwrap_or(0.0);

            // 已是子工位：原样通过
            if station.is_split_child() {
                units.push(PlaceableUnit {
                    station: station.clone(),
                    load_min: load,
                    saturation_pct: saturation,
                    parent_operators: 1,
                });
                continue;
            }

            if required <= 1 {
                let mut unplaced = station.clone();
                unplaced.placed = false;
                units.push(PlaceableUnit {
                    station: unplaced,
                    load_min: load,
                    saturation_pct: saturation,
                    parent_operators: required,
                });
                continue;
            }

            let share = load / required as f64;
            let override_share = station.effective_time_override().map(|t| t / required as f64);
            for i in 1..=required {
                units.push(PlaceableUnit {
                    station: Workstation {
                        id: split_unit_id(&station.id, i),
                        name: split_unit_name(&station.name, i),
                        index: station.index,
                        machine_label: station.machine_label.clone(),
                        operator_name: None,
                        time_override: override_share,
                        original_id: Some(station.id.clone()),
                        placed: false,
                        position: None,
                        shape: station.shape.clone(),
                    },
                    load_min: share,
                    saturation_pct: saturation,
                    parent_operators: required,
                });
            }

            debug!(station_id = %station.id, units = required, share_min = share, "工位已拆分");
        }

        units
    }

    /// 合并
    #[instrument(skip_all, fields(units = units.len()))]
    pub fn collapse(&self, units: &[PlaceableUnit]) -> CollapseResult {
        let mut result = CollapseResult::default();
        let mut parent_index: HashMap<String, usize> = HashMap::new();
        let mut override_sums: HashMap<String, Option<f64>> = HashMap::new();

        for unit in units {
            let parent_id = match unit.station.original_id.as_deref() {
                Some(id) => id,
                None => {
                    result.stations.push(unit.station.clone());
                    result.loads.push(unit.load_min);
                    continue;
                }
            };

            result.removed_unit_ids.push(unit.station.id.clone());
            let child_override = unit.station.effective_time_override();

            match parent_index.get(parent_id).copied() {
                Some(idx) => {
                    result.loads[idx] += unit.load_min;
                    if let Some(sum) = override_sums.get_mut(parent_id) {
                        *sum = match (*sum, child_override) {
                            (Some(a), Some(b)) => Some(a + b),
                            _ => None,
                        };
                    }
                }
                None => {
                    parent_index.insert(parent_id.to_string(), result.stations.len());
                    override_sums.insert(parent_id.to_string(), child_override);
                    result.stations.push(Workstation {
                        id: parent_id.to_string(),
                        name: parent_name_of(&unit.station.name),
                        index: unit.station.index,
                        machine_label: unit.station.machine_label.clone(),
                        operator_name: None,
                        time_override: None,
                        original_id: None,
                        placed: false,
                        position: None,
                        shape: unit.station.shape.clone(),
                    });
                    result.loads.push(unit.load_min);
                }
            }
        }

        for (parent_id, idx) in &parent_index {
            if let Some(sum) = override_sums.get(parent_id) {
                result.stations[*idx].time_override = *sum;
            }
        }

        debug!(
            stations = result.stations.len(),
            removed_units = result.removed_unit_ids.len(),
            "子工位已合并"
        );
        result
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 删除引用了已移除工位的连线
    pub fn prune_links(&self, links: &[ManualLink], removed_ids: &[String]) -> Vec<ManualLink> {
        let removed: HashSet<&str> = removed_ids.iter().map(String::as_str).collect();
        links
            .iter()
            .filter(|link| {
                !removed.contains(link.from_station_id.as_str()) && !removed.contains(link.to_station_id.as_str())
            })
            .cloned()
            .collect()
    }

    /// 将上一轮单元的落位信息按ID带入新单元
    pub fn carry_over_placement(&self, units: &mut [PlaceableUnit], previous: &[PlaceableUnit]) {
        let by_id: HashMap<&str, &Workstation> =
            previous.iter().map(|u| (u.station.id.as_str(), &u.station)).collect();
        for unit in units.iter_mut() {
            if let Some(prev) = by_id.get(unit.station.id.as_str()) {
                unit.station.placed = prev.placed;
                unit.station.position = prev.position;
                unit.station.shape = prev.shape.clone();
                if unit.station.operator_name.is_none() {
                    unit.station.operator_name = prev.operator_name.clone();
                }
            }
        }
    }
}

impl Default for StationSplitter {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 服装流水线平衡系统 - 饱和度与人数分析引擎
// ==========================================
// 职责: 工位负荷 → 理论人数 / 所需人数 / 饱和度 / 总人数
// 输入: 工位列表 + 分配映射（含手工编辑的 1:多）+ 工序 + bf
// ==========================================
// 规则:
// - 负荷 = 覆写值，或 Σ(工序工时 / 共享工位数)
// - 理论人数 = bf > 0 ? 负荷 / bf : 0
// - 所需人数 = 理论 > 1.15 ? ceil(理论) : (理论 > 0 ? 1 : 0)
// 红线: 引用不存在的工序/工位时直接忽略，不报错
// ==========================================

use crate::config::engine_params::BalancingConfig;
use crate::domain::assignment::Assignment;
use crate::domain::operation::Operation;
use crate::domain::workstation::Workstation;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// 浮点取整容差
const EPSILON: f64 = 1e-9;

/// 饱和度口径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaturationGranularity {
    Station,     // 工位整体: 负荷 / bf
    PerOperator, // 工位内每人: 负荷 / (所需人数 × bf)
}

// ==========================================
// StationStats - 单工位统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStats {
    pub station_id: String,
    pub station_name: String,
    pub machine_label: String,
    pub operation_ids: Vec<String>,    // 按工序顺序
    pub load_min: f64,                 // 负荷 (min)
    pub load_sec: f64,                 // 负荷 (s)
    pub overridden: bool,              // 负荷是否来自覆写
    pub theoretical_operators: f64,    // 理论人数
    pub required_operators: u32,       // 所需人数
    pub station_saturation_pct: f64,   // 工位饱和度 (%)
    pub operator_saturation_pct: f64,  // 人均饱和度 (%)
}

impl StationStats {
    pub fn saturation_pct(&self, granularity: SaturationGranularity) -> f64 {
        match granularity {
            SaturationGranularity::Station => self.station_saturation_pct,
            SaturationGranularity::PerOperator => self.operator_saturation_pct,
        }
    }
}

// ==========================================
// SaturationReport - 分析结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaturationReport {
    pub stations: Vec<StationStats>,
    pub total_required_workforce: u32,
    pub total_load_min: f64,
}

impl SaturationReport {
    pub fn get(&self, station_id: &str) -> Option<&StationStats> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }
}

// ==========================================
// SaturationAnalyzer - 饱和度分析引擎
// ==========================================
pub struct SaturationAnalyzer {
    config: BalancingConfig,
}

impl SaturationAnalyzer {
    pub fn new(config: BalancingConfig) -> Self {
        Self { config }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    #[instrument(skip_all, fields(stations = stations.len(), operations = operations.len(), cycle_time_min = cycle_time_min))]
    pub fn analyze(
        &self,
        stations: &[Workstation],
        assignment: &Assignment,
        operations: &[Operation],
        cycle_time_min: f64,
    ) -> SaturationReport {
        let station_ids: HashSet<&str> = stations.iter().map(|s| s.id.as_str()).collect();

        let mut ordered: Vec<&Operation> = operations.iter().collect();
        ordered.sort_by_key(|op| op.order);

        // 1. 汇总各工位计算负荷（按共享数均摊）
        let mut computed: HashMap<&str, (f64, Vec<String>)> = HashMap::new();
        for op in ordered {
            let sharing: Vec<&str> = assignment
                .stations_of(&op.id)
                .iter()
                .map(String::as_str)
                .filter(|id| station_ids.contains(id))
                .collect();
            if sharing.is_empty() {
                continue;
            }
            let time = if op.computed_time.is_finite() { op.computed_time.max(0.0) } else { 0.0 };
            let share = time / sharing.len() as f64;
            for station_id in sharing {
                let entry = computed.entry(station_id).or_insert_with(|| (0.0, Vec::new()));
                entry.0 += share;
                entry.1.push(op.id.clone());
            }
        }

        // 2. 逐工位统计
        let mut report = SaturationReport::default();
        for station in stations {
            let (computed_load, operation_ids) = computed
                .remove(station.id.as_str())
                .unwrap_or((0.0, Vec::new()));

            let override_load = station.effective_time_override();
            let load = override_load.unwrap_or(computed_load);

            let stats = self.station_stats(station, operation_ids, load, override_load.is_some(), cycle_time_min);
            report.total_required_workforce += stats.required_operators;
            report.total_load_min += stats.load_min;
            report.stations.push(stats);
        }

        debug!(
            total_required_workforce = report.total_required_workforce,
            total_load_min = report.total_load_min,
            "饱和度分析完成"
        );
        report
    }

    /// 所需人数取整
    pub fn required_operators(&self, theoretical: f64) -> u32 {
        if !theoretical.is_finite() || theoretical <= 0.0 {
            0
        } else if theoretical > self.config.operator_rounding_threshold + EPSILON {
            (theoretical - EPSILON).ceil() as u32
        } else {
            1
        }
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn station_stats(
        &self,
        station: &Workstation,
        operation_ids: Vec<String>,
        load: f64,
        overridden: bool,
        cycle_time_min: f64,
    ) -> StationStats {
        let cycle_valid = cycle_time_min > 0.0 && cycle_time_min.is_finite();
        let theoretical = if cycle_valid { load / cycle_time_min } else { 0.0 };
        let required = self.required_operators(theoretical);

        let station_saturation = if cycle_valid { load / cycle_time_min * 100.0 } else { 0.0 };
        let operator_saturation = if cycle_valid && required > 0 {
            load / (required as f64 * cycle_time_min) * 100.0
        } else {
            station_saturation
        };

        StationStats {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            machine_label: station.machine_label.clone(),
            operation_ids,
            load_min: load,
            load_sec: load * 60.0,
            overridden,
            theoretical_operators: theoretical,
            required_operators: required,
            station_saturation_pct: station_saturation,
            operator_saturation_pct: operator_saturation,
        }
    }
}

impl Default for SaturationAnalyzer {
    fn default() -> Self {
        Self::new(BalancingConfig::default())
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn op(id: &str, order: u32, time: f64) -> Operation {
        let mut op = Operation::new(id, order, "Piqueuse", 0.0);
        op.computed_time = time;
        op
    }

    #[test]
    fn test_required_operators_rounding() {
        let analyzer = SaturationAnalyzer::default();
        assert_eq!(analyzer.required_operators(0.0), 0);
        assert_eq!(analyzer.required_operators(0.2), 1);
        assert_eq!(analyzer.required_operators(1.15), 1);
        // 浮点累加误差不跨过阈值
        assert_eq!(analyzer.required_operators((0.03 + 1.12) / 1.0), 1);
        assert_eq!(analyzer.required_operators((0.01 + 0.68) / 0.6), 1);
        assert_eq!(analyzer.required_operators(1.16), 2);
        assert_eq!(analyzer.required_operators(2.0), 2);
        assert_eq!(analyzer.required_operators(2.01), 3);
    }

    #[test]
    fn test_shared_operation_splits_time() {
        let analyzer = SaturationAnalyzer::default();
        let stations = vec![Workstation::numbered(1, "Piqueuse"), Workstation::numbered(2, "Piqueuse")];
        let mut assignment = Assignment::new();
        assignment.assign("a", vec!["P1".into(), "P2".into()]);
        assignment.assign("b", vec!["P2".into()]);

        let report = analyzer.analyze(&stations, &assignment, &[op("a", 1, 1.0), op("b", 2, 0.3)], 1.0);
        assert!((report.get("P1").unwrap().load_min - 0.5).abs() < 1e-12);
        assert!((report.get("P2").unwrap().load_min - 0.8).abs() < 1e-12);
        assert!((report.total_load_min - 1.3).abs() < 1e-12);
        assert_eq!(report.total_required_workforce, 2);
    }

    #[test]
    fn test_override_replaces_load() {
        let analyzer = SaturationAnalyzer::default();
        let mut station = Workstation::numbered(1, "Piqueuse");
        station.time_override = Some(2.5);
        let mut assignment = Assignment::new();
        assignment.add("a", "P1");

        let report = analyzer.analyze(&[station], &assignment, &[op("a", 1, 0.4)], 1.0);
        let stats = report.get("P1").unwrap();
        assert!(stats.overridden);
        assert_eq!(stats.load_min, 2.5);
        assert_eq!(stats.required_operators, 3);
        assert!((stats.operator_saturation_pct - 2.5 / 3.0 * 100.0).abs() < 1e-9);
        assert!((stats.station_saturation_pct - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_cycle_time_disables_operator_math() {
        let analyzer = SaturationAnalyzer::default();
        let mut assignment = Assignment::new();
        assignment.add("a", "P1");
        let report = analyzer.analyze(&[Workstation::numbered(1, "X")], &assignment, &[op("a", 1, 0.4)], 0.0);
        let stats = report.get("P1").unwrap();
        assert_eq!(stats.theoretical_operators, 0.0);
        assert_eq!(stats.required_operators, 0);
        assert_eq!(stats.station_saturation_pct, 0.0);
    }

    #[test]
    fn test_dangling_references_are_ignored() {
        let analyzer = SaturationAnalyzer::default();
        let mut assignment = Assignment::new();
        assignment.assign("a", vec!["P1".into(), "GONE".into()]);
        assignment.add("missing-op", "P1");
        let report = analyzer.analyze(&[Workstation::numbered(1, "X")], &assignment, &[op("a", 1, 0.6)], 1.0);
        let stats = report.get("P1").unwrap();
        assert!((stats.load_min - 0.6).abs() < 1e-12);
        assert_eq!(stats.operation_ids, vec!["a"]);
    }
}

// ==========================================
// 服装流水线平衡系统 - 工序平衡引擎
// ==========================================
// 职责: 按工序顺序单遍扫描，将工序装入工位
// 输入: 已计算工时的工序列表 + 目标节拍 bf
// 输出: 有序工位列表 + 分配映射 (1:1)
// ==========================================
// 红线: 工位内机器标签必须一致（机器连续性）
// 红线: 工位累计时间不超过 bf × 1.15（单道超限工序独占一个工位）
// 红线: 确定性，相同输入必须得到相同的工位边界
// 注: 启发式，不做全局最优搜索
// ==========================================

use crate::config::engine_params::BalancingConfig;
use crate::domain::assignment::Assignment;
use crate::domain::operation::Operation;
use crate::domain::workstation::Workstation;
use crate::engine::keyword_matcher::{normalize, KeywordMatcher, MachineMatcher};
use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument};

/// 浮点比较容差
const EPSILON: f64 = 1e-9;

/// 工位关闭原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlushReason {
    MachineChange,   // 下一道工序机器不同
    CeilingExceeded, // 加入下一道工序将超过上限
    EndOfSequence,   // 扫描结束
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushReason::MachineChange => write!(f, "MACHINE_CHANGE"),
            FlushReason::CeilingExceeded => write!(f, "CEILING_EXCEEDED"),
            FlushReason::EndOfSequence => write!(f, "END_OF_SEQUENCE"),
        }
    }
}

// ==========================================
// BalanceResult - 平衡结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceResult {
    pub stations: Vec<Workstation>,        // 工位（P1..Pn）
    pub assignment: Assignment,            // 工序 → 工位
    pub station_operations: Vec<Vec<String>>, // 每个工位的工序ID（按工序顺序）
    pub station_times: Vec<f64>,           // 每个工位的累计工时
    pub flush_reasons: Vec<FlushReason>,   // 每个工位的关闭原因
}

/// 当前工位累加器
#[derive(Debug, Default)]
struct StationAccumulator {
    operation_ids: Vec<String>,
    time: f64,
    machine_label: String,
    machine_key: String,
}

impl StationAccumulator {
    fn is_empty(&self) -> bool {
        self.operation_ids.is_empty()
    }

    fn seed(label: String, op_id: &str, time: f64) -> Self {
        Self {
            operation_ids: vec![op_id.to_string()],
            time,
            machine_key: normalize(&label),
            machine_label: label,
        }
    }
}

// ==========================================
// SequenceBalancer - 工序平衡引擎
// ==========================================
pub struct SequenceBalancer<M: MachineMatcher = KeywordMatcher> {
    config: BalancingConfig,
    matcher: M,
}

impl SequenceBalancer<KeywordMatcher> {
    pub fn new(config: BalancingConfig) -> Self {
        Self {
            config,
            matcher: KeywordMatcher::new(),
        }
    }
}

impl<M: MachineMatcher> SequenceBalancer<M> {
    pub fn with_matcher(config: BalancingConfig, matcher: M) -> Self {
        Self { config, matcher }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 按顺序装箱
    ///
    /// 规则:
    /// 1) 工序按 order 排序后从左到右扫描
    /// 2) 累加器为空，或 机器标签相同 且 累计 + 本工序 <= 上限 → 加入当前工位
    /// 3) 否则关闭当前工位（编号 P{n}），以本工序开启新工位
    /// 4) 扫描结束后关闭非空累加器
    #[instrument(skip(self, operations), fields(operations = operations.len()))]
    pub fn balance(&self, operations: &[Operation], cycle_time_min: f64) -> BalanceResult {
        let ceiling = self.config.station_ceiling(cycle_time_min);

        let mut ordered: Vec<&Operation> = operations.iter().collect();
        ordered.sort_by_key(|op| op.order);

        let mut result = BalanceResult {
            stations: Vec::new(),
            assignment: Assignment::new(),
            station_operations: Vec::new(),
            station_times: Vec::new(),
            flush_reasons: Vec::new(),
        };

        let mut current = StationAccumulator::default();
        for op in ordered {
            let op_time = effective_time(op);
            let label = self.matcher.normalize_machine_label(op.machine_label());

            if current.is_empty() {
                current = StationAccumulator::seed(label, &op.id, op_time);
                continue;
            }

            let same_machine = normalize(&label) == current.machine_key;
            let fits = current.time + op_time <= ceiling + EPSILON;

            if same_machine && fits {
                current.operation_ids.push(op.id.clone());
                current.time += op_time;
                continue;
            }

            let reason = if same_machine {
                FlushReason::CeilingExceeded
            } else {
                FlushReason::MachineChange
            };
            let finished = std::mem::replace(&mut current, StationAccumulator::seed(label, &op.id, op_time));
            Self::flush(&mut result, finished, reason);
        }

        if !current.is_empty() {
            Self::flush(&mut result, current, FlushReason::EndOfSequence);
        }

        debug!(
            stations = result.stations.len(),
            ceiling_min = ceiling,
            "工序平衡完成"
        );
        result
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 关闭当前工位并写入结果
    fn flush(result: &mut BalanceResult, acc: StationAccumulator, reason: FlushReason) {
        let index = result.stations.len() as u32 + 1;
        let station = Workstation::numbered(index, acc.machine_label);

        for op_id in &acc.operation_ids {
            result.assignment.assign(op_id, vec![station.id.clone()]);
        }

        debug!(
            station_id = %station.id,
            machine = %station.machine_label,
            operations = acc.operation_ids.len(),
            time_min = acc.time,
            reason = %reason,
            "工位已关闭"
        );

        result.stations.push(station);
        result.station_operations.push(acc.operation_ids);
        result.station_times.push(acc.time);
        result.flush_reasons.push(reason);
    }
}

impl Default for SequenceBalancer<KeywordMatcher> {
    fn default() -> Self {
        Self::new(BalancingConfig::default())
    }
}

/// 有效工时（非有限值或负值按 0 计）
fn effective_time(op: &Operation) -> f64 {
    if op.computed_time.is_finite() && op.computed_time > 0.0 {
        op.computed_time
    } else {
        0.0
    }
}

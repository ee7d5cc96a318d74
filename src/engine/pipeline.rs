// ==========================================
// 服装流水线平衡系统 - 重算流水线（状态机）
// ==========================================
// 职责: 上一快照 + 变更事件 → 新的完整快照（不可变替换）
// 顺序: 标准工时 → 工序平衡 → 饱和度 → 工位拆分
// ==========================================
// 模式:
// - Automatic: 任意输入变更都重新执行工序平衡
// - Manual: 分配归用户所有，仅重算工时与饱和度；多人工位拆分为可摆放单元
// 迁移:
// - EnterManual = 以当前自动分配为起点 + 拆分
// - ExitManual  = 丢弃手工编辑 + 合并 + 重新平衡
// 红线: 不允许部分重算（工时已更新而分配陈旧）
// ==========================================


use crate::config::engine_params::{BalancingConfig, TimeDefaults};
use crate::domain::assignment::Assignment;
use crate::domain::fabric::FabricSettings;
use crate::domain::layout::ManualLink;
use crate::domain::line::LineSettings;
use crate::domain::machine::Machine;
use crate::domain::operation::{reindex_operations, Operation};
use crate::domain::standard_time::StandardTimeEntry;
use crate::domain::types::BalancingMode;
use crate::domain::workstation::{Position, Workstation};
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::line_metrics::LineMetrics;
use crate::engine::saturation::{SaturationAnalyzer, SaturationReport, StationStats};
use crate::engine::sequence_balancer::SequenceBalancer;
use crate::engine::station_splitter::{PlaceableUnit, StationSplitter};
use crate::engine::time_standard::TimeStandardCalculator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// LineInputs - 上游输入
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineInputs {
    pub operations: Vec<Operation>,
    pub machines: Vec<Machine>,
    pub standard_times: Vec<StandardTimeEntry>,
    pub fabric: FabricSettings,
    pub settings: LineSettings,
}

// ==========================================
// LineSnapshot - 派生状态快照
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineSnapshot {
    pub revision: u64,                       // 快照修订号
    pub mode: BalancingMode,                 // 当前模式
    pub inputs: LineInputs,                  // 输入（工序已写入 computed_time）
    pub stations: Vec<Workstation>,          // 工位（手工模式下为父工位）
    pub assignment: Assignment,              // 工序 → 工位
    pub saturation: SaturationReport,        // 饱和度报告
    pub units: Vec<PlaceableUnit>,           // 可摆放单元（仅手工模式）
    pub links: Vec<ManualLink>,              // 人工连线
    pub metrics: LineMetrics,                // 汇总指标
    pub unassigned_operation_ids: Vec<String>, // 未分配工序
}

impl LineSnapshot {
    pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
        self.inputs.operations.iter().find(|op| op.id == operation_id)
    }

    pub fn station(&self, station_id: &str) -> Option<&Workstation> {
        self.stations.iter().find(|s| s.id == station_id)
    }

    pub fn stats(&self, station_id: &str) -> Option<&StationStats> {
        self.saturation.get(station_id)
    }

    pub fn unit(&self, unit_id: &str) -> Option<&PlaceableUnit> {
        self.units.iter().find(|u| u.station.id == unit_id)
    }

    pub fn total_required_workforce(&self) -> u32 {
        self.saturation.total_required_workforce
    }

    /// 当前可被连线引用的ID（手工模式为单元，自动模式为工位）
    fn linkable_ids(&self) -> HashSet<&str> {
        match self.mode {
            BalancingMode::Manual => self.units.iter().map(|u| u.station.id.as_str()).collect(),
            BalancingMode::Automatic => self.stations.iter().map(|s| s.id.as_str()).collect(),
        }
    }
}

// ==========================================
// LineEvent - 变更事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineEvent {
    // ===== 输入变更（两种模式均可） =====
    OperationsReplaced(Vec<Operation>),
    OperationUpserted(Operation),
    OperationRemoved { operation_id: String },
    OperationMoved { operation_id: String, to_order: u32 },
    OperationTimeForced { operation_id: String, forced_time: Option<f64> },
    MachinesReplaced(Vec<Machine>),
    MachineUpserted(Machine),
    StandardTimesReplaced(Vec<StandardTimeEntry>),
    FabricSettingsChanged(FabricSettings),
    CycleTimeChanged(f64),
    LineSettingsChanged(LineSettings),

    // ===== 模式迁移 =====
    EnterManual,
    ExitManual,

    // ===== 手工编辑（仅手工模式） =====
    OperationAssigned { operation_id: String, station_ids: Vec<String> },
    OperationUnassigned { operation_id: String },
    StationTimeOverridden { station_id: String, time_override: Option<f64> },
    StationInserted { after_station_id: Option<String>, machine_label: String, name: Option<String> },
    StationRemoved { station_id: String },
    OperatorNamed { station_id: String, operator_name: Option<String> },
    UnitPlaced { unit_id: String, position: Option<Position> },
    LinkAdded { from_station_id: String, to_station_id: String, label: Option<String> },
    LinkRemoved { link_id: String },
    LayoutApplied { stations: Vec<Workstation>, links: Vec<ManualLink> },
}

impl LineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LineEvent::OperationsReplaced(_) => "OPERATIONS_REPLACED",
            LineEvent::OperationUpserted(_) => "OPERATION_UPSERTED",
            LineEvent::OperationRemoved { .. } => "OPERATION_REMOVED",
            LineEvent::OperationMoved { .. } => "OPERATION_MOVED",
            LineEvent::OperationTimeForced { .. } => "OPERATION_TIME_FORCED",
            LineEvent::MachinesReplaced(_) => "MACHINES_REPLACED",
            LineEvent::MachineUpserted(_) => "MACHINE_UPSERTED",
            LineEvent::StandardTimesReplaced(_) => "STANDARD_TIMES_REPLACED",
            LineEvent::FabricSettingsChanged(_) => "FABRIC_SETTINGS_CHANGED",
            LineEvent::CycleTimeChanged(_) => "CYCLE_TIME_CHANGED",
            LineEvent::LineSettingsChanged(_) => "LINE_SETTINGS_CHANGED",
            LineEvent::EnterManual => "ENTER_MANUAL",
            LineEvent::ExitManual => "EXIT_MANUAL",
            LineEvent::OperationAssigned { .. } => "OPERATION_ASSIGNED",
            LineEvent::OperationUnassigned { .. } => "OPERATION_UNASSIGNED",
            LineEvent::StationTimeOverridden { .. } => "STATION_TIME_OVERRIDDEN",
            LineEvent::StationInserted { .. } => "STATION_INSERTED",
            LineEvent::StationRemoved { .. } => "STATION_REMOVED",
            LineEvent::OperatorNamed { .. } => "OPERATOR_NAMED",
            LineEvent::UnitPlaced { .. } => "UNIT_PLACED",
            LineEvent::LinkAdded { .. } => "LINK_ADDED",
            LineEvent::LinkRemoved { .. } => "LINK_REMOVED",
            LineEvent::LayoutApplied { .. } => "LAYOUT_APPLIED",
        }
    }

    /// 是否为仅手工模式可用的编辑
    pub fn requires_manual(&self) -> bool {
        matches!(
            self,
            LineEvent::OperationAssigned { .. }
                | LineEvent::OperationUnassigned { .. }
                | LineEvent::StationTimeOverridden { .. }
                | LineEvent::StationInserted { .. }
                | LineEvent::StationRemoved { .. }
                | LineEvent::OperatorNamed { .. }
                | LineEvent::UnitPlaced { .. }
                | LineEvent::LinkAdded { .. }
                | LineEvent::LinkRemoved { .. }
                | LineEvent::LayoutApplied { .. }
        )
    }
}

// ==========================================
// RecalcStages - 需要重跑的阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecalcStages {
    pub times: bool,
    pub balance: bool,
    pub saturation: bool,
    pub split: bool,
}

impl RecalcStages {
    /// 全部阶段
    pub fn all() -> Self {
        Self {
            times: true,
            balance: true,
            saturation: true,
            split: true,
        }
    }

    /// 从工序平衡开始
    pub fn from_balance() -> Self {
        Self {
            times: false,
            ..Self::all()
        }
    }

    /// 从饱和度开始
    pub fn from_saturation() -> Self {
        Self {
            saturation: true,
            split: true,
            ..Self::default()
        }
    }

    /// 仅布局层（不重算）
    pub fn none() -> Self {
        Self::default()
    }
}

// ==========================================
// LinePipeline - 重算流水线
// ==========================================
pub struct LinePipeline {
    calculator: TimeStandardCalculator,
    balancer: SequenceBalancer,
    analyzer: SaturationAnalyzer,
    splitter: StationSplitter,
    config: BalancingConfig,
}

impl LinePipeline {
    pub fn new(time_defaults: TimeDefaults, config: BalancingConfig) -> Self {
        Self {
            calculator: TimeStandardCalculator::new(time_defaults),
            balancer: SequenceBalancer::new(config),
            analyzer: SaturationAnalyzer::new(config),
            splitter: StationSplitter::new(),
            config,
        }
    }

    pub fn calculator(&self) -> &TimeStandardCalculator {
        &self.calculator
    }

    pub fn config(&self) -> &BalancingConfig {
        &self.config
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 由完整输入构建初始快照（自动模式）
    #[instrument(skip_all, fields(operations = inputs.operations.len()))]
    pub fn initialize(&self, mut inputs: LineInputs) -> LineSnapshot {
        reindex_operations(&mut inputs.operations);
        let mut snapshot = LineSnapshot {
            inputs,
            ..LineSnapshot::default()
        };
        self.recompute(&mut snapshot, RecalcStages::all(), &[]);
        snapshot
    }

    /// 应用事件，返回新的完整快照
    #[instrument(skip_all, fields(event = event.name(), revision = previous.revision, mode = %previous.mode))]
    pub fn apply(&self, previous: &LineSnapshot, event: LineEvent) -> PipelineResult<LineSnapshot> {
        if event.requires_manual() && previous.mode != BalancingMode::Manual {
            return Err(PipelineError::ManualModeRequired {
                event: event.name().to_string(),
                mode: previous.mode,
            });
        }

        let mut next = previous.clone();
        next.revision = previous.revision + 1;

        let stages = self.mutate(&mut next, event)?;
        self.recompute(&mut next, stages, &previous.units);

        debug!(
            revision = next.revision,
            stations = next.stations.len(),
            units = next.units.len(),
            workforce = next.saturation.total_required_workforce,
            "快照已重算"
        );
        Ok(next)
    }

    // ==========================================
    // 事件处理
    // ==========================================

    /// 把事件写入快照，返回需要重跑的阶段
    fn mutate(&self, next: &mut LineSnapshot, event: LineEvent) -> PipelineResult<RecalcStages> {
        let stages = match event {
            // ===== 输入变更 =====
            LineEvent::OperationsReplaced(operations) => {
                // 分配按工序ID建索引，ID 必须唯一
                let mut seen: HashSet<&str> = HashSet::with_capacity(operations.len());
                for op in &operations {
                    validate_operation(op)?;
                    if !seen.insert(op.id.as_str()) {
                        return Err(PipelineError::InvalidInput {
                            field: "operation.id".to_string(),
                            message: format!("工序ID重复: {}", op.id),
                        });
                    }
                }
                next.inputs.operations = operations;
                reindex_operations(&mut next.inputs.operations);
                let ids: HashSet<String> = next.inputs.operations.iter().map(|op| op.id.clone()).collect();
                next.assignment.retain_operations(|id| ids.contains(id));
                RecalcStages::all()
            }
            LineEvent::OperationUpserted(operation) => {
                validate_operation(&operation)?;
                upsert_operation(&mut next.inputs.operations, operation);
                RecalcStages::all()
            }
            LineEvent::OperationRemoved { operation_id } => {
                let before = next.inputs.operations.len();
                next.inputs.operations.retain(|op| op.id != operation_id);
                if next.inputs.operations.len() == before {
                    warn!(operation_id = %operation_id, "删除的工序不存在，忽略");
                }
                reindex_operations(&mut next.inputs.operations);
                next.assignment.unassign(&operation_id);
                RecalcStages::all()
            }
            LineEvent::OperationMoved { operation_id, to_order } => {
                if !move_operation_group(&mut next.inputs.operations, &operation_id, to_order) {
                    warn!(operation_id = %operation_id, "移动的工序不存在，忽略");
                }
                RecalcStages::all()
            }
            LineEvent::OperationTimeForced {
                operation_id,
                forced_time,
            } => {
                if let Some(t) = forced_time {
                    ensure_finite("forced_time", t)?;
                }
                match next.inputs.operations.iter_mut().find(|op| op.id == operation_id) {
                    Some(op) => op.forced_time = forced_time,
                    None => warn!(operation_id = %operation_id, "强制工时的工序不存在，忽略"),
                }
                RecalcStages::all()
            }
            LineEvent::MachinesReplaced(machines) => {
                next.inputs.machines = machines;
                RecalcStages::all()
            }
            LineEvent::MachineUpserted(machine) => {
                match next.inputs.machines.iter_mut().find(|m| m.id == machine.id) {
                    Some(existing) => *existing = machine,
                    None => next.inputs.machines.push(machine),
                }
                RecalcStages::all()
            }
            LineEvent::StandardTimesReplaced(entries) => {
                next.inputs.standard_times = entries;
                RecalcStages::all()
            }
            LineEvent::FabricSettingsChanged(fabric) => {
                next.inputs.fabric = fabric;
                RecalcStages::all()
            }
            LineEvent::CycleTimeChanged(cycle_time_min) => {
                ensure_finite("cycle_time_min", cycle_time_min)?;
                next.inputs.settings.cycle_time_min = cycle_time_min;
                RecalcStages::from_balance()
            }
            LineEvent::LineSettingsChanged(settings) => {
                ensure_finite("cycle_time_min", settings.cycle_time_min)?;
                ensure_finite("presence_time_min", settings.presence_time_min)?;
                ensure_finite("efficiency_pct", settings.efficiency_pct)?;
                let cycle_changed = settings.cycle_time_min != next.inputs.settings.cycle_time_min;
                next.inputs.settings = settings;
                if cycle_changed {
                    RecalcStages::from_balance()
                } else {
                    RecalcStages::none()
                }
            }

            // ===== 模式迁移 =====
            LineEvent::EnterManual => {
                if next.mode == BalancingMode::Manual {
                    debug!("已处于手工模式，忽略");
                    return Ok(RecalcStages::none());
                }
                info!(stations = next.stations.len(), "进入手工模式，以当前自动分配为起点");
                next.mode = BalancingMode::Manual;
                for station in next.stations.iter_mut() {
                    station.placed = false;
                }
                RecalcStages::from_saturation()
            }
            LineEvent::ExitManual => {
                if next.mode == BalancingMode::Automatic {
                    debug!("已处于自动模式，忽略");
                    return Ok(RecalcStages::none());
                }
                let collapsed = self.splitter.collapse(&next.units);
                next.links = self.splitter.prune_links(&next.links, &collapsed.removed_unit_ids);
                info!(
                    removed_units = collapsed.removed_unit_ids.len(),
                    "退出手工模式，丢弃手工编辑并重新平衡"
                );
                next.mode = BalancingMode::Automatic;
                next.units.clear();
                RecalcStages::from_balance()
            }

            // ===== 手工编辑 =====
            LineEvent::OperationAssigned {
                operation_id,
                station_ids,
            } => {
                let targets = self.resolve_station_ids(next, &station_ids);
                let group = group_members(&next.inputs.operations, &operation_id);
                if group.is_empty() {
                    warn!(operation_id = %operation_id, "分配的工序不存在，忽略");
                }
                for op_id in group {
                    next.assignment.assign(&op_id, targets.clone());
                }
                RecalcStages::from_saturation()
            }
            LineEvent::OperationUnassigned { operation_id } => {
                for op_id in group_members(&next.inputs.operations, &operation_id) {
                    next.assignment.unassign(&op_id);
                }
                RecalcStages::from_saturation()
            }
            LineEvent::StationTimeOverridden {
                station_id,
                time_override,
            } => {
                if let Some(t) = time_override {
                    ensure_finite("time_override", t)?;
                }
                let parent_id = self.parent_station_id(next, &station_id);
                match next.stations.iter_mut().find(|s| s.id == parent_id) {
                    Some(station) => station.time_override = time_override,
                    None => warn!(station_id = %station_id, "覆写负荷的工位不存在，忽略"),
                }
                RecalcStages::from_saturation()
            }
            LineEvent::StationInserted {
                after_station_id,
                machine_label,
                name,
            } => {
                let number = next_station_number(&next.stations);
                let mut station = Workstation::numbered(number, machine_label);
                if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                    station.name = name;
                }
                let position = after_station_id
                    .as_deref()
                    .and_then(|id| next.stations.iter().position(|s| s.id == id))
                    .map(|idx| idx + 1)
                    .unwrap_or(next.stations.len());
                debug!(station_id = %station.id, position, "插入工位");
                next.stations.insert(position, station);
                RecalcStages::from_saturation()
            }
            LineEvent::StationRemoved { station_id } => {
                let parent_id = self.parent_station_id(next, &station_id);
                let before = next.stations.len();
                next.stations.retain(|s| s.id != parent_id);
                if next.stations.len() == before {
                    warn!(station_id = %station_id, "删除的工位不存在，忽略");
                }
                let orphaned = next.assignment.remove_station(&parent_id);
                debug!(station_id = %parent_id, orphaned = orphaned.len(), "工位已删除");
                RecalcStages::from_saturation()
            }
            LineEvent::OperatorNamed {
                station_id,
                operator_name,
            } => {
                if let Some(station) = next.stations.iter_mut().find(|s| s.id == station_id) {
                    station.operator_name = operator_name.clone();
                }
                if let Some(unit) = next.units.iter_mut().find(|u| u.station.id == station_id) {
                    unit.station.operator_name = operator_name;
                }
                RecalcStages::none()
            }
            LineEvent::UnitPlaced { unit_id, position } => {
                match next.units.iter_mut().find(|u| u.station.id == unit_id) {
                    Some(unit) => {
                        unit.station.placed = position.is_some();
                        unit.station.position = position;
                    }
                    None => warn!(unit_id = %unit_id, "落位的单元不存在，忽略"),
                }
                RecalcStages::none()
            }
            LineEvent::LinkAdded {
                from_station_id,
                to_station_id,
                label,
            } => {
                let endpoints_exist = {
                    let known = next.linkable_ids();
                    known.contains(from_station_id.as_str()) && known.contains(to_station_id.as_str())
                };
                if endpoints_exist {
                    next.links.push(ManualLink {
                        id: Uuid::new_v4().to_string(),
                        from_station_id,
                        to_station_id,
                        label,
                    });
                } else {
                    warn!(from = %from_station_id, to = %to_station_id, "连线端点不存在，忽略");
                }
                RecalcStages::none()
            }
            LineEvent::LinkRemoved { link_id } => {
                next.links.retain(|l| l.id != link_id);
                RecalcStages::none()
            }
            LineEvent::LayoutApplied { stations, links } => {
                let template: Vec<PlaceableUnit> = stations
                    .into_iter()
                    .map(|station| PlaceableUnit {
                        station,
                        load_min: 0.0,
                        saturation_pct: 0.0,
                        parent_operators: 0,
                    })
                    .collect();
                self.splitter.carry_over_placement(&mut next.units, &template);
                next.links = links;
                RecalcStages::none()
            }
        };
        Ok(stages)
    }

    // ==========================================
    // 重算
    // ==========================================

    /// 按顺序重跑指定阶段，并刷新不依赖阶段的派生字段
    fn recompute(&self, next: &mut LineSnapshot, stages: RecalcStages, previous_units: &[PlaceableUnit]) {
        let cycle_time = next.inputs.settings.cycle_time_min;

        // 1. 标准工时
        if stages.times {
            next.inputs.operations = self.calculator.compute_all(
                &next.inputs.operations,
                &next.inputs.machines,
                &next.inputs.fabric,
                &next.inputs.standard_times,
            );
        }

        // 2. 工序平衡（仅自动模式）
        if stages.balance && next.mode == BalancingMode::Automatic {
            let balanced = self.balancer.balance(&next.inputs.operations, cycle_time);
            next.stations = balanced.stations;
            next.assignment = balanced.assignment;
        }

        // 3. 饱和度
        if stages.saturation || stages.balance {
            next.saturation = self.analyzer.analyze(
                &next.stations,
                &next.assignment,
                &next.inputs.operations,
                cycle_time,
            );
        }

        // 4. 拆分（仅手工模式）
        if stages.split || stages.balance {
            match next.mode {
                BalancingMode::Manual => {
                    let mut units = self.splitter.expand(&next.stations, &next.saturation);
                    self.splitter.carry_over_placement(&mut units, previous_units);
                    next.units = units;
                }
                BalancingMode::Automatic => next.units.clear(),
            }
        }

        // 连线端点必须存在
        let known: HashSet<String> = next.linkable_ids().into_iter().map(str::to_string).collect();
        let before = next.links.len();
        next.links
            .retain(|l| known.contains(&l.from_station_id) && known.contains(&l.to_station_id));
        if next.links.len() != before {
            debug!(dropped = before - next.links.len(), "已删除失效连线");
        }

        let station_ids: HashSet<&str> = next.stations.iter().map(|s| s.id.as_str()).collect();
        next.unassigned_operation_ids = next
            .inputs
            .operations
            .iter()
            .filter(|op| {
                !next
                    .assignment
                    .stations_of(&op.id)
                    .iter()
                    .any(|s| station_ids.contains(s.as_str()))
            })
            .map(|op| op.id.clone())
            .collect();

        next.metrics = LineMetrics::calculate(
            &next.inputs.operations,
            &next.saturation,
            &next.inputs.settings,
            &self.config,
        );
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 子工位ID映射回父工位ID
    fn parent_station_id(&self, snapshot: &LineSnapshot, id: &str) -> String {
        snapshot
            .unit(id)
            .and_then(|u| u.station.original_id.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// 手工分配目标：子工位映射到父工位，不存在的工位忽略
    fn resolve_station_ids(&self, snapshot: &LineSnapshot, ids: &[String]) -> Vec<String> {
        let mut resolved = Vec::new();
        for id in ids {
            let parent = self.parent_station_id(snapshot, id);
            if snapshot.station(&parent).is_some() {
                resolved.push(parent);
            } else {
                warn!(station_id = %id, "分配目标工位不存在，忽略");
            }
        }
        resolved
    }
}

impl Default for LinePipeline {
    fn default() -> Self {
        Self::new(TimeDefaults::default(), BalancingConfig::default())
    }
}

// ==========================================
// 工序结构变更
// ==========================================

/// 插入或替换工序，按 order 定位后重新编号
fn upsert_operation(operations: &mut Vec<Operation>, operation: Operation) {
    operations.retain(|op| op.id != operation.id);
    reindex_operations(operations);
    let position = operations
        .iter()
        .position(|op| op.order >= operation.order)
        .unwrap_or(operations.len());
    operations.insert(position, operation);
    for (idx, op) in operations.iter_mut().enumerate() {
        op.order = idx as u32 + 1;
    }
}

/// 同组工序ID（无分组时仅自身；工序不存在时为空）
fn group_members(operations: &[Operation], operation_id: &str) -> Vec<String> {
    let group_id = match operations.iter().find(|op| op.id == operation_id) {
        Some(op) => op.group_id.clone(),
        None => return Vec::new(),
    };
    match group_id.filter(|g| !g.trim().is_empty()) {
        Some(group) => operations
            .iter()
            .filter(|op| op.group_id.as_deref() == Some(group.as_str()))
            .map(|op| op.id.clone())
            .collect(),
        None => vec![operation_id.to_string()],
    }
}

/// 将工序（连同同组工序）整体移动到目标顺序位置
fn move_operation_group(operations: &mut Vec<Operation>, operation_id: &str, to_order: u32) -> bool {
    let members = group_members(operations, operation_id);
    if members.is_empty() {
        return false;
    }

    reindex_operations(operations);
    let (mut block, mut rest): (Vec<Operation>, Vec<Operation>) =
        operations.drain(..).partition(|op| members.contains(&op.id));
    block.sort_by_key(|op| op.order);

    let position = (to_order.max(1) as usize - 1).min(rest.len());
    let tail = rest.split_off(position);
    rest.extend(block);
    rest.extend(tail);

    *operations = rest;
    for (idx, op) in operations.iter_mut().enumerate() {
        op.order = idx as u32 + 1;
    }
    true
}

/// 下一个工位编号（P{n} 中的最大 n + 1）
fn next_station_number(stations: &[Workstation]) -> u32 {
    stations
        .iter()
        .filter_map(|s| s.id.strip_prefix('P').and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0)
        + 1
}

fn validate_operation(op: &Operation) -> PipelineResult<()> {
    if op.id.trim().is_empty() {
        return Err(PipelineError::InvalidInput {
            field: "operation.id".to_string(),
            message: "工序ID不能为空".to_string(),
        });
    }
    Ok(())
}

fn ensure_finite(field: &str, value: f64) -> PipelineResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PipelineError::InvalidInput {
            field: field.to_string(),
            message: format!("数值非法: {}", value),
        })
    }
}

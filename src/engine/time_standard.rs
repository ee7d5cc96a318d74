// ==========================================
// 服装流水线平衡系统 - 标准工时计算引擎
// ==========================================
// 职责: 工序 + 机器目录 + 全局设置 → 单道工序标准工时 (min)
// 红线: 纯函数且全定义，缺失/非法数值一律回落到默认值，不报错
// 红线: 强制工时存在时原样返回，不叠加面料罚时
// ==========================================
// 公式:
// - 连续缝: 机器时间 = (长度 × 密度 / 转速) × 速度系数 × 导向系数 + 收尾 + 起停
// - 计件:   机器时间 = 数量 × 单件时间 × 导向系数
// - 手工:   机器时间 = 0
// - 标准工时 = (机器时间 + 手工时间) × 宽放 + 面料罚时
// ==========================================

use crate::config::engine_params::TimeDefaults;
use crate::domain::fabric::FabricSettings;
use crate::domain::machine::Machine;
use crate::domain::operation::Operation;
use crate::domain::standard_time::StandardTimeEntry;
use crate::domain::types::MachineKind;
use crate::engine::keyword_matcher::{KeywordMatcher, MachineMatcher};
use serde::Serialize;
use tracing::{debug, instrument};

// ==========================================
// TimeBreakdown - 工时明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBreakdown {
    pub machine_id: String,      // 解析后的机器ID
    pub machine_name: String,    // 解析后的机器名称
    pub kind: MachineKind,       // 机器分类
    pub machine_time_min: f64,   // 机器时间
    pub manual_time_min: f64,    // 手工时间
    pub majoration: f64,         // 宽放系数
    pub fabric_penalty_min: f64, // 面料罚时
    pub total_min: f64,          // 标准工时
    pub forced: bool,            // 是否为强制工时
}

/// 解析后的工艺参数（全部为有效正数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedParams {
    pub rpm: f64,
    pub speed_factor: f64,
    pub guide_factor: f64,
    pub end_precision_min: f64,
    pub start_stop_min: f64,
    pub stitch_density: f64,
    pub majoration: f64,
}

impl ResolvedParams {
    /// 按 工序 → 机器 → 默认值 的顺序补齐参数
    pub fn resolve(op: &Operation, machine: &Machine, kind: MachineKind, defaults: &TimeDefaults) -> Self {
        let guide_default = if kind.is_counter() {
            defaults.counter_guide_factor
        } else {
            defaults.continuous_guide_factor
        };
        let (end_default, start_default) = if kind.is_manual() {
            (0.0, 0.0)
        } else {
            (defaults.end_precision_min, defaults.start_stop_min)
        };

        Self {
            rpm: positive(op.rpm)
                .or(positive(machine.speed))
                .unwrap_or(defaults.machine_speed_rpm),
            speed_factor: positive(op.speed_factor)
                .or(positive(machine.speed_factor))
                .unwrap_or(defaults.machine_speed_factor),
            guide_factor: positive(op.guide_factor).unwrap_or(guide_default),
            end_precision_min: positive(op.end_precision_constant).unwrap_or(end_default),
            start_stop_min: positive(op.start_stop_constant).unwrap_or(start_default),
            stitch_density: positive(op.stitch_length_mm)
                .map(|pitch| 10.0 / pitch)
                .unwrap_or(defaults.default_stitch_density),
            majoration: positive(op.majoration)
                .or(positive(machine.cofs))
                .unwrap_or(defaults.machine_cofs),
        }
    }
}

// ==========================================
// TimeStandardCalculator - 标准工时计算引擎
// ==========================================
pub struct TimeStandardCalculator<M: MachineMatcher = KeywordMatcher> {
    defaults: TimeDefaults,
    matcher: M,
}

impl TimeStandardCalculator<KeywordMatcher> {
    /// 使用关键字匹配器创建
    pub fn new(defaults: TimeDefaults) -> Self {
        Self {
            defaults,
            matcher: KeywordMatcher::new(),
        }
    }
}

impl<M: MachineMatcher> TimeStandardCalculator<M> {
    /// 使用自定义匹配器创建
    pub fn with_matcher(defaults: TimeDefaults, matcher: M) -> Self {
        Self { defaults, matcher }
    }

    pub fn defaults(&self) -> &TimeDefaults {
        &self.defaults
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算单道工序标准工时 (min)
    pub fn compute(
        &self,
        op: &Operation,
        machines: &[Machine],
        fabric: &FabricSettings,
        standard_times: &[StandardTimeEntry],
    ) -> f64 {
        self.compute_detailed(op, machines, fabric, standard_times).total_min
    }

    /// 计算单道工序标准工时并返回明细
    pub fn compute_detailed(
        &self,
        op: &Operation,
        machines: &[Machine],
        fabric: &FabricSettings,
        standard_times: &[StandardTimeEntry],
    ) -> TimeBreakdown {
        // 1. 机器解析（失败时使用合成手工机器）
        let synthetic;
        let machine = match self.matcher.resolve_machine(op, machines) {
            Some(m) => m,
            None => {
                synthetic = Machine::synthetic_manual();
                &synthetic
            }
        };

        // 目录显式给出的转速（含 0）参与分类；缺失时按默认转速
        let nominal_speed = machine
            .speed
            .filter(|v| v.is_finite())
            .unwrap_or(self.defaults.machine_speed_rpm);
        let kind = self.matcher.classify(&machine.name, nominal_speed);

        // 2. 强制工时直接返回
        if let Some(forced) = op.forced_time.filter(|t| t.is_finite() && *t >= 0.0) {
            return TimeBreakdown {
                machine_id: machine.id.clone(),
                machine_name: machine.name.clone(),
                kind,
                machine_time_min: 0.0,
                manual_time_min: 0.0,
                majoration: 1.0,
                fabric_penalty_min: 0.0,
                total_min: forced,
                forced: true,
            };
        }

        let params = ResolvedParams::resolve(op, machine, kind, &self.defaults);
        let length = if op.length.is_finite() { op.length } else { 0.0 };

        // 3. 机器时间
        let machine_time = match kind {
            MachineKind::Manual => 0.0,
            MachineKind::Counter(family) => {
                let quantity = length.max(0.0);
                let unit_time = self
                    .matcher
                    .best_standard_time(&machine.name, standard_times)
                    .map(|entry| entry.minutes())
                    .filter(|t| t.is_finite() && *t > 0.0)
                    .unwrap_or(if family.is_button_or_bartack() {
                        self.defaults.button_unit_time_min
                    } else {
                        self.defaults.counter_unit_time_min
                    });
                quantity * unit_time * params.guide_factor
            }
            MachineKind::ContinuousSeam => {
                if length <= 0.0 {
                    0.0
                } else {
                    let base_sewing = (length * params.stitch_density) / params.rpm;
                    base_sewing * params.speed_factor * params.guide_factor
                        + params.end_precision_min
                        + params.start_stop_min
                }
            }
        };

        // 4. 手工时间
        let manual_time = match positive(op.manual_time_override) {
            Some(v) => v,
            None => self.derive_manual_time(kind, machine_time, length),
        };

        // 5. 面料罚时（仅机器工序）
        let fabric_penalty = if kind.is_manual() {
            0.0
        } else {
            fabric.penalty_minutes()
        };

        let total = (machine_time + manual_time) * params.majoration + fabric_penalty;

        TimeBreakdown {
            machine_id: machine.id.clone(),
            machine_name: machine.name.clone(),
            kind,
            machine_time_min: machine_time,
            manual_time_min: manual_time,
            majoration: params.majoration,
            fabric_penalty_min: fabric_penalty,
            total_min: total,
            forced: false,
        }
    }

    /// 批量计算：返回写入 computed_time 后的工序副本
    #[instrument(skip_all, fields(operations = operations.len(), machines = machines.len()))]
    pub fn compute_all(
        &self,
        operations: &[Operation],
        machines: &[Machine],
        fabric: &FabricSettings,
        standard_times: &[StandardTimeEntry],
    ) -> Vec<Operation> {
        operations
            .iter()
            .map(|op| {
                let breakdown = self.compute_detailed(op, machines, fabric, standard_times);
                debug!(
                    operation_id = %op.id,
                    machine = %breakdown.machine_name,
                    kind = %breakdown.kind,
                    total_min = breakdown.total_min,
                    forced = breakdown.forced,
                    "标准工时已计算"
                );
                let mut updated = op.clone();
                updated.computed_time = breakdown.total_min;
                updated
            })
            .collect()
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 自动推导手工时间
    ///
    /// - 有机器时间: 计件 0.18；连续缝 max(0.15, 长度 × 0.005) 保留两位小数
    /// - 无机器时间: 长度 > 0 时给最低搬运宽放 0.18，否则 0
    fn derive_manual_time(&self, kind: MachineKind, machine_time: f64, length: f64) -> f64 {
        if machine_time > 0.0 {
            match kind {
                MachineKind::Counter(_) => self.defaults.counter_manual_time_min,
                _ => round2(
                    self.defaults
                        .continuous_manual_floor_min
                        .max(length * self.defaults.manual_time_per_length_min),
                ),
            }
        } else if length > 0.0 {
            self.defaults.handling_allowance_min
        } else {
            0.0
        }
    }
}

impl Default for TimeStandardCalculator<KeywordMatcher> {
    fn default() -> Self {
        Self::new(TimeDefaults::default())
    }
}

/// 有效正数（缺失/零/负/非有限值返回 None）
fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fabric::FabricPenaltyValues;
    use crate::domain::types::{CounterFamily, FabricLevel, TimeUnit};

    fn catalog() -> Vec<Machine> {
        vec![
            Machine::new("PIQ", "Piqueuse").with_speed(4000.0).with_speed_factor(1.0).with_cofs(1.1),
            Machine::new("BTN", "Boutonnière").with_speed(1500.0),
            Machine::new("MAN", "MAN"),
        ]
    }

    #[test]
    fn test_continuous_seam_formula() {
        let calc = TimeStandardCalculator::default();
        let mut op = Operation::new("op1", 1, "Piqueuse", 120.0);
        op.stitch_length_mm = Some(4.0);

        let b = calc.compute_detailed(&op, &catalog(), &FabricSettings::default(), &[]);
        assert_eq!(b.kind, MachineKind::ContinuousSeam);
        // (120 × 2.5 / 4000) × 1.0 × 1.1 + 0.01 + 0.01
        let expected_machine = (120.0 * 2.5 / 4000.0) * 1.0 * 1.1 + 0.02;
        assert!((b.machine_time_min - expected_machine).abs() < 1e-12);
        // max(0.15, 0.6) = 0.6
        assert!((b.manual_time_min - 0.6).abs() < 1e-12);
        assert!((b.total_min - (expected_machine + 0.6) * 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_counter_example() {
        let calc = TimeStandardCalculator::default();
        let op = Operation::new("op2", 1, "Boutonnière", 9.0);

        let b = calc.compute_detailed(&op, &catalog(), &FabricSettings::default(), &[]);
        assert_eq!(b.kind, MachineKind::Counter(CounterFamily::Button));
        assert!((b.total_min - ((9.0 * 4.0 / 60.0) + 0.18) * 1.12).abs() < 1e-9);
        assert!((b.total_min - 0.873).abs() < 0.001);
    }

    #[test]
    fn test_counter_uses_standard_time_table() {
        let calc = TimeStandardCalculator::default();
        let op = Operation::new("op2", 1, "Boutonnière", 10.0);
        let table = vec![StandardTimeEntry::new("Boutonnière", 6.0, TimeUnit::Sec)];

        let b = calc.compute_detailed(&op, &catalog(), &FabricSettings::default(), &table);
        assert!((b.machine_time_min - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_forced_time_bypasses_everything() {
        let calc = TimeStandardCalculator::default();
        let mut op = Operation::new("op1", 1, "Piqueuse", 120.0);
        op.forced_time = Some(0.42);
        let fabric = FabricSettings {
            enabled: true,
            selected_level: FabricLevel::Hard,
            values: FabricPenaltyValues::default(),
        };
        assert_eq!(calc.compute(&op, &catalog(), &fabric, &[]), 0.42);

        op.forced_time = None;
        let unforced = calc.compute(&op, &catalog(), &fabric, &[]);
        let mut fresh = Operation::new("op1", 1, "Piqueuse", 120.0);
        fresh.forced_time = None;
        assert_eq!(unforced, calc.compute(&fresh, &catalog(), &fabric, &[]));
    }

    #[test]
    fn test_unresolved_machine_falls_back_to_manual() {
        let calc = TimeStandardCalculator::default();
        let op = Operation::new("op1", 1, "Machine inconnue", 50.0);
        let b = calc.compute_detailed(&op, &catalog(), &FabricSettings::default(), &[]);
        assert_eq!(b.kind, MachineKind::Manual);
        assert_eq!(b.machine_time_min, 0.0);
        assert!((b.total_min - 0.18 * 1.12).abs() < 1e-12);
    }

    #[test]
    fn test_zero_speed_catalog_machine_is_manual() {
        let calc = TimeStandardCalculator::default();
        let machines = vec![
            Machine::new("FER", "Table de repassage").with_speed(0.0),
            Machine::new("SUR", "Surjeteuse"),
        ];

        let op = Operation::new("op1", 1, "Table de repassage", 50.0);
        let b = calc.compute_detailed(&op, &machines, &FabricSettings::default(), &[]);
        assert_eq!(b.machine_id, "FER");
        assert_eq!(b.kind, MachineKind::Manual);
        assert_eq!(b.machine_time_min, 0.0);
        assert!((b.total_min - 0.18 * 1.12).abs() < 1e-12);

        // 目录未给转速时按默认转速视为连续缝
        let op = Operation::new("op2", 2, "Surjeteuse", 50.0);
        let b = calc.compute_detailed(&op, &machines, &FabricSettings::default(), &[]);
        assert_eq!(b.kind, MachineKind::ContinuousSeam);
        assert!(b.machine_time_min > 0.0);
    }

    #[test]
    fn test_zero_length_continuous_has_no_machine_time() {
        let calc = TimeStandardCalculator::default();
        let mut op = Operation::new("op1", 1, "Piqueuse", 0.0);
        op.rpm = Some(5000.0);
        let b = calc.compute_detailed(&op, &catalog(), &FabricSettings::default(), &[]);
        assert_eq!(b.machine_time_min, 0.0);
        assert_eq!(b.manual_time_min, 0.0);
        assert_eq!(b.total_min, 0.0);
    }

    #[test]
    fn test_zero_stitch_length_uses_default_density() {
        let calc = TimeStandardCalculator::default();
        let mut op = Operation::new("op1", 1, "Piqueuse", 100.0);
        op.stitch_length_mm = Some(0.0);
        let b = calc.compute_detailed(&op, &catalog(), &FabricSettings::default(), &[]);
        let expected = (100.0 * 4.0 / 4000.0) * 1.0 * 1.1 + 0.02;
        assert!((b.machine_time_min - expected).abs() < 1e-12);
    }

    #[test]
    fn test_manual_override_and_fabric_penalty() {
        let calc = TimeStandardCalculator::default();
        let mut op = Operation::new("op1", 1, "Piqueuse", 10.0);
        op.manual_time_override = Some(0.3);
        op.majoration = Some(1.0);
        let fabric = FabricSettings {
            enabled: true,
            selected_level: FabricLevel::Medium,
            values: FabricPenaltyValues {
                easy: 0.0,
                medium: 6.0,
                hard: 12.0,
            },
        };
        let b = calc.compute_detailed(&op, &catalog(), &fabric, &[]);
        assert_eq!(b.manual_time_min, 0.3);
        assert!((b.fabric_penalty_min - 0.1).abs() < 1e-12);
        assert!((b.total_min - (b.machine_time_min + 0.3 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.006), 1.01);
        assert_eq!(round2(0.1549), 0.15);
    }
}

// ==========================================
// 服装流水线平衡系统 - 产线汇总指标
// ==========================================
// 指标:
// - 成衣工时 = Σ工序工时 × 1.20（线末宽放）
// - 日产量(理论) = 出勤时间 × 人数 / 成衣工时
// - 时产量(理论) = 日产量 / (出勤时间 / 60)
// - 实际产量 = 理论产量 × 效率%
// - 平衡效率 = Σ负荷 / (所需总人数 × bf) × 100
// 红线: 分母为零时输出 0，不做除零
// ==========================================

use crate::config::engine_params::BalancingConfig;
use crate::domain::line::LineSettings;
use crate::domain::operation::Operation;
use crate::engine::saturation::SaturationReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineMetrics {
    pub total_work_content_min: f64,     // Σ工序工时
    pub article_time_min: f64,           // 成衣工时（含线末宽放）
    pub required_workforce: u32,         // 所需总人数
    pub theoretical_daily_output: f64,   // 理论日产量 (件)
    pub theoretical_hourly_output: f64,  // 理论时产量 (件)
    pub actual_daily_output: f64,        // 实际日产量 (件)
    pub actual_hourly_output: f64,       // 实际时产量 (件)
    pub line_balance_efficiency_pct: f64, // 平衡效率 (%)
}

impl LineMetrics {
    /// 由工序、饱和度报告与产线参数计算汇总指标
    pub fn calculate(
        operations: &[Operation],
        report: &SaturationReport,
        settings: &LineSettings,
        config: &BalancingConfig,
    ) -> Self {
        let total_work_content: f64 = operations
            .iter()
            .map(|op| op.computed_time)
            .filter(|t| t.is_finite() && *t > 0.0)
            .sum();
        let article_time = total_work_content * config.end_of_line_allowance;

        let presence = settings.presence_time_min;
        let theoretical_daily = if article_time > 0.0 && presence > 0.0 {
            presence * settings.headcount as f64 / article_time
        } else {
            0.0
        };
        let theoretical_hourly = if presence > 0.0 {
            theoretical_daily / (presence / 60.0)
        } else {
            0.0
        };

        let efficiency = if settings.efficiency_pct.is_finite() {
            settings.efficiency_pct.max(0.0) / 100.0
        } else {
            0.0
        };

        let workforce = report.total_required_workforce;
        let capacity = workforce as f64 * settings.cycle_time_min;
        let balance_efficiency = if capacity > 0.0 {
            report.total_load_min / capacity * 100.0
        } else {
            0.0
        };

        Self {
            total_work_content_min: total_work_content,
            article_time_min: article_time,
            required_workforce: workforce,
            theoretical_daily_output: theoretical_daily,
            theoretical_hourly_output: theoretical_hourly,
            actual_daily_output: theoretical_daily * efficiency,
            actual_hourly_output: theoretical_hourly * efficiency,
            line_balance_efficiency_pct: balance_efficiency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_formulas() {
        let mut a = Operation::new("a", 1, "MAN", 0.0);
        a.computed_time = 2.0;
        let mut b = Operation::new("b", 2, "MAN", 0.0);
        b.computed_time = 3.0;
        let report = SaturationReport {
            stations: vec![],
            total_required_workforce: 6,
            total_load_min: 5.0,
        };
        let settings = LineSettings {
            cycle_time_min: 1.0,
            headcount: 12,
            presence_time_min: 480.0,
            efficiency_pct: 80.0,
        };
        let m = LineMetrics::calculate(&[a, b], &report, &settings, &BalancingConfig::default());

        assert!((m.article_time_min - 6.0).abs() < 1e-12);
        assert!((m.theoretical_daily_output - 960.0).abs() < 1e-9);
        assert!((m.theoretical_hourly_output - 120.0).abs() < 1e-9);
        assert!((m.actual_daily_output - 768.0).abs() < 1e-9);
        assert!((m.line_balance_efficiency_pct - 5.0 / 6.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_line_is_all_zero() {
        let m = LineMetrics::calculate(
            &[],
            &SaturationReport::default(),
            &LineSettings::default(),
            &BalancingConfig::default(),
        );
        assert_eq!(m, LineMetrics::default());
    }
}

// ==========================================
// 服装流水线平衡系统 - 引擎层
// ==========================================
// 职责: 标准工时 → 工序平衡 → 饱和度 → 工位拆分 → 汇总指标
// 红线: Engine 不拼 SQL、不读文件；输入输出均为值
// ==========================================

pub mod error;
pub mod keyword_matcher;
pub mod line_metrics;
pub mod pipeline;
pub mod saturation;
pub mod sequence_balancer;
pub mod station_splitter;
pub mod time_standard;

// 重导出核心引擎
pub use error::{PipelineError, PipelineResult};
pub use keyword_matcher::{KeywordMatcher, MachineMatcher};
pub use line_metrics::LineMetrics;
pub use pipeline::{LineEvent, LineInputs, LinePipeline, LineSnapshot, RecalcStages};
pub use saturation::{SaturationAnalyzer, SaturationGranularity, SaturationReport, StationStats};
pub use sequence_balancer::{BalanceResult, FlushReason, SequenceBalancer};
pub use station_splitter::{CollapseResult, PlaceableUnit, StationSplitter};
pub use time_standard::{TimeBreakdown, TimeStandardCalculator};

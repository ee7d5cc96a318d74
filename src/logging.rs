// ==========================================
// 服装流水线平衡系统 - 日志初始化
// ==========================================
// 职责: tracing-subscriber 订阅者安装（文本 / JSON 行）
// 环境变量:
// - RUST_LOG: 过滤器，缺省为 DEFAULT_FILTER
// - LINE_BALANCING_LOG_FORMAT: text | json，缺省 text
// 红线: 重复初始化静默忽略（CLI 与测试可能多次调用）
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "LINE_BALANCING_LOG_FORMAT";

/// 缺省过滤器：全局 info，重算流水线单独可调
pub const DEFAULT_FILTER: &str = "info,garment_line_balancing::engine=info";

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// 未识别的取值按文本处理
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|raw| Self::parse(&raw))
            .unwrap_or_default()
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 按环境变量选择格式并初始化
///
/// # 示例
/// ```no_run
/// use garment_line_balancing::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_format(LogFormat::from_env());
}

/// 以指定格式初始化
pub fn init_with_format(format: LogFormat) {
    let result = match format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter())
            .with_target(true)
            .with_line_number(true)
            .try_init(),
        // 事件字段（operation_id / station_id 等）按 JSON 键输出，便于按工位检索
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter())
            .with_current_span(true)
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("日志系统已初始化，忽略重复调用");
    }
}

/// 测试环境：debug 级别，输出交给测试框架捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

// ==========================================
// 服装流水线平衡系统 - 命令行入口
// ==========================================
// 用法:
//   line-balancing <operations.csv|xlsx> <cycle_time_min> [db_path]
//
// 导入工序表 → 按节拍自动平衡 → 输出工位/饱和度/人数汇总
// db_path 缺省时使用用户数据目录（或环境变量 LINE_BALANCING_DB_PATH）
// ==========================================

use anyhow::{bail, Context};
use garment_line_balancing::db::default_db_path;
use garment_line_balancing::engine::LineSnapshot;
use garment_line_balancing::{logging, LineApi, APP_NAME, VERSION};

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let (Some(file_path), Some(cycle_raw)) = (args.next(), args.next()) else {
        bail!("用法: line-balancing <operations.csv|xlsx> <cycle_time_min> [db_path]");
    };
    let cycle_time_min: f64 = cycle_raw
        .trim()
        .replace(',', ".")
        .parse()
        .with_context(|| format!("节拍无法解析: {}", cycle_raw))?;
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let api = LineApi::open(&db_path)?;
    api.set_cycle_time(cycle_time_min)?;
    let response = api.import_operations(&file_path)?;

    for warning in &response.warnings {
        println!("[警告] 行 {}: {}", warning.row, warning.message);
    }
    println!(
        "已导入 {} / {} 行工序",
        response.imported, response.total_rows
    );
    print_report(&response.snapshot);
    Ok(())
}

fn print_report(snapshot: &LineSnapshot) {
    println!();
    println!(
        "{:<6} {:<20} {:>10} {:>8} {:>6} {:>8}",
        "工位", "机器", "负荷(min)", "理论人数", "人数", "饱和度%"
    );
    for stats in &snapshot.saturation.stations {
        println!(
            "{:<6} {:<20} {:>10.3} {:>8.2} {:>6} {:>8.1}",
            stats.station_name,
            stats.machine_label,
            stats.load_min,
            stats.theoretical_operators,
            stats.required_operators,
            stats.operator_saturation_pct
        );
    }

    let metrics = &snapshot.metrics;
    println!();
    println!("总工时:       {:.3} min", metrics.total_work_content_min);
    println!("成衣工时:     {:.3} min", metrics.article_time_min);
    println!("所需人数:     {}", metrics.required_workforce);
    println!("理论日产量:   {:.0}", metrics.theoretical_daily_output);
    println!("实际日产量:   {:.0}", metrics.actual_daily_output);
    println!("平衡率:       {:.1}%", metrics.line_balance_efficiency_pct);
    if !snapshot.unassigned_operation_ids.is_empty() {
        println!("未分配工序:   {}", snapshot.unassigned_operation_ids.join(", "));
    }
}

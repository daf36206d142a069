// ==========================================
// 库存消耗分析系统 - 命令行入口
// ==========================================
// 用法:
//   siop-burndown <input_dir|source.db> <output.csv> [config.json|config.db]
// 输出:
//   <output.csv>                报表（sku,bucket,category,quantity,burn_down_horizon）
//   <output.csv>.summary.json   运行汇总
// ==========================================

use anyhow::{bail, Context, Result};
use siop_burndown::config::load_config;
use siop_burndown::engine::BurnDownEngine;
use siop_burndown::importer::ParallelSourceLoader;
use siop_burndown::report::{write_summary_json, CsvReportWriter};
use siop_burndown::{logging, run_pipeline, APP_NAME, VERSION};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 || args.len() > 3 {
        bail!("用法: siop-burndown <input_dir|source.db> <output.csv> [config.json|config.db]");
    }
    let input = PathBuf::from(&args[0]);
    let output = PathBuf::from(&args[1]);
    let config_path = args.get(2).map(PathBuf::from);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("==================================================");

    let config = load_config(config_path.as_deref()).context("配置加载失败")?;
    tracing::info!(
        as_of = %config.as_of,
        lookback = config.lookback_months,
        horizon = config.horizon_months,
        "引擎配置"
    );
    let as_of = config.as_of;
    let lookback_months = config.lookback_months;
    let engine = BurnDownEngine::new(config).context("配置校验失败")?;

    let source = if input.is_dir() {
        ParallelSourceLoader::from_directory(&input, as_of)
    } else {
        ParallelSourceLoader::from_sqlite(&input, as_of)
    }
    .with_context(|| format!("数据源不可用: {}", input.display()))?
    .with_lookback_months(lookback_months);

    let outcome = run_pipeline(&source, &engine)
        .await
        .context("数据源加载失败")?;

    CsvReportWriter
        .write_file(&output, &outcome.rows)
        .with_context(|| format!("报表写入失败: {}", output.display()))?;

    let summary_path = summary_path_for(&output);
    write_summary_json(&summary_path, &outcome.run.summary)
        .with_context(|| format!("汇总写入失败: {}", summary_path.display()))?;

    let summary = &outcome.run.summary;
    tracing::info!(
        run_id = %summary.run_id,
        total = summary.total,
        processed = summary.processed,
        skipped = summary.skipped,
        flagged = summary.flagged,
        failed = summary.failed,
        total_value = %summary.total_value,
        unvalued = summary.unvalued,
        orphan_usage = outcome.orphan_usage_rows,
        orphan_demand = outcome.orphan_demand_rows,
        "运行汇总"
    );
    for err in &outcome.run.errors {
        tracing::warn!(error = %err, "未输出记录");
    }

    Ok(())
}

fn summary_path_for(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".summary.json");
    PathBuf::from(name)
}

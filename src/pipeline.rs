// ==========================================
// 库存消耗分析系统 - 运行管道
// ==========================================
// 流程: 数据源加载 → 引擎批处理 → 报表行展开
// 红线: 加载阶段被拒绝的行同样计入运行汇总
// ==========================================

use crate::engine::orchestrator::{BurnDownEngine, RunOutput};
use crate::importer::error::ImportResult;
use crate::importer::record_source_trait::RecordSource;
use crate::report::report_row::{build_report, ReportRow};
use tracing::{info, instrument};

/// 管道输出
#[derive(Debug)]
pub struct PipelineOutput {
    pub run: RunOutput,
    pub rows: Vec<ReportRow>,
    pub orphan_usage_rows: usize,
    pub orphan_demand_rows: usize,
}

/// 执行一次完整运行
#[instrument(skip_all, fields(as_of = %engine.config().as_of))]
pub async fn run_pipeline(
    source: &dyn RecordSource,
    engine: &BurnDownEngine,
) -> ImportResult<PipelineOutput> {
    let loaded = source.load_records().await?;

    let mut run = engine.run(&loaded.records);
    run.summary.record_load_rejections(loaded.rejected_count());
    run.errors.extend(loaded.rejected);

    let rows = build_report(&run.results, engine.calendar(), engine.config().output_scale);
    info!(
        rows = rows.len(),
        skipped = run.summary.skipped,
        failed = run.summary.failed,
        "运行完成"
    );

    Ok(PipelineOutput {
        run,
        rows,
        orphan_usage_rows: loaded.orphan_usage_rows,
        orphan_demand_rows: loaded.orphan_demand_rows,
    })
}
